//! Page automation capability trait.
//!
//! `PageDriver` abstracts the host automation layer: navigation, locating,
//! clicking, filling, script evaluation, and file selection against a single
//! live page. The pipeline never talks to a browser directly, which keeps
//! the engine and the apply flow testable against scripted pages.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DriverResult;

/// How long to let a navigation settle before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Return once the DOM is parsed.
    DomContentLoaded,
    /// Return once the load event fired.
    Load,
    /// Return once the network has been quiet for a moment.
    NetworkIdle,
}

/// Value or label choice for `<select>` interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionChoice {
    /// Match the option's `value` attribute.
    Value(String),
    /// Match the option's visible label.
    Label(String),
}

/// Snapshot of a matched element.
///
/// Carries the locator it was found under (selector + index within that
/// selector's matches) so drivers can re-resolve it for interaction, plus
/// the attributes and text captured at query time so extraction can run
/// without further page round-trips.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Selector this element matched.
    pub selector: String,

    /// Index within the selector's match list.
    pub index: usize,

    /// Attributes captured at query time.
    pub attrs: HashMap<String, String>,

    /// Visible text captured at query time.
    pub text: String,
}

impl Element {
    /// Create an element snapshot for a locator.
    pub fn new(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
            ..Default::default()
        }
    }

    /// Attach an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Attach visible text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Look up an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// The `href` attribute, if any.
    pub fn href(&self) -> Option<&str> {
        self.attr("href")
    }
}

/// Capability interface over one live page.
///
/// All interactions are sequential and blocking relative to each other;
/// suspension points are explicit waits with caller-specified timeouts.
/// Implementations: [`ChromeDriver`](crate::drivers::chrome::ChromeDriver)
/// over a real browser, [`MockPage`](crate::testing::MockPage) for tests.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the page to a URL.
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> DriverResult<()>;

    /// All elements currently matching a selector, visible or not.
    ///
    /// Returns an empty list rather than an error when nothing matches.
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Element>>;

    /// Wait until a selector has a visible match, bounded by `timeout`.
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> DriverResult<Element>;

    /// Click a previously located element.
    async fn click(&self, element: &Element) -> DriverResult<()>;

    /// Clear and type text into a previously located element.
    async fn fill(&self, element: &Element, text: &str) -> DriverResult<()>;

    /// Press a key (e.g. "Enter") with the element focused.
    async fn press_key(&self, element: &Element, key: &str) -> DriverResult<()>;

    /// Select an option in the first `<select>` matching the selector.
    async fn select_option(&self, selector: &str, choice: &OptionChoice) -> DriverResult<()>;

    /// Evaluate a script in the page and return its value.
    ///
    /// The script runs with full DOM access and may traverse nested shadow
    /// roots; see [`ShadowQuery`](crate::shadow::ShadowQuery) for the
    /// structured way to build such scripts.
    async fn evaluate(&self, script: &str) -> DriverResult<serde_json::Value>;

    /// Scroll to the bottom of the page.
    async fn scroll_to_bottom(&self) -> DriverResult<()>;

    /// Supply a file path to the first file input matching the selector.
    async fn set_file_input(&self, selector: &str, path: &Path) -> DriverResult<()>;

    /// Best-effort wait for the network to go quiet.
    ///
    /// Drivers without a usable signal may return immediately; callers
    /// treat a timeout here as non-fatal.
    async fn wait_for_idle(&self, _timeout: Duration) -> DriverResult<()> {
        Ok(())
    }

    /// Last-resort settle delay after an action with no observable
    /// completion signal. Not a synchronization primitive.
    async fn settle(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// The page's document title.
    async fn title(&self) -> DriverResult<String>;

    /// The page body's full text content.
    async fn body_text(&self) -> DriverResult<String>;

    /// The page's current URL.
    async fn current_url(&self) -> DriverResult<String>;

    /// Open a short-lived child page on the same browser context.
    async fn open_tab(&self, url: &str, wait: WaitPolicy) -> DriverResult<Arc<dyn PageDriver>>;

    /// Close this page. Further calls fail with
    /// [`DriverError::Closed`](crate::error::DriverError::Closed).
    async fn close(&self) -> DriverResult<()>;
}
