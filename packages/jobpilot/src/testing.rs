//! Testing utilities including mock implementations.
//!
//! These let pipeline logic run against scripted pages and deterministic
//! analyzers without a browser or network. `MockPage` models a listing or
//! flow as a sequence of rounds: clicking a registered control (or
//! scrolling, when enabled) moves to the next round, which is how both
//! pagination and multi-step apply flows are scripted.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::error::{DriverError, DriverResult, Result};
use crate::traits::ai::{ResumeAnalyzer, SearchTerms};
use crate::traits::page::{Element, OptionChoice, PageDriver, WaitPolicy};

/// Record of a call made to a [`MockPage`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageCall {
    Navigate { url: String },
    QueryAll { selector: String },
    WaitForVisible { selector: String },
    Click { selector: String, index: usize },
    Fill { selector: String, text: String },
    PressKey { selector: String, key: String },
    SelectOption { selector: String },
    Evaluate { script: String },
    ScrollToBottom,
    SetFileInput { selector: String, path: PathBuf },
    OpenTab { url: String },
    Close,
}

/// One scripted page state.
#[derive(Debug, Clone, Default)]
pub struct MockRound {
    elements: HashMap<String, Vec<Element>>,
    advance_controls: HashSet<String>,
    advance_on_scroll: bool,
    body: Option<String>,
}

impl MockRound {
    /// Register elements under their own selectors (for link fixtures).
    pub fn links(mut self, links: Vec<Element>) -> Self {
        for element in links {
            self.elements
                .entry(element.selector.clone())
                .or_default()
                .push(element);
        }
        self
    }

    /// Register elements under an explicit selector.
    pub fn elements(mut self, selector: impl Into<String>, elements: Vec<Element>) -> Self {
        self.elements.insert(selector.into(), elements);
        self
    }

    /// Register a control; clicking it advances to the next round.
    pub fn control(mut self, element: Element) -> Self {
        self.advance_controls.insert(element.selector.clone());
        self.elements
            .entry(element.selector.clone())
            .or_default()
            .push(element);
        self
    }

    /// Advance to the next round when the page is scrolled.
    pub fn advance_on_scroll(mut self) -> Self {
        self.advance_on_scroll = true;
        self
    }

    /// Body text visible during this round.
    pub fn body(mut self, text: impl Into<String>) -> Self {
        self.body = Some(text.into());
        self
    }
}

#[derive(Default)]
struct MockPageState {
    rounds: Vec<MockRound>,
    current: usize,
    static_elements: HashMap<String, Vec<Element>>,
    title: String,
    body: String,
    url: String,
    eval_responses: Vec<(String, serde_json::Value)>,
    tabs: HashMap<String, Arc<MockPage>>,
    closed: bool,
}

/// A scripted page for testing.
///
/// Returns predefined elements, evaluation results, and child tabs without
/// touching a browser, and records every call for assertions.
#[derive(Default)]
pub struct MockPage {
    state: Arc<Mutex<MockPageState>>,
    calls: Arc<Mutex<Vec<PageCall>>>,
}

impl MockPage {
    /// Create an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scripted round.
    pub fn with_round(self, build: impl FnOnce(MockRound) -> MockRound) -> Self {
        self.state
            .lock()
            .unwrap()
            .rounds
            .push(build(MockRound::default()));
        self
    }

    /// Register a static element, used when no rounds are scripted.
    pub fn with_element(self, selector: impl Into<String>, element: Element) -> Self {
        self.state
            .lock()
            .unwrap()
            .static_elements
            .entry(selector.into())
            .or_default()
            .push(element);
        self
    }

    /// Set the document title.
    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.state.lock().unwrap().title = title.into();
        self
    }

    /// Set the default body text (rounds may override).
    pub fn with_body(self, body: impl Into<String>) -> Self {
        self.state.lock().unwrap().body = body.into();
        self
    }

    /// Set the current URL.
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.state.lock().unwrap().url = url.into();
        self
    }

    /// Answer any evaluated script containing `fragment` with `value`.
    /// Responses are matched in registration order.
    pub fn with_eval(self, fragment: impl Into<String>, value: serde_json::Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .eval_responses
            .push((fragment.into(), value));
        self
    }

    /// Serve `page` when a tab is opened for `url`.
    pub fn with_tab(self, url: impl Into<String>, page: Arc<MockPage>) -> Self {
        self.state.lock().unwrap().tabs.insert(url.into(), page);
        self
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<PageCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn record(&self, call: PageCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.state.lock().unwrap().closed {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }

    fn lookup(&self, selector: &str) -> Vec<Element> {
        let state = self.state.lock().unwrap();
        if state.rounds.is_empty() {
            return state
                .static_elements
                .get(selector)
                .cloned()
                .unwrap_or_default();
        }
        let idx = state.current.min(state.rounds.len() - 1);
        state.rounds[idx]
            .elements
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }

    fn advance(&self) {
        let mut state = self.state.lock().unwrap();
        if state.current + 1 < state.rounds.len() {
            state.current += 1;
        }
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&self, url: &str, _wait: WaitPolicy) -> DriverResult<()> {
        self.ensure_open()?;
        self.record(PageCall::Navigate {
            url: url.to_string(),
        });
        self.state.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Element>> {
        self.ensure_open()?;
        self.record(PageCall::QueryAll {
            selector: selector.to_string(),
        });
        Ok(self.lookup(selector))
    }

    async fn wait_for_visible(&self, selector: &str, _timeout: Duration) -> DriverResult<Element> {
        self.ensure_open()?;
        self.record(PageCall::WaitForVisible {
            selector: selector.to_string(),
        });
        self.lookup(selector)
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::Timeout {
                selector: selector.to_string(),
            })
    }

    async fn click(&self, element: &Element) -> DriverResult<()> {
        self.ensure_open()?;
        self.record(PageCall::Click {
            selector: element.selector.clone(),
            index: element.index,
        });

        let advances = {
            let state = self.state.lock().unwrap();
            if state.rounds.is_empty() {
                false
            } else {
                let idx = state.current.min(state.rounds.len() - 1);
                state.rounds[idx].advance_controls.contains(&element.selector)
            }
        };
        if advances {
            self.advance();
        }
        Ok(())
    }

    async fn fill(&self, element: &Element, text: &str) -> DriverResult<()> {
        self.ensure_open()?;
        self.record(PageCall::Fill {
            selector: element.selector.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn press_key(&self, element: &Element, key: &str) -> DriverResult<()> {
        self.ensure_open()?;
        self.record(PageCall::PressKey {
            selector: element.selector.clone(),
            key: key.to_string(),
        });
        Ok(())
    }

    async fn select_option(&self, selector: &str, _choice: &OptionChoice) -> DriverResult<()> {
        self.ensure_open()?;
        self.record(PageCall::SelectOption {
            selector: selector.to_string(),
        });
        if self.lookup(selector).is_empty() {
            return Err(DriverError::NotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> DriverResult<serde_json::Value> {
        self.ensure_open()?;
        self.record(PageCall::Evaluate {
            script: script.to_string(),
        });
        let state = self.state.lock().unwrap();
        for (fragment, value) in &state.eval_responses {
            if script.contains(fragment.as_str()) {
                return Ok(value.clone());
            }
        }
        Ok(serde_json::Value::Null)
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        self.ensure_open()?;
        self.record(PageCall::ScrollToBottom);

        let advances = {
            let state = self.state.lock().unwrap();
            if state.rounds.is_empty() {
                false
            } else {
                let idx = state.current.min(state.rounds.len() - 1);
                state.rounds[idx].advance_on_scroll
            }
        };
        if advances {
            self.advance();
        }
        Ok(())
    }

    async fn set_file_input(&self, selector: &str, path: &Path) -> DriverResult<()> {
        self.ensure_open()?;
        self.record(PageCall::SetFileInput {
            selector: selector.to_string(),
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Mock pages settle instantly; tests never sleep.
    async fn settle(&self, _duration: Duration) {}

    async fn title(&self) -> DriverResult<String> {
        self.ensure_open()?;
        Ok(self.state.lock().unwrap().title.clone())
    }

    async fn body_text(&self) -> DriverResult<String> {
        self.ensure_open()?;
        let state = self.state.lock().unwrap();
        if !state.rounds.is_empty() {
            let idx = state.current.min(state.rounds.len() - 1);
            if let Some(body) = &state.rounds[idx].body {
                return Ok(body.clone());
            }
        }
        Ok(state.body.clone())
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.ensure_open()?;
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn open_tab(&self, url: &str, _wait: WaitPolicy) -> DriverResult<Arc<dyn PageDriver>> {
        self.ensure_open()?;
        self.record(PageCall::OpenTab {
            url: url.to_string(),
        });
        let state = self.state.lock().unwrap();
        state
            .tabs
            .get(url)
            .cloned()
            .map(|page| page as Arc<dyn PageDriver>)
            .ok_or_else(|| DriverError::Navigation(format!("no scripted tab for {}", url)))
    }

    async fn close(&self) -> DriverResult<()> {
        self.record(PageCall::Close);
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Record of a call made to a [`DeterministicAnalyzer`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerCall {
    InferSearchTerms,
    Embed { text_len: usize },
}

/// A deterministic [`ResumeAnalyzer`] for testing.
///
/// Returns configured search terms and hash-seeded embeddings, so the same
/// text always embeds identically and different texts diverge.
pub struct DeterministicAnalyzer {
    terms: SearchTerms,
    embeddings: RwLock<HashMap<String, Vec<f32>>>,
    embedding_dim: usize,
    calls: Mutex<Vec<AnalyzerCall>>,
}

impl Default for DeterministicAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DeterministicAnalyzer {
    /// Create an analyzer with placeholder terms.
    pub fn new() -> Self {
        Self {
            terms: SearchTerms {
                job_titles: vec!["Software Engineer".to_string()],
                skills: vec!["Rust".to_string()],
            },
            embeddings: RwLock::new(HashMap::new()),
            embedding_dim: 256,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the inferred terms.
    pub fn with_terms(mut self, terms: SearchTerms) -> Self {
        self.terms = terms;
        self
    }

    /// Pin an embedding for a specific (preprocessed) text.
    pub fn with_embedding(self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings.write().unwrap().insert(text.into(), embedding);
        self
    }

    /// All calls made to this analyzer.
    pub fn calls(&self) -> Vec<AnalyzerCall> {
        self.calls.lock().unwrap().clone()
    }

    fn hash_embedding(&self, text: &str) -> Vec<f32> {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();

        (0..self.embedding_dim)
            .map(|i| {
                let byte = hash[i % 32] as f32;
                (byte / 127.5) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl ResumeAnalyzer for DeterministicAnalyzer {
    async fn infer_search_terms(&self, _resume_text: &str) -> Result<SearchTerms> {
        self.calls
            .lock()
            .unwrap()
            .push(AnalyzerCall::InferSearchTerms);
        Ok(self.terms.clone())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(AnalyzerCall::Embed {
            text_len: text.len(),
        });
        if let Some(pinned) = self.embeddings.read().unwrap().get(text) {
            return Ok(pinned.clone());
        }
        Ok(self.hash_embedding(text))
    }
}

/// A [`ResumeSource`](crate::traits::resume::ResumeSource) returning fixed
/// text, for pipeline tests.
pub struct StaticResume(pub String);

#[async_trait]
impl crate::traits::resume::ResumeSource for StaticResume {
    async fn extract_text(&self, _path: &Path) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_page_rounds_advance_on_control_click() {
        let next = Element::new("button.next", 0);
        let page = MockPage::new()
            .with_round(|r| {
                r.elements("a", vec![Element::new("a", 0).with_text("one")])
                    .control(next.clone())
            })
            .with_round(|r| r.elements("a", vec![Element::new("a", 0).with_text("two")]));

        assert_eq!(page.query_all("a").await.unwrap()[0].text, "one");
        page.click(&next).await.unwrap();
        assert_eq!(page.query_all("a").await.unwrap()[0].text, "two");
    }

    #[tokio::test]
    async fn test_mock_page_refuses_after_close() {
        let page = MockPage::new().with_title("t");
        page.close().await.unwrap();
        assert!(page.is_closed());
        assert!(matches!(page.title().await, Err(DriverError::Closed)));
    }

    #[tokio::test]
    async fn test_eval_responses_match_in_order() {
        let page = MockPage::new()
            .with_eval("el.click()", serde_json::json!(true))
            .with_eval("apply-button-wc", serde_json::json!(false));

        // Script contains both fragments; first registration wins.
        let v = page
            .evaluate("(() => { document.querySelector('apply-button-wc'); el.click(); })()")
            .await
            .unwrap();
        assert_eq!(v, serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_deterministic_embeddings() {
        let analyzer = DeterministicAnalyzer::new();
        let a = analyzer.embed("hello").await.unwrap();
        let b = analyzer.embed("hello").await.unwrap();
        let c = analyzer.embed("world").await.unwrap();

        assert_eq!(a.len(), 256);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
