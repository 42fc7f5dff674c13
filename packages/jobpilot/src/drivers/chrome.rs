//! `PageDriver` implementation over headless Chrome.
//!
//! headless_chrome is a blocking client, so every call is bridged onto the
//! blocking thread pool. Element snapshots are re-resolved by selector and
//! index at interaction time; a page mutation between query and click
//! surfaces as `NotFound`, which callers already treat as per-step.

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DriverError, DriverResult};
use crate::traits::page::{Element, OptionChoice, PageDriver, WaitPolicy};

/// Browser-backed page driver.
pub struct ChromeDriver {
    browser: Arc<Browser>,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    /// Launch a browser and open its initial tab.
    pub fn launch(headless: bool) -> DriverResult<Self> {
        let options = LaunchOptionsBuilder::default()
            .headless(headless)
            .build()
            .map_err(backend)?;
        let browser = Browser::new(options).map_err(backend)?;
        let tab = browser.new_tab().map_err(backend)?;
        Ok(Self {
            browser: Arc::new(browser),
            tab,
        })
    }

    fn snapshot(element: &headless_chrome::Element<'_>, selector: &str, index: usize) -> Element {
        let mut attrs = HashMap::new();
        if let Ok(Some(pairs)) = element.get_attributes() {
            for pair in pairs.chunks(2) {
                if let [name, value] = pair {
                    attrs.insert(name.clone(), value.clone());
                }
            }
        }
        let text = element.get_inner_text().unwrap_or_default();
        Element {
            selector: selector.to_string(),
            index,
            attrs,
            text,
        }
    }

    async fn blocking<T, F>(&self, op: F) -> DriverResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Tab>) -> DriverResult<T> + Send + 'static,
    {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || op(tab))
            .await
            .map_err(|e| DriverError::Backend(format!("blocking task failed: {}", e)))?
    }
}

fn backend(e: impl ToString) -> DriverError {
    DriverError::Backend(e.to_string())
}

fn not_found(selector: &str) -> DriverError {
    DriverError::NotFound {
        selector: selector.to_string(),
    }
}

/// Resolve a snapshot back to a live element.
fn resolve<'a>(
    tab: &'a Tab,
    selector: &str,
    index: usize,
) -> DriverResult<headless_chrome::Element<'a>> {
    let mut elements = tab.find_elements(selector).map_err(|_| not_found(selector))?;
    if index >= elements.len() {
        return Err(not_found(selector));
    }
    Ok(elements.swap_remove(index))
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&self, url: &str, _wait: WaitPolicy) -> DriverResult<()> {
        // headless_chrome exposes no network-idle signal; every policy
        // waits for the navigation to commit and the load to settle.
        let url = url.to_string();
        self.blocking(move |tab| {
            tab.navigate_to(&url)
                .map_err(|e| DriverError::Navigation(e.to_string()))?;
            tab.wait_until_navigated()
                .map_err(|e| DriverError::Navigation(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<Element>> {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            // No match is an empty list, not an error.
            let elements = tab.find_elements(&selector).unwrap_or_default();
            Ok(elements
                .iter()
                .enumerate()
                .map(|(i, e)| ChromeDriver::snapshot(e, &selector, i))
                .collect())
        })
        .await
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> DriverResult<Element> {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            let element = tab
                .wait_for_element_with_custom_timeout(&selector, timeout)
                .map_err(|_| DriverError::Timeout {
                    selector: selector.clone(),
                })?;
            Ok(ChromeDriver::snapshot(&element, &selector, 0))
        })
        .await
    }

    async fn click(&self, element: &Element) -> DriverResult<()> {
        let selector = element.selector.clone();
        let index = element.index;
        self.blocking(move |tab| {
            let element = resolve(&tab, &selector, index)?;
            element
                .click()
                .map_err(|e| DriverError::Input(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn fill(&self, element: &Element, text: &str) -> DriverResult<()> {
        let selector = element.selector.clone();
        let index = element.index;
        let text = text.to_string();
        self.blocking(move |tab| {
            let element = resolve(&tab, &selector, index)?;
            element
                .click()
                .map_err(|e| DriverError::Input(e.to_string()))?;
            element
                .call_js_fn("function() { this.value = ''; }", vec![], false)
                .map_err(|e| DriverError::Input(e.to_string()))?;
            element
                .type_into(&text)
                .map_err(|e| DriverError::Input(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn press_key(&self, _element: &Element, key: &str) -> DriverResult<()> {
        let key = key.to_string();
        self.blocking(move |tab| {
            tab.press_key(&key)
                .map_err(|e| DriverError::Input(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn select_option(&self, selector: &str, choice: &OptionChoice) -> DriverResult<()> {
        let (by_value, needle) = match choice {
            OptionChoice::Value(v) => (true, v.clone()),
            OptionChoice::Label(l) => (false, l.clone()),
        };
        let script = format!(
            "(() => {{\nconst sel = document.querySelector('{}');\nif (!sel) return false;\nconst opt = Array.from(sel.options).find(o => {});\nif (!opt) return false;\nsel.value = opt.value;\nsel.dispatchEvent(new Event('input', {{bubbles: true}}));\nsel.dispatchEvent(new Event('change', {{bubbles: true}}));\nreturn true;\n}})()",
            escape(selector),
            if by_value {
                format!("o.value === '{}'", escape(&needle))
            } else {
                format!("o.label.trim() === '{}'", escape(&needle))
            }
        );
        let value = self.evaluate(&script).await?;
        if value.as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(not_found(selector))
        }
    }

    async fn evaluate(&self, script: &str) -> DriverResult<serde_json::Value> {
        let script = script.to_string();
        self.blocking(move |tab| {
            let remote = tab
                .evaluate(&script, false)
                .map_err(|e| DriverError::Script(e.to_string()))?;
            Ok(remote.value.unwrap_or(serde_json::Value::Null))
        })
        .await
    }

    async fn scroll_to_bottom(&self) -> DriverResult<()> {
        self.evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    async fn set_file_input(&self, selector: &str, path: &Path) -> DriverResult<()> {
        let selector = selector.to_string();
        let path = path.to_string_lossy().to_string();
        self.blocking(move |tab| {
            let element = resolve(&tab, &selector, 0)?;
            element
                .set_input_files(&[path.as_str()])
                .map_err(|e| DriverError::Input(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn title(&self) -> DriverResult<String> {
        self.blocking(move |tab| tab.get_title().map_err(backend)).await
    }

    async fn body_text(&self) -> DriverResult<String> {
        let value = self.evaluate("document.body ? document.body.innerText : ''").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.blocking(move |tab| Ok(tab.get_url())).await
    }

    async fn open_tab(&self, url: &str, wait: WaitPolicy) -> DriverResult<Arc<dyn PageDriver>> {
        let browser = self.browser.clone();
        let tab = tokio::task::spawn_blocking(move || browser.new_tab().map_err(backend))
            .await
            .map_err(|e| DriverError::Backend(format!("blocking task failed: {}", e)))??;

        let child = ChromeDriver {
            browser: self.browser.clone(),
            tab,
        };
        child.navigate(url, wait).await?;
        Ok(Arc::new(child))
    }

    async fn close(&self) -> DriverResult<()> {
        self.blocking(move |tab| {
            tab.close_target().map_err(backend)?;
            Ok(())
        })
        .await
    }
}
