//! Structured queries through shadow DOM boundaries.
//!
//! The apply widget is a web component whose interior is invisible to plain
//! selector queries. Instead of scattering ad hoc script strings through
//! the apply flow, a [`ShadowQuery`] describes the element path as data
//! (one CSS selector per hop, each subsequent hop resolved inside the
//! previous element's shadow root) and renders the scripts the
//! [`PageDriver`](crate::traits::page::PageDriver) evaluates.

use serde_json::Value;

/// An element path through nested shadow roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowQuery {
    hops: Vec<String>,
}

impl ShadowQuery {
    /// Build a query from selector hops. The first hop is resolved in the
    /// document; every later hop inside the previous match's shadow root.
    pub fn new<I, S>(hops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hops: hops.into_iter().map(Into::into).collect(),
        }
    }

    /// The selector hops.
    pub fn hops(&self) -> &[String] {
        &self.hops
    }

    /// Script fragment resolving the path, leaving the target in `el`
    /// (or `null` when any hop misses).
    fn resolve_fragment(&self) -> String {
        let mut out = String::from("let el = null;\n");
        for (i, hop) in self.hops.iter().enumerate() {
            let hop = hop.replace('\\', "\\\\").replace('\'', "\\'");
            if i == 0 {
                out.push_str(&format!("el = document.querySelector('{}');\n", hop));
            } else {
                out.push_str(&format!(
                    "el = el && el.shadowRoot ? el.shadowRoot.querySelector('{}') : null;\n",
                    hop
                ));
            }
        }
        out
    }

    /// Script returning `true` when the full path resolves.
    pub fn exists_script(&self) -> String {
        format!("(() => {{\n{}return el !== null;\n}})()", self.resolve_fragment())
    }

    /// Script clicking the target; returns `true` when it was found.
    pub fn click_script(&self) -> String {
        format!(
            "(() => {{\n{}if (el === null) return false;\nel.click();\nreturn true;\n}})()",
            self.resolve_fragment()
        )
    }

    /// Script returning the target's text content, or `null`.
    pub fn text_script(&self) -> String {
        format!(
            "(() => {{\n{}return el === null ? null : el.textContent;\n}})()",
            self.resolve_fragment()
        )
    }
}

/// Interpret an evaluated exists/click result as a boolean.
pub fn as_bool(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

/// Interpret an evaluated text result.
pub fn as_text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_hop_queries_document() {
        let script = ShadowQuery::new(["apply-button-wc"]).exists_script();
        assert!(script.contains("document.querySelector('apply-button-wc')"));
        assert!(!script.contains("shadowRoot"));
    }

    #[test]
    fn test_later_hops_pierce_shadow_roots() {
        let script =
            ShadowQuery::new(["apply-button-wc", "button.btn.btn-primary"]).click_script();
        assert!(script.contains("document.querySelector('apply-button-wc')"));
        assert!(script.contains("el.shadowRoot.querySelector('button.btn.btn-primary')"));
        assert!(script.contains("el.click()"));
    }

    #[test]
    fn test_text_script_returns_null_on_miss() {
        let script = ShadowQuery::new(["x", "y", "z"]).text_script();
        assert!(script.contains("return el === null ? null : el.textContent;"));
        // Two piercing hops after the document hop.
        assert_eq!(script.matches("shadowRoot").count(), 4);
    }

    #[test]
    fn test_selector_quotes_escaped() {
        let script = ShadowQuery::new(["a[name='x']"]).exists_script();
        assert!(script.contains("querySelector('a[name=\\'x\\']')"));
    }

    #[test]
    fn test_value_helpers() {
        assert!(as_bool(&serde_json::json!(true)));
        assert!(!as_bool(&serde_json::json!(null)));
        assert_eq!(as_text(&serde_json::json!("hi")), Some("hi".to_string()));
        assert_eq!(as_text(&serde_json::json!(3)), None);
    }
}
