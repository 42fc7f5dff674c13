//! Stable job identifier derivation.
//!
//! A matched link can encode its job id several ways depending on which
//! markup experiment served the page. Extraction tries a fixed priority
//! chain, first match wins; a failure on one element never aborts the
//! caller's loop.

use regex::Regex;

use crate::traits::page::Element;
use crate::types::job::JobId;

/// Attributes checked for an explicit identifier, in order.
const ID_ATTRIBUTES: [&str; 3] = ["data-job-id", "data-id", "data-jobid"];

/// Derives job identifiers from matched link elements.
///
/// Priority, first match wins:
/// 1. Explicit identifier attributes, trimmed.
/// 2. A `jobId` query parameter (case-insensitive key).
/// 3. The `/job-detail/<slug>-<id>` path pattern, id alphanumeric and at
///    least 6 characters.
/// 4. The loose `/job-detail/<id>` path pattern.
/// 5. The raw href.
/// 6. The DOM `id` attribute, trimmed.
pub struct IdExtractor {
    query_param: Regex,
    slug_path: Regex,
    loose_path: Regex,
}

impl Default for IdExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IdExtractor {
    /// Compile the extraction patterns.
    pub fn new() -> Self {
        Self {
            query_param: Regex::new(r"[?&#](?i:jobid)=([A-Za-z0-9\-_:]+)").unwrap(),
            slug_path: Regex::new(r"/job-detail/[^/?#]+-([A-Za-z0-9]{6,})").unwrap(),
            loose_path: Regex::new(r"/job-detail/([A-Za-z0-9\-_:]+)").unwrap(),
        }
    }

    /// Derive an identifier for one matched element.
    pub fn extract(&self, element: &Element) -> Option<JobId> {
        for attr in ID_ATTRIBUTES {
            if let Some(value) = element.attr(attr) {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(JobId::new(value));
                }
            }
        }

        if let Some(href) = element.href() {
            let href = href.trim();
            if !href.is_empty() {
                if let Some(m) = self.query_param.captures(href).and_then(|c| c.get(1)) {
                    return Some(JobId::new(m.as_str()));
                }
                if let Some(m) = self.slug_path.captures(href).and_then(|c| c.get(1)) {
                    return Some(JobId::new(m.as_str()));
                }
                if let Some(m) = self.loose_path.captures(href).and_then(|c| c.get(1)) {
                    return Some(JobId::new(m.as_str()));
                }
                return Some(JobId::new(href));
            }
        }

        match element.attr("id").map(str::trim) {
            Some(dom_id) if !dom_id.is_empty() => Some(JobId::new(dom_id)),
            _ => None,
        }
    }
}
