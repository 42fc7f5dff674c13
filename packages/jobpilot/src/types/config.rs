//! Configuration types for search, harvesting, and the apply flow.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::job::JobId;

/// Board endpoints driven by the pipeline.
///
/// The board's HTML contract is unversioned and may change without notice;
/// these URLs are the only stable part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Login page URL.
    pub login_url: String,

    /// Search page URL.
    pub search_url: String,

    /// Prefix a job identifier is appended to for the detail page.
    pub detail_base: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            login_url: "https://www.dice.com/dashboard/login".to_string(),
            search_url: "https://www.dice.com/jobs".to_string(),
            detail_base: "https://www.dice.com/job-detail/".to_string(),
        }
    }
}

impl BoardConfig {
    /// Detail page URL for a job.
    pub fn detail_url(&self, id: &JobId) -> String {
        format!("{}{}", self.detail_base, id)
    }
}

/// One search to run: keywords, location, and optional refinements.
///
/// Refinements are best-effort: an absent filter control is logged and
/// skipped, never fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Keyword query.
    pub keywords: String,

    /// Location query (e.g. "Denver" or "remote").
    pub location: String,

    /// Apply the Third Party filter if present.
    pub third_party_filter: bool,

    /// Apply the Easy Apply filter if present.
    pub easy_apply_filter: bool,

    /// Narrow to recent postings ("Last 3 days") if the control is found.
    pub recent_filter: bool,

    /// Requested results-per-page, selected by value then by label.
    pub page_size: Option<u32>,
}

impl Default for SearchSpec {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            location: String::new(),
            third_party_filter: true,
            easy_apply_filter: true,
            recent_filter: true,
            page_size: Some(100),
        }
    }
}

impl SearchSpec {
    /// Create a spec for a keyword query.
    pub fn new(keywords: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    /// Replace the keyword query.
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    /// Disable all optional refinements.
    pub fn without_filters(mut self) -> Self {
        self.third_party_filter = false;
        self.easy_apply_filter = false;
        self.recent_filter = false;
        self.page_size = None;
        self
    }
}

/// Bounds and pacing for one listing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Hard cap on pagination/scroll rounds. Bounds worst-case runtime
    /// against pagination that never signals completion.
    pub max_rounds: usize,

    /// Budget for the initial any-result wait; exceeding it is
    /// [`FlowError::NoResults`](crate::error::FlowError::NoResults).
    pub initial_wait_ms: u64,

    /// Per-candidate budget when probing advance controls.
    pub control_wait_ms: u64,

    /// Best-effort network-idle budget after advancing.
    pub idle_wait_ms: u64,

    /// Settle delay after an advance with no observable completion signal.
    pub settle_ms: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            initial_wait_ms: 30_000,
            control_wait_ms: 1_500,
            idle_wait_ms: 8_000,
            settle_ms: 1_000,
        }
    }
}

impl HarvestConfig {
    /// Set the round cap.
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    /// Set the initial any-result wait budget.
    pub fn with_initial_wait(mut self, wait: Duration) -> Self {
        self.initial_wait_ms = wait.as_millis() as u64;
        self
    }

    /// Initial wait as a [`Duration`].
    pub fn initial_wait(&self) -> Duration {
        Duration::from_millis(self.initial_wait_ms)
    }

    /// Advance-control probe budget as a [`Duration`].
    pub fn control_wait(&self) -> Duration {
        Duration::from_millis(self.control_wait_ms)
    }

    /// Network-idle budget as a [`Duration`].
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    /// Settle delay as a [`Duration`].
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Inputs for the application state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyConfig {
    /// Resume file supplied to the upload flow.
    pub resume_path: PathBuf,

    /// Marker text whose presence means a resume upload is required.
    pub resume_marker: String,

    /// Text the easy-apply confirmation element must contain.
    pub confirmation_text: String,

    /// Visible text the final flow control must contain.
    pub submit_label: String,

    /// Per-control wait budget inside the flow.
    pub step_wait_ms: u64,

    /// Settle delay after flow steps with no observable completion signal.
    pub settle_ms: u64,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            resume_path: PathBuf::new(),
            resume_marker: "A resume is required to proceed".to_string(),
            confirmation_text: "Application Submitted".to_string(),
            submit_label: "Submit".to_string(),
            step_wait_ms: 5_000,
            settle_ms: 1_000,
        }
    }
}

impl ApplyConfig {
    /// Create a config for a resume file.
    pub fn new(resume_path: impl Into<PathBuf>) -> Self {
        Self {
            resume_path: resume_path.into(),
            ..Default::default()
        }
    }

    /// Per-control wait as a [`Duration`].
    pub fn step_wait(&self) -> Duration {
        Duration::from_millis(self.step_wait_ms)
    }

    /// Settle delay as a [`Duration`].
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Configuration for a whole pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PilotConfig {
    /// Board endpoints.
    pub board: BoardConfig,

    /// Search template; the keyword query is replaced per inferred title.
    pub search: SearchSpec,

    /// Listing session bounds.
    pub harvest: HarvestConfig,

    /// Apply flow inputs.
    pub apply: ApplyConfig,

    /// Skip postings scoring below this similarity.
    pub min_score: Option<f32>,

    /// Stop after this many submitted applications.
    pub max_applications: Option<usize>,
}

impl PilotConfig {
    /// Create a config with a resume file and location.
    pub fn new(resume_path: impl Into<PathBuf>, location: impl Into<String>) -> Self {
        Self {
            apply: ApplyConfig::new(resume_path),
            search: SearchSpec::new("", location),
            ..Default::default()
        }
    }

    /// Set the minimum similarity score.
    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score);
        self
    }

    /// Cap the number of applications.
    pub fn with_max_applications(mut self, max: usize) -> Self {
        self.max_applications = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_url() {
        let board = BoardConfig::default();
        let url = board.detail_url(&JobId::from("AB12345"));
        assert_eq!(url, "https://www.dice.com/job-detail/AB12345");
    }

    #[test]
    fn test_search_spec_without_filters() {
        let spec = SearchSpec::new("rust engineer", "remote").without_filters();
        assert!(!spec.third_party_filter);
        assert!(!spec.easy_apply_filter);
        assert!(!spec.recent_filter);
        assert_eq!(spec.page_size, None);
    }
}
