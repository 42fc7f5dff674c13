//! Typed errors for the automation pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. The taxonomy mirrors the
//! containment scopes of the pipeline: run-fatal, session-fatal, per-step.

use thiserror::Error;

/// Errors that abort a run or a listing session.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Login sequence could not complete. Fatal to the whole run.
    #[error("authentication failed: {reason}")]
    Authentication { reason: String },

    /// No result markers ever appeared for a listing session.
    #[error("no search results appeared")]
    NoResults,

    /// Resume text could not be extracted. Fatal to the run.
    #[error("resume extraction failed: {0}")]
    ResumeExtraction(String),

    /// The language model response was malformed. Fatal to the run.
    #[error("search term inference failed: {reason}")]
    Inference { reason: String },

    /// Page interaction failed outside any containment boundary.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// Title ledger could not be read or appended.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors surfaced by a [`PageDriver`](crate::traits::page::PageDriver)
/// implementation. Per-step and transient: callers decide whether a given
/// failure is skippable (optional element) or escalates.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A wait exceeded its timeout.
    #[error("timed out waiting for `{selector}`")]
    Timeout { selector: String },

    /// No element matched the selector.
    #[error("no element matched `{selector}`")]
    NotFound { selector: String },

    /// Navigation failed or never settled.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Script evaluation failed or returned an unusable value.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// Filling, clicking, or file selection failed on a located element.
    #[error("input failed: {0}")]
    Input(String),

    /// The underlying browser backend failed.
    #[error("browser backend error: {0}")]
    Backend(String),

    /// The page or tab was already closed.
    #[error("page is closed")]
    Closed,
}

/// Errors from title ledger implementations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Ledger file could not be opened, read, or appended.
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures inside one application attempt.
///
/// Contained at the per-job boundary: the apply flow converts these into
/// an [`ApplyOutcome::Abandoned`](crate::types::job::ApplyOutcome) and the
/// batch continues. They never cross to the run level.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Page interaction failed mid-flow.
    #[error("{0}")]
    Driver(#[from] DriverError),

    /// The title ledger failed mid-flow.
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Result type alias for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Result type alias for steps inside one application attempt.
pub type ApplyResult<T> = std::result::Result<T, ApplyError>;
