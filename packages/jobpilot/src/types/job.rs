//! Job identity and posting types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque job identifier, unique within a listing session.
///
/// Derived by [`IdExtractor`](crate::identity::IdExtractor), never
/// user-supplied. Equality is exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Wrap an already-derived identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A scraped job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    /// The derived identifier.
    pub id: JobId,

    /// Description text; empty when the detail page had no description
    /// container.
    pub description: String,
}

impl JobPosting {
    /// Create a posting.
    pub fn new(id: JobId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }
}

/// A posting with its similarity score against the resume.
#[derive(Debug, Clone)]
pub struct RankedJob {
    /// The derived identifier.
    pub id: JobId,

    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// Terminal state of one application attempt.
///
/// A failed job never aborts the batch; failures surface here, not as
/// errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// One-click application confirmed submitted.
    EasyApplied,

    /// Multi-step flow completed through the submit control.
    Submitted,

    /// Title already in the ledger; no application attempted.
    DuplicateTitle,

    /// A required control was missing mid-flow.
    Abandoned {
        /// Human-readable reason, for the log.
        reason: String,
    },
}

impl ApplyOutcome {
    /// Abandon with a reason.
    pub fn abandoned(reason: impl Into<String>) -> Self {
        Self::Abandoned {
            reason: reason.into(),
        }
    }

    /// Whether the attempt ended in a submitted application.
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::EasyApplied | Self::Submitted)
    }
}
