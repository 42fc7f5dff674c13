//! Title ledger trait.
//!
//! The ledger is the only durable artifact of a run: an append-only log of
//! applied job titles used for deduplication across runs. The title, not
//! the job identifier, is the dedup key: the same posting can be
//! re-scraped under a different identifier encoding.

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::LedgerResult;

/// Append-only record of applied job titles.
#[async_trait]
pub trait TitleLedger: Send + Sync {
    /// Whether a title was already recorded.
    async fn contains(&self, title: &str) -> LedgerResult<bool>;

    /// Record a title with its timestamp.
    ///
    /// Returns `false` without appending when the title is already present.
    async fn record(&self, title: &str, at: DateTime<Local>) -> LedgerResult<bool>;

    /// Number of recorded titles.
    async fn len(&self) -> LedgerResult<usize>;

    /// Whether the ledger is empty.
    async fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len().await? == 0)
    }
}
