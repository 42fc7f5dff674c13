//! In-memory title ledger.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::error::LedgerResult;
use crate::traits::ledger::TitleLedger;

/// Title ledger held entirely in memory.
///
/// Useful for tests and dry runs; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    titles: Arc<RwLock<HashSet<String>>>,
    lines: Arc<RwLock<Vec<String>>>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with already-recorded titles.
    pub fn with_titles<I, S>(self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut set = self.titles.write().unwrap();
            for title in titles {
                set.insert(title.into());
            }
        }
        self
    }

    /// The appended lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.read().unwrap().clone()
    }
}

#[async_trait]
impl TitleLedger for MemoryLedger {
    async fn contains(&self, title: &str) -> LedgerResult<bool> {
        Ok(self.titles.read().unwrap().contains(title))
    }

    async fn record(&self, title: &str, at: DateTime<Local>) -> LedgerResult<bool> {
        let mut set = self.titles.write().unwrap();
        if !set.insert(title.to_string()) {
            return Ok(false);
        }
        self.lines.write().unwrap().push(format!(
            "{} | Applied on: {}",
            title,
            at.format("%Y-%m-%d %H:%M:%S %Z")
        ));
        Ok(true)
    }

    async fn len(&self) -> LedgerResult<usize> {
        Ok(self.titles.read().unwrap().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_title_is_never_reappended() {
        let ledger = MemoryLedger::new();
        let now = Local::now();

        assert!(ledger.record("Senior Engineer | Acme", now).await.unwrap());
        assert!(!ledger.record("Senior Engineer | Acme", now).await.unwrap());
        assert!(!ledger.record("Senior Engineer | Acme", now).await.unwrap());

        assert_eq!(ledger.lines().len(), 1);
        assert_eq!(ledger.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seeded_titles_count_as_present() {
        let ledger = MemoryLedger::new().with_titles(["Past Job"]);
        assert!(ledger.contains("Past Job").await.unwrap());
        assert!(!ledger.record("Past Job", Local::now()).await.unwrap());
        assert!(ledger.lines().is_empty());
    }

    #[tokio::test]
    async fn test_line_format() {
        let ledger = MemoryLedger::new();
        ledger.record("Rust Developer", Local::now()).await.unwrap();

        let line = &ledger.lines()[0];
        assert!(line.starts_with("Rust Developer | Applied on: "));
    }
}
