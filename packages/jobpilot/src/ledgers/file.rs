//! File-backed title ledger.
//!
//! One line per unique title: `<title> | Applied on: <YYYY-MM-DD HH:MM:SS TZ>`.
//! Existing lines are loaded once at open; appends go straight to disk so a
//! crashed run still leaves the titles it recorded.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::LedgerResult;
use crate::traits::ledger::TitleLedger;

/// Separator between the title and its timestamp.
const APPLIED_MARKER: &str = " | Applied on: ";

/// Append-only ledger persisted to a text file.
pub struct FileLedger {
    path: PathBuf,
    titles: Mutex<HashSet<String>>,
}

impl FileLedger {
    /// Open a ledger, loading any titles already on disk.
    ///
    /// A missing file is an empty ledger; it is created on first append.
    pub async fn open(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let path = path.into();
        let mut titles = HashSet::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                for line in contents.lines() {
                    let title = match line.split_once(APPLIED_MARKER) {
                        Some((title, _)) => title,
                        None => line,
                    };
                    let title = title.trim();
                    if !title.is_empty() {
                        titles.insert(title.to_string());
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        info!(path = %path.display(), titles = titles.len(), "title ledger opened");
        Ok(Self {
            path,
            titles: Mutex::new(titles),
        })
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TitleLedger for FileLedger {
    async fn contains(&self, title: &str) -> LedgerResult<bool> {
        Ok(self.titles.lock().await.contains(title))
    }

    async fn record(&self, title: &str, at: DateTime<Local>) -> LedgerResult<bool> {
        let mut titles = self.titles.lock().await;
        if titles.contains(title) {
            return Ok(false);
        }

        let line = format!(
            "{}{}{}\n",
            title,
            APPLIED_MARKER,
            at.format("%Y-%m-%d %H:%M:%S %Z")
        );
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        titles.insert(title.to_string());
        Ok(true)
    }

    async fn len(&self) -> LedgerResult<usize> {
        Ok(self.titles.lock().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("jobpilot-ledger-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_ledger() {
        let path = temp_path("missing");
        let _ = tokio::fs::remove_file(&path).await;

        let ledger = FileLedger::open(&path).await.unwrap();
        assert!(ledger.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_reopen_sees_recorded_titles() {
        let path = temp_path("reopen");
        let _ = tokio::fs::remove_file(&path).await;

        {
            let ledger = FileLedger::open(&path).await.unwrap();
            assert!(ledger.record("Senior Engineer | Acme", Local::now()).await.unwrap());
        }

        let reopened = FileLedger::open(&path).await.unwrap();
        assert!(reopened.contains("Senior Engineer | Acme").await.unwrap());
        assert!(!reopened
            .record("Senior Engineer | Acme", Local::now())
            .await
            .unwrap());

        // Still a single line on disk.
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count(), 1);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_title_parsed_back_from_line_format() {
        let path = temp_path("format");
        let _ = tokio::fs::remove_file(&path).await;

        let ledger = FileLedger::open(&path).await.unwrap();
        ledger.record("Rust Developer", Local::now()).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let line = contents.lines().next().unwrap();
        assert!(line.starts_with("Rust Developer | Applied on: "));

        let reopened = FileLedger::open(&path).await.unwrap();
        assert!(reopened.contains("Rust Developer").await.unwrap());
        assert_eq!(reopened.len().await.unwrap(), 1);

        let _ = tokio::fs::remove_file(&path).await;
    }
}
