//! Resume text provider capability.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// Source of plain resume text.
#[async_trait]
pub trait ResumeSource: Send + Sync {
    /// Extract the full text of a resume file.
    ///
    /// Fails with
    /// [`FlowError::ResumeExtraction`](crate::error::FlowError::ResumeExtraction)
    /// when the file is unreadable or contains no extractable text.
    async fn extract_text(&self, path: &Path) -> Result<String>;
}
