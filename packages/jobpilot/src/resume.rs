//! PDF resume text extraction.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::error::{FlowError, Result};
use crate::traits::resume::ResumeSource;

/// Extracts resume text from a PDF file.
#[derive(Debug, Clone, Default)]
pub struct PdfResume;

impl PdfResume {
    /// Create an extractor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResumeSource for PdfResume {
    async fn extract_text(&self, path: &Path) -> Result<String> {
        let path = path.to_path_buf();
        let path_display = path.display().to_string();

        // pdf-extract is blocking; keep it off the async runtime threads.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|e| FlowError::ResumeExtraction(format!("extraction task failed: {}", e)))?
            .map_err(|e| FlowError::ResumeExtraction(format!("{}: {}", path_display, e)))?;

        if text.trim().is_empty() {
            return Err(FlowError::ResumeExtraction(format!(
                "{}: no extractable text",
                path_display
            )));
        }

        info!(path = %path_display, chars = text.len(), "resume text extracted");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreadable_file_is_extraction_error() {
        let result = PdfResume::new()
            .extract_text(Path::new("/nonexistent/resume.pdf"))
            .await;
        assert!(matches!(result, Err(FlowError::ResumeExtraction(_))));
    }
}
