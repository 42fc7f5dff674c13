//! Language model capabilities consumed by the pipeline.
//!
//! Two concerns, one trait: deriving search terms from resume text and
//! producing embeddings for similarity scoring. Implementations wrap a
//! specific provider; see [`crate::ai::OpenAi`] for the reference one.

use async_trait::async_trait;

use crate::error::Result;

/// Search terms inferred from a resume.
///
/// Both lists are capped at two entries; the model is prompted for exactly
/// that and anything extra is truncated on parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms {
    /// Most relevant job titles, at most two.
    pub job_titles: Vec<String>,

    /// Most relevant skills, at most two.
    pub skills: Vec<String>,
}

impl SearchTerms {
    /// Build a keyword string for one title, with skills appended.
    pub fn query_for(&self, title: &str) -> String {
        let mut parts = vec![title.to_string()];
        parts.extend(self.skills.iter().cloned());
        parts.join(" ")
    }
}

/// Resume analysis capability.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    /// Derive at most two job titles and two skills from resume text.
    ///
    /// A response missing either section fails with
    /// [`FlowError::Inference`](crate::error::FlowError::Inference).
    async fn infer_search_terms(&self, resume_text: &str) -> Result<SearchTerms>;

    /// Generate an embedding for text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}
