//! Similarity ranking of postings against the resume.
//!
//! Both texts go through the same normalization before embedding:
//! lowercase, strip non-alphabetic characters, drop stop words, light
//! rule-based lemmatization. Scores are embedding cosine
//! similarity in `[-1, 1]`; a posting with no description scores 0 and
//! sinks to the bottom.

use tracing::{debug, info};

use crate::error::Result;
use crate::traits::ai::ResumeAnalyzer;
use crate::types::job::{JobPosting, RankedJob};

/// Common English stop words dropped before embedding.
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "because",
    "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have",
    "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more",
    "most", "my", "no", "not", "of", "on", "or", "our", "out", "over", "she", "so", "some", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "to", "under",
    "up", "was", "we", "were", "what", "when", "which", "who", "will", "with", "would", "you",
    "your",
];

/// Normalize text for embedding.
pub fn preprocess(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_ascii_alphabetic() || c.is_whitespace() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .map(lemmatize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Conservative suffix-based lemmatization. Only the common inflections;
/// a wrong strip hurts more than a missed one.
fn lemmatize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{}y", stem);
        }
    }
    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{}ss", stem);
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if stem.len() >= 3 {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if stem.len() >= 3 {
            return stem.to_string();
        }
    }
    if word.len() >= 4 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Cosine similarity between two vectors. Zero when either is empty,
/// mismatched, or all-zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Score postings against the resume, best first.
pub async fn rank_by_fit(
    analyzer: &dyn ResumeAnalyzer,
    resume_text: &str,
    postings: &[JobPosting],
) -> Result<Vec<RankedJob>> {
    let resume_embedding = analyzer.embed(&preprocess(resume_text)).await?;

    let mut ranked = Vec::with_capacity(postings.len());
    for posting in postings {
        let score = if posting.description.trim().is_empty() {
            0.0
        } else {
            let embedding = analyzer.embed(&preprocess(&posting.description)).await?;
            cosine_similarity(&resume_embedding, &embedding)
        };
        debug!(job = %posting.id, score, "posting scored");
        ranked.push(RankedJob {
            id: posting.id.clone(),
            score,
        });
    }

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    info!(count = ranked.len(), "postings ranked");
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DeterministicAnalyzer;
    use crate::types::job::JobId;

    #[test]
    fn test_preprocess_strips_case_punctuation_and_stop_words() {
        let out = preprocess("The Engineers, and THE systems!");
        assert_eq!(out, "engineer system");
    }

    #[test]
    fn test_lemmatize_rules() {
        assert_eq!(lemmatize("libraries"), "library");
        assert_eq!(lemmatize("processes"), "process");
        assert_eq!(lemmatize("building"), "build");
        assert_eq!(lemmatize("tested"), "test");
        assert_eq!(lemmatize("systems"), "system");
        // Guarded cases stay put.
        assert_eq!(lemmatize("class"), "class");
        assert_eq!(lemmatize("status"), "status");
        assert_eq!(lemmatize("rust"), "rust");
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let a = vec![1.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[tokio::test]
    async fn test_identical_description_ranks_first_and_empty_sinks() {
        let resume = "Rust engineer building distributed systems";
        let analyzer = DeterministicAnalyzer::new();

        let postings = vec![
            JobPosting::new(JobId::from("empty"), ""),
            JobPosting::new(JobId::from("match"), resume),
            JobPosting::new(JobId::from("other"), "Accountant position in finance"),
        ];

        let ranked = rank_by_fit(&analyzer, resume, &postings).await.unwrap();
        assert_eq!(ranked[0].id.as_str(), "match");
        assert!((ranked[0].score - 1.0).abs() < 1e-5);

        let empty = ranked.iter().find(|r| r.id.as_str() == "empty").unwrap();
        assert_eq!(empty.score, 0.0);
    }
}
