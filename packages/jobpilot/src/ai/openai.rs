//! OpenAI implementation of the [`ResumeAnalyzer`] trait.
//!
//! Uses chat completions for search-term inference and the embeddings
//! endpoint for similarity scoring.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};
use crate::traits::ai::{ResumeAnalyzer, SearchTerms};

const TERMS_SYSTEM_PROMPT: &str = "You are an expert resume analyzer and evaluator. \
Analyze resumes to generate the top 2 most relevant job titles and top 2 most relevant skills \
that fit the candidate's experience, background, and skillset for a job board search. \
Do not generate more than 2 job titles and 2 skills. Do not use connection words like and or or \
to combine words. Do not repeat the same keywords in both job titles and skills. \
Respond in the following format:\n\n\
Job Titles: <Comma-separated job titles>\n\
Skills: <Comma-separated skills>";

/// OpenAI-backed analyzer.
#[derive(Clone)]
pub struct OpenAi {
    client: Client,
    api_key: String,
    model: String,
    embedding_model: String,
    base_url: String,
}

impl OpenAi {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| FlowError::Inference {
            reason: "OPENAI_API_KEY not set".to_string(),
        })?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the embedding model (default: text-embedding-3-small).
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: Some(0.5),
            max_tokens: Some(2000),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| inference_error(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(inference_error(format!("API error: {}", error_text)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| inference_error(format!("malformed response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| inference_error("no choices in response"))
    }
}

fn inference_error(reason: impl Into<String>) -> FlowError {
    FlowError::Inference {
        reason: reason.into(),
    }
}

/// Parse the fixed two-line response format. Missing either section is a
/// malformed response.
fn parse_terms(text: &str) -> Result<SearchTerms> {
    let mut job_titles = Vec::new();
    let mut skills = Vec::new();

    for line in text.lines() {
        if let Some(rest) = line.split_once("Job Titles:").map(|(_, r)| r) {
            job_titles = split_terms(rest);
        } else if let Some(rest) = line.split_once("Skills:").map(|(_, r)| r) {
            skills = split_terms(rest);
        }
    }

    if job_titles.is_empty() || skills.is_empty() {
        return Err(inference_error(format!(
            "response missing job titles or skills: {:?}",
            text
        )));
    }

    job_titles.truncate(2);
    skills.truncate(2);
    Ok(SearchTerms { job_titles, skills })
}

fn split_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl ResumeAnalyzer for OpenAi {
    async fn infer_search_terms(&self, resume_text: &str) -> Result<SearchTerms> {
        let user = format!(
            "Here is the text extracted from a resume:\n\n{}\n\n\
             Based on this resume, provide job titles and skills in the specified format.",
            resume_text
        );
        let content = self.chat(TERMS_SYSTEM_PROMPT, &user).await?;
        parse_terms(&content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| inference_error(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(inference_error(format!("embedding error: {}", error_text)));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| inference_error(format!("malformed embedding response: {}", e)))?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| inference_error("no embedding in response"))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terms_well_formed() {
        let terms = parse_terms(
            "Job Titles: Backend Engineer, Systems Engineer\nSkills: Rust, Kubernetes",
        )
        .unwrap();
        assert_eq!(terms.job_titles, vec!["Backend Engineer", "Systems Engineer"]);
        assert_eq!(terms.skills, vec!["Rust", "Kubernetes"]);
    }

    #[test]
    fn test_parse_terms_caps_at_two() {
        let terms =
            parse_terms("Job Titles: A, B, C, D\nSkills: W, X, Y, Z").unwrap();
        assert_eq!(terms.job_titles.len(), 2);
        assert_eq!(terms.skills.len(), 2);
    }

    #[test]
    fn test_parse_terms_missing_section_is_inference_error() {
        let result = parse_terms("Job Titles: Backend Engineer");
        assert!(matches!(result, Err(FlowError::Inference { .. })));

        let result = parse_terms("Skills: Rust");
        assert!(matches!(result, Err(FlowError::Inference { .. })));

        let result = parse_terms("nothing useful at all");
        assert!(matches!(result, Err(FlowError::Inference { .. })));
    }

    #[test]
    fn test_parse_terms_tolerates_leading_prose() {
        let terms = parse_terms(
            "Here are the results.\nJob Titles: Data Engineer\nSkills: Python, SQL",
        )
        .unwrap();
        assert_eq!(terms.job_titles, vec!["Data Engineer"]);
        assert_eq!(terms.skills, vec!["Python", "SQL"]);
    }

    #[test]
    fn test_query_for_appends_skills() {
        let terms = parse_terms("Job Titles: Data Engineer\nSkills: Python, SQL").unwrap();
        assert_eq!(terms.query_for("Data Engineer"), "Data Engineer Python SQL");
    }
}
