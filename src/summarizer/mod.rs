//! Gemini `generateContent` client used by the summarize proxy.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;

pub const SUMMARY_INSTRUCTION: &str = "You are an AI that summarizes notes. Provide only the summary of the following content in **well-structured format**, suitable for displaying directly on a screen. Do not include any extra commentary, disclaimers, or asterisks.";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("Request to model failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Model API responded with {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Model returned no text")]
    EmptyResponse,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Content {
    fn turn(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|part| part.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Seeds the conversation with the summarization instruction as a model turn,
/// then asks about `note`.
fn conversation(note: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![
            Content::turn("user", "Hello"),
            Content::turn("model", SUMMARY_INSTRUCTION),
            Content::turn("user", note),
        ],
    }
}

pub struct Summarizer {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl Summarizer {
    pub fn new(client: Client, gemini: &GeminiConfig) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                gemini.base_url.trim_end_matches('/'),
                gemini.model
            ),
            api_key: gemini.api_key.clone(),
        }
    }

    pub async fn summarize(&self, note: &str) -> Result<String, SummarizerError> {
        tracing::debug!("Requesting summary for {} bytes of note text", note.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&conversation(note))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Api { status, body });
        }

        response
            .json::<GenerateContentResponse>()
            .await?
            .text()
            .ok_or(SummarizerError::EmptyResponse)
    }
}
