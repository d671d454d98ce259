//! Intent extraction with the Gemini `generateContent` REST API.

use crate::error::Res;
use crate::intent::{prompt, Intent, IntentExtractor};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Asks a Gemini model for the intent of a message.
#[derive(Clone)]
pub struct GeminiExtractor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiExtractor {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, text: &str, today: NaiveDate) -> Res<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = GenerateContentRequest {
            contents: vec![Content::user(prompt::user_prompt(text))],
            system_instruction: Some(Content::user(prompt::system_prompt(today))),
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Unable to reach the Gemini API")?;
        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            bail!("Gemini API error (status {status}): {err_text}");
        }

        let body: GenerateContentResponse = res
            .json()
            .await
            .context("Unable to read the Gemini response")?;
        body.text()
    }
}

#[async_trait::async_trait]
impl IntentExtractor for GeminiExtractor {
    async fn extract(&self, text: &str, today: NaiveDate) -> Intent {
        info!("Sending a message to {} for intent extraction", self.model);
        match self.generate(text, today).await {
            Ok(reply) => {
                debug!("Raw Gemini reply: {reply}");
                Intent::from_reply(&reply)
            }
            Err(e) => {
                error!("Intent extraction failed: {e:#}");
                Intent::Error {
                    details: format!("{e:#}"),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: String) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: Some(text) }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// The text of the first part of the first candidate.
    fn text(self) -> Res<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .context("No candidates returned")?;
        candidate
            .content
            .context("The candidate has no content")?
            .parts
            .into_iter()
            .find_map(|p| p.text)
            .context("The model returned no text")
    }
}
