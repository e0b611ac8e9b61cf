//! Gemini `generateContent` client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::backend::{preview, BackendError, ModelBackend};
use crate::config::Provider;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, BackendError> {
        let url = self.url();
        debug!(prompt = %preview(prompt, 200), "Sending prompt to Gemini");

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| BackendError::Network {
                provider: Provider::Gemini,
                url: url.clone(),
                source,
            })?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|source| BackendError::Network {
            provider: Provider::Gemini,
            url: url.clone(),
            source,
        })?;

        if !(200..300).contains(&status) {
            let err = classify_error(status, &text);
            error!(status, error = %err, "Gemini request failed");
            return Err(err);
        }

        let content = extract_text(&text)?;
        debug!(response = %preview(&content, 200), "Received response from Gemini");
        Ok(content)
    }
}

/// Map a non-success response to a [`BackendError`]
fn classify_error(status: u16, body: &str) -> BackendError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let api_status = parsed.and_then(|e| e.error.status).unwrap_or_default();

    let bad_key = message.contains("API key not valid")
        || message.contains("API_KEY_INVALID")
        || status == 401
        || api_status == "UNAUTHENTICATED";

    if bad_key {
        BackendError::InvalidCredential {
            provider: Provider::Gemini,
        }
    } else {
        BackendError::Http {
            provider: Provider::Gemini,
            status,
            message,
        }
    }
}

/// Pull the concatenated text of the first candidate out of a response body
fn extract_text(body: &str) -> Result<String, BackendError> {
    let resp: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Decode {
            provider: Provider::Gemini,
            message: e.to_string(),
        })?;

    let candidate = match resp.candidates.into_iter().next() {
        Some(c) => c,
        None => {
            let reason = resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt blocked ({})", r))
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(BackendError::EmptyResponse {
                provider: Provider::Gemini,
                reason,
            });
        }
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(BackendError::EmptyResponse {
            provider: Provider::Gemini,
            reason: format!(
                "finish reason {}",
                candidate.finish_reason.unwrap_or_else(|| "unknown".to_string())
            ),
        });
    }

    Ok(text.trim().to_string())
}
