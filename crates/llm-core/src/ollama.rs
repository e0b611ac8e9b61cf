//! Ollama API client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::backend::{preview, BackendError, ModelBackend};
use crate::config::Provider;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new client; `timeout_secs` bounds each generate call
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            model: model.into(),
            client,
        }
    }

    /// Check if Ollama is running
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaClient {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(prompt = %preview(prompt, 200), "Sending prompt to Ollama");

        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature },
        };

        let resp = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|source| BackendError::Network {
                provider: Provider::Ollama,
                url: url.clone(),
                source,
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|source| BackendError::Network {
            provider: Provider::Ollama,
            url: url.clone(),
            source,
        })?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            error!(status, error = %message, "Ollama request failed");
            return Err(BackendError::Http {
                provider: Provider::Ollama,
                status,
                message,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::Decode {
                provider: Provider::Ollama,
                message: e.to_string(),
            })?;

        let content = parsed.response.trim().to_string();
        if content.is_empty() {
            return Err(BackendError::EmptyResponse {
                provider: Provider::Ollama,
                reason: "empty response field".to_string(),
            });
        }

        debug!(response = %preview(&content, 200), "Received response from Ollama");
        Ok(content)
    }
}
