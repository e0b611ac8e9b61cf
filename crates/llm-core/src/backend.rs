//! Completion backend abstraction

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{ModelConfig, Provider};
use crate::gemini::GeminiClient;
use crate::ollama::OllamaClient;

/// Errors raised by a model backend.
///
/// Credential problems are kept apart from transport failures so callers
/// can show a configuration-specific message.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{provider} API key is not configured. Set the {env_var} environment variable.")]
    MissingCredential { provider: Provider, env_var: String },

    #[error("The provided {provider} API key is not valid. Please check your configuration.")]
    InvalidCredential { provider: Provider },

    #[error("Failed to reach {provider} at {url}: {source}")]
    Network {
        provider: Provider,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}: {message}")]
    Http {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("{provider} returned no usable text: {reason}")]
    EmptyResponse { provider: Provider, reason: String },

    #[error("Failed to decode {provider} response: {message}")]
    Decode { provider: Provider, message: String },
}

impl BackendError {
    /// Whether the error stems from configuration rather than the service
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BackendError::MissingCredential { .. } | BackendError::InvalidCredential { .. }
        )
    }
}

/// A text-completion service
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Provider the backend talks to
    fn provider(&self) -> Provider;

    /// Model identifier in use
    fn model(&self) -> &str;

    /// Send a prompt and return the trimmed completion text
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, BackendError>;
}

/// Construct the backend described by `config`.
///
/// Fails with [`BackendError::MissingCredential`] when a provider that needs
/// an API key has none configured.
pub fn connect(config: &ModelConfig) -> Result<Box<dyn ModelBackend>, BackendError> {
    let backend: Box<dyn ModelBackend> = match config.provider {
        Provider::Gemini => {
            let api_key = config.api_key().ok_or_else(|| BackendError::MissingCredential {
                provider: Provider::Gemini,
                env_var: config.api_key_env.clone(),
            })?;
            Box::new(GeminiClient::new(
                config.endpoint(),
                api_key,
                config.model.clone(),
                config.request_timeout_secs,
            ))
        }
        Provider::Ollama => Box::new(OllamaClient::new(
            config.endpoint(),
            config.model.clone(),
            config.request_timeout_secs,
        )),
    };

    info!(provider = %backend.provider(), model = %backend.model(), "Model backend ready");
    Ok(backend)
}

/// Shorten text for log lines
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_gemini_without_key_fails() {
        let config = ModelConfig {
            api_key_env: "LLM_CORE_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        std::env::remove_var("LLM_CORE_TEST_UNSET_KEY");

        let err = connect(&config).err().unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("LLM_CORE_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_connect_ollama_needs_no_key() {
        let config = ModelConfig {
            provider: Provider::Ollama,
            model: "llama3.2".to_string(),
            ..Default::default()
        };

        let backend = connect(&config).unwrap();
        assert_eq!(backend.provider(), Provider::Ollama);
        assert_eq!(backend.model(), "llama3.2");
    }

    #[test]
    fn test_invalid_credential_is_configuration() {
        let err = BackendError::InvalidCredential {
            provider: Provider::Gemini,
        };
        assert!(err.is_configuration());

        let err = BackendError::Http {
            provider: Provider::Gemini,
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdefghij", 4), "abcd...");
    }
}
