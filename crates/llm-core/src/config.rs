//! Model backend configuration
//!
//! Lives in the `[model]` table of the deskpilot config file. The API key is
//! never expected in the file itself; it is read from the environment
//! variable named by `api_key_env`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which completion service to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini (`generateContent` REST API)
    #[default]
    Gemini,
    /// Local Ollama server (`/api/generate`)
    Ollama,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "ollama" => Ok(Provider::Ollama),
            other => Err(format!("unknown model provider '{}' (expected gemini or ollama)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Model identifier passed to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Override for the provider base URL
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,

    #[serde(default = "default_ollama_port")]
    pub ollama_port: u16,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

fn default_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_ollama_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ollama_port() -> u16 {
    11434
}

fn default_request_timeout() -> u64 {
    300
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: None,
            ollama_host: default_ollama_host(),
            ollama_port: default_ollama_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ModelConfig {
    /// Read the API key from the configured environment variable.
    /// Blank values count as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Base URL for the configured provider
    pub fn endpoint(&self) -> String {
        if let Some(ref url) = self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.provider {
            Provider::Gemini => DEFAULT_GEMINI_URL.to_string(),
            Provider::Ollama => format!("http://{}:{}", self.ollama_host, self.ollama_port),
        }
    }
}
