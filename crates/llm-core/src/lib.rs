//! llm-core: model backends for the deskpilot agent
//!
//! Provides:
//! - Model configuration (`[model]` table)
//! - The `ModelBackend` completion trait and its error type
//! - Gemini and Ollama clients

pub mod backend;
pub mod config;
pub mod gemini;
pub mod ollama;

pub use backend::{connect, BackendError, ModelBackend};
pub use config::{ModelConfig, Provider};
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
