//! Scripted backend and tools shared by the loop and orchestrator tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use llm_core::{BackendError, ModelBackend, Provider};
use serde_json::{json, Value};

use crate::tools::registry::ToolRegistry;
use crate::tools::router::ToolRouter;
use crate::tools::{Tool, ToolArgs, ToolContext};

use super::{AgentConfig, AgentLoop};

/// Replays canned responses in order, then repeats `fallback`
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(response: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Some(response.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, BackendError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.responses.lock().unwrap().pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(text) => Ok(text),
            None => Err(BackendError::Http {
                provider: Provider::Ollama,
                status: 503,
                message: "script exhausted".to_string(),
            }),
        }
    }
}

/// Always fails with a credential error
pub struct RejectingBackend;

#[async_trait]
impl ModelBackend for RejectingBackend {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn model(&self) -> &str {
        "gemini-2.5-pro"
    }

    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String, BackendError> {
        Err(BackendError::InvalidCredential {
            provider: Provider::Gemini,
        })
    }
}

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes the text argument. Args: text (str)."
    }

    async fn execute(&self, args: &ToolArgs, _ctx: &ToolContext) -> Result<String> {
        Ok(format!("echo: {}", args.get("text").and_then(Value::as_str).unwrap_or("")))
    }
}

pub struct DiskFullTool;

#[async_trait]
impl Tool for DiskFullTool {
    fn name(&self) -> &str {
        "file_system"
    }

    fn description(&self) -> &str {
        "Always fails."
    }

    async fn execute(&self, _args: &ToolArgs, _ctx: &ToolContext) -> Result<String> {
        anyhow::bail!("disk full")
    }
}

/// A fenced action block as the model would write it
pub fn action_block(thought: &str, tool: &str, args: Value) -> String {
    let body = json!({"thought": thought, "action": {"tool": tool, "args": args}});
    format!(
        "Here is my next step.\n```json\n{}\n```",
        serde_json::to_string_pretty(&body).unwrap()
    )
}

pub fn finish_block(summary: &str) -> String {
    action_block("done", "finish", json!({"summary": summary}))
}

pub fn agent_with(backend: Arc<ScriptedBackend>, max_steps: usize) -> AgentLoop {
    let mut registry = ToolRegistry::new();
    registry.register(EchoTool);
    registry.register(DiskFullTool);

    let config = AgentConfig::new()
        .with_max_steps(max_steps)
        .with_verbose(false)
        .with_working_dir(std::env::temp_dir());
    AgentLoop::new(backend, ToolRouter::new(Arc::new(registry)), config)
}
