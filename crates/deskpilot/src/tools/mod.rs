//! Tool framework for agent-based execution
//!
//! A tool (capability) has a name, a one-line description that is shown to
//! the model, and an async `execute` over named arguments.

pub mod builtin;
pub mod registry;
pub mod router;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Named arguments of an action
pub type ToolArgs = Map<String, Value>;

/// Context provided to tools during execution
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Current working directory
    pub working_dir: PathBuf,
    /// Maximum output length (truncate if exceeded)
    pub max_output_len: usize,
    /// Default timeout for shell commands in seconds
    pub command_timeout_secs: u64,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            max_output_len: 50000,
            command_timeout_secs: 120,
        }
    }
}

impl ToolContext {
    /// Create a new context with the given working directory
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    pub fn with_max_output_len(mut self, len: usize) -> Self {
        self.max_output_len = len;
        self
    }

    /// Set command timeout
    pub fn with_command_timeout(mut self, secs: u64) -> Self {
        self.command_timeout_secs = secs;
        self
    }

    /// Resolve a path argument against the working directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path);
        if candidate.is_absolute() {
            candidate
        } else {
            self.working_dir.join(candidate)
        }
    }

    /// Truncate output to `max_output_len` on a char boundary
    pub fn truncate(&self, output: String) -> String {
        if output.len() <= self.max_output_len {
            return output;
        }
        let safe_end = output
            .char_indices()
            .take_while(|(idx, c)| idx + c.len_utf8() <= self.max_output_len)
            .last()
            .map(|(idx, c)| idx + c.len_utf8())
            .unwrap_or(0);
        format!(
            "{}\n\n[Output truncated at {} characters]",
            &output[..safe_end],
            safe_end
        )
    }
}

/// An action requested by the model: `{"tool": ..., "args": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Capability name
    #[serde(rename = "tool")]
    pub name: String,
    /// Named arguments
    #[serde(rename = "args", default)]
    pub arguments: ToolArgs,
}

impl ActionRequest {
    pub fn new(name: impl Into<String>, arguments: ToolArgs) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Compact JSON form recorded in the trace
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"tool\":\"{}\"}}", self.name))
    }
}

/// The Tool trait that all capabilities implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get a description of what the tool does, including its arguments
    fn description(&self) -> &str;

    /// Execute the tool with the given arguments
    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String>;
}

/// Fetch a required string argument
pub fn required_str<'a>(args: &'a ToolArgs, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: {}", key))
}

/// Fetch an optional string argument
pub fn optional_str<'a>(args: &'a ToolArgs, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// Fetch an integer argument, accepting numeric strings as well
pub fn optional_u64(args: &ToolArgs, key: &str) -> Option<u64> {
    match args.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
