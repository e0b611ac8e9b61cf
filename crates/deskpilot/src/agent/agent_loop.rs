//! One thought / action / observation cycle

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use llm_core::{BackendError, ModelBackend};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::tools::router::ToolRouter;
use crate::tools::ToolContext;

use super::interpreter::{self, ParsedAction, ParsedResponse, FINISH_TOOL, MISSING_TOOL};
use super::prompt;
use super::state::{AgentConfig, StepOutcome};
use super::trace::{EntryKind, Trace};

/// Observation recorded when a response has no usable thought and action
pub const PARSE_FAILURE: &str =
    "Error: Could not parse thought or action from response. Please check the format.";

/// Summary used when `finish` carries none
pub const DEFAULT_SUMMARY: &str = "Objective completed.";

// ANSI colors
const BLUE: &str = "\x1b[94m";
const YELLOW: &str = "\x1b[93m";
const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

/// Drives single cycles against a backend and the tool router
pub struct AgentLoop {
    backend: Arc<dyn ModelBackend>,
    router: ToolRouter,
    config: AgentConfig,
    tool_ctx: ToolContext,
    catalog: String,
}

impl AgentLoop {
    pub fn new(backend: Arc<dyn ModelBackend>, router: ToolRouter, config: AgentConfig) -> Self {
        let tool_ctx = ToolContext::new(config.working_dir.clone())
            .with_max_output_len(config.max_output_len)
            .with_command_timeout(config.command_timeout_secs);
        // Registry is immutable once the router owns it
        let catalog = router.registry().catalog();

        Self {
            backend,
            router,
            config,
            tool_ctx,
            catalog,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run exactly one cycle, appending to `trace`.
    ///
    /// Parse, dispatch and tool failures are recorded as observations and
    /// returned as non-terminal outcomes. Only a backend failure is an `Err`.
    #[instrument(skip(self, objective, trace), fields(model = %self.backend.model(), entries = trace.len()))]
    pub async fn step(&self, objective: &str, trace: &mut Trace) -> Result<StepOutcome, BackendError> {
        let prompt = prompt::build(objective, &self.catalog, trace);
        debug!(prompt_len = prompt.len(), "Calling model");

        let response = self.complete(&prompt).await?;
        debug!(response_len = response.len(), "Model responded");

        let (thought, action) = match interpreter::parse(&response) {
            ParsedResponse::Parsed { thought, action } => (thought, action),
            ParsedResponse::Failed(reason) => {
                error!(reason = %reason, "{}", PARSE_FAILURE);
                let observation = format!("{} ({})", PARSE_FAILURE, reason);
                self.record(trace, EntryKind::Observation, &observation);
                return Ok(StepOutcome::next(observation));
            }
        };

        info!(thought = %thought, "Thought");
        self.record(trace, EntryKind::Thought, &thought);

        let request = match action {
            ParsedAction::Request(request) => request,
            ParsedAction::MissingTool => {
                warn!("{}", MISSING_TOOL);
                self.record(trace, EntryKind::Observation, MISSING_TOOL);
                return Ok(StepOutcome::next(MISSING_TOOL));
            }
        };

        info!(tool = %request.name, args = ?request.arguments, "Action");
        self.record(trace, EntryKind::Action, &request.to_json());

        if request.name == FINISH_TOOL {
            let summary = request
                .arguments
                .get("summary")
                .and_then(summary_text)
                .unwrap_or_else(|| DEFAULT_SUMMARY.to_string());
            info!(summary = %summary, "Objective finished");
            return Ok(StepOutcome::finished(summary));
        }

        let observation = self.router.route(&request, &self.tool_ctx).await.into_observation();
        info!(observation = %preview(&observation, 300), "Observation");
        self.record(trace, EntryKind::Observation, &observation);

        Ok(StepOutcome::next(observation))
    }

    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let spinner = self.config.verbose.then(thinking_spinner);
        let result = self.backend.complete(prompt, self.config.temperature).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        result
    }

    fn record(&self, trace: &mut Trace, kind: EntryKind, content: &str) {
        if self.config.verbose {
            let color = match kind {
                EntryKind::Thought => BLUE,
                EntryKind::Action => YELLOW,
                EntryKind::Observation if content.starts_with("Error") => RED,
                EntryKind::Observation => GREEN,
            };
            println!("{}{}:{} {}", color, kind, RESET, preview(content, 2000));
        }
        trace.push(kind, content);
    }
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// `summary` may come back as any JSON value
fn summary_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
