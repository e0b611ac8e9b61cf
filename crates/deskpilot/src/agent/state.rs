//! Agent configuration and per-objective state

use std::path::PathBuf;

use super::trace::Trace;

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum cycles per objective before stopping
    pub max_steps: usize,
    /// Sampling temperature passed to the backend
    pub temperature: f32,
    /// Whether to print each thought, action and observation
    pub verbose: bool,
    /// Working directory for capabilities
    pub working_dir: PathBuf,
    /// Capability output is truncated past this many bytes
    pub max_output_len: usize,
    /// Default timeout for shell commands
    pub command_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            temperature: 0.1,
            verbose: true,
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            max_output_len: 50000,
            command_timeout_secs: 120,
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_max_output_len(mut self, len: usize) -> Self {
        self.max_output_len = len;
        self
    }

    pub fn with_command_timeout(mut self, secs: u64) -> Self {
        self.command_timeout_secs = secs;
        self
    }
}

/// State of one objective from `run` to its return
#[derive(Debug)]
pub struct ObjectiveRun {
    pub objective: String,
    pub trace: Trace,
    /// Cycles executed so far
    pub step_count: usize,
}

impl ObjectiveRun {
    pub fn new(objective: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            trace: Trace::new(),
            step_count: 0,
        }
    }
}

/// Result of one loop cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub observation: String,
    pub is_terminal: bool,
}

impl StepOutcome {
    pub fn next(observation: impl Into<String>) -> Self {
        Self {
            observation: observation.into(),
            is_terminal: false,
        }
    }

    pub fn finished(summary: impl Into<String>) -> Self {
        Self {
            observation: summary.into(),
            is_terminal: true,
        }
    }
}
