//! User configuration for deskpilot
//!
//! Configuration file: ~/.config/deskpilot/config.toml (or platform equivalent)

use anyhow::{Context, Result};
use llm_core::ModelConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default WebDriver endpoint (chromedriver's default port)
pub const DEFAULT_WEBDRIVER_URL: &str = "http://127.0.0.1:9515";

/// User configuration for deskpilot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentSection,

    /// Model backend settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Browser automation settings
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// `[agent]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Cycles per objective before giving up
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Sampling temperature for every model call
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Echo thoughts, actions and observations while running
    #[serde(default = "default_true")]
    pub verbose: bool,

    /// Capability output is truncated past this many bytes
    #[serde(default = "default_max_output_len")]
    pub max_output_len: usize,

    /// Default timeout for `system_command`
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// tracing filter directive, e.g. "info" or "deskpilot=debug"
    #[serde(default)]
    pub log_level: Option<String>,
}

/// `[browser]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Existing WebDriver server; when unset a local chromedriver is spawned
    #[serde(default)]
    pub webdriver_url: Option<String>,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Timeout for individual WebDriver requests
    #[serde(default = "default_browser_timeout")]
    pub request_timeout_secs: u64,
}

fn default_max_steps() -> usize {
    100
}

fn default_temperature() -> f32 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_max_output_len() -> usize {
    50000
}

fn default_command_timeout() -> u64 {
    120
}

fn default_browser_timeout() -> u64 {
    60
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            temperature: default_temperature(),
            verbose: true,
            max_output_len: default_max_output_len(),
            command_timeout_secs: default_command_timeout(),
            log_level: None,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            headless: true,
            request_timeout_secs: default_browser_timeout(),
        }
    }
}

impl BrowserConfig {
    /// WebDriver base URL without trailing slash
    pub fn endpoint(&self) -> String {
        self.webdriver_url
            .as_deref()
            .unwrap_or(DEFAULT_WEBDRIVER_URL)
            .trim_end_matches('/')
            .to_string()
    }
}

impl UserConfig {
    /// Load user configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("deskpilot").join("config.toml"))
    }

    /// Create a default configuration file with comments
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::write_default(&path)?;
        Ok(path)
    }

    fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

const DEFAULT_CONFIG: &str = r#"# deskpilot configuration
# Location: ~/.config/deskpilot/config.toml

[agent]
# Model calls per objective before the run is stopped
max_steps = 100

# Sampling temperature for every model call
temperature = 0.1

# Print each thought, action and observation
verbose = true

# Truncate capability output past this many bytes
max_output_len = 50000

# Default timeout for system_command, in seconds
command_timeout_secs = 120

# tracing filter (RUST_LOG takes precedence)
# log_level = "info"

[model]
# "gemini" or "ollama"
provider = "gemini"
model = "gemini-2.5-pro"

# Environment variable holding the API key
api_key_env = "GEMINI_API_KEY"

# Override the API endpoint
# base_url = "https://generativelanguage.googleapis.com"

# Local Ollama server (provider = "ollama")
ollama_host = "127.0.0.1"
ollama_port = 11434

request_timeout_secs = 300

[browser]
# Use an already running WebDriver server instead of spawning chromedriver
# webdriver_url = "http://127.0.0.1:9515"
headless = true
request_timeout_secs = 60
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use llm_core::Provider;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert_eq!(config.agent.max_steps, 100);
        assert!((config.agent.temperature - 0.1).abs() < f32::EPSILON);
        assert!(config.agent.verbose);
        assert_eq!(config.browser.endpoint(), DEFAULT_WEBDRIVER_URL);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[agent]
max_steps = 5

[model]
provider = "ollama"
model = "llama3.2"

[browser]
webdriver_url = "http://localhost:4444/"
headless = false
"#;

        let config: UserConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.agent.max_steps, 5);
        assert_eq!(config.agent.command_timeout_secs, 120);
        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.model.model, "llama3.2");
        assert_eq!(config.browser.endpoint(), "http://localhost:4444");
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_default_file_matches_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deskpilot").join("config.toml");

        UserConfig::write_default(&path).unwrap();
        let loaded = UserConfig::load_from(&path).unwrap();
        assert_eq!(loaded.agent.max_steps, 100);
        assert_eq!(loaded.model.api_key_env, "GEMINI_API_KEY");
        assert!(loaded.browser.webdriver_url.is_none());

        assert!(UserConfig::write_default(&path).is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = UserConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.agent.max_steps, 100);
    }

    #[test]
    fn test_to_toml_round_trips() {
        let rendered = UserConfig::default().to_toml().unwrap();
        let back: UserConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(back.agent.max_steps, 100);
    }
}
