//! CLI commands implementation
//!
//! Assembles the agent from configuration and implements the
//! non-interactive subcommands.

use anyhow::{bail, Context, Result};
use llm_core::{ModelBackend, OllamaClient, Provider};
use std::sync::Arc;
use tracing::info;

use crate::agent::{AgentConfig, AgentLoop, Orchestrator};
use crate::config::UserConfig;
use crate::tools::builtin::create_default_registry;
use crate::tools::registry::ToolRegistry;
use crate::tools::router::ToolRouter;

// ANSI color codes
const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const BLUE: &str = "\x1b[94m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn print_status(ok: bool, msg: &str) {
    let icon = if ok {
        format!("{}✓{}", GREEN, RESET)
    } else {
        format!("{}✗{}", RED, RESET)
    };
    println!("  {} {}", icon, msg);
}

/// Command-line and environment overrides on top of the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub provider: Option<Provider>,
    pub max_steps: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, config: &mut UserConfig) {
        if let Some(provider) = self.provider {
            config.model.provider = provider;
        }
        if let Some(ref model) = self.model {
            config.model.model = model.clone();
        }
        if let Some(max_steps) = self.max_steps {
            config.agent.max_steps = max_steps;
        }
    }
}

/// Load the config file and apply overrides
pub fn effective_config(overrides: &Overrides) -> Result<UserConfig> {
    let mut config = UserConfig::load()?;
    overrides.apply(&mut config);
    if config.agent.max_steps == 0 {
        bail!("max_steps must be at least 1");
    }
    Ok(config)
}

pub fn agent_config(config: &UserConfig) -> Result<AgentConfig> {
    let working_dir = std::env::current_dir().context("Failed to determine working directory")?;
    Ok(AgentConfig::new()
        .with_max_steps(config.agent.max_steps)
        .with_temperature(config.agent.temperature)
        .with_verbose(config.agent.verbose)
        .with_working_dir(working_dir)
        .with_max_output_len(config.agent.max_output_len)
        .with_command_timeout(config.agent.command_timeout_secs))
}

/// Wire a backend and a tool registry into an orchestrator
pub fn build_orchestrator(
    config: &UserConfig,
    registry: Arc<ToolRegistry>,
    backend: Arc<dyn ModelBackend>,
) -> Result<Orchestrator> {
    info!(
        provider = %backend.provider(),
        model = backend.model(),
        tools = registry.len(),
        "Agent initialized"
    );
    let agent = AgentLoop::new(backend, ToolRouter::new(registry), agent_config(config)?);
    Ok(Orchestrator::new(agent))
}

/// One-shot objective (non-interactive)
pub async fn ask(objective: &str, config: &UserConfig) -> Result<()> {
    let objective = objective.trim();
    if objective.is_empty() {
        bail!("Please enter a valid objective.");
    }

    let backend: Arc<dyn ModelBackend> = Arc::from(llm_core::connect(&config.model)?);
    let registry = Arc::new(create_default_registry(&config.browser));
    let orchestrator = build_orchestrator(config, registry, backend)?;

    let result = orchestrator
        .run(objective)
        .await
        .context("The model backend failed")?;

    println!();
    println!("{}--- Task Finished ---{}", BOLD, RESET);
    println!("Final Result: {}", result);
    Ok(())
}

/// Show the model backend and the discovered tools
pub async fn tools(config: &UserConfig) -> Result<()> {
    println!("{}Model{}", BOLD, RESET);
    println!("  Provider: {}", config.model.provider);
    println!("  Model:    {}{}{}", BLUE, config.model.model, RESET);
    println!("  Endpoint: {}", config.model.endpoint());

    match llm_core::connect(&config.model) {
        Ok(_) if config.model.provider == Provider::Ollama => {
            let client = OllamaClient::new(
                config.model.endpoint(),
                config.model.model.clone(),
                config.model.request_timeout_secs,
            );
            let running = client.health_check().await;
            print_status(running, if running { "Ollama is running" } else { "Ollama is not running" });
        }
        Ok(_) => print_status(true, &format!("API key found in {}", config.model.api_key_env)),
        Err(e) => print_status(false, &e.to_string()),
    }

    let registry = create_default_registry(&config.browser);
    println!();
    println!("{}Tools ({}){}", BOLD, registry.len(), RESET);
    print!("{}", registry.catalog());
    Ok(())
}

pub fn config_init() -> Result<()> {
    let path = UserConfig::create_default()?;
    print_status(true, &format!("Created {}", path.display()));
    Ok(())
}

pub fn config_show(config: &UserConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn config_path() -> Result<()> {
    println!("{}", UserConfig::config_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let mut config = UserConfig::default();
        let overrides = Overrides {
            model: Some("llama3.2".to_string()),
            provider: Some(Provider::Ollama),
            max_steps: Some(12),
        };
        overrides.apply(&mut config);

        assert_eq!(config.model.model, "llama3.2");
        assert_eq!(config.model.provider, Provider::Ollama);
        assert_eq!(config.agent.max_steps, 12);
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = UserConfig::default();
        Overrides::default().apply(&mut config);
        assert_eq!(config.model.model, "gemini-2.5-pro");
        assert_eq!(config.agent.max_steps, 100);
    }

    #[test]
    fn test_agent_config_from_user_config() {
        let mut config = UserConfig::default();
        config.agent.max_steps = 4;
        config.agent.command_timeout_secs = 9;

        let agent = agent_config(&config).unwrap();
        assert_eq!(agent.max_steps, 4);
        assert_eq!(agent.command_timeout_secs, 9);
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_objective() {
        let err = ask("   ", &UserConfig::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid objective.");
    }
}
