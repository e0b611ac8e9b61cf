//! deskpilot: autonomous desktop task agent
//!
//! Give it an objective; it plans with a language model and acts through
//! file, shell, browser, window and messaging tools until done.

mod agent;
mod commands;
mod config;
mod repl;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use llm_core::Provider;
use tracing_subscriber::EnvFilter;

use crate::commands::Overrides;
use crate::config::UserConfig;

#[derive(Debug, Parser)]
#[command(name = "deskpilot")]
#[command(about = "Autonomous desktop task agent", version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model to use (overrides config)
    #[arg(short, long, global = true, env = "DESKPILOT_MODEL")]
    model: Option<String>,

    /// Model provider: gemini or ollama
    #[arg(long, global = true, env = "DESKPILOT_PROVIDER")]
    provider: Option<Provider>,

    /// Maximum model calls per objective
    #[arg(long, global = true, env = "DESKPILOT_MAX_STEPS")]
    max_steps: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the interactive objective shell
    Run,

    /// Run a single objective and print the result
    Ask {
        /// The objective
        objective: Vec<String>,
    },

    /// Show the model backend and the available tools
    Tools,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Write a commented default config file
    Init,
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins, then --verbose, then the config file
    let configured = UserConfig::load().ok().and_then(|c| c.agent.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(configured.as_deref().unwrap_or("warn"))
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let overrides = Overrides {
        model: cli.model,
        provider: cli.provider,
        max_steps: cli.max_steps,
    };

    match cli.command {
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init => commands::config_init(),
            ConfigAction::Show => commands::config_show(&commands::effective_config(&overrides)?),
            ConfigAction::Path => commands::config_path(),
        },
        Some(Commands::Ask { objective }) => {
            let config = commands::effective_config(&overrides)?;
            commands::ask(&objective.join(" "), &config).await
        }
        Some(Commands::Tools) => {
            let config = commands::effective_config(&overrides)?;
            commands::tools(&config).await
        }
        Some(Commands::Run) | None => {
            let config = commands::effective_config(&overrides)?;
            repl::run(config).await
        }
    }
}
