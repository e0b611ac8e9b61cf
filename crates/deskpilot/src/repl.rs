//! Interactive objective shell
//!
//! Reads one objective per line and runs it to completion before asking for
//! the next. `exit` quits. When the model backend cannot be configured the
//! shell still starts but refuses objectives with the configuration error.

use anyhow::Result;
use llm_core::{BackendError, ModelBackend};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tracing::error;

use crate::agent::Orchestrator;
use crate::commands::build_orchestrator;
use crate::config::UserConfig;
use crate::tools::builtin::create_default_registry;

// ANSI colors
const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const CYAN: &str = "\x1b[96m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const CONFIG_HINT: &str = "Please ensure your API key environment variable and config file are set up correctly.";

/// What to do with one line of input
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Empty,
    Objective(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") {
        Input::Exit
    } else if line.is_empty() {
        Input::Empty
    } else {
        Input::Objective(line)
    }
}

fn print_config_error(e: &BackendError) {
    println!();
    println!("{}ERROR:{} {}", RED, RESET, e);
    println!("{}", CONFIG_HINT);
}

/// Run the interactive shell
pub async fn run(config: UserConfig) -> Result<()> {
    let registry = Arc::new(create_default_registry(&config.browser));

    let agent: Result<Orchestrator, BackendError> = match llm_core::connect(&config.model) {
        Ok(backend) => {
            let backend: Arc<dyn ModelBackend> = Arc::from(backend);
            Ok(build_orchestrator(&config, Arc::clone(&registry), backend)?)
        }
        Err(e) => {
            error!(error = %e, "Configuration error");
            print_config_error(&e);
            Err(e)
        }
    };

    let mut rl = DefaultEditor::new()?;

    println!();
    println!("{}--- deskpilot ---{}", BOLD, RESET);
    println!(
        "{}{} tools loaded. Model: {} ({}){}",
        DIM,
        registry.len(),
        config.model.model,
        config.model.provider,
        RESET
    );
    println!("Enter your objective below. Type 'exit' to quit.");

    loop {
        println!();
        match rl.readline(&format!("{}Objective:{} ", CYAN, RESET)) {
            Ok(line) => {
                let objective = match classify(&line) {
                    Input::Exit => {
                        println!("Exiting agent.");
                        break;
                    }
                    Input::Empty => {
                        println!("Please enter a valid objective.");
                        continue;
                    }
                    Input::Objective(objective) => objective,
                };
                let _ = rl.add_history_entry(objective);

                let orchestrator = match &agent {
                    Ok(orchestrator) => orchestrator,
                    Err(e) => {
                        print_config_error(e);
                        continue;
                    }
                };

                match orchestrator.run(objective).await {
                    Ok(result) => {
                        println!();
                        println!("{}--- Task Finished ---{}", GREEN, RESET);
                        println!("Final Result: {}", result);
                    }
                    Err(e) if e.is_configuration() => {
                        error!(error = %e, "Configuration error");
                        print_config_error(&e);
                    }
                    Err(e) => {
                        error!(error = %e, "Model backend failed; objective aborted");
                        println!();
                        println!("{}A critical error occurred:{} {}", RED, RESET, e);
                    }
                }
                println!();
                println!("Enter a new objective or type 'exit'.");
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}^C{}", DIM, RESET);
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}Goodbye!{}", DIM, RESET);
                break;
            }
            Err(e) => {
                eprintln!("{}Error:{} {}", RED, RESET, e);
                break;
            }
        }
    }

    Ok(())
}
