//! Agent framework for autonomous task execution
//!
//! Implements the thought / action / observation loop: the orchestrator
//! drives the loop, each cycle builds a prompt from the trace, asks the
//! model, interprets the reply and dispatches the chosen tool.

mod agent_loop;
pub mod interpreter;
mod orchestrator;
pub mod prompt;
mod state;
pub mod trace;

#[cfg(test)]
mod testing;

pub use agent_loop::AgentLoop;
pub use orchestrator::Orchestrator;
pub use state::AgentConfig;
