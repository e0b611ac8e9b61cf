//! Bounded run of one objective

use llm_core::BackendError;
use tracing::{info, instrument, warn};

use super::agent_loop::AgentLoop;
use super::state::ObjectiveRun;

pub const BUDGET_EXHAUSTED: &str = "Task stopped: Maximum number of thoughts reached.";

/// Runs objectives one at a time, each for at most `max_steps` cycles
pub struct Orchestrator {
    agent: AgentLoop,
    max_steps: usize,
}

impl Orchestrator {
    pub fn new(agent: AgentLoop) -> Self {
        let max_steps = agent.config().max_steps;
        Self { agent, max_steps }
    }

    /// Run `objective` from an empty trace to a final result string
    pub async fn run(&self, objective: &str) -> Result<String, BackendError> {
        let mut run = ObjectiveRun::new(objective);
        self.execute(&mut run).await
    }

    /// Drive `run` until a terminal cycle or the step budget.
    ///
    /// The trace is cleared first. Backend errors abort the run and are
    /// returned as-is; the budget running out is an ordinary `Ok`.
    #[instrument(skip(self, run), fields(max_steps = self.max_steps))]
    pub async fn execute(&self, run: &mut ObjectiveRun) -> Result<String, BackendError> {
        info!(objective = %run.objective, "Starting new task");
        run.trace.clear();
        run.step_count = 0;

        while run.step_count < self.max_steps {
            run.step_count += 1;
            info!(step = run.step_count, max_steps = self.max_steps, "Step");

            let outcome = self.agent.step(&run.objective, &mut run.trace).await?;
            if outcome.is_terminal {
                let result = format!("Task completed successfully. Final summary: {}", outcome.observation);
                info!(steps = run.step_count, "{}", result);
                return Ok(result);
            }
        }

        warn!(steps = run.step_count, "{}", BUDGET_EXHAUSTED);
        Ok(BUDGET_EXHAUSTED.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{action_block, agent_with, finish_block, RejectingBackend, ScriptedBackend};
    use crate::agent::trace::EntryKind;
    use crate::agent::AgentConfig;
    use crate::tools::registry::ToolRegistry;
    use crate::tools::router::ToolRouter;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_finish_on_first_cycle() {
        let backend = Arc::new(ScriptedBackend::new(vec![finish_block("X")]));
        let orchestrator = Orchestrator::new(agent_with(backend.clone(), 10));

        let result = orchestrator.run("do the thing").await.unwrap();
        assert_eq!(result, "Task completed successfully. Final summary: X");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_budget_exhausted_without_extra_cycle() {
        let backend = Arc::new(ScriptedBackend::repeating(action_block(
            "again",
            "echo",
            json!({"text": "loop"}),
        )));
        let orchestrator = Orchestrator::new(agent_with(backend.clone(), 3));

        let mut run = ObjectiveRun::new("never ends");
        let result = orchestrator.execute(&mut run).await.unwrap();
        assert_eq!(result, BUDGET_EXHAUSTED);
        assert_eq!(backend.calls(), 3);
        assert_eq!(run.step_count, 3);

        // one thought, action and observation per cycle
        assert_eq!(run.trace.count(EntryKind::Thought), 3);
        assert_eq!(run.trace.count(EntryKind::Action), 3);
        assert_eq!(run.trace.count(EntryKind::Observation), 3);
    }

    #[tokio::test]
    async fn test_trace_cleared_before_first_step() {
        let backend = Arc::new(ScriptedBackend::new(vec![finish_block("done")]));
        let orchestrator = Orchestrator::new(agent_with(backend.clone(), 10));

        let mut run = ObjectiveRun::new("second objective");
        run.trace.record_thought("left over from a previous objective");
        run.trace.record_observation("stale");

        orchestrator.execute(&mut run).await.unwrap();

        let first_prompt = &backend.prompts()[0];
        assert!(!first_prompt.contains("left over"));
        assert!(first_prompt.ends_with(
            "**Task History (Thought, Action, Observation):**\nYour turn. Provide your next thought and action in the specified JSON format.\n"
        ));
        assert_eq!(run.trace.count(EntryKind::Thought), 1);
    }

    #[tokio::test]
    async fn test_recovers_from_unknown_tool_and_bad_output() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            action_block("try", "frobnicate", json!({})),
            "no block here".to_string(),
            action_block("write", "file_system", json!({"operation": "write"})),
            finish_block("gave up gracefully"),
        ]));
        let orchestrator = Orchestrator::new(agent_with(backend.clone(), 10));

        let result = orchestrator.run("x").await.unwrap();
        assert!(result.contains("gave up gracefully"));
        assert_eq!(backend.calls(), 4);

        let last_prompt = backend.prompts().pop().unwrap();
        assert!(last_prompt.contains("OBSERVATION: Error: Tool 'frobnicate' not found.\n"));
        assert!(last_prompt.contains("OBSERVATION: Error: Could not parse thought or action"));
        assert!(last_prompt.contains("disk full"));
    }

    #[tokio::test]
    async fn test_backend_error_aborts_run() {
        let agent = AgentLoop::new(
            Arc::new(RejectingBackend),
            ToolRouter::new(Arc::new(ToolRegistry::new())),
            AgentConfig::new().with_verbose(false),
        );
        let orchestrator = Orchestrator::new(agent);

        let err = orchestrator.run("x").await.unwrap_err();
        assert!(err.is_configuration());
    }
}
