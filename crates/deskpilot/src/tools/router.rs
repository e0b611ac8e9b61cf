//! Tool routing and dispatch
//!
//! Every failure below this point becomes a [`RouteResult`] value; nothing a
//! tool does can unwind into the agent loop.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::registry::ToolRegistry;
use super::{ActionRequest, ToolContext};

/// Result of routing a tool call
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResult {
    /// Tool ran and produced output
    Success(String),
    /// No tool registered under the requested name
    NotFound(String),
    /// Tool returned an error or panicked
    Error { tool: String, message: String },
}

impl RouteResult {
    /// Observation text recorded in the trace
    pub fn into_observation(self) -> String {
        match self {
            RouteResult::Success(output) => output,
            RouteResult::NotFound(name) => format!("Error: Tool '{}' not found.", name),
            RouteResult::Error { tool, message } => {
                format!("Error executing tool '{}': {}", tool, message)
            }
        }
    }

    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        matches!(self, RouteResult::Success(_))
    }
}

/// Router for dispatching tool calls
pub struct ToolRouter {
    registry: Arc<ToolRegistry>,
}

impl ToolRouter {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Route a single action to its tool
    #[instrument(skip(self, request, ctx), fields(tool = %request.name))]
    pub async fn route(&self, request: &ActionRequest, ctx: &ToolContext) -> RouteResult {
        let tool = match self.registry.get(&request.name) {
            Some(t) => t,
            None => {
                warn!(tool = %request.name, "Tool not found");
                return RouteResult::NotFound(request.name.clone());
            }
        };

        info!(tool = %request.name, args = ?request.arguments, "Executing tool");

        // Run on its own task so a panicking tool surfaces as a JoinError
        let args = request.arguments.clone();
        let task_ctx = ctx.clone();
        let handle = tokio::spawn(async move { tool.execute(&args, &task_ctx).await });

        match handle.await {
            Ok(Ok(output)) => {
                info!(tool = %request.name, output_len = output.len(), "Tool executed successfully");
                RouteResult::Success(ctx.truncate(output))
            }
            Ok(Err(e)) => {
                warn!(tool = %request.name, error = %e, "Tool execution error");
                RouteResult::Error {
                    tool: request.name.clone(),
                    message: format!("{:#}", e),
                }
            }
            Err(join_err) => {
                warn!(tool = %request.name, error = %join_err, "Tool task failed");
                RouteResult::Error {
                    tool: request.name.clone(),
                    message: if join_err.is_panic() {
                        "tool panicked during execution".to_string()
                    } else {
                        join_err.to_string()
                    },
                }
            }
        }
    }

    /// Get a reference to the registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for ToolRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRouter")
            .field("registry", &self.registry)
            .finish()
    }
}
