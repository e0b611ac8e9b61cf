//! Shell command execution tool

use anyhow::Result;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

use crate::tools::{optional_u64, required_str, Tool, ToolArgs, ToolContext};

/// Tool for executing commands in the platform shell
pub struct SystemCommandTool;

impl SystemCommandTool {
    /// Shell program and its "run this string" flag
    fn shell() -> (&'static str, &'static str) {
        if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        }
    }
}

#[async_trait]
impl Tool for SystemCommandTool {
    fn name(&self) -> &str {
        "system_command"
    }

    fn description(&self) -> &str {
        "Executes a command in the system shell. Args: command (str), timeout (int, optional, seconds). Returns the standard output and standard error."
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String> {
        let command = required_str(args, "command")?;
        let timeout_secs = optional_u64(args, "timeout").unwrap_or(ctx.command_timeout_secs);

        info!(command, timeout_secs, "Executing system command");

        let (shell, shell_arg) = Self::shell();
        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg)
            .arg(command)
            .current_dir(&ctx.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(Duration::from_secs(timeout_secs), cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to spawn command");
                return Ok(format!("Error executing command '{}': {}", command, e));
            }
            Err(_) => {
                warn!(timeout_secs, "Command timed out");
                return Ok(format!(
                    "Error executing command '{}': timed out after {} seconds",
                    command, timeout_secs
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut combined = String::new();
        if !stdout.is_empty() {
            combined.push_str(&format!("STDOUT:\n{}\n", stdout));
        }
        if !stderr.is_empty() {
            combined.push_str(&format!("STDERR:\n{}\n", stderr));
        }

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            combined.push_str(&format!("EXIT CODE: {}\n", code));
        }

        if combined.is_empty() {
            return Ok("Command executed with no output.".to_string());
        }

        Ok(combined)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_echo() {
        let out = SystemCommandTool
            .execute(&args(json!({"command": "echo 'hello world'"})), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(out, "STDOUT:\nhello world\n\n");
    }

    #[tokio::test]
    async fn test_stderr_and_exit_code() {
        let out = SystemCommandTool
            .execute(
                &args(json!({"command": "echo 'error message' >&2; exit 3"})),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert!(out.contains("STDERR:\nerror message"));
        assert!(out.contains("EXIT CODE: 3"));
    }

    #[tokio::test]
    async fn test_no_output() {
        let out = SystemCommandTool
            .execute(&args(json!({"command": "true"})), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(out, "Command executed with no output.");
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("marker.txt"), "").unwrap();
        let ctx = ToolContext::new(temp_dir.path().to_path_buf());

        let out = SystemCommandTool
            .execute(&args(json!({"command": "ls"})), &ctx)
            .await
            .unwrap();
        assert!(out.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let out = SystemCommandTool
            .execute(
                &args(json!({"command": "sleep 10", "timeout": 1})),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert!(out.contains("timed out after 1 seconds"));
    }

    #[tokio::test]
    async fn test_missing_command() {
        let err = SystemCommandTool
            .execute(&args(json!({})), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("command"));
    }
}
