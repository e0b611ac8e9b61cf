//! Desktop window automation through `xdotool`.
//!
//! Requires an X11 session and `xdotool` on PATH; discovery fails otherwise
//! and the tool is left out of the registry.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use crate::tools::{optional_str, required_str, Tool, ToolArgs, ToolContext};

const XDOTOOL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct UiAutomationTool {
    xdotool: PathBuf,
}

/// A window as reported by xdotool
#[derive(Debug, Clone, PartialEq)]
struct WindowInfo {
    id: String,
    title: String,
}

impl UiAutomationTool {
    pub fn discover() -> Result<Self> {
        let xdotool = which::which("xdotool").context("xdotool not found on PATH")?;
        require_x11(std::env::var_os("DISPLAY").as_deref())?;
        Ok(Self { xdotool })
    }

    /// Run xdotool and return stdout; non-zero exit is an error
    async fn xdotool(&self, args: &[&str]) -> Result<String> {
        debug!(?args, "Running xdotool");
        let output = timeout(
            XDOTOOL_TIMEOUT,
            Command::new(&self.xdotool)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .context("xdotool timed out")?
        .context("failed to run xdotool")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("xdotool {} failed: {}", args.first().unwrap_or(&""), stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn window_title(&self, id: &str) -> String {
        self.xdotool(&["getwindowname", id]).await.unwrap_or_default()
    }

    /// Visible windows whose title matches `pattern` (regex, as xdotool takes it)
    async fn search(&self, pattern: &str) -> Result<Vec<WindowInfo>> {
        // xdotool exits 1 when nothing matches
        let ids = self
            .xdotool(&["search", "--onlyvisible", "--name", pattern])
            .await
            .unwrap_or_default();

        let mut windows = Vec::new();
        for id in ids.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let title = self.window_title(id).await;
            if !title.is_empty() {
                windows.push(WindowInfo {
                    id: id.to_string(),
                    title,
                });
            }
        }
        Ok(windows)
    }

    /// Pick the active window among matches, else the first one
    async fn target_window(&self, window_title: &str) -> Result<WindowInfo> {
        let windows = self.search(window_title).await?;
        let active = self.xdotool(&["getactivewindow"]).await.ok();
        choose_window(windows, active.as_deref())
            .ok_or_else(|| anyhow::anyhow!("No window with title matching '{}' found.", window_title))
    }
}

fn choose_window(windows: Vec<WindowInfo>, active: Option<&str>) -> Option<WindowInfo> {
    if let Some(active) = active {
        if let Some(w) = windows.iter().find(|w| w.id == active) {
            return Some(w.clone());
        }
    }
    windows.into_iter().next()
}

/// xdotool only talks to an X server; a Wayland-only session has no `DISPLAY`
fn require_x11(display: Option<&std::ffi::OsStr>) -> Result<()> {
    match display {
        Some(d) if !d.is_empty() => Ok(()),
        _ => bail!("no X11 display available (DISPLAY is not set)"),
    }
}

/// Parse a `x,y` control specifier into window-relative coordinates
fn parse_point(spec: &str) -> Result<(i64, i64)> {
    let (x, y) = spec
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("control_specifier must be 'x,y' window coordinates, got '{}'", spec))?;
    let x = x.trim().parse().with_context(|| format!("invalid x coordinate '{}'", x.trim()))?;
    let y = y.trim().parse().with_context(|| format!("invalid y coordinate '{}'", y.trim()))?;
    Ok((x, y))
}

#[async_trait]
impl Tool for UiAutomationTool {
    fn name(&self) -> &str {
        "ui_automation"
    }

    fn description(&self) -> &str {
        "Performs UI automation tasks on desktop windows. Args: operation (str), **kwargs. Valid operations: 'list_windows', 'get_controls', 'click_control', 'type_text'. For 'get_controls', provide 'window_title'. For 'click_control', provide 'window_title' and 'control_specifier' ('x,y' coordinates inside the window). For 'type_text', provide 'window_title' and 'text'."
    }

    async fn execute(&self, args: &ToolArgs, _ctx: &ToolContext) -> Result<String> {
        let operation = required_str(args, "operation")?;
        info!(operation, "Executing UI automation operation");

        match operation {
            "list_windows" => {
                let windows = self.search(".").await?;
                if windows.is_empty() {
                    return Ok("No visible windows found.".to_string());
                }
                Ok(windows
                    .iter()
                    .map(|w| w.title.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            "get_controls" => {
                let window_title = optional_str(args, "window_title")
                    .ok_or_else(|| anyhow::anyhow!("'window_title' is required for 'get_controls'."))?;
                let window = self.target_window(window_title).await?;
                info!(window = %window.title, "Found window");

                let geometry = self.xdotool(&["getwindowgeometry", &window.id]).await?;
                let pid = self
                    .xdotool(&["getwindowpid", &window.id])
                    .await
                    .unwrap_or_else(|_| "unknown".to_string());
                Ok(format!(
                    "Window: {}\nId: {}\nPid: {}\n{}",
                    window.title, window.id, pid, geometry
                ))
            }
            "click_control" => {
                let (window_title, spec) = match (
                    optional_str(args, "window_title"),
                    optional_str(args, "control_specifier"),
                ) {
                    (Some(t), Some(c)) => (t, c),
                    _ => bail!("'window_title' and 'control_specifier' are required."),
                };
                let (x, y) = parse_point(spec)?;
                let window = self.target_window(window_title).await?;
                info!(window = %window.title, x, y, "Targeting window");

                self.xdotool(&["windowactivate", "--sync", &window.id]).await?;
                self.xdotool(&[
                    "mousemove",
                    "--window",
                    &window.id,
                    &x.to_string(),
                    &y.to_string(),
                    "click",
                    "1",
                ])
                .await?;
                Ok(format!(
                    "Successfully clicked control '{}' in window '{}'.",
                    spec, window_title
                ))
            }
            "type_text" => {
                let window_title = required_str(args, "window_title")?;
                let text = required_str(args, "text")?;
                let window = self.target_window(window_title).await?;

                self.xdotool(&["windowactivate", "--sync", &window.id]).await?;
                self.xdotool(&["type", "--window", &window.id, "--delay", "12", text])
                    .await?;
                Ok(format!("Successfully typed text into window '{}'.", window.title))
            }
            other => Ok(format!("Error: Unknown UI automation operation '{}'.", other)),
        }
    }
}
