//! Built-in capabilities for the desktop agent

mod browser;
mod datetime;
mod file_system;
mod human_feedback;
mod system_command;
mod ui_automation;
mod whatsapp;

use browser::BrowserAutomationTool;
use datetime::DateTimeTool;
use file_system::FileSystemTool;
use human_feedback::HumanFeedbackTool;
use system_command::SystemCommandTool;
use ui_automation::UiAutomationTool;
use whatsapp::WhatsAppTool;

use anyhow::Result;
use tracing::warn;

use super::registry::ToolRegistry;
use super::Tool;
use crate::config::BrowserConfig;

/// Register a capability whose environment check may fail
fn register_optional<T: Tool + 'static>(registry: &mut ToolRegistry, name: &str, tool: Result<T>) {
    match tool {
        Ok(tool) => registry.register(tool),
        Err(e) => warn!(tool = name, error = %format!("{:#}", e), "Skipping unavailable tool"),
    }
}

/// Create a registry with every capability the host supports.
///
/// Capabilities that depend on external programs (a WebDriver, `xdotool`,
/// a URL opener) are skipped with a warning when those are missing.
pub fn create_default_registry(browser: &BrowserConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    register_optional(
        &mut registry,
        "browser_automation",
        BrowserAutomationTool::discover(browser),
    );
    registry.register(DateTimeTool);
    registry.register(FileSystemTool);
    registry.register(HumanFeedbackTool::new());
    registry.register(SystemCommandTool);
    register_optional(&mut registry, "ui_automation", UiAutomationTool::discover());
    register_optional(&mut registry, "send_whatsapp_message", WhatsAppTool::discover());

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_tools_always_present() {
        let registry = create_default_registry(&BrowserConfig::default());
        let names = registry.list_names();

        for required in ["get_datetime", "file_system", "human_feedback", "system_command"] {
            assert!(names.contains(&required), "missing {}", required);
        }
        let datetime = names.iter().position(|n| *n == "get_datetime").unwrap();
        let command = names.iter().position(|n| *n == "system_command").unwrap();
        assert!(datetime < command);
    }

    #[test]
    fn test_register_optional_skips_failures() {
        let mut registry = ToolRegistry::new();
        register_optional::<DateTimeTool>(
            &mut registry,
            "get_datetime",
            Err(anyhow::anyhow!("not here")),
        );
        assert!(registry.is_empty());

        register_optional(&mut registry, "get_datetime", Ok(DateTimeTool));
        assert_eq!(registry.list_names(), vec!["get_datetime"]);
    }
}
