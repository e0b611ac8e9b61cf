//! Tool registry for managing available tools

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::Tool;

/// Header line of the catalog embedded in every prompt
pub const CATALOG_HEADER: &str = "You have access to the following tools:";

/// Registry of available tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool. A later registration under the same name
    /// replaces the earlier one in its original slot.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => {
                debug!(tool = %name, "Replacing previously registered tool");
                self.tools[slot] = tool;
            }
            None => {
                self.index.insert(name.clone(), self.tools.len());
                self.tools.push(tool);
            }
        }
        info!(tool = %name, "Successfully loaded tool");
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| Arc::clone(&self.tools[slot]))
    }

    /// List all registered tool names in registration order
    pub fn list_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Human-readable catalog: one `- name: description` line per tool
    pub fn catalog(&self) -> String {
        let mut out = String::from(CATALOG_HEADER);
        out.push('\n');
        for tool in &self.tools {
            out.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
        }
        out
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolArgs, ToolContext};
    use anyhow::Result;
    use async_trait::async_trait;

    struct MockTool {
        name: &'static str,
        description: &'static str,
    }

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            self.description
        }

        async fn execute(&self, _args: &ToolArgs, _ctx: &ToolContext) -> Result<String> {
            Ok(format!("{} output", self.name))
        }
    }

    fn mock(name: &'static str, description: &'static str) -> MockTool {
        MockTool { name, description }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("mock", "A mock tool for testing"));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("mock").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_registry_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("zeta", "last letter"));
        registry.register(mock("alpha", "first letter"));

        assert_eq!(registry.list_names(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_catalog_format() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("file_system", "Reads and writes files."));
        registry.register(mock("get_datetime", "Returns the current date and time."));

        assert_eq!(
            registry.catalog(),
            "You have access to the following tools:\n\
             - file_system: Reads and writes files.\n\
             - get_datetime: Returns the current date and time.\n"
        );
    }

    #[test]
    fn test_catalog_is_idempotent() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("a", "one"));
        registry.register(mock("b", "two"));

        assert_eq!(registry.catalog(), registry.catalog());
    }

    #[test]
    fn test_last_registration_wins_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("dup", "first"));
        registry.register(mock("other", "middle"));
        registry.register(mock("dup", "second"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list_names(), vec!["dup", "other"]);
        assert_eq!(registry.get("dup").unwrap().description(), "second");
        assert!(registry.catalog().contains("- dup: second"));
        assert!(!registry.catalog().contains("first"));
    }

    #[test]
    fn test_empty_catalog_has_header_only() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.catalog(), format!("{}\n", CATALOG_HEADER));
    }
}
