//! File system tool: read, write, list and delete

use anyhow::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::fs;
use tracing::{error, info};

use crate::tools::{optional_str, required_str, Tool, ToolArgs, ToolContext};

/// Tool for basic file operations
pub struct FileSystemTool;

#[async_trait]
impl Tool for FileSystemTool {
    fn name(&self) -> &str {
        "file_system"
    }

    fn description(&self) -> &str {
        "Performs file system operations. Args: operation (str), path (str), content (str, optional). Valid operations: 'read', 'write', 'list', 'delete'."
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String> {
        let operation = required_str(args, "operation")?;
        let path_str = required_str(args, "path")?;
        let path = ctx.resolve(path_str);

        info!(operation, path = %path.display(), "Executing file system operation");

        let result = match operation {
            "read" => fs::read_to_string(&path).await,
            "write" => {
                let content = optional_str(args, "content")
                    .ok_or_else(|| anyhow::anyhow!("Missing required parameter: content"))?;
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent).await?;
                    }
                }
                fs::write(&path, content)
                    .await
                    .map(|_| format!("Successfully wrote to file: {}", path_str))
            }
            "list" => list_dir(&path).await,
            "delete" => fs::remove_file(&path)
                .await
                .map(|_| format!("Successfully deleted file: {}", path_str)),
            other => return Ok(format!("Error: Unknown file system operation '{}'.", other)),
        };

        match result {
            Ok(output) => Ok(output),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Ok(format!("Error: Path not found: {}", path_str))
            }
            Err(e) => {
                error!(error = %e, "File system tool error");
                Ok(format!("Error during file system operation: {}", e))
            }
        }
    }
}

async fn list_dir(path: &std::path::Path) -> std::io::Result<String> {
    let mut entries = fs::read_dir(path).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names.join("\n"))
}
