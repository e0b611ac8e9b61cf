//! Current date and time

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use tracing::info;

use crate::tools::{Tool, ToolArgs, ToolContext};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn name(&self) -> &str {
        "get_datetime"
    }

    fn description(&self) -> &str {
        "Returns the current date and time."
    }

    async fn execute(&self, _args: &ToolArgs, _ctx: &ToolContext) -> Result<String> {
        info!("Getting current date and time");
        Ok(Local::now().format(DATETIME_FORMAT).to_string())
    }
}
