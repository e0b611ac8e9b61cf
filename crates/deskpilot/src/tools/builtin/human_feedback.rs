//! Ask the human operator a question and wait for the answer

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use tracing::info;

use crate::tools::{required_str, Tool, ToolArgs, ToolContext};

const YELLOW: &str = "\x1b[93m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Source of answers; stdin in production
pub trait AnswerSource: Send + Sync {
    fn ask(&self, question: &str) -> io::Result<String>;
}

/// Prints the question and reads one line from stdin
pub struct TerminalAnswers;

impl AnswerSource for TerminalAnswers {
    fn ask(&self, question: &str) -> io::Result<String> {
        println!();
        println!("{}--- AGENT REQUEST ---{}", YELLOW, RESET);
        println!("The agent is asking for your help: {}{}{}", BOLD, question, RESET);
        print!("Your response: ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

pub struct HumanFeedbackTool {
    source: std::sync::Arc<dyn AnswerSource>,
}

impl HumanFeedbackTool {
    pub fn new() -> Self {
        Self::with_source(TerminalAnswers)
    }

    pub fn with_source(source: impl AnswerSource + 'static) -> Self {
        Self {
            source: std::sync::Arc::new(source),
        }
    }
}

impl Default for HumanFeedbackTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HumanFeedbackTool {
    fn name(&self) -> &str {
        "human_feedback"
    }

    fn description(&self) -> &str {
        "Asks the human user for input or clarification. Use this when you are stuck or need more information. Args: question (str)."
    }

    async fn execute(&self, args: &ToolArgs, _ctx: &ToolContext) -> Result<String> {
        let question = required_str(args, "question")?.to_string();
        info!(question = %question, "Asking user for feedback");

        // Blocking read, kept off the async workers
        let source = std::sync::Arc::clone(&self.source);
        let answer = tokio::task::spawn_blocking(move || source.ask(&question))
            .await
            .context("feedback prompt task failed")?
            .context("failed to read user response")?;

        info!(answer = %answer, "User responded");
        Ok(format!("The user responded: '{}'", answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Scripted(&'static str);

    impl AnswerSource for Scripted {
        fn ask(&self, _question: &str) -> io::Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_wraps_answer() {
        let tool = HumanFeedbackTool::with_source(Scripted("use the blue one"));
        let args = json!({"question": "Which button?"}).as_object().cloned().unwrap();

        let out = tool.execute(&args, &ToolContext::default()).await.unwrap();
        assert_eq!(out, "The user responded: 'use the blue one'");
    }

    #[tokio::test]
    async fn test_requires_question() {
        let tool = HumanFeedbackTool::with_source(Scripted("x"));
        let err = tool
            .execute(&ToolArgs::new(), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("question"));
    }
}
