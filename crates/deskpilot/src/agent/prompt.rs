//! Prompt rendering for the thought / action / observation protocol

use super::interpreter::FINISH_TOOL;
use super::trace::Trace;

const PERSONA: &str = "\
**System Persona:**
You are a highly intelligent and autonomous AI agent designed to operate on a desktop computer. \
Your primary goal is to achieve the user's objective by breaking it down into logical steps and \
using the available tools. You are methodical, careful, and always reflect on the outcome of your actions.";

const INSTRUCTIONS: &str = "\
**Instructions:**
You must operate in a cycle of Thought, Action, Observation.
1.  **Thought**: Analyze the current situation, including the history of actions and observations. \
Formulate a clear, concise plan for your next immediate action. Think step-by-step.
2.  **Action**: Based on your thought, select the single most appropriate tool to execute next. \
Format your action as a single JSON object.
3.  **Observation**: After you provide an action, the system will execute it and you will receive \
an observation of the result.

**Error Handling and Self-Correction:**
If an Observation indicates an error or that the previous action failed, you MUST address it.
-   **Analyze the Error**: In your next Thought, identify the cause of the error.
-   **Change the Plan**: Do not repeat the failed action. Formulate a new plan to either fix the \
issue or try a different approach.
-   **Use Tools to Investigate**: Use tools like `file_system` to check if a file was created, or \
`human_feedback` to ask for help if you are stuck.
-   **Your primary goal is to recover from failures and find a successful path.**

**Pro-Tip for Web Tasks:**
For tasks involving websites, it is much more efficient to open the browser directly to the target \
URL. For example, instead of just opening the browser, use `browser_automation` with `open_url`, or \
the `system_command` tool to run `xdg-open \"https://www.youtube.com\"`.";

const ACTION_FORMAT: &str = r#"**Action JSON Format:**
Your response must contain exactly one JSON block formatted like this:
```json
{
  "thought": "Your reasoning and plan for the next action.",
  "action": {
    "tool": "tool_name",
    "args": {
      "arg_name1": "value1",
      "arg_name2": "value2"
    }
  }
}
```"#;

const TURN: &str = "Your turn. Provide your next thought and action in the specified JSON format.";

fn completion_format() -> String {
    format!(
        r#"**Completion:**
Once you are certain the objective has been fully achieved, use the "{finish}" tool.
```json
{{
  "thought": "I have successfully completed the objective.",
  "action": {{
    "tool": "{finish}",
    "args": {{
      "summary": "A detailed summary of what was accomplished and the final result."
    }}
  }}
}}
```"#,
        finish = FINISH_TOOL
    )
}

/// Render the full request for one cycle.
///
/// Output depends only on the arguments, so the same objective, catalog and
/// trace always produce the same prompt.
pub fn build(objective: &str, catalog: &str, trace: &Trace) -> String {
    let mut prompt = String::with_capacity(4096 + catalog.len() + trace.len() * 128);

    prompt.push('\n');
    prompt.push_str(PERSONA);
    prompt.push_str("\n\n**Objective:**\n");
    prompt.push_str(objective);
    prompt.push_str("\n\n");
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\n**Available Tools:**\n");
    prompt.push_str(catalog);
    prompt.push_str("\n\n");
    prompt.push_str(ACTION_FORMAT);
    prompt.push_str("\n\n");
    prompt.push_str(&completion_format());
    prompt.push_str("\n\n**Task History (Thought, Action, Observation):**\n");
    prompt.push_str(&trace.render());
    prompt.push_str(TURN);
    prompt.push('\n');
    prompt
}
