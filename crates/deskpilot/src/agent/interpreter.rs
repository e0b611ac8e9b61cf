//! Extract the thought and action from raw model text
//!
//! This is the only place that looks at model output directly. Every failure
//! comes back as a value describing what went wrong.

use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::tools::ActionRequest;

/// Reserved action name that ends the objective
pub const FINISH_TOOL: &str = "finish";

pub const NO_BLOCK: &str = "Error: No JSON action block found.";
pub const MISSING_TOOL: &str = "Error: 'tool' key missing from action data.";

/// The action part of a well-formed response
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedAction {
    Request(ActionRequest),
    /// `action` was an object without a usable `tool` name
    MissingTool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Parsed { thought: String, action: ParsedAction },
    /// Could not get both a thought and an action; carries the reason
    Failed(String),
}

#[cfg(test)]
impl ParsedResponse {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParsedResponse::Parsed { .. })
    }
}

/// Interpret a raw model response
pub fn parse(raw: &str) -> ParsedResponse {
    let Some(block) = extract_block(raw) else {
        warn!("Could not find a JSON block in the model response");
        return ParsedResponse::Failed(NO_BLOCK.to_string());
    };

    let value: Value = match serde_json::from_str(block) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "Failed to decode action JSON");
            return ParsedResponse::Failed(format!("Error: Invalid JSON format. {}", e));
        }
    };

    match interpret(value) {
        Ok(parsed) => parsed,
        Err(reason) => {
            error!(reason = %reason, "Malformed action block");
            ParsedResponse::Failed(format!("Error parsing response: {}", reason))
        }
    }
}

fn interpret(value: Value) -> Result<ParsedResponse, String> {
    let Value::Object(mut object) = value else {
        return Err("expected a JSON object".to_string());
    };

    let thought = match object.remove("thought") {
        Some(Value::String(s)) => s,
        Some(_) => return Err("'thought' must be a string".to_string()),
        None => return Err("'thought' key missing".to_string()),
    };

    let action = match object.remove("action") {
        Some(Value::Object(action)) => action,
        Some(Value::Null) | None => return Err("'action' key missing".to_string()),
        Some(_) => return Err("'action' must be a JSON object".to_string()),
    };

    Ok(ParsedResponse::Parsed {
        thought,
        action: interpret_action(action)?,
    })
}

fn interpret_action(mut action: Map<String, Value>) -> Result<ParsedAction, String> {
    let name = match action.remove("tool") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Ok(ParsedAction::MissingTool),
    };

    let arguments = match action.remove("args") {
        Some(Value::Object(args)) => args,
        Some(Value::Null) | None => Map::new(),
        Some(_) => return Err("'args' must be a JSON object".to_string()),
    };

    Ok(ParsedAction::Request(ActionRequest::new(name, arguments)))
}

/// Body of the first ```json fenced block, else of the first untagged one.
///
/// Fences only count at the start of a line, so backticks inside prose or
/// inside JSON string values never open or close a block.
fn extract_block(raw: &str) -> Option<&str> {
    let mut untagged = None;
    let mut offset = 0;

    while let Some(open) = find_fence(raw, offset) {
        let info_start = open + 3;
        let Some(line_len) = raw[info_start..].find('\n') else {
            break;
        };
        let tag = raw[info_start..info_start + line_len].trim();
        let newline = info_start + line_len;
        let Some(body_len) = raw[newline..].find("\n```") else {
            break;
        };
        let close = newline + body_len;
        let body = raw[newline..close].trim();

        if tag.eq_ignore_ascii_case("json") {
            return Some(body);
        }
        if tag.is_empty() && untagged.is_none() {
            untagged = Some(body);
        }
        offset = close + 4;
    }

    untagged
}

/// Byte offset of the next ``` at or after `from` that starts a line
fn find_fence(raw: &str, from: usize) -> Option<usize> {
    let mut offset = from;
    while let Some(found) = raw.get(offset..)?.find("```") {
        let at = offset + found;
        if at == 0 || raw.as_bytes()[at - 1] == b'\n' {
            return Some(at);
        }
        offset = at + 3;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fenced(value: &Value) -> String {
        format!(
            "Let me think.\n```json\n{}\n```\n",
            serde_json::to_string_pretty(value).unwrap()
        )
    }

    fn request(parsed: ParsedResponse) -> (String, ActionRequest) {
        match parsed {
            ParsedResponse::Parsed {
                thought,
                action: ParsedAction::Request(req),
            } => (thought, req),
            other => panic!("expected a request, got {:?}", other),
        }
    }

    #[test]
    fn test_round_trips_name_and_arguments() {
        let args = json!({"operation": "write", "path": "notes/todo.txt", "content": "milk", "n": 3});
        let raw = fenced(&json!({
            "thought": "save the list",
            "action": {"tool": "file_system", "args": args}
        }));

        let (thought, req) = request(parse(&raw));
        assert_eq!(thought, "save the list");
        assert_eq!(req.name, "file_system");
        assert_eq!(Value::Object(req.arguments), args);
    }

    #[test]
    fn test_no_block() {
        assert_eq!(
            parse("I will now open the browser."),
            ParsedResponse::Failed(NO_BLOCK.to_string())
        );
        // unterminated fence
        assert!(!parse("```json\n{\"thought\": \"x\"").is_parsed());
    }

    #[test]
    fn test_untagged_fence_accepted() {
        let raw = "```\n{\"thought\": \"t\", \"action\": {\"tool\": \"get_datetime\"}}\n```";
        let (_, req) = request(parse(raw));
        assert_eq!(req.name, "get_datetime");
        assert!(req.arguments.is_empty());
    }

    #[test]
    fn test_json_block_preferred_over_other_fences() {
        let raw = "```bash\nls -la\n```\nthen\n```JSON\n{\"thought\": \"\", \"action\": {\"tool\": \"finish\", \"args\": {\"summary\": \"ok\"}}}\n```";
        let (thought, req) = request(parse(raw));
        assert_eq!(thought, "");
        assert_eq!(req.name, FINISH_TOOL);
        assert_eq!(req.arguments["summary"], "ok");
    }

    #[test]
    fn test_invalid_json() {
        match parse("```json\n{\"thought\": \"x\",}\n```") {
            ParsedResponse::Failed(reason) => assert!(reason.starts_with("Error: Invalid JSON format.")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_thought_or_action_fails() {
        let no_thought = fenced(&json!({"action": {"tool": "get_datetime"}}));
        assert!(!parse(&no_thought).is_parsed());

        let no_action = fenced(&json!({"thought": "hmm"}));
        assert!(!parse(&no_action).is_parsed());

        let null_action = fenced(&json!({"thought": "hmm", "action": null}));
        assert!(!parse(&null_action).is_parsed());
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let raw = fenced(&json!({"thought": "do it", "action": {"args": {"a": 1}}}));
        assert_eq!(
            parse(&raw),
            ParsedResponse::Parsed {
                thought: "do it".to_string(),
                action: ParsedAction::MissingTool
            }
        );
    }

    #[test]
    fn test_non_object_args_fails() {
        let raw = fenced(&json!({"thought": "x", "action": {"tool": "file_system", "args": "read"}}));
        match parse(&raw) {
            ParsedResponse::Failed(reason) => assert!(reason.contains("'args'")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fence_inside_json_string_is_kept() {
        let content = "# Demo\n```bash\nls\n```\n";
        let raw = fenced(&json!({
            "thought": "write readme",
            "action": {
                "tool": "file_system",
                "args": {"operation": "write", "path": "README.md", "content": content}
            }
        }));

        let (thought, req) = request(parse(&raw));
        assert_eq!(thought, "write readme");
        assert_eq!(req.arguments["content"], content);
    }

    #[test]
    fn test_inline_backticks_in_prose_ignored() {
        let raw = "I will answer inside a ``` fence as asked.\n```json\n{\"thought\": \"done\", \"action\": {\"tool\": \"finish\", \"args\": {\"summary\": \"ok\"}}}\n```";
        let (_, req) = request(parse(raw));
        assert_eq!(req.name, FINISH_TOOL);

        let compact = "```json\n{\"thought\": \"x\", \"action\": {\"tool\": \"echo\", \"args\": {\"text\": \"a ``` b\"}}}\n```";
        let (_, req) = request(parse(compact));
        assert_eq!(req.arguments["text"], "a ``` b");
    }

    #[test]
    fn test_empty_block_is_invalid_json() {
        match parse("```json\n```") {
            ParsedResponse::Failed(reason) => assert!(reason.starts_with("Error: Invalid JSON format.")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
