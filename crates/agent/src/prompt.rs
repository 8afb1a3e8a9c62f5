//! Text the orchestrator puts into the transcript: the system prompt and the
//! user-role messages it synthesizes between iterations.

use steward_core::provider::ToolDefinition;
use steward_core::tool::{ToolCall, ToolName, ToolResult};

use crate::parser::ParseIssue;

const PREAMBLE: &str = "\
You are Steward, an autonomous software agent working inside a file workspace.
You accomplish the user's goal by calling tools. Every tool call you write is
executed, in the order written, and the results are sent back to you.";

const FORMAT_RULES: &str = "\
# Calling tools

Write a tool call as an XML-style tag named after the tool. The body is either
one JSON object (double-quoted strings only):

<read_file>{\"path\": \"src/main.rs\"}</read_file>

or one child element per parameter:

<write_file>
<path>notes.txt</path>
<content>
first line
</content>
</write_file>

Tag names are case-sensitive and must match a tool name exactly. Do not wrap
calls in other tags or code fences. You may think inside <thinking>...</thinking>;
that text is ignored.";

const COMPLETION_RULE: &str = "\
# Finishing

When the goal is accomplished, call attempt_completion with a summary of what
you did. Nothing after attempt_completion in the same response is executed.
Do not call it until you have confirmed the result.";

/// Render the system prompt for `tools`.
pub fn system_prompt(tools: &[ToolDefinition]) -> String {
    let mut out = String::new();
    out.push_str(PREAMBLE);
    out.push_str("\n\n");
    out.push_str(FORMAT_RULES);
    out.push_str("\n\n# Tools\n");

    for tool in tools {
        let schema = serde_json::to_string(&tool.parameters).unwrap_or_default();
        out.push_str(&format!(
            "\n## {}\n{}\nParameters: {}\n",
            tool.name, tool.description, schema
        ));
    }

    out.push('\n');
    out.push_str(COMPLETION_RULE);
    out
}

/// The message sent when parsing found issues. Nothing was executed.
pub fn correction(issues: &[ParseIssue]) -> String {
    let mut out =
        String::from("Your last response contained invalid tool calls, so nothing was executed:\n");
    for issue in issues {
        out.push_str(&format!("- {issue}\n"));
    }
    if issues
        .iter()
        .any(|i| matches!(i, ParseIssue::UnknownTool { .. }))
    {
        let names: Vec<&str> = ToolName::ALL.iter().map(|t| t.as_str()).collect();
        out.push_str(&format!("Available tools: {}\n", names.join(", ")));
    }
    out.push_str(
        "Resend the tool calls using <tool_name>{json}</tool_name> or \
         <tool_name><param>value</param></tool_name>.",
    );
    out
}

pub const NUDGE: &str = "\
Your response did not contain a tool call. Continue working toward the goal by \
calling a tool, or call attempt_completion if the goal is accomplished.";

/// The message sent when the loop detector fires.
pub fn intervention(reason: &str) -> String {
    format!(
        "Loop detected: {reason}. The calls were not executed. Stop exploring. \
         Make the change directly with write_file or edit_file, or call \
         attempt_completion if the goal is already accomplished."
    )
}

/// One block per executed call: a header line, then output or error.
pub fn tool_results(results: &[(ToolCall, ToolResult)]) -> String {
    let mut out = String::from("Tool results:\n");
    for (call, result) in results {
        let status = if result.success { "success" } else { "error" };
        out.push_str(&format!("\n[{}] {}\n{}\n", call.name, status, result.text()));
    }
    out
}
