//! `attempt_completion`: the model's signal that the goal is done.

use serde_json::json;
use steward_core::error::ToolError;
use steward_core::provider::ToolDefinition;
use steward_core::tool::{ToolInput, ToolName};

use crate::args::{optional_str, required_str};
use crate::executor::{ToolContext, ToolOutput};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::AttemptCompletion.as_str().into(),
        description: "Call this once the goal is accomplished. The result is shown to the \
                      user as the final summary of the work."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "result": { "type": "string", "description": "Summary of what was done" },
                "command": { "type": "string", "description": "Optional command the user can run to see the result" }
            },
            "required": ["result"]
        }),
    }
}

pub async fn run(_ctx: &ToolContext<'_>, input: &ToolInput) -> Result<ToolOutput, ToolError> {
    let result = required_str(input, "result")?;
    if result.trim().is_empty() {
        return Err(ToolError::InvalidArguments(
            "result must not be empty; describe what was accomplished".into(),
        ));
    }

    let mut output = ToolOutput::new(result.trim());
    if let Some(command) = optional_str(input, "command")?.filter(|c| !c.trim().is_empty()) {
        output = output.with_metadata("command", command);
    }
    Ok(output)
}
