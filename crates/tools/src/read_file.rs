//! `read_file`: return file text, optionally a window of lines.

use serde_json::json;
use steward_core::error::{ToolError, WorkspaceError};
use steward_core::provider::ToolDefinition;
use steward_core::tool::{ToolInput, ToolName};

use crate::args::{optional_usize, required_str};
use crate::executor::{ToolContext, ToolOutput, workspace_error};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::ReadFile.as_str().into(),
        description: "Read the contents of a file in the workspace. Use offset and limit to \
                      read a window of lines from a large file."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Workspace-relative file path" },
                "offset": { "type": "integer", "description": "1-based line to start from" },
                "limit": { "type": "integer", "description": "Maximum number of lines to return" }
            },
            "required": ["path"]
        }),
    }
}

pub async fn run(ctx: &ToolContext<'_>, input: &ToolInput) -> Result<ToolOutput, ToolError> {
    let path = required_str(input, "path")?;
    let offset = optional_usize(input, "offset")?;
    let limit = optional_usize(input, "limit")?;

    let content = ctx.workspace.read(path).await.map_err(|e| match e {
        WorkspaceError::NotFound(_) => ToolError::FileNotFound(path.into()),
        WorkspaceError::IsDirectory(_) => ToolError::IsDirectory(path.into()),
        other => workspace_error(ToolName::ReadFile, other),
    })?;

    let total_lines = content.lines().count();
    if offset.is_none() && limit.is_none() {
        return Ok(ToolOutput::new(content).with_metadata("total_lines", total_lines));
    }

    let start = offset.unwrap_or(1).max(1);
    if start > total_lines.max(1) {
        return Err(ToolError::InvalidArguments(format!(
            "offset {start} is past the end of {path} ({total_lines} lines)"
        )));
    }

    let window: Vec<&str> = content
        .lines()
        .skip(start - 1)
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    let end = start + window.len().saturating_sub(1);

    Ok(ToolOutput::new(window.join("\n"))
        .with_metadata("total_lines", total_lines)
        .with_metadata("start_line", start)
        .with_metadata("end_line", end))
}
