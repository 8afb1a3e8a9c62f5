//! `write_file`: create or fully overwrite a file.

use serde_json::json;
use steward_core::approval::ApprovalKind;
use steward_core::error::ToolError;
use steward_core::provider::ToolDefinition;
use steward_core::tool::{ChangeKind, FileChange, ToolInput, ToolName};
use steward_core::workspace::{EntryKind, normalize_path};

use crate::args::required_str;
use crate::executor::{ToolContext, ToolOutput, workspace_error};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::WriteFile.as_str().into(),
        description: "Create a file or replace its entire contents. Parent directories are \
                      created as needed."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Workspace-relative file path" },
                "content": { "type": "string", "description": "Complete new file contents" }
            },
            "required": ["path", "content"]
        }),
    }
}

pub async fn run(ctx: &ToolContext<'_>, input: &ToolInput) -> Result<ToolOutput, ToolError> {
    let path = required_str(input, "path")?;
    let content = required_str(input, "content")?;

    let kind = match ctx
        .workspace
        .stat(path)
        .await
        .map_err(|e| workspace_error(ToolName::WriteFile, e))?
    {
        Some(EntryKind::Directory) => return Err(ToolError::IsDirectory(path.into())),
        Some(EntryKind::File) => ChangeKind::Modified,
        None => ChangeKind::Created,
    };

    if ctx.settings.approve_writes {
        ctx.approve(ApprovalKind::WriteFile, path, content).await?;
    }

    ctx.workspace
        .write(path, content)
        .await
        .map_err(|e| workspace_error(ToolName::WriteFile, e))?;

    let change = FileChange {
        path: normalize_path(path).unwrap_or_else(|| path.to_string()),
        kind,
    };
    Ok(
        ToolOutput::new(format!("Successfully wrote {} bytes to {path}", content.len()))
            .with_file_change(change),
    )
}
