//! `bash_command`: run a shell command in the workspace root.
//!
//! A non-zero exit code is reported as data; only a timeout or a failure to
//! start the command fails the call.

use serde_json::json;
use std::time::Duration;
use steward_core::approval::ApprovalKind;
use steward_core::error::{ToolError, WorkspaceError};
use steward_core::provider::ToolDefinition;
use steward_core::tool::{ToolInput, ToolName};
use steward_core::workspace::CommandOutput;
use tracing::{debug, warn};

use crate::args::{optional_u64, required_bool, required_str};
use crate::executor::{ToolContext, ToolOutput, workspace_error};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: ToolName::BashCommand.as_str().into(),
        description: "Run a shell command with the workspace root as working directory. \
                      Set requires_approval to true for anything destructive or with side \
                      effects outside the workspace."
            .into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "Command line passed to sh -c" },
                "requires_approval": { "type": "boolean", "description": "Whether a human must confirm the command first" },
                "timeout": { "type": "integer", "description": "Timeout in seconds" }
            },
            "required": ["command", "requires_approval"]
        }),
    }
}

fn format_output(output: &CommandOutput) -> String {
    let mut text = format!("exit_code: {}", output.exit_code);
    if !output.stdout.is_empty() {
        text.push_str("\nstdout:\n");
        text.push_str(output.stdout.trim_end());
    }
    if !output.stderr.is_empty() {
        text.push_str("\nstderr:\n");
        text.push_str(output.stderr.trim_end());
    }
    text
}

pub async fn run(ctx: &ToolContext<'_>, input: &ToolInput) -> Result<ToolOutput, ToolError> {
    let command = required_str(input, "command")?;
    if command.trim().is_empty() {
        return Err(ToolError::InvalidArguments("command must not be empty".into()));
    }
    let requires_approval = required_bool(input, "requires_approval")?;
    let timeout_secs = optional_u64(input, "timeout")?
        .unwrap_or(ctx.settings.bash_default_timeout_secs)
        .clamp(1, ctx.settings.bash_max_timeout_secs.max(1));

    if requires_approval || ctx.settings.approve_all_commands {
        ctx.approve(ApprovalKind::BashCommand, ".", command).await?;
    }

    debug!(command = %command, timeout_secs, "Executing shell command");

    let output = ctx
        .workspace
        .run_command(command, Duration::from_secs(timeout_secs))
        .await
        .map_err(|e| match e {
            WorkspaceError::Timeout { timeout_secs } => ToolError::Timeout {
                command: command.into(),
                timeout_secs,
            },
            other => workspace_error(ToolName::BashCommand, other),
        })?;

    if output.exit_code != 0 {
        warn!(command = %command, exit_code = output.exit_code, "Command exited non-zero");
    }

    Ok(ToolOutput::new(format_output(&output))
        .with_metadata("exit_code", output.exit_code)
        .with_metadata("timeout_secs", timeout_secs))
}
