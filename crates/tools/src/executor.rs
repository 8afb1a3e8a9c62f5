//! Tool executor: one entry point for every capability.
//!
//! `execute` never fails: whatever goes wrong inside a tool comes back as a
//! `ToolResult` with `success = false`, so the model can read the error and
//! decide what to do next.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use steward_core::approval::{ApprovalGate, ApprovalKind};
use steward_core::error::{ToolError, WorkspaceError};
use steward_core::provider::ToolDefinition;
use steward_core::tool::{FileChange, ToolInput, ToolName, ToolResult};
use steward_core::workspace::Workspace;

use crate::truncation::truncate_output;
use crate::{
    attempt_completion, bash_command, edit_file, grep_search, list_directory, read_file,
    write_file,
};

/// Limits and approval policy applied to every call.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub bash_default_timeout_secs: u64,
    pub bash_max_timeout_secs: u64,
    pub grep_max_results: usize,
    pub max_output_chars: usize,
    /// Ask the gate before `write_file` and `edit_file`
    pub approve_writes: bool,
    /// Ask the gate before every `bash_command`, flagged or not
    pub approve_all_commands: bool,
    /// Directory names recursive listings and searches do not enter
    pub ignored_dirs: Vec<String>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            bash_default_timeout_secs: 30,
            bash_max_timeout_secs: 300,
            grep_max_results: 100,
            max_output_chars: 50_000,
            approve_writes: false,
            approve_all_commands: false,
            ignored_dirs: vec![".git".into(), "node_modules".into(), "target".into()],
        }
    }
}

/// What a tool hands back to the executor on success.
#[derive(Debug, Default)]
pub struct ToolOutput {
    pub text: String,
    pub file_change: Option<FileChange>,
    pub metadata: Map<String, Value>,
    /// Set when the tool changed the workspace and then failed part-way
    pub failure: Option<ToolError>,
}

impl ToolOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// The workspace was changed, but the call as a whole failed.
    pub fn partial(error: ToolError, change: FileChange) -> Self {
        Self {
            file_change: Some(change),
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_file_change(mut self, change: FileChange) -> Self {
        self.file_change = Some(change);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Everything a tool may touch while it runs.
pub struct ToolContext<'a> {
    pub workspace: &'a dyn Workspace,
    pub settings: &'a ExecutorSettings,
    gate: Option<&'a dyn ApprovalGate>,
}

impl<'a> ToolContext<'a> {
    pub fn new(
        workspace: &'a dyn Workspace,
        settings: &'a ExecutorSettings,
        gate: Option<&'a dyn ApprovalGate>,
    ) -> Self {
        Self {
            workspace,
            settings,
            gate,
        }
    }

    /// Consult the approval gate. Without a gate every change proceeds.
    pub async fn approve(
        &self,
        kind: ApprovalKind,
        target: &str,
        proposed_change: &str,
    ) -> Result<(), ToolError> {
        let Some(gate) = self.gate else {
            return Ok(());
        };
        if gate.request_approval(kind, target, proposed_change).await {
            Ok(())
        } else {
            debug!(kind = kind.as_str(), target, "Change rejected by approval gate");
            Err(ToolError::Cancelled)
        }
    }
}

/// Translate a workspace failure into what the model is told.
pub(crate) fn workspace_error(tool: ToolName, err: WorkspaceError) -> ToolError {
    match err {
        WorkspaceError::NotFound(path) => ToolError::PathNotFound(path),
        WorkspaceError::IsDirectory(path) => ToolError::IsDirectory(path),
        WorkspaceError::NotADirectory(path) => ToolError::NotADirectory(path),
        WorkspaceError::Unsupported(reason) => ToolError::Unsupported(reason),
        other @ WorkspaceError::OutsideWorkspace(_) => {
            ToolError::InvalidArguments(other.to_string())
        }
        other => ToolError::ExecutionFailed {
            tool_name: tool.as_str().into(),
            reason: other.to_string(),
        },
    }
}

/// Runs tool calls against one workspace.
pub struct ToolExecutor {
    workspace: Arc<dyn Workspace>,
    settings: ExecutorSettings,
    gate: Option<Arc<dyn ApprovalGate>>,
}

impl ToolExecutor {
    pub fn new(workspace: Arc<dyn Workspace>, settings: ExecutorSettings) -> Self {
        Self {
            workspace,
            settings,
            gate: None,
        }
    }

    /// Route mutating calls through `gate` (subject to the settings' policy).
    pub fn with_approval_gate(mut self, gate: Arc<dyn ApprovalGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    pub fn workspace(&self) -> &Arc<dyn Workspace> {
        &self.workspace
    }

    /// Definitions for every capability, in presentation order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        crate::definitions()
    }

    /// Execute one tool call. Never returns an error.
    pub async fn execute(&self, name: ToolName, input: &ToolInput) -> ToolResult {
        let started_at = Utc::now();
        let ctx = ToolContext::new(
            self.workspace.as_ref(),
            &self.settings,
            self.gate.as_deref(),
        );

        debug!(tool = %name, workspace = self.workspace.name(), "Executing tool");

        let outcome = match name {
            ToolName::ReadFile => read_file::run(&ctx, input).await,
            ToolName::WriteFile => write_file::run(&ctx, input).await,
            ToolName::EditFile => edit_file::run(&ctx, input).await,
            ToolName::ListDirectory => list_directory::run(&ctx, input).await,
            ToolName::GrepSearch => grep_search::run(&ctx, input).await,
            ToolName::BashCommand => bash_command::run(&ctx, input).await,
            ToolName::AttemptCompletion => attempt_completion::run(&ctx, input).await,
        };

        let result = match outcome {
            Ok(ToolOutput {
                text,
                file_change,
                metadata,
                failure,
            }) => {
                let mut result = match failure {
                    // The completion summary goes back to the caller whole
                    None if name == ToolName::AttemptCompletion => ToolResult::ok(text),
                    None => ToolResult::ok(truncate_output(&text, self.settings.max_output_chars)),
                    Some(err) => {
                        warn!(tool = %name, error = %err, "Tool failed after changing the workspace");
                        ToolResult::failure(err.to_string())
                    }
                };
                result.metadata = metadata;
                result.file_change = file_change;
                result
            }
            Err(err) => {
                debug!(tool = %name, error = %err, "Tool call failed");
                ToolResult::failure(err.to_string())
            }
        };

        result.stamp(name, started_at, Utc::now())
    }
}
