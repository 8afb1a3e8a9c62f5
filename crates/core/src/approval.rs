//! Approval gate: the human-in-the-loop checkpoint before mutations.
//!
//! The executor consults the gate (when one is configured) before
//! `write_file`, `edit_file` and flagged `bash_command` calls. A denial is
//! reported to the model as a failed tool result, never as an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What kind of mutation is being proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    WriteFile,
    EditFile,
    BashCommand,
}

impl ApprovalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalKind::WriteFile => "write_file",
            ApprovalKind::EditFile => "edit_file",
            ApprovalKind::BashCommand => "bash_command",
        }
    }
}

#[async_trait]
pub trait ApprovalGate: Send + Sync {
    /// Ask whether the proposed change may proceed.
    ///
    /// `target` is the file path for file tools and the workspace root
    /// marker `.` for shell commands. `proposed_change` is the new file
    /// content, a summary of the edits, or the command line.
    async fn request_approval(&self, kind: ApprovalKind, target: &str, proposed_change: &str)
    -> bool;
}

/// Approves everything. Used when the caller opts out of review.
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn request_approval(&self, _kind: ApprovalKind, _target: &str, _proposed: &str) -> bool {
        true
    }
}

/// Denies everything. Useful for read-only runs and tests.
pub struct DenyAll;

#[async_trait]
impl ApprovalGate for DenyAll {
    async fn request_approval(&self, kind: ApprovalKind, target: &str, _proposed: &str) -> bool {
        tracing::debug!(kind = kind.as_str(), target, "Approval denied by policy");
        false
    }
}
