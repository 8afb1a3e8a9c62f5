//! Tool domain types: the closed capability set and its call/result shapes.
//!
//! The capability set is a fixed enumeration rather than a string-keyed
//! registry: every dispatch site is an exhaustive `match`, so adding a tool
//! is a compile error everywhere it has not been handled yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded tool input: a key → value map.
pub type ToolInput = Map<String, Value>;

/// Every capability the executor knows how to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ReadFile,
    WriteFile,
    EditFile,
    ListDirectory,
    GrepSearch,
    BashCommand,
    AttemptCompletion,
}

impl ToolName {
    /// All capabilities, in the order they are presented to the model.
    pub const ALL: [ToolName; 7] = [
        ToolName::ReadFile,
        ToolName::WriteFile,
        ToolName::EditFile,
        ToolName::ListDirectory,
        ToolName::GrepSearch,
        ToolName::BashCommand,
        ToolName::AttemptCompletion,
    ];

    /// The tag name the model uses. Case-sensitive.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ReadFile => "read_file",
            ToolName::WriteFile => "write_file",
            ToolName::EditFile => "edit_file",
            ToolName::ListDirectory => "list_directory",
            ToolName::GrepSearch => "grep_search",
            ToolName::BashCommand => "bash_command",
            ToolName::AttemptCompletion => "attempt_completion",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to execute a tool, extracted from model text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Which capability to run
    pub name: ToolName,

    /// Decoded input map
    pub input: ToolInput,
}

impl ToolCall {
    pub fn new(name: ToolName, input: ToolInput) -> Self {
        Self { name, input }
    }

    /// Canonical serialization of the input. `serde_json::Map` keeps keys
    /// sorted, so equal maps always serialize identically.
    pub fn canonical_input(&self) -> String {
        serde_json::to_string(&self.input).unwrap_or_default()
    }
}

/// How a file was affected by a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
}

/// A file touched during a session, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
}

/// The result of one tool execution. One result per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Output text on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Error text on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Tool name, duration, timestamps and tool-specific extras
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Workspace change made by this call, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_change: Option<FileChange>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
            metadata: Map::new(),
            file_change: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            metadata: Map::new(),
            file_change: None,
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

    /// Stamp the standard metadata every result carries.
    pub fn stamp(
        mut self,
        tool: ToolName,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0);
        self.metadata.insert("tool".into(), tool.as_str().into());
        self.metadata.insert("duration_ms".into(), duration_ms.into());
        self.metadata
            .insert("started_at".into(), started_at.to_rfc3339().into());
        self.metadata
            .insert("finished_at".into(), finished_at.to_rfc3339().into());
        self
    }

    /// The text the model sees: output on success, error on failure.
    pub fn text(&self) -> &str {
        if self.success {
            self.output.as_deref().unwrap_or("")
        } else {
            self.error.as_deref().unwrap_or("unknown error")
        }
    }
}
