//! # Steward Core
//!
//! Domain types, traits, and error definitions for the Steward agent
//! orchestrator. Every seam the loop talks through (model completion,
//! workspace, approval, iteration logging) is a trait here; implementations
//! live in their own crates and all crates depend inward on this one.

pub mod approval;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod session;
pub mod sink;
pub mod tool;
pub mod workspace;

// Re-export key types at crate root for ergonomics
pub use approval::{ApprovalGate, ApprovalKind, AutoApprove, DenyAll};
pub use error::{Error, ProviderError, Result, SessionError, ToolError, WorkspaceError};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, Role};
pub use provider::{CompletionOptions, CompletionStream, Provider, ToolDefinition};
pub use session::{Session, SessionId, SessionResult, SessionStatus};
pub use sink::{IterationOutcome, IterationRecord, IterationSink, NoopSink};
pub use tool::{ChangeKind, FileChange, ToolCall, ToolInput, ToolName, ToolResult};
pub use workspace::{CommandOutput, DirEntry, EntryKind, Workspace};
