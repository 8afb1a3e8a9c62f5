//! Tool execution for Steward.
//!
//! The capability set is closed: one module per `ToolName`, each exposing a
//! `definition()` for the system prompt and a `run()` the executor dispatches
//! to. Tools see the workspace only through the `Workspace` trait, so they
//! behave the same on disk and in memory.

mod args;
pub mod attempt_completion;
pub mod bash_command;
pub mod edit_file;
pub mod executor;
pub mod grep_search;
pub mod list_directory;
pub mod read_file;
pub mod truncation;
pub mod workspace;
pub mod write_file;

use steward_core::provider::ToolDefinition;
use steward_core::tool::ToolName;

pub use executor::{ExecutorSettings, ToolContext, ToolExecutor, ToolOutput};
pub use workspace::{InMemoryWorkspace, LocalWorkspace};

/// The definition presented to the model for `tool`.
pub fn definition(tool: ToolName) -> ToolDefinition {
    match tool {
        ToolName::ReadFile => read_file::definition(),
        ToolName::WriteFile => write_file::definition(),
        ToolName::EditFile => edit_file::definition(),
        ToolName::ListDirectory => list_directory::definition(),
        ToolName::GrepSearch => grep_search::definition(),
        ToolName::BashCommand => bash_command::definition(),
        ToolName::AttemptCompletion => attempt_completion::definition(),
    }
}

/// Definitions for every capability, in presentation order.
pub fn definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.into_iter().map(definition).collect()
}
