//! Iteration sink: the durable-logging hook.
//!
//! The orchestrator hands one `IterationRecord` to the sink after every
//! iteration. Sinks are best-effort: a failing sink is logged and ignored, and
//! the loop behaves identically with `NoopSink`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::session::SessionId;
use crate::tool::{ToolCall, ToolResult};

/// How an iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationOutcome {
    /// Tool calls were executed and their results appended
    Executed,
    /// The response had no tool calls; the model was nudged
    Narrative,
    /// Parser issues were reported back to the model
    Corrected,
    /// The loop detector fired and the batch was skipped
    LoopIntervention,
    /// `attempt_completion` succeeded
    Completed,
    /// The model call failed
    ModelError,
    /// The session was cancelled mid-iteration
    Cancelled,
}

/// Everything that happened in one iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub session_id: SessionId,
    pub iteration: u32,
    /// The transcript sent to the model
    pub request: Vec<Message>,
    /// Raw model text, when the call succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub tool_results: Vec<ToolResult>,
    pub outcome: IterationOutcome,
    /// Mistake counter after this iteration
    #[serde(default)]
    pub consecutive_mistakes: u32,
    pub recorded_at: DateTime<Utc>,
}

#[async_trait]
pub trait IterationSink: Send + Sync {
    /// Persist one iteration record.
    async fn record(&self, record: &IterationRecord) -> Result<()>;
}

/// Discards everything.
pub struct NoopSink;

#[async_trait]
impl IterationSink for NoopSink {
    async fn record(&self, _record: &IterationRecord) -> Result<()> {
        Ok(())
    }
}
