//! The Steward agent loop.
//!
//! An [`Orchestrator`] drives one [`Session`](steward_core::Session) through
//! a cycle of model call, parse, repetition check and tool execution:
//!
//! 1. **Call the model** with the full transcript
//! 2. **Parse** `<tool>…</tool>` calls out of the reply ([`ToolCallParser`])
//! 3. **Check** for unproductive repetition ([`LoopDetector`])
//! 4. **Execute** the calls in order and append the results
//!
//! The cycle ends when the model calls `attempt_completion`, or when an
//! iteration, time or mistake budget runs out.

pub mod loop_detector;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod sinks;

pub use loop_detector::{LoopDetector, LoopDetectorConfig, LoopSignal};
pub use orchestrator::{CancelHandle, Orchestrator, OrchestratorConfig};
pub use parser::{ParseIssue, ParseOutcome, StreamStatus, StreamingToolCallParser, ToolCallParser};
pub use sinks::{JsonlSink, MemorySink};
