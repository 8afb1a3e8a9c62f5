//! The orchestrator: drives one session from goal to a terminal state.
//!
//! Each iteration calls the model with the whole transcript, parses the
//! reply, checks for repetition, executes the calls in order and appends the
//! results. Parser issues and loop interventions are fed back to the model
//! as corrective messages; too many in a row end the session.

use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use steward_config::AppConfig;
use steward_core::error::{ProviderError, SessionError};
use steward_core::event::{DomainEvent, EventBus};
use steward_core::message::Message;
use steward_core::provider::{CompletionOptions, Provider};
use steward_core::session::{Session, SessionResult};
use steward_core::sink::{IterationOutcome, IterationRecord, IterationSink, NoopSink};
use steward_core::tool::{ToolCall, ToolName, ToolResult};
use steward_tools::ToolExecutor;

use crate::loop_detector::{LoopDetector, LoopDetectorConfig};
use crate::parser::{StreamStatus, StreamingToolCallParser, ToolCallParser};
use crate::prompt;

/// Budgets and policies for a run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_iterations: u32,
    /// Checked at the top of each iteration, not during a model call
    pub timeout: Duration,
    pub max_consecutive_mistakes: u32,
    pub stream_early_stop: bool,
    pub completion: CompletionOptions,
    pub loop_detection: LoopDetectorConfig,
    pub passthrough_tags: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            timeout: Duration::from_secs(30 * 60),
            max_consecutive_mistakes: 3,
            stream_early_stop: false,
            completion: CompletionOptions::default(),
            loop_detection: LoopDetectorConfig::default(),
            passthrough_tags: vec!["thinking".into()],
        }
    }
}

impl OrchestratorConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        let loop_cfg = &config.loop_detection;
        Self {
            max_iterations: config.agent.max_iterations,
            timeout: Duration::from_secs(config.agent.timeout_secs),
            max_consecutive_mistakes: config.agent.max_consecutive_mistakes,
            stream_early_stop: config.agent.stream_early_stop,
            completion: CompletionOptions {
                max_tokens: Some(config.provider.max_tokens),
                temperature: config.provider.temperature,
            },
            loop_detection: LoopDetectorConfig {
                enabled: loop_cfg.enabled,
                window: i64::try_from(loop_cfg.window_secs)
                    .ok()
                    .and_then(chrono::Duration::try_seconds)
                    .unwrap_or(chrono::Duration::MAX),
                max_same_tool: loop_cfg.max_same_tool,
                max_identical_calls: loop_cfg.max_identical_calls,
            },
            passthrough_tags: config.agent.passthrough_tags.clone(),
        }
    }
}

/// Stops a running session from another task.
///
/// Cancelling interrupts an in-flight model call and prevents the next tool
/// call from starting. A tool that is already running finishes first.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

enum ModelReply {
    Text(String),
    Failed(ProviderError),
    Cancelled,
}

pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    executor: Arc<ToolExecutor>,
    config: OrchestratorConfig,
    parser: ToolCallParser,
    sink: Arc<dyn IterationSink>,
    event_bus: Arc<EventBus>,
    cancel: CancelHandle,
    system_prompt: String,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        executor: Arc<ToolExecutor>,
        config: OrchestratorConfig,
    ) -> Self {
        let parser = ToolCallParser::new().with_passthrough_tags(config.passthrough_tags.clone());
        let system_prompt = prompt::system_prompt(&executor.definitions());
        Self {
            provider,
            executor,
            config,
            parser,
            sink: Arc::new(NoopSink),
            event_bus: Arc::new(EventBus::new(256)),
            cancel: CancelHandle::new(),
            system_prompt,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn IterationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Replace the rendered system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Share a handle created elsewhere, e.g. one an approval gate also holds.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = handle;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Drive `session` until it leaves `Active`.
    ///
    /// Model failures, budgets and cancellation end the session and are
    /// reported in the returned result. `Err` means the session was not
    /// active to begin with.
    pub async fn run(&self, session: &mut Session) -> Result<SessionResult, SessionError> {
        if !session.is_active() {
            return Err(SessionError::NotActive(session.id().to_string()));
        }
        if session.transcript().is_empty() {
            let goal = session.goal().to_string();
            session.push_message(Message::system(self.system_prompt.clone()))?;
            session.push_message(Message::user(goal))?;
        }

        let session_id = session.id().to_string();
        info!(session_id = %session_id, goal = %session.goal(), "Session started");
        self.event_bus.publish(DomainEvent::SessionStarted {
            session_id: session_id.clone(),
            goal: session.goal().to_string(),
            timestamp: Utc::now(),
        });

        let started = tokio::time::Instant::now();
        let max_iterations = self.config.max_iterations;
        let mut detector = LoopDetector::new(self.config.loop_detection.clone());
        let mut mistakes: u32 = 0;

        while session.is_active() && session.iteration() < max_iterations {
            if self.cancel.is_cancelled() {
                session.fail("cancelled")?;
                break;
            }

            let iteration = session.begin_iteration(max_iterations)?;
            debug!(session_id = %session_id, iteration, "Iteration started");
            self.event_bus.publish(DomainEvent::IterationStarted {
                session_id: session_id.clone(),
                iteration,
                timestamp: Utc::now(),
            });

            if started.elapsed() >= self.config.timeout {
                warn!(session_id = %session_id, iteration, "Session timed out");
                session.time_out(format!("timeout after {}s", self.config.timeout.as_secs()))?;
                break;
            }

            let request = session.transcript().to_vec();
            let mut record = IterationRecord {
                session_id: session.id().clone(),
                iteration,
                request,
                response: None,
                tool_calls: vec![],
                tool_results: vec![],
                outcome: IterationOutcome::ModelError,
                consecutive_mistakes: mistakes,
                recorded_at: Utc::now(),
            };

            let response = match self.call_model(&record.request).await {
                ModelReply::Text(text) => text,
                ModelReply::Failed(e) => {
                    warn!(session_id = %session_id, iteration, "Model call failed: {e}");
                    session.fail(format!("model call failed: {e}"))?;
                    self.record(record).await;
                    break;
                }
                ModelReply::Cancelled => {
                    info!(session_id = %session_id, iteration, "Cancelled during model call");
                    session.fail("cancelled")?;
                    record.outcome = IterationOutcome::Cancelled;
                    self.record(record).await;
                    break;
                }
            };
            record.response = Some(response.clone());

            let parsed = self.parser.parse(&response);

            if parsed.has_issues() {
                mistakes += 1;
                debug!(
                    session_id = %session_id,
                    iteration,
                    issues = parsed.issues.len(),
                    "Tool-call issues, sending correction"
                );
                session.push_message(Message::assistant(response))?;
                session.push_message(Message::user(prompt::correction(&parsed.issues)))?;
                self.event_bus.publish(DomainEvent::CorrectionIssued {
                    session_id: session_id.clone(),
                    iteration,
                    consecutive_mistakes: mistakes,
                    timestamp: Utc::now(),
                });
                record.tool_calls = parsed.calls;
                record.outcome = IterationOutcome::Corrected;
                record.consecutive_mistakes = mistakes;
                self.record(record).await;
                self.check_mistakes(session, mistakes)?;
                continue;
            }

            if parsed.calls.is_empty() {
                debug!(session_id = %session_id, iteration, "No tool calls, nudging");
                session.push_message(Message::assistant(response))?;
                session.push_message(Message::user(prompt::NUDGE))?;
                record.outcome = IterationOutcome::Narrative;
                self.record(record).await;
                continue;
            }

            let signal = detector.observe(&parsed.calls, iteration);
            if signal.is_loop {
                mistakes += 1;
                warn!(session_id = %session_id, iteration, reason = %signal.reason, "Loop detected");
                session.push_message(Message::assistant(response))?;
                session.push_message(Message::user(prompt::intervention(&signal.reason)))?;
                self.event_bus.publish(DomainEvent::LoopDetected {
                    session_id: session_id.clone(),
                    iteration,
                    reason: signal.reason,
                    timestamp: Utc::now(),
                });
                record.tool_calls = parsed.calls;
                record.outcome = IterationOutcome::LoopIntervention;
                record.consecutive_mistakes = mistakes;
                self.record(record).await;
                self.check_mistakes(session, mistakes)?;
                continue;
            }

            let mut executed: Vec<(ToolCall, ToolResult)> = Vec::new();
            let mut completion: Option<String> = None;
            let mut cancelled = false;

            for call in &parsed.calls {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }

                let result = self.executor.execute(call.name, &call.input).await;
                debug!(
                    session_id = %session_id,
                    iteration,
                    tool = %call.name,
                    success = result.success,
                    "Tool executed"
                );
                self.event_bus.publish(DomainEvent::ToolExecuted {
                    session_id: session_id.clone(),
                    tool: call.name,
                    success: result.success,
                    duration_ms: result
                        .metadata
                        .get("duration_ms")
                        .and_then(|v| v.as_u64())
                        .unwrap_or(0),
                    timestamp: Utc::now(),
                });
                if let Some(change) = &result.file_change {
                    session.record_file_change(change.clone())?;
                }

                let completes = call.name == ToolName::AttemptCompletion && result.success;
                if completes {
                    completion = Some(result.text().to_string());
                }
                executed.push((call.clone(), result));
                if completes {
                    break;
                }
            }

            mistakes = 0;
            session.push_message(Message::assistant(response))?;
            session.push_message(Message::user(prompt::tool_results(&executed)))?;

            let (tool_calls, tool_results): (Vec<_>, Vec<_>) = executed.into_iter().unzip();
            record.tool_calls = tool_calls;
            record.tool_results = tool_results;
            record.consecutive_mistakes = 0;

            if let Some(summary) = completion {
                info!(session_id = %session_id, iteration, "Session completed");
                session.complete(summary)?;
                record.outcome = IterationOutcome::Completed;
            } else if cancelled {
                info!(session_id = %session_id, iteration, "Cancelled between tool calls");
                session.fail("cancelled")?;
                record.outcome = IterationOutcome::Cancelled;
            } else {
                record.outcome = IterationOutcome::Executed;
            }
            self.record(record).await;
        }

        if session.is_active() {
            warn!(session_id = %session_id, iterations = session.iteration(), "Iteration budget exhausted");
            session.fail("max iterations reached")?;
        }

        let result = session.result();
        info!(
            session_id = %session_id,
            status = %result.status,
            iterations = result.iterations,
            files_changed = result.file_changes.len(),
            "Session ended"
        );
        self.event_bus.publish(DomainEvent::SessionEnded {
            session_id,
            status: result.status,
            iterations: result.iterations,
            timestamp: Utc::now(),
        });
        Ok(result)
    }

    fn check_mistakes(&self, session: &mut Session, mistakes: u32) -> Result<(), SessionError> {
        if mistakes >= self.config.max_consecutive_mistakes {
            warn!(session_id = %session.id(), mistakes, "Too many consecutive mistakes");
            session.fail(format!("too many consecutive mistakes ({mistakes})"))?;
        }
        Ok(())
    }

    /// Call the model, racing the cancel handle.
    async fn call_model(&self, request: &[Message]) -> ModelReply {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => ModelReply::Cancelled,
            reply = self.complete(request) => match reply {
                Ok(text) => ModelReply::Text(text),
                Err(e) => ModelReply::Failed(e),
            },
        }
    }

    async fn complete(&self, request: &[Message]) -> Result<String, ProviderError> {
        if !self.config.stream_early_stop {
            return self.provider.complete(request, &self.config.completion).await;
        }

        let mut stream = self.provider.stream(request, &self.config.completion).await?;
        let mut streaming = StreamingToolCallParser::new(self.parser.clone());
        while let Some(chunk) = stream.recv().await {
            if streaming.push(&chunk?) == StreamStatus::ToolCallComplete {
                debug!("First tool call complete, dropping the rest of the stream");
                break;
            }
        }
        Ok(streaming.into_text())
    }

    async fn record(&self, record: IterationRecord) {
        if let Err(e) = self.sink.record(&record).await {
            warn!(session_id = %record.session_id, iteration = record.iteration, "Iteration sink failed: {e}");
        }
    }
}
