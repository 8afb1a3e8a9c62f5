//! Integration tests for the orchestration loop.
//!
//! A scripted provider stands in for the model and an in-memory workspace
//! stands in for the file tree, so every run is deterministic.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use steward_agent::{CancelHandle, MemorySink, Orchestrator, OrchestratorConfig, prompt};
use steward_core::approval::{ApprovalGate, ApprovalKind};
use steward_core::error::ProviderError;
use steward_core::event::{DomainEvent, EventBus};
use steward_core::message::{Message, Role};
use steward_core::provider::{CompletionOptions, CompletionStream, Provider};
use steward_core::session::{Session, SessionStatus};
use steward_core::sink::{IterationOutcome, IterationRecord, IterationSink};
use steward_core::tool::{ChangeKind, FileChange, ToolName};
use steward_tools::{ExecutorSettings, InMemoryWorkspace, ToolExecutor};

// ── Mock Providers ───────────────────────────────────────────────────────

/// Returns scripted replies in order, then repeats the last one.
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    last: Mutex<Option<Result<String, ProviderError>>>,
    calls: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Self {
        Self::from_results(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn from_results(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    fn always(reply: &str) -> Self {
        Self::new(&[reply])
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None => last.clone().expect("ScriptedProvider has no replies"),
        }
    }
}

/// Streams each reply as fixed-size chunks.
struct ChunkedProvider {
    inner: ScriptedProvider,
    chunk_chars: usize,
}

#[async_trait::async_trait]
impl Provider for ChunkedProvider {
    fn name(&self) -> &str {
        "chunked"
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        self.inner.complete(messages, options).await
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionStream, ProviderError> {
        let text = self.inner.complete(messages, options).await?;
        let chars: Vec<char> = text.chars().collect();
        let chunks: Vec<String> = chars
            .chunks(self.chunk_chars)
            .map(|c| c.iter().collect())
            .collect();
        let (tx, rx) = tokio::sync::mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            tx.send(Ok(chunk)).await.unwrap();
        }
        Ok(rx)
    }
}

/// Sleeps before every reply.
struct SlowProvider {
    delay: Duration,
}

#[async_trait::async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok("Still thinking about it.".into())
    }
}

/// Never replies.
struct HangingProvider;

#[async_trait::async_trait]
impl Provider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        std::future::pending().await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

const DONE: &str = r#"<attempt_completion>{"result": "done"}</attempt_completion>"#;

struct Harness {
    workspace: Arc<InMemoryWorkspace>,
    sink: Arc<MemorySink>,
    orchestrator: Orchestrator,
}

fn harness(provider: Arc<dyn Provider>, config: OrchestratorConfig) -> Harness {
    harness_with(provider, config, ExecutorSettings::default(), None)
}

fn harness_with(
    provider: Arc<dyn Provider>,
    config: OrchestratorConfig,
    settings: ExecutorSettings,
    gate: Option<Arc<dyn ApprovalGate>>,
) -> Harness {
    let workspace = Arc::new(InMemoryWorkspace::from_files([
        ("README.md", "# Demo\n"),
        ("src/lib.rs", "pub fn answer() -> u32 {\n    41\n}\n"),
    ]));
    let mut executor = ToolExecutor::new(workspace.clone(), settings);
    if let Some(gate) = gate {
        executor = executor.with_approval_gate(gate);
    }
    let sink = Arc::new(MemorySink::new());
    let orchestrator =
        Orchestrator::new(provider, Arc::new(executor), config).with_sink(sink.clone());
    Harness {
        workspace,
        sink,
        orchestrator,
    }
}

fn session() -> Session {
    Session::new("tester", "Fix the answer function")
}

fn outcomes(records: &[IterationRecord]) -> Vec<IterationOutcome> {
    records.iter().map(|r| r.outcome).collect()
}

// ── Termination ──────────────────────────────────────────────────────────

#[tokio::test]
async fn completion_on_first_iteration() {
    let provider = Arc::new(ScriptedProvider::always(DONE));
    let h = harness(provider.clone(), OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Completed);
    assert_eq!(result.iterations, 1);
    assert_eq!(result.completion_summary.as_deref(), Some("done"));
    assert!(result.error_message.is_none());
    assert_eq!(provider.calls(), 1);
    assert_eq!(outcomes(&h.sink.records().await), vec![IterationOutcome::Completed]);
}

#[tokio::test]
async fn max_iterations_without_completion_is_error() {
    let provider = Arc::new(ScriptedProvider::always("I am looking into it."));
    let config = OrchestratorConfig {
        max_iterations: 3,
        ..OrchestratorConfig::default()
    };
    let h = harness(provider.clone(), config);
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Error);
    assert_eq!(result.iterations, 3);
    assert_eq!(result.error_message.as_deref(), Some("max iterations reached"));
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn productive_calls_still_stop_at_iteration_cap() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"<read_file>{"path": "README.md"}</read_file>"#,
        r#"<read_file>{"path": "src/lib.rs"}</read_file>"#,
        r#"<list_directory>{"path": "src"}</list_directory>"#,
    ]));
    let config = OrchestratorConfig {
        max_iterations: 3,
        ..OrchestratorConfig::default()
    };
    let h = harness(provider, config);
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Error);
    assert_eq!(session.iteration(), 3);
    assert_eq!(
        outcomes(&h.sink.records().await),
        vec![IterationOutcome::Executed; 3]
    );
}

#[tokio::test]
async fn model_failure_is_fatal() {
    let provider = Arc::new(ScriptedProvider::from_results(vec![Err(
        ProviderError::Network("connection reset".into()),
    )]));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Error);
    assert_eq!(result.iterations, 1);
    assert_eq!(
        result.error_message.as_deref(),
        Some("model call failed: Network error: connection reset")
    );
    assert_eq!(outcomes(&h.sink.records().await), vec![IterationOutcome::ModelError]);
}

#[tokio::test(start_paused = true)]
async fn wall_clock_budget_times_out() {
    let provider = Arc::new(SlowProvider {
        delay: Duration::from_secs(2),
    });
    let config = OrchestratorConfig {
        timeout: Duration::from_secs(1),
        ..OrchestratorConfig::default()
    };
    let h = harness(provider, config);
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    // The slow first call overruns; the check at the top of iteration 2 fires
    assert_eq!(result.status, SessionStatus::Timeout);
    assert_eq!(result.iterations, 2);
    assert_eq!(result.error_message.as_deref(), Some("timeout after 1s"));
}

#[tokio::test]
async fn terminal_session_cannot_run() {
    let h = harness(
        Arc::new(ScriptedProvider::always(DONE)),
        OrchestratorConfig::default(),
    );
    let mut session = session();
    session.fail("earlier failure").unwrap();

    assert!(h.orchestrator.run(&mut session).await.is_err());
    assert_eq!(session.error_message(), Some("earlier failure"));
}

// ── Tool execution ───────────────────────────────────────────────────────

#[tokio::test]
async fn missing_file_is_recorded_as_tool_failure() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"<read_file>{"path": "nope.txt"}</read_file>"#,
        DONE,
    ]));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();
    assert_eq!(result.status, SessionStatus::Completed);

    let records = h.sink.records().await;
    let first = &records[0].tool_results[0];
    assert!(!first.success);
    assert_eq!(first.error.as_deref(), Some("File not found: nope.txt"));

    let feedback = &session.transcript()[3];
    assert_eq!(feedback.role, Role::User);
    assert!(feedback.content.contains("[read_file] error\nFile not found: nope.txt"));
}

#[tokio::test]
async fn calls_execute_in_document_order() {
    let provider = Arc::new(ScriptedProvider::new(&[
        concat!(
            r#"<write_file>{"path": "notes.txt", "content": "one"}</write_file>"#,
            r#"<edit_file>{"path": "notes.txt", "edits": [{"old_string": "one", "new_string": "two"}]}</edit_file>"#,
            r#"<read_file>{"path": "notes.txt"}</read_file>"#
        ),
        DONE,
    ]));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    h.orchestrator.run(&mut session).await.unwrap();

    let records = h.sink.records().await;
    let names: Vec<ToolName> = records[0].tool_calls.iter().map(|c| c.name).collect();
    assert_eq!(
        names,
        vec![ToolName::WriteFile, ToolName::EditFile, ToolName::ReadFile]
    );
    assert!(records[0].tool_results.iter().all(|r| r.success));
    assert!(records[0].tool_results[2].text().contains("two"));
    assert_eq!(
        h.workspace.snapshot().await.get("notes.txt").map(String::as_str),
        Some("two")
    );
}

#[tokio::test]
async fn completion_short_circuits_the_batch() {
    let provider = Arc::new(ScriptedProvider::always(concat!(
        r#"<write_file>{"path": "a.txt", "content": "a"}</write_file>"#,
        r#"<attempt_completion>{"result": "wrote a"}</attempt_completion>"#,
        r#"<write_file>{"path": "b.txt", "content": "b"}</write_file>"#
    )));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Completed);
    assert_eq!(result.completion_summary.as_deref(), Some("wrote a"));
    let files = h.workspace.snapshot().await;
    assert!(files.contains_key("a.txt"));
    assert!(!files.contains_key("b.txt"));
    assert_eq!(
        result.file_changes,
        vec![FileChange {
            path: "a.txt".into(),
            kind: ChangeKind::Created
        }]
    );
    assert_eq!(h.sink.records().await[0].tool_results.len(), 2);
}

#[tokio::test]
async fn rejected_completion_does_not_end_session() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"<attempt_completion>{"result": "  "}</attempt_completion>"#,
        DONE,
    ]));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Completed);
    assert_eq!(result.iterations, 2);
    assert_eq!(
        outcomes(&h.sink.records().await),
        vec![IterationOutcome::Executed, IterationOutcome::Completed]
    );
}

#[tokio::test]
async fn file_changes_are_reported() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"<edit_file><path>src/lib.rs</path><edits>[{"old_string": "41", "new_string": "42"}]</edits></edit_file>"#,
        r#"<write_file><path>CHANGELOG.md</path><content>Fixed answer</content></write_file>"#,
        DONE,
    ]));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(
        result.file_changes,
        vec![
            FileChange {
                path: "src/lib.rs".into(),
                kind: ChangeKind::Modified
            },
            FileChange {
                path: "CHANGELOG.md".into(),
                kind: ChangeKind::Created
            },
        ]
    );
    let files = h.workspace.snapshot().await;
    assert!(files["src/lib.rs"].contains("42"));
}

#[tokio::test]
async fn ambiguous_edit_leaves_file_untouched() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"<write_file>{"path": "dup.txt", "content": "x = 1\nx = 1\n"}</write_file>"#,
        r#"<edit_file>{"path": "dup.txt", "edits": [{"old_string": "x = 1", "new_string": "x = 2"}]}</edit_file>"#,
        DONE,
    ]));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    h.orchestrator.run(&mut session).await.unwrap();

    let records = h.sink.records().await;
    assert!(!records[1].tool_results[0].success);
    assert_eq!(h.workspace.snapshot().await["dup.txt"], "x = 1\nx = 1\n");
}

// ── Corrective paths ─────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_twice_then_write_resets_mistakes() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "<write_file>{'path': 'a.txt', 'content': 'hi'}</write_file>",
        r#"<write_file>{"path": "a.txt", "content": "hi"}"#,
        r#"<write_file>{"path":"a.txt","content":"hi"}</write_file>"#,
        DONE,
    ]));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Completed);
    assert_eq!(
        h.workspace.snapshot().await.get("a.txt").map(String::as_str),
        Some("hi")
    );
    let records = h.sink.records().await;
    assert_eq!(
        outcomes(&records),
        vec![
            IterationOutcome::Corrected,
            IterationOutcome::Corrected,
            IterationOutcome::Executed,
            IterationOutcome::Completed,
        ]
    );
    let mistakes: Vec<u32> = records.iter().map(|r| r.consecutive_mistakes).collect();
    assert_eq!(mistakes, vec![1, 2, 0, 0]);
}

#[tokio::test]
async fn consecutive_mistakes_end_the_session() {
    let provider = Arc::new(ScriptedProvider::always(
        r#"<read_file>{"path": "README.md"</read_file>"#,
    ));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Error);
    assert_eq!(result.iterations, 3);
    assert_eq!(
        result.error_message.as_deref(),
        Some("too many consecutive mistakes (3)")
    );
}

#[tokio::test]
async fn unknown_tool_gets_a_correction_and_nothing_runs() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"<search>{"query": "answer"}</search><write_file>{"path": "x", "content": "y"}</write_file>"#,
        DONE,
    ]));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    h.orchestrator.run(&mut session).await.unwrap();

    assert!(!h.workspace.snapshot().await.contains_key("x"));
    let correction = &session.transcript()[3];
    assert_eq!(correction.role, Role::User);
    assert!(correction.content.contains("Unknown tool <search>"));
    assert!(correction.content.contains("Available tools:"));
}

#[tokio::test]
async fn narrative_reply_is_nudged() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "<thinking>Where is the function?</thinking> Let me think.",
        DONE,
    ]));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Completed);
    let transcript = session.transcript();
    assert_eq!(transcript[2].role, Role::Assistant);
    assert_eq!(transcript[3].content, prompt::NUDGE);
    let records = h.sink.records().await;
    assert_eq!(records[0].outcome, IterationOutcome::Narrative);
    assert_eq!(records[0].consecutive_mistakes, 0);
}

#[tokio::test]
async fn repeated_identical_calls_trigger_intervention() {
    let provider = Arc::new(ScriptedProvider::always(
        r#"<read_file>{"path": "README.md"}</read_file>"#,
    ));
    let h = harness(provider, OrchestratorConfig::default());
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    let records = h.sink.records().await;
    assert_eq!(
        outcomes(&records),
        vec![
            IterationOutcome::Executed,
            IterationOutcome::Executed,
            IterationOutcome::Executed,
            IterationOutcome::LoopIntervention,
            IterationOutcome::LoopIntervention,
            IterationOutcome::LoopIntervention,
        ]
    );
    assert!(records[3].tool_results.is_empty());
    assert_eq!(result.status, SessionStatus::Error);
    assert!(
        session
            .transcript()
            .iter()
            .any(|m| m.role == Role::User && m.content.starts_with("Loop detected:"))
    );
}

// ── Cancellation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn cancel_interrupts_model_call() {
    let h = harness(Arc::new(HangingProvider), OrchestratorConfig::default());
    let handle = h.orchestrator.cancel_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Error);
    assert_eq!(result.error_message.as_deref(), Some("cancelled"));
    assert_eq!(result.iterations, 1);
    assert_eq!(outcomes(&h.sink.records().await), vec![IterationOutcome::Cancelled]);
}

/// Approves writes and cancels the session while doing so.
struct CancellingGate {
    handle: CancelHandle,
}

#[async_trait::async_trait]
impl ApprovalGate for CancellingGate {
    async fn request_approval(&self, _kind: ApprovalKind, _target: &str, _proposed: &str) -> bool {
        self.handle.cancel();
        true
    }
}

#[tokio::test]
async fn cancel_stops_before_next_tool_call() {
    let handle = CancelHandle::new();
    let settings = ExecutorSettings {
        approve_writes: true,
        ..ExecutorSettings::default()
    };
    let provider = Arc::new(ScriptedProvider::always(concat!(
        r#"<write_file>{"path": "a.txt", "content": "a"}</write_file>"#,
        r#"<write_file>{"path": "b.txt", "content": "b"}</write_file>"#
    )));
    let gate: Arc<dyn ApprovalGate> = Arc::new(CancellingGate {
        handle: handle.clone(),
    });
    let mut h = harness_with(provider, OrchestratorConfig::default(), settings, Some(gate));
    h.orchestrator = h.orchestrator.with_cancel_handle(handle);
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Error);
    assert_eq!(result.error_message.as_deref(), Some("cancelled"));
    let files = h.workspace.snapshot().await;
    assert_eq!(files.get("a.txt").map(String::as_str), Some("a"));
    assert!(!files.contains_key("b.txt"));
    assert_eq!(result.file_changes.len(), 1);
}

// ── Streaming ────────────────────────────────────────────────────────────

#[tokio::test]
async fn streaming_stops_after_first_complete_call() {
    let provider = Arc::new(ChunkedProvider {
        inner: ScriptedProvider::new(&[
            concat!(
                "Checking. ",
                r#"<read_file>{"path": "README.md"}</read_file>"#,
                r#"<write_file>{"path": "late.txt", "content": "never"}</write_file>"#
            ),
            DONE,
        ]),
        chunk_chars: 5,
    });
    let config = OrchestratorConfig {
        stream_early_stop: true,
        ..OrchestratorConfig::default()
    };
    let h = harness(provider, config);
    let mut session = session();

    let result = h.orchestrator.run(&mut session).await.unwrap();

    assert_eq!(result.status, SessionStatus::Completed);
    assert!(!h.workspace.snapshot().await.contains_key("late.txt"));
    assert!(session.transcript()[2].content.ends_with("</read_file>"));
    let records = h.sink.records().await;
    assert_eq!(records[0].tool_calls.len(), 1);
}

// ── Hooks ────────────────────────────────────────────────────────────────

struct FailingSink;

#[async_trait::async_trait]
impl IterationSink for FailingSink {
    async fn record(&self, _record: &IterationRecord) -> steward_core::Result<()> {
        Err(steward_core::Error::Sink("disk full".into()))
    }
}

#[tokio::test]
async fn failing_sink_does_not_affect_the_run() {
    let workspace = Arc::new(InMemoryWorkspace::new());
    let executor = ToolExecutor::new(workspace, ExecutorSettings::default());
    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedProvider::always(DONE)),
        Arc::new(executor),
        OrchestratorConfig::default(),
    )
    .with_sink(Arc::new(FailingSink));
    let mut session = session();

    let result = orchestrator.run(&mut session).await.unwrap();
    assert_eq!(result.status, SessionStatus::Completed);
}

#[tokio::test]
async fn events_follow_the_session() {
    let bus = Arc::new(EventBus::new(64));
    let mut rx = bus.subscribe();
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"<read_file>{"path": "README.md"}</read_file>"#,
        DONE,
    ]));
    let mut h = harness(provider, OrchestratorConfig::default());
    h.orchestrator = h.orchestrator.with_event_bus(bus);
    let mut session = session();

    h.orchestrator.run(&mut session).await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(match event.as_ref() {
            DomainEvent::SessionStarted { .. } => "started",
            DomainEvent::IterationStarted { .. } => "iteration",
            DomainEvent::ToolExecuted { .. } => "tool",
            DomainEvent::CorrectionIssued { .. } => "correction",
            DomainEvent::LoopDetected { .. } => "loop",
            DomainEvent::SessionEnded { status, .. } => {
                assert_eq!(*status, SessionStatus::Completed);
                "ended"
            }
        });
    }
    assert_eq!(
        kinds,
        vec!["started", "iteration", "tool", "iteration", "tool", "ended"]
    );
}

#[tokio::test]
async fn transcript_starts_with_system_prompt_and_goal() {
    let h = harness(
        Arc::new(ScriptedProvider::always(DONE)),
        OrchestratorConfig::default(),
    );
    let mut session = session();

    h.orchestrator.run(&mut session).await.unwrap();

    let transcript = session.transcript();
    assert_eq!(transcript[0].role, Role::System);
    assert!(transcript[0].content.contains("attempt_completion"));
    assert_eq!(transcript[1].role, Role::User);
    assert_eq!(transcript[1].content, "Fix the answer function");
    assert_eq!(transcript[2].role, Role::Assistant);
    assert_eq!(transcript[3].role, Role::User);
    assert!(transcript[3].content.starts_with("Tool results:"));
}
