//! Session: one end-to-end run of the orchestration loop.
//!
//! A session starts `Active` and moves exactly once to one of the terminal
//! states `Completed`, `Error` or `Timeout`. Every mutator checks the state
//! first, so a terminal session is effectively immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::message::Message;
use crate::tool::{ChangeKind, FileChange};

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Error,
    Timeout,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
            SessionStatus::Timeout => "timeout",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    /// Only `Active` may move, and only to a terminal state.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(self, SessionStatus::Active) && next.is_terminal()
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the orchestrator hands back once a session is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: SessionId,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub file_changes: Vec<FileChange>,
    pub iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    owner: String,
    goal: String,
    status: SessionStatus,
    iteration: u32,
    transcript: Vec<Message>,
    file_changes: Vec<FileChange>,
    started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completion_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl Session {
    /// Create a new active session with an empty transcript.
    pub fn new(owner: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            owner: owner.into(),
            goal: goal.into(),
            status: SessionStatus::Active,
            iteration: 0,
            transcript: Vec::new(),
            file_changes: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
            completion_summary: None,
            error_message: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn file_changes(&self) -> &[FileChange] {
        &self.file_changes
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn completion_summary(&self) -> Option<&str> {
        self.completion_summary.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Wall-clock time since the session started.
    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.started_at
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SessionError::NotActive(self.id.to_string()))
        }
    }

    /// Advance the iteration counter. Refuses to pass `max_iterations`.
    pub fn begin_iteration(&mut self, max_iterations: u32) -> Result<u32, SessionError> {
        self.ensure_active()?;
        if self.iteration >= max_iterations {
            return Err(SessionError::InvalidTransition {
                from: format!("iteration {}", self.iteration),
                to: format!("iteration {} (max {max_iterations})", self.iteration + 1),
            });
        }
        self.iteration += 1;
        Ok(self.iteration)
    }

    /// Append to the transcript.
    pub fn push_message(&mut self, message: Message) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.transcript.push(message);
        Ok(())
    }

    /// Record a touched file. A file created earlier in the session stays
    /// `Created` even if it is modified afterwards.
    pub fn record_file_change(&mut self, change: FileChange) -> Result<(), SessionError> {
        self.ensure_active()?;
        match self.file_changes.iter_mut().find(|c| c.path == change.path) {
            Some(existing) => {
                if existing.kind != ChangeKind::Created {
                    existing.kind = change.kind;
                }
            }
            None => self.file_changes.push(change),
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionStatus) -> Result<(), SessionError> {
        if !self.status.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    /// `Active → Completed` with the completion summary.
    pub fn complete(&mut self, summary: impl Into<String>) -> Result<(), SessionError> {
        self.transition(SessionStatus::Completed)?;
        self.completion_summary = Some(summary.into());
        Ok(())
    }

    /// `Active → Error` with an error message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        self.transition(SessionStatus::Error)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// `Active → Timeout` with an error message.
    pub fn time_out(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        self.transition(SessionStatus::Timeout)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Snapshot for the caller.
    pub fn result(&self) -> SessionResult {
        SessionResult {
            session_id: self.id.clone(),
            status: self.status,
            completion_summary: self.completion_summary.clone(),
            error_message: self.error_message.clone(),
            file_changes: self.file_changes.clone(),
            iterations: self.iteration,
        }
    }
}
