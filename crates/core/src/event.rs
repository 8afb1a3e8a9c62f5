//! Domain event system: progress notifications out of the orchestrator.
//!
//! Events are published as a session advances. Subscribers (the CLI progress
//! printer, tests) react without the orchestrator knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::session::SessionStatus;
use crate::tool::ToolName;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A session entered the loop
    SessionStarted {
        session_id: String,
        goal: String,
        timestamp: DateTime<Utc>,
    },

    /// An iteration began
    IterationStarted {
        session_id: String,
        iteration: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        session_id: String,
        tool: ToolName,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A corrective message was sent back to the model
    CorrectionIssued {
        session_id: String,
        iteration: u32,
        consecutive_mistakes: u32,
        timestamp: DateTime<Utc>,
    },

    /// The loop detector fired
    LoopDetected {
        session_id: String,
        iteration: u32,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The session reached a terminal state
    SessionEnded {
        session_id: String,
        status: SessionStatus,
        iterations: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ToolExecuted {
            session_id: "s-1".into(),
            tool: ToolName::ReadFile,
            success: true,
            duration_ms: 42,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolExecuted { tool, success, .. } => {
                assert_eq!(*tool, ToolName::ReadFile);
                assert!(success);
            }
            _ => panic!("Expected ToolExecuted event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::SessionEnded {
            session_id: "s-1".into(),
            status: SessionStatus::Completed,
            iterations: 1,
            timestamp: Utc::now(),
        });
    }
}
