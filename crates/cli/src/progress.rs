//! Progress lines printed from domain events.

use std::sync::Arc;
use steward_core::event::DomainEvent;
use tokio::sync::broadcast::{Receiver, error::RecvError};

/// One line for events worth showing, `None` for the rest.
pub fn describe(event: &DomainEvent) -> Option<String> {
    match event {
        DomainEvent::SessionStarted { goal, .. } => Some(format!("  ▶ Goal: {goal}")),
        DomainEvent::IterationStarted { iteration, .. } => {
            Some(format!("  · Iteration {iteration}"))
        }
        DomainEvent::ToolExecuted {
            tool,
            success,
            duration_ms,
            ..
        } => {
            let mark = if *success { "✓" } else { "✗" };
            Some(format!("    {mark} {tool} ({duration_ms} ms)"))
        }
        DomainEvent::CorrectionIssued {
            consecutive_mistakes,
            ..
        } => Some(format!(
            "    ! Invalid tool call, asked the model to retry ({consecutive_mistakes} in a row)"
        )),
        DomainEvent::LoopDetected { reason, .. } => Some(format!("    ! Loop detected: {reason}")),
        DomainEvent::SessionEnded { .. } => None,
    }
}

/// Print events to stderr until the bus closes.
pub async fn print_events(mut rx: Receiver<Arc<DomainEvent>>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = describe(&event) {
                    eprintln!("{line}");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                eprintln!("    ({skipped} progress events skipped)");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
