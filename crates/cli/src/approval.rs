//! Interactive approval on the terminal.

use async_trait::async_trait;
use std::io::Write;
use steward_core::approval::{ApprovalGate, ApprovalKind};

const PREVIEW_LINES: usize = 20;

/// Asks on stdin before each mutating tool call. Anything but `y`/`yes` denies.
pub struct ConsoleApproval;

fn preview(text: &str, max_lines: usize) -> String {
    let total = text.lines().count();
    let mut out: Vec<String> = text
        .lines()
        .take(max_lines)
        .map(|line| format!("    | {line}"))
        .collect();
    if total > max_lines {
        out.push(format!("    | ... {} more lines", total - max_lines));
    }
    out.join("\n")
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl ApprovalGate for ConsoleApproval {
    async fn request_approval(
        &self,
        kind: ApprovalKind,
        target: &str,
        proposed_change: &str,
    ) -> bool {
        let prompt = format!(
            "\n  {} {}\n{}\n  Approve? [y/N] ",
            kind.as_str(),
            target,
            preview(proposed_change, PREVIEW_LINES)
        );

        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{prompt}");
            let _ = stderr.flush();
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            _ => false,
        }
    }
}
