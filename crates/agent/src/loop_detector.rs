//! Loop detector: flags unproductive repetition inside a sliding time window.
//!
//! Two rules, checked per call in the order the calls arrive:
//!
//! 1. The same tool name seen more than `max_same_tool` times.
//! 2. The same (tool, canonical input) pair seen at least
//!    `max_identical_calls` times.
//!
//! The detector only reports. Intervening is the orchestrator's job.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use steward_core::tool::{ToolCall, ToolName};

#[derive(Debug, Clone)]
pub struct LoopDetectorConfig {
    pub enabled: bool,
    pub window: Duration,
    pub max_same_tool: usize,
    pub max_identical_calls: usize,
}

impl Default for LoopDetectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: Duration::minutes(10),
            max_same_tool: 15,
            max_identical_calls: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoopSignal {
    pub is_loop: bool,
    pub reason: String,
}

impl LoopSignal {
    pub fn none() -> Self {
        Self::default()
    }

    fn detected(reason: String) -> Self {
        Self {
            is_loop: true,
            reason,
        }
    }
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    tool: ToolName,
    input: String,
    at: DateTime<Utc>,
    iteration: u32,
}

#[derive(Debug, Clone, Copy)]
struct ToolCount {
    count: usize,
    last_seen: DateTime<Utc>,
}

/// Per-session repetition tracker.
#[derive(Debug, Default)]
pub struct LoopDetector {
    config: LoopDetectorConfig,
    counts: HashMap<ToolName, ToolCount>,
    history: VecDeque<HistoryEntry>,
}

impl LoopDetector {
    pub fn new(config: LoopDetectorConfig) -> Self {
        Self {
            config,
            counts: HashMap::new(),
            history: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &LoopDetectorConfig {
        &self.config
    }

    /// Number of calls currently inside the window.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn observe(&mut self, calls: &[ToolCall], iteration: u32) -> LoopSignal {
        self.observe_at(calls, iteration, Utc::now())
    }

    /// Record `calls` as made at `now` and check both rules.
    ///
    /// Stops at the first call that trips a rule; later calls in the batch
    /// are not recorded since they will not run.
    pub fn observe_at(
        &mut self,
        calls: &[ToolCall],
        iteration: u32,
        now: DateTime<Utc>,
    ) -> LoopSignal {
        if !self.config.enabled {
            return LoopSignal::none();
        }
        self.evict(now);

        let mut signal = LoopSignal::none();
        for call in calls {
            let input = call.canonical_input();
            let entry = self.counts.entry(call.name).or_insert(ToolCount {
                count: 0,
                last_seen: now,
            });
            entry.count += 1;
            entry.last_seen = now;
            let by_name = entry.count;

            self.history.push_back(HistoryEntry {
                tool: call.name,
                input: input.clone(),
                at: now,
                iteration,
            });

            if by_name > self.config.max_same_tool {
                signal = LoopSignal::detected(format!(
                    "Tool '{}' was called {} times in the last {} minutes",
                    call.name,
                    by_name,
                    self.config.window.num_minutes()
                ));
                break;
            }

            let mut matches = self
                .history
                .iter()
                .filter(|h| h.tool == call.name && h.input == input);
            let first_iteration = matches.next().map_or(iteration, |h| h.iteration);
            let identical = 1 + matches.count();
            if identical >= self.config.max_identical_calls {
                signal = LoopSignal::detected(format!(
                    "Identical call to '{}' repeated {} times with the same input since iteration {}",
                    call.name, identical, first_iteration
                ));
                break;
            }
        }

        if signal.is_loop {
            debug!(iteration, reason = %signal.reason, "Loop detected");
        }
        self.evict(now);
        signal
    }

    /// Drop history entries older than the window and the counts they
    /// contributed.
    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.config.window;
        while let Some(front) = self.history.front() {
            if front.at >= cutoff {
                break;
            }
            if let Some(count) = self.counts.get_mut(&front.tool) {
                count.count = count.count.saturating_sub(1);
            }
            self.history.pop_front();
        }
        self.counts.retain(|_, c| c.count > 0 && c.last_seen >= cutoff);
    }
}
