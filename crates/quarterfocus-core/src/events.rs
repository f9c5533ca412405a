use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{BreakKind, Phase, StopOutcome};

/// Every state change of the timer produces an Event.
/// Hosts react to `IntervalCompleted` and `TimerStopped` the way a UI
/// component reacts to its completion and stop callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        session_id: Option<String>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    IntervalCompleted {
        phase: Phase,
        planned_minutes: u32,
        session_id: Option<String>,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: Phase,
        break_kind: Option<BreakKind>,
        remaining_secs: u64,
        running: bool,
        at: DateTime<Utc>,
    },
    TimerReset {
        abandoned_session: Option<String>,
        at: DateTime<Utc>,
    },
    TimerStopped {
        actual_minutes: u32,
        outcome: StopOutcome,
        session_id: Option<String>,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        break_kind: Option<BreakKind>,
        running: bool,
        remaining_secs: u64,
        total_secs: u64,
        remaining_label: String,
        progress_pct: f64,
        task_id: Option<String>,
        session_id: Option<String>,
        completed_focus_count: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::IntervalCompleted { at, .. }
            | Event::PhaseChanged { at, .. }
            | Event::TimerReset { at, .. }
            | Event::TimerStopped { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}
