//! Pomodoro timer engine.
//!
//! A single-owner state machine cycling between work and break intervals.
//! It has no internal thread: the caller invokes `tick()` once per elapsed
//! second (see [`super::driver::TimerDriver`] for a tokio-based driver).
//!
//! ## Transitions
//!
//! ```text
//! Work --(expires)--> Break (auto-starts)
//! Break --(expires)--> Work (waits for play)
//! any --(stop/reset)--> Work (idle, full length)
//! ```
//!
//! Every work interval bound to a task is accounted as a session through the
//! [`SessionStore`]. Store failures are logged and swallowed: the countdown
//! never blocks on persistence.

use chrono::Utc;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use super::traits::{AutoConfirm, Confirm, LogNotifier, Notice, Notifier, SessionStore, SoundCue};
use crate::events::Event;
use crate::preferences::TimerPreferences;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Short,
    Long,
}

/// How far a stopped interval had progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    NotStarted,
    Early,
    Full,
}

/// Construction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerOptions {
    pub preferences: TimerPreferences,
    pub task_id: Option<String>,
    pub auto_start: bool,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            preferences: TimerPreferences::new(50, 10),
            task_id: None,
            auto_start: false,
        }
    }
}

impl TimerOptions {
    pub fn new(focus_minutes: u32, break_minutes: u32) -> Self {
        Self {
            preferences: TimerPreferences::new(focus_minutes, break_minutes),
            ..Self::default()
        }
    }

    pub fn with_preferences(mut self, preferences: TimerPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }
}

/// Core timer engine.
pub struct PomodoroTimer {
    prefs: TimerPreferences,
    task_id: Option<String>,
    phase: Phase,
    /// Only meaningful while `phase == Break`.
    break_kind: BreakKind,
    remaining_secs: u64,
    running: bool,
    session_id: Option<String>,
    completed_focus_count: u32,
    sessions: Box<dyn SessionStore + Send>,
    notifier: Box<dyn Notifier + Send>,
    confirm: Box<dyn Confirm + Send>,
}

impl std::fmt::Debug for PomodoroTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PomodoroTimer")
            .field("prefs", &self.prefs)
            .field("task_id", &self.task_id)
            .field("phase", &self.phase)
            .field("break_kind", &self.break_kind)
            .field("remaining_secs", &self.remaining_secs)
            .field("running", &self.running)
            .field("session_id", &self.session_id)
            .field("completed_focus_count", &self.completed_focus_count)
            .finish_non_exhaustive()
    }
}

impl PomodoroTimer {
    /// Create a timer in the work phase with the full focus length loaded.
    ///
    /// With `auto_start` the timer is already running and, when bound to a
    /// task, a session is opened immediately.
    pub fn new(options: TimerOptions, sessions: impl SessionStore + Send + 'static) -> Self {
        let mut timer = Self {
            prefs: options.preferences,
            task_id: options.task_id,
            phase: Phase::Work,
            break_kind: BreakKind::Short,
            remaining_secs: minutes_to_secs(options.preferences.focus_minutes),
            running: options.auto_start,
            session_id: None,
            completed_focus_count: 0,
            sessions: Box::new(sessions),
            notifier: Box::new(LogNotifier),
            confirm: Box::new(AutoConfirm::default()),
        };
        if timer.running {
            timer.open_session();
        }
        timer
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + Send + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_confirm(mut self, confirm: impl Confirm + Send + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `None` during work.
    pub fn break_kind(&self) -> Option<BreakKind> {
        match self.phase {
            Phase::Work => None,
            Phase::Break => Some(self.break_kind),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn preferences(&self) -> &TimerPreferences {
        &self.prefs
    }

    /// Work intervals that ran to completion since construction.
    pub fn completed_focus_count(&self) -> u32 {
        self.completed_focus_count
    }

    /// Planned length of the current interval in minutes.
    pub fn planned_minutes(&self) -> u32 {
        match self.phase {
            Phase::Work => self.prefs.focus_minutes,
            Phase::Break => match self.break_kind {
                BreakKind::Short => self.prefs.short_break_minutes,
                BreakKind::Long => self.prefs.long_break_minutes,
            },
        }
    }

    pub fn planned_secs(&self) -> u64 {
        minutes_to_secs(self.planned_minutes())
    }

    /// Remaining share of the interval, 100.0 when fresh and 0.0 when expired.
    pub fn progress_pct(&self) -> f64 {
        let planned = self.planned_secs();
        if planned == 0 {
            return 0.0;
        }
        (self.remaining_secs as f64 / planned as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Remaining time as `mm:ss`.
    pub fn formatted_remaining(&self) -> String {
        format_mm_ss(self.remaining_secs)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            break_kind: self.break_kind(),
            running: self.running,
            remaining_secs: self.remaining_secs,
            total_secs: self.planned_secs(),
            remaining_label: self.formatted_remaining(),
            progress_pct: self.progress_pct(),
            task_id: self.task_id.clone(),
            session_id: self.session_id.clone(),
            completed_focus_count: self.completed_focus_count,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the countdown. Returns `None` if it is already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        if self.phase == Phase::Work && self.session_id.is_none() {
            self.open_session();
        }
        self.running = true;
        Some(self.started_event())
    }

    /// Play/pause.
    pub fn toggle(&mut self) -> Event {
        if self.running {
            self.running = false;
            return Event::TimerPaused {
                phase: self.phase,
                remaining_secs: self.remaining_secs,
                at: Utc::now(),
            };
        }
        if self.phase == Phase::Work && self.session_id.is_none() {
            self.open_session();
        }
        self.running = true;
        self.started_event()
    }

    /// Advance by one second. Returns the events of a phase transition when
    /// the countdown reaches zero, and nothing otherwise.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return self.complete_interval();
        }
        Vec::new()
    }

    /// Back to an idle work interval. An open session is dropped without
    /// being completed; its id is reported in the event.
    pub fn reset(&mut self) -> Event {
        let abandoned = self.session_id.take();
        if let Some(id) = &abandoned {
            info!("reset abandoned open session {id}");
        }
        self.go_idle();
        Event::TimerReset {
            abandoned_session: abandoned,
            at: Utc::now(),
        }
    }

    /// User-initiated early stop.
    ///
    /// Returns `None` when there is nothing to stop (idle with no elapsed
    /// time) or when the confirmation prompt is declined.
    pub fn stop(&mut self) -> Option<Event> {
        let planned = self.planned_secs();
        if !self.running && self.remaining_secs == planned {
            return None;
        }

        let elapsed = planned.saturating_sub(self.remaining_secs);
        let actual_minutes = elapsed.div_ceil(60) as u32;
        let prompt = match self.phase {
            Phase::Work => format!(
                "Stop the timer? {} of focus will be recorded.",
                minutes_label(actual_minutes)
            ),
            Phase::Break => format!(
                "End the break after {}?",
                minutes_label(actual_minutes)
            ),
        };
        if !self.confirm.confirm(&prompt) {
            debug!("stop declined");
            return None;
        }

        let outcome = if elapsed == 0 {
            StopOutcome::NotStarted
        } else if actual_minutes < self.planned_minutes() {
            StopOutcome::Early
        } else {
            StopOutcome::Full
        };
        let phase = self.phase;
        let session_id = self.close_session(actual_minutes);
        self.go_idle();
        self.notifier.notify(&stop_notice(phase, outcome, actual_minutes));

        Some(Event::TimerStopped {
            actual_minutes,
            outcome,
            session_id,
            at: Utc::now(),
        })
    }

    /// Replace preferences. An idle timer is rescaled to the new length of
    /// its current phase; a running countdown keeps its remaining time until
    /// the interval ends. Returns whether the remaining time was rescaled.
    pub fn update_preferences(&mut self, prefs: TimerPreferences) -> bool {
        self.prefs = prefs;
        if self.running {
            debug!("preferences updated while running; countdown left untouched");
            return false;
        }
        self.remaining_secs = self.planned_secs();
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_interval(&mut self) -> Vec<Event> {
        let completed_phase = self.phase;
        let planned_minutes = self.planned_minutes();
        let session_id = self.close_session(planned_minutes);

        let mut events = vec![Event::IntervalCompleted {
            phase: completed_phase,
            planned_minutes,
            session_id,
            at: Utc::now(),
        }];

        self.running = false;
        match completed_phase {
            Phase::Work => {
                self.completed_focus_count += 1;
                let every = self.prefs.pomodoros_until_long_break;
                self.break_kind = if every > 0 && self.completed_focus_count % every == 0 {
                    BreakKind::Long
                } else {
                    BreakKind::Short
                };
                self.phase = Phase::Break;
                self.remaining_secs = self.planned_secs();
                self.running = true;
                info!(
                    "focus interval complete, {:?} break of {} started",
                    self.break_kind,
                    minutes_label(self.planned_minutes())
                );
                self.notifier.notify(&Notice::new(
                    "Focus session complete!",
                    format!(
                        "Break started: enjoy {}.",
                        minutes_label(self.planned_minutes())
                    ),
                ));
                self.notifier.play_sound(SoundCue::FocusDone);
            }
            Phase::Break => {
                self.phase = Phase::Work;
                self.remaining_secs = self.planned_secs();
                info!("break complete, waiting for the next focus interval");
                self.notifier.notify(&Notice::new(
                    "Break complete!",
                    "Click play to continue.",
                ));
                self.notifier.play_sound(SoundCue::BreakDone);
            }
        }

        events.push(Event::PhaseChanged {
            phase: self.phase,
            break_kind: self.break_kind(),
            remaining_secs: self.remaining_secs,
            running: self.running,
            at: Utc::now(),
        });
        events
    }

    fn go_idle(&mut self) {
        self.running = false;
        self.phase = Phase::Work;
        self.break_kind = BreakKind::Short;
        self.remaining_secs = self.planned_secs();
    }

    fn started_event(&self) -> Event {
        if self.remaining_secs == self.planned_secs() {
            Event::TimerStarted {
                phase: self.phase,
                remaining_secs: self.remaining_secs,
                session_id: self.session_id.clone(),
                at: Utc::now(),
            }
        } else {
            Event::TimerResumed {
                phase: self.phase,
                remaining_secs: self.remaining_secs,
                at: Utc::now(),
            }
        }
    }

    fn open_session(&mut self) {
        let Some(task_id) = self.task_id.as_deref() else {
            return;
        };
        match self.sessions.open_session(task_id, self.prefs.focus_minutes) {
            Ok(record) => {
                debug!("opened session {} for task {task_id}", record.id);
                self.session_id = Some(record.id);
            }
            Err(e) => error!("failed to open pomodoro session for task {task_id}: {e}"),
        }
    }

    /// Completes and clears the open session, returning its id.
    fn close_session(&mut self, actual_minutes: u32) -> Option<String> {
        let id = self.session_id.take()?;
        match self.sessions.complete_session(&id, actual_minutes) {
            Ok(true) => debug!("completed session {id} with {actual_minutes} min"),
            Ok(false) => debug!("session {id} was already completed"),
            Err(e) => error!("failed to complete pomodoro session {id}: {e}"),
        }
        Some(id)
    }
}

fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes).saturating_mul(60)
}

fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn minutes_label(minutes: u32) -> String {
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    }
}

fn stop_notice(phase: Phase, outcome: StopOutcome, actual_minutes: u32) -> Notice {
    let minutes = minutes_label(actual_minutes);
    match (phase, outcome) {
        (Phase::Work, StopOutcome::NotStarted) => Notice::new(
            "Timer stopped",
            "The session was stopped before it started.",
        ),
        (Phase::Work, StopOutcome::Early) => {
            Notice::new("Timer stopped", format!("Session stopped after {minutes}."))
        }
        (Phase::Work, StopOutcome::Full) => {
            Notice::new("Timer stopped", format!("Full session of {minutes} completed."))
        }
        (Phase::Break, StopOutcome::NotStarted) => {
            Notice::new("Break skipped", "The break was skipped.")
        }
        (Phase::Break, StopOutcome::Early) => {
            Notice::new("Break ended", format!("Break ended after {minutes}."))
        }
        (Phase::Break, StopOutcome::Full) => {
            Notice::new("Break ended", format!("Full break of {minutes} taken."))
        }
    }
}
