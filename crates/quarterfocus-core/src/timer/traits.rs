//! Collaborators the timer engine talks to.
//!
//! The engine owns boxed trait objects so a host can plug in the SQLite
//! store, a desktop notifier or an interactive prompt, and tests can plug in
//! in-memory fakes.

use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::SessionRecord;

/// Persistence for focus-session accounting.
pub trait SessionStore {
    /// Open a session for `task_id` planned to last `planned_minutes`.
    fn open_session(&self, task_id: &str, planned_minutes: u32) -> Result<SessionRecord>;

    /// Complete an open session.
    ///
    /// Returns `Ok(false)` when the session was already completed. That is
    /// not an error.
    fn complete_session(&self, id: &str, actual_minutes: u32) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    FocusDone,
    BreakDone,
}

/// A user-visible notice (toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

pub trait Notifier {
    fn notify(&self, notice: &Notice);
    fn play_sound(&self, cue: SoundCue);
}

/// Synchronous yes/no prompt.
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

/// Writes notices to the log. Used when the host provides no notifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        info!("{}: {}", notice.title, notice.message);
    }

    fn play_sound(&self, cue: SoundCue) {
        info!("sound cue: {cue:?}");
    }
}

/// Answers every prompt with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Default for AutoConfirm {
    fn default() -> Self {
        AutoConfirm(true)
    }
}

impl Confirm for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn open_session(&self, task_id: &str, planned_minutes: u32) -> Result<SessionRecord> {
        (**self).open_session(task_id, planned_minutes)
    }

    fn complete_session(&self, id: &str, actual_minutes: u32) -> Result<bool> {
        (**self).complete_session(id, actual_minutes)
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }

    fn play_sound(&self, cue: SoundCue) {
        (**self).play_sound(cue)
    }
}

impl<T: Confirm + ?Sized> Confirm for Arc<T> {
    fn confirm(&self, message: &str) -> bool {
        (**self).confirm(message)
    }
}
