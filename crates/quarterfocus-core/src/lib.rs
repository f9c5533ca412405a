//! # QuarterFocus Core Library
//!
//! Core business logic behind the QuarterFocus Pomodoro timer and task list.
//! The CLI binary and any GUI shell are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Task info codec**: pure mapping between a task's free-text `info`
//!   field and its notes plus checkbox subtasks
//! - **Timer engine**: a tick-driven work/break state machine that accounts
//!   each focus interval as a session
//! - **Preferences**: local TOML cache merged with the authoritative store
//! - **Storage**: SQLite sessions/settings and the TOML configuration
//!
//! ## Key Components
//!
//! - [`PomodoroTimer`]: Core timer state machine
//! - [`TimerDriver`]: Runs a timer once per second on tokio
//! - [`task_info::decode`] / [`task_info::encode`]: Task info codec
//! - [`PreferenceLoader`]: Resolves effective timer preferences
//! - [`Database`]: Session persistence and statistics

pub mod error;
pub mod events;
pub mod preferences;
pub mod session;
pub mod stats;
pub mod storage;
pub mod task_info;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use preferences::{PreferenceLoader, PreferenceSource, TimerPreferences};
pub use session::SessionRecord;
pub use stats::TodayStats;
pub use storage::{Config, Database, LocalPreferences};
pub use task_info::{Subtask, TaskInfoDocument};
pub use timer::{
    BreakKind, Phase, PomodoroTimer, SessionStore, StopOutcome, TimerDriver, TimerOptions,
};
