pub mod driver;
mod engine;
mod traits;

pub use driver::{TickerHandle, TimerDriver};
pub use engine::{BreakKind, Phase, PomodoroTimer, StopOutcome, TimerOptions};
pub use traits::{AutoConfirm, Confirm, LogNotifier, Notice, Notifier, SessionStore, SoundCue};
