//! Once-per-second driver for [`PomodoroTimer`] on the tokio runtime.
//!
//! The driver owns the engine behind a mutex, ticks it on a one-second
//! interval and forwards the produced events over a channel. Preference
//! changes arrive on a `watch` channel and are applied between ticks, so the
//! running check in `update_preferences` always sees a settled state.
//!
//! Cancelling or dropping the [`TickerHandle`] stops the loop. A liveness
//! flag is checked before any result is applied, so a tick or preference
//! change that races with cancellation is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::engine::PomodoroTimer;
use crate::events::Event;
use crate::preferences::TimerPreferences;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct TimerDriver {
    timer: Arc<Mutex<PomodoroTimer>>,
}

/// Cancellation token for a running tick loop. Dropping it cancels the loop.
pub struct TickerHandle {
    alive: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TickerHandle {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && !self.task.is_finished()
    }

    pub fn cancel(&self) {
        self.alive.store(false, Ordering::Release);
        self.task.abort();
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl TimerDriver {
    pub fn new(timer: PomodoroTimer) -> Self {
        Self {
            timer: Arc::new(Mutex::new(timer)),
        }
    }

    /// Shared handle for issuing commands (toggle, stop, reset) while the
    /// loop runs.
    pub fn timer(&self) -> Arc<Mutex<PomodoroTimer>> {
        Arc::clone(&self.timer)
    }

    /// Spawn the tick loop. Must be called from within a tokio runtime.
    pub fn spawn(
        &self,
        preferences: Option<watch::Receiver<TimerPreferences>>,
    ) -> (TickerHandle, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let alive = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.timer),
            preferences,
            tx,
            Arc::clone(&alive),
        ));
        (TickerHandle { alive, task }, rx)
    }
}

async fn run_loop(
    timer: Arc<Mutex<PomodoroTimer>>,
    mut preferences: Option<watch::Receiver<TimerPreferences>>,
    tx: mpsc::UnboundedSender<Event>,
    alive: Arc<AtomicBool>,
) {
    let mut interval = time::interval_at(time::Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let mut preferences_closed = false;
        tokio::select! {
            _ = interval.tick() => {
                if !alive.load(Ordering::Acquire) {
                    break;
                }
                let events = timer.lock().await.tick();
                for event in events {
                    if tx.send(event).is_err() {
                        debug!("event receiver dropped; stopping tick loop");
                        return;
                    }
                }
            }
            update = next_preferences(&mut preferences) => match update {
                Some(prefs) => {
                    if !alive.load(Ordering::Acquire) {
                        break;
                    }
                    if let Err(e) = prefs.validate() {
                        warn!("ignoring invalid timer preferences: {e}");
                    } else {
                        timer.lock().await.update_preferences(prefs);
                    }
                }
                None => preferences_closed = true,
            },
        }
        if preferences_closed {
            preferences = None;
        }
    }
}

/// Resolves with the next preference value, `None` once the sender is gone,
/// and never when there is no channel.
async fn next_preferences(
    rx: &mut Option<watch::Receiver<TimerPreferences>>,
) -> Option<TimerPreferences> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::session::SessionRecord;
    use crate::timer::{Phase, SessionStore, TimerOptions};

    struct NoSessions;

    impl SessionStore for NoSessions {
        fn open_session(&self, _task_id: &str, _planned_minutes: u32) -> Result<SessionRecord> {
            unreachable!("no task bound")
        }

        fn complete_session(&self, _id: &str, _actual_minutes: u32) -> Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second() {
        let driver = TimerDriver::new(PomodoroTimer::new(
            TimerOptions::new(1, 1).auto_start(true),
            NoSessions,
        ));
        let (_handle, _events) = driver.spawn(None);

        time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(driver.timer().lock().await.remaining_secs(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_phase_transition_events() {
        let driver = TimerDriver::new(PomodoroTimer::new(
            TimerOptions::new(1, 1).auto_start(true),
            NoSessions,
        ));
        let (_handle, mut events) = driver.spawn(None);

        let first = events.recv().await.unwrap();
        assert!(matches!(
            first,
            Event::IntervalCompleted {
                phase: Phase::Work,
                ..
            }
        ));
        let second = events.recv().await.unwrap();
        assert!(matches!(
            second,
            Event::PhaseChanged {
                phase: Phase::Break,
                running: true,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_handle_stops_ticking() {
        let driver = TimerDriver::new(PomodoroTimer::new(
            TimerOptions::new(1, 1).auto_start(true),
            NoSessions,
        ));
        let (handle, _events) = driver.spawn(None);
        time::sleep(Duration::from_millis(5_500)).await;
        handle.cancel();
        time::sleep(Duration::from_secs(20)).await;

        assert_eq!(driver.timer().lock().await.remaining_secs(), 55);
        assert!(!handle.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn applies_preference_changes_only_when_idle() {
        let driver = TimerDriver::new(PomodoroTimer::new(TimerOptions::new(1, 1), NoSessions));
        let (prefs_tx, prefs_rx) = watch::channel(TimerPreferences::new(1, 1));
        let (_handle, _events) = driver.spawn(Some(prefs_rx));

        prefs_tx.send(TimerPreferences::new(3, 1)).unwrap();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(driver.timer().lock().await.remaining_secs(), 180);

        driver.timer().lock().await.start();
        time::sleep(Duration::from_millis(2_500)).await;
        prefs_tx.send(TimerPreferences::new(10, 1)).unwrap();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(driver.timer().lock().await.remaining_secs(), 178);
    }
}
