//! Timer preferences and the loader that merges their two sources.
//!
//! The local source is a fast cache (the TOML config); the remote source is
//! authoritative (the `user_settings` table). When both hold preferences the
//! remote copy wins and is mirrored back into the cache. When only the cache
//! has them they are pushed to the remote store.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerPreferences {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_pomodoros_until_long_break")]
    pub pomodoros_until_long_break: u32,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_pomodoros_until_long_break() -> u32 {
    4
}

impl Default for TimerPreferences {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            pomodoros_until_long_break: default_pomodoros_until_long_break(),
        }
    }
}

impl TimerPreferences {
    /// Focus and short break only; long break settings stay at their defaults.
    pub fn new(focus_minutes: u32, short_break_minutes: u32) -> Self {
        Self {
            focus_minutes,
            short_break_minutes,
            ..Self::default()
        }
    }

    /// Rejects zero-length intervals.
    ///
    /// `pomodoros_until_long_break == 0` is allowed and disables long breaks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("focus_minutes", self.focus_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
        ] {
            if value == 0 {
                return Err(ValidationError::InvalidDuration {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// A place timer preferences can be read from and written to.
pub trait PreferenceSource {
    /// `Ok(None)` when the source has never stored preferences.
    fn load(&self) -> Result<Option<TimerPreferences>>;
    fn store(&self, prefs: &TimerPreferences) -> Result<()>;
}

impl<T: PreferenceSource + ?Sized> PreferenceSource for &T {
    fn load(&self) -> Result<Option<TimerPreferences>> {
        (**self).load()
    }

    fn store(&self, prefs: &TimerPreferences) -> Result<()> {
        (**self).store(prefs)
    }
}

/// Merges a local cache with an authoritative remote store.
pub struct PreferenceLoader<L, R> {
    local: L,
    remote: R,
}

impl<L: PreferenceSource, R: PreferenceSource> PreferenceLoader<L, R> {
    pub fn new(local: L, remote: R) -> Self {
        Self { local, remote }
    }

    /// Resolve the effective preferences. Never fails: a failing source is
    /// logged and treated as empty, and defaults apply when both are empty.
    pub fn load(&self) -> TimerPreferences {
        let local = self.local.load().unwrap_or_else(|e| {
            warn!("failed to read local preferences: {e}");
            None
        });
        let remote = self.remote.load().unwrap_or_else(|e| {
            warn!("failed to read remote preferences: {e}");
            None
        });

        match (remote, local) {
            (Some(remote), local) => {
                debug!("using remote timer preferences");
                if local != Some(remote) {
                    if let Err(e) = self.local.store(&remote) {
                        warn!("failed to mirror preferences into local cache: {e}");
                    }
                }
                remote
            }
            (None, Some(local)) => {
                debug!("using cached timer preferences");
                if let Err(e) = self.remote.store(&local) {
                    warn!("failed to push cached preferences to remote store: {e}");
                }
                local
            }
            (None, None) => TimerPreferences::default(),
        }
    }

    /// Validate and persist, local cache first.
    pub fn save(&self, prefs: &TimerPreferences) -> Result<()> {
        prefs.validate()?;
        self.local.store(prefs)?;
        self.remote.store(prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct MemorySource {
        value: RefCell<Option<TimerPreferences>>,
        fail: bool,
        writes: Cell<u32>,
    }

    impl MemorySource {
        fn with(prefs: TimerPreferences) -> Self {
            Self {
                value: RefCell::new(Some(prefs)),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl PreferenceSource for MemorySource {
        fn load(&self) -> Result<Option<TimerPreferences>> {
            if self.fail {
                return Err(CoreError::Custom("offline".into()));
            }
            Ok(*self.value.borrow())
        }

        fn store(&self, prefs: &TimerPreferences) -> Result<()> {
            if self.fail {
                return Err(CoreError::Custom("offline".into()));
            }
            self.writes.set(self.writes.get() + 1);
            *self.value.borrow_mut() = Some(*prefs);
            Ok(())
        }
    }

    #[test]
    fn remote_wins_and_is_mirrored_locally() {
        let local = MemorySource::with(TimerPreferences::new(25, 5));
        let remote = MemorySource::with(TimerPreferences::new(50, 10));
        let loader = PreferenceLoader::new(&local, &remote);

        assert_eq!(loader.load(), TimerPreferences::new(50, 10));
        assert_eq!(*local.value.borrow(), Some(TimerPreferences::new(50, 10)));
        assert_eq!(remote.writes.get(), 0);
    }

    #[test]
    fn local_is_used_and_pushed_when_remote_is_empty() {
        let local = MemorySource::with(TimerPreferences::new(30, 6));
        let remote = MemorySource::default();
        let loader = PreferenceLoader::new(&local, &remote);

        assert_eq!(loader.load(), TimerPreferences::new(30, 6));
        assert_eq!(*remote.value.borrow(), Some(TimerPreferences::new(30, 6)));
    }

    #[test]
    fn failing_remote_falls_back_to_local() {
        let local = MemorySource::with(TimerPreferences::new(40, 8));
        let remote = MemorySource::failing();
        let loader = PreferenceLoader::new(&local, &remote);

        assert_eq!(loader.load(), TimerPreferences::new(40, 8));
    }

    #[test]
    fn defaults_when_nothing_stored() {
        let loader = PreferenceLoader::new(MemorySource::default(), MemorySource::failing());
        assert_eq!(loader.load(), TimerPreferences::default());
    }

    #[test]
    fn save_rejects_zero_focus() {
        let loader = PreferenceLoader::new(MemorySource::default(), MemorySource::default());
        let err = loader.save(&TimerPreferences::new(0, 5)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn save_writes_both_sources() {
        let local = MemorySource::default();
        let remote = MemorySource::default();
        PreferenceLoader::new(&local, &remote)
            .save(&TimerPreferences::new(45, 15))
            .unwrap();
        assert_eq!(local.writes.get(), 1);
        assert_eq!(remote.writes.get(), 1);
    }
}
