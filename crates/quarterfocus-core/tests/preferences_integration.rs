//! Integration tests for preference resolution across the TOML cache and
//! the settings table.

use quarterfocus_core::{
    Config, Database, LocalPreferences, PomodoroTimer, PreferenceLoader, PreferenceSource,
    TimerOptions, TimerPreferences,
};

#[test]
fn test_remote_preferences_overwrite_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let local = LocalPreferences::new(&config_path);
    local.store(&TimerPreferences::new(25, 5)).unwrap();

    let db = Database::open_memory().unwrap();
    db.store(&TimerPreferences::new(50, 10)).unwrap();

    let prefs = PreferenceLoader::new(&local, &db).load();
    assert_eq!(prefs, TimerPreferences::new(50, 10));

    let cached = Config::load_from(&config_path).unwrap();
    assert_eq!(cached.timer, TimerPreferences::new(50, 10));
}

#[test]
fn test_cache_seeds_empty_settings_table() {
    let dir = tempfile::tempdir().unwrap();
    let local = LocalPreferences::new(dir.path().join("config.toml"));
    local.store(&TimerPreferences::new(30, 6)).unwrap();
    let db = Database::open_memory().unwrap();

    let prefs = PreferenceLoader::new(&local, &db).load();

    assert_eq!(prefs, TimerPreferences::new(30, 6));
    assert_eq!(
        PreferenceSource::load(&db).unwrap(),
        Some(TimerPreferences::new(30, 6))
    );
}

#[test]
fn test_loaded_preferences_drive_timer_length() {
    let dir = tempfile::tempdir().unwrap();
    let local = LocalPreferences::new(dir.path().join("config.toml"));
    let db = Database::open_memory().unwrap();
    let loader = PreferenceLoader::new(&local, &db);
    loader.save(&TimerPreferences::new(45, 15)).unwrap();

    let timer = PomodoroTimer::new(
        TimerOptions::default().with_preferences(loader.load()),
        Database::open_memory().unwrap(),
    );
    assert_eq!(timer.formatted_remaining(), "45:00");
}
