pub mod config;
pub mod info;
pub mod stats;
pub mod timer;

use quarterfocus_core::{Database, LocalPreferences, PreferenceLoader, TimerPreferences};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Effective timer preferences from config.toml and the settings table.
pub fn load_preferences(db: &Database) -> Result<TimerPreferences, Box<dyn std::error::Error>> {
    let local = LocalPreferences::default_location()?;
    Ok(PreferenceLoader::new(local, db).load())
}
