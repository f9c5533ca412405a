mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, LocalPreferences, NotificationsConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/quarterfocus[-dev]/`, creating it if needed.
///
/// Set QUARTERFOCUS_ENV=dev to use the development data directory, or
/// QUARTERFOCUS_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("QUARTERFOCUS_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("QUARTERFOCUS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("quarterfocus-dev")
            } else {
                base_dir.join("quarterfocus")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| {
        ConfigError::NoDataDir(format!("{}: {e}", dir.display()))
    })?;
    Ok(dir)
}
