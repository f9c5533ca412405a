//! SQLite-backed session and settings storage.
//!
//! Provides persistent storage for:
//! - Pomodoro sessions (open and completed)
//! - The authoritative copy of the user's timer preferences
//!
//! The connection sits behind a mutex so one `Database` can be shared
//! (`Arc<Database>`) between a running timer and the stats/preference code.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};
use crate::preferences::{PreferenceSource, TimerPreferences};
use crate::session::SessionRecord;
use crate::timer::SessionStore;

const PREFERENCES_KEY: &str = "timer_preferences";
const DB_FILE_NAME: &str = "quarterfocus.db";

const SESSION_COLUMNS: &str =
    "id, task_id, duration_minutes, started_at, completed_at, actual_duration_minutes";

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/quarterfocus/quarterfocus.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join(DB_FILE_NAME))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DatabaseError::Locked.into())
    }

    /// Insert a new open session and return it.
    pub fn create_session(
        &self,
        task_id: &str,
        planned_minutes: u32,
        started_at: DateTime<Utc>,
    ) -> Result<SessionRecord> {
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            planned_minutes,
            started_at,
            completed_at: None,
            actual_minutes: None,
        };
        self.conn()?.execute(
            "INSERT INTO pomodoro_sessions (id, task_id, duration_minutes, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.task_id,
                record.planned_minutes,
                record.started_at.to_rfc3339(),
            ],
        )?;
        Ok(record)
    }

    /// Complete an open session. Returns `false` when the session was
    /// already completed or does not exist.
    pub fn finish_session(
        &self,
        id: &str,
        actual_minutes: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE pomodoro_sessions
                SET completed_at = ?2, actual_duration_minutes = ?3
              WHERE id = ?1 AND completed_at IS NULL",
            params![id, completed_at.to_rfc3339(), actual_minutes],
        )?;
        if changed == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM pomodoro_sessions WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )?;
            if exists {
                debug!("session {id} already completed");
            } else {
                warn!("cannot complete unknown session {id}");
            }
            return Ok(false);
        }
        Ok(true)
    }

    pub fn session(&self, id: &str) -> Result<Option<SessionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM pomodoro_sessions WHERE id = ?1"
        ))?;
        let record = stmt.query_row(params![id], session_from_row).optional()?;
        Ok(record)
    }

    pub fn sessions_for_task(&self, task_id: &str) -> Result<Vec<SessionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM pomodoro_sessions
              WHERE task_id = ?1
              ORDER BY started_at"
        ))?;
        let rows = stmt.query_map(params![task_id], session_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Sessions completed at or after `since`, oldest first.
    pub fn completed_since(&self, since: DateTime<Utc>) -> Result<Vec<SessionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM pomodoro_sessions
              WHERE completed_at IS NOT NULL AND completed_at >= ?1
              ORDER BY completed_at"
        ))?;
        let rows = stmt.query_map(params![since.to_rfc3339()], session_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn setting_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM user_settings WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn setting_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO user_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl SessionStore for Database {
    fn open_session(&self, task_id: &str, planned_minutes: u32) -> Result<SessionRecord> {
        self.create_session(task_id, planned_minutes, Utc::now())
    }

    fn complete_session(&self, id: &str, actual_minutes: u32) -> Result<bool> {
        self.finish_session(id, actual_minutes, Utc::now())
    }
}

/// The `user_settings` table is the authoritative preference store.
impl PreferenceSource for Database {
    fn load(&self) -> Result<Option<TimerPreferences>> {
        match self.setting_get(PREFERENCES_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn store(&self, prefs: &TimerPreferences) -> Result<()> {
        self.setting_set(PREFERENCES_KEY, &serde_json::to_string(prefs)?)
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let completed_at: Option<String> = row.get(4)?;
    Ok(SessionRecord {
        id: row.get(0)?,
        task_id: row.get(1)?,
        planned_minutes: row.get(2)?,
        started_at: parse_timestamp(3, &row.get::<_, String>(3)?)?,
        completed_at: completed_at
            .map(|s| parse_timestamp(4, &s))
            .transpose()?,
        actual_minutes: row.get(5)?,
    })
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn create_and_complete_session() {
        let db = Database::open_memory().unwrap();
        let record = db.open_session("task-1", 25).unwrap();
        assert!(record.is_open());

        assert!(db.complete_session(&record.id, 25).unwrap());

        let stored = db.session(&record.id).unwrap().unwrap();
        assert_eq!(stored.actual_minutes, Some(25));
        assert!(stored.completed_at.is_some());
    }

    #[test]
    fn completing_twice_is_a_noop() {
        let db = Database::open_memory().unwrap();
        let record = db.open_session("task-1", 25).unwrap();
        assert!(db.complete_session(&record.id, 10).unwrap());
        assert!(!db.complete_session(&record.id, 25).unwrap());

        let stored = db.session(&record.id).unwrap().unwrap();
        assert_eq!(stored.actual_minutes, Some(10));
    }

    #[test]
    fn completing_unknown_session_is_a_noop() {
        let db = Database::open_memory().unwrap();
        assert!(!db.complete_session("missing", 5).unwrap());
    }

    #[test]
    fn completed_since_filters_by_completion_time() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let old = db.create_session("t", 25, now - Duration::days(2)).unwrap();
        db.finish_session(&old.id, 25, now - Duration::days(2)).unwrap();
        let fresh = db.create_session("t", 25, now).unwrap();
        db.finish_session(&fresh.id, 20, now).unwrap();
        db.create_session("t", 25, now).unwrap();

        let recent = db.completed_since(now - Duration::hours(1)).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, fresh.id);
        assert_eq!(db.sessions_for_task("t").unwrap().len(), 3);
    }

    #[test]
    fn preferences_roundtrip_through_settings() {
        let db = Database::open_memory().unwrap();
        assert!(PreferenceSource::load(&db).unwrap().is_none());
        db.store(&TimerPreferences::new(45, 15)).unwrap();
        assert_eq!(
            PreferenceSource::load(&db).unwrap(),
            Some(TimerPreferences::new(45, 15))
        );
    }
}
