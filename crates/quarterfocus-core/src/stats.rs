//! Today's focus statistics.

use std::collections::HashSet;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Database;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayStats {
    /// Sessions completed today, early stops included.
    pub total_pomodoros: u32,
    /// Sum of actual minutes across those sessions.
    pub total_minutes: u32,
    /// Distinct tasks that received focus time today.
    pub tasks_focused: u32,
}

impl TodayStats {
    /// "1h 5m" or "45m".
    pub fn focus_time_label(&self) -> String {
        let hours = self.total_minutes / 60;
        let minutes = self.total_minutes % 60;
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }
}

/// Aggregate sessions completed since local midnight of `now`.
pub fn today(db: &Database, now: DateTime<Local>) -> Result<TodayStats> {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc));

    let sessions = db.completed_since(midnight)?;
    let tasks: HashSet<&str> = sessions.iter().map(|s| s.task_id.as_str()).collect();

    Ok(TodayStats {
        total_pomodoros: sessions.len() as u32,
        total_minutes: sessions
            .iter()
            .map(|s| s.actual_minutes.unwrap_or(s.planned_minutes))
            .sum(),
        tasks_focused: tasks.len() as u32,
    })
}
