use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accounting record for one focus interval.
///
/// Opened when a work interval starts for a task and completed exactly once,
/// either when the countdown expires or when the user stops early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub task_id: String,
    pub planned_minutes: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_minutes: Option<u32>,
}

impl SessionRecord {
    pub fn is_open(&self) -> bool {
        self.completed_at.is_none()
    }
}
