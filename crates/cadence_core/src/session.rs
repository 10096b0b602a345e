use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked work session. A missing `end_at` means the session is still
/// running; callers supply "now" when projecting it onto a calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_running(&self) -> bool {
        self.end_at.is_none()
    }
}
