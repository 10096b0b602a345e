use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::layout::LayoutConfig;
use crate::session::Session;

/// One day-clipped segment of a session, positioned in fractional hours.
///
/// `session_index` points back into the slice the block was built from;
/// blocks never own their session. `column`/`total_columns` are filled in by
/// [`crate::layout::resolve_overlaps`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeBlock {
    pub session_index: usize,
    pub session_id: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub day_index: usize,
    pub start_hours: f64,
    pub end_hours: f64,
    pub duration_hours: f64,
    pub is_running: bool,
    pub column: usize,
    pub total_columns: usize,
}

/// Project sessions onto the 7-day week starting at `week_start`, resolved in
/// `tz`. A session spanning several days emits one block per intersected day,
/// clipped to that day's `[00:00, 24:00)`. Running sessions extend to `now`
/// and pulse only on their trailing segment.
pub fn build_time_blocks<Tz: TimeZone>(
    sessions: &[Session],
    week_start: NaiveDate,
    tz: &Tz,
    now: DateTime<Utc>,
    config: &LayoutConfig,
) -> Vec<TimeBlock> {
    let mut blocks = Vec::new();
    for (session_index, session) in sessions.iter().enumerate() {
        let start_local = session.start_at.with_timezone(tz).naive_local();
        let end_local = session
            .end_at
            .unwrap_or(now)
            .with_timezone(tz)
            .naive_local();
        if end_local < start_local {
            continue;
        }
        let running = session.is_running();

        for day_index in 0..7usize {
            let Some(day_date) = week_start.checked_add_days(Days::new(day_index as u64)) else {
                break;
            };
            let day_start = day_date.and_time(NaiveTime::MIN);
            let day_end = day_start + Duration::days(1);

            let clip_start = start_local.max(day_start);
            let clip_end = end_local.min(day_end);
            if clip_end < clip_start {
                continue;
            }
            // A zero-width intersection is either a boundary touch (skip) or
            // a genuinely zero-length session (keep one visible block).
            if clip_end == clip_start
                && !(start_local == end_local
                    && start_local >= day_start
                    && start_local < day_end)
            {
                continue;
            }

            let start_hours = fractional_hours(day_start, clip_start);
            let end_hours = if clip_end == day_end {
                24.0
            } else {
                fractional_hours(day_start, clip_end)
            };
            blocks.push(TimeBlock {
                session_index,
                session_id: session.id.clone(),
                title: session.title.clone(),
                category: session.category.clone(),
                day_index,
                start_hours,
                end_hours,
                duration_hours: (end_hours - start_hours).max(config.min_visible_hours),
                is_running: running && clip_end == end_local,
                column: 0,
                total_columns: 1,
            });
        }
    }
    blocks
}

fn fractional_hours(day_start: NaiveDateTime, at: NaiveDateTime) -> f64 {
    (at - day_start).num_seconds() as f64 / 3600.0
}
