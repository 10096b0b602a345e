use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyType {
    DayOfMonth,
    DayOfWeek,
}

/// Recurrence definition for a habit. Weekday indices run 0=Sunday..6=Saturday.
///
/// Records arrive pre-validated from an external store; [`Habit::validate`]
/// re-checks the fields for callers that register definitions directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub recurrence_interval: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub days_of_week: Option<Vec<u8>>,
    #[serde(default)]
    pub monthly_type: Option<MonthlyType>,
    #[serde(default)]
    pub day_of_month: Option<u32>,
    #[serde(default)]
    pub week_of_month: Option<u32>,
    #[serde(default)]
    pub day_of_week_monthly: Option<u8>,
}

fn default_interval() -> u32 {
    1
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRecurrence {
    #[error("recurrence interval must be at least 1")]
    ZeroInterval,
    #[error("day of month {0} is outside 1..=31")]
    DayOfMonth(u32),
    #[error("weekday index {0} is outside 0..=6")]
    WeekdayIndex(u8),
    #[error("week of month {0} is outside 1..=5")]
    WeekOfMonth(u32),
    #[error("end date {end} precedes start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl Habit {
    pub fn validate(&self) -> Result<(), InvalidRecurrence> {
        if self.recurrence_interval == 0 {
            return Err(InvalidRecurrence::ZeroInterval);
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(InvalidRecurrence::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        if let Some(days) = &self.days_of_week {
            if let Some(&bad) = days.iter().find(|&&d| d > 6) {
                return Err(InvalidRecurrence::WeekdayIndex(bad));
            }
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(InvalidRecurrence::DayOfMonth(day));
            }
        }
        if let Some(week) = self.week_of_month {
            if !(1..=5).contains(&week) {
                return Err(InvalidRecurrence::WeekOfMonth(week));
            }
        }
        if let Some(weekday) = self.day_of_week_monthly {
            if weekday > 6 {
                return Err(InvalidRecurrence::WeekdayIndex(weekday));
            }
        }
        Ok(())
    }
}
