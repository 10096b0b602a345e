use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use cadence_core::availability::{self, FreeSlot, HourWindow};
use cadence_core::habit::Habit;
use cadence_core::layout::{resolve_overlaps, visible_hour_range, LayoutConfig};
use cadence_core::recurrence;
use cadence_core::session::Session;
use cadence_core::streak::{calculate_streak, Completion, StreakStats};
use cadence_core::timeblock::{build_time_blocks, TimeBlock};

/// A fully laid-out week: resolved blocks plus the hour window to render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekView {
    pub week_start: NaiveDate,
    pub start_hour: i64,
    pub end_hour: i64,
    pub blocks: Vec<TimeBlock>,
}

/// In-memory registry of habits, sessions, and completion logs, plus the
/// queries a calendar host needs. Occurrences and week views are recomputed
/// per call; nothing derived is ever stored.
pub struct ScheduleService {
    habits: RwLock<HashMap<String, Habit>>,
    sessions: RwLock<HashMap<String, Session>>,
    completions: RwLock<HashMap<String, Vec<Completion>>>,
    layout: LayoutConfig,
    offset: FixedOffset,
}

pub struct ScheduleServiceBuilder {
    habits: Vec<Habit>,
    sessions: Vec<Session>,
    layout: LayoutConfig,
    offset: FixedOffset,
}

impl ScheduleServiceBuilder {
    pub fn new() -> Self {
        Self {
            habits: Vec::new(),
            sessions: Vec::new(),
            layout: LayoutConfig::default(),
            offset: Utc.fix(),
        }
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Timezone used to resolve day boundaries, as a fixed UTC offset.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn add_habit(mut self, habit: Habit) -> Self {
        self.habits.push(habit);
        self
    }

    pub fn add_session(mut self, session: Session) -> Self {
        self.sessions.push(session);
        self
    }

    pub fn build(self) -> Result<ScheduleService> {
        let service = ScheduleService {
            habits: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            completions: RwLock::new(HashMap::new()),
            layout: self.layout,
            offset: self.offset,
        };
        for habit in self.habits {
            service.upsert_habit(habit)?;
        }
        for session in self.sessions {
            service.upsert_session(session);
        }
        Ok(service)
    }
}

impl Default for ScheduleServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleService {
    pub fn builder() -> ScheduleServiceBuilder {
        ScheduleServiceBuilder::new()
    }

    pub fn upsert_habit(&self, habit: Habit) -> Result<()> {
        habit
            .validate()
            .with_context(|| format!("invalid recurrence for habit {}", habit.id))?;
        tracing::debug!(habit = %habit.id, "registering habit");
        self.habits.write().insert(habit.id.clone(), habit);
        Ok(())
    }

    pub fn remove_habit(&self, habit_id: &str) -> Result<()> {
        tracing::debug!(habit = %habit_id, "removing habit");
        self.habits
            .write()
            .remove(habit_id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("habit not registered"))?;
        self.completions.write().remove(habit_id);
        Ok(())
    }

    pub fn upsert_session(&self, session: Session) {
        tracing::debug!(session = %session.id, "registering session");
        self.sessions.write().insert(session.id.clone(), session);
    }

    pub fn remove_session(&self, session_id: &str) -> Result<()> {
        tracing::debug!(session = %session_id, "removing session");
        self.sessions
            .write()
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("session not registered"))
    }

    pub fn habits(&self) -> Vec<Habit> {
        let mut habits: Vec<Habit> = self.habits.read().values().cloned().collect();
        habits.sort_by(|a, b| a.id.cmp(&b.id));
        habits
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sessions_snapshot()
    }

    pub fn occurrences_in_range(
        &self,
        habit_id: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let habits = self.habits.read();
        let habit = habits
            .get(habit_id)
            .ok_or_else(|| anyhow!("habit not registered"))?;
        Ok(recurrence::occurrences_in_range(habit, range_start, range_end))
    }

    pub fn next_occurrence(&self, habit_id: &str, after: NaiveDate) -> Result<Option<NaiveDate>> {
        let habits = self.habits.read();
        let habit = habits
            .get(habit_id)
            .ok_or_else(|| anyhow!("habit not registered"))?;
        Ok(recurrence::next_occurrence(habit, after))
    }

    /// Check off one occurrence. The date must actually be scheduled by the
    /// habit's pattern; a second check-off for the same date is a no-op.
    pub fn record_completion(
        &self,
        habit_id: &str,
        occurrence_date: NaiveDate,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        let habits = self.habits.read();
        let habit = habits
            .get(habit_id)
            .ok_or_else(|| anyhow!("habit not registered"))?;
        if !recurrence::is_occurrence_date(habit, occurrence_date) {
            bail!("{occurrence_date} is not an occurrence of habit {habit_id}");
        }
        drop(habits);

        let mut completions = self.completions.write();
        let log = completions.entry(habit_id.to_string()).or_default();
        if log.iter().any(|c| c.occurrence_date == occurrence_date) {
            return Ok(());
        }
        tracing::debug!(habit = %habit_id, date = %occurrence_date, "recording completion");
        log.push(Completion {
            occurrence_date,
            completed_at,
        });
        Ok(())
    }

    pub fn streak(&self, habit_id: &str, today: NaiveDate) -> Result<StreakStats> {
        let habits = self.habits.read();
        let habit = habits
            .get(habit_id)
            .ok_or_else(|| anyhow!("habit not registered"))?;
        let completions = self.completions.read();
        let log = completions.get(habit_id).map(Vec::as_slice).unwrap_or(&[]);
        Ok(calculate_streak(habit, log, today))
    }

    /// Lay out every registered session for the week starting at
    /// `week_start`. Sessions are fed to the builder in `(start_at, id)`
    /// order so the column assignment is stable across calls.
    #[tracing::instrument(skip(self))]
    pub fn week_view(&self, week_start: NaiveDate, now: DateTime<Utc>) -> WeekView {
        let sessions = self.sessions_snapshot();
        let mut blocks =
            build_time_blocks(&sessions, week_start, &self.offset, now, &self.layout);
        resolve_overlaps(&mut blocks);
        let (start_hour, end_hour) = visible_hour_range(&blocks, &self.layout);
        WeekView {
            week_start,
            start_hour,
            end_hour,
            blocks,
        }
    }

    /// Free gaps of at least `min_hours` on one day of the week, inside
    /// `window`. This is the occupancy-derived input an external slot
    /// scorer ranks.
    pub fn free_slots(
        &self,
        week_start: NaiveDate,
        day_index: usize,
        now: DateTime<Utc>,
        window: HourWindow,
        min_hours: f64,
    ) -> Vec<FreeSlot> {
        let view = self.week_view(week_start, now);
        let occupied = availability::day_occupancy(&view.blocks, day_index);
        availability::free_slots(&window, &occupied, min_hours)
    }

    fn sessions_snapshot(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.read().values().cloned().collect();
        sessions.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::habit::Frequency;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_habit(id: &str) -> Habit {
        Habit {
            id: id.to_string(),
            name: id.to_string(),
            frequency: Frequency::Daily,
            recurrence_interval: 1,
            start_date: date(2024, 1, 1),
            end_date: None,
            days_of_week: None,
            monthly_type: None,
            day_of_month: None,
            week_of_month: None,
            day_of_week_monthly: None,
        }
    }

    #[test]
    fn build_rejects_invalid_habit() {
        let mut habit = daily_habit("hab_bad");
        habit.recurrence_interval = 0;
        let result = ScheduleService::builder().add_habit(habit).build();
        assert!(result.is_err());
    }

    #[test]
    fn completion_requires_an_occurrence_date() {
        let mut habit = daily_habit("hab_mon");
        habit.frequency = Frequency::Weekly;
        habit.days_of_week = Some(vec![1]);
        let service = ScheduleService::builder()
            .add_habit(habit)
            .build()
            .unwrap();

        let tuesday = date(2024, 1, 2);
        let noon = "2024-01-02T12:00:00Z".parse().unwrap();
        assert!(service
            .record_completion("hab_mon", tuesday, noon)
            .is_err());

        let monday = date(2024, 1, 8);
        service
            .record_completion("hab_mon", monday, noon)
            .unwrap();
        // Checking off the same date twice keeps a single log entry.
        service
            .record_completion("hab_mon", monday, noon)
            .unwrap();
        let stats = service.streak("hab_mon", monday).unwrap();
        assert_eq!(stats.total_completions, 1);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let service = ScheduleService::builder().build().unwrap();
        assert!(service.next_occurrence("hab_ghost", date(2024, 1, 1)).is_err());
        assert!(service.remove_session("ses_ghost").is_err());
    }
}
