use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::habit::Habit;
use crate::recurrence::occurrences_in_range;

/// One checked-off occurrence of a habit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    pub occurrence_date: NaiveDate,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakStats {
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_completions: u32,
    /// Completed share of expected occurrences, rounded percent.
    pub completion_rate: u32,
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// Streak statistics for a habit as of `today`.
///
/// Expected occurrences are everything the pattern scheduled between
/// `start_date` and `today`; the current streak counts consecutive completed
/// occurrences backward from the most recent expected one.
pub fn calculate_streak(habit: &Habit, completions: &[Completion], today: NaiveDate) -> StreakStats {
    if completions.is_empty() {
        return StreakStats::default();
    }

    let completed: HashSet<NaiveDate> = completions.iter().map(|c| c.occurrence_date).collect();
    let last_completed_at = completions
        .iter()
        .map(|c| c.completed_at)
        .max();

    let expected = occurrences_in_range(habit, habit.start_date, today);

    let mut best = 0u32;
    let mut run = 0u32;
    for date in &expected {
        if completed.contains(date) {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }

    let mut current = 0u32;
    for date in expected.iter().rev() {
        if completed.contains(date) {
            current += 1;
        } else {
            break;
        }
    }

    let completion_rate = if expected.is_empty() {
        0
    } else {
        ((completions.len() as f64 / expected.len() as f64) * 100.0).round() as u32
    };

    StreakStats {
        current_streak: current,
        best_streak: best.max(current),
        total_completions: completions.len() as u32,
        completion_rate,
        last_completed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::Frequency;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_habit() -> Habit {
        Habit {
            id: "hab_walk".to_string(),
            name: "Walk".to_string(),
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

    fn completion(y: i32, m: u32, d: u32) -> Completion {
        let occurrence_date = date(y, m, d);
        Completion {
            occurrence_date,
            completed_at: occurrence_date
                .and_hms_opt(20, 0, 0)
                .unwrap()
                .and_utc(),
        }
    }

    #[test]
    fn empty_log_is_all_zero() {
        let stats = calculate_streak(&daily_habit(), &[], date(2024, 1, 10));
        assert_eq!(stats, StreakStats::default());
    }

    #[test]
    fn counts_current_and_best_runs() {
        // Days 1-2 completed, 3 missed, 4-6 completed; today is the 6th.
        let completions = vec![
            completion(2024, 1, 1),
            completion(2024, 1, 2),
            completion(2024, 1, 4),
            completion(2024, 1, 5),
            completion(2024, 1, 6),
        ];
        let stats = calculate_streak(&daily_habit(), &completions, date(2024, 1, 6));
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.best_streak, 3);
        assert_eq!(stats.total_completions, 5);
        assert_eq!(stats.completion_rate, 83);
        assert_eq!(
            stats.last_completed_at,
            Some(completion(2024, 1, 6).completed_at)
        );
    }

    #[test]
    fn missed_latest_occurrence_resets_current_but_not_best() {
        let completions = vec![
            completion(2024, 1, 1),
            completion(2024, 1, 2),
            completion(2024, 1, 3),
        ];
        let stats = calculate_streak(&daily_habit(), &completions, date(2024, 1, 5));
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.best_streak, 3);
    }

    #[test]
    fn weekly_habit_only_counts_scheduled_days() {
        let mut habit = daily_habit();
        habit.frequency = Frequency::Weekly;
        habit.days_of_week = Some(vec![1]); // Mondays; 2024-01-01 is one.
        let completions = vec![completion(2024, 1, 1), completion(2024, 1, 8)];
        let stats = calculate_streak(&habit, &completions, date(2024, 1, 10));
        // Two expected Mondays so far, both completed.
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.best_streak, 2);
        assert_eq!(stats.completion_rate, 100);
    }
}
