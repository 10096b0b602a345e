use chrono::{Datelike, Days, Duration, NaiveDate};

use crate::habit::{Frequency, Habit, MonthlyType};

/// Forward scans give up after a year; every non-yearly period recurs at
/// least once within 366 days of a match.
const MAX_DAY_SCAN: u32 = 366;
/// Yearly anchor search bound, generous enough for leap anchors with
/// multi-year intervals.
const MAX_YEAR_SCAN: i32 = 100;
/// Hard cap on range query results, so a malformed definition truncates
/// instead of looping.
const MAX_RANGE_RESULTS: usize = 365;

/// Whether `date` satisfies the habit's recurrence pattern.
///
/// Pure predicate; the `[start_date, end_date]` bounds are checked by
/// [`is_occurrence_date`], not here (other than `date >= start_date`, which
/// every pattern requires).
pub fn matches_on(habit: &Habit, date: NaiveDate) -> bool {
    if date < habit.start_date {
        return false;
    }
    let interval = i64::from(habit.recurrence_interval.max(1));
    match habit.frequency {
        Frequency::Daily | Frequency::Custom => {
            (date - habit.start_date).num_days() % interval == 0
        }
        Frequency::Weekly => {
            let weekday = date.weekday().num_days_from_sunday() as u8;
            let on_target = match &habit.days_of_week {
                Some(days) if !days.is_empty() => days.contains(&weekday),
                _ => weekday == habit.start_date.weekday().num_days_from_sunday() as u8,
            };
            if !on_target {
                return false;
            }
            if interval > 1 {
                let weeks = (week_anchor(date) - week_anchor(habit.start_date)).num_days() / 7;
                if weeks % interval != 0 {
                    return false;
                }
            }
            true
        }
        Frequency::Monthly => {
            if month_delta(habit.start_date, date) % interval != 0 {
                return false;
            }
            match habit.monthly_type.unwrap_or(MonthlyType::DayOfMonth) {
                MonthlyType::DayOfMonth => {
                    let wanted = habit.day_of_month.unwrap_or(habit.start_date.day());
                    date.day() == wanted.min(days_in_month(date.year(), date.month()))
                }
                MonthlyType::DayOfWeek => {
                    let target = habit
                        .day_of_week_monthly
                        .unwrap_or(habit.start_date.weekday().num_days_from_sunday() as u8);
                    if date.weekday().num_days_from_sunday() as u8 != target {
                        return false;
                    }
                    match habit.week_of_month.unwrap_or(1) {
                        // 5 means the last such weekday: a week later falls in
                        // the next month.
                        5 => match date.checked_add_days(Days::new(7)) {
                            Some(next) => next.month() != date.month(),
                            None => true,
                        },
                        week => date.day().div_ceil(7) == week,
                    }
                }
            }
        }
        Frequency::Yearly => {
            date.month() == habit.start_date.month()
                && date.day() == habit.start_date.day()
                && i64::from(date.year() - habit.start_date.year()) % interval == 0
        }
    }
}

/// Bounds check plus pattern evaluation.
pub fn is_occurrence_date(habit: &Habit, date: NaiveDate) -> bool {
    date >= habit.start_date && within_end(habit, date) && matches_on(habit, date)
}

/// Up to `count` occurrence dates at or after `from`, stopping early once
/// `end_date` is exhausted.
pub fn calculate_occurrences(habit: &Habit, from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut occurrences = Vec::with_capacity(count);
    let mut cursor = from.max(habit.start_date);
    while occurrences.len() < count {
        let Some(date) = next_on_or_after(habit, cursor) else {
            break;
        };
        if !within_end(habit, date) {
            break;
        }
        occurrences.push(date);
        let Some(next) = date.succ_opt() else {
            break;
        };
        cursor = next;
    }
    occurrences
}

/// Every occurrence in `[range_start, range_end]`, both bounds inclusive,
/// capped at 365 results.
pub fn occurrences_in_range(
    habit: &Habit,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Vec<NaiveDate> {
    let upper = match habit.end_date {
        Some(end) => range_end.min(end),
        None => range_end,
    };
    let mut occurrences = Vec::new();
    let mut cursor = range_start.max(habit.start_date);
    while cursor <= upper {
        let Some(date) = next_on_or_after(habit, cursor) else {
            break;
        };
        if date > upper {
            break;
        }
        occurrences.push(date);
        if occurrences.len() >= MAX_RANGE_RESULTS {
            tracing::warn!(
                habit = %habit.id,
                cap = MAX_RANGE_RESULTS,
                "range query truncated at result cap"
            );
            break;
        }
        let Some(next) = date.succ_opt() else {
            break;
        };
        cursor = next;
    }
    occurrences
}

/// The smallest occurrence date strictly greater than `after`, or `None`
/// once the pattern is exhausted.
pub fn next_occurrence(habit: &Habit, after: NaiveDate) -> Option<NaiveDate> {
    let from = after.succ_opt()?;
    let date = next_on_or_after(habit, from)?;
    within_end(habit, date).then_some(date)
}

fn within_end(habit: &Habit, date: NaiveDate) -> bool {
    habit.end_date.is_none_or(|end| date <= end)
}

fn next_on_or_after(habit: &Habit, from: NaiveDate) -> Option<NaiveDate> {
    let start = from.max(habit.start_date);
    if habit.frequency == Frequency::Yearly {
        return yearly_on_or_after(habit, start);
    }
    let mut date = start;
    for _ in 0..MAX_DAY_SCAN {
        if matches_on(habit, date) {
            return Some(date);
        }
        date = date.succ_opt()?;
    }
    None
}

/// Yearly fast path: candidate years are derived directly from the anchor's
/// month/day instead of scanning days. `from_ymd_opt` yields `None` for
/// Feb 29 in a common year, so leap anchors skip those years for free.
fn yearly_on_or_after(habit: &Habit, from: NaiveDate) -> Option<NaiveDate> {
    let interval = habit.recurrence_interval.max(1) as i32;
    let anchor_month = habit.start_date.month();
    let anchor_day = habit.start_date.day();
    for offset in 0..MAX_YEAR_SCAN {
        let year = from.year() + offset;
        let delta = year - habit.start_date.year();
        if delta < 0 || delta % interval != 0 {
            continue;
        }
        if let Some(candidate) = NaiveDate::from_ymd_opt(year, anchor_month, anchor_day) {
            if candidate >= from {
                return Some(candidate);
            }
        }
    }
    None
}

/// The Sunday beginning the week containing `date`; week-interval alignment
/// compares these anchors.
fn week_anchor(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

fn month_delta(from: NaiveDate, to: NaiveDate) -> i64 {
    (i64::from(to.year()) - i64::from(from.year())) * 12 + i64::from(to.month())
        - i64::from(from.month())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
