use serde::{Deserialize, Serialize};

use crate::timeblock::TimeBlock;

/// A fractional-hour window within one day, `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HourWindow {
    pub start: f64,
    pub end: f64,
}

/// A free gap: where it starts and how many contiguous hours it offers.
/// Downstream slot scoring ranks these; nothing here decides placement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FreeSlot {
    pub start: f64,
    pub available: f64,
}

/// Enumerate free gaps of at least `min_hours` inside `window`, given
/// occupied `(start, end)` intervals. The walk keeps a furthest-end cursor,
/// so nested or overlapping occupied intervals cannot fabricate gaps.
pub fn free_slots(window: &HourWindow, occupied: &[(f64, f64)], min_hours: f64) -> Vec<FreeSlot> {
    let mut busy: Vec<(f64, f64)> = occupied
        .iter()
        .copied()
        .filter(|&(start, end)| start < window.end && end > window.start)
        .collect();
    busy.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut slots = Vec::new();
    let mut cursor = window.start;
    for &(start, end) in &busy {
        let start = start.max(window.start);
        if start > cursor {
            let available = start - cursor;
            if available >= min_hours {
                slots.push(FreeSlot {
                    start: cursor,
                    available,
                });
            }
        }
        cursor = cursor.max(end.min(window.end));
    }
    if window.end > cursor {
        let available = window.end - cursor;
        if available >= min_hours {
            slots.push(FreeSlot {
                start: cursor,
                available,
            });
        }
    }
    slots
}

/// Contiguous free hours starting exactly at `start`, capped at `max_hours`.
/// Zero if `start` is outside the window or inside an occupied interval.
pub fn available_hours_at(
    start: f64,
    window: &HourWindow,
    occupied: &[(f64, f64)],
    max_hours: f64,
) -> f64 {
    if start < window.start || start >= window.end {
        return 0.0;
    }
    let mut available = (window.end - start).min(max_hours);
    for &(busy_start, busy_end) in occupied {
        if busy_start <= start && busy_end > start {
            return 0.0;
        }
        if busy_start > start {
            available = available.min(busy_start - start);
        }
    }
    available.max(0.0)
}

/// Occupied intervals for one day of laid-out blocks, sorted by start; this
/// is the occupancy input an external scorer consumes.
pub fn day_occupancy(blocks: &[TimeBlock], day_index: usize) -> Vec<(f64, f64)> {
    let mut occupied: Vec<(f64, f64)> = blocks
        .iter()
        .filter(|b| b.day_index == day_index)
        .map(|b| (b.start_hours, b.end_hours))
        .collect();
    occupied.sort_by(|a, b| a.0.total_cmp(&b.0));
    occupied
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORK: HourWindow = HourWindow {
        start: 9.0,
        end: 17.0,
    };

    #[test]
    fn empty_day_is_one_big_slot() {
        let slots = free_slots(&WORK, &[], 0.5);
        assert_eq!(
            slots,
            vec![FreeSlot {
                start: 9.0,
                available: 8.0
            }]
        );
    }

    #[test]
    fn gaps_before_between_and_after() {
        let occupied = [(10.0, 11.0), (13.0, 14.5)];
        let slots = free_slots(&WORK, &occupied, 0.5);
        assert_eq!(
            slots,
            vec![
                FreeSlot {
                    start: 9.0,
                    available: 1.0
                },
                FreeSlot {
                    start: 11.0,
                    available: 2.0
                },
                FreeSlot {
                    start: 14.5,
                    available: 2.5
                },
            ]
        );
    }

    #[test]
    fn short_gaps_are_dropped() {
        let occupied = [(9.0, 12.0), (12.25, 17.0)];
        let slots = free_slots(&WORK, &occupied, 0.5);
        assert!(slots.is_empty());
    }

    #[test]
    fn nested_intervals_do_not_fabricate_gaps() {
        // (10,15) swallows (11,12); the tail gap starts at 15, not 12.
        let occupied = [(10.0, 15.0), (11.0, 12.0)];
        let slots = free_slots(&WORK, &occupied, 0.5);
        assert_eq!(
            slots,
            vec![
                FreeSlot {
                    start: 9.0,
                    available: 1.0
                },
                FreeSlot {
                    start: 15.0,
                    available: 2.0
                },
            ]
        );
    }

    #[test]
    fn intervals_spilling_past_the_window_are_clipped() {
        let occupied = [(8.0, 10.0), (16.0, 19.0)];
        let slots = free_slots(&WORK, &occupied, 1.0);
        assert_eq!(
            slots,
            vec![FreeSlot {
                start: 10.0,
                available: 6.0
            }]
        );
    }

    #[test]
    fn availability_at_a_specific_start() {
        let occupied = [(10.0, 11.0), (13.0, 14.0)];
        assert_eq!(available_hours_at(11.0, &WORK, &occupied, 8.0), 2.0);
        assert_eq!(available_hours_at(10.5, &WORK, &occupied, 8.0), 0.0);
        assert_eq!(available_hours_at(14.0, &WORK, &occupied, 2.0), 2.0);
        assert_eq!(available_hours_at(8.0, &WORK, &occupied, 8.0), 0.0);
        assert_eq!(available_hours_at(17.0, &WORK, &occupied, 8.0), 0.0);
    }

    #[test]
    fn day_occupancy_filters_and_sorts() {
        use crate::timeblock::TimeBlock;
        let block = |id: &str, day_index: usize, start_hours: f64, end_hours: f64| TimeBlock {
            session_index: 0,
            session_id: id.to_string(),
            title: None,
            category: None,
            day_index,
            start_hours,
            end_hours,
            duration_hours: end_hours - start_hours,
            is_running: false,
            column: 0,
            total_columns: 1,
        };
        let blocks = vec![
            block("late", 2, 14.0, 15.0),
            block("early", 2, 9.0, 10.0),
            block("other_day", 3, 9.0, 10.0),
        ];
        assert_eq!(day_occupancy(&blocks, 2), vec![(9.0, 10.0), (14.0, 15.0)]);
    }
}
