use serde::{Deserialize, Serialize};

use crate::timeblock::TimeBlock;

/// Geometry knobs for the week grid. Hosts deserialize this from their
/// settings store; `Default` matches the reference grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Pixel height of one hour row.
    pub hour_height: f64,
    /// Floor for rendered block height, keeps slivers clickable.
    pub min_block_height: f64,
    /// Horizontal offset per overlap column.
    pub column_indent: f64,
    /// Floor for a block's reported duration, in hours.
    pub min_visible_hours: f64,
    /// Hour window shown when a week has no blocks at all.
    pub default_start_hour: i64,
    pub default_end_hour: i64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            hour_height: 64.0,
            min_block_height: 16.0,
            column_indent: 8.0,
            min_visible_hours: 0.25,
            default_start_hour: 6,
            default_end_hour: 22,
        }
    }
}

/// Pixel geometry for one block. The block spans its day lane from `indent`
/// to the lane's right edge; `layer` stacks later columns above earlier ones
/// so overlaps cascade stair-step style.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BlockStyle {
    pub top: f64,
    pub height: f64,
    pub indent: f64,
    pub layer: u32,
}

/// Assign non-colliding columns to every block, in place.
///
/// Per day, blocks are ordered by start (longer first on ties) and split into
/// transitive-overlap groups. Ordered by start, a group is exactly a maximal
/// run in which each block starts before the furthest end seen so far, so one
/// linear sweep recovers the groups. Within a group, first-fit column reuse
/// yields the minimum number of columns (the size of the largest clique of
/// mutually overlapping blocks). Deterministic for a fixed input order, and
/// idempotent.
pub fn resolve_overlaps(blocks: &mut [TimeBlock]) {
    let max_day = match blocks.iter().map(|b| b.day_index).max() {
        Some(max) => max,
        None => return,
    };
    for day in 0..=max_day {
        let mut order: Vec<usize> = (0..blocks.len())
            .filter(|&i| blocks[i].day_index == day)
            .collect();
        if order.is_empty() {
            continue;
        }
        order.sort_by(|&a, &b| {
            blocks[a]
                .start_hours
                .total_cmp(&blocks[b].start_hours)
                .then(blocks[b].duration_hours.total_cmp(&blocks[a].duration_hours))
        });

        let mut group: Vec<usize> = vec![order[0]];
        let mut group_end = blocks[order[0]].end_hours;
        for &i in &order[1..] {
            if blocks[i].start_hours < group_end {
                group_end = group_end.max(blocks[i].end_hours);
                group.push(i);
            } else {
                assign_columns(&group, blocks);
                group.clear();
                group.push(i);
                group_end = blocks[i].end_hours;
            }
        }
        assign_columns(&group, blocks);
    }
}

/// First-fit greedy coloring over a start-ordered overlap group.
fn assign_columns(group: &[usize], blocks: &mut [TimeBlock]) {
    let mut column_ends: Vec<f64> = Vec::new();
    for &i in group {
        let start = blocks[i].start_hours;
        match column_ends.iter().position(|&end| end <= start) {
            Some(column) => {
                blocks[i].column = column;
                column_ends[column] = blocks[i].end_hours;
            }
            None => {
                blocks[i].column = column_ends.len();
                column_ends.push(blocks[i].end_hours);
            }
        }
    }
    for &i in group {
        blocks[i].total_columns = column_ends.len();
    }
}

/// The hour window worth rendering: one hour of padding around the extremes,
/// clamped to the civil day, or the configured default for an empty week.
pub fn visible_hour_range(blocks: &[TimeBlock], config: &LayoutConfig) -> (i64, i64) {
    if blocks.is_empty() {
        return (config.default_start_hour, config.default_end_hour);
    }
    let min_start = blocks
        .iter()
        .map(|b| b.start_hours)
        .fold(f64::INFINITY, f64::min);
    let max_end = blocks
        .iter()
        .map(|b| b.end_hours)
        .fold(f64::NEG_INFINITY, f64::max);
    let start = (min_start.floor() as i64 - 1).max(0);
    let end = (max_end.ceil() as i64 + 1).min(24);
    (start, end)
}

pub fn block_style(block: &TimeBlock, visible_start_hour: i64, config: &LayoutConfig) -> BlockStyle {
    BlockStyle {
        top: (block.start_hours - visible_start_hour as f64) * config.hour_height,
        height: (block.duration_hours * config.hour_height).max(config.min_block_height),
        indent: block.column as f64 * config.column_indent,
        layer: block.column as u32,
    }
}
