use serde::{Deserialize, Serialize};

use crate::domain::Event;

/// Nominal length of every generated scenario, in seconds from T0.
pub const SCENARIO_WINDOW_SECS: f64 = 420.0;

/// One firing of an event template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Occurrence {
    pub template_index: usize,
    pub offset: f64,
}

/// Expand templates into occurrences using `timing_metadata` and `repeat_schedule`.
///
/// A template fires at its `schedule_offset` (0 when absent). Each repeat entry then adds
/// `repeat_count` firings spaced `repeat_offset` apart, continuing from the last firing.
/// Output is ordered by offset; ties keep template order. The timeline is materialized, so
/// batches should come through the batch loader, which caps `repeat_count`.
pub fn expand_schedule(batch: &[Event]) -> Vec<Occurrence> {
    let mut out = Vec::new();
    for (template_index, event) in batch.iter().enumerate() {
        let mut offset = event.schedule_offset();
        out.push(Occurrence {
            template_index,
            offset,
        });
        for entry in event.repeat_schedule.iter().flatten() {
            for _ in 0..entry.repeat_count {
                offset += entry.repeat_offset;
                out.push(Occurrence {
                    template_index,
                    offset,
                });
            }
        }
    }
    out.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    out
}

/// Number of firings for one template, without allocating the timeline.
pub fn occurrence_count(event: &Event) -> usize {
    event
        .repeat_schedule
        .iter()
        .flatten()
        .fold(1usize, |n, e| n.saturating_add(e.repeat_count as usize))
}

/// Number of firings for the whole batch.
pub fn total_occurrences(batch: &[Event]) -> usize {
    batch
        .iter()
        .fold(0usize, |n, e| n.saturating_add(occurrence_count(e)))
}

/// Offset of the final firing of one template.
pub fn last_offset(event: &Event) -> f64 {
    event
        .repeat_schedule
        .iter()
        .flatten()
        .fold(event.schedule_offset(), |at, e| {
            at + f64::from(e.repeat_count) * e.repeat_offset
        })
}

/// Offset of the final firing in the batch, 0 for an empty batch.
pub fn latest_offset(batch: &[Event]) -> f64 {
    batch.iter().map(last_offset).fold(0.0, f64::max)
}
