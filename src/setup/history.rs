//! Cleanout history.
//!
//! Activities finished before the simulation started, kept sorted by
//! descending finish time. Used as the left neighbor when the sequencing
//! state is uninitialized, and as the tail of trigger scans.

use serde::{Deserialize, Serialize};

use crate::models::{Block, CleanSpan, SequencedActivity, Tick};

/// One finished activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub activity: SequencedActivity,
    /// Production start.
    pub start: Tick,
    /// Finish.
    pub end: Tick,
    /// Quantity produced.
    pub quantity: f64,
    /// Cleanout performed before production.
    pub clean_before: Option<CleanSpan>,
    /// Cleanout performed after production.
    pub clean_after: Option<CleanSpan>,
}

/// Finished activities, most recent first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanoutHistory {
    records: Vec<HistoryRecord>,
}

impl CleanoutHistory {
    /// Creates a history, sorting records by descending finish.
    pub fn new(mut records: Vec<HistoryRecord>) -> Self {
        records.sort_by(|a, b| b.end.cmp(&a.end));
        Self { records }
    }

    /// Adds a record keeping the order.
    pub fn push(&mut self, record: HistoryRecord) {
        let at = self.records.partition_point(|r| r.end >= record.end);
        self.records.insert(at, record);
    }

    /// Most recent record finished at or before `clock`.
    pub fn latest_finished(&self, clock: Tick) -> Option<&HistoryRecord> {
        self.records.iter().find(|r| r.end <= clock)
    }

    /// Records finished at or before `tick`, most recent first.
    pub fn finished_by(&self, tick: Tick) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter().filter(move |r| r.end <= tick)
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Production summary a trigger scan walks over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerRecord {
    pub start: Tick,
    pub end: Tick,
    pub quantity: f64,
    pub clean_before: Option<CleanSpan>,
    pub clean_after: Option<CleanSpan>,
}

impl From<&Block> for TriggerRecord {
    fn from(block: &Block) -> Self {
        Self {
            start: block.production_start(),
            end: block.end,
            quantity: block.quantity,
            clean_before: block.clean_before,
            clean_after: block.clean_after,
        }
    }
}

impl From<&HistoryRecord> for TriggerRecord {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            start: record.start,
            end: record.end,
            quantity: record.quantity,
            clean_before: record.clean_before,
            clean_after: record.clean_after,
        }
    }
}
