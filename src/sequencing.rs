//! Per-resource sequencing state.
//!
//! Tracks the left neighbor (most recent committed or finished activity)
//! used for sequence-dependent setup and cleanout, the counter of
//! activities scheduled since changeover codes were last cleared, and the
//! sawtooth dispatch heuristic.
//!
//! # Sawtooth
//!
//! Sawtooth sequencing prefers consecutive setup numbers moving in one
//! direction. [`SequencingState::sawtooth_score`] returns the step distance
//! for a move in the preferred direction and a large penalty plus a
//! restart distance otherwise. Lower is better.

use serde::{Deserialize, Serialize};

use crate::models::{Block, CleanSpan, SequencedActivity, Tick};

/// Penalty for moving against the sawtooth direction.
pub const SAWTOOTH_WRAP_PENALTY: f64 = 1.0e9;

/// Read-only view of the left neighbor as of some clock value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequencingSnapshot {
    /// Left neighbor, if any.
    pub activity: Option<SequencedActivity>,
    /// When the left neighbor finished.
    pub end: Tick,
    /// Cleanout scheduled after the left neighbor.
    pub clean_after: Option<CleanSpan>,
    /// False when no prior activity is known on the resource.
    pub initialized: bool,
}

impl SequencingSnapshot {
    /// No prior activity.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// Snapshot of a committed block.
    pub fn of_block(block: &Block) -> Self {
        Self {
            activity: Some(block.activity.clone()),
            end: block.end,
            clean_after: block.clean_after,
            initialized: true,
        }
    }
}

/// Sawtooth direction preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sawtooth {
    /// Setup numbers should rise, then restart from the lowest.
    Ascending,
    /// Setup numbers should fall, then restart from the highest.
    Descending,
    /// Rise then fall then rise.
    Alternating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Mutable sequencing state of one resource.
#[derive(Debug, Clone)]
pub struct SequencingState {
    last: SequencingSnapshot,
    direction: Direction,
    since_codes_cleared: u32,
}

impl Default for SequencingState {
    fn default() -> Self {
        Self {
            last: SequencingSnapshot::uninitialized(),
            direction: Direction::Up,
            since_codes_cleared: 0,
        }
    }
}

impl SequencingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Left neighbor of the next activity to be appended.
    pub fn last(&self) -> &SequencingSnapshot {
        &self.last
    }

    /// Activities scheduled since changeover codes were last cleared.
    pub fn since_codes_cleared(&self) -> u32 {
        self.since_codes_cleared
    }

    /// Records a newly committed block as the left neighbor.
    ///
    /// `count_codes` is set for single-tasking resources; `cleared` when
    /// changeover codes were reset before the block.
    pub(crate) fn record(&mut self, block: &Block, count_codes: bool, cleared: bool) {
        if let Some(prev) = self.last.activity.as_ref() {
            let next = block.activity.setup_number;
            if next > prev.setup_number {
                self.direction = Direction::Up;
            } else if next < prev.setup_number {
                self.direction = Direction::Down;
            }
        }
        self.count_scheduled(count_codes, cleared);
        self.last = SequencingSnapshot::of_block(block);
    }

    /// Counts a committed block without making it the left neighbor.
    pub(crate) fn count_scheduled(&mut self, count_codes: bool, cleared: bool) {
        if count_codes {
            if cleared {
                self.since_codes_cleared = 0;
            }
            self.since_codes_cleared += 1;
        }
    }

    /// Replaces the left neighbor after a block was removed.
    pub(crate) fn rewind(&mut self, snapshot: SequencingSnapshot, count_codes: bool) {
        self.last = snapshot;
        if count_codes {
            self.since_codes_cleared = self.since_codes_cleared.saturating_sub(1);
        }
    }

    /// Scores a candidate setup number; lower is preferred.
    ///
    /// With no left neighbor every candidate scores its own restart distance.
    pub fn sawtooth_score(&self, mode: Sawtooth, setup_number: f64) -> f64 {
        let Some(prev) = self.last.activity.as_ref().map(|a| a.setup_number) else {
            return match mode {
                Sawtooth::Descending => -setup_number,
                _ => setup_number,
            };
        };
        let step = setup_number - prev;
        let rising = match mode {
            Sawtooth::Ascending => true,
            Sawtooth::Descending => false,
            Sawtooth::Alternating => self.direction == Direction::Up,
        };
        match (rising, step >= 0.0, mode) {
            (true, true, _) => step,
            (false, false, _) => -step,
            (true, false, Sawtooth::Ascending) => SAWTOOTH_WRAP_PENALTY + setup_number,
            (false, true, Sawtooth::Descending) => SAWTOOTH_WRAP_PENALTY - setup_number,
            // Alternating turns around: the closest candidate is the best turn.
            _ => SAWTOOTH_WRAP_PENALTY + step.abs(),
        }
    }
}
