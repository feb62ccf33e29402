//! Fatal contract violations.
//!
//! Scheduling outcomes (lack of capacity, occupied time, reservation
//! conflicts) are values, see [`crate::search::SearchResult`]. The errors
//! here mean the resource is misconfigured or the caller broke a contract,
//! and the scheduling attempt for the resource must be abandoned.

use thiserror::Error;

use crate::models::{BlockId, Phase, Tick};
use crate::scheduler::Lifecycle;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapacityError {
    #[error("capacity timeline has no coverage at tick {0}")]
    NoCoverage(Tick),

    #[error("capacity interval [{start}, {end}) has no duration")]
    EmptyInterval { start: Tick, end: Tick },

    #[error("capacity intervals are not contiguous: {previous_end} then {next_start}")]
    Discontiguous { previous_end: Tick, next_start: Tick },

    #[error("negative required capacity for {phase:?}: {ticks}")]
    NegativeRequirement { phase: Phase, ticks: Tick },

    #[error("occupied span [{start}, {end}) overlaps another occupied span")]
    OverlappingOccupancy { start: Tick, end: Tick },

    #[error("operation requires {expected:?} state, resource is {actual:?}")]
    Lifecycle { expected: Lifecycle, actual: Lifecycle },

    #[error("unknown block {0:?}")]
    UnknownBlock(BlockId),

    #[error("activity has no resource requirement {0}")]
    UnknownRequirement(usize),

    #[error("invalid resource configuration: {0}")]
    InvalidResource(String),
}

pub type CapacityResult<T> = Result<T, CapacityError>;
