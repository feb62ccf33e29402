//! Block scheduler and per-resource simulation state.
//!
//! A [`ResourceSimulationState`] owns everything one resource needs during
//! a simulation pass: its static capacity profile, the current timeline,
//! the committed block list, the reservation table, the sequencing state
//! and the cleanout history.
//!
//! # Entry points
//!
//! | Operation | Borrow | Purpose |
//! |-----------|--------|---------|
//! | [`compute_required_capacity`](ResourceSimulationState::compute_required_capacity) | `&self` | Phase spans of an activity |
//! | [`find_schedulable_window`](ResourceSimulationState::find_schedulable_window) | `&self` | Earliest admissible window |
//! | [`find_window_reverse`](ResourceSimulationState::find_window_reverse) | `&self` | Latest window finishing by a tick |
//! | [`schedule`](ResourceSimulationState::schedule) | `&mut self` | Commit a window as a block |
//! | [`unschedule`](ResourceSimulationState::unschedule) | `&mut self` | Remove a block |
//!
//! Searches never mutate; a failed search leaves nothing to roll back.
//! Retry ticks are returned as data or raised through an [`EventSink`].
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4

mod blocks;
mod collaborators;
mod engine;
mod state;

pub use blocks::BlockList;
pub use collaborators::{
    EventSink, MaterialAllocator, NoCustomization, RetryCause, RetryEvent, ScheduleCustomization,
    UnconstrainedMaterials, Verdict,
};
pub use engine::{SearchContext, WindowSearch};
pub use state::{Lifecycle, ResourceSimulationState};
