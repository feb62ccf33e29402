//! Per-resource simulation state and its lifecycle.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::blocks::BlockList;
use crate::config::EngineConfig;
use crate::error::{CapacityError, CapacityResult};
use crate::models::{Block, BlockId, Resource, Tick};
use crate::reservation::ReservationTable;
use crate::sequencing::{Sawtooth, SequencingSnapshot, SequencingState};
use crate::setup::CleanoutHistory;
use crate::timeline::{rebuild, CapacityTimeline};
use crate::validation::validate_resource;

/// Lifecycle of a resource across a simulation pass.
///
/// ```text
/// Uninitialized ──initialize──▶ Initialized ──finalize──▶ Finalized
///                                  ▲                          │
///                                  └────────initialize────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    Finalized,
}

/// Everything one resource owns during a simulation pass.
///
/// Searches borrow the state immutably; only committing
/// ([`schedule`](Self::schedule), [`unschedule`](Self::unschedule)) and
/// reservation edits borrow it mutably.
#[derive(Debug, Clone)]
pub struct ResourceSimulationState {
    pub(super) resource: Resource,
    pub(super) config: EngineConfig,
    pub(super) base: CapacityTimeline,
    pub(super) timeline: CapacityTimeline,
    pub(super) blocks: BlockList,
    pub(super) reservations: ReservationTable,
    pub(super) sequencing: SequencingState,
    pub(super) history: CleanoutHistory,
    pub(super) lifecycle: Lifecycle,
    pub(super) next_block_id: u64,
    pub(super) time_triggers_seeded: bool,
}

impl ResourceSimulationState {
    /// Creates an uninitialized state over a static capacity profile.
    pub fn new(resource: Resource, base: CapacityTimeline, config: EngineConfig) -> Self {
        let base = base.with_walk_limit(config.hint_walk_limit);
        Self {
            timeline: base.clone(),
            reservations: ReservationTable::new(config.max_delay_enforcement),
            resource,
            config,
            base,
            blocks: BlockList::new(),
            sequencing: SequencingState::new(),
            history: CleanoutHistory::default(),
            lifecycle: Lifecycle::Uninitialized,
            next_block_id: 1,
            time_triggers_seeded: false,
        }
    }

    /// Sets the activities finished before the simulation.
    pub fn with_history(mut self, history: CleanoutHistory) -> Self {
        self.history = history;
        self
    }

    /// Starts a simulation pass.
    ///
    /// `frozen` blocks are committed as-is: they become the initial block
    /// list and, on a single-tasking resource, `Occupied` intervals of the
    /// timeline. Reservations and sequencing are reset.
    ///
    /// # Errors
    /// - [`CapacityError::Lifecycle`] if a pass is already running
    /// - [`CapacityError::InvalidResource`] if the resource configuration
    ///   fails validation
    /// - [`CapacityError::OverlappingOccupancy`] if frozen blocks overlap on
    ///   a single-tasking resource
    pub fn initialize(&mut self, frozen: Vec<Block>) -> CapacityResult<()> {
        if self.lifecycle == Lifecycle::Initialized {
            warn!(resource = %self.resource.id, "initialize called twice");
            return Err(CapacityError::Lifecycle {
                expected: Lifecycle::Uninitialized,
                actual: self.lifecycle,
            });
        }
        if let Err(errors) = validate_resource(&self.resource) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            warn!(resource = %self.resource.id, problems = messages.len(), "invalid resource configuration");
            return Err(CapacityError::InvalidResource(messages.join("; ")));
        }
        let blocks = BlockList::from_blocks(frozen);
        self.timeline = if self.resource.capacity_type.is_exclusive() {
            rebuild(&self.base, &blocks.spans())?
        } else {
            self.base.clone()
        };
        self.reservations = ReservationTable::new(self.config.max_delay_enforcement);
        self.sequencing = SequencingState::new();
        let exclusive = self.resource.capacity_type.is_exclusive();
        for b in blocks.iter() {
            self.sequencing.record(b, exclusive, false);
        }
        self.next_block_id = blocks.iter().map(|b| b.id.0 + 1).max().unwrap_or(1);
        self.blocks = blocks;
        self.time_triggers_seeded = false;
        self.lifecycle = Lifecycle::Initialized;
        info!(resource = %self.resource.id, frozen = self.blocks.len(), "resource initialized");
        Ok(())
    }

    /// Ends the simulation pass. Blocks stay readable.
    pub fn finalize(&mut self) -> CapacityResult<()> {
        self.ensure(Lifecycle::Initialized)?;
        self.lifecycle = Lifecycle::Finalized;
        info!(resource = %self.resource.id, blocks = self.blocks.len(), "resource finalized");
        Ok(())
    }

    pub(super) fn ensure(&self, expected: Lifecycle) -> CapacityResult<()> {
        if self.lifecycle == expected {
            Ok(())
        } else {
            warn!(resource = %self.resource.id, ?expected, actual = ?self.lifecycle, "lifecycle violation");
            Err(CapacityError::Lifecycle {
                expected,
                actual: self.lifecycle,
            })
        }
    }

    pub(super) fn allocate_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        id
    }

    /// Left neighbor of an activity starting at `start`.
    ///
    /// Uninitialized when nothing committed finishes by `start`; the
    /// required-capacity calculation then falls back to the history.
    pub fn left_neighbor(&self, start: Tick) -> SequencingSnapshot {
        self.blocks
            .preceding(start)
            .map_or_else(SequencingSnapshot::uninitialized, SequencingSnapshot::of_block)
    }

    /// Sawtooth score of a candidate setup number; lower is preferred.
    pub fn sawtooth_score(&self, mode: Sawtooth, setup_number: f64) -> f64 {
        self.sequencing.sawtooth_score(mode, setup_number)
    }

    /// Reservation table, for edits during a pass.
    pub fn reservations_mut(&mut self) -> CapacityResult<&mut ReservationTable> {
        self.ensure(Lifecycle::Initialized)?;
        Ok(&mut self.reservations)
    }

    pub fn reservations(&self) -> &ReservationTable {
        &self.reservations
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Static capacity profile.
    pub fn base_timeline(&self) -> &CapacityTimeline {
        &self.base
    }

    /// Current timeline, with committed blocks merged in on single-tasking resources.
    pub fn timeline(&self) -> &CapacityTimeline {
        &self.timeline
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Most recently scheduled block.
    pub fn last_scheduled(&self) -> Option<&Block> {
        self.blocks.last_scheduled()
    }

    pub fn sequencing(&self) -> &SequencingState {
        &self.sequencing
    }

    pub fn history(&self) -> &CleanoutHistory {
        &self.history
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }
}
