//! Committed block model.
//!
//! A block is resource time committed to one resource requirement of one
//! activity. Blocks are created only by the block scheduler and removed
//! only by an explicit unschedule.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{CleanSpan, Phase, RequiredCapacity, Tick, UsageProfile};

/// Opaque block handle, unique within one resource state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

/// Sequencing-relevant summary of an activity.
///
/// Blocks and history records carry this instead of a reference to the
/// activity itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedActivity {
    pub activity_id: String,
    pub job_id: String,
    pub product: String,
    pub batch_id: Option<String>,
    pub setup_code: Option<String>,
    pub setup_number: f64,
    pub attributes: HashMap<String, String>,
}

/// Resource time committed to an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Block handle.
    pub id: BlockId,
    /// Activity this block serves.
    pub activity: SequencedActivity,
    /// Index of the resource requirement served.
    pub requirement_index: usize,
    /// Block start (inclusive).
    pub start: Tick,
    /// Block end (exclusive).
    pub end: Tick,
    /// Resource time actually used, phase by phase.
    pub profile: UsageProfile,
    /// Required capacity the block was searched with.
    pub required: RequiredCapacity,
    /// Attention consumed on a multitasking resource.
    pub attention_percent: u32,
    /// Cleanout performed before production.
    pub clean_before: Option<CleanSpan>,
    /// Cleanout performed after production, including any merged in from
    /// the next block of the same batch.
    pub clean_after: Option<CleanSpan>,
    /// Quantity produced.
    pub quantity: f64,
}

impl Block {
    /// Elapsed time of the block.
    #[inline]
    pub fn duration(&self) -> Tick {
        self.end - self.start
    }

    /// Whether the block intersects `[start, end)`.
    pub fn overlaps(&self, start: Tick, end: Tick) -> bool {
        self.start < end && start < self.end
    }

    /// Resource time the block actually holds.
    ///
    /// A pausable block skips over time held by others, so only its usage
    /// segments are occupied. Blocks without a recorded profile hold their
    /// whole span.
    pub fn occupied_spans(&self) -> Vec<(Tick, Tick)> {
        let spans = self.profile.spans();
        if spans.is_empty() && self.start < self.end {
            vec![(self.start, self.end)]
        } else {
            spans
        }
    }

    /// Start of the first non-cleanout segment.
    pub fn production_start(&self) -> Tick {
        self.profile
            .segments()
            .iter()
            .find(|s| !s.phase.is_clean())
            .map_or(self.start, |s| s.start)
    }

    /// Elapsed run time.
    pub fn run_ticks(&self) -> Tick {
        self.profile.phase_segments(Phase::Run).map(|s| s.duration()).sum()
    }

    /// Whether the block belongs to the given batch.
    pub fn in_batch(&self, batch_id: Option<&str>) -> bool {
        matches!((self.activity.batch_id.as_deref(), batch_id), (Some(a), Some(b)) if a == b)
    }
}
