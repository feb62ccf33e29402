//! Required-capacity and setup/cleanout calculation.
//!
//! Computes the six phase spans an activity needs on one resource:
//!
//! | Phase | Source |
//! |-------|--------|
//! | Clean-before | Merged graded cleanout contributors ([`cleanout`]) |
//! | Setup | Resource, operation and attribute changeover setup |
//! | Run | `cycles × cycle` |
//! | Post-processing, storage, clean-after | Standard times |
//!
//! Partial progress reported on the currently running activity reduces
//! the span of the phase in progress (never below zero) and zeroes the
//! phases already completed.
//!
//! # Left Neighbor
//!
//! Sequence-dependent contributors need the previous activity. An
//! uninitialized [`SequencingSnapshot`] falls back to the most recent
//! history record finished by the clock. A changeover-clearing interval
//! between the neighbor's finish and the candidate start drops the
//! neighbor.
//!
//! # Reference
//! Allahverdi et al. (2008), "A survey of scheduling problems with setup
//! times or costs", EJOR 187(3)

mod cleanout;
pub mod history;
pub mod triggers;

pub use history::{CleanoutHistory, HistoryRecord, TriggerRecord};

use tracing::debug;

use crate::config::{EngineConfig, SetupMergeMode};
use crate::error::{CapacityError, CapacityResult};
use crate::models::{
    Activity, Block, CleanSource, CleanSpan, Phase, ProductionStatus, RequiredCapacity,
    RequiredSpan, Resource, SequencedActivity, SpanCost, Tick,
};
use crate::sequencing::SequencingSnapshot;
use crate::timeline::CapacityTimeline;
use cleanout::CleanoutInputs;

/// Computes required capacity against one resource's current state.
#[derive(Debug, Clone, Copy)]
pub struct RequiredCapacityCalculator<'a> {
    resource: &'a Resource,
    config: &'a EngineConfig,
    timeline: &'a CapacityTimeline,
    /// Committed blocks in time order.
    blocks: &'a [Block],
    history: &'a CleanoutHistory,
}

/// Resolved left neighbor.
struct Neighbor<'a> {
    activity: Option<&'a SequencedActivity>,
    clean_after: Option<CleanSpan>,
}

impl<'a> RequiredCapacityCalculator<'a> {
    pub fn new(
        resource: &'a Resource,
        config: &'a EngineConfig,
        timeline: &'a CapacityTimeline,
        blocks: &'a [Block],
        history: &'a CleanoutHistory,
    ) -> Self {
        Self {
            resource,
            config,
            timeline,
            blocks,
            history,
        }
    }

    /// Required capacity of `activity` starting at `start` after `left`.
    ///
    /// # Errors
    /// [`CapacityError::NegativeRequirement`] if a standard time is negative.
    pub fn compute(
        &self,
        activity: &Activity,
        left: &SequencingSnapshot,
        start: Tick,
        clock: Tick,
    ) -> CapacityResult<RequiredCapacity> {
        check_times(activity)?;

        let neighbor = self.neighbor(left, start, clock);
        let changeover = neighbor
            .activity
            .map(|n| self.resource.changeovers.evaluate(&n.attributes, &activity.attributes))
            .unwrap_or_default();
        let records = self.trigger_records(start);

        let clean = cleanout::clean_before(&CleanoutInputs {
            resource: self.resource,
            activity,
            neighbor: neighbor.activity,
            changeover: &changeover,
            records: &records,
            start,
        })
        .filter(|c| !neighbor.clean_after.is_some_and(|done| done.grade >= c.grade));

        let times = &activity.times;
        let progress = &activity.progress;

        let mut clean_before = phase_span(activity, clean.map_or(0, |c| c.ticks), progress.clean, ProductionStatus::Cleaning);
        if let Some(c) = clean.filter(|_| clean_before.ticks > 0) {
            clean_before.cost.add(c.source, c.cost);
        }

        let (setup_ticks, setup_cost) = self.setup(activity, neighbor.activity, changeover.setup, changeover.cost);
        let setup = phase_span(activity, setup_ticks, progress.setup, ProductionStatus::SettingUp);
        let setup = if setup.ticks > 0 { setup.with_cost(setup_cost) } else { setup };

        let processing = phase_span(activity, times.run_ticks(), progress.run, ProductionStatus::Running);
        let post_processing = phase_span(
            activity,
            times.post_processing,
            progress.post_processing,
            ProductionStatus::PostProcessing,
        );
        let storage = phase_span(activity, times.storage, progress.storage, ProductionStatus::Storing);
        let clean_after = if activity.status == ProductionStatus::Finished {
            RequiredSpan::new(0)
        } else {
            RequiredSpan::new(times.clean_after)
        };

        let cycles = if activity.status >= ProductionStatus::Running {
            times.cycles.saturating_sub(progress.cycles)
        } else {
            times.cycles
        };

        let required = RequiredCapacity {
            clean_before,
            setup,
            processing,
            post_processing,
            storage,
            clean_after,
            clean_before_rule: clean,
            clean_after_grade: times.clean_after_grade,
            cycles,
            quantity: cycles as f64 * times.quantity_per_cycle,
        };
        debug!(
            activity = %activity.id,
            resource = %self.resource.id,
            start,
            total = required.total_ticks(),
            "required capacity computed"
        );
        Ok(required)
    }

    fn neighbor<'s>(&'s self, left: &'s SequencingSnapshot, start: Tick, clock: Tick) -> Neighbor<'s> {
        let (activity, end, clean_after) = if left.initialized {
            (left.activity.as_ref(), left.end, left.clean_after)
        } else if let Some(r) = self.history.latest_finished(clock) {
            (Some(&r.activity), r.end, r.clean_after)
        } else {
            (None, start, None)
        };
        let cleared = activity.is_some() && self.timeline.clears_changeovers_between(end, start);
        if cleared {
            debug!(end, start, "changeovers cleared since left neighbor");
        }
        Neighbor {
            activity: activity.filter(|_| !cleared),
            clean_after,
        }
    }

    /// Preceding production, most recent first: blocks, then older history.
    fn trigger_records(&self, start: Tick) -> Vec<TriggerRecord> {
        let floor = self.blocks.first().map_or(start, |b| b.start.min(start));
        self.blocks
            .iter()
            .rev()
            .filter(|b| b.end <= start)
            .map(TriggerRecord::from)
            .chain(self.history.finished_by(floor).map(TriggerRecord::from))
            .collect()
    }

    fn setup(
        &self,
        activity: &Activity,
        neighbor: Option<&SequencedActivity>,
        sequence_setup: Tick,
        sequence_cost: f64,
    ) -> (Tick, SpanCost) {
        let cfg = &self.resource.setup;
        let same_code = matches!(
            (neighbor.and_then(|n| n.setup_code.as_deref()), activity.setup_code.as_deref()),
            (Some(a), Some(b)) if a == b
        );

        let mut parts: Vec<(Tick, CleanSource, f64)> = Vec::with_capacity(3);
        if cfg.use_resource_setup && cfg.standard > 0 {
            parts.push((cfg.standard, CleanSource::Resource, cfg.standard_cost));
        }
        if cfg.use_operation_setup && !same_code && activity.times.setup > 0 {
            parts.push((activity.times.setup, CleanSource::Production, 0.0));
        }
        if cfg.use_sequence_setup && sequence_setup > 0 {
            parts.push((sequence_setup, CleanSource::SequenceAttribute, sequence_cost));
        }

        let mut cost = SpanCost::default();
        match self.config.setup_merge {
            SetupMergeMode::Largest => {
                let winner = parts
                    .iter()
                    .fold(None::<&(Tick, CleanSource, f64)>, |best, p| match best {
                        Some(b) if b.0 >= p.0 => Some(b),
                        _ => Some(p),
                    });
                match winner {
                    Some(&(ticks, source, c)) => {
                        cost.add(source, c);
                        (ticks, cost)
                    }
                    None => (0, cost),
                }
            }
            SetupMergeMode::Additive => {
                let ticks = parts.iter().map(|p| p.0).sum();
                for &(_, source, c) in &parts {
                    cost.add(source, c);
                }
                (ticks, cost)
            }
        }
    }
}

/// Span of a phase given the activity's status and reported progress.
fn phase_span(activity: &Activity, standard: Tick, reported: Tick, phase_status: ProductionStatus) -> RequiredSpan {
    if !activity.is_running() || activity.status < phase_status {
        RequiredSpan::new(standard)
    } else if activity.status == phase_status {
        RequiredSpan::remaining(standard, reported, true)
    } else {
        RequiredSpan::new(0)
    }
}

fn check_times(activity: &Activity) -> CapacityResult<()> {
    let t = &activity.times;
    let checks = [
        (Phase::Setup, t.setup),
        (Phase::Run, t.cycle),
        (Phase::PostProcessing, t.post_processing),
        (Phase::Storage, t.storage),
        (Phase::CleanAfter, t.clean_after),
    ];
    for (phase, ticks) in checks {
        if ticks < 0 {
            return Err(CapacityError::NegativeRequirement { phase, ticks });
        }
    }
    Ok(())
}
