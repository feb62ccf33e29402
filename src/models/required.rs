//! Required-capacity model.
//!
//! An activity needs six spans of resource time on a candidate resource:
//! clean-before, setup, processing, post-processing, storage, clean-after.
//! Each span knows whether it has already been overrun (reported progress
//! exceeded the standard) and what it costs.

use serde::{Deserialize, Serialize};

use super::{Phase, Tick};

/// Which rule produced a cleanout or setup contribution.
///
/// Determines the cost bucket the contribution is booked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanSource {
    /// Resource-level standard clean/setup.
    Resource,
    /// Product or operation change.
    Production,
    /// Attribute changeover table.
    SequenceAttribute,
    /// Elapsed-time trigger.
    TimeTrigger,
    /// Operation-count trigger.
    OperationCountTrigger,
    /// Produced-quantity trigger.
    ProductionUnitTrigger,
}

/// A graded cleanout (or setup) contribution.
///
/// Higher grade supersedes lower grade; on a tie the longer span wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanSpan {
    /// Duration in ticks.
    pub ticks: Tick,
    /// Priority ranking among competing rules.
    pub grade: u32,
    /// Static cost of performing it.
    pub cost: f64,
    /// Rule that produced it.
    pub source: CleanSource,
}

impl CleanSpan {
    /// Creates a cleanout contribution.
    pub fn new(ticks: Tick, grade: u32, source: CleanSource) -> Self {
        Self {
            ticks,
            grade,
            cost: 0.0,
            source,
        }
    }

    /// Sets the static cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Keeps the higher-grade span; on a grade tie, the longer one.
    ///
    /// Never decreases the grade, and never decreases the duration for
    /// equal grades.
    pub fn merge(self, other: CleanSpan) -> CleanSpan {
        if other.grade > self.grade || (other.grade == self.grade && other.ticks > self.ticks) {
            other
        } else {
            self
        }
    }

    /// Merges an optional contribution into an optional accumulator.
    pub fn merge_opt(acc: Option<CleanSpan>, next: Option<CleanSpan>) -> Option<CleanSpan> {
        match (acc, next) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/// Static cost breakdown of a required span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanCost {
    /// Cost caused by sequence (attribute changeovers).
    pub sequence: f64,
    /// Cost caused by production (product/operation changes, run time).
    pub production: f64,
    /// Cost caused by the resource's own rules and rates.
    pub resource: f64,
}

impl SpanCost {
    /// Sum of all buckets.
    pub fn total(&self) -> f64 {
        self.sequence + self.production + self.resource
    }

    /// Books `amount` under the bucket matching `source`.
    pub fn add(&mut self, source: CleanSource, amount: f64) {
        match source {
            CleanSource::SequenceAttribute => self.sequence += amount,
            CleanSource::Production => self.production += amount,
            CleanSource::Resource
            | CleanSource::TimeTrigger
            | CleanSource::OperationCountTrigger
            | CleanSource::ProductionUnitTrigger => self.resource += amount,
        }
    }
}

/// Remaining resource time for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredSpan {
    /// Remaining ticks.
    pub ticks: Tick,
    /// Reported progress already exceeded the standard: zero remains and
    /// the time is already incurred.
    pub overrun: bool,
    /// Static cost breakdown.
    pub cost: SpanCost,
}

impl RequiredSpan {
    /// A span of `ticks` with no cost.
    pub fn new(ticks: Tick) -> Self {
        Self {
            ticks,
            overrun: false,
            cost: SpanCost::default(),
        }
    }

    /// A span already exceeded by reported progress.
    pub fn overrun() -> Self {
        Self {
            ticks: 0,
            overrun: true,
            cost: SpanCost::default(),
        }
    }

    /// Reduces `standard` by reported partial progress.
    ///
    /// Never goes below zero; reaching or passing the standard while the
    /// phase is still in progress marks the span as overrun.
    pub fn remaining(standard: Tick, reported: Tick, in_progress: bool) -> Self {
        if !in_progress || reported <= 0 {
            return Self::new(standard.max(0));
        }
        if reported >= standard {
            Self::overrun()
        } else {
            Self::new(standard - reported)
        }
    }

    /// Sets the cost breakdown.
    pub fn with_cost(mut self, cost: SpanCost) -> Self {
        self.cost = cost;
        self
    }

    /// Whether any time remains to be scheduled.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.ticks == 0
    }
}

/// All spans an activity needs on one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredCapacity {
    pub clean_before: RequiredSpan,
    pub setup: RequiredSpan,
    pub processing: RequiredSpan,
    pub post_processing: RequiredSpan,
    pub storage: RequiredSpan,
    pub clean_after: RequiredSpan,
    /// Winning clean-before contribution before partial progress was applied.
    pub clean_before_rule: Option<CleanSpan>,
    /// Grade of the clean-after.
    #[serde(default)]
    pub clean_after_grade: u32,
    /// Remaining cycles to run.
    pub cycles: u32,
    /// Remaining quantity to produce.
    pub quantity: f64,
}

impl RequiredCapacity {
    /// Span for a phase.
    pub fn span(&self, phase: Phase) -> &RequiredSpan {
        match phase {
            Phase::CleanBefore => &self.clean_before,
            Phase::Setup => &self.setup,
            Phase::Run => &self.processing,
            Phase::PostProcessing => &self.post_processing,
            Phase::Storage => &self.storage,
            Phase::CleanAfter => &self.clean_after,
        }
    }

    /// Mutable span for a phase.
    pub fn span_mut(&mut self, phase: Phase) -> &mut RequiredSpan {
        match phase {
            Phase::CleanBefore => &mut self.clean_before,
            Phase::Setup => &mut self.setup,
            Phase::Run => &mut self.processing,
            Phase::PostProcessing => &mut self.post_processing,
            Phase::Storage => &mut self.storage,
            Phase::CleanAfter => &mut self.clean_after,
        }
    }

    /// Sum of all remaining ticks.
    pub fn total_ticks(&self) -> Tick {
        Phase::ALL.iter().map(|p| self.span(*p).ticks).sum()
    }

    /// Sum of all static costs.
    pub fn total_cost(&self) -> f64 {
        Phase::ALL.iter().map(|p| self.span(*p).cost.total()).sum()
    }

    /// The clean-before span as a graded cleanout, if one is required.
    pub fn clean_before_span(&self) -> Option<CleanSpan> {
        if self.clean_before.ticks <= 0 {
            return None;
        }
        self.clean_before_rule.map(|rule| CleanSpan {
            ticks: self.clean_before.ticks,
            ..rule
        })
    }

    /// The clean-after span as a graded cleanout, if one is required.
    pub fn clean_after_span(&self) -> Option<CleanSpan> {
        (self.clean_after.ticks > 0)
            .then(|| CleanSpan::new(self.clean_after.ticks, self.clean_after_grade, CleanSource::Production))
    }
}
