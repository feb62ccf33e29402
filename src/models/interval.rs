//! Capacity interval model.
//!
//! A capacity interval is one slice of a resource's calendar: a shift,
//! a maintenance window, or an already-occupied span. Each interval carries
//! the constraints the capacity search must respect while walking it.
//!
//! # Precedence
//! An interval hosts a phase iff:
//! - it is `Online`, AND
//! - its `allowed_usages` contains the phase, AND
//! - its capacity code (if any) matches the requester's (if any), AND
//! - it is not late-only, unless the activity is already late.

use serde::{Deserialize, Serialize};

use super::Tick;

/// State of a capacity interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalType {
    /// Resource is working.
    Online,
    /// Resource is not working (night shift, holiday, maintenance).
    Offline,
    /// Resource time is taken by a committed block.
    Occupied,
}

/// One of the six segments of an activity's resource-time requirement.
///
/// Declaration order is chaining order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    CleanBefore,
    Setup,
    Run,
    PostProcessing,
    Storage,
    CleanAfter,
}

impl Phase {
    /// All phases in chaining order.
    pub const ALL: [Phase; 6] = [
        Phase::CleanBefore,
        Phase::Setup,
        Phase::Run,
        Phase::PostProcessing,
        Phase::Storage,
        Phase::CleanAfter,
    ];

    /// Whether this phase is a cleanout.
    #[inline]
    pub fn is_clean(self) -> bool {
        matches!(self, Phase::CleanBefore | Phase::CleanAfter)
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of phases, stored as a bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSet(u8);

impl PhaseSet {
    /// Every phase.
    pub const fn all() -> Self {
        Self(0b0011_1111)
    }

    /// No phase.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A set holding exactly the given phases.
    pub fn of(phases: &[Phase]) -> Self {
        phases.iter().fold(Self::empty(), |set, p| set.with(*p))
    }

    /// Both cleanout phases.
    pub fn cleaning() -> Self {
        Self::of(&[Phase::CleanBefore, Phase::CleanAfter])
    }

    /// Returns a copy with `phase` added.
    pub fn with(self, phase: Phase) -> Self {
        Self(self.0 | phase.bit())
    }

    /// Returns a copy with `phase` removed.
    pub fn without(self, phase: Phase) -> Self {
        Self(self.0 & !phase.bit())
    }

    #[inline]
    pub fn contains(&self, phase: Phase) -> bool {
        self.0 & phase.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Default for PhaseSet {
    fn default() -> Self {
        Self::all()
    }
}

/// A capacity interval `[start, end)` of a resource timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityInterval {
    /// Interval start (inclusive).
    pub start: Tick,
    /// Interval end (exclusive).
    pub end: Tick,
    /// Online, offline or occupied.
    pub interval_type: IntervalType,
    /// People multiplier available during this interval. Zero blocks the interval.
    pub people_capacity: f64,
    /// Optional group tag; must match the requester's tag when both are set.
    pub capacity_code: Option<String>,
    /// An activity may not begin in this interval and finish in another one.
    pub prevent_spanning: bool,
    /// Usable only by activities already running behind their target.
    pub use_only_when_late: bool,
    /// Whether a phase may begin inside this interval.
    pub can_start_activity: bool,
    /// Phases this interval may host.
    pub allowed_usages: PhaseSet,
    /// Crossing this interval resets sequence-dependent changeovers.
    pub clears_changeovers: bool,
    /// Cost per tick of resource time used in this interval.
    pub cost_rate: f64,
    /// Whether this interval is overtime.
    pub overtime: bool,
}

impl CapacityInterval {
    /// Creates an online interval with no restrictions.
    pub fn online(start: Tick, end: Tick) -> Self {
        Self {
            start,
            end,
            interval_type: IntervalType::Online,
            people_capacity: 1.0,
            capacity_code: None,
            prevent_spanning: false,
            use_only_when_late: false,
            can_start_activity: true,
            allowed_usages: PhaseSet::all(),
            clears_changeovers: false,
            cost_rate: 0.0,
            overtime: false,
        }
    }

    /// Creates an offline interval.
    pub fn offline(start: Tick, end: Tick) -> Self {
        Self {
            interval_type: IntervalType::Offline,
            ..Self::online(start, end)
        }
    }

    /// Creates an occupied interval.
    pub fn occupied(start: Tick, end: Tick) -> Self {
        Self {
            interval_type: IntervalType::Occupied,
            ..Self::online(start, end)
        }
    }

    /// Sets the people multiplier.
    pub fn with_people(mut self, people: f64) -> Self {
        self.people_capacity = people.max(0.0);
        self
    }

    /// Sets the capacity code.
    pub fn with_capacity_code(mut self, code: impl Into<String>) -> Self {
        self.capacity_code = Some(code.into());
        self
    }

    /// Forbids activities from spanning out of this interval.
    pub fn preventing_spanning(mut self) -> Self {
        self.prevent_spanning = true;
        self
    }

    /// Marks the interval usable only by late activities.
    pub fn late_only(mut self) -> Self {
        self.use_only_when_late = true;
        self
    }

    /// Forbids phases from beginning inside this interval.
    pub fn without_starts(mut self) -> Self {
        self.can_start_activity = false;
        self
    }

    /// Restricts the phases this interval may host.
    pub fn with_usages(mut self, usages: PhaseSet) -> Self {
        self.allowed_usages = usages;
        self
    }

    /// Marks the interval as resetting changeovers.
    pub fn clearing_changeovers(mut self) -> Self {
        self.clears_changeovers = true;
        self
    }

    /// Sets cost rate and overtime flag.
    pub fn with_cost(mut self, cost_rate: f64, overtime: bool) -> Self {
        self.cost_rate = cost_rate;
        self.overtime = overtime;
        self
    }

    /// Duration of the interval.
    #[inline]
    pub fn duration(&self) -> Tick {
        self.end - self.start
    }

    /// Whether the resource works during this interval.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.interval_type == IntervalType::Online
    }

    /// Whether a tick falls within this interval.
    #[inline]
    pub fn contains(&self, tick: Tick) -> bool {
        tick >= self.start && tick < self.end
    }

    /// Whether two intervals overlap.
    pub fn overlaps(&self, start: Tick, end: Tick) -> bool {
        self.start < end && start < self.end
    }

    /// Whether the interval's capacity code admits the requester's code.
    pub fn code_matches(&self, code: Option<&str>) -> bool {
        match (self.capacity_code.as_deref(), code) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => true,
        }
    }

    /// Returns a copy with new bounds and every other attribute kept.
    pub(crate) fn trimmed(&self, start: Tick, end: Tick) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_basics() {
        let iv = CapacityInterval::online(100, 200);
        assert_eq!(iv.duration(), 100);
        assert!(iv.contains(100));
        assert!(iv.contains(199));
        assert!(!iv.contains(200)); // exclusive end
        assert!(iv.is_active());
        assert!(!CapacityInterval::offline(0, 1).is_active());
        assert!(!CapacityInterval::occupied(0, 1).is_active());
    }

    #[test]
    fn test_interval_overlap() {
        let iv = CapacityInterval::online(0, 100);
        assert!(iv.overlaps(50, 150));
        assert!(!iv.overlaps(100, 200)); // touching
    }

    #[test]
    fn test_code_matching() {
        let tagged = CapacityInterval::online(0, 10).with_capacity_code("A");
        let plain = CapacityInterval::online(0, 10);
        assert!(tagged.code_matches(Some("A")));
        assert!(!tagged.code_matches(Some("B")));
        assert!(tagged.code_matches(None));
        assert!(plain.code_matches(Some("B")));
    }

    #[test]
    fn test_phase_set() {
        let set = PhaseSet::cleaning();
        assert!(set.contains(Phase::CleanBefore));
        assert!(set.contains(Phase::CleanAfter));
        assert!(!set.contains(Phase::Run));

        let no_run = PhaseSet::all().without(Phase::Run);
        assert!(!no_run.contains(Phase::Run));
        assert!(no_run.contains(Phase::Setup));
        assert!(PhaseSet::empty().is_empty());
    }

    #[test]
    fn test_phase_order() {
        assert!(Phase::CleanBefore < Phase::Setup);
        assert!(Phase::Storage < Phase::CleanAfter);
        assert!(Phase::CleanAfter.is_clean());
        assert!(!Phase::Run.is_clean());
    }

    #[test]
    fn test_people_never_negative() {
        let iv = CapacityInterval::online(0, 10).with_people(-2.0);
        assert_eq!(iv.people_capacity, 0.0);
    }
}
