//! Capacity search engine.
//!
//! Walks a [`CapacityTimeline`](crate::timeline::CapacityTimeline) to find
//! resource time satisfying a requested duration of one phase.
//!
//! # Algorithms
//!
//! | Function | Direction | Use |
//! |----------|-----------|-----|
//! | [`find_forward`] | start → finish | Normal forward scheduling |
//! | [`find_backward`] | finish → start | Back-calculating a start (JIT, buffers) |
//! | [`find_chain`] | forward, phase by phase | All six phases of an activity |
//! | [`find_chain_reverse`] | backward, phase by phase | Reverse of `find_chain` |
//!
//! # Outcomes
//!
//! Searches never mutate anything. Failing to find capacity is a value
//! ([`SearchResult::Failure`]) with a [`ReasonCode`] and an optional retry
//! tick for the outer event loop. Only contract violations (no coverage,
//! negative durations) are `Err`.

mod backward;
mod chain;
mod forward;
pub mod people;

pub use backward::find_backward;
pub use chain::{find_chain, find_chain_reverse, ChainRequest};
pub use forward::find_forward;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{CapacityInterval, PeopleRule, Phase, Tick, UsageProfile};
use crate::timeline::Cursor;

/// Why a search or admission check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    /// Timeline ran out before the duration was satisfied.
    LackCapacity,
    /// A prevent-spanning interval could not hold the duration; retry later.
    LackCapacityWithRetry,
    /// The activity would have to pause and may not.
    CanPause,
    /// Resource time is taken by a committed block.
    Occupied,
    /// The activity would start in an interval it cannot use.
    HitCleanoutInterval,
    /// A cleanout would span out of a prevent-spanning interval.
    FailedDueToCleanBeforeSpan,
    /// Another activity holds a block reservation on the window.
    IntersectsBlockReservation,
    /// The window intersects the move reservation.
    IntersectsReservedMoveDate,
    /// Not enough attention left on a multitasking resource.
    AttentionNotAvailable,
    /// Requirements of the same activity together exceed the attention limit.
    AttentionConflictBetweenMultipleRRs,
    /// A material cannot be allocated.
    MaterialUnavailable,
    /// No storage available for the output.
    StorageUnavailable,
    /// Vetoed by a schedule customization.
    Customization,
    /// Activity is locked to a different resource.
    LockedToResUnavail,
    /// Resource time is reserved for another requirement.
    ReservedForResReq,
}

/// A window satisfying the requested duration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSuccess {
    /// First tick of resource time used.
    pub start: Tick,
    /// End of the last segment.
    pub finish: Tick,
    /// Resource time used.
    pub profile: UsageProfile,
    /// Last interval touched, for use as the next hint.
    pub cursor: Option<Cursor>,
    /// Whether a late-only interval was passed over.
    pub skipped_late_only: bool,
}

/// A failed search or admission check.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFailure {
    pub reason: ReasonCode,
    /// Earliest tick worth retrying at, if known.
    pub retry: Option<Tick>,
    /// Resource time accumulated before failing.
    pub partial: UsageProfile,
    /// Last interval touched.
    pub cursor: Option<Cursor>,
    /// Whether a late-only interval was passed over.
    pub skipped_late_only: bool,
}

impl SearchFailure {
    /// A failure with no partial profile.
    pub fn new(reason: ReasonCode, retry: Option<Tick>) -> Self {
        Self {
            reason,
            retry,
            partial: UsageProfile::new(),
            cursor: None,
            skipped_late_only: false,
        }
    }

    /// Orders failures for picking the least bad one.
    ///
    /// Reason codes are mutually equal. A retry tick beats no retry, and
    /// the earlier retry tick wins.
    pub fn compare(&self, other: &SearchFailure) -> Ordering {
        match (self.retry, other.retry) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// The preferred failure among `failures`; the first one on ties.
    pub fn least_bad<'a>(failures: impl IntoIterator<Item = &'a SearchFailure>) -> Option<&'a SearchFailure> {
        failures.into_iter().min_by(|a, b| a.compare(b))
    }
}

/// Outcome of a search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    Success(SearchSuccess),
    Failure(SearchFailure),
}

impl SearchResult {
    /// Zero-duration success at `at`.
    pub(crate) fn empty(at: Tick, cursor: Option<Cursor>) -> Self {
        SearchResult::Success(SearchSuccess {
            start: at,
            finish: at,
            profile: UsageProfile::new(),
            cursor,
            skipped_late_only: false,
        })
    }

    pub(crate) fn fail(
        reason: ReasonCode,
        retry: Option<Tick>,
        partial: UsageProfile,
        cursor: Option<Cursor>,
        skipped_late_only: bool,
    ) -> Self {
        SearchResult::Failure(SearchFailure {
            reason,
            retry,
            partial,
            cursor,
            skipped_late_only,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchResult::Success(_))
    }

    pub fn success(&self) -> Option<&SearchSuccess> {
        match self {
            SearchResult::Success(s) => Some(s),
            SearchResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SearchFailure> {
        match self {
            SearchResult::Success(_) => None,
            SearchResult::Failure(f) => Some(f),
        }
    }

    /// Whether a late-only interval was passed over.
    pub fn skipped_late_only(&self) -> bool {
        match self {
            SearchResult::Success(s) => s.skipped_late_only,
            SearchResult::Failure(f) => f.skipped_late_only,
        }
    }
}

/// Parameters of a single-phase search.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    /// Start tick for forward searches, finish tick for backward ones.
    pub at: Tick,
    /// Capacity ticks needed.
    pub duration: Tick,
    /// Phase being searched.
    pub phase: Phase,
    /// Whether the phase may pause across unusable intervals.
    pub can_pause: bool,
    /// Whether this search begins the activity.
    pub is_start_of_phase: bool,
    /// Whether late-only intervals are admitted.
    pub is_late: bool,
    /// Requester's capacity code.
    pub capacity_code: Option<&'a str>,
    /// People-usage rule for the run phase.
    pub people: PeopleRule,
    /// Cursor from a previous search.
    pub hint: Option<Cursor>,
}

impl<'a> SearchRequest<'a> {
    /// A pausable request starting the activity, with no code and all people used.
    pub fn new(at: Tick, duration: Tick, phase: Phase) -> Self {
        Self {
            at,
            duration,
            phase,
            can_pause: true,
            is_start_of_phase: true,
            is_late: false,
            capacity_code: None,
            people: PeopleRule::UseAllAvailable,
            hint: None,
        }
    }

    pub fn with_pause(mut self, can_pause: bool) -> Self {
        self.can_pause = can_pause;
        self
    }

    pub fn continuing(mut self) -> Self {
        self.is_start_of_phase = false;
        self
    }

    pub fn late(mut self, is_late: bool) -> Self {
        self.is_late = is_late;
        self
    }

    pub fn with_capacity_code(mut self, code: Option<&'a str>) -> Self {
        self.capacity_code = code;
        self
    }

    pub fn with_people(mut self, people: PeopleRule) -> Self {
        self.people = people;
        self
    }

    pub fn with_hint(mut self, hint: Option<Cursor>) -> Self {
        self.hint = hint;
        self
    }
}

/// How an interval can serve a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Fit {
    /// Usable with the given people multiplier.
    Usable(f64),
    /// Usable only once the activity is late.
    LateOnly,
    Unusable,
}

pub(crate) fn fit(iv: &CapacityInterval, req: &SearchRequest<'_>) -> Fit {
    if !iv.is_active()
        || !iv.allowed_usages.contains(req.phase)
        || !iv.code_matches(req.capacity_code)
        || iv.people_capacity <= 0.0
    {
        return Fit::Unusable;
    }
    if iv.use_only_when_late && !req.is_late {
        return Fit::LateOnly;
    }
    let m = people::capacity_multiplier(req.people, iv.people_capacity, req.phase);
    if m > 0.0 {
        Fit::Usable(m)
    } else {
        Fit::Unusable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhaseSet;

    #[test]
    fn test_failure_ordering() {
        let none = SearchFailure::new(ReasonCode::LackCapacity, None);
        let late = SearchFailure::new(ReasonCode::Occupied, Some(500));
        let early = SearchFailure::new(ReasonCode::AttentionNotAvailable, Some(200));

        assert_eq!(none.compare(&none.clone()), Ordering::Equal);
        assert_eq!(late.compare(&none), Ordering::Less);
        assert_eq!(early.compare(&late), Ordering::Less);

        let all = [none.clone(), late.clone(), early.clone()];
        assert_eq!(SearchFailure::least_bad(&all), Some(&early));
    }

    #[test]
    fn test_least_bad_ties_keep_first() {
        let a = SearchFailure::new(ReasonCode::CanPause, None);
        let b = SearchFailure::new(ReasonCode::LackCapacity, None);
        let all = [a.clone(), b];
        assert_eq!(SearchFailure::least_bad(&all).map(|f| f.reason), Some(ReasonCode::CanPause));
        assert_eq!(SearchFailure::least_bad(&[]), None);
    }

    #[test]
    fn test_fit_rules() {
        let req = SearchRequest::new(0, 10, Phase::Run).with_capacity_code(Some("A"));
        assert_eq!(fit(&CapacityInterval::online(0, 10), &req), Fit::Usable(1.0));
        assert_eq!(fit(&CapacityInterval::offline(0, 10), &req), Fit::Unusable);
        assert_eq!(
            fit(&CapacityInterval::online(0, 10).with_capacity_code("B"), &req),
            Fit::Unusable
        );
        assert_eq!(
            fit(&CapacityInterval::online(0, 10).with_usages(PhaseSet::cleaning()), &req),
            Fit::Unusable
        );
        assert_eq!(fit(&CapacityInterval::online(0, 10).late_only(), &req), Fit::LateOnly);
        assert_eq!(
            fit(&CapacityInterval::online(0, 10).late_only(), &req.clone().late(true)),
            Fit::Usable(1.0)
        );
        assert_eq!(fit(&CapacityInterval::online(0, 10).with_people(0.0), &req), Fit::Unusable);
    }
}
