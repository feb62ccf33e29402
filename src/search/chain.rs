//! Phase chaining.
//!
//! An activity's six required spans are searched one phase at a time in
//! chaining order, each phase starting where the previous one finished and
//! reusing its cursor. Zero-length phases are skipped.
//!
//! If a forward chain passed over late-only intervals and finishes after
//! the activity's late boundary (or fails), it is re-run once with
//! late-only intervals admitted.

use tracing::debug;

use super::{find_backward, find_forward, SearchRequest, SearchResult, SearchSuccess};
use crate::error::{CapacityError, CapacityResult};
use crate::models::{Activity, PeopleRule, Phase, RequiredCapacity, Tick, UsageProfile};
use crate::timeline::{CapacityTimeline, Cursor};

/// Parameters of a chained search.
#[derive(Debug, Clone)]
pub struct ChainRequest<'a> {
    /// Start tick for forward chains, finish tick for reverse ones.
    pub at: Tick,
    /// Spans to place.
    pub required: &'a RequiredCapacity,
    pub can_pause: bool,
    pub capacity_code: Option<&'a str>,
    pub people: PeopleRule,
    /// Finishing after this tick makes the activity late.
    pub late_boundary: Option<Tick>,
    /// Whether the activity is already late.
    pub is_late: bool,
    /// Allows the one-shot late re-run.
    pub rerun_when_late: bool,
    pub hint: Option<Cursor>,
}

impl<'a> ChainRequest<'a> {
    pub fn new(at: Tick, required: &'a RequiredCapacity) -> Self {
        Self {
            at,
            required,
            can_pause: true,
            capacity_code: None,
            people: PeopleRule::UseAllAvailable,
            late_boundary: None,
            is_late: false,
            rerun_when_late: false,
            hint: None,
        }
    }

    /// A request carrying the activity's pause, code, people and late settings.
    pub fn for_activity(activity: &'a Activity, at: Tick, required: &'a RequiredCapacity) -> Self {
        Self {
            can_pause: activity.can_pause,
            capacity_code: activity.capacity_code.as_deref(),
            people: activity.people,
            late_boundary: activity.late_boundary,
            ..Self::new(at, required)
        }
    }

    pub fn with_rerun_when_late(mut self, enabled: bool) -> Self {
        self.rerun_when_late = enabled;
        self
    }

    pub fn with_hint(mut self, hint: Option<Cursor>) -> Self {
        self.hint = hint;
        self
    }

    fn phase_request(&self, phase: Phase, at: Tick, duration: Tick, first: bool, hint: Option<Cursor>) -> SearchRequest<'a> {
        SearchRequest {
            at,
            duration,
            phase,
            can_pause: self.can_pause,
            is_start_of_phase: first,
            is_late: self.is_late,
            capacity_code: self.capacity_code,
            people: self.people,
            hint,
        }
    }

    fn phase_ticks(&self, phase: Phase) -> CapacityResult<Tick> {
        let ticks = self.required.span(phase).ticks;
        if ticks < 0 {
            return Err(CapacityError::NegativeRequirement { phase, ticks });
        }
        Ok(ticks)
    }
}

/// Searches every phase forward from `req.at`.
///
/// # Example
///
/// ```
/// use u_capacity::models::{RequiredCapacity, RequiredSpan};
/// use u_capacity::search::{find_chain, ChainRequest};
/// use u_capacity::timeline::CapacityTimeline;
///
/// let tl = CapacityTimeline::continuous(0, 1000).unwrap();
/// let required = RequiredCapacity {
///     setup: RequiredSpan::new(30),
///     processing: RequiredSpan::new(100),
///     ..Default::default()
/// };
/// let result = find_chain(&tl, &ChainRequest::new(10, &required)).unwrap();
/// assert_eq!(result.success().map(|s| (s.start, s.finish)), Some((10, 140)));
/// ```
pub fn find_chain(tl: &CapacityTimeline, req: &ChainRequest<'_>) -> CapacityResult<SearchResult> {
    let result = run_forward(tl, req)?;
    let past_boundary = match (&result, req.late_boundary) {
        (SearchResult::Success(s), Some(boundary)) => s.finish > boundary,
        (SearchResult::Failure(_), Some(_)) => true,
        (_, None) => false,
    };
    if req.rerun_when_late && !req.is_late && result.skipped_late_only() && past_boundary {
        debug!(at = req.at, "re-running chain with late-only intervals");
        let late = ChainRequest {
            is_late: true,
            ..req.clone()
        };
        return run_forward(tl, &late);
    }
    Ok(result)
}

fn run_forward(tl: &CapacityTimeline, req: &ChainRequest<'_>) -> CapacityResult<SearchResult> {
    let mut t = req.at;
    let mut hint = req.hint;
    let mut profile = UsageProfile::new();
    let mut start = None;
    let mut skipped_late = false;

    for phase in Phase::ALL {
        let ticks = req.phase_ticks(phase)?;
        if ticks == 0 {
            continue;
        }
        let sreq = req.phase_request(phase, t, ticks, start.is_none(), hint);
        match find_forward(tl, &sreq)? {
            SearchResult::Success(s) => {
                skipped_late |= s.skipped_late_only;
                start.get_or_insert(s.start);
                profile.extend(s.profile);
                t = s.finish;
                hint = s.cursor;
            }
            SearchResult::Failure(mut f) => {
                debug!(?phase, reason = ?f.reason, retry = ?f.retry, "chain phase failed");
                profile.extend(std::mem::take(&mut f.partial));
                f.partial = profile;
                f.skipped_late_only |= skipped_late;
                return Ok(SearchResult::Failure(f));
            }
        }
    }

    Ok(SearchResult::Success(SearchSuccess {
        start: start.unwrap_or(req.at),
        finish: t,
        profile,
        cursor: hint,
        skipped_late_only: skipped_late,
    }))
}

/// Searches every phase backward so the chain finishes by `req.at`,
/// starting no earlier than `clock`.
///
/// Only the earliest non-empty phase is treated as beginning the activity.
pub fn find_chain_reverse(
    tl: &CapacityTimeline,
    clock: Tick,
    req: &ChainRequest<'_>,
) -> CapacityResult<SearchResult> {
    let mut first_phase = None;
    for phase in Phase::ALL {
        if req.phase_ticks(phase)? > 0 {
            first_phase = Some(phase);
            break;
        }
    }

    let mut t = req.at;
    let mut hint = req.hint;
    let mut profile = UsageProfile::new();
    let mut finish = None;
    let mut skipped_late = false;

    for phase in Phase::ALL.into_iter().rev() {
        let ticks = req.phase_ticks(phase)?;
        if ticks == 0 {
            continue;
        }
        let sreq = req.phase_request(phase, t, ticks, Some(phase) == first_phase, hint);
        match find_backward(tl, clock, &sreq)? {
            SearchResult::Success(s) => {
                skipped_late |= s.skipped_late_only;
                finish.get_or_insert(s.finish);
                profile.prepend(s.profile);
                t = s.start;
                hint = s.cursor;
            }
            SearchResult::Failure(mut f) => {
                let mut partial = std::mem::take(&mut f.partial);
                partial.extend(profile);
                f.partial = partial;
                f.skipped_late_only |= skipped_late;
                return Ok(SearchResult::Failure(f));
            }
        }
    }

    Ok(SearchResult::Success(SearchSuccess {
        start: t,
        finish: finish.unwrap_or(req.at),
        profile,
        cursor: hint,
        skipped_late_only: skipped_late,
    }))
}
