//! Forward capacity search.
//!
//! Walks intervals from `at` accumulating capacity until the requested
//! duration is met.
//!
//! # Rules
//!
//! - Ineligible first interval when the search begins a non-clean activity
//!   phase: `HitCleanoutInterval`, retry at the interval end.
//! - Ineligible interval once the activity is under way and pausing is
//!   forbidden: `Occupied` (retry at its end) for occupied time, otherwise
//!   `CanPause` without retry.
//! - Any other ineligible interval is a gap and is skipped.
//! - A prevent-spanning interval must hold the whole remaining need and may
//!   not be entered by an activity already under way.
//! - The last segment is trimmed so consumed capacity equals the request.
//!   Fractional capacity from people-adjusted segments carries forward;
//!   each segment books the whole ticks it completes.

use tracing::debug;

use super::{fit, people, Fit, ReasonCode, SearchRequest, SearchResult, SearchSuccess};
use crate::error::{CapacityError, CapacityResult};
use crate::models::{IntervalType, Tick, UsageProfile, UsageSegment};
use crate::timeline::CapacityTimeline;

/// Finds resource time for `req.duration` capacity ticks starting at `req.at`.
///
/// # Errors
/// - [`CapacityError::NegativeRequirement`] if the duration is negative
/// - [`CapacityError::NoCoverage`] if `req.at` is past the horizon
///
/// # Example
///
/// ```
/// use u_capacity::models::Phase;
/// use u_capacity::search::{find_forward, SearchRequest};
/// use u_capacity::timeline::CapacityTimeline;
///
/// let tl = CapacityTimeline::continuous(0, 1000).unwrap();
/// let result = find_forward(&tl, &SearchRequest::new(100, 200, Phase::Run)).unwrap();
/// assert_eq!(result.success().map(|s| s.finish), Some(300));
/// ```
pub fn find_forward(tl: &CapacityTimeline, req: &SearchRequest<'_>) -> CapacityResult<SearchResult> {
    if req.duration < 0 {
        return Err(CapacityError::NegativeRequirement {
            phase: req.phase,
            ticks: req.duration,
        });
    }
    if req.duration == 0 {
        return Ok(SearchResult::empty(req.at, req.hint));
    }

    let mut cursor = tl.find_at_or_after(req.at, req.hint)?;
    let mut t = req.at;
    let mut supplied = 0.0_f64;
    let mut profile = UsageProfile::new();
    let mut first = true;
    let mut skipped_late = false;

    loop {
        let Some(iv) = tl.get(cursor) else {
            return Err(CapacityError::NoCoverage(t));
        };
        let seg_start = t.max(iv.start);
        let elapsed = iv.end - seg_start;
        let started = !profile.is_empty() || !req.is_start_of_phase;

        if elapsed > 0 {
            match fit(iv, req) {
                Fit::Usable(mult) if started || iv.can_start_activity => {
                    let capacity = elapsed as f64 * mult;
                    let need = req.duration as f64 - supplied;

                    if iv.prevent_spanning && (capacity < need || !profile.is_empty()) {
                        debug!(start = iv.start, end = iv.end, phase = ?req.phase, "prevent-spanning interval rejects phase");
                        let (reason, retry) = if req.phase.is_clean() {
                            (ReasonCode::FailedDueToCleanBeforeSpan, None)
                        } else if req.can_pause {
                            let whole = iv.duration() as f64 * mult;
                            let retry = if !profile.is_empty() && whole >= req.duration as f64 {
                                iv.start
                            } else {
                                iv.end
                            };
                            (ReasonCode::LackCapacityWithRetry, Some(retry))
                        } else {
                            (ReasonCode::CanPause, None)
                        };
                        return Ok(SearchResult::fail(reason, retry, profile, Some(cursor), skipped_late));
                    }

                    if capacity >= need {
                        let used = people::elapsed_for_capacity(need, mult, elapsed);
                        let booked = req.duration - supplied.floor() as Tick;
                        profile.push(segment(seg_start, seg_start + used, booked, mult, iv, req));
                        let start = profile.start().unwrap_or(seg_start);
                        return Ok(SearchResult::Success(SearchSuccess {
                            start,
                            finish: seg_start + used,
                            profile,
                            cursor: Some(cursor),
                            skipped_late_only: skipped_late,
                        }));
                    }

                    let booked_before = supplied.floor() as Tick;
                    supplied += capacity;
                    let consumed = supplied.floor() as Tick - booked_before;
                    profile.push(segment(seg_start, iv.end, consumed, mult, iv, req));
                }
                // Usable, but the activity may not begin here.
                Fit::Usable(_) => {}
                unusable => {
                    if unusable == Fit::LateOnly {
                        skipped_late = true;
                    }
                    if first && req.is_start_of_phase && !req.phase.is_clean() {
                        return Ok(SearchResult::fail(
                            ReasonCode::HitCleanoutInterval,
                            Some(iv.end),
                            profile,
                            Some(cursor),
                            skipped_late,
                        ));
                    }
                    if started && !req.can_pause {
                        let (reason, retry) = if iv.interval_type == IntervalType::Occupied {
                            (ReasonCode::Occupied, Some(iv.end))
                        } else {
                            (ReasonCode::CanPause, None)
                        };
                        return Ok(SearchResult::fail(reason, retry, profile, Some(cursor), skipped_late));
                    }
                }
            }
            first = false;
        }

        t = iv.end;
        match tl.next(cursor) {
            Some(next) => cursor = next,
            None => {
                return Ok(SearchResult::fail(
                    ReasonCode::LackCapacity,
                    None,
                    profile,
                    Some(cursor),
                    skipped_late,
                ))
            }
        }
    }
}

pub(super) fn segment(
    start: Tick,
    end: Tick,
    capacity_consumed: Tick,
    multiplier: f64,
    iv: &crate::models::CapacityInterval,
    req: &SearchRequest<'_>,
) -> UsageSegment {
    UsageSegment {
        start,
        end,
        capacity_consumed,
        multiplier,
        cost_rate: iv.cost_rate,
        overtime: iv.overtime,
        phase: req.phase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CapacityInterval, PeopleRule, Phase};
    use crate::search::SearchFailure;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn gap_timeline() -> CapacityTimeline {
        CapacityTimeline::new(vec![
            CapacityInterval::online(0, 100),
            CapacityInterval::offline(100, 150),
            CapacityInterval::online(150, 500),
        ])
        .unwrap()
    }

    fn failure(result: SearchResult) -> SearchFailure {
        match result {
            SearchResult::Failure(f) => f,
            SearchResult::Success(s) => panic!("expected failure, got {s:?}"),
        }
    }

    fn success(result: SearchResult) -> SearchSuccess {
        match result {
            SearchResult::Success(s) => s,
            SearchResult::Failure(f) => panic!("expected success, got {f:?}"),
        }
    }

    #[test]
    fn test_continuous_run() {
        let tl = CapacityTimeline::continuous(0, 1000).unwrap();
        let s = success(find_forward(&tl, &SearchRequest::new(100, 200, Phase::Run)).unwrap());
        assert_eq!(s.finish, 300);
        assert_eq!(s.profile.len(), 1);
        assert_eq!((s.profile.segments()[0].start, s.profile.segments()[0].end), (100, 300));
    }

    #[test]
    fn test_pause_across_gap() {
        let tl = gap_timeline();
        let s = success(find_forward(&tl, &SearchRequest::new(50, 120, Phase::Run)).unwrap());
        assert_eq!(s.finish, 220);
        let spans: Vec<_> = s
            .profile
            .segments()
            .iter()
            .map(|seg| (seg.start, seg.end, seg.capacity_consumed))
            .collect();
        assert_eq!(spans, [(50, 100, 50), (150, 220, 70)]);
    }

    #[test]
    fn test_no_pause_fails() {
        let tl = gap_timeline();
        let f = failure(
            find_forward(&tl, &SearchRequest::new(50, 120, Phase::Run).with_pause(false)).unwrap(),
        );
        assert_eq!(f.reason, ReasonCode::CanPause);
        assert_eq!(f.retry, None);
        assert_eq!(f.partial.capacity_consumed(), 50);
    }

    #[test]
    fn test_prevent_spanning_retry() {
        let tl = CapacityTimeline::new(vec![CapacityInterval::online(0, 100).preventing_spanning()])
            .unwrap();
        let f = failure(find_forward(&tl, &SearchRequest::new(0, 150, Phase::Run)).unwrap());
        assert_eq!(f.reason, ReasonCode::LackCapacityWithRetry);
        assert_eq!(f.retry, Some(100));

        let f = failure(
            find_forward(&tl, &SearchRequest::new(0, 150, Phase::Run).with_pause(false)).unwrap(),
        );
        assert_eq!(f.reason, ReasonCode::CanPause);

        let f = failure(find_forward(&tl, &SearchRequest::new(0, 150, Phase::CleanBefore)).unwrap());
        assert_eq!(f.reason, ReasonCode::FailedDueToCleanBeforeSpan);
    }

    #[test]
    fn test_prevent_spanning_entry_retries_at_interval_start() {
        let tl = CapacityTimeline::new(vec![
            CapacityInterval::online(0, 100),
            CapacityInterval::online(100, 300).preventing_spanning(),
        ])
        .unwrap();
        let f = failure(find_forward(&tl, &SearchRequest::new(80, 50, Phase::Run)).unwrap());
        assert_eq!(f.reason, ReasonCode::LackCapacityWithRetry);
        assert_eq!(f.retry, Some(100));

        // Fits entirely inside the interval when started there.
        let s = success(find_forward(&tl, &SearchRequest::new(100, 50, Phase::Run)).unwrap());
        assert_eq!(s.finish, 150);
    }

    #[test]
    fn test_hit_cleanout_interval() {
        let tl = CapacityTimeline::new(vec![
            CapacityInterval::online(0, 50).with_usages(crate::models::PhaseSet::cleaning()),
            CapacityInterval::online(50, 500),
        ])
        .unwrap();
        let f = failure(find_forward(&tl, &SearchRequest::new(10, 100, Phase::Setup)).unwrap());
        assert_eq!(f.reason, ReasonCode::HitCleanoutInterval);
        assert_eq!(f.retry, Some(50));

        // A cleanout may use it.
        let s = success(find_forward(&tl, &SearchRequest::new(10, 100, Phase::CleanBefore)).unwrap());
        assert_eq!(s.finish, 110);

        // A continuing phase skips it as a gap.
        let s = success(
            find_forward(&tl, &SearchRequest::new(10, 100, Phase::Setup).continuing()).unwrap(),
        );
        assert_eq!(s.start, 50);
        assert_eq!(s.finish, 150);
    }

    #[test]
    fn test_occupied_without_pause() {
        let tl = CapacityTimeline::new(vec![
            CapacityInterval::online(0, 100),
            CapacityInterval::occupied(100, 200),
            CapacityInterval::online(200, 400),
        ])
        .unwrap();
        let f = failure(
            find_forward(&tl, &SearchRequest::new(0, 150, Phase::Run).with_pause(false)).unwrap(),
        );
        assert_eq!(f.reason, ReasonCode::Occupied);
        assert_eq!(f.retry, Some(200));

        let s = success(find_forward(&tl, &SearchRequest::new(0, 150, Phase::Run)).unwrap());
        assert_eq!(s.finish, 250);
    }

    #[test]
    fn test_people_adjustment() {
        let tl = CapacityTimeline::new(vec![CapacityInterval::online(0, 1000).with_people(2.0)])
            .unwrap();
        let s = success(find_forward(&tl, &SearchRequest::new(0, 100, Phase::Run)).unwrap());
        assert_eq!(s.finish, 50);
        assert_eq!(s.profile.capacity_consumed(), 100);

        // Setup is not people-adjusted.
        let s = success(find_forward(&tl, &SearchRequest::new(0, 100, Phase::Setup)).unwrap());
        assert_eq!(s.finish, 100);

        let half = SearchRequest::new(0, 100, Phase::Run).with_people(PeopleRule::UseSpecifiedNbr(4.0));
        let s = success(find_forward(&tl, &half).unwrap());
        assert_eq!(s.finish, 200);
    }

    #[test]
    fn test_fractional_capacity_carries_across_segments() {
        let tl = CapacityTimeline::new(vec![
            CapacityInterval::online(0, 3),
            CapacityInterval::offline(3, 10),
            CapacityInterval::online(10, 100),
        ])
        .unwrap();
        // Two people requested, one available: each tick supplies half a tick.
        let req = SearchRequest::new(0, 3, Phase::Run).with_people(PeopleRule::UseSpecifiedNbr(2.0));
        let s = success(find_forward(&tl, &req).unwrap());
        assert_eq!(s.finish, 13);
        let booked: Vec<_> = s
            .profile
            .segments()
            .iter()
            .map(|seg| (seg.start, seg.end, seg.capacity_consumed))
            .collect();
        assert_eq!(booked, [(0, 3, 1), (10, 13, 2)]);
    }

    #[test]
    fn test_cannot_start_interval_is_skipped() {
        let tl = CapacityTimeline::new(vec![
            CapacityInterval::online(0, 100).without_starts(),
            CapacityInterval::online(100, 300),
        ])
        .unwrap();
        let s = success(find_forward(&tl, &SearchRequest::new(20, 50, Phase::Run)).unwrap());
        assert_eq!(s.start, 100);
        assert_eq!(s.finish, 150);

        // Once under way the interval is usable.
        let s = success(find_forward(&tl, &SearchRequest::new(20, 50, Phase::Run).continuing()).unwrap());
        assert_eq!(s.finish, 70);
    }

    #[test]
    fn test_late_only_flag() {
        let tl = CapacityTimeline::new(vec![
            CapacityInterval::online(0, 100),
            CapacityInterval::online(100, 200).late_only(),
            CapacityInterval::online(200, 400),
        ])
        .unwrap();
        let s = success(find_forward(&tl, &SearchRequest::new(0, 150, Phase::Run)).unwrap());
        assert_eq!(s.finish, 250);
        assert!(s.skipped_late_only);

        let s = success(find_forward(&tl, &SearchRequest::new(0, 150, Phase::Run).late(true)).unwrap());
        assert_eq!(s.finish, 150);
        assert!(!s.skipped_late_only);
    }

    #[test]
    fn test_runs_out_of_timeline() {
        let tl = CapacityTimeline::continuous(0, 100).unwrap();
        let f = failure(find_forward(&tl, &SearchRequest::new(50, 100, Phase::Run)).unwrap());
        assert_eq!(f.reason, ReasonCode::LackCapacity);
        assert_eq!(f.retry, None);
        assert_eq!(f.partial.capacity_consumed(), 50);
    }

    #[test]
    fn test_zero_and_negative_duration() {
        let tl = CapacityTimeline::continuous(0, 100).unwrap();
        let s = success(find_forward(&tl, &SearchRequest::new(40, 0, Phase::Run)).unwrap());
        assert_eq!((s.start, s.finish), (40, 40));
        assert!(s.profile.is_empty());

        assert!(matches!(
            find_forward(&tl, &SearchRequest::new(40, -1, Phase::Run)),
            Err(CapacityError::NegativeRequirement { .. })
        ));
        assert_eq!(
            find_forward(&tl, &SearchRequest::new(100, 10, Phase::Run)).unwrap_err(),
            CapacityError::NoCoverage(100)
        );
    }

    #[test]
    fn test_duration_conservation_random() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..300 {
            let mut intervals = Vec::new();
            let mut t = 0;
            for _ in 0..rng.random_range(1..12) {
                let len = rng.random_range(1..200);
                let iv = if rng.random_bool(0.3) {
                    CapacityInterval::offline(t, t + len)
                } else {
                    CapacityInterval::online(t, t + len).with_people(rng.random_range(1..4) as f64)
                };
                intervals.push(iv);
                t += len;
            }
            let tl = CapacityTimeline::new(intervals).unwrap();
            let at = rng.random_range(0..t);
            let duration = rng.random_range(1..500);
            let phase = if rng.random_bool(0.5) { Phase::Run } else { Phase::Setup };
            let req = SearchRequest::new(at, duration, phase).continuing();
            if let SearchResult::Success(s) = find_forward(&tl, &req).unwrap() {
                assert_eq!(s.profile.capacity_consumed(), duration);
                assert_eq!(s.profile.end(), Some(s.finish));
                for pair in s.profile.segments().windows(2) {
                    assert!(pair[0].end <= pair[1].start);
                }
            }
        }
    }
}
