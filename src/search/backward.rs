//! Backward capacity search.
//!
//! Mirror of the forward search: walks intervals in reverse from a finish
//! tick, prepending segments, bounded below by the simulation clock.
//!
//! Unlike the forward search, the backward search never fails on a
//! prevent-spanning interval. It discards what it accumulated and keeps
//! looking further back, restarting the finish at the interval boundary,
//! whenever:
//!
//! - it crosses into a prevent-spanning interval with time accumulated,
//! - a prevent-spanning interval alone cannot hold the remaining need,
//! - the start would land where the activity may not begin,
//! - it meets a gap with time accumulated and pausing is forbidden.
//!
//! Fractional people-adjusted capacity carries across segments as in the
//! forward search.

use tracing::debug;

use super::forward::segment;
use super::{fit, people, Fit, ReasonCode, SearchRequest, SearchResult, SearchSuccess};
use crate::error::{CapacityError, CapacityResult};
use crate::models::{Tick, UsageProfile};
use crate::timeline::CapacityTimeline;

/// Finds resource time for `req.duration` capacity ticks finishing by `req.at`,
/// starting no earlier than `clock`.
///
/// # Errors
/// - [`CapacityError::NegativeRequirement`] if the duration is negative
/// - [`CapacityError::NoCoverage`] if `req.at` is before the horizon
///
/// # Example
///
/// ```
/// use u_capacity::models::Phase;
/// use u_capacity::search::{find_backward, SearchRequest};
/// use u_capacity::timeline::CapacityTimeline;
///
/// let tl = CapacityTimeline::continuous(0, 1000).unwrap();
/// let result = find_backward(&tl, 0, &SearchRequest::new(300, 200, Phase::Run)).unwrap();
/// assert_eq!(result.success().map(|s| s.start), Some(100));
/// ```
pub fn find_backward(
    tl: &CapacityTimeline,
    clock: Tick,
    req: &SearchRequest<'_>,
) -> CapacityResult<SearchResult> {
    if req.duration < 0 {
        return Err(CapacityError::NegativeRequirement {
            phase: req.phase,
            ticks: req.duration,
        });
    }
    if req.duration == 0 {
        return Ok(SearchResult::empty(req.at, req.hint));
    }
    if req.at <= clock {
        return Ok(SearchResult::fail(ReasonCode::LackCapacity, None, UsageProfile::new(), None, false));
    }

    let mut cursor = tl.find_at_or_before(req.at - 1, req.hint)?;
    let mut t = req.at;
    let mut supplied = 0.0_f64;
    let mut profile = UsageProfile::new();
    let mut skipped_late = false;

    loop {
        let Some(iv) = tl.get(cursor) else {
            return Err(CapacityError::NoCoverage(t));
        };
        let seg_end = t.min(iv.end);
        let seg_start = iv.start.max(clock);

        if seg_end > seg_start {
            match fit(iv, req) {
                Fit::Usable(mult) => {
                    if iv.prevent_spanning && !profile.is_empty() {
                        debug!(start = iv.start, end = iv.end, "backward search restarts before prevent-spanning interval");
                        profile.clear();
                        supplied = 0.0;
                    }
                    let elapsed = seg_end - seg_start;
                    let capacity = elapsed as f64 * mult;
                    let need = req.duration as f64 - supplied;

                    if capacity >= need {
                        let used = people::elapsed_for_capacity(need, mult, elapsed);
                        let start = seg_end - used;
                        if req.is_start_of_phase && !iv.can_start_activity {
                            profile.clear();
                            supplied = 0.0;
                        } else {
                            let booked = req.duration - supplied.floor() as Tick;
                            profile.push_front(segment(start, seg_end, booked, mult, iv, req));
                            let finish = profile.end().unwrap_or(seg_end);
                            return Ok(SearchResult::Success(SearchSuccess {
                                start,
                                finish,
                                profile,
                                cursor: Some(cursor),
                                skipped_late_only: skipped_late,
                            }));
                        }
                    } else if iv.prevent_spanning {
                        profile.clear();
                        supplied = 0.0;
                    } else {
                        let booked_before = supplied.floor() as Tick;
                        supplied += capacity;
                        let consumed = supplied.floor() as Tick - booked_before;
                        profile.push_front(segment(seg_start, seg_end, consumed, mult, iv, req));
                    }
                }
                unusable => {
                    if unusable == Fit::LateOnly {
                        skipped_late = true;
                    }
                    if !req.can_pause && !profile.is_empty() {
                        profile.clear();
                        supplied = 0.0;
                    }
                }
            }
        }

        t = iv.start;
        if iv.start <= clock {
            break;
        }
        match tl.prev(cursor) {
            Some(prev) => cursor = prev,
            None => break,
        }
    }

    Ok(SearchResult::fail(
        ReasonCode::LackCapacity,
        None,
        profile,
        Some(cursor),
        skipped_late,
    ))
}
