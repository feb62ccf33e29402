//! Merging occupied spans into a base capacity profile.
//!
//! Each occupied span `[s, e)` is laid over the base intervals it touches.
//! Touched intervals are split into untouched remainders (keeping every
//! attribute) and `Occupied` pieces (also keeping attributes, so flags like
//! `clears_changeovers` survive). The four structural cases are:
//!
//! | Case | Result |
//! |------|--------|
//! | Span equals one interval | Interval becomes `Occupied` |
//! | Span strictly inside one interval | Head, occupied middle, tail |
//! | Span covers N whole intervals | N `Occupied` intervals |
//! | Span covers parts of first and last of N | Head, N occupied pieces, tail |

use tracing::warn;

use super::CapacityTimeline;
use crate::error::{CapacityError, CapacityResult};
use crate::models::{CapacityInterval, IntervalType, Tick};

/// Builds a new timeline with `occupied` spans merged into `base`.
///
/// Zero-length spans are ignored. Parts of spans outside the horizon are
/// clipped.
///
/// # Errors
/// [`CapacityError::OverlappingOccupancy`] if two spans overlap.
///
/// # Example
///
/// ```
/// use u_capacity::timeline::{rebuild, CapacityTimeline};
/// use u_capacity::models::IntervalType;
///
/// let base = CapacityTimeline::continuous(0, 100).unwrap();
/// let tl = rebuild(&base, &[(20, 50)]).unwrap();
/// let kinds: Vec<_> = tl.intervals().iter().map(|iv| iv.interval_type).collect();
/// assert_eq!(kinds, [IntervalType::Online, IntervalType::Occupied, IntervalType::Online]);
/// ```
pub fn rebuild(base: &CapacityTimeline, occupied: &[(Tick, Tick)]) -> CapacityResult<CapacityTimeline> {
    let mut spans: Vec<(Tick, Tick)> = occupied.iter().copied().filter(|(s, e)| s < e).collect();
    spans.sort_unstable();
    for pair in spans.windows(2) {
        if pair[1].0 < pair[0].1 {
            warn!(start = pair[1].0, end = pair[1].1, "overlapping occupied spans");
            return Err(CapacityError::OverlappingOccupancy {
                start: pair[1].0,
                end: pair[1].1,
            });
        }
    }

    let mut out: Vec<CapacityInterval> = Vec::with_capacity(base.len() + spans.len() * 2);
    let mut j = 0;
    for iv in base.intervals() {
        let mut cur = iv.start;
        while j < spans.len() && spans[j].0 < iv.end {
            let (s, e) = spans[j];
            if e <= cur {
                j += 1;
                continue;
            }
            if s > cur {
                out.push(iv.trimmed(cur, s));
            }
            let occ_end = e.min(iv.end);
            out.push(CapacityInterval {
                interval_type: IntervalType::Occupied,
                ..iv.trimmed(s.max(cur), occ_end)
            });
            cur = occ_end;
            if e <= iv.end {
                j += 1;
            } else {
                break;
            }
        }
        if cur < iv.end {
            out.push(iv.trimmed(cur, iv.end));
        }
    }

    Ok(CapacityTimeline::new(out)?.with_walk_limit(base.walk_limit))
}
