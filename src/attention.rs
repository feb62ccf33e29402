//! Attention sharing on multitasking resources.
//!
//! A multitasking resource gives each concurrent commitment a percentage
//! of its attention. A proposed window is admitted iff, at every tick in
//! it, the committed percentages plus the new one stay within the limit.
//!
//! The check is a sweep line over load change points: O(n log n) for n
//! loads.

use serde::{Deserialize, Serialize};

use crate::models::Tick;

/// Attention held over `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionLoad {
    pub start: Tick,
    pub end: Tick,
    pub percent: u32,
}

impl AttentionLoad {
    pub fn new(start: Tick, end: Tick, percent: u32) -> Self {
        Self { start, end, percent }
    }
}

/// Where a proposed window runs out of attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    /// First tick in the window over the limit.
    pub at: Tick,
    /// Load already committed at `at`.
    pub load: u32,
    /// Earliest later tick where enough attention is free again.
    pub retry: Option<Tick>,
}

/// Piecewise-constant load: `(tick, load from tick until the next point)`.
fn load_points(loads: &[AttentionLoad]) -> Vec<(Tick, i64)> {
    let mut events: Vec<(Tick, i64)> = loads
        .iter()
        .filter(|l| l.end > l.start && l.percent > 0)
        .flat_map(|l| [(l.start, l.percent as i64), (l.end, -(l.percent as i64))])
        .collect();
    events.sort_unstable();

    let mut points = Vec::with_capacity(events.len());
    let mut load = 0;
    let mut i = 0;
    while i < events.len() {
        let t = events[i].0;
        while i < events.len() && events[i].0 == t {
            load += events[i].1;
            i += 1;
        }
        points.push((t, load));
    }
    points
}

/// First point in `[start, end)` where `percent` more attention exceeds `limit`.
///
/// Returns `None` when the window fits.
///
/// # Example
///
/// ```
/// use u_capacity::attention::{first_shortfall, AttentionLoad};
///
/// let loads = [AttentionLoad::new(0, 100, 60), AttentionLoad::new(50, 150, 30)];
/// let s = first_shortfall(&loads, 0, 200, 40, 100).unwrap();
/// assert_eq!((s.at, s.retry), (50, Some(100)));
/// ```
pub fn first_shortfall(
    loads: &[AttentionLoad],
    start: Tick,
    end: Tick,
    percent: u32,
    limit: u32,
) -> Option<Shortfall> {
    if start >= end {
        return None;
    }
    let limit = limit as i64;
    let pct = percent as i64;
    if pct > limit {
        return Some(Shortfall {
            at: start,
            load: 0,
            retry: None,
        });
    }
    let fits = |load: i64| load + pct <= limit;

    let points = load_points(loads);
    for (k, &(seg_start, load)) in points.iter().enumerate() {
        let seg_end = points.get(k + 1).map_or(Tick::MAX, |p| p.0);
        if seg_end <= start || seg_start >= end || fits(load) {
            continue;
        }
        let retry = points[k + 1..].iter().find(|p| fits(p.1)).map(|p| p.0);
        return Some(Shortfall {
            at: seg_start.max(start),
            load: load.max(0) as u32,
            retry,
        });
    }
    None
}

/// Highest committed load at any tick.
pub fn peak_load(loads: &[AttentionLoad]) -> u32 {
    load_points(loads)
        .into_iter()
        .map(|(_, l)| l.max(0) as u32)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_fits_under_limit() {
        let loads = [AttentionLoad::new(0, 100, 50), AttentionLoad::new(100, 200, 70)];
        assert!(first_shortfall(&loads, 0, 200, 30, 100).is_none());
        assert!(first_shortfall(&loads, 0, 100, 50, 100).is_none());
    }

    #[test]
    fn test_shortfall_and_retry() {
        let loads = [AttentionLoad::new(0, 100, 50), AttentionLoad::new(100, 200, 70)];
        let s = first_shortfall(&loads, 50, 150, 40, 100).unwrap();
        assert_eq!(s.at, 100);
        assert_eq!(s.load, 70);
        assert_eq!(s.retry, Some(200));
    }

    #[test]
    fn test_touching_loads_do_not_overlap() {
        let loads = [AttentionLoad::new(0, 100, 100)];
        assert!(first_shortfall(&loads, 100, 200, 100, 100).is_none());
        let s = first_shortfall(&loads, 99, 200, 1, 100).unwrap();
        assert_eq!((s.at, s.retry), (99, Some(100)));
    }

    #[test]
    fn test_over_limit_request() {
        let s = first_shortfall(&[], 0, 10, 120, 100).unwrap();
        assert_eq!(s.retry, None);
        assert!(first_shortfall(&[], 0, 10, 120, 150).is_none());
    }

    #[test]
    fn test_peak_load() {
        let loads = [
            AttentionLoad::new(0, 100, 30),
            AttentionLoad::new(50, 150, 40),
            AttentionLoad::new(60, 70, 20),
        ];
        assert_eq!(peak_load(&loads), 90);
        assert_eq!(peak_load(&[]), 0);
    }

    #[test]
    fn test_attention_bound_random() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..100 {
            let mut committed = Vec::new();
            for _ in 0..40 {
                let start = rng.random_range(0..1_000);
                let end = start + rng.random_range(1..200);
                let percent = rng.random_range(1..=100);
                if first_shortfall(&committed, start, end, percent, 100).is_none() {
                    committed.push(AttentionLoad::new(start, end, percent));
                }
            }
            assert!(peak_load(&committed) <= 100);
        }
    }
}
