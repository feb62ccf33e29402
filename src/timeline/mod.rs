//! Capacity timeline.
//!
//! An ordered, contiguous, non-overlapping sequence of [`CapacityInterval`]s
//! covering a resource's planning horizon.
//!
//! # Cursors
//!
//! Lookups return an opaque [`Cursor`] naming one interval. Passing a cursor
//! from a previous lookup back as a hint makes sequential access amortized
//! O(1): the hint is walked linearly for a few intervals before falling back
//! to binary search. A cursor carries no hidden state and is only meaningful
//! for the timeline that produced it; a stale cursor is ignored.
//!
//! # Rebuilding
//!
//! Committed blocks are merged into a static base profile as `Occupied`
//! intervals by [`rebuild`], a pure function producing a new timeline.

mod rebuild;

pub use rebuild::rebuild;

use crate::error::{CapacityError, CapacityResult};
use crate::models::{CapacityInterval, Tick};

/// Opaque position in a [`CapacityTimeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(pub(crate) usize);

/// Ordered capacity intervals of one resource.
#[derive(Debug, Clone)]
pub struct CapacityTimeline {
    intervals: Vec<CapacityInterval>,
    walk_limit: usize,
}

impl CapacityTimeline {
    /// Creates a timeline, checking the ordering invariants.
    ///
    /// # Errors
    /// - [`CapacityError::NoCoverage`] if `intervals` is empty
    /// - [`CapacityError::EmptyInterval`] for a zero or negative duration
    /// - [`CapacityError::Discontiguous`] for a gap or overlap
    pub fn new(intervals: Vec<CapacityInterval>) -> CapacityResult<Self> {
        let Some(first) = intervals.first() else {
            return Err(CapacityError::NoCoverage(0));
        };
        let mut previous_end = first.start;
        for iv in &intervals {
            if iv.end <= iv.start {
                return Err(CapacityError::EmptyInterval {
                    start: iv.start,
                    end: iv.end,
                });
            }
            if iv.start != previous_end {
                return Err(CapacityError::Discontiguous {
                    previous_end,
                    next_start: iv.start,
                });
            }
            previous_end = iv.end;
        }
        Ok(Self {
            intervals,
            walk_limit: 8,
        })
    }

    /// A single online interval `[start, end)`.
    pub fn continuous(start: Tick, end: Tick) -> CapacityResult<Self> {
        Self::new(vec![CapacityInterval::online(start, end)])
    }

    /// Sets how far a hint is walked before binary search takes over.
    pub fn with_walk_limit(mut self, limit: usize) -> Self {
        self.walk_limit = limit;
        self
    }

    /// Intervals in time order.
    pub fn intervals(&self) -> &[CapacityInterval] {
        &self.intervals
    }

    /// Interval at `cursor`.
    #[inline]
    pub fn get(&self, cursor: Cursor) -> Option<&CapacityInterval> {
        self.intervals.get(cursor.0)
    }

    /// Start of the planning horizon.
    pub fn horizon_start(&self) -> Tick {
        self.intervals.first().map_or(0, |iv| iv.start)
    }

    /// End of the planning horizon.
    pub fn horizon_end(&self) -> Tick {
        self.intervals.last().map_or(0, |iv| iv.end)
    }

    /// Cursor of the first interval.
    pub fn first(&self) -> Cursor {
        Cursor(0)
    }

    /// Cursor of the last interval.
    pub fn last(&self) -> Cursor {
        Cursor(self.intervals.len().saturating_sub(1))
    }

    /// Cursor of the following interval.
    #[inline]
    pub fn next(&self, cursor: Cursor) -> Option<Cursor> {
        let i = cursor.0 + 1;
        (i < self.intervals.len()).then_some(Cursor(i))
    }

    /// Cursor of the preceding interval.
    #[inline]
    pub fn prev(&self, cursor: Cursor) -> Option<Cursor> {
        cursor.0.checked_sub(1).map(Cursor)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Interval containing `tick`, or the first one after it.
    ///
    /// # Errors
    /// [`CapacityError::NoCoverage`] if `tick` is at or past the horizon end.
    pub fn find_at_or_after(&self, tick: Tick, hint: Option<Cursor>) -> CapacityResult<Cursor> {
        if tick >= self.horizon_end() {
            return Err(CapacityError::NoCoverage(tick));
        }
        if tick < self.horizon_start() {
            return Ok(self.first());
        }
        Ok(self.locate(tick, hint))
    }

    /// Interval containing `tick`, or the last one before it.
    ///
    /// # Errors
    /// [`CapacityError::NoCoverage`] if `tick` is before the horizon start.
    pub fn find_at_or_before(&self, tick: Tick, hint: Option<Cursor>) -> CapacityResult<Cursor> {
        if tick < self.horizon_start() {
            return Err(CapacityError::NoCoverage(tick));
        }
        if tick >= self.horizon_end() {
            return Ok(self.last());
        }
        Ok(self.locate(tick, hint))
    }

    /// First online interval at or after `tick`.
    pub fn find_first_online_forward(&self, tick: Tick, hint: Option<Cursor>) -> Option<Cursor> {
        let mut cursor = self.find_at_or_after(tick, hint).ok()?;
        loop {
            if self.intervals[cursor.0].is_active() {
                return Some(cursor);
            }
            cursor = self.next(cursor)?;
        }
    }

    /// Last online interval at or before `tick`.
    pub fn find_first_online_backward(&self, tick: Tick, hint: Option<Cursor>) -> Option<Cursor> {
        let mut cursor = self.find_at_or_before(tick, hint).ok()?;
        loop {
            if self.intervals[cursor.0].is_active() {
                return Some(cursor);
            }
            cursor = self.prev(cursor)?;
        }
    }

    /// Whether an interval overlapping `[from, to)` clears changeovers.
    pub fn clears_changeovers_between(&self, from: Tick, to: Tick) -> bool {
        if from >= to {
            return false;
        }
        let lo = self.intervals.partition_point(|iv| iv.end <= from);
        self.intervals[lo..]
            .iter()
            .take_while(|iv| iv.start < to)
            .any(|iv| iv.clears_changeovers)
    }

    /// Index of the interval containing `tick`, which must lie within the horizon.
    fn locate(&self, tick: Tick, hint: Option<Cursor>) -> Cursor {
        if let Some(Cursor(mut i)) = hint.filter(|c| c.0 < self.intervals.len()) {
            for _ in 0..=self.walk_limit {
                let iv = &self.intervals[i];
                if iv.contains(tick) {
                    return Cursor(i);
                }
                if tick >= iv.end {
                    i += 1;
                } else if i == 0 {
                    break;
                } else {
                    i -= 1;
                }
                if i >= self.intervals.len() {
                    break;
                }
            }
        }
        Cursor(self.intervals.partition_point(|iv| iv.end <= tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifts() -> CapacityTimeline {
        CapacityTimeline::new(vec![
            CapacityInterval::online(0, 100),
            CapacityInterval::offline(100, 150),
            CapacityInterval::online(150, 500),
            CapacityInterval::offline(500, 600),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_gaps_and_empty() {
        let gap = CapacityTimeline::new(vec![
            CapacityInterval::online(0, 10),
            CapacityInterval::online(20, 30),
        ]);
        assert_eq!(
            gap.unwrap_err(),
            CapacityError::Discontiguous {
                previous_end: 10,
                next_start: 20
            }
        );

        let empty = CapacityTimeline::new(vec![CapacityInterval::online(5, 5)]);
        assert!(matches!(empty, Err(CapacityError::EmptyInterval { .. })));
        assert!(CapacityTimeline::new(Vec::new()).is_err());
    }

    #[test]
    fn test_find_at_or_after() {
        let tl = shifts();
        assert_eq!(tl.find_at_or_after(0, None).unwrap(), Cursor(0));
        assert_eq!(tl.find_at_or_after(100, None).unwrap(), Cursor(1));
        assert_eq!(tl.find_at_or_after(499, None).unwrap(), Cursor(2));
        assert_eq!(tl.find_at_or_after(-50, None).unwrap(), Cursor(0));
        assert_eq!(
            tl.find_at_or_after(600, None).unwrap_err(),
            CapacityError::NoCoverage(600)
        );
    }

    #[test]
    fn test_find_at_or_before() {
        let tl = shifts();
        assert_eq!(tl.find_at_or_before(149, None).unwrap(), Cursor(1));
        assert_eq!(tl.find_at_or_before(10_000, None).unwrap(), Cursor(3));
        assert!(tl.find_at_or_before(-1, None).is_err());
    }

    #[test]
    fn test_hint_matches_binary_search() {
        let tl = shifts().with_walk_limit(1);
        for tick in [0, 99, 100, 149, 150, 499, 500, 599] {
            let expected = tl.find_at_or_after(tick, None).unwrap();
            for hint in 0..5 {
                assert_eq!(
                    tl.find_at_or_after(tick, Some(Cursor(hint))).unwrap(),
                    expected,
                    "tick {tick} hint {hint}"
                );
            }
        }
    }

    #[test]
    fn test_first_online() {
        let tl = shifts();
        assert_eq!(tl.find_first_online_forward(120, None), Some(Cursor(2)));
        assert_eq!(tl.find_first_online_forward(550, None), None);
        assert_eq!(tl.find_first_online_backward(120, None), Some(Cursor(0)));
        assert_eq!(tl.find_first_online_backward(550, None), Some(Cursor(2)));
    }

    #[test]
    fn test_navigation() {
        let tl = shifts();
        assert_eq!(tl.next(Cursor(3)), None);
        assert_eq!(tl.prev(Cursor(0)), None);
        assert_eq!(tl.next(Cursor(0)), Some(Cursor(1)));
        assert_eq!(tl.horizon_start(), 0);
        assert_eq!(tl.horizon_end(), 600);
    }

    #[test]
    fn test_clears_changeovers_between() {
        let tl = CapacityTimeline::new(vec![
            CapacityInterval::online(0, 100),
            CapacityInterval::offline(100, 200).clearing_changeovers(),
            CapacityInterval::online(200, 300),
        ])
        .unwrap();
        assert!(tl.clears_changeovers_between(50, 250));
        assert!(!tl.clears_changeovers_between(0, 100));
        assert!(!tl.clears_changeovers_between(200, 300));
    }
}
