//! Usage profiles.
//!
//! A usage profile records exactly which slices of resource time a search
//! consumed, phase by phase, and how much capacity each slice supplied
//! after people adjustment.

use serde::{Deserialize, Serialize};

use super::{Phase, Tick};

/// One contiguous slice of resource time consumed by a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSegment {
    /// Segment start (inclusive).
    pub start: Tick,
    /// Segment end (exclusive).
    pub end: Tick,
    /// Capacity ticks supplied by this segment (after people adjustment).
    pub capacity_consumed: Tick,
    /// People multiplier that converted elapsed time into capacity.
    pub multiplier: f64,
    /// Cost per tick of the source interval.
    pub cost_rate: f64,
    /// Whether the source interval is overtime.
    pub overtime: bool,
    /// Phase this segment belongs to.
    pub phase: Phase,
}

impl UsageSegment {
    /// Elapsed time of the segment.
    #[inline]
    pub fn duration(&self) -> Tick {
        self.end - self.start
    }

    /// Cost of the segment.
    pub fn cost(&self) -> f64 {
        self.duration() as f64 * self.cost_rate
    }
}

/// Ordered, non-overlapping sequence of usage segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageProfile {
    segments: Vec<UsageSegment>,
}

impl UsageProfile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment at the end.
    pub fn push(&mut self, segment: UsageSegment) {
        debug_assert!(self.segments.last().map_or(true, |s| s.end <= segment.start));
        self.segments.push(segment);
    }

    /// Inserts a segment at the front (used by backward searches).
    pub fn push_front(&mut self, segment: UsageSegment) {
        debug_assert!(self.segments.first().map_or(true, |s| segment.end <= s.start));
        self.segments.insert(0, segment);
    }

    /// Appends every segment of `other`.
    pub fn extend(&mut self, other: UsageProfile) {
        for segment in other.segments {
            self.push(segment);
        }
    }

    /// Prepends every segment of `other`.
    pub fn prepend(&mut self, mut other: UsageProfile) {
        other.segments.append(&mut self.segments);
        self.segments = other.segments;
    }

    /// Removes all segments.
    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Segments in time order.
    pub fn segments(&self) -> &[UsageSegment] {
        &self.segments
    }

    /// Segments of one phase.
    pub fn phase_segments(&self, phase: Phase) -> impl Iterator<Item = &UsageSegment> {
        self.segments.iter().filter(move |s| s.phase == phase)
    }

    /// Start of the first segment.
    pub fn start(&self) -> Option<Tick> {
        self.segments.first().map(|s| s.start)
    }

    /// End of the last segment.
    pub fn end(&self) -> Option<Tick> {
        self.segments.last().map(|s| s.end)
    }

    /// Resource time held, with touching segments merged.
    pub fn spans(&self) -> Vec<(Tick, Tick)> {
        let mut spans: Vec<(Tick, Tick)> = Vec::with_capacity(self.segments.len());
        for seg in self.segments.iter().filter(|s| s.start < s.end) {
            match spans.last_mut() {
                Some(last) if last.1 == seg.start => last.1 = seg.end,
                _ => spans.push((seg.start, seg.end)),
            }
        }
        spans
    }

    /// Total capacity supplied across all segments.
    pub fn capacity_consumed(&self) -> Tick {
        self.segments.iter().map(|s| s.capacity_consumed).sum()
    }

    /// Total elapsed time across all segments (gaps excluded).
    pub fn elapsed(&self) -> Tick {
        self.segments.iter().map(|s| s.duration()).sum()
    }

    /// Total cost across all segments.
    pub fn cost(&self) -> f64 {
        self.segments.iter().map(|s| s.cost()).sum()
    }

    /// Whether any segment runs on overtime.
    pub fn uses_overtime(&self) -> bool {
        self.segments.iter().any(|s| s.overtime)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: Tick, end: Tick, phase: Phase) -> UsageSegment {
        UsageSegment {
            start,
            end,
            capacity_consumed: end - start,
            multiplier: 1.0,
            cost_rate: 2.0,
            overtime: false,
            phase,
        }
    }

    #[test]
    fn test_profile_totals() {
        let mut p = UsageProfile::new();
        p.push(seg(0, 50, Phase::Setup));
        p.push(seg(100, 200, Phase::Run));
        assert_eq!(p.start(), Some(0));
        assert_eq!(p.end(), Some(200));
        assert_eq!(p.elapsed(), 150);
        assert_eq!(p.capacity_consumed(), 150);
        assert!((p.cost() - 300.0).abs() < 1e-9);
        assert_eq!(p.phase_segments(Phase::Run).count(), 1);
    }

    #[test]
    fn test_prepend_keeps_order() {
        let mut later = UsageProfile::new();
        later.push(seg(100, 200, Phase::Run));
        let mut earlier = UsageProfile::new();
        earlier.push(seg(0, 100, Phase::Setup));

        later.prepend(earlier);
        assert_eq!(later.len(), 2);
        assert_eq!(later.segments()[0].phase, Phase::Setup);
        assert_eq!(later.segments()[1].phase, Phase::Run);
    }

    #[test]
    fn test_push_front() {
        let mut p = UsageProfile::new();
        p.push_front(seg(50, 80, Phase::Run));
        p.push_front(seg(10, 40, Phase::Run));
        assert_eq!(p.start(), Some(10));
        assert_eq!(p.end(), Some(80));
    }

    #[test]
    fn test_empty_profile() {
        let p = UsageProfile::new();
        assert!(p.is_empty());
        assert_eq!(p.start(), None);
        assert_eq!(p.capacity_consumed(), 0);
    }
}
