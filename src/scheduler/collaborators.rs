//! Interfaces to the systems around the capacity core.
//!
//! The outer simulation loop supplies these. No-op implementations are
//! provided for callers (and tests) that do not need them.

use serde::{Deserialize, Serialize};

use crate::models::{Activity, MaterialRequirement, Resource, Tick};
use crate::search::{ReasonCode, SearchFailure, SearchSuccess};

/// Earliest-date source for materials.
pub trait MaterialAllocator {
    /// Earliest tick at or after `at` when `quantity` of `material` can be
    /// supplied to `activity`, or `None` if it never can.
    fn earliest_available(
        &self,
        activity: &Activity,
        material: &MaterialRequirement,
        quantity: f64,
        at: Tick,
    ) -> Option<Tick>;
}

/// Materials are always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconstrainedMaterials;

impl MaterialAllocator for UnconstrainedMaterials {
    fn earliest_available(&self, _: &Activity, _: &MaterialRequirement, _: f64, at: Tick) -> Option<Tick> {
        Some(at)
    }
}

/// Why the simulation should revisit a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryCause {
    /// A time-based cleanout trigger comes due.
    TimeCleanoutTrigger,
    /// A search failed with a retry tick.
    SearchFailed(ReasonCode),
}

/// Request to re-attempt scheduling on a resource at a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryEvent {
    pub resource_id: String,
    pub at: Tick,
    pub cause: RetryCause,
}

impl RetryEvent {
    /// Event for a failure carrying a retry tick.
    pub fn for_failure(resource_id: impl Into<String>, failure: &SearchFailure) -> Option<Self> {
        failure.retry.map(|at| Self {
            resource_id: resource_id.into(),
            at,
            cause: RetryCause::SearchFailed(failure.reason),
        })
    }
}

/// Receiver of retry events.
pub trait EventSink {
    fn retry_at(&mut self, event: RetryEvent);
}

impl EventSink for Vec<RetryEvent> {
    fn retry_at(&mut self, event: RetryEvent) {
        self.push(event);
    }
}

/// Outcome of a customization review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject { retry: Option<Tick> },
}

/// User hook reviewing a window before it is offered for commit.
pub trait ScheduleCustomization {
    fn review(&self, activity: &Activity, resource: &Resource, window: &SearchSuccess) -> Verdict;
}

/// Accepts every window.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomization;

impl ScheduleCustomization for NoCustomization {
    fn review(&self, _: &Activity, _: &Resource, _: &SearchSuccess) -> Verdict {
        Verdict::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_event_needs_retry() {
        let with = SearchFailure::new(ReasonCode::Occupied, Some(120));
        let event = RetryEvent::for_failure("M1", &with).unwrap();
        assert_eq!(event.at, 120);
        assert_eq!(event.cause, RetryCause::SearchFailed(ReasonCode::Occupied));

        let without = SearchFailure::new(ReasonCode::CanPause, None);
        assert!(RetryEvent::for_failure("M1", &without).is_none());
    }

    #[test]
    fn test_vec_sink() {
        let mut sink = Vec::new();
        sink.retry_at(RetryEvent {
            resource_id: "M1".into(),
            at: 10,
            cause: RetryCause::TimeCleanoutTrigger,
        });
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_defaults() {
        let activity = Activity::new("A", "J");
        let m = MaterialRequirement::new("steel", 1.0);
        assert_eq!(UnconstrainedMaterials.earliest_available(&activity, &m, 5.0, 42), Some(42));
    }
}
