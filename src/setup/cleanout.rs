//! Clean-before contributors.
//!
//! ```text
//! clean_before = resource ⊕ production ⊕ sequence ⊕ time ⊕ operation_count ⊕ production_unit
//! ```
//!
//! where `⊕` is [`CleanSpan::merge`]. Each contributor can be disabled in
//! the resource's [`CleanoutConfig`](crate::models::CleanoutConfig).

use tracing::debug;

use super::history::TriggerRecord;
use super::triggers;
use crate::models::{Activity, ChangeoverOutcome, CleanSpan, Resource, SequencedActivity, Tick};

/// Inputs shared by every contributor.
pub(crate) struct CleanoutInputs<'a> {
    pub resource: &'a Resource,
    pub activity: &'a Activity,
    pub neighbor: Option<&'a SequencedActivity>,
    pub changeover: &'a ChangeoverOutcome,
    /// Preceding production, most recent first.
    pub records: &'a [TriggerRecord],
    pub start: Tick,
}

/// Merged clean-before requirement, before partial progress.
pub(crate) fn clean_before(inputs: &CleanoutInputs<'_>) -> Option<CleanSpan> {
    let cfg = &inputs.resource.cleanout;
    let triggers = &inputs.resource.triggers;

    let resource = cfg
        .standard
        .filter(|_| cfg.use_resource_clean && inputs.neighbor.is_some());
    let production = inputs
        .neighbor
        .filter(|n| cfg.use_production_clean && n.product != inputs.activity.product)
        .and(inputs.activity.times.product_change_clean);
    let sequence = inputs.changeover.clean.filter(|_| cfg.use_sequence_clean);
    let time = cfg
        .use_time_triggers
        .then(|| triggers::time_cleanout(triggers, inputs.records, inputs.start))
        .flatten();
    let operation_count = cfg
        .use_operation_count_triggers
        .then(|| triggers::operation_count_cleanout(triggers, inputs.records))
        .flatten();
    let production_unit = cfg
        .use_production_unit_triggers
        .then(|| triggers::production_unit_cleanout(triggers, inputs.records))
        .flatten();

    let merged = [resource, production, sequence, time, operation_count, production_unit]
        .into_iter()
        .fold(None, CleanSpan::merge_opt);
    if let Some(c) = merged {
        debug!(activity = %inputs.activity.id, ticks = c.ticks, grade = c.grade, source = ?c.source, "clean-before required");
    }
    merged
}
