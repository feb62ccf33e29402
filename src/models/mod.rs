//! Capacity-allocation domain models.
//!
//! Provides the data types shared by the timeline, the capacity search,
//! the setup/cleanout calculator and the block scheduler.
//!
//! # Domain Mappings
//!
//! | u-capacity | Manufacturing | Meaning |
//! |------------|---------------|---------|
//! | Activity | Operation instance | Unit of work needing resource time |
//! | Resource | Machine / Cell / Crew | Owner of a capacity timeline |
//! | CapacityInterval | Shift / Downtime | A slice of the resource's calendar |
//! | Block | Scheduled operation | Committed resource time |
//! | Phase | Clean, Setup, Run, ... | Segment of an activity's requirement |
//!
//! # Time Model
//! All times are integer ticks relative to a scheduling epoch. Intervals
//! are half-open: `[start, end)`.

mod activity;
mod block;
mod changeover;
mod interval;
mod required;
mod resource;
mod usage;

pub use activity::{
    Activity, MaterialRequirement, PeopleRule, ProductionStatus, ReportedProgress,
    ResourceRequirement, StandardTimes,
};
pub use block::{Block, BlockId, SequencedActivity};
pub use changeover::{
    AttributeChangeover, ChangeoverOutcome, ChangeoverTable, ChangeoverTables, OperationCountTrigger,
    ProductionUnitTrigger, TimeCleanoutTrigger, TriggerTables,
};
pub use interval::{CapacityInterval, IntervalType, Phase, PhaseSet};
pub use required::{CleanSource, CleanSpan, RequiredCapacity, RequiredSpan, SpanCost};
pub use resource::{CapacityType, CleanoutConfig, Resource, SetupConfig};
pub use usage::{UsageProfile, UsageSegment};

/// Simulation time unit.
pub type Tick = i64;
