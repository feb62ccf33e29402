//! Resource model.
//!
//! A resource owns a capacity timeline and the static configuration the
//! setup/cleanout calculator reads: which contributors are enabled,
//! standard setup and cleanout, changeover tables and cleanout triggers.
//!
//! # Capacity Types
//!
//! | Type | Double-booking rule |
//! |------|---------------------|
//! | `SingleTasking` | Strictly exclusive |
//! | `MultiTasking` | Bounded by summed attention |
//! | `Infinite` | Never checked |
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use serde::{Deserialize, Serialize};

use super::{ChangeoverTables, CleanSpan, Tick, TriggerTables};

/// A resource that can be assigned to activities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// How concurrent commitments are admitted.
    pub capacity_type: CapacityType,
    /// Setup contributor settings.
    pub setup: SetupConfig,
    /// Cleanout contributor settings.
    pub cleanout: CleanoutConfig,
    /// Attribute changeover tables.
    pub changeovers: ChangeoverTables,
    /// Cleanout trigger tables.
    pub triggers: TriggerTables,
}

/// Capacity type of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityType {
    /// One activity at a time.
    SingleTasking,
    /// Several activities share attention up to the limit.
    MultiTasking,
    /// Unlimited concurrency.
    Infinite,
}

impl CapacityType {
    /// Whether committed blocks occupy the timeline exclusively.
    #[inline]
    pub fn is_exclusive(self) -> bool {
        self == CapacityType::SingleTasking
    }
}

/// Setup contributors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    /// Resource-level standard setup (ticks) applied to every activity.
    pub standard: Tick,
    /// Static cost of the standard setup.
    pub standard_cost: f64,
    /// Enables the resource standard setup.
    pub use_resource_setup: bool,
    /// Enables the activity's own operation setup.
    pub use_operation_setup: bool,
    /// Enables attribute changeover setup.
    pub use_sequence_setup: bool,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            standard: 0,
            standard_cost: 0.0,
            use_resource_setup: false,
            use_operation_setup: true,
            use_sequence_setup: true,
        }
    }
}

/// Cleanout contributors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanoutConfig {
    /// Resource standard cleanout performed between any two activities.
    pub standard: Option<CleanSpan>,
    /// Enables the resource standard cleanout.
    pub use_resource_clean: bool,
    /// Enables product-change cleanout.
    pub use_production_clean: bool,
    /// Enables attribute changeover cleanout.
    pub use_sequence_clean: bool,
    /// Enables time triggers.
    pub use_time_triggers: bool,
    /// Enables operation-count triggers.
    pub use_operation_count_triggers: bool,
    /// Enables production-unit triggers.
    pub use_production_unit_triggers: bool,
}

impl Default for CleanoutConfig {
    fn default() -> Self {
        Self {
            standard: None,
            use_resource_clean: true,
            use_production_clean: true,
            use_sequence_clean: true,
            use_time_triggers: true,
            use_operation_count_triggers: true,
            use_production_unit_triggers: true,
        }
    }
}

impl Resource {
    /// Creates a resource with the given capacity type.
    pub fn new(id: impl Into<String>, capacity_type: CapacityType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            capacity_type,
            setup: SetupConfig::default(),
            cleanout: CleanoutConfig::default(),
            changeovers: ChangeoverTables::new(),
            triggers: TriggerTables::new(),
        }
    }

    /// Creates a single-tasking resource.
    pub fn single(id: impl Into<String>) -> Self {
        Self::new(id, CapacityType::SingleTasking)
    }

    /// Creates a multi-tasking resource.
    pub fn multi(id: impl Into<String>) -> Self {
        Self::new(id, CapacityType::MultiTasking)
    }

    /// Creates an infinite-capacity resource.
    pub fn infinite(id: impl Into<String>) -> Self {
        Self::new(id, CapacityType::Infinite)
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables a resource standard setup.
    pub fn with_standard_setup(mut self, ticks: Tick, cost: f64) -> Self {
        self.setup.standard = ticks;
        self.setup.standard_cost = cost;
        self.setup.use_resource_setup = true;
        self
    }

    /// Sets the resource standard cleanout.
    pub fn with_standard_clean(mut self, clean: CleanSpan) -> Self {
        self.cleanout.standard = Some(clean);
        self
    }

    /// Replaces the setup settings.
    pub fn with_setup(mut self, setup: SetupConfig) -> Self {
        self.setup = setup;
        self
    }

    /// Replaces the cleanout settings.
    pub fn with_cleanout(mut self, cleanout: CleanoutConfig) -> Self {
        self.cleanout = cleanout;
        self
    }

    /// Sets the changeover tables.
    pub fn with_changeovers(mut self, changeovers: ChangeoverTables) -> Self {
        self.changeovers = changeovers;
        self
    }

    /// Sets the trigger tables.
    pub fn with_triggers(mut self, triggers: TriggerTables) -> Self {
        self.triggers = triggers;
        self
    }
}
