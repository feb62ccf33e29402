//! Activity (operation instance) model.
//!
//! An activity is the schedulable unit of work. This is the data the
//! external activity accessor provides to the capacity core: standard
//! phase times, reported partial progress, production status, the people
//! usage rule, and the sequencing attributes used for changeovers.
//!
//! # Duration Model
//!
//! Standard resource time splits into:
//! - **Setup**: Preparation (may be replaced by sequence-dependent setup)
//! - **Run**: `cycles × cycle_ticks`
//! - **Post-processing**: Cooling, curing, inspection on the resource
//! - **Storage**: Time the output occupies the resource afterwards
//! - **Clean-after**: Cleanout the operation always leaves behind

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{CleanSpan, SequencedActivity, Tick};

/// An activity to be placed on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique activity identifier.
    pub id: String,
    /// Parent job identifier.
    pub job_id: String,
    /// Operation this activity instantiates.
    pub operation_id: String,
    /// Product made (production cleanouts trigger on product change).
    pub product: String,
    /// Batch this activity belongs to, if batched.
    pub batch_id: Option<String>,
    /// Operation setup code; equal codes back to back skip operation setup.
    pub setup_code: Option<String>,
    /// Numeric setup position used by sawtooth sequencing.
    pub setup_number: f64,
    /// Sequencing attributes (attribute name → value).
    pub attributes: HashMap<String, String>,
    /// Standard resource time per phase.
    pub times: StandardTimes,
    /// Progress reported from the shop floor.
    pub progress: ReportedProgress,
    /// Current production status.
    pub status: ProductionStatus,
    /// How people on the resource speed up the run phase.
    pub people: PeopleRule,
    /// Whether the activity may pause across unusable intervals.
    pub can_pause: bool,
    /// Capacity code the activity requires, if any.
    pub capacity_code: Option<String>,
    /// Resource requirements (indexed by position).
    pub requirements: Vec<ResourceRequirement>,
    /// Materials that must be available before the activity starts.
    pub materials: Vec<MaterialRequirement>,
    /// Finishing after this tick makes the activity late.
    pub late_boundary: Option<Tick>,
    /// Resource the activity is locked to, if any.
    pub locked_resource: Option<String>,
}

impl Activity {
    /// Creates a new activity with one default resource requirement.
    pub fn new(id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            job_id: job_id.into(),
            operation_id: String::new(),
            product: String::new(),
            batch_id: None,
            setup_code: None,
            setup_number: 0.0,
            attributes: HashMap::new(),
            times: StandardTimes::default(),
            progress: ReportedProgress::default(),
            status: ProductionStatus::Ready,
            people: PeopleRule::UseAllAvailable,
            can_pause: true,
            capacity_code: None,
            requirements: vec![ResourceRequirement::new()],
            materials: Vec::new(),
            late_boundary: None,
            locked_resource: None,
        }
    }

    /// Sets the operation.
    pub fn with_operation(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = operation_id.into();
        self
    }

    /// Sets the product.
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    /// Sets the batch.
    pub fn with_batch(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    /// Sets the setup code.
    pub fn with_setup_code(mut self, code: impl Into<String>) -> Self {
        self.setup_code = Some(code.into());
        self
    }

    /// Sets the sawtooth setup number.
    pub fn with_setup_number(mut self, number: f64) -> Self {
        self.setup_number = number;
        self
    }

    /// Adds a sequencing attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the standard times.
    pub fn with_times(mut self, times: StandardTimes) -> Self {
        self.times = times;
        self
    }

    /// Sets a run-only duration (one cycle of `ticks`).
    pub fn with_run_time(mut self, ticks: Tick) -> Self {
        self.times = StandardTimes::run(ticks);
        self
    }

    /// Records reported progress and the current status.
    pub fn with_progress(mut self, status: ProductionStatus, progress: ReportedProgress) -> Self {
        self.status = status;
        self.progress = progress;
        self
    }

    /// Sets the people rule.
    pub fn with_people(mut self, people: PeopleRule) -> Self {
        self.people = people;
        self
    }

    /// Forbids pausing across unusable intervals.
    pub fn without_pausing(mut self) -> Self {
        self.can_pause = false;
        self
    }

    /// Sets the capacity code.
    pub fn with_capacity_code(mut self, code: impl Into<String>) -> Self {
        self.capacity_code = Some(code.into());
        self
    }

    /// Replaces the resource requirements.
    pub fn with_requirements(mut self, requirements: Vec<ResourceRequirement>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Adds a material requirement.
    pub fn with_material(mut self, material: MaterialRequirement) -> Self {
        self.materials.push(material);
        self
    }

    /// Sets the late boundary.
    pub fn with_late_boundary(mut self, tick: Tick) -> Self {
        self.late_boundary = Some(tick);
        self
    }

    /// Locks the activity to a resource.
    pub fn locked_to(mut self, resource_id: impl Into<String>) -> Self {
        self.locked_resource = Some(resource_id.into());
        self
    }

    /// Whether the activity has started but not finished.
    pub fn is_running(&self) -> bool {
        !matches!(
            self.status,
            ProductionStatus::Ready | ProductionStatus::Finished
        )
    }

    /// Requirement at `index`.
    pub fn requirement(&self, index: usize) -> Option<&ResourceRequirement> {
        self.requirements.get(index)
    }

    /// Total quantity the activity produces.
    pub fn required_quantity(&self) -> f64 {
        self.times.cycles as f64 * self.times.quantity_per_cycle
    }

    /// Sequencing summary for left-neighbor bookkeeping.
    pub fn sequenced(&self) -> SequencedActivity {
        SequencedActivity {
            activity_id: self.id.clone(),
            job_id: self.job_id.clone(),
            product: self.product.clone(),
            batch_id: self.batch_id.clone(),
            setup_code: self.setup_code.clone(),
            setup_number: self.setup_number,
            attributes: self.attributes.clone(),
        }
    }
}

/// Standard resource time per phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardTimes {
    /// Operation setup (ticks).
    pub setup: Tick,
    /// Time per cycle (ticks).
    pub cycle: Tick,
    /// Number of cycles.
    pub cycles: u32,
    /// Units produced per cycle.
    pub quantity_per_cycle: f64,
    /// Post-processing (ticks).
    pub post_processing: Tick,
    /// Storage (ticks).
    pub storage: Tick,
    /// Cleanout performed after the activity (ticks).
    pub clean_after: Tick,
    /// Grade of the clean-after, compared against later cleanout rules.
    #[serde(default)]
    pub clean_after_grade: u32,
    /// Cleanout required before this operation when the product changes.
    pub product_change_clean: Option<CleanSpan>,
}

impl StandardTimes {
    /// Creates times with all phase components.
    pub fn new(setup: Tick, cycle: Tick, cycles: u32, post_processing: Tick) -> Self {
        Self {
            setup,
            cycle,
            cycles,
            quantity_per_cycle: 1.0,
            post_processing,
            storage: 0,
            clean_after: 0,
            clean_after_grade: 0,
            product_change_clean: None,
        }
    }

    /// Run-only times: one cycle of `ticks`.
    pub fn run(ticks: Tick) -> Self {
        Self::new(0, ticks, 1, 0)
    }

    /// Sets units per cycle.
    pub fn with_quantity_per_cycle(mut self, quantity: f64) -> Self {
        self.quantity_per_cycle = quantity;
        self
    }

    /// Sets storage time.
    pub fn with_storage(mut self, ticks: Tick) -> Self {
        self.storage = ticks;
        self
    }

    /// Sets clean-after time.
    pub fn with_clean_after(mut self, ticks: Tick) -> Self {
        self.clean_after = ticks;
        self
    }

    /// Sets the clean-after grade.
    pub fn with_clean_after_grade(mut self, grade: u32) -> Self {
        self.clean_after_grade = grade;
        self
    }

    /// Sets the product-change cleanout.
    pub fn with_product_change_clean(mut self, clean: CleanSpan) -> Self {
        self.product_change_clean = Some(clean);
        self
    }

    /// Standard run time (`cycles × cycle`).
    pub fn run_ticks(&self) -> Tick {
        self.cycle * self.cycles as Tick
    }

    /// Total standard time (setup + run + post-processing + storage + clean-after).
    pub fn total(&self) -> Tick {
        self.setup + self.run_ticks() + self.post_processing + self.storage + self.clean_after
    }
}

impl Default for StandardTimes {
    fn default() -> Self {
        Self::run(0)
    }
}

/// Progress reported against the activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportedProgress {
    /// Cleanout time already performed.
    pub clean: Tick,
    /// Setup time already performed.
    pub setup: Tick,
    /// Run time already performed.
    pub run: Tick,
    /// Post-processing already performed.
    pub post_processing: Tick,
    /// Storage already performed.
    pub storage: Tick,
    /// Cycles already completed.
    pub cycles: u32,
}

/// Shop-floor status of an activity.
///
/// Declaration order follows the phases, so `status > SettingUp` means
/// setup is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductionStatus {
    Ready,
    Cleaning,
    SettingUp,
    Running,
    PostProcessing,
    Storing,
    Finished,
}

/// How the people available in an interval convert elapsed time into
/// run capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PeopleRule {
    /// Use everyone available: capacity = elapsed × people.
    UseAllAvailable,
    /// Use a fixed crew: capacity = elapsed × min(requested, available) / requested.
    UseSpecifiedNbr(f64),
    /// Use as many full crews as fit: capacity = elapsed × ⌊available / requested⌋.
    UseMultipleOfSpecifiedNbr(f64),
}

/// A resource requirement of an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequirement {
    /// Descriptive name (e.g., "Machine", "Operator").
    pub name: String,
    /// Share of a multitasking resource's attention consumed (1..=100).
    pub attention_percent: u32,
}

impl ResourceRequirement {
    /// Creates a requirement taking full attention.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            attention_percent: 100,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the attention percentage.
    pub fn with_attention(mut self, percent: u32) -> Self {
        self.attention_percent = percent;
        self
    }
}

impl Default for ResourceRequirement {
    fn default() -> Self {
        Self::new()
    }
}

/// A material the activity consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialRequirement {
    /// Material item identifier.
    pub item_id: String,
    /// Units of material per unit produced.
    pub quantity_per_unit: f64,
}

impl MaterialRequirement {
    pub fn new(item_id: impl Into<String>, quantity_per_unit: f64) -> Self {
        Self {
            item_id: item_id.into(),
            quantity_per_unit,
        }
    }
}
