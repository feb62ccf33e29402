//! Sequence-dependent changeover and cleanout trigger tables.
//!
//! # Changeover Tables
//!
//! A changeover table maps `(from_value, to_value)` of one sequencing
//! attribute to the setup and cleanout needed when an activity with
//! `to_value` follows one with `from_value` on the same resource.
//! Lookup falls back to the table default for differing values and to
//! "nothing" for equal values, unless an explicit entry exists.
//!
//! # Trigger Tables
//!
//! Triggers force a cleanout once enough production accumulated since the
//! last cleanout of at least the trigger's grade:
//!
//! | Trigger | Accumulates |
//! |---------|-------------|
//! | [`TimeCleanoutTrigger`] | Elapsed time |
//! | [`OperationCountTrigger`] | Operations run |
//! | [`ProductionUnitTrigger`] | Units produced |
//!
//! # Reference
//! Allahverdi et al. (2008), "A survey of scheduling problems with setup
//! times or costs", EJOR 187(3)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{CleanSpan, Tick};

/// Setup and cleanout for one attribute transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeChangeover {
    /// Setup ticks.
    pub setup: Tick,
    /// Cleanout required before the follower, if any.
    pub clean: Option<CleanSpan>,
    /// Static cost of the changeover.
    pub cost: f64,
}

impl AttributeChangeover {
    /// A setup-only changeover.
    pub fn setup(ticks: Tick) -> Self {
        Self {
            setup: ticks,
            ..Self::default()
        }
    }

    /// A cleanout-only changeover.
    pub fn clean(clean: CleanSpan) -> Self {
        Self {
            clean: Some(clean),
            ..Self::default()
        }
    }

    /// Sets the static cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }
}

/// Changeovers for one sequencing attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeoverTable {
    /// Attribute this table keys on.
    pub attribute: String,
    /// from-value → to-value → changeover.
    transitions: HashMap<String, HashMap<String, AttributeChangeover>>,
    /// Changeover for differing values with no explicit entry.
    pub default: Option<AttributeChangeover>,
}

impl ChangeoverTable {
    /// Creates an empty table for `attribute`.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            transitions: HashMap::new(),
            default: None,
        }
    }

    /// Sets the default changeover.
    pub fn with_default(mut self, default: AttributeChangeover) -> Self {
        self.default = Some(default);
        self
    }

    /// Builder: defines a transition.
    pub fn with_transition(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        changeover: AttributeChangeover,
    ) -> Self {
        self.set_transition(from, to, changeover);
        self
    }

    /// Defines the changeover between two attribute values.
    pub fn set_transition(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        changeover: AttributeChangeover,
    ) {
        self.transitions
            .entry(from.into())
            .or_default()
            .insert(to.into(), changeover);
    }

    /// Changeover from `from` to `to`.
    ///
    /// Explicit entries win. Equal values otherwise need nothing;
    /// differing values get the default.
    pub fn lookup(&self, from: &str, to: &str) -> Option<AttributeChangeover> {
        if let Some(c) = self.transitions.get(from).and_then(|row| row.get(to)) {
            return Some(*c);
        }
        if from == to {
            None
        } else {
            self.default
        }
    }

    /// Number of explicitly defined transitions.
    pub fn transition_count(&self) -> usize {
        self.transitions.values().map(|row| row.len()).sum()
    }

    /// Every explicit changeover.
    pub fn entries(&self) -> impl Iterator<Item = &AttributeChangeover> {
        self.transitions.values().flat_map(|row| row.values())
    }
}

/// Combined changeover across all attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChangeoverOutcome {
    /// Largest setup across attributes.
    pub setup: Tick,
    /// Merged cleanout across attributes.
    pub clean: Option<CleanSpan>,
    /// Summed cost across attributes.
    pub cost: f64,
}

/// All attribute changeover tables of a resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeoverTables {
    tables: Vec<ChangeoverTable>,
}

impl ChangeoverTables {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: adds a table.
    pub fn with_table(mut self, table: ChangeoverTable) -> Self {
        self.tables.push(table);
        self
    }

    /// Tables in definition order.
    pub fn tables(&self) -> &[ChangeoverTable] {
        &self.tables
    }

    /// Evaluates the changeover between two attribute maps.
    ///
    /// Attributes missing on either side contribute nothing.
    pub fn evaluate(
        &self,
        from: &HashMap<String, String>,
        to: &HashMap<String, String>,
    ) -> ChangeoverOutcome {
        let mut outcome = ChangeoverOutcome::default();
        for table in &self.tables {
            let (Some(f), Some(t)) = (from.get(&table.attribute), to.get(&table.attribute)) else {
                continue;
            };
            if let Some(c) = table.lookup(f, t) {
                outcome.setup = outcome.setup.max(c.setup);
                outcome.clean = CleanSpan::merge_opt(outcome.clean, c.clean);
                outcome.cost += c.cost;
            }
        }
        outcome
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Cleanout once `interval` ticks elapsed since the last qualifying cleanout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeCleanoutTrigger {
    pub interval: Tick,
    pub clean: CleanSpan,
}

/// Cleanout once `count` operations ran since the last qualifying cleanout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationCountTrigger {
    pub count: u32,
    pub clean: CleanSpan,
}

/// Cleanout once `quantity` units were produced since the last qualifying cleanout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionUnitTrigger {
    pub quantity: f64,
    pub clean: CleanSpan,
}

/// Trigger tables of a resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerTables {
    pub time: Vec<TimeCleanoutTrigger>,
    pub operation_count: Vec<OperationCountTrigger>,
    pub production_unit: Vec<ProductionUnitTrigger>,
}

impl TriggerTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a time trigger.
    pub fn with_time(mut self, interval: Tick, clean: CleanSpan) -> Self {
        self.time.push(TimeCleanoutTrigger { interval, clean });
        self
    }

    /// Adds an operation-count trigger.
    pub fn with_operation_count(mut self, count: u32, clean: CleanSpan) -> Self {
        self.operation_count
            .push(OperationCountTrigger { count, clean });
        self
    }

    /// Adds a production-unit trigger.
    pub fn with_production_units(mut self, quantity: f64, clean: CleanSpan) -> Self {
        self.production_unit
            .push(ProductionUnitTrigger { quantity, clean });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty() && self.operation_count.is_empty() && self.production_unit.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CleanSource;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_lookup_rules() {
        let mut table = ChangeoverTable::new("color").with_default(AttributeChangeover::setup(50));
        table.set_transition("white", "black", AttributeChangeover::setup(10));
        table.set_transition("black", "black", AttributeChangeover::setup(5));

        assert_eq!(table.lookup("white", "black").map(|c| c.setup), Some(10));
        assert_eq!(table.lookup("black", "white").map(|c| c.setup), Some(50));
        assert_eq!(table.lookup("black", "black").map(|c| c.setup), Some(5));
        assert_eq!(table.lookup("white", "white"), None);
        assert_eq!(table.transition_count(), 2);
    }

    #[test]
    fn test_evaluate_across_attributes() {
        let grade2 = CleanSpan::new(40, 2, CleanSource::SequenceAttribute);
        let grade1 = CleanSpan::new(90, 1, CleanSource::SequenceAttribute);
        let tables = ChangeoverTables::new()
            .with_table(ChangeoverTable::new("color").with_default(AttributeChangeover {
                setup: 30,
                clean: Some(grade2),
                cost: 4.0,
            }))
            .with_table(ChangeoverTable::new("width").with_default(AttributeChangeover {
                setup: 60,
                clean: Some(grade1),
                cost: 1.0,
            }));

        let out = tables.evaluate(
            &attrs(&[("color", "red"), ("width", "10")]),
            &attrs(&[("color", "blue"), ("width", "20")]),
        );
        assert_eq!(out.setup, 60);
        assert_eq!(out.clean, Some(grade2));
        assert!((out.cost - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_attribute_contributes_nothing() {
        let tables = ChangeoverTables::new()
            .with_table(ChangeoverTable::new("color").with_default(AttributeChangeover::setup(30)));
        let out = tables.evaluate(&attrs(&[]), &attrs(&[("color", "red")]));
        assert_eq!(out, ChangeoverOutcome::default());
    }

    #[test]
    fn test_trigger_builders() {
        let clean = CleanSpan::new(10, 1, CleanSource::TimeTrigger);
        let triggers = TriggerTables::new()
            .with_time(1_000, clean)
            .with_operation_count(5, clean)
            .with_production_units(250.0, clean);
        assert_eq!(triggers.time[0].interval, 1_000);
        assert_eq!(triggers.operation_count[0].count, 5);
        assert!(!triggers.is_empty());
        assert!(TriggerTables::new().is_empty());
    }
}
