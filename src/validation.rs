//! Configuration validation.
//!
//! Checks resource and activity settings before a simulation pass and
//! reports every problem found, not just the first:
//! - Duplicate resource IDs and duplicate changeover attributes
//! - Negative standard durations and changeover durations
//! - Non-positive cleanout trigger thresholds
//! - Attention percentages outside `1..=100`

use std::collections::HashSet;

use crate::models::{Activity, CleanSpan, Resource};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// Two changeover tables key on the same attribute.
    DuplicateAttribute,
    /// A duration that must not be negative is.
    NegativeDuration,
    /// A cleanout trigger can never fire.
    NonPositiveTrigger,
    /// An attention percentage is outside `1..=100`.
    AttentionOutOfRange,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_clean(errors: &mut Vec<ValidationError>, owner: &str, what: &str, clean: Option<&CleanSpan>) {
    if let Some(c) = clean.filter(|c| c.ticks < 0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::NegativeDuration,
            format!("{owner}: {what} has negative duration {}", c.ticks),
        ));
    }
}

/// Validates one resource's configuration.
///
/// # Example
///
/// ```
/// use u_capacity::models::{CleanSource, CleanSpan, Resource, TriggerTables};
/// use u_capacity::validation::validate_resource;
///
/// let ok = Resource::single("M1").with_standard_setup(30, 0.0);
/// assert!(validate_resource(&ok).is_ok());
///
/// let bad = Resource::single("M2")
///     .with_triggers(TriggerTables::new().with_time(0, CleanSpan::new(10, 1, CleanSource::TimeTrigger)));
/// assert_eq!(validate_resource(&bad).unwrap_err().len(), 1);
/// ```
pub fn validate_resource(resource: &Resource) -> ValidationResult {
    let mut errors = Vec::new();
    let id = resource.id.as_str();

    if resource.setup.standard < 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NegativeDuration,
            format!("{id}: standard setup is negative"),
        ));
    }
    check_clean(&mut errors, id, "standard clean", resource.cleanout.standard.as_ref());

    let triggers = &resource.triggers;
    for t in &triggers.time {
        if t.interval <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveTrigger,
                format!("{id}: time trigger interval {} is not positive", t.interval),
            ));
        }
        check_clean(&mut errors, id, "time trigger clean", Some(&t.clean));
    }
    for t in &triggers.operation_count {
        if t.count == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveTrigger,
                format!("{id}: operation-count trigger count is zero"),
            ));
        }
        check_clean(&mut errors, id, "operation-count trigger clean", Some(&t.clean));
    }
    for t in &triggers.production_unit {
        if t.quantity <= 0.0 || !t.quantity.is_finite() {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveTrigger,
                format!("{id}: production-unit trigger quantity {} is not positive", t.quantity),
            ));
        }
        check_clean(&mut errors, id, "production-unit trigger clean", Some(&t.clean));
    }

    let mut attributes = HashSet::new();
    for table in resource.changeovers.tables() {
        if !attributes.insert(table.attribute.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateAttribute,
                format!("{id}: duplicate changeover table for '{}'", table.attribute),
            ));
        }
        for c in table.entries().chain(table.default.as_ref()) {
            if c.setup < 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeDuration,
                    format!("{id}: '{}' changeover setup is negative", table.attribute),
                ));
            }
            check_clean(&mut errors, id, "changeover clean", c.clean.as_ref());
        }
    }

    finish(errors)
}

/// Validates a set of resources, including ID uniqueness.
pub fn validate_resources(resources: &[Resource]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();
    for r in resources {
        if !ids.insert(r.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate resource ID: {}", r.id),
            ));
        }
        if let Err(mut e) = validate_resource(r) {
            errors.append(&mut e);
        }
    }
    finish(errors)
}

/// Validates an activity's times and attention percentages.
pub fn validate_activity(activity: &Activity) -> ValidationResult {
    let mut errors = Vec::new();
    let id = activity.id.as_str();
    let t = &activity.times;

    let durations = [
        ("setup", t.setup),
        ("cycle", t.cycle),
        ("post-processing", t.post_processing),
        ("storage", t.storage),
        ("clean-after", t.clean_after),
    ];
    for (name, ticks) in durations {
        if ticks < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeDuration,
                format!("{id}: {name} time {ticks} is negative"),
            ));
        }
    }
    check_clean(&mut errors, id, "product-change clean", t.product_change_clean.as_ref());

    for (i, req) in activity.requirements.iter().enumerate() {
        if !(1..=100).contains(&req.attention_percent) {
            errors.push(ValidationError::new(
                ValidationErrorKind::AttentionOutOfRange,
                format!("{id}: requirement {i} attention {}% is outside 1..=100", req.attention_percent),
            ));
        }
    }

    finish(errors)
}
