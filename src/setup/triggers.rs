//! Cleanout trigger scans.
//!
//! Each trigger walks preceding production records, most recent first,
//! accumulating elapsed time, operation count or produced quantity since
//! the last cleanout of at least the trigger's grade:
//!
//! 1. A record whose clean-after has the grade halts the scan (nothing
//!    accumulated after that cleanout reached the threshold).
//! 2. The record is accumulated; reaching the threshold fires the trigger.
//! 3. A record whose clean-before has the grade halts the scan after
//!    being counted.

use crate::models::{CleanSpan, Tick, TriggerTables};

use super::history::TriggerRecord;

fn covers(clean: Option<CleanSpan>, grade: u32) -> bool {
    clean.is_some_and(|c| c.grade >= grade)
}

/// Walks `records` until `reached` fires or a qualifying cleanout halts the scan.
fn scan<F>(records: &[TriggerRecord], grade: u32, mut reached: F) -> bool
where
    F: FnMut(&TriggerRecord) -> bool,
{
    for r in records {
        if covers(r.clean_after, grade) {
            return false;
        }
        if reached(r) {
            return true;
        }
        if covers(r.clean_before, grade) {
            return false;
        }
    }
    false
}

/// Merged cleanout of every time trigger due at `start`.
pub fn time_cleanout(triggers: &TriggerTables, records: &[TriggerRecord], start: Tick) -> Option<CleanSpan> {
    triggers
        .time
        .iter()
        .filter(|t| t.interval > 0)
        .filter(|t| scan(records, t.clean.grade, |r| start - r.start >= t.interval))
        .map(|t| t.clean)
        .reduce(CleanSpan::merge)
}

/// Merged cleanout of every operation-count trigger due.
pub fn operation_count_cleanout(triggers: &TriggerTables, records: &[TriggerRecord]) -> Option<CleanSpan> {
    triggers
        .operation_count
        .iter()
        .filter(|t| t.count > 0)
        .filter(|t| {
            let mut count = 0u32;
            scan(records, t.clean.grade, |_| {
                count += 1;
                count >= t.count
            })
        })
        .map(|t| t.clean)
        .reduce(CleanSpan::merge)
}

/// Merged cleanout of every production-unit trigger due.
pub fn production_unit_cleanout(triggers: &TriggerTables, records: &[TriggerRecord]) -> Option<CleanSpan> {
    triggers
        .production_unit
        .iter()
        .filter(|t| t.quantity > 0.0)
        .filter(|t| {
            let mut quantity = 0.0;
            scan(records, t.clean.grade, |r| {
                quantity += r.quantity;
                quantity >= t.quantity
            })
        })
        .map(|t| t.clean)
        .reduce(CleanSpan::merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CleanSource;

    fn rec(start: Tick, end: Tick, quantity: f64) -> TriggerRecord {
        TriggerRecord {
            start,
            end,
            quantity,
            clean_before: None,
            clean_after: None,
        }
    }

    fn clean(grade: u32, source: CleanSource) -> CleanSpan {
        CleanSpan::new(10 * grade as Tick, grade, source)
    }

    #[test]
    fn test_time_trigger_fires() {
        let triggers = TriggerTables::new().with_time(500, clean(1, CleanSource::TimeTrigger));
        // Most recent first.
        let records = [rec(300, 400, 1.0), rec(100, 300, 1.0)];
        assert!(time_cleanout(&triggers, &records, 550).is_none());
        assert!(time_cleanout(&triggers, &records, 600).is_some());
    }

    #[test]
    fn test_higher_grade_clean_halts_scan() {
        let triggers = TriggerTables::new().with_time(500, clean(1, CleanSource::TimeTrigger));
        let mut recent = rec(300, 400, 1.0);
        recent.clean_before = Some(clean(2, CleanSource::Resource));
        let records = [recent, rec(0, 300, 1.0)];
        // Only [300, ..) counts since the grade-2 cleanout.
        assert!(time_cleanout(&triggers, &records, 700).is_none());
        assert!(time_cleanout(&triggers, &records, 800).is_some());

        // A lower-grade cleanout does not halt a grade-3 trigger.
        let triggers = TriggerTables::new().with_time(500, clean(3, CleanSource::TimeTrigger));
        assert!(time_cleanout(&triggers, &records, 700).is_some());
    }

    #[test]
    fn test_clean_after_halts_before_counting() {
        let triggers = TriggerTables::new().with_operation_count(1, clean(1, CleanSource::OperationCountTrigger));
        let mut recent = rec(0, 100, 1.0);
        recent.clean_after = Some(clean(1, CleanSource::Resource));
        assert!(operation_count_cleanout(&triggers, &[recent]).is_none());
        assert!(operation_count_cleanout(&triggers, &[rec(0, 100, 1.0)]).is_some());
    }

    #[test]
    fn test_operation_count() {
        let triggers = TriggerTables::new().with_operation_count(3, clean(1, CleanSource::OperationCountTrigger));
        let two = [rec(100, 200, 1.0), rec(0, 100, 1.0)];
        let three = [rec(200, 300, 1.0), rec(100, 200, 1.0), rec(0, 100, 1.0)];
        assert!(operation_count_cleanout(&triggers, &two).is_none());
        assert!(operation_count_cleanout(&triggers, &three).is_some());
    }

    #[test]
    fn test_production_units_merge_grades() {
        let triggers = TriggerTables::new()
            .with_production_units(10.0, clean(1, CleanSource::ProductionUnitTrigger))
            .with_production_units(15.0, clean(2, CleanSource::ProductionUnitTrigger));
        let records = [rec(100, 200, 8.0), rec(0, 100, 8.0)];
        let c = production_unit_cleanout(&triggers, &records).unwrap();
        assert_eq!(c.grade, 2);

        let few = [rec(0, 100, 8.0)];
        assert!(production_unit_cleanout(&triggers, &few).is_none());
    }

    #[test]
    fn test_no_records_no_trigger() {
        let triggers = TriggerTables::new().with_time(1, clean(1, CleanSource::TimeTrigger));
        assert!(time_cleanout(&triggers, &[], 1_000).is_none());
    }
}
