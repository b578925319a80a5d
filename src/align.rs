// 🔗 Aligner - reconcile two independently-indexed time series
// Finds the entities both tables know about and, per entity, the window of
// years with a usable observation on both sides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::table::TimeSeriesTable;

// ============================================================================
// ALIGNED WINDOW
// ============================================================================

/// AlignedEntityWindow - the valid overlapping observations for one entity
///
/// `years`, `treatment` and `outcome` are parallel and sorted by year:
/// position i of each holds the observation for `years[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedEntityWindow {
    pub entity: String,
    pub years: Vec<i32>,
    pub treatment: Vec<f64>,
    pub outcome: Vec<f64>,
}

impl AlignedEntityWindow {
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn mean_treatment(&self) -> f64 {
        mean(&self.treatment)
    }

    pub fn mean_outcome(&self) -> f64 {
        mean(&self.outcome)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// ============================================================================
// ALIGNMENT OUTCOME
// ============================================================================

/// AlignmentOutcome - what window_for found for one entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlignmentOutcome {
    /// Non-empty window, entity can be estimated
    Window(AlignedEntityWindow),

    /// The two valid-year sets do not overlap at all
    NoCommonYears,

    /// Shared years existed but gathering samples left nothing
    InsufficientData,
}

impl AlignmentOutcome {
    pub fn is_window(&self) -> bool {
        matches!(self, AlignmentOutcome::Window(_))
    }

    /// Reason text for skip logging. `None` for a usable window.
    pub fn skip_reason(&self) -> Option<&'static str> {
        match self {
            AlignmentOutcome::Window(_) => None,
            AlignmentOutcome::NoCommonYears => Some("no common valid years"),
            AlignmentOutcome::InsufficientData => Some("insufficient data"),
        }
    }
}

// ============================================================================
// ALIGNMENT OPERATIONS
// ============================================================================

/// Entities present in both tables, in the first table's first-seen order.
///
/// An entity present in only one table is not a candidate at all: it produces
/// neither a record nor a skip entry downstream.
pub fn intersect_entities(a: &TimeSeriesTable, b: &TimeSeriesTable) -> Vec<String> {
    a.entities()
        .filter(|key| b.contains(key))
        .cloned()
        .collect()
}

/// Years where this entity has a present, non-zero value.
///
/// Zero is treated as not observed: surveillance exports use 0 as a
/// placeholder for "no report".
pub fn valid_years(table: &TimeSeriesTable, entity: &str) -> BTreeSet<i32> {
    table
        .years_observed(entity)
        .into_iter()
        .filter(|&year| table.value(entity, year).map_or(false, |v| v != 0.0))
        .collect()
}

/// Compute the aligned window for one entity across both tables.
pub fn window_for(
    entity: &str,
    treatment_table: &TimeSeriesTable,
    outcome_table: &TimeSeriesTable,
) -> AlignmentOutcome {
    let treatment_years = valid_years(treatment_table, entity);
    let outcome_years = valid_years(outcome_table, entity);

    // BTreeSet intersection iterates ascending, so the window is year-sorted
    let shared: Vec<i32> = treatment_years.intersection(&outcome_years).copied().collect();
    if shared.is_empty() {
        return AlignmentOutcome::NoCommonYears;
    }

    let mut years = Vec::with_capacity(shared.len());
    let mut treatment = Vec::with_capacity(shared.len());
    let mut outcome = Vec::with_capacity(shared.len());
    for year in shared {
        if let (Some(t), Some(o)) = (
            treatment_table.value(entity, year),
            outcome_table.value(entity, year),
        ) {
            years.push(year);
            treatment.push(t);
            outcome.push(o);
        }
    }

    if years.is_empty() {
        return AlignmentOutcome::InsufficientData;
    }

    AlignmentOutcome::Window(AlignedEntityWindow {
        entity: entity.to_string(),
        years,
        treatment,
        outcome,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table(rows: &[(&str, &[(i32, f64)])]) -> TimeSeriesTable {
        let mut t = TimeSeriesTable::new();
        for (key, pairs) in rows {
            let row: HashMap<i32, f64> = pairs.iter().copied().collect();
            t.insert_row(key, row);
        }
        t
    }

    #[test]
    fn test_intersection_keeps_first_table_order() {
        let a = table(&[
            ("Niger", &[(2000, 1.0)]),
            ("Albania", &[(2000, 1.0)]),
            ("Mexico", &[(2000, 1.0)]),
        ]);
        let b = table(&[("Mexico", &[(2000, 1.0)]), ("Niger", &[(2000, 1.0)])]);

        assert_eq!(intersect_entities(&a, &b), ["niger", "mexico"]);
    }

    #[test]
    fn test_entity_in_one_table_is_not_a_candidate() {
        let a = table(&[("France", &[(2000, 80.0)])]);
        let b = table(&[("Spain", &[(2000, 50.0)])]);

        assert!(intersect_entities(&a, &b).is_empty());
    }

    #[test]
    fn test_zero_is_never_a_valid_year() {
        let t = table(&[("France", &[(2000, 80.0), (2001, 0.0), (2002, 90.0)])]);

        let years = valid_years(&t, "france");
        assert!(years.contains(&2000));
        assert!(!years.contains(&2001));
        assert!(years.contains(&2002));
    }

    #[test]
    fn test_window_excludes_zero_and_missing_on_either_side() {
        // Zeros on either side knock the year out of the window
        let a = table(&[("X", &[(2000, 80.0), (2001, 0.0), (2002, 90.0)])]);
        let b = table(&[("x", &[(2000, 50.0), (2001, 40.0), (2002, 0.0)])]);

        let outcome = window_for("x", &a, &b);
        match outcome {
            AlignmentOutcome::Window(window) => {
                assert_eq!(window.years, vec![2000]);
                assert_eq!(window.treatment, vec![80.0]);
                assert_eq!(window.outcome, vec![50.0]);
                assert_eq!(window.mean_treatment(), 80.0);
                assert_eq!(window.mean_outcome(), 50.0);
            }
            other => panic!("expected window, got {:?}", other),
        }
    }

    #[test]
    fn test_window_is_year_sorted_and_parallel() {
        let a = table(&[("France", &[(2005, 5.0), (2001, 1.0), (2003, 3.0)])]);
        let b = table(&[("France", &[(2001, 10.0), (2003, 30.0), (2005, 50.0)])]);

        match window_for("france", &a, &b) {
            AlignmentOutcome::Window(window) => {
                assert_eq!(window.years, vec![2001, 2003, 2005]);
                assert_eq!(window.treatment, vec![1.0, 3.0, 5.0]);
                assert_eq!(window.outcome, vec![10.0, 30.0, 50.0]);
                assert_eq!(window.len(), 3);
            }
            other => panic!("expected window, got {:?}", other),
        }
    }

    #[test]
    fn test_no_overlap_reports_no_common_years() {
        let a = table(&[("France", &[(2000, 80.0)])]);
        let b = table(&[("France", &[(2001, 50.0)])]);

        let outcome = window_for("france", &a, &b);
        assert!(!outcome.is_window());
        assert_eq!(outcome.skip_reason(), Some("no common valid years"));
    }

    #[test]
    fn test_all_zero_series_reports_no_common_years() {
        let a = table(&[("France", &[(2000, 0.0), (2001, 0.0)])]);
        let b = table(&[("France", &[(2000, 50.0), (2001, 40.0)])]);

        assert_eq!(
            window_for("france", &a, &b).skip_reason(),
            Some("no common valid years")
        );
    }

    #[test]
    fn test_unknown_entity_reports_no_common_years() {
        let a = table(&[("France", &[(2000, 80.0)])]);
        let b = table(&[("France", &[(2000, 50.0)])]);

        assert!(!window_for("atlantis", &a, &b).is_window());
    }
}
