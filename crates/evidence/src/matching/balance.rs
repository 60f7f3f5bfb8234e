//! Covariate balance before and after matching.

use serde::{Deserialize, Serialize};

use crate::input::DataTable;
use crate::stats::descriptive::mean;
use crate::stats::standardized_mean_difference;

/// |SMD| below this counts as balanced.
pub const BALANCE_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRow {
    pub covariate: String,
    pub treated_mean: f64,
    pub control_mean: f64,
    /// Signed standardized mean difference (treated minus control).
    pub smd: f64,
    pub balanced: bool,
}

impl BalanceRow {
    fn new(covariate: &str, treated_mean: f64, control_mean: f64, smd: f64) -> Self {
        Self {
            covariate: covariate.to_string(),
            treated_mean,
            control_mean,
            smd,
            balanced: smd.abs() < BALANCE_THRESHOLD,
        }
    }
}

/// Pre- and post-match balance tables, in covariate order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BalanceTables {
    pub before: Vec<BalanceRow>,
    pub after: Vec<BalanceRow>,
}

fn values(table: &DataTable, rows: &[usize], col: usize) -> Vec<f64> {
    rows.iter().filter_map(|&row| table.numeric_cell(row, col)).collect()
}

fn arm_rows(table: &DataTable, treatment_col: usize, arm: f64) -> Vec<usize> {
    (0..table.row_count())
        .filter(|&row| table.numeric_cell(row, treatment_col) == Some(arm))
        .collect()
}

/// Balance of every numeric covariate.
///
/// Before matching every row with a 0/1 treatment contributes; after matching
/// only the matched rows do.
pub(crate) fn balance_tables(
    table: &DataTable,
    treatment_col: usize,
    covariates: &[(String, usize)],
    matched_treated: &[usize],
    matched_controls: &[usize],
) -> BalanceTables {
    let treated_rows = arm_rows(table, treatment_col, 1.0);
    let control_rows = arm_rows(table, treatment_col, 0.0);

    let mut tables = BalanceTables::default();
    for (name, col) in covariates {
        if !table.is_numeric_column(*col) {
            continue;
        }

        let t_before = values(table, &treated_rows, *col);
        let c_before = values(table, &control_rows, *col);
        let smd_before = standardized_mean_difference(&t_before, &c_before);
        tables.before.push(BalanceRow::new(
            name,
            mean(&t_before).unwrap_or(0.0),
            mean(&c_before).unwrap_or(0.0),
            smd_before,
        ));

        let after = if matched_treated.is_empty() || matched_controls.is_empty() {
            BalanceRow::new(name, 0.0, 0.0, smd_before)
        } else {
            let t_after = values(table, matched_treated, *col);
            let c_after = values(table, matched_controls, *col);
            BalanceRow::new(
                name,
                mean(&t_after).unwrap_or(0.0),
                mean(&c_after).unwrap_or(0.0),
                standardized_mean_difference(&t_after, &c_after),
            )
        };
        tables.after.push(after);
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::from_records(
            ["treat", "age", "site"],
            vec![
                vec!["1", "60", "a"],
                vec!["1", "64", "b"],
                vec!["0", "40", "a"],
                vec!["0", "62", "b"],
                vec!["0", "NA", "a"],
                vec!["0", "58", "b"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_balance_skips_text_covariates() {
        let covariates = vec![("age".to_string(), 1), ("site".to_string(), 2)];
        let tables = balance_tables(&table(), 0, &covariates, &[0, 1], &[3, 5]);
        assert_eq!(tables.before.len(), 1);
        assert_eq!(tables.before[0].covariate, "age");

        // before: treated 62 vs control mean(40, 62, 58) = 53.33
        assert!((tables.before[0].treated_mean - 62.0).abs() < 1e-12);
        assert!((tables.before[0].control_mean - 160.0 / 3.0).abs() < 1e-9);
        assert!(!tables.before[0].balanced);

        // after: treated (60, 64) vs control (62, 58), mean diff 2, pooled sd sqrt(8)
        let after = &tables.after[0];
        assert!((after.smd - 2.0 / 8f64.sqrt()).abs() < 1e-12);
        assert!(after.smd > 0.0);
    }

    #[test]
    fn test_nothing_matched_keeps_pre_match_smd() {
        let covariates = vec![("age".to_string(), 1)];
        let tables = balance_tables(&table(), 0, &covariates, &[], &[]);
        assert_eq!(tables.after[0].treated_mean, 0.0);
        assert_eq!(tables.after[0].control_mean, 0.0);
        assert_eq!(tables.after[0].smd, tables.before[0].smd);
    }

    #[test]
    fn test_balanced_flag_ignores_direction() {
        assert!(BalanceRow::new("x", 0.0, 0.0, -0.09).balanced);
        assert!(!BalanceRow::new("x", 0.0, 0.0, -0.1).balanced);
        assert!(!BalanceRow::new("x", 0.0, 0.0, 0.25).balanced);
    }
}
