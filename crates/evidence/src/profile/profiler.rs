//! Dataset profiling into a [`QualityReport`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::kind::detect_kind;
use crate::input::DataTable;
use crate::rigor::{IssueSeverity, NumericSummary, QualityIssue, QualityReport};
use crate::stats::RunningStats;
use crate::stats::descriptive::median;

/// Thresholds for flagging data-quality issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Columns missing more than this percentage are flagged.
    pub high_missing_pct: f64,
    /// Flagged columns at or above this percentage are critical.
    pub critical_missing_pct: f64,
    /// Tables with fewer rows are flagged as critically small.
    pub small_sample: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            high_missing_pct: 20.0,
            critical_missing_pct: 50.0,
            small_sample: 30,
        }
    }
}

/// Profiles a table: missingness, numeric summaries, column kinds and issues.
#[derive(Debug, Clone, Default)]
pub struct DatasetProfiler {
    config: ProfileConfig,
}

impl DatasetProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProfileConfig) -> Self {
        Self { config }
    }

    pub fn profile(&self, table: &DataTable) -> QualityReport {
        let rows = table.row_count();
        let mut report = QualityReport {
            row_count: rows,
            column_count: table.column_count(),
            ..QualityReport::default()
        };

        for (col, name) in table.headers.iter().enumerate() {
            let missing = table.column_values(col).filter(|v| DataTable::is_null_value(v)).count();
            let pct = if rows > 0 {
                (missing as f64 / rows as f64 * 10_000.0).round() / 100.0
            } else {
                0.0
            };
            report.missing_counts.insert(name.clone(), missing);
            report.missing_percentage.insert(name.clone(), pct);
            report
                .column_types
                .insert(name.clone(), detect_kind(table, col).to_string());

            if table.is_numeric_column(col) {
                if let Some(summary) = numeric_summary(table, col) {
                    report.numeric_summary.insert(name.clone(), summary);
                }
            }
        }

        report.duplicate_rows = count_duplicates(table);
        report.issues = self.flag_issues(&report);

        tracing::debug!(
            "profiled {} rows x {} columns, {} issues",
            report.row_count,
            report.column_count,
            report.issues.len()
        );
        report
    }

    fn flag_issues(&self, report: &QualityReport) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        for (col, &pct) in &report.missing_percentage {
            if pct > self.config.high_missing_pct {
                let severity = if pct < self.config.critical_missing_pct {
                    IssueSeverity::Warning
                } else {
                    IssueSeverity::Critical
                };
                issues.push(
                    QualityIssue::new(
                        "high_missing",
                        Some(col),
                        severity,
                        format!("{} has {}% missing values", col, pct),
                    )
                    .with_recommendation("Consider imputation or exclusion"),
                );
            }
        }

        if report.duplicate_rows > 0 {
            issues.push(
                QualityIssue::new(
                    "duplicates",
                    Some("all"),
                    IssueSeverity::Warning,
                    format!("{} duplicate rows detected", report.duplicate_rows),
                )
                .with_recommendation("Remove duplicates before analysis"),
            );
        }

        if report.row_count < self.config.small_sample {
            issues.push(
                QualityIssue::new(
                    "small_sample",
                    Some("all"),
                    IssueSeverity::Critical,
                    format!("Only {} observations", report.row_count),
                )
                .with_recommendation(&format!(
                    "Most models require n >= {}",
                    self.config.small_sample
                )),
            );
        }

        issues
    }
}

fn numeric_summary(table: &DataTable, col: usize) -> Option<NumericSummary> {
    let values: Vec<f64> = (0..table.row_count())
        .filter_map(|row| table.numeric_cell(row, col))
        .collect();
    let stats: RunningStats = values.iter().copied().collect();
    Some(NumericSummary {
        count: stats.count(),
        mean: stats.mean()?,
        std: stats.sample_std(),
        min: stats.min()?,
        max: stats.max()?,
        median: median(&values)?,
    })
}

/// Rows identical to an earlier row.
fn count_duplicates(table: &DataTable) -> usize {
    let mut seen = HashSet::new();
    table.rows.iter().filter(|row| !seen.insert(row.as_slice())).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> DataTable {
        DataTable::from_records(
            ["id", "age", "district"],
            vec![
                vec!["1", "34", "north"],
                vec!["2", "NA", "south"],
                vec!["3", "", "north"],
                vec!["4", "51", "NA"],
                vec!["4", "51", "NA"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_missingness_and_issues() {
        let report = DatasetProfiler::new().profile(&small_table());

        assert_eq!(report.row_count, 5);
        assert_eq!(report.column_count, 3);
        assert_eq!(report.missing_counts["age"], 2);
        assert_eq!(report.missing_percentage["age"], 40.0);
        assert_eq!(report.missing_percentage["district"], 40.0);
        assert_eq!(report.duplicate_rows, 1);

        let kinds: Vec<&str> = report.issues.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, vec!["high_missing", "high_missing", "duplicates", "small_sample"]);
        assert_eq!(report.issues[0].severity, IssueSeverity::Warning);
        assert_eq!(report.issues[0].message, "age has 40% missing values");
        assert_eq!(report.issues[3].severity, IssueSeverity::Critical);
        assert_eq!(report.issues[3].message, "Only 5 observations");
    }

    #[test]
    fn test_numeric_summary_and_kinds() {
        let report = DatasetProfiler::new().profile(&small_table());
        let age = &report.numeric_summary["age"];
        assert_eq!(age.count, 3);
        assert_eq!(age.min, 34.0);
        assert_eq!(age.max, 51.0);
        assert_eq!(age.median, 51.0);
        assert!(!report.numeric_summary.contains_key("district"));

        assert_eq!(report.column_types["id"], "identifier");
        assert_eq!(report.column_types["age"], "clinical_continuous");
        assert_eq!(report.column_types["district"], "demographic_categorical");
    }

    #[test]
    fn test_critical_missing_threshold() {
        let table = DataTable::from_records(["x"], vec![vec!["NA"], vec!["1"]]).unwrap();
        let profiler = DatasetProfiler::with_config(ProfileConfig {
            small_sample: 0,
            ..ProfileConfig::default()
        });
        let report = profiler.profile(&table);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].severity, IssueSeverity::Critical);
    }

    #[test]
    fn test_empty_table_has_no_division_by_zero() {
        let table = DataTable::from_records(["a"], Vec::<Vec<String>>::new()).unwrap();
        let report = DatasetProfiler::new().profile(&table);
        assert_eq!(report.missing_percentage["a"], 0.0);
        assert_eq!(report.column_types["a"], "other");
    }
}
