//! Column kind detection from values and header names.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::input::DataTable;

/// Broad analytic kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Continuous,
    Categorical,
    Text,
    Date,
    Identifier,
    Outcome,
    ClinicalContinuous,
    DemographicCategorical,
    Other,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Continuous => "continuous",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
            ColumnKind::Identifier => "identifier",
            ColumnKind::Outcome => "outcome",
            ColumnKind::ClinicalContinuous => "clinical_continuous",
            ColumnKind::DemographicCategorical => "demographic_categorical",
            ColumnKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name rules in increasing precedence; the last matching rule wins.
static NAME_RULES: Lazy<Vec<(Regex, ColumnKind)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)(date|dob|birth|admit)").unwrap(), ColumnKind::Date),
        (Regex::new(r"(?i)((^|_)id($|_)|patient|subject)").unwrap(), ColumnKind::Identifier),
        (Regex::new(r"(?i)(outcome|death|died|event)").unwrap(), ColumnKind::Outcome),
        (Regex::new(r"(?i)(age|weight|height|bmi)").unwrap(), ColumnKind::ClinicalContinuous),
        (Regex::new(r"(?i)(sex|gender|district|facility)").unwrap(), ColumnKind::DemographicCategorical),
    ]
});

/// Numeric columns with fewer distinct values than this share of rows are
/// categorical.
const NUMERIC_CATEGORICAL_RATIO: f64 = 0.05;
/// Text columns with fewer distinct values than this are categorical.
const TEXT_CATEGORICAL_LEVELS: usize = 15;

/// Kind suggested by the values alone.
fn kind_from_values(table: &DataTable, col: usize) -> ColumnKind {
    let values: Vec<&str> = (0..table.row_count())
        .filter_map(|row| table.text_cell(row, col))
        .collect();
    if values.is_empty() {
        return ColumnKind::Other;
    }

    let mut distinct = values.clone();
    distinct.sort_unstable();
    distinct.dedup();

    if values.iter().all(|v| v.parse::<f64>().is_ok()) {
        let ratio = distinct.len() as f64 / table.row_count() as f64;
        if ratio < NUMERIC_CATEGORICAL_RATIO {
            ColumnKind::Categorical
        } else {
            ColumnKind::Continuous
        }
    } else if distinct.len() < TEXT_CATEGORICAL_LEVELS {
        ColumnKind::Categorical
    } else {
        ColumnKind::Text
    }
}

/// Detect a column's kind; header keywords override what the values suggest.
pub fn detect_kind(table: &DataTable, col: usize) -> ColumnKind {
    let name = &table.headers[col];
    NAME_RULES
        .iter()
        .rev()
        .find(|(pattern, _)| pattern.is_match(name))
        .map(|(_, kind)| *kind)
        .unwrap_or_else(|| kind_from_values(table, col))
}
