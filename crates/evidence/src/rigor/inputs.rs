//! Reports consumed by the rigor engine.
//!
//! [`QualityReport`] comes from dataset profiling and [`AnalysisResult`] from
//! any of the analyses. Both are plain serde types so callers can also load
//! them from JSON produced elsewhere.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Severity of a data-quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueSeverity::Info => write!(f, "info"),
            IssueSeverity::Warning => write!(f, "warning"),
            IssueSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// A flagged problem in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    /// Issue kind, e.g. `high_missing`, `duplicates`, `small_sample`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub severity: IssueSeverity,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl QualityIssue {
    pub fn new(kind: &str, column: Option<&str>, severity: IssueSeverity, message: String) -> Self {
        Self {
            kind: kind.to_string(),
            column: column.map(str::to_string),
            severity,
            message,
            recommendation: None,
        }
    }

    pub fn with_recommendation(mut self, recommendation: &str) -> Self {
        self.recommendation = Some(recommendation.to_string());
        self
    }
}

/// Summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

/// Data-quality report for a whole table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    #[serde(default)]
    pub row_count: usize,
    #[serde(default)]
    pub column_count: usize,
    #[serde(default)]
    pub missing_counts: IndexMap<String, usize>,
    /// Missing share per column, in percent, in column order.
    #[serde(default)]
    pub missing_percentage: IndexMap<String, f64>,
    #[serde(default)]
    pub duplicate_rows: usize,
    #[serde(default)]
    pub column_types: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub numeric_summary: IndexMap<String, NumericSummary>,
    #[serde(default)]
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn count_severity(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Columns whose missing share exceeds `threshold` percent, in column order.
    pub fn columns_missing_above(&self, threshold: f64) -> Vec<&str> {
        self.missing_percentage
            .iter()
            .filter(|(_, pct)| **pct > threshold)
            .map(|(col, _)| col.as_str())
            .collect()
    }
}

/// Outcome of one assumption check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssumptionCheck {
    /// `None` when the check could not be run.
    #[serde(default)]
    pub passed: Option<bool>,
    #[serde(default)]
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vif_scores: Option<IndexMap<String, f64>>,
}

impl AssumptionCheck {
    pub fn new(passed: Option<bool>, detail: impl Into<String>) -> Self {
        Self {
            passed,
            detail: detail.into(),
            recommendation: None,
            vif_scores: None,
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// Odds ratio of one predictor with its 95% interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsRatio {
    #[serde(rename = "OR")]
    pub odds_ratio: f64,
    #[serde(rename = "CI_low")]
    pub ci_low: f64,
    #[serde(rename = "CI_high")]
    pub ci_high: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// Result of an analysis, as seen by the rigor engine.
///
/// Every field is optional: a failed analysis carries only `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub odds_ratios: IndexMap<String, OddsRatio>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub model_fit: IndexMap<String, f64>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub assumptions: IndexMap<String, AssumptionCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

impl AnalysisResult {
    /// A result that only records a failure.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn has_model(&self) -> bool {
        self.model.as_deref().is_some_and(|m| !m.is_empty())
    }

    pub fn has_interpretation(&self) -> bool {
        self.interpretation.as_deref().is_some_and(|i| !i.is_empty())
    }

    /// Sample size, treating an absent value as zero.
    pub fn sample_size(&self) -> usize {
        self.n.unwrap_or(0)
    }
}
