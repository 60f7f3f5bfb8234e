//! Output types for propensity-score matching.

use serde::{Deserialize, Serialize};

use super::balance::BalanceRow;
use crate::stats::RunningStats;

/// One treated unit and the controls matched to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    /// Source row of the treated unit.
    pub treated_row: usize,
    /// Source rows of the matched controls, closest first.
    pub control_rows: Vec<usize>,
    /// Propensity distance to each control, aligned with `control_rows`.
    pub distances: Vec<f64>,
}

/// Spread of propensity scores in one arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropensitySummary {
    pub mean: f64,
    /// Sample standard deviation; absent with fewer than two units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl PropensitySummary {
    pub(crate) fn from_scores(scores: impl IntoIterator<Item = f64>) -> Option<Self> {
        let stats: RunningStats = scores.into_iter().collect();
        Some(Self {
            mean: stats.mean()?,
            std: stats.sample_std(),
            min: stats.min()?,
            max: stats.max()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropensityDistribution {
    pub treated: PropensitySummary,
    pub control: PropensitySummary,
}

/// Output of [`super::MatchingEngine::match_cohorts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub n_treated_original: usize,
    pub n_control_original: usize,
    pub n_treated_matched: usize,
    pub n_control_matched: usize,
    pub n_unmatched: usize,
    /// Rows dropped for a missing treatment or covariate.
    pub n_excluded: usize,
    /// Matched share of treated units, in percent.
    pub match_rate: f64,
    /// Caliper in propensity units (fraction times score std).
    pub caliper: f64,
    pub balance_before: Vec<BalanceRow>,
    pub balance_after: Vec<BalanceRow>,
    pub imbalanced_before: usize,
    pub imbalanced_after: usize,
    pub ps_distribution: PropensityDistribution,
    /// Treated rows in match order, truncated to the preview limit.
    pub matched_treated_ids: Vec<usize>,
    /// Control rows in match order, truncated to the preview limit.
    pub matched_control_ids: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_auc: Option<f64>,
    #[serde(skip)]
    pub pairs: Vec<MatchedPair>,
}

impl MatchResult {
    /// Every matched control row, in match order.
    pub fn control_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.pairs.iter().flat_map(|p| p.control_rows.iter().copied())
    }
}
