//! Greedy caliper matching on propensity scores.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::balance::balance_tables;
use super::propensity::{LogisticRegression, PropensityModel, PropensityRecord};
use super::result::{MatchResult, MatchedPair, PropensityDistribution, PropensitySummary};
use crate::error::{EvidenceError, Result};
use crate::input::DataTable;
use crate::regression::{CategoricalRule, encode_columns};
use crate::stats::descriptive::population_std;
use crate::stats::roc_auc;

/// Numeric covariates with at most this many levels are dummy-coded.
const MAX_CATEGORICAL_LEVELS: usize = 5;

/// Order in which treated units pick their controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatedOrder {
    /// Source row order.
    #[default]
    Input,
    /// Highest propensity first; ties keep source order.
    DescendingPropensity,
}

/// Configuration for matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Caliper as a fraction of the propensity score standard deviation.
    pub caliper: f64,
    /// Controls matched per treated unit.
    pub ratio: usize,
    /// Maximum number of ids kept in the result previews.
    pub preview_limit: usize,
    pub treated_order: TreatedOrder,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            caliper: 0.2,
            ratio: 1,
            preview_limit: 100,
            treated_order: TreatedOrder::Input,
        }
    }
}

/// Propensity-score matching engine.
///
/// Holds the model used to score treatment assignment. An engine built with
/// [`MatchingEngine::without_model`] refuses to match.
#[derive(Clone)]
pub struct MatchingEngine {
    config: MatchingConfig,
    model: Option<Arc<dyn PropensityModel>>,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngine {
    /// Engine with default settings and the built-in logistic model.
    pub fn new() -> Self {
        Self::with_config(MatchingConfig::default())
    }

    pub fn with_config(config: MatchingConfig) -> Self {
        Self {
            config,
            model: Some(Arc::new(LogisticRegression::default())),
        }
    }

    /// Engine with no propensity model attached.
    pub fn without_model(config: MatchingConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Replace the propensity model.
    pub fn with_model(mut self, model: impl PropensityModel + 'static) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    fn model(&self) -> Result<&Arc<dyn PropensityModel>> {
        self.model.as_ref().ok_or_else(|| {
            EvidenceError::DependencyUnavailable("no propensity model configured".to_string())
        })
    }

    /// Fit the propensity model and score every complete-case row.
    pub fn propensity_scores(
        &self,
        table: &DataTable,
        treatment: &str,
        covariates: &[String],
    ) -> Result<Vec<PropensityRecord>> {
        let model = self.model()?;
        if covariates.is_empty() {
            return Err(EvidenceError::InvalidInput(
                "matching needs at least one covariate".to_string(),
            ));
        }

        let treatment_col = table.column_index(treatment)?;
        let covariate_cols = covariates
            .iter()
            .map(|c| table.column_index(c))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for row in 0..table.row_count() {
            let Some(value) = table.text_cell(row, treatment_col) else {
                continue;
            };
            if covariate_cols.iter().any(|&c| table.text_cell(row, c).is_none()) {
                continue;
            }
            let label = match value.parse::<f64>() {
                Ok(v) if v == 0.0 => false,
                Ok(v) if v == 1.0 => true,
                _ => {
                    return Err(EvidenceError::InvalidInput(format!(
                        "treatment '{}' must be 0/1, found '{}' in row {}",
                        treatment, value, row
                    )));
                }
            };
            rows.push(row);
            labels.push(label);
        }

        if !labels.contains(&true) || !labels.contains(&false) {
            return Err(EvidenceError::InvalidInput(format!(
                "treatment '{}' needs both treated and control units after dropping incomplete rows",
                treatment
            )));
        }

        let mut design = encode_columns(
            table,
            &rows,
            &covariate_cols,
            CategoricalRule::AtMostLevels(MAX_CATEGORICAL_LEVELS),
        );
        design.standardize();

        tracing::debug!(
            "fitting {} on {} rows with features {:?}",
            model.name(),
            rows.len(),
            design.names
        );
        let scores = model.fit_scores(&design.rows, &labels)?;
        if scores.len() != rows.len() {
            return Err(EvidenceError::ComputationDegenerate(format!(
                "propensity model returned {} scores for {} rows",
                scores.len(),
                rows.len()
            )));
        }

        Ok(design
            .rows
            .into_iter()
            .zip(rows)
            .zip(labels)
            .zip(scores)
            .map(|(((covariates, row), treated), propensity_score)| PropensityRecord {
                row,
                treated,
                covariates,
                propensity_score,
            })
            .collect())
    }

    /// Match treated to control units and report covariate balance.
    pub fn match_cohorts(
        &self,
        table: &DataTable,
        treatment: &str,
        covariates: &[String],
    ) -> Result<MatchResult> {
        let config = &self.config;
        if !(config.caliper.is_finite() && config.caliper >= 0.0) || config.ratio == 0 {
            return Err(EvidenceError::InvalidInput(format!(
                "caliper must be non-negative and ratio at least 1 (got {}, {})",
                config.caliper, config.ratio
            )));
        }

        let records = self.propensity_scores(table, treatment, covariates)?;
        let scores: Vec<f64> = records.iter().map(|r| r.propensity_score).collect();
        let labels: Vec<bool> = records.iter().map(|r| r.treated).collect();

        let caliper = config.caliper * population_std(&scores).unwrap_or(0.0);
        let pairs = greedy_match(&records, caliper, config.ratio, config.treated_order);

        let n_treated = labels.iter().filter(|&&t| t).count();
        let n_control = labels.len() - n_treated;
        let matched_treated: Vec<usize> = pairs.iter().map(|p| p.treated_row).collect();
        let matched_controls: Vec<usize> = pairs
            .iter()
            .flat_map(|p| p.control_rows.iter().copied())
            .collect();

        tracing::info!(
            "matched {} of {} treated units within caliper {:.4}",
            matched_treated.len(),
            n_treated,
            caliper
        );

        let treatment_col = table.column_index(treatment)?;
        let covariate_cols = covariates
            .iter()
            .map(|c| Ok((c.clone(), table.column_index(c)?)))
            .collect::<Result<Vec<_>>>()?;
        let balance = balance_tables(
            table,
            treatment_col,
            &covariate_cols,
            &matched_treated,
            &matched_controls,
        );

        let arm_summary = |treated: bool| {
            PropensitySummary::from_scores(
                records
                    .iter()
                    .filter(|r| r.treated == treated)
                    .map(|r| r.propensity_score),
            )
        };
        let ps_distribution = match (arm_summary(true), arm_summary(false)) {
            (Some(treated), Some(control)) => PropensityDistribution { treated, control },
            _ => {
                return Err(EvidenceError::ComputationDegenerate(
                    "an arm has no propensity scores".to_string(),
                ));
            }
        };

        let match_rate = if n_treated > 0 {
            matched_treated.len() as f64 / n_treated as f64 * 100.0
        } else {
            0.0
        };

        Ok(MatchResult {
            n_treated_original: n_treated,
            n_control_original: n_control,
            n_treated_matched: matched_treated.len(),
            n_control_matched: matched_controls.len(),
            n_unmatched: n_treated - matched_treated.len(),
            n_excluded: table.row_count() - records.len(),
            match_rate,
            caliper,
            imbalanced_before: balance.before.iter().filter(|b| !b.balanced).count(),
            imbalanced_after: balance.after.iter().filter(|b| !b.balanced).count(),
            balance_before: balance.before,
            balance_after: balance.after,
            ps_distribution,
            matched_treated_ids: matched_treated.into_iter().take(config.preview_limit).collect(),
            matched_control_ids: matched_controls.into_iter().take(config.preview_limit).collect(),
            model_auc: roc_auc(&scores, &labels),
            pairs,
        })
    }
}

/// Greedy nearest-neighbour matching without replacement.
///
/// Each treated unit, in `order`, takes up to `ratio` of the closest unused
/// controls whose distance is at most `caliper`. Equal distances resolve to
/// the earlier control. Treated units with no eligible control stay
/// unmatched.
pub fn greedy_match(
    records: &[PropensityRecord],
    caliper: f64,
    ratio: usize,
    order: TreatedOrder,
) -> Vec<MatchedPair> {
    let mut treated: Vec<&PropensityRecord> = records.iter().filter(|r| r.treated).collect();
    if order == TreatedOrder::DescendingPropensity {
        treated.sort_by(|a, b| {
            b.propensity_score
                .partial_cmp(&a.propensity_score)
                .unwrap_or(Ordering::Equal)
        });
    }
    let controls: Vec<&PropensityRecord> = records.iter().filter(|r| !r.treated).collect();
    let mut used = vec![false; controls.len()];

    let mut pairs = Vec::new();
    for unit in treated {
        let mut candidates: Vec<(usize, f64)> = controls
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .map(|(i, c)| (i, (c.propensity_score - unit.propensity_score).abs()))
            .filter(|(_, distance)| *distance <= caliper)
            .collect();
        if candidates.is_empty() {
            continue;
        }

        // Stable sort keeps input order among equal distances
        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        candidates.truncate(ratio);

        for (i, _) in &candidates {
            used[*i] = true;
        }
        pairs.push(MatchedPair {
            treated_row: unit.row,
            control_rows: candidates.iter().map(|(i, _)| controls[*i].row).collect(),
            distances: candidates.iter().map(|(_, d)| *d).collect(),
        });
    }
    pairs
}
