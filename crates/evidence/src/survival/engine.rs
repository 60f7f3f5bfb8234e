//! Survival estimation per group with an optional two-group comparison.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::kaplan_meier::{Observation, SurvivalPoint, kaplan_meier, median_survival};
use super::log_rank::{LogRankResult, log_rank};
use crate::error::{EvidenceError, Result};
use crate::input::DataTable;
use crate::rigor::AnalysisResult;
use crate::stats::normal_quantile;

/// Model name reported for survival analyses.
pub const KAPLAN_MEIER_MODEL: &str = "Kaplan-Meier Survival Analysis";

/// Label of the single group used when no group column is given.
pub const OVERALL_GROUP: &str = "Overall";

/// Configuration for survival estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivalConfig {
    /// Coverage of the pointwise survival bands.
    pub confidence_level: f64,
    /// Significance level of the log-rank test.
    pub alpha: f64,
}

impl Default for SurvivalConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            alpha: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSurvivalSummary {
    pub group: String,
    pub n: usize,
    pub events: usize,
    pub points: Vec<SurvivalPoint>,
    /// Absent when survival never falls to one half.
    pub median_survival: Option<f64>,
}

/// Output of [`SurvivalEngine::estimate_survival`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalResult {
    pub model: String,
    pub n: usize,
    pub events: usize,
    /// Rows dropped for missing values or negative durations.
    pub n_excluded: usize,
    pub groups: Vec<GroupSurvivalSummary>,
    /// Present only when exactly two groups were compared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_rank: Option<LogRankResult>,
}

impl SurvivalResult {
    pub fn group(&self, name: &str) -> Option<&GroupSurvivalSummary> {
        self.groups.iter().find(|g| g.group == name)
    }

    pub fn interpretation(&self) -> String {
        format!(
            "Survival analysis completed on {} participants with {} events observed.",
            self.n, self.events
        )
    }

    /// Summary of this analysis in the form the rigor engine scores.
    pub fn analysis_summary(&self) -> AnalysisResult {
        AnalysisResult {
            model: Some(self.model.clone()),
            n: Some(self.n),
            interpretation: Some(self.interpretation()),
            ..AnalysisResult::default()
        }
    }
}

/// Kaplan-Meier survival engine.
#[derive(Debug, Clone, Default)]
pub struct SurvivalEngine {
    config: SurvivalConfig,
}

impl SurvivalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SurvivalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SurvivalConfig {
        &self.config
    }

    /// Estimate survival curves for `duration`/`event`, split by `group`.
    ///
    /// Rows with a missing duration, event or group value, or a negative
    /// duration, are dropped. Any non-zero event value counts as an event.
    pub fn estimate_survival(
        &self,
        table: &DataTable,
        duration: &str,
        event: &str,
        group: Option<&str>,
    ) -> Result<SurvivalResult> {
        let level = self.config.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(EvidenceError::InvalidInput(format!(
                "confidence level must lie in (0, 1), got {}",
                level
            )));
        }

        let duration_col = table.column_index(duration)?;
        let event_col = table.column_index(event)?;
        let group_col = group.map(|g| table.column_index(g)).transpose()?;
        let numeric_groups = group_col.is_some_and(|col| table.is_numeric_column(col));

        let mut samples: IndexMap<String, Vec<Observation>> = IndexMap::new();
        for row in 0..table.row_count() {
            let (Some(time), Some(flag)) = (
                table.numeric_cell(row, duration_col),
                table.numeric_cell(row, event_col),
            ) else {
                continue;
            };
            if time < 0.0 {
                continue;
            }
            let label = match group_col {
                Some(col) => match table.text_cell(row, col) {
                    Some(value) => DataTable::level_key(value, numeric_groups),
                    None => continue,
                },
                None => OVERALL_GROUP.to_string(),
            };
            samples.entry(label).or_default().push(Observation {
                time,
                event: flag != 0.0,
            });
        }

        let n: usize = samples.values().map(Vec::len).sum();
        if n == 0 {
            return Err(EvidenceError::InvalidInput(format!(
                "no usable rows for duration '{}' and event '{}'",
                duration, event
            )));
        }
        let n_excluded = table.row_count() - n;
        if n_excluded > 0 {
            tracing::info!("survival analysis dropped {} rows", n_excluded);
        }

        let z = normal_quantile(1.0 - (1.0 - level) / 2.0);
        let groups: Vec<GroupSurvivalSummary> = samples
            .iter()
            .map(|(label, observations)| {
                let points = kaplan_meier(observations, z);
                GroupSurvivalSummary {
                    group: label.clone(),
                    n: observations.len(),
                    events: observations.iter().filter(|o| o.event).count(),
                    median_survival: median_survival(&points),
                    points,
                }
            })
            .collect();

        let log_rank = match (samples.len(), samples.get_index(0), samples.get_index(1)) {
            (2, Some((first_label, first)), Some((second_label, second))) => {
                let (statistic, p_value) = log_rank(first, second);
                tracing::debug!(
                    "log-rank {} vs {}: chi2 = {:.4}, p = {:.4}",
                    first_label,
                    second_label,
                    statistic,
                    p_value
                );
                Some(LogRankResult {
                    groups: [first_label.clone(), second_label.clone()],
                    statistic,
                    p_value,
                    significant: p_value < self.config.alpha,
                })
            }
            _ => None,
        };

        Ok(SurvivalResult {
            model: KAPLAN_MEIER_MODEL.to_string(),
            n,
            events: groups.iter().map(|g| g.events).sum(),
            n_excluded,
            groups,
            log_rank,
        })
    }
}
