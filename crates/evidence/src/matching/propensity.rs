//! Propensity models.

use serde::{Deserialize, Serialize};

use crate::error::{EvidenceError, Result};
use crate::regression::{LogisticOptions, fit_logistic};

/// Fits treatment against covariates and scores every unit.
///
/// Implementations return one probability in (0, 1) per feature row.
pub trait PropensityModel: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn fit_scores(&self, features: &[Vec<f64>], treated: &[bool]) -> Result<Vec<f64>>;
}

/// L2-penalised logistic regression on standardized features.
#[derive(Debug, Clone, Copy)]
pub struct LogisticRegression {
    pub options: LogisticOptions,
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different ridge penalty (inverse of C).
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.options.penalty = penalty;
        self
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            options: LogisticOptions {
                penalty: 1.0,
                max_iter: 1000,
                ..LogisticOptions::default()
            },
        }
    }
}

impl PropensityModel for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn fit_scores(&self, features: &[Vec<f64>], treated: &[bool]) -> Result<Vec<f64>> {
        let fit = fit_logistic(features, treated, self.options)?;
        if fit.fitted.iter().any(|p| !p.is_finite()) {
            return Err(EvidenceError::ComputationDegenerate(
                "propensity model produced non-finite scores".to_string(),
            ));
        }
        Ok(fit.fitted)
    }
}

/// One unit that entered the propensity fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropensityRecord {
    /// 0-based row index in the source table.
    pub row: usize,
    pub treated: bool,
    /// Encoded, standardized covariates as fed to the model.
    pub covariates: Vec<f64>,
    pub propensity_score: f64,
}
