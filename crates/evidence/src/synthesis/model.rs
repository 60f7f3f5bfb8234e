//! Input and output types for evidence synthesis.

use serde::{Deserialize, Serialize};

/// One study's effect estimate on a log scale (e.g. log odds ratio).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyEffect {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub effect_size: f64,
    /// Must be strictly positive.
    #[serde(alias = "se")]
    pub standard_error: f64,
    #[serde(default, alias = "n", skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
}

impl StudyEffect {
    pub fn new(name: impl Into<String>, effect_size: f64, standard_error: f64) -> Self {
        Self {
            name: name.into(),
            year: None,
            effect_size,
            standard_error,
            sample_size: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_sample_size(mut self, n: u64) -> Self {
        self.sample_size = Some(n);
        self
    }
}

/// A pooled effect under one weighting model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PooledEstimate {
    pub point: f64,
    pub standard_error: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub z: f64,
    pub p_value: f64,
}

/// Qualitative reading of I².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeterogeneityLevel {
    Low,
    Moderate,
    Substantial,
    Considerable,
}

impl HeterogeneityLevel {
    /// Classify an I² percentage.
    pub fn from_i_squared(i_squared: f64) -> Self {
        if i_squared < 25.0 {
            HeterogeneityLevel::Low
        } else if i_squared < 50.0 {
            HeterogeneityLevel::Moderate
        } else if i_squared < 75.0 {
            HeterogeneityLevel::Substantial
        } else {
            HeterogeneityLevel::Considerable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HeterogeneityLevel::Low => "Low",
            HeterogeneityLevel::Moderate => "Moderate",
            HeterogeneityLevel::Substantial => "Substantial",
            HeterogeneityLevel::Considerable => "Considerable",
        }
    }
}

/// Between-study heterogeneity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeterogeneityStats {
    /// Cochran's Q.
    #[serde(rename = "Q")]
    pub q: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
    /// Percentage in [0, 100].
    #[serde(rename = "I2")]
    pub i_squared: f64,
    /// DerSimonian-Laird between-study variance, never negative.
    #[serde(rename = "tau2")]
    pub tau_squared: f64,
    pub level: HeterogeneityLevel,
}

/// Egger's regression test for small-study effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EggerTest {
    pub intercept: f64,
    pub slope: f64,
    pub t_statistic: f64,
    pub p_value: f64,
}

/// Per-study row for forest-plot style display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRow {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub effect_size: f64,
    pub standard_error: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    /// Share of the fixed-effects weight, in percent.
    pub weight_fixed: f64,
    /// Share of the random-effects weight, in percent.
    pub weight_random: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
}

/// Output of [`super::EvidenceSynthesisEngine::synthesize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub n_studies: usize,
    pub fixed: PooledEstimate,
    pub random: PooledEstimate,
    pub heterogeneity: HeterogeneityStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egger: Option<EggerTest>,
    pub studies: Vec<StudyRow>,
}

impl SynthesisResult {
    /// Egger p-value, absent when the test could not be run.
    pub fn egger_p_value(&self) -> Option<f64> {
        self.egger.map(|e| e.p_value)
    }
}
