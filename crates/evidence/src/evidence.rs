//! Main EvidenceEngine struct and public API.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EvidenceError, Result};
use crate::input::{DataTable, Parser, ParserConfig, SourceMetadata};
use crate::matching::{MatchResult, MatchingConfig, MatchingEngine, PropensityModel};
use crate::profile::{DatasetProfiler, ProfileConfig};
use crate::regression;
use crate::rigor::{AnalysisResult, QualityReport, RigorResult, RigorScoringEngine};
use crate::survival::{SurvivalConfig, SurvivalEngine, SurvivalResult};
use crate::synthesis::{EvidenceSynthesisEngine, StudyEffect, SynthesisResult};

/// Configuration for every engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Parser configuration for file input.
    pub parser: ParserConfig,
    pub matching: MatchingConfig,
    pub survival: SurvivalConfig,
    pub profile: ProfileConfig,
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| EvidenceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// The statistical evidence engine.
///
/// Bundles the four analysis engines with dataset loading and profiling.
/// Every operation is a pure function of its arguments and the configuration
/// fixed at construction.
pub struct EvidenceEngine {
    config: EngineConfig,
    parser: Parser,
    synthesis: EvidenceSynthesisEngine,
    matching: MatchingEngine,
    survival: SurvivalEngine,
    profiler: DatasetProfiler,
    rigor: RigorScoringEngine,
}

impl EvidenceEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            parser: Parser::with_config(config.parser.clone()),
            synthesis: EvidenceSynthesisEngine::new(),
            matching: MatchingEngine::with_config(config.matching.clone()),
            survival: SurvivalEngine::with_config(config.survival.clone()),
            profiler: DatasetProfiler::with_config(config.profile.clone()),
            rigor: RigorScoringEngine::new(),
            config,
        }
    }

    /// Use a different propensity model for matching.
    pub fn with_propensity_model(mut self, model: impl PropensityModel + 'static) -> Self {
        self.matching = self.matching.with_model(model);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a delimited file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        self.parser.parse_file(path)
    }

    /// Pool study effects under fixed- and random-effects models.
    pub fn synthesize(&self, studies: &[StudyEffect]) -> Result<SynthesisResult> {
        self.synthesis.synthesize(studies)
    }

    /// Propensity-score match treated to control units.
    pub fn match_cohorts(
        &self,
        table: &DataTable,
        treatment: &str,
        covariates: &[String],
    ) -> Result<MatchResult> {
        self.matching.match_cohorts(table, treatment, covariates)
    }

    /// Kaplan-Meier curves per group, with a log-rank test for two groups.
    pub fn estimate_survival(
        &self,
        table: &DataTable,
        duration: &str,
        event: &str,
        group: Option<&str>,
    ) -> Result<SurvivalResult> {
        self.survival.estimate_survival(table, duration, event, group)
    }

    /// Data-quality report for a table.
    pub fn profile(&self, table: &DataTable) -> QualityReport {
        self.profiler.profile(table)
    }

    /// Logistic regression of a binary outcome.
    pub fn logistic_regression(
        &self,
        table: &DataTable,
        outcome: &str,
        predictors: &[String],
    ) -> Result<AnalysisResult> {
        regression::logistic_regression(table, outcome, predictors)
    }

    /// Score the rigor of an analysis.
    pub fn score_rigor(&self, quality: &QualityReport, analysis: &AnalysisResult) -> RigorResult {
        self.rigor.score(quality, analysis)
    }
}

impl Default for EvidenceEngine {
    fn default() -> Self {
        Self::new()
    }
}
