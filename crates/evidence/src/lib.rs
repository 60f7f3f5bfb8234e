//! Evidence: a statistical evidence engine for tabular research datasets.
//!
//! Four engines turn in-memory tables and prior results into quantitative
//! evidence:
//!
//! - **Synthesis**: fixed- and random-effects pooling of study effects, with
//!   heterogeneity statistics and Egger's small-study test
//! - **Matching**: propensity-score estimation and greedy caliper matching,
//!   with covariate balance before and after
//! - **Survival**: Kaplan-Meier curves with confidence bands and the log-rank
//!   test
//! - **Rigor**: a 0-100 methodological rigor score built from a data-quality
//!   report and an analysis result
//!
//! Supporting modules load delimited files, profile data quality and fit
//! logistic regressions whose results the rigor engine can score.
//!
//! # Example
//!
//! ```no_run
//! use evidence::EvidenceEngine;
//!
//! let engine = EvidenceEngine::new();
//! let (table, _) = engine.load("cohort.csv").unwrap();
//!
//! let survival = engine.estimate_survival(&table, "months", "died", Some("arm")).unwrap();
//! let quality = engine.profile(&table);
//! let rigor = engine.score_rigor(&quality, &survival.analysis_summary());
//!
//! println!("{}", rigor.summary);
//! ```

pub mod error;
pub mod input;
pub mod matching;
pub mod profile;
pub mod regression;
pub mod rigor;
pub mod stats;
pub mod survival;
pub mod synthesis;

mod evidence;

pub use crate::evidence::{EngineConfig, EvidenceEngine};
pub use error::{EvidenceError, Result};
pub use input::{DataTable, Parser, ParserConfig, SourceMetadata};
pub use matching::{MatchResult, MatchingConfig, MatchingEngine, PropensityModel, TreatedOrder};
pub use profile::{DatasetProfiler, ProfileConfig};
pub use rigor::{AnalysisResult, QualityReport, RigorResult, RigorScoringEngine};
pub use survival::{SurvivalConfig, SurvivalEngine, SurvivalResult};
pub use synthesis::{EvidenceSynthesisEngine, StudyEffect, SynthesisResult};
