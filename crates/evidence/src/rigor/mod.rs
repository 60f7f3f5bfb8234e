//! Methodological rigor scoring.
//!
//! Combines a [`QualityReport`] and an [`AnalysisResult`] into a 0-100 score
//! made of four 25-point categories: data quality, methodology, assumptions
//! and reporting.

mod engine;
mod inputs;

pub use engine::{CATEGORY_MAX, CategoryScore, Grade, RigorBreakdown, RigorResult, RigorScoringEngine};
pub use inputs::{
    AnalysisResult, AssumptionCheck, IssueSeverity, NumericSummary, OddsRatio, QualityIssue,
    QualityReport,
};
