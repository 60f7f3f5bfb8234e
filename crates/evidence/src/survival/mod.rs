//! Survival analysis: Kaplan-Meier curves and the log-rank test.

mod engine;
mod kaplan_meier;
mod log_rank;

pub use engine::{
    GroupSurvivalSummary, KAPLAN_MEIER_MODEL, OVERALL_GROUP, SurvivalConfig, SurvivalEngine,
    SurvivalResult,
};
pub use kaplan_meier::{Observation, SurvivalPoint, kaplan_meier, median_survival};
pub use log_rank::{LogRankResult, log_rank};
