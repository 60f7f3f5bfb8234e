//! Propensity-score matching.
//!
//! Scores treatment assignment with a [`PropensityModel`], pairs treated and
//! control units greedily within a caliper, and reports covariate balance
//! before and after matching.

mod balance;
mod engine;
mod propensity;
mod result;

pub use balance::{BALANCE_THRESHOLD, BalanceRow};
pub use engine::{MatchingConfig, MatchingEngine, TreatedOrder, greedy_match};
pub use propensity::{LogisticRegression, PropensityModel, PropensityRecord};
pub use result::{MatchResult, MatchedPair, PropensityDistribution, PropensitySummary};
