//! Logistic regression: the shared Newton solver, covariate encoding, and the
//! reported analysis.

mod analysis;
mod design;
mod logistic;

pub use analysis::{LOGISTIC_MODEL, logistic_regression};
pub use design::{CategoricalRule, DesignMatrix, encode_columns};
pub use logistic::{LogisticFit, LogisticOptions, fit_logistic};
