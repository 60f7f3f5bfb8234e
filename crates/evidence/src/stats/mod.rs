//! Numeric building blocks: distribution functions and descriptive statistics.

pub mod descriptive;
pub mod distribution;

pub use descriptive::{RunningStats, roc_auc, standardized_mean_difference};
pub use distribution::{
    chi_squared_cdf, chi_squared_sf, normal_cdf, normal_quantile, normal_two_sided_p,
    student_t_two_sided_p,
};
