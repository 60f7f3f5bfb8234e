//! Two-sample log-rank test.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::kaplan_meier::Observation;
use crate::stats::chi_squared_sf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRankResult {
    /// The two groups compared, in first-seen order.
    pub groups: [String; 2],
    /// Chi-square statistic with one degree of freedom.
    pub statistic: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// Compare two samples over the pooled distinct event times.
///
/// Returns `(statistic, p_value)`; a zero variance gives `(0, 1)`.
pub fn log_rank(first: &[Observation], second: &[Observation]) -> (f64, f64) {
    let mut event_times: Vec<f64> = first
        .iter()
        .chain(second)
        .filter(|o| o.event)
        .map(|o| o.time)
        .collect();
    event_times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    event_times.dedup();

    let at_risk = |sample: &[Observation], t: f64| sample.iter().filter(|o| o.time >= t).count() as f64;
    let events_at = |sample: &[Observation], t: f64| {
        sample.iter().filter(|o| o.event && o.time == t).count() as f64
    };

    let mut observed = 0.0;
    let mut expected = 0.0;
    let mut variance = 0.0;
    for &t in &event_times {
        let n1 = at_risk(first, t);
        let n = n1 + at_risk(second, t);
        let d1 = events_at(first, t);
        let d = d1 + events_at(second, t);

        observed += d1;
        expected += d * n1 / n;
        if n > 1.0 {
            variance += d * (n1 / n) * (1.0 - n1 / n) * (n - d) / (n - 1.0);
        }
    }

    if variance <= 0.0 {
        return (0.0, 1.0);
    }
    let statistic = (observed - expected).powi(2) / variance;
    (statistic, chi_squared_sf(statistic, 1.0))
}
