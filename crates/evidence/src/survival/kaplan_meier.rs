//! Kaplan-Meier estimation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One step of a survival curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalPoint {
    pub time: f64,
    /// Units still under observation just before `time`.
    pub at_risk: usize,
    pub events: usize,
    pub censored: usize,
    pub survival_probability: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// An observed duration with its event flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub time: f64,
    pub event: bool,
}

/// Kaplan-Meier curve with exponential Greenwood bands.
///
/// The timeline starts at 0 and has one point per distinct observed time,
/// censored or not. `z` is the normal quantile of the band.
pub fn kaplan_meier(observations: &[Observation], z: f64) -> Vec<SurvivalPoint> {
    let mut data = observations.to_vec();
    data.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));

    let mut points = Vec::new();
    let mut at_risk = data.len();
    let mut survival = 1.0;
    let mut greenwood = 0.0;

    if data.first().is_none_or(|o| o.time > 0.0) {
        points.push(SurvivalPoint {
            time: 0.0,
            at_risk,
            events: 0,
            censored: 0,
            survival_probability: 1.0,
            ci_lower: 1.0,
            ci_upper: 1.0,
        });
    }

    let mut i = 0;
    while i < data.len() {
        let time = data[i].time;
        let mut events = 0;
        let mut censored = 0;
        while i < data.len() && data[i].time == time {
            if data[i].event {
                events += 1;
            } else {
                censored += 1;
            }
            i += 1;
        }

        if events > 0 {
            let n = at_risk as f64;
            let d = events as f64;
            survival *= (n - d) / n;
            if at_risk > events {
                greenwood += d / (n * (n - d));
            }
        }

        let (ci_lower, ci_upper) = log_log_band(survival, greenwood, z);
        points.push(SurvivalPoint {
            time,
            at_risk,
            events,
            censored,
            survival_probability: survival,
            ci_lower,
            ci_upper,
        });

        at_risk -= events + censored;
    }

    points
}

/// Band on the log(-log S) scale, mapped back into [0, 1].
fn log_log_band(survival: f64, greenwood: f64, z: f64) -> (f64, f64) {
    if survival >= 1.0 {
        return (1.0, 1.0);
    }
    if survival <= 0.0 {
        return (0.0, 0.0);
    }
    let log_s = survival.ln();
    let spread = z * (greenwood / (log_s * log_s)).sqrt();
    let theta = (-log_s).ln();
    let lower = (-(theta + spread).exp()).exp();
    let upper = (-(theta - spread).exp()).exp();
    (lower.clamp(0.0, 1.0), upper.clamp(0.0, 1.0))
}

/// Earliest time at which survival is at or below one half.
pub fn median_survival(points: &[SurvivalPoint]) -> Option<f64> {
    points
        .iter()
        .find(|p| p.survival_probability <= 0.5)
        .map(|p| p.time)
}
