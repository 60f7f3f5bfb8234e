//! Property-based tests for the evidence engines.
//!
//! These tests use proptest to generate random inputs and check that the
//! engines keep their invariants under all conditions.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p evidence --test property_tests
//!
//! # More cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p evidence --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use evidence::matching::{PropensityRecord, TreatedOrder, greedy_match};
use evidence::rigor::{AssumptionCheck, IssueSeverity, QualityIssue};
use evidence::survival::{Observation, kaplan_meier};
use evidence::{AnalysisResult, EvidenceSynthesisEngine, QualityReport, RigorScoringEngine, StudyEffect};

// =============================================================================
// Test Strategies
// =============================================================================

/// Study effects with plausible log-scale sizes and positive standard errors.
fn studies(max: usize) -> impl Strategy<Value = Vec<StudyEffect>> {
    prop::collection::vec((-3.0f64..3.0, 0.05f64..2.0), 1..=max).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (effect, se))| StudyEffect::new(format!("Study {}", i + 1), effect, se))
            .collect()
    })
}

fn observations() -> impl Strategy<Value = Vec<Observation>> {
    prop::collection::vec((0.0f64..100.0, any::<bool>()), 1..60).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(time, event)| Observation { time, event })
            .collect()
    })
}

/// Treated flags and scores; the row index is the position.
fn propensity_records() -> impl Strategy<Value = Vec<PropensityRecord>> {
    prop::collection::vec((any::<bool>(), 0.0f64..1.0), 2..80).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(row, (treated, propensity_score))| PropensityRecord {
                row,
                treated,
                covariates: Vec::new(),
                propensity_score,
            })
            .collect()
    })
}

fn severity() -> impl Strategy<Value = IssueSeverity> {
    prop_oneof![
        Just(IssueSeverity::Info),
        Just(IssueSeverity::Warning),
        Just(IssueSeverity::Critical),
    ]
}

fn quality_report() -> impl Strategy<Value = QualityReport> {
    (0usize..500, prop::collection::vec(severity(), 0..12)).prop_map(|(rows, severities)| {
        QualityReport {
            row_count: rows,
            issues: severities
                .into_iter()
                .map(|s| QualityIssue::new("generated", None, s, String::new()))
                .collect(),
            ..QualityReport::default()
        }
    })
}

fn analysis_result() -> impl Strategy<Value = AnalysisResult> {
    (
        any::<bool>(),
        prop::option::of("[A-Za-z ]{1,20}"),
        prop::option::of(0usize..1000),
        any::<bool>(),
        prop::collection::vec(prop::option::of(any::<bool>()), 0..6),
        any::<bool>(),
    )
        .prop_map(|(failed, model, n, fit, checks, interpreted)| {
            if failed {
                return AnalysisResult::failed("generated failure");
            }
            let mut result = AnalysisResult {
                model,
                n,
                ..AnalysisResult::default()
            };
            if fit {
                result.model_fit.insert("aic".to_string(), 10.0);
            }
            for (i, passed) in checks.into_iter().enumerate() {
                result
                    .assumptions
                    .insert(format!("check_{}", i), AssumptionCheck::new(passed, "generated"));
            }
            if interpreted {
                result.interpretation = Some("generated".to_string());
            }
            result
        })
}

// =============================================================================
// Synthesis
// =============================================================================

proptest! {
    #[test]
    fn prop_heterogeneity_in_range(studies in studies(15)) {
        let result = EvidenceSynthesisEngine::new().synthesize(&studies).unwrap();
        let het = &result.heterogeneity;
        prop_assert!((0.0..=100.0).contains(&het.i_squared));
        prop_assert!(het.tau_squared >= 0.0);
        prop_assert!(het.q >= 0.0);
        prop_assert!((0.0..=1.0).contains(&het.p_value));
    }

    #[test]
    fn prop_pooled_within_study_range(studies in studies(15)) {
        let result = EvidenceSynthesisEngine::new().synthesize(&studies).unwrap();
        let lo = studies.iter().map(|s| s.effect_size).fold(f64::INFINITY, f64::min);
        let hi = studies.iter().map(|s| s.effect_size).fold(f64::NEG_INFINITY, f64::max);
        for pooled in [&result.fixed, &result.random] {
            prop_assert!(pooled.point >= lo - 1e-9 && pooled.point <= hi + 1e-9);
            prop_assert!(pooled.ci_low <= pooled.point && pooled.point <= pooled.ci_high);
        }
    }

    #[test]
    fn prop_weights_sum_to_hundred(studies in studies(15)) {
        let result = EvidenceSynthesisEngine::new().synthesize(&studies).unwrap();
        let fixed: f64 = result.studies.iter().map(|s| s.weight_fixed).sum();
        let random: f64 = result.studies.iter().map(|s| s.weight_random).sum();
        prop_assert!((fixed - 100.0).abs() < 1e-6);
        prop_assert!((random - 100.0).abs() < 1e-6);
    }

    #[test]
    fn prop_single_study_is_identity(effect in -3.0f64..3.0, se in 0.05f64..2.0) {
        let study = StudyEffect::new("Only", effect, se);
        let result = EvidenceSynthesisEngine::new().synthesize(&[study]).unwrap();
        prop_assert!((result.fixed.point - effect).abs() < 1e-12);
        prop_assert!((result.random.point - effect).abs() < 1e-12);
        prop_assert!((result.fixed.standard_error - se).abs() < 1e-12);
        prop_assert_eq!(result.heterogeneity.i_squared, 0.0);
        prop_assert_eq!(result.heterogeneity.tau_squared, 0.0);
    }
}

// =============================================================================
// Survival
// =============================================================================

proptest! {
    #[test]
    fn prop_survival_non_increasing(obs in observations()) {
        let points = kaplan_meier(&obs, 1.959964);
        prop_assert!(!points.is_empty());
        for point in &points {
            prop_assert!((0.0..=1.0).contains(&point.survival_probability));
            prop_assert!(point.ci_lower <= point.ci_upper);
            prop_assert!(point.ci_lower >= 0.0 && point.ci_upper <= 1.0);
        }
        for pair in points.windows(2) {
            prop_assert!(pair[1].survival_probability <= pair[0].survival_probability);
            prop_assert!(pair[1].time > pair[0].time);
        }
    }

    #[test]
    fn prop_no_events_keeps_survival_at_one(times in prop::collection::vec(0.0f64..100.0, 1..40)) {
        let obs: Vec<Observation> = times.into_iter().map(|time| Observation { time, event: false }).collect();
        for point in kaplan_meier(&obs, 1.959964) {
            prop_assert_eq!(point.survival_probability, 1.0);
        }
    }

    #[test]
    fn prop_survival_accounts_for_everyone(obs in observations()) {
        let points = kaplan_meier(&obs, 1.959964);
        let events: usize = points.iter().map(|p| p.events).sum();
        let censored: usize = points.iter().map(|p| p.censored).sum();
        prop_assert_eq!(events + censored, obs.len());
        prop_assert_eq!(points[0].at_risk, obs.len());
    }
}

// =============================================================================
// Matching
// =============================================================================

proptest! {
    #[test]
    fn prop_no_control_reuse(
        records in propensity_records(),
        caliper in 0.0f64..0.5,
        ratio in 1usize..4,
        descending in any::<bool>(),
    ) {
        let order = if descending { TreatedOrder::DescendingPropensity } else { TreatedOrder::Input };
        let pairs = greedy_match(&records, caliper, ratio, order);

        let mut seen = HashSet::new();
        for pair in &pairs {
            prop_assert!(records[pair.treated_row].treated);
            prop_assert!(!pair.control_rows.is_empty());
            prop_assert!(pair.control_rows.len() <= ratio);
            prop_assert_eq!(pair.control_rows.len(), pair.distances.len());
            for (&control, &distance) in pair.control_rows.iter().zip(&pair.distances) {
                prop_assert!(!records[control].treated);
                prop_assert!(seen.insert(control), "control {} reused", control);
                prop_assert!(distance <= caliper);
            }
        }
    }

    #[test]
    fn prop_treated_matched_at_most_once(records in propensity_records(), caliper in 0.0f64..0.5) {
        let pairs = greedy_match(&records, caliper, 1, TreatedOrder::Input);
        let treated: HashSet<usize> = pairs.iter().map(|p| p.treated_row).collect();
        prop_assert_eq!(treated.len(), pairs.len());
    }
}

// =============================================================================
// Rigor
// =============================================================================

proptest! {
    #[test]
    fn prop_rigor_score_bounded(quality in quality_report(), analysis in analysis_result()) {
        let result = RigorScoringEngine::new().score(&quality, &analysis);
        prop_assert!(result.overall_score <= 100);
        prop_assert_eq!(result.overall_score, result.breakdown.total());
        for category in [
            &result.breakdown.data_quality,
            &result.breakdown.methodology,
            &result.breakdown.assumptions,
            &result.breakdown.reporting,
        ] {
            prop_assert!(category.score <= category.max);
        }
        prop_assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn prop_rigor_deterministic(quality in quality_report(), analysis in analysis_result()) {
        let engine = RigorScoringEngine::new();
        prop_assert_eq!(engine.score(&quality, &analysis), engine.score(&quality, &analysis));
    }
}
