//! Inverse-variance pooling, heterogeneity and small-study bias.

use crate::error::{EvidenceError, Result};
use crate::stats::{chi_squared_sf, normal_two_sided_p, student_t_two_sided_p};

use super::model::{
    EggerTest, HeterogeneityLevel, HeterogeneityStats, PooledEstimate, StudyEffect, StudyRow,
    SynthesisResult,
};

/// Two-sided 95% normal critical value.
const Z_95: f64 = 1.96;

/// Pools per-study effects into fixed- and random-effects summaries.
#[derive(Debug, Clone, Default)]
pub struct EvidenceSynthesisEngine;

impl EvidenceSynthesisEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run a fixed- and random-effects (DerSimonian-Laird) meta-analysis.
    pub fn synthesize(&self, studies: &[StudyEffect]) -> Result<SynthesisResult> {
        validate(studies)?;

        let n = studies.len();
        let effects: Vec<f64> = studies.iter().map(|s| s.effect_size).collect();
        let variances: Vec<f64> = studies.iter().map(|s| s.standard_error.powi(2)).collect();

        let w_fixed: Vec<f64> = variances.iter().map(|v| 1.0 / v).collect();
        let fixed = pool(&effects, &w_fixed);

        let heterogeneity = heterogeneity(&effects, &w_fixed, fixed.point);

        let w_random: Vec<f64> = variances
            .iter()
            .map(|v| 1.0 / (v + heterogeneity.tau_squared))
            .collect();
        let random = pool(&effects, &w_random);

        let egger = egger_test(studies);
        if n >= 3 && egger.is_none() {
            tracing::debug!("egger regression degenerate for {} studies", n);
        }

        let sum_fixed: f64 = w_fixed.iter().sum();
        let sum_random: f64 = w_random.iter().sum();
        let rows = studies
            .iter()
            .enumerate()
            .map(|(i, s)| StudyRow {
                name: if s.name.trim().is_empty() {
                    format!("Study {}", i + 1)
                } else {
                    s.name.clone()
                },
                year: s.year,
                effect_size: s.effect_size,
                standard_error: s.standard_error,
                ci_low: s.effect_size - Z_95 * s.standard_error,
                ci_high: s.effect_size + Z_95 * s.standard_error,
                weight_fixed: w_fixed[i] / sum_fixed * 100.0,
                weight_random: w_random[i] / sum_random * 100.0,
                sample_size: s.sample_size,
            })
            .collect();

        tracing::debug!(
            "pooled {} studies: fixed {:.4}, random {:.4}, I2 {:.1}%",
            n,
            fixed.point,
            random.point,
            heterogeneity.i_squared
        );

        Ok(SynthesisResult {
            n_studies: n,
            fixed,
            random,
            heterogeneity,
            egger,
            studies: rows,
        })
    }
}

fn validate(studies: &[StudyEffect]) -> Result<()> {
    if studies.is_empty() {
        return Err(EvidenceError::InvalidInput("No studies provided".to_string()));
    }
    for (i, study) in studies.iter().enumerate() {
        let label = if study.name.is_empty() {
            format!("Study {}", i + 1)
        } else {
            study.name.clone()
        };
        if !study.effect_size.is_finite() {
            return Err(EvidenceError::InvalidInput(format!(
                "{label}: effect size must be finite"
            )));
        }
        if !study.standard_error.is_finite() || study.standard_error <= 0.0 {
            return Err(EvidenceError::InvalidInput(format!(
                "{label}: standard error must be positive, got {}",
                study.standard_error
            )));
        }
        let weight = 1.0 / study.standard_error.powi(2);
        if !weight.is_finite() || weight <= 0.0 {
            return Err(EvidenceError::InvalidInput(format!(
                "{label}: standard error {} gives no usable inverse-variance weight",
                study.standard_error
            )));
        }
    }
    let total: f64 = studies.iter().map(|s| 1.0 / s.standard_error.powi(2)).sum();
    if !total.is_finite() {
        return Err(EvidenceError::InvalidInput(
            "inverse-variance weights overflow; standard errors are too small".to_string(),
        ));
    }
    Ok(())
}

/// Weighted-mean pooling shared by both models.
fn pool(effects: &[f64], weights: &[f64]) -> PooledEstimate {
    let sum_w: f64 = weights.iter().sum();
    let point = effects.iter().zip(weights).map(|(e, w)| e * w).sum::<f64>() / sum_w;
    let standard_error = (1.0 / sum_w).sqrt();
    let z = point / standard_error;

    PooledEstimate {
        point,
        standard_error,
        ci_low: point - Z_95 * standard_error,
        ci_high: point + Z_95 * standard_error,
        z,
        p_value: normal_two_sided_p(z),
    }
}

fn heterogeneity(effects: &[f64], weights: &[f64], pooled: f64) -> HeterogeneityStats {
    let df = effects.len() - 1;
    let q: f64 = effects
        .iter()
        .zip(weights)
        .map(|(e, w)| w * (e - pooled).powi(2))
        .sum();

    let p_value = if df == 0 || q <= 0.0 {
        1.0
    } else {
        chi_squared_sf(q, df as f64)
    };

    let i_squared = if df > 0 && q > 0.0 {
        ((q - df as f64) / q * 100.0).max(0.0)
    } else {
        0.0
    };

    let sum_w: f64 = weights.iter().sum();
    let sum_w2: f64 = weights.iter().map(|w| w * w).sum();
    let c = sum_w - sum_w2 / sum_w;
    let tau_squared = if df > 0 && c > 0.0 {
        ((q - df as f64) / c).max(0.0)
    } else {
        0.0
    };

    HeterogeneityStats {
        q,
        degrees_of_freedom: df,
        p_value,
        i_squared,
        tau_squared,
        level: HeterogeneityLevel::from_i_squared(i_squared),
    }
}

/// OLS of `effect/se` on `1/se`; the intercept measures funnel asymmetry.
fn egger_test(studies: &[StudyEffect]) -> Option<EggerTest> {
    let n = studies.len();
    if n < 3 {
        return None;
    }

    let x: Vec<f64> = studies.iter().map(|s| 1.0 / s.standard_error).collect();
    let y: Vec<f64> = studies
        .iter()
        .map(|s| s.effect_size / s.standard_error)
        .collect();
    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
    if sxx <= 0.0 {
        return None;
    }
    let sxy: f64 = x
        .iter()
        .zip(&y)
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum();

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let rss: f64 = x
        .iter()
        .zip(&y)
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();

    // A perfect fit leaves no residual variance to test the intercept against
    let syy: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    if rss <= 1e-12 * syy.max(1e-12) {
        return None;
    }

    let residual_var = rss / (nf - 2.0);
    let se_intercept = (residual_var * (1.0 / nf + x_mean * x_mean / sxx)).sqrt();
    if !se_intercept.is_finite() || se_intercept <= 0.0 {
        return None;
    }

    let t_statistic = intercept / se_intercept;
    Some(EggerTest {
        intercept,
        slope,
        t_statistic,
        p_value: student_t_two_sided_p(t_statistic, nf - 2.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn study(effect: f64, se: f64) -> StudyEffect {
        StudyEffect::new("", effect, se)
    }

    #[test]
    fn test_two_study_fixed_effect() {
        let result = EvidenceSynthesisEngine::new()
            .synthesize(&[study(0.5, 0.2), study(0.6, 0.25)])
            .unwrap();

        // weights 25 and 16
        assert!((result.fixed.point - 22.1 / 41.0).abs() < 1e-12);
        assert!((result.fixed.standard_error - (1.0 / 41.0f64).sqrt()).abs() < 1e-12);
        assert_eq!(result.heterogeneity.i_squared, 0.0);
        assert_eq!(result.heterogeneity.tau_squared, 0.0);
        assert_eq!(result.heterogeneity.degrees_of_freedom, 1);
        assert!(result.egger.is_none());
    }

    #[test]
    fn test_single_study_passes_through() {
        let result = EvidenceSynthesisEngine::new()
            .synthesize(&[study(-0.3, 0.15)])
            .unwrap();
        assert!((result.fixed.point + 0.3).abs() < 1e-12);
        assert!((result.fixed.standard_error - 0.15).abs() < 1e-12);
        assert_eq!(result.random, result.fixed);
        assert_eq!(result.heterogeneity.p_value, 1.0);
        assert_eq!(result.studies[0].name, "Study 1");
    }

    #[test]
    fn test_identical_studies_have_no_heterogeneity() {
        let studies = vec![study(0.5, 0.5); 5];
        let result = EvidenceSynthesisEngine::new().synthesize(&studies).unwrap();
        assert_eq!(result.heterogeneity.q, 0.0);
        assert_eq!(result.heterogeneity.i_squared, 0.0);
        assert_eq!(result.heterogeneity.tau_squared, 0.0);
        assert_eq!(result.fixed, result.random);
        // equal SEs leave Egger's regressor without spread
        assert!(result.egger.is_none());
    }

    #[test]
    fn test_heterogeneous_studies_widen_random_effects() {
        let studies = [study(0.1, 0.1), study(0.9, 0.1), study(0.2, 0.15), study(1.1, 0.2)];
        let result = EvidenceSynthesisEngine::new().synthesize(&studies).unwrap();
        let het = result.heterogeneity;
        assert!(het.q > het.degrees_of_freedom as f64);
        assert!(het.i_squared > 75.0);
        assert_eq!(het.level, HeterogeneityLevel::Considerable);
        assert!(het.tau_squared > 0.0);
        assert!(result.random.standard_error > result.fixed.standard_error);
        assert!(het.p_value < 0.001);
    }

    #[test]
    fn test_weight_percentages_sum_to_hundred() {
        let studies = [study(0.1, 0.1), study(0.3, 0.2), study(0.2, 0.3)];
        let result = EvidenceSynthesisEngine::new().synthesize(&studies).unwrap();
        let fixed: f64 = result.studies.iter().map(|s| s.weight_fixed).sum();
        let random: f64 = result.studies.iter().map(|s| s.weight_random).sum();
        assert!((fixed - 100.0).abs() < 1e-9);
        assert!((random - 100.0).abs() < 1e-9);
        assert!(result.studies[0].weight_fixed > result.studies[1].weight_fixed);
    }

    #[test]
    fn test_egger_regression_coefficients() {
        let studies = [
            study(0.2, 0.1),
            study(0.3, 0.2),
            study(0.5, 0.25),
            study(0.9, 0.5),
        ];
        let egger = EvidenceSynthesisEngine::new()
            .synthesize(&studies)
            .unwrap()
            .egger
            .unwrap();
        assert!((egger.slope - 0.775 / 34.75).abs() < 1e-9);
        assert!((egger.intercept - (1.825 - 0.775 / 34.75 * 5.25)).abs() < 1e-9);
        assert!(egger.p_value > 0.0 && egger.p_value < 1.0);
    }

    #[test]
    fn test_egger_undefined_on_exact_fit() {
        // effect = 0.5 + 0.2 * se gives y = 0.2 + 0.5 x exactly
        let studies = [study(0.52, 0.1), study(0.54, 0.2), study(0.58, 0.4)];
        let result = EvidenceSynthesisEngine::new().synthesize(&studies).unwrap();
        assert!(result.egger_p_value().is_none());
    }

    #[test]
    fn test_rejects_bad_input() {
        let engine = EvidenceSynthesisEngine::new();
        assert!(matches!(
            engine.synthesize(&[]),
            Err(EvidenceError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.synthesize(&[study(0.1, 0.0)]),
            Err(EvidenceError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.synthesize(&[study(0.1, -0.2)]),
            Err(EvidenceError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.synthesize(&[study(f64::NAN, 0.2)]),
            Err(EvidenceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_standard_errors_without_finite_weight() {
        let engine = EvidenceSynthesisEngine::new();
        for se in [1e-160, 1e200] {
            let studies = [study(0.5, se), study(0.4, 0.2)];
            assert!(matches!(
                engine.synthesize(&studies),
                Err(EvidenceError::InvalidInput(_))
            ));
        }
        // Each weight is finite but their sum is not
        let studies = [study(0.5, 1e-154), study(0.4, 1e-154), study(0.3, 1e-154)];
        assert!(matches!(
            engine.synthesize(&studies),
            Err(EvidenceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deserializes_short_field_names() {
        let studies: Vec<StudyEffect> = serde_json::from_str(
            r#"[{"name": "Trial A", "year": 2019, "effect_size": 0.4, "se": 0.1, "n": 120}]"#,
        )
        .unwrap();
        assert_eq!(studies[0].standard_error, 0.1);
        assert_eq!(studies[0].sample_size, Some(120));
    }
}
