//! Logistic regression reported as an [`AnalysisResult`].

use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};

use super::design::{CategoricalRule, DesignMatrix, encode_columns};
use super::logistic::{LogisticFit, LogisticOptions, fit_logistic};
use crate::error::{EvidenceError, Result};
use crate::input::DataTable;
use crate::rigor::{AnalysisResult, AssumptionCheck, OddsRatio};
use crate::stats::{normal_two_sided_p, normal_quantile};

/// Model name reported for logistic analyses.
pub const LOGISTIC_MODEL: &str = "Logistic Regression";

const EVENTS_PER_PREDICTOR: usize = 10;
const VIF_LIMIT: f64 = 10.0;
/// Linear predictor beyond which fitted probabilities are treated as saturated.
const SEPARATION_ETA: f64 = 15.0;

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Fit `outcome ~ predictors` on complete cases and summarise the model.
///
/// Column problems (unknown names, a non-binary outcome) are errors. A model
/// that cannot be fitted yields an `AnalysisResult` carrying `error`, so it can
/// still be scored.
pub fn logistic_regression(
    table: &DataTable,
    outcome: &str,
    predictors: &[String],
) -> Result<AnalysisResult> {
    if predictors.is_empty() {
        return Err(EvidenceError::InvalidInput(
            "logistic regression needs at least one predictor".to_string(),
        ));
    }
    let outcome_col = table.column_index(outcome)?;
    let predictor_cols = predictors
        .iter()
        .map(|p| table.column_index(p))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for row in 0..table.row_count() {
        let Some(y) = table.numeric_cell(row, outcome_col) else {
            continue;
        };
        if predictor_cols.iter().any(|&c| table.text_cell(row, c).is_none()) {
            continue;
        }
        let label = match y {
            v if v == 0.0 => false,
            v if v == 1.0 => true,
            other => {
                return Err(EvidenceError::InvalidInput(format!(
                    "outcome '{}' must be 0/1, found {}",
                    outcome, other
                )));
            }
        };
        rows.push(row);
        labels.push(label);
    }

    let dropped = table.row_count() - rows.len();
    if dropped > 0 {
        tracing::info!("logistic regression dropped {} incomplete rows", dropped);
    }

    let design = encode_columns(table, &rows, &predictor_cols, CategoricalRule::NonNumeric);
    if rows.is_empty() {
        return Ok(AnalysisResult::failed("no complete rows to fit"));
    }
    if labels.iter().all(|&l| l) || labels.iter().all(|&l| !l) {
        return Ok(AnalysisResult::failed(format!(
            "outcome '{}' has a single class in the complete rows",
            outcome
        )));
    }

    let fit = match fit_logistic(&design.rows, &labels, LogisticOptions::default()) {
        Ok(fit) => fit,
        Err(e) => {
            tracing::warn!("logistic model failed: {}", e);
            return Ok(AnalysisResult::failed(e.to_string()));
        }
    };

    let odds_ratios = odds_ratios(&design, &fit);
    let model_fit = model_fit(&fit, &labels);
    let assumptions = check_assumptions(&design, &labels, &fit);
    let interpretation = interpret(&odds_ratios, outcome);

    Ok(AnalysisResult {
        error: None,
        model: Some(LOGISTIC_MODEL.to_string()),
        outcome: Some(outcome.to_string()),
        n: Some(rows.len()),
        odds_ratios,
        model_fit,
        assumptions,
        interpretation: Some(interpretation),
    })
}

fn odds_ratios(design: &DesignMatrix, fit: &LogisticFit) -> IndexMap<String, OddsRatio> {
    let z = normal_quantile(0.975);
    design
        .names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let beta = fit.coefficients[j + 1];
            let se = fit.standard_errors[j + 1];
            let p_value = if se.is_finite() && se > 0.0 {
                normal_two_sided_p(beta / se)
            } else {
                1.0
            };
            let ratio = OddsRatio {
                odds_ratio: round4(beta.exp()),
                ci_low: round4((beta - z * se).exp()),
                ci_high: round4((beta + z * se).exp()),
                p_value: round4(p_value),
                significant: p_value < 0.05,
            };
            (name.clone(), ratio)
        })
        .collect()
}

fn model_fit(fit: &LogisticFit, labels: &[bool]) -> IndexMap<String, f64> {
    let n = labels.len() as f64;
    let k = fit.coefficients.len() as f64;
    let ll = fit.log_likelihood;

    let base = labels.iter().filter(|&&l| l).count() as f64 / n;
    let ll_null = n * (base * base.ln() + (1.0 - base) * (1.0 - base).ln());
    let pseudo_r2 = if ll_null != 0.0 { 1.0 - ll / ll_null } else { 0.0 };

    let mut out = IndexMap::new();
    out.insert("aic".to_string(), round4(2.0 * k - 2.0 * ll));
    out.insert("bic".to_string(), round4(k * n.ln() - 2.0 * ll));
    out.insert("pseudo_r2".to_string(), round4(pseudo_r2));
    out.insert("log_likelihood".to_string(), round4(ll));
    out
}

fn check_assumptions(
    design: &DesignMatrix,
    labels: &[bool],
    fit: &LogisticFit,
) -> IndexMap<String, AssumptionCheck> {
    let mut checks = IndexMap::new();

    let events = labels.iter().filter(|&&l| l).count();
    let k = design.width();
    checks.insert(
        "sample_size".to_string(),
        AssumptionCheck::new(
            Some(events >= EVENTS_PER_PREDICTOR * k),
            format!("{} events for {} predictors", events, k),
        )
        .with_recommendation("Need at least 10 events per predictor"),
    );

    let multicollinearity = match variance_inflation_factors(design) {
        Some(vif) => AssumptionCheck {
            passed: Some(vif.values().all(|v| *v < VIF_LIMIT)),
            detail: "VIF < 10 indicates acceptable multicollinearity".to_string(),
            recommendation: Some("Remove variables with VIF > 10".to_string()),
            vif_scores: Some(vif),
        },
        None => AssumptionCheck::new(None, "Could not compute VIF"),
    };
    checks.insert("multicollinearity".to_string(), multicollinearity);

    let separated = fit.max_abs_linear_predictor() > SEPARATION_ETA;
    let separation = if separated {
        AssumptionCheck::new(Some(false), "Fitted probabilities saturate at 0 or 1")
            .with_recommendation("Consider penalised regression or merging sparse categories")
    } else {
        AssumptionCheck::new(Some(true), "No complete separation detected")
            .with_recommendation("Model converged successfully")
    };
    checks.insert("complete_separation".to_string(), separation);

    let passed = checks.values().filter(|c| c.passed == Some(true)).count();
    tracing::debug!("{} of {} assumptions passed", passed, checks.len());
    checks
}

/// VIF of each feature regressed on the others (with intercept).
///
/// `None` when any auxiliary regression is singular.
fn variance_inflation_factors(design: &DesignMatrix) -> Option<IndexMap<String, f64>> {
    let n = design.rows.len();
    let k = design.width();
    if k == 0 || n <= k {
        return None;
    }

    let mut out = IndexMap::new();
    for (j, name) in design.names.iter().enumerate() {
        let target = DVector::from_iterator(n, design.rows.iter().map(|r| r[j]));
        let mean = target.mean();
        let sst: f64 = target.iter().map(|v| (v - mean).powi(2)).sum();
        if sst <= 0.0 {
            return None;
        }

        let vif = if k == 1 {
            1.0
        } else {
            let others = DMatrix::from_fn(n, k, |i, c| match c {
                0 => 1.0,
                c if c <= j => design.rows[i][c - 1],
                c => design.rows[i][c],
            });
            let xtx = others.transpose() * &others;
            let coef = xtx.cholesky()?.solve(&(others.transpose() * &target));
            let resid = &target - &others * coef;
            let r2 = 1.0 - resid.norm_squared() / sst;
            if r2 >= 1.0 {
                return None;
            }
            1.0 / (1.0 - r2)
        };
        out.insert(name.clone(), (vif * 100.0).round() / 100.0);
    }
    Some(out)
}

fn interpret(odds_ratios: &IndexMap<String, OddsRatio>, outcome: &str) -> String {
    let significant: Vec<String> = odds_ratios
        .iter()
        .filter(|(_, or)| or.significant)
        .take(3)
        .map(|(name, or)| {
            let direction = if or.odds_ratio > 1.0 { "increases" } else { "decreases" };
            format!(
                "{} {} the odds of {} (OR={}, 95% CI: {}-{})",
                name, direction, outcome, or.odds_ratio, or.ci_low, or.ci_high
            )
        })
        .collect();

    if significant.is_empty() {
        format!(
            "No statistically significant predictors of {} were found at the 0.05 significance level.",
            outcome
        )
    } else {
        format!("Statistically significant predictors: {}.", significant.join(". "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cohort() -> DataTable {
        // death rises with age; sex is noise
        let records = vec![
            vec!["34", "F", "0"],
            vec!["41", "M", "0"],
            vec!["45", "F", "0"],
            vec!["48", "M", "1"],
            vec!["52", "F", "0"],
            vec!["55", "M", "0"],
            vec!["58", "F", "1"],
            vec!["61", "M", "0"],
            vec!["63", "F", "1"],
            vec!["66", "M", "1"],
            vec!["70", "F", "0"],
            vec!["72", "M", "1"],
            vec!["75", "F", "1"],
            vec!["79", "M", "1"],
            vec!["NA", "F", "1"],
        ];
        DataTable::from_records(["age", "sex", "died"], records).unwrap()
    }

    #[test]
    fn test_logistic_regression_reports_complete_result() {
        let predictors = vec!["age".to_string(), "sex".to_string()];
        let result = logistic_regression(&cohort(), "died", &predictors).unwrap();

        assert!(!result.is_error());
        assert_eq!(result.model.as_deref(), Some(LOGISTIC_MODEL));
        assert_eq!(result.n, Some(14));
        let names: Vec<&String> = result.odds_ratios.keys().collect();
        assert_eq!(names, vec!["age", "sex_M"]);
        assert!(result.odds_ratios["age"].odds_ratio > 1.0);

        let fit_keys: Vec<&String> = result.model_fit.keys().collect();
        assert_eq!(fit_keys, vec!["aic", "bic", "pseudo_r2", "log_likelihood"]);
        assert!(result.model_fit["pseudo_r2"] > 0.0 && result.model_fit["pseudo_r2"] < 1.0);
        assert!(result.model_fit["aic"] > 0.0);

        // 7 events for 2 predictors falls short of 10 per predictor
        assert_eq!(result.assumptions["sample_size"].passed, Some(false));
        assert_eq!(result.assumptions["sample_size"].detail, "7 events for 2 predictors");
        assert_eq!(result.assumptions["multicollinearity"].passed, Some(true));
        assert_eq!(result.assumptions["complete_separation"].passed, Some(true));
        assert!(result.interpretation.is_some());
    }

    #[test]
    fn test_missing_predictor_column_is_an_error() {
        let err = logistic_regression(&cohort(), "died", &["bmi".to_string()]).unwrap_err();
        assert!(matches!(err, EvidenceError::MissingColumn { .. }));
    }

    #[test]
    fn test_single_class_outcome_is_reported_as_failure() {
        let table = DataTable::from_records(
            ["x", "y"],
            vec![vec!["1", "1"], vec!["2", "1"], vec!["3", "1"]],
        )
        .unwrap();
        let result = logistic_regression(&table, "y", &["x".to_string()]).unwrap();
        assert!(result.is_error());
        assert!(result.model.is_none());
    }

    #[test]
    fn test_non_binary_outcome_rejected() {
        let table = DataTable::from_records(["x", "y"], vec![vec!["1", "0"], vec!["2", "2"]]).unwrap();
        let err = logistic_regression(&table, "y", &["x".to_string()]).unwrap_err();
        assert!(matches!(err, EvidenceError::InvalidInput(_)));
    }

    #[test]
    fn test_collinear_predictors_inflate_vif() {
        let design = DesignMatrix {
            names: vec!["a".to_string(), "b".to_string()],
            rows: (0..10)
                .map(|i| {
                    let a = i as f64;
                    vec![a, 2.0 * a + if i % 2 == 0 { 0.01 } else { -0.01 }]
                })
                .collect(),
            source_rows: (0..10).collect(),
        };
        let vif = variance_inflation_factors(&design).unwrap();
        assert!(vif["a"] > 10.0);
        assert!(vif["b"] > 10.0);
    }

    #[test]
    fn test_interpretation_without_significant_predictors() {
        let text = interpret(&IndexMap::new(), "death");
        assert_eq!(
            text,
            "No statistically significant predictors of death were found at the 0.05 significance level."
        );
    }
}
