//! Newton-Raphson logistic regression with optional ridge penalty.

use nalgebra::{DMatrix, DVector};

use crate::error::{EvidenceError, Result};

/// Settings for a logistic fit.
#[derive(Debug, Clone, Copy)]
pub struct LogisticOptions {
    /// L2 penalty on the slopes (the intercept is never penalised).
    /// `1.0` matches an inverse regularisation strength of C = 1.
    pub penalty: f64,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for LogisticOptions {
    fn default() -> Self {
        Self {
            penalty: 0.0,
            max_iter: 100,
            tolerance: 1e-8,
        }
    }
}

/// A fitted logistic model. Coefficient 0 is the intercept.
#[derive(Debug, Clone)]
pub struct LogisticFit {
    pub coefficients: Vec<f64>,
    /// Standard errors from the inverse information matrix at the optimum.
    pub standard_errors: Vec<f64>,
    /// Fitted probabilities, one per row.
    pub fitted: Vec<f64>,
    /// Unpenalised log-likelihood at the optimum.
    pub log_likelihood: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl LogisticFit {
    /// Largest absolute linear predictor; very large values signal separation.
    pub fn max_abs_linear_predictor(&self) -> f64 {
        self.fitted
            .iter()
            .map(|p| {
                let p = p.clamp(1e-300, 1.0 - 1e-16);
                (p / (1.0 - p)).ln().abs()
            })
            .fold(0.0, f64::max)
    }
}

fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^eta)` without overflow.
fn softplus(eta: f64) -> f64 {
    if eta > 0.0 {
        eta + (-eta).exp().ln_1p()
    } else {
        eta.exp().ln_1p()
    }
}

fn log_likelihood(eta: &DVector<f64>, y: &DVector<f64>) -> f64 {
    eta.iter().zip(y.iter()).map(|(e, yi)| yi * e - softplus(*e)).sum()
}

/// Fit `P(y = 1) = sigmoid(b0 + x . b)` by penalised maximum likelihood.
///
/// `features` is row-major without an intercept column. Fails with
/// `ComputationDegenerate` when the information matrix cannot be factored.
pub fn fit_logistic(
    features: &[Vec<f64>],
    labels: &[bool],
    options: LogisticOptions,
) -> Result<LogisticFit> {
    let n = labels.len();
    if n == 0 || features.len() != n {
        return Err(EvidenceError::InvalidInput(
            "logistic fit needs one feature row per label".to_string(),
        ));
    }
    let k = 1 + features[0].len();
    if features.iter().any(|row| row.len() + 1 != k) {
        return Err(EvidenceError::InvalidInput(
            "feature rows have inconsistent widths".to_string(),
        ));
    }

    let x = DMatrix::from_fn(n, k, |i, j| if j == 0 { 1.0 } else { features[i][j - 1] });
    let y = DVector::from_iterator(n, labels.iter().map(|&l| if l { 1.0 } else { 0.0 }));
    let mask = DVector::from_fn(k, |j, _| if j == 0 { 0.0 } else { options.penalty });

    let objective = |beta: &DVector<f64>| {
        let eta = &x * beta;
        log_likelihood(&eta, &y) - 0.5 * mask.component_mul(beta).dot(beta)
    };

    let mut beta = DVector::<f64>::zeros(k);
    let mut current = objective(&beta);
    let mut converged = false;
    let mut iterations = 0;

    while iterations < options.max_iter {
        iterations += 1;

        let p = (&x * &beta).map(sigmoid);
        let gradient = x.transpose() * (&y - &p) - mask.component_mul(&beta);
        let information = information_matrix(&x, &p, &mask);

        let step = information
            .cholesky()
            .ok_or_else(|| {
                EvidenceError::ComputationDegenerate(
                    "information matrix is not positive definite".to_string(),
                )
            })?
            .solve(&gradient);

        // Step halving keeps the objective monotone on flat or separated data
        let mut scale = 1.0;
        let mut candidate = &beta + &step;
        let mut value = objective(&candidate);
        while value < current - 1e-12 && scale > 1e-6 {
            scale *= 0.5;
            candidate = &beta + &step * scale;
            value = objective(&candidate);
        }

        let change = (&step * scale).amax();
        beta = candidate;
        current = value;

        if change < options.tolerance {
            converged = true;
            break;
        }
    }

    let eta = &x * &beta;
    let p = eta.map(sigmoid);
    let information = information_matrix(&x, &p, &mask);
    let standard_errors = match information.try_inverse() {
        Some(cov) => (0..k).map(|j| cov[(j, j)].max(0.0).sqrt()).collect(),
        None => vec![f64::NAN; k],
    };

    if !converged {
        tracing::warn!("logistic fit did not converge after {} iterations", iterations);
    }

    Ok(LogisticFit {
        coefficients: beta.iter().copied().collect(),
        standard_errors,
        fitted: p.iter().copied().collect(),
        log_likelihood: log_likelihood(&eta, &y),
        iterations,
        converged,
    })
}

/// `X' W X + diag(penalty)` with `W = p (1 - p)` floored away from zero.
fn information_matrix(x: &DMatrix<f64>, p: &DVector<f64>, mask: &DVector<f64>) -> DMatrix<f64> {
    let weights = p.map(|pi| (pi * (1.0 - pi)).max(1e-12));
    let weighted = DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] * weights[i]);
    let mut information = x.transpose() * weighted;
    for j in 0..mask.len() {
        information[(j, j)] += mask[j];
    }
    information
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlapping_data() -> (Vec<Vec<f64>>, Vec<bool>) {
        let xs = [-2.0, -1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5, 2.0, 2.5];
        let ys = [false, false, true, false, false, true, false, true, true, true];
        (xs.iter().map(|&x| vec![x]).collect(), ys.to_vec())
    }

    #[test]
    fn test_intercept_only_matches_base_rate() {
        let features = vec![Vec::new(); 8];
        let labels = [true, false, false, true, false, false, false, true];
        let fit = fit_logistic(&features, &labels, LogisticOptions::default()).unwrap();
        assert!(fit.converged);
        // logit(3/8)
        assert!((fit.coefficients[0] - (3.0f64 / 5.0).ln()).abs() < 1e-8);
        assert!(fit.fitted.iter().all(|p| (p - 0.375).abs() < 1e-8));
    }

    #[test]
    fn test_score_equations_hold_at_optimum() {
        let (features, labels) = overlapping_data();
        let fit = fit_logistic(&features, &labels, LogisticOptions::default()).unwrap();
        assert!(fit.converged);
        assert!(fit.coefficients[1] > 0.0);

        // Unpenalised MLE: sum(y - p) = 0 and sum(x (y - p)) = 0
        let resid: Vec<f64> = labels
            .iter()
            .zip(&fit.fitted)
            .map(|(&y, p)| (if y { 1.0 } else { 0.0 }) - p)
            .collect();
        assert!(resid.iter().sum::<f64>().abs() < 1e-6);
        let weighted: f64 = resid.iter().zip(&features).map(|(r, x)| r * x[0]).sum();
        assert!(weighted.abs() < 1e-6);
        assert!(fit.standard_errors.iter().all(|se| se.is_finite() && *se > 0.0));
    }

    #[test]
    fn test_penalty_shrinks_slope() {
        let (features, labels) = overlapping_data();
        let plain = fit_logistic(&features, &labels, LogisticOptions::default()).unwrap();
        let ridge = fit_logistic(
            &features,
            &labels,
            LogisticOptions {
                penalty: 1.0,
                ..LogisticOptions::default()
            },
        )
        .unwrap();
        assert!(ridge.coefficients[1].abs() < plain.coefficients[1].abs());
    }

    #[test]
    fn test_separated_data_stays_finite_with_penalty() {
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let labels: Vec<bool> = (0..10).map(|i| i >= 5).collect();
        let fit = fit_logistic(
            &features,
            &labels,
            LogisticOptions {
                penalty: 1.0,
                ..LogisticOptions::default()
            },
        )
        .unwrap();
        assert!(fit.coefficients.iter().all(|c| c.is_finite()));
        assert!(fit.fitted.iter().all(|p| *p > 0.0 && *p < 1.0));
    }

    #[test]
    fn test_rejects_ragged_features() {
        let err = fit_logistic(&[vec![1.0], vec![]], &[true, false], LogisticOptions::default())
            .unwrap_err();
        assert!(matches!(err, EvidenceError::InvalidInput(_)));
    }
}
