//! Descriptive statistics shared by the engines.

use std::cmp::Ordering;

/// Running mean/variance accumulator (Welford's algorithm).
///
/// Single pass, numerically stable, O(1) memory.
#[derive(Debug, Clone)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Add a value.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Sample variance (n - 1 denominator); undefined below two values.
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }

    /// Population variance (n denominator).
    pub fn population_variance(&self) -> Option<f64> {
        (self.count > 0).then(|| self.m2 / self.count as f64)
    }

    pub fn sample_std(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }

    pub fn population_std(&self) -> Option<f64> {
        self.population_variance().map(f64::sqrt)
    }
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = RunningStats::new();
        for value in iter {
            stats.push(value);
        }
        stats
    }
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    values.iter().copied().collect::<RunningStats>().mean()
}

/// Sample standard deviation; `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    values.iter().copied().collect::<RunningStats>().sample_std()
}

/// Population standard deviation; `None` for an empty slice.
pub fn population_std(values: &[f64]) -> Option<f64> {
    values.iter().copied().collect::<RunningStats>().population_std()
}

/// Median with midpoint interpolation for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Standardized mean difference between two groups.
///
/// Uses the pooled SD `sqrt((s_t^2 + s_c^2) / 2)` with sample variances.
/// Returns 0.0 when either group has fewer than two values or the pooled SD
/// is zero. The sign follows `treated - control`.
pub fn standardized_mean_difference(treated: &[f64], control: &[f64]) -> f64 {
    let t: RunningStats = treated.iter().copied().collect();
    let c: RunningStats = control.iter().copied().collect();

    let (Some(mean_t), Some(mean_c)) = (t.mean(), c.mean()) else {
        return 0.0;
    };
    let (Some(var_t), Some(var_c)) = (t.sample_variance(), c.sample_variance()) else {
        return 0.0;
    };

    let pooled_sd = ((var_t + var_c) / 2.0).sqrt();
    if pooled_sd == 0.0 {
        return 0.0;
    }
    (mean_t - mean_c) / pooled_sd
}

/// Area under the ROC curve of `scores` against binary `labels`.
///
/// Computed as the Mann-Whitney statistic with average ranks for ties.
/// `None` when either class is empty.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Option<f64> {
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 || scores.len() != labels.len() {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; tied block i..=j shares the average rank
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        rank_sum_pos += order[i..=j].iter().filter(|&&k| labels[k]).count() as f64 * avg_rank;
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let u = rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0;
    Some(u / (n_pos * n_neg as f64))
}
