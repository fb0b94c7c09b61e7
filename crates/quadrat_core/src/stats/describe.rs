//! Descriptive statistics over slices, plus the summary fingerprint used to
//! demonstrate that wildly different point clouds can share identical
//! summary statistics.
//!
//! Functions return `None` when the input is too short for the statistic to
//! be defined (variance needs two points, correlation needs two points and
//! nonzero spread).

use serde::Serialize;

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Sample variance (n - 1 denominator), two-pass.
pub fn variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data)?;
    let sum_sq = data.iter().map(|v| (v - m) * (v - m)).sum::<f64>();
    Some(sum_sq / (data.len() - 1) as f64)
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

pub fn median(data: &[f64]) -> Option<f64> {
    quantile(data, 0.5)
}

/// Quantile with linear interpolation between order statistics.
pub fn quantile(data: &[f64], p: f64) -> Option<f64> {
    if data.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let position = p * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = position - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

/// Pearson correlation of two equal-length slices.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// The five summary statistics every cloud in the "identical summaries"
/// demonstration shares: count, both means, both standard deviations, and
/// the correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryFingerprint {
    pub n: usize,
    pub mean_x: f64,
    pub mean_y: f64,
    pub sd_x: f64,
    pub sd_y: f64,
    pub r: f64,
}

impl SummaryFingerprint {
    pub fn of_pairs(x: &[f64], y: &[f64]) -> Option<Self> {
        Some(Self {
            n: x.len(),
            mean_x: mean(x)?,
            mean_y: mean(y)?,
            sd_x: std_dev(x)?,
            sd_y: std_dev(y)?,
            r: pearson(x, y)?,
        })
    }

    /// True when both fingerprints agree on every statistic after rounding
    /// to `decimals` places. Two clouds that match here are
    /// indistinguishable in a summary table yet can look nothing alike.
    pub fn matches(&self, other: &Self, decimals: u32) -> bool {
        let scale = 10f64.powi(decimals as i32);
        let round = |v: f64| (v * scale).round() / scale;
        self.n == other.n
            && round(self.mean_x) == round(other.mean_x)
            && round(self.mean_y) == round(other.mean_y)
            && round(self.sd_x) == round(other.sd_x)
            && round(self.sd_y) == round(other.sd_y)
            && round(self.r) == round(other.r)
    }
}
