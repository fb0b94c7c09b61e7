//! Seeded generators for classroom datasets. Every generator takes an
//! explicit seed so a worksheet regenerates the same numbers on every run.

use crate::table::{Column, Table};
use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Points scattered around `y = intercept + slope * x` with Gaussian noise,
/// x drawn uniformly from `x_range`.
pub fn linear_with_noise(
    seed: u64,
    n: usize,
    intercept: f64,
    slope: f64,
    sigma: f64,
    x_range: (f64, f64),
) -> Result<Table> {
    if n == 0 {
        bail!("Sample count must be positive.");
    }
    if sigma <= 0.0 {
        bail!("Noise standard deviation must be positive.");
    }
    if !(x_range.0.is_finite() && x_range.1.is_finite() && x_range.1 > x_range.0) {
        bail!("x range must be finite with max > min.");
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).context("building the noise distribution")?;

    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    for _ in 0..n {
        let x = rng.gen_range(x_range.0..=x_range.1);
        let y = intercept + slope * x + noise.sample(&mut rng);
        xs.push(Some(x));
        ys.push(Some(y));
    }

    Table::new(vec![
        ("x".to_string(), Column::Numeric(xs)),
        ("y".to_string(), Column::Numeric(ys)),
    ])
}

/// Several groups, each with the same within-group slope, whose baselines
/// march the opposite way: group g covers x in [g * x_step, ...) while its
/// intercept drops by `intercept_step`. With a negative-enough step the
/// pooled fit reverses the within-group trend.
pub fn confounded_groups(
    seed: u64,
    groups: usize,
    per_group: usize,
    within_slope: f64,
    intercept_step: f64,
    sigma: f64,
) -> Result<Table> {
    if groups == 0 || per_group < 3 {
        bail!("Need at least one group with at least three points each.");
    }
    if sigma <= 0.0 {
        bail!("Noise standard deviation must be positive.");
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).context("building the noise distribution")?;
    let x_step = 5.0;

    let mut xs = Vec::with_capacity(groups * per_group);
    let mut ys = Vec::with_capacity(groups * per_group);
    let mut labels = Vec::with_capacity(groups * per_group);
    for g in 0..groups {
        let base_x = g as f64 * x_step;
        let intercept = g as f64 * intercept_step;
        let label = group_label(g);
        for _ in 0..per_group {
            let x = base_x + rng.gen_range(0.0..=3.0);
            let y = intercept + within_slope * x + noise.sample(&mut rng);
            xs.push(Some(x));
            ys.push(Some(y));
            labels.push(Some(label.clone()));
        }
    }

    Table::new(vec![
        ("x".to_string(), Column::Numeric(xs)),
        ("y".to_string(), Column::Numeric(ys)),
        ("group".to_string(), Column::Categorical(labels)),
    ])
}

fn group_label(index: usize) -> String {
    // A, B, ..., Z, AA, AB, ... like spreadsheet columns.
    let mut label = String::new();
    let mut value = index;
    loop {
        label.insert(0, (b'A' + (value % 26) as u8) as char);
        if value < 26 {
            break;
        }
        value = value / 26 - 1;
    }
    label
}

#[cfg(test)]
mod tests {
    use super::{confounded_groups, group_label, linear_with_noise};
    use crate::stats::design::Formula;
    use crate::stats::glm::{fit, Family};
    use crate::stats::paradox::grouped_slopes;

    #[test]
    fn generators_are_deterministic_per_seed() {
        let a = linear_with_noise(7, 20, 1.0, 2.0, 0.5, (0.0, 10.0)).unwrap();
        let b = linear_with_noise(7, 20, 1.0, 2.0, 0.5, (0.0, 10.0)).unwrap();
        let c = linear_with_noise(8, 20, 1.0, 2.0, 0.5, (0.0, 10.0)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn linear_noise_recovers_its_own_slope() {
        let table = linear_with_noise(42, 200, 2.0, 3.0, 0.2, (0.0, 10.0)).unwrap();
        let model = fit(&table, &Formula::parse("y ~ x").unwrap(), Family::Gaussian).unwrap();
        let slope = model.coefficient("x").unwrap().estimate;
        assert!((slope - 3.0).abs() < 0.1, "slope {slope}");
    }

    #[test]
    fn generator_rejects_bad_settings() {
        assert!(linear_with_noise(1, 0, 0.0, 1.0, 1.0, (0.0, 1.0)).is_err());
        assert!(linear_with_noise(1, 10, 0.0, 1.0, 0.0, (0.0, 1.0)).is_err());
        assert!(linear_with_noise(1, 10, 0.0, 1.0, 1.0, (1.0, 1.0)).is_err());
        assert!(confounded_groups(1, 0, 5, 1.0, -4.0, 0.1).is_err());
        assert!(confounded_groups(1, 3, 2, 1.0, -4.0, 0.1).is_err());
    }

    #[test]
    fn confounded_groups_reverse_the_pooled_slope() {
        // Within-group slope +0.8; each group's baseline drops by 9 while
        // its x window advances by 5, so the pooled trend points down.
        let table = confounded_groups(11, 3, 12, 0.8, -9.0, 0.15).unwrap();
        let slopes = grouped_slopes(&table, "y", "x", "group").unwrap();
        assert!(slopes.reverses(), "pooled {} groups {:?}", slopes.pooled, slopes.groups);
    }

    #[test]
    fn group_labels_extend_like_spreadsheet_columns() {
        assert_eq!(group_label(0), "A");
        assert_eq!(group_label(25), "Z");
        assert_eq!(group_label(26), "AA");
        assert_eq!(group_label(27), "AB");
    }
}
