//! Generalized linear models: Gaussian/identity and Binomial/logit, fitted
//! by iteratively reweighted least squares. The Gaussian case collapses to
//! ordinary least squares and converges in one reweighting step.

use crate::stats::design::{build_design, DesignMatrix, Formula};
use crate::stats::special::{normal_p_value, normal_quantile, t_p_value, t_quantile};
use crate::table::Table;
use anyhow::{anyhow, bail, Result};
use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use std::fmt::Write as _;

const MAX_IRLS_STEPS: usize = 25;
const DEVIANCE_TOLERANCE: f64 = 1e-8;
/// Fitted binomial means are kept inside (eps, 1 - eps) so the working
/// weights stay finite.
const MU_CLAMP: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Family {
    /// Identity link, constant variance.
    Gaussian,
    /// Logit link, 0/1 response.
    Binomial,
}

impl Family {
    fn link(self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => mu,
            Family::Binomial => (mu / (1.0 - mu)).ln(),
        }
    }

    fn inverse_link(self, eta: f64) -> f64 {
        match self {
            Family::Gaussian => eta,
            Family::Binomial => 1.0 / (1.0 + (-eta).exp()),
        }
    }

    /// d(eta)/d(mu), the link derivative.
    fn link_derivative(self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => 1.0,
            Family::Binomial => 1.0 / (mu * (1.0 - mu)),
        }
    }

    fn variance(self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => 1.0,
            Family::Binomial => mu * (1.0 - mu),
        }
    }

    fn initial_mu(self, y: f64) -> f64 {
        match self {
            Family::Gaussian => y,
            Family::Binomial => (y + 0.5) / 2.0,
        }
    }

    fn deviance(self, y: &DVector<f64>, mu: &DVector<f64>) -> f64 {
        match self {
            Family::Gaussian => y.iter().zip(mu.iter()).map(|(y, m)| (y - m) * (y - m)).sum(),
            Family::Binomial => {
                let term = |y: f64, m: f64| {
                    let mut dev = 0.0;
                    if y > 0.0 {
                        dev += y * (y / m).ln();
                    }
                    if y < 1.0 {
                        dev += (1.0 - y) * ((1.0 - y) / (1.0 - m)).ln();
                    }
                    dev
                };
                2.0 * y.iter().zip(mu.iter()).map(|(&y, &m)| term(y, m)).sum::<f64>()
            }
        }
    }
}

/// One row of the coefficient table.
#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    /// t statistic (Gaussian) or z statistic (Binomial).
    pub statistic: f64,
    pub p_value: f64,
}

/// A fitted model with everything inference needs.
#[derive(Debug, Clone)]
pub struct GlmFit {
    pub family: Family,
    pub coefficients: Vec<Coefficient>,
    pub df_residual: usize,
    /// Residual variance for Gaussian; fixed at 1 for Binomial.
    pub dispersion: f64,
    pub deviance: f64,
    pub iterations: usize,
    cov: DMatrix<f64>,
}

/// Fits `formula` on `table` under `family`.
pub fn fit(table: &Table, formula: &Formula, family: Family) -> Result<GlmFit> {
    let design = build_design(table, formula)?;
    fit_design(&design, family)
}

/// Fits a prepared design matrix.
pub fn fit_design(design: &DesignMatrix, family: Family) -> Result<GlmFit> {
    let x = &design.x;
    let y = &design.y;
    let n = x.nrows();
    let p = x.ncols();

    if family == Family::Binomial {
        for value in y.iter() {
            if *value != 0.0 && *value != 1.0 {
                bail!("Binomial response must be coded 0/1; found {value}.");
            }
        }
    }

    let mut mu = y.map(|v| family.initial_mu(v));
    let mut eta = mu.map(|m| family.link(m));
    let mut beta = DVector::zeros(p);
    let mut deviance = f64::INFINITY;
    let mut iterations = 0usize;
    let mut weights = DVector::zeros(n);

    loop {
        iterations += 1;

        // Working response and weights for this round.
        let mut x_weighted = DMatrix::zeros(n, p);
        let mut z_weighted = DVector::zeros(n);
        for i in 0..n {
            let m = mu[i];
            let g_prime = family.link_derivative(m);
            let w = 1.0 / (family.variance(m) * g_prime * g_prime);
            let z = eta[i] + (y[i] - m) * g_prime;
            if !w.is_finite() || !z.is_finite() {
                bail!("IRLS produced a non-finite working response at step {iterations}.");
            }
            weights[i] = w;
            let sqrt_w = w.sqrt();
            for j in 0..p {
                x_weighted[(i, j)] = sqrt_w * x[(i, j)];
            }
            z_weighted[i] = sqrt_w * z;
        }

        beta = solve_least_squares(&x_weighted, &z_weighted)
            .ok_or_else(|| anyhow!("Design matrix is singular or nearly collinear."))?;

        eta = x * &beta;
        mu = eta.map(|e| {
            let m = family.inverse_link(e);
            match family {
                Family::Gaussian => m,
                Family::Binomial => m.clamp(MU_CLAMP, 1.0 - MU_CLAMP),
            }
        });

        let new_deviance = family.deviance(y, &mu);
        debug!("irls step {iterations}: deviance {new_deviance:.6e}");
        let converged = (deviance - new_deviance).abs()
            <= DEVIANCE_TOLERANCE * (new_deviance.abs() + 0.1);
        deviance = new_deviance;
        if converged || family == Family::Gaussian {
            break;
        }
        if iterations >= MAX_IRLS_STEPS {
            bail!("IRLS failed to converge in {MAX_IRLS_STEPS} steps.");
        }
    }

    let df_residual = n - p;
    let dispersion = match family {
        Family::Gaussian => deviance / df_residual as f64,
        Family::Binomial => 1.0,
    };

    // Unscaled covariance (X' W X)^-1, scaled by the dispersion.
    let mut xtwx = DMatrix::zeros(p, p);
    for i in 0..n {
        for a in 0..p {
            for b in 0..p {
                xtwx[(a, b)] += weights[i] * x[(i, a)] * x[(i, b)];
            }
        }
    }
    let cov = xtwx
        .try_inverse()
        .ok_or_else(|| anyhow!("Information matrix is singular; cannot compute standard errors."))?
        * dispersion;

    let coefficients = design
        .names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let estimate = beta[j];
            let std_error = cov[(j, j)].max(0.0).sqrt();
            let statistic = estimate / std_error;
            let p_value = match family {
                Family::Gaussian => t_p_value(statistic, df_residual as f64),
                Family::Binomial => normal_p_value(statistic),
            };
            Coefficient {
                name: name.clone(),
                estimate,
                std_error,
                statistic,
                p_value,
            }
        })
        .collect();

    Ok(GlmFit {
        family,
        coefficients,
        df_residual,
        dispersion,
        deviance,
        iterations,
        cov,
    })
}

/// Least-squares solve by SVD; tall matrices and mild collinearity are
/// tolerated, truly rank-deficient designs are not.
fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    for &tolerance in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tolerance) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }
    None
}

impl GlmFit {
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    /// Interval half-width multiplier for a two-sided interval at `level`.
    fn critical_value(&self, level: f64) -> Result<f64> {
        if !(0.0..1.0).contains(&level) || level <= 0.0 {
            bail!("Confidence level must lie strictly between 0 and 1; got {level}.");
        }
        let upper = (1.0 + level) / 2.0;
        let q = match self.family {
            Family::Gaussian => t_quantile(upper, self.df_residual as f64),
            Family::Binomial => normal_quantile(upper),
        };
        if !q.is_finite() {
            bail!("Failed to compute the critical value for level {level}.");
        }
        Ok(q)
    }

    /// Two-sided confidence intervals, one (lower, upper) pair per
    /// coefficient. Higher levels give strictly wider intervals.
    pub fn confidence_intervals(&self, level: f64) -> Result<Vec<(f64, f64)>> {
        let q = self.critical_value(level)?;
        Ok(self
            .coefficients
            .iter()
            .map(|c| (c.estimate - q * c.std_error, c.estimate + q * c.std_error))
            .collect())
    }

    /// Response-scale prediction for one predictor row (without the
    /// intercept entry, in coefficient-table order).
    pub fn predict(&self, predictors: &[f64]) -> Result<f64> {
        if predictors.len() + 1 != self.coefficients.len() {
            bail!(
                "Expected {} predictor value(s), got {}.",
                self.coefficients.len() - 1,
                predictors.len()
            );
        }
        let mut eta = self.coefficients[0].estimate;
        for (value, coefficient) in predictors.iter().zip(&self.coefficients[1..]) {
            eta += value * coefficient.estimate;
        }
        Ok(self.family.inverse_link(eta))
    }

    /// The printed coefficient table.
    pub fn summary(&self) -> String {
        let statistic_label = match self.family {
            Family::Gaussian => ("t value", "Pr(>|t|)"),
            Family::Binomial => ("z value", "Pr(>|z|)"),
        };
        let name_width = self
            .coefficients
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(0)
            .max(12);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:name_width$} {:>10} {:>10} {:>8} {:>9}",
            "", "Estimate", "Std. Error", statistic_label.0, statistic_label.1
        );
        for c in &self.coefficients {
            let _ = writeln!(
                out,
                "{:name_width$} {:>10.4} {:>10.4} {:>8.3} {:>9}",
                c.name,
                c.estimate,
                c.std_error,
                c.statistic,
                format_p_value(c.p_value)
            );
        }
        let _ = writeln!(
            out,
            "\nDispersion: {:.4} on {} residual degrees of freedom",
            self.dispersion, self.df_residual
        );
        out
    }
}

fn format_p_value(p: f64) -> String {
    if p < 2e-16 {
        "<2e-16".to_string()
    } else if p < 1e-4 {
        format!("{p:.2e}")
    } else {
        format!("{p:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::{fit, fit_design, Family};
    use crate::stats::design::{build_design, Formula};
    use crate::table::Table;

    /// Two animals per sex, means fixed at the worked example's values:
    /// females average 28.836, males 29.708.
    const WORKED: &str = "\
sex,weight
F,27.836
F,29.836
M,28.708
M,30.708
";

    fn worked_fit() -> super::GlmFit {
        let table = Table::from_csv_reader(WORKED.as_bytes()).unwrap();
        let formula = Formula::parse("weight ~ sex").unwrap();
        fit(&table, &formula, Family::Gaussian).expect("fit should succeed")
    }

    #[test]
    fn gaussian_dummy_fit_recovers_group_means() {
        let model = worked_fit();
        let intercept = model.coefficient("(Intercept)").unwrap();
        let slope = model.coefficient("sexM").unwrap();
        assert!((intercept.estimate - 28.836).abs() < 1e-10);
        assert!((slope.estimate - 0.872).abs() < 1e-10);
    }

    #[test]
    fn prediction_for_male_adds_the_contrast() {
        let model = worked_fit();
        let predicted = model.predict(&[1.0]).expect("prediction should succeed");
        assert!((predicted - 29.708).abs() < 1e-10);
        let reference = model.predict(&[0.0]).expect("prediction should succeed");
        assert!((reference - 28.836).abs() < 1e-10);
    }

    #[test]
    fn predict_rejects_wrong_arity() {
        let model = worked_fit();
        let err = model.predict(&[1.0, 2.0]).expect_err("should fail");
        assert!(format!("{err}").contains("predictor value"));
    }

    #[test]
    fn ninety_five_interval_is_narrower_than_ninety_nine() {
        let model = worked_fit();
        let ci95 = model.confidence_intervals(0.95).unwrap();
        let ci99 = model.confidence_intervals(0.99).unwrap();
        for (narrow, wide) in ci95.iter().zip(&ci99) {
            let narrow_width = narrow.1 - narrow.0;
            let wide_width = wide.1 - wide.0;
            assert!(
                narrow_width < wide_width,
                "95% width {narrow_width} not below 99% width {wide_width}"
            );
        }
    }

    #[test]
    fn confidence_level_must_be_a_probability() {
        let model = worked_fit();
        assert!(model.confidence_intervals(0.0).is_err());
        assert!(model.confidence_intervals(1.0).is_err());
        assert!(model.confidence_intervals(95.0).is_err());
    }

    #[test]
    fn gaussian_slope_interval_covers_the_true_slope() {
        // y = 2 + 3x with small, fixed perturbations.
        let noise = [0.11, -0.07, 0.05, -0.12, 0.09, -0.04, 0.02, -0.06];
        let mut csv = String::from("x,y\n");
        for (i, eps) in noise.iter().enumerate() {
            let x = i as f64;
            csv.push_str(&format!("{x},{}\n", 2.0 + 3.0 * x + eps));
        }
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        let formula = Formula::parse("y ~ x").unwrap();
        let model = fit(&table, &formula, Family::Gaussian).unwrap();
        let ci = model.confidence_intervals(0.95).unwrap();
        assert!(ci[1].0 < 3.0 && 3.0 < ci[1].1, "interval {:?}", ci[1]);
        // Strong signal: the slope should be overwhelmingly significant.
        assert!(model.coefficient("x").unwrap().p_value < 1e-6);
    }

    #[test]
    fn intercept_only_binomial_matches_logit_of_proportion() {
        let csv = "y\n1\n1\n0\n0\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        let formula = Formula::parse("y ~ 1").unwrap();
        let model = fit(&table, &formula, Family::Binomial).unwrap();
        let intercept = model.coefficient("(Intercept)").unwrap();
        // logit(0.5) = 0; se = sqrt(1 / (n p (1-p))) = 1.
        assert!(intercept.estimate.abs() < 1e-6);
        assert!((intercept.std_error - 1.0).abs() < 1e-4);
        assert_eq!(model.dispersion, 1.0);
    }

    #[test]
    fn binomial_slope_tracks_separating_predictor() {
        let csv = "x,y\n0,0\n1,0\n2,0\n3,1\n2,1\n4,1\n5,1\n1,1\n3,0\n0,0\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        let formula = Formula::parse("y ~ x").unwrap();
        let model = fit(&table, &formula, Family::Binomial).unwrap();
        assert!(model.coefficient("x").unwrap().estimate > 0.0);
        assert!(model.iterations > 1);
        let p = model.coefficient("x").unwrap().p_value;
        assert!(p > 0.0 && p < 1.0);
    }

    #[test]
    fn binomial_rejects_non_binary_response() {
        let csv = "x,y\n0,0\n1,2\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        let design = build_design(&table, &Formula::parse("y ~ 1").unwrap()).unwrap();
        let err = fit_design(&design, Family::Binomial).expect_err("should fail");
        assert!(format!("{err}").contains("0/1"));
    }

    #[test]
    fn collinear_design_is_rejected() {
        // Second predictor duplicates the first.
        let csv = "x,z,y\n1,1,2\n2,2,4\n3,3,7\n4,4,8\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        let formula = Formula::parse("y ~ x + z").unwrap();
        let err = fit(&table, &formula, Family::Gaussian).expect_err("should fail");
        let message = format!("{err}");
        assert!(
            message.contains("singular") || message.contains("collinear"),
            "unexpected error: {message}"
        );
    }

    #[test]
    fn summary_prints_the_coefficient_table() {
        let model = worked_fit();
        let text = model.summary();
        assert!(text.contains("(Intercept)"));
        assert!(text.contains("sexM"));
        assert!(text.contains("Estimate"));
        assert!(text.contains("t value"));
    }
}
