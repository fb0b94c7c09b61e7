use crate::{autodiff::Dual, traits::VectorField};
use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use nalgebra::linalg::SVD;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewtonSettings {
    pub max_steps: usize,
    pub damping: f64,
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_steps: 25,
            damping: 1.0,
            tolerance: 1e-9,
        }
    }
}

/// Eigenvalue of the Jacobian with its (normalized) eigenvector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EigenPair {
    pub value: Complex64,
    pub vector: Vec<Complex64>,
}

/// A refined fixed point with its local linearization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedPoint {
    pub state: Vec<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
    /// Row-major Jacobian evaluated at `state`.
    pub jacobian: Vec<f64>,
    pub eigenpairs: Vec<EigenPair>,
}

impl FixedPoint {
    pub fn eigenvalues(&self) -> Vec<Complex64> {
        self.eigenpairs.iter().map(|pair| pair.value).collect()
    }
}

/// Assembles the Jacobian of the vector field at `state`, one column per
/// coordinate, by seeding a unit dual perturbation in that coordinate.
pub fn jacobian_at<S: VectorField<Dual>>(system: &S, state: &[f64]) -> Result<Vec<f64>> {
    let dim = system.dimension();
    if dim == 0 {
        bail!("System has zero dimension.");
    }
    if state.len() != dim {
        bail!(
            "State dimension mismatch. Expected {}, got {}.",
            dim,
            state.len()
        );
    }

    let mut jacobian = vec![0.0; dim * dim];
    let mut dual_state = vec![Dual::constant(0.0); dim];
    let mut dual_out = vec![Dual::constant(0.0); dim];
    let t = Dual::constant(0.0);

    for col in 0..dim {
        for i in 0..dim {
            dual_state[i] = if i == col {
                Dual::variable(state[i])
            } else {
                Dual::constant(state[i])
            };
        }
        system.rate(t, &dual_state, &mut dual_out);
        for row in 0..dim {
            jacobian[row * dim + col] = dual_out[row].eps;
        }
    }

    Ok(jacobian)
}

/// Refines `initial_guess` to a fixed point of the flow by damped Newton
/// iteration, then attaches the Jacobian and its eigenpairs.
pub fn find_fixed_point<S>(
    system: &S,
    initial_guess: &[f64],
    settings: NewtonSettings,
) -> Result<FixedPoint>
where
    S: VectorField<f64> + VectorField<Dual>,
{
    let dim = VectorField::<f64>::dimension(system);
    if dim == 0 {
        bail!("System has zero dimension.");
    }
    if initial_guess.len() != dim {
        bail!(
            "Initial guess dimension mismatch. Expected {}, got {}.",
            dim,
            initial_guess.len()
        );
    }
    if settings.max_steps == 0 {
        bail!("max_steps must be greater than zero.");
    }
    if settings.damping <= 0.0 {
        bail!("damping must be positive.");
    }
    if settings.tolerance <= 0.0 {
        bail!("tolerance must be positive.");
    }

    let mut state = initial_guess.to_vec();
    let mut residual = vec![0.0; dim];
    VectorField::<f64>::rate(system, 0.0, &state, &mut residual);
    let mut residual_norm = l2_norm(&residual);
    let mut iterations = 0usize;

    loop {
        if residual_norm <= settings.tolerance {
            break;
        }

        if iterations >= settings.max_steps {
            bail!(
                "Newton solver failed to converge in {} steps (residual norm {}).",
                settings.max_steps,
                residual_norm
            );
        }

        let jacobian = jacobian_at(system, &state)?;
        let delta = solve_linear_system(dim, &jacobian, &residual)
            .context("Failed to solve linear system during Newton iteration.")?;

        for i in 0..dim {
            state[i] -= settings.damping * delta[i];
        }

        iterations += 1;
        VectorField::<f64>::rate(system, 0.0, &state, &mut residual);
        residual_norm = l2_norm(&residual);
        debug!("newton step {iterations}: residual norm {residual_norm:.3e}");
    }

    let jacobian = jacobian_at(system, &state)?;
    let eigenpairs = compute_eigenpairs(dim, &jacobian)
        .context("Failed to compute eigenvalues/eigenvectors of Jacobian.")?;

    Ok(FixedPoint {
        state,
        residual_norm,
        iterations,
        jacobian,
        eigenpairs,
    })
}

fn solve_linear_system(dim: usize, jacobian: &[f64], residual: &[f64]) -> Result<Vec<f64>> {
    let j_matrix = DMatrix::from_row_slice(dim, dim, jacobian);
    let rhs = DVector::from_column_slice(residual);
    j_matrix
        .lu()
        .solve(&rhs)
        .map(|v| v.iter().cloned().collect())
        .ok_or_else(|| anyhow!("Jacobian is singular."))
}

/// Eigenvalues from the real Jacobian; the eigenvector for each eigenvalue
/// is taken from the SVD null space of the shifted matrix (J - lambda I).
pub fn compute_eigenpairs(dim: usize, jacobian: &[f64]) -> Result<Vec<EigenPair>> {
    if jacobian.len() != dim * dim {
        bail!(
            "Jacobian has {} entries; expected {} for dimension {}.",
            jacobian.len(),
            dim * dim,
            dim
        );
    }

    let matrix = DMatrix::from_row_slice(dim, dim, jacobian);
    let eigenvalues = matrix.complex_eigenvalues();
    let complex_matrix = matrix.map(|v| Complex64::new(v, 0.0));

    let mut pairs = Vec::with_capacity(dim);
    for idx in 0..dim {
        let lambda = eigenvalues[idx];

        let mut shifted = complex_matrix.clone();
        for i in 0..dim {
            shifted[(i, i)] -= lambda;
        }

        let svd = SVD::new(shifted, true, true);
        let v_t = svd
            .v_t
            .ok_or_else(|| anyhow!("Failed to compute eigenvector for eigenvalue index {}", idx))?;
        // `v_t` is the adjoint, so its last row is the conjugate of the
        // null vector of the shifted matrix.
        let row = v_t.row(v_t.nrows().saturating_sub(1));
        let mut vector: Vec<Complex64> = row.iter().map(|c| c.conj()).collect();
        normalize_complex_vector(&mut vector);

        pairs.push(EigenPair {
            value: lambda,
            vector,
        });
    }
    Ok(pairs)
}

fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn normalize_complex_vector(vec: &mut [Complex64]) {
    let norm = vec.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
    if norm > 0.0 {
        for entry in vec {
            *entry /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_eigenpairs, find_fixed_point, jacobian_at, NewtonSettings};
    use crate::systems::{LogisticGrowth, PredatorPrey};

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn jacobian_of_logistic_matches_closed_form() {
        let system = LogisticGrowth::new(0.8, 100.0);
        for n in [0.0, 30.0, 100.0] {
            let jacobian = jacobian_at(&system, &[n]).expect("jacobian should compute");
            assert!(
                (jacobian[0] - system.rate_derivative(n)).abs() < 1e-12,
                "mismatch at N = {n}"
            );
        }
    }

    #[test]
    fn jacobian_of_predator_prey_matches_partials() {
        let system = PredatorPrey::new(5.0, 1.0, 1.0, 0.2);
        let (x, y) = (1.3, 4.1);
        let jacobian = jacobian_at(&system, &[x, y]).expect("jacobian should compute");
        // [[a - b y, -b x], [c, -d]]
        assert!((jacobian[0] - (5.0 - y)).abs() < 1e-12);
        assert!((jacobian[1] - (-x)).abs() < 1e-12);
        assert!((jacobian[2] - 1.0).abs() < 1e-12);
        assert!((jacobian[3] - (-0.2)).abs() < 1e-12);
    }

    #[test]
    fn find_fixed_point_rejects_invalid_settings() {
        let system = PredatorPrey::new(5.0, 1.0, 1.0, 0.2);
        let mut settings = NewtonSettings::default();
        settings.max_steps = 0;
        assert_err_contains(
            find_fixed_point(&system, &[1.0, 5.0], settings),
            "max_steps",
        );

        let mut settings = NewtonSettings::default();
        settings.damping = 0.0;
        assert_err_contains(find_fixed_point(&system, &[1.0, 5.0], settings), "damping");

        let mut settings = NewtonSettings::default();
        settings.tolerance = -1.0;
        assert_err_contains(
            find_fixed_point(&system, &[1.0, 5.0], settings),
            "tolerance",
        );

        assert_err_contains(
            find_fixed_point(&system, &[1.0], NewtonSettings::default()),
            "dimension mismatch",
        );
    }

    #[test]
    fn newton_refines_coexistence_point_from_nearby_guess() {
        let system = PredatorPrey::new(5.0, 1.0, 1.0, 0.2);
        let result = find_fixed_point(&system, &[1.2, 4.6], NewtonSettings::default())
            .expect("newton should converge");
        assert!((result.state[0] - 1.0).abs() < 1e-7);
        assert!((result.state[1] - 5.0).abs() < 1e-7);
        assert!(result.residual_norm <= 1e-9);
        assert!(result.iterations > 0);
    }

    #[test]
    fn coexistence_eigenvalues_are_complex_with_negative_real_part() {
        let system = PredatorPrey::new(5.0, 1.0, 1.0, 0.2);
        let result = find_fixed_point(&system, &[1.0, 5.0], NewtonSettings::default())
            .expect("newton should converge");
        assert_eq!(result.eigenpairs.len(), 2);
        for pair in &result.eigenpairs {
            assert!((pair.value.re + 0.1).abs() < 1e-8, "re = {}", pair.value.re);
            assert!(pair.value.im.abs() > 0.9, "im = {}", pair.value.im);
        }
    }

    #[test]
    fn origin_eigenvalues_have_opposite_signs() {
        let system = PredatorPrey::new(5.0, 1.0, 1.0, 0.2);
        let result = find_fixed_point(&system, &[0.0, 0.0], NewtonSettings::default())
            .expect("origin is already an equilibrium");
        assert_eq!(result.iterations, 0);
        let mut reals: Vec<f64> = result.eigenvalues().iter().map(|l| l.re).collect();
        reals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((reals[0] + 0.2).abs() < 1e-8);
        assert!((reals[1] - 5.0).abs() < 1e-8);
    }

    #[test]
    fn eigenvectors_satisfy_the_eigen_equation() {
        let system = PredatorPrey::new(5.0, 1.0, 1.0, 0.2);
        let jacobian = jacobian_at(&system, &[1.0, 5.0]).expect("jacobian should compute");
        let pairs = compute_eigenpairs(2, &jacobian).expect("eigenpairs should compute");
        for pair in pairs {
            for row in 0..2 {
                let mut lhs = num_complex::Complex64::new(0.0, 0.0);
                for col in 0..2 {
                    lhs += jacobian[row * 2 + col] * pair.vector[col];
                }
                let rhs = pair.value * pair.vector[row];
                assert!((lhs - rhs).norm() < 1e-8, "row {row}: {lhs} vs {rhs}");
            }
        }
    }

    #[test]
    fn compute_eigenpairs_rejects_size_mismatch() {
        assert_err_contains(compute_eigenpairs(2, &[1.0, 2.0, 3.0]), "entries");
    }
}
