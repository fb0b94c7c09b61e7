//! Linear stability classification from the Jacobian's eigenvalues.
//!
//! A fixed point is hyperbolic when no eigenvalue real part is zero; the
//! classifier reports `NonHyperbolic` whenever a real part lands within
//! tolerance of zero and the linearization alone cannot decide.

use crate::equilibrium::compute_eigenpairs;
use anyhow::Result;
use num_complex::Complex64;
use serde::Serialize;

/// Real parts within this distance of zero are treated as zero.
const ZERO_TOLERANCE: f64 = 1e-9;

/// Stability of a 1-D fixed point, read off the sign of f'(x*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScalarStability {
    Stable,
    Unstable,
    Marginal,
}

/// Classifies a 1-D fixed point from the derivative of the rate function
/// at that point: negative is stable, positive unstable.
pub fn scalar_stability(derivative: f64) -> ScalarStability {
    if derivative.abs() <= ZERO_TOLERANCE {
        ScalarStability::Marginal
    } else if derivative < 0.0 {
        ScalarStability::Stable
    } else {
        ScalarStability::Unstable
    }
}

/// Local phase-plane geometry of a fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FixedPointClass {
    /// All eigenvalues real and negative.
    StableNode,
    /// All eigenvalues real and positive.
    UnstableNode,
    /// Real eigenvalues of both signs.
    Saddle,
    /// Complex eigenvalues with negative real part: decaying oscillation.
    StableSpiral,
    /// Complex eigenvalues with positive real part: growing oscillation.
    UnstableSpiral,
    /// Purely imaginary pair: closed orbits at linear order.
    Center,
    /// A zero real part; the linearization is inconclusive.
    NonHyperbolic,
}

impl FixedPointClass {
    pub fn is_stable(self) -> bool {
        matches!(self, FixedPointClass::StableNode | FixedPointClass::StableSpiral)
    }
}

/// True when any eigenvalue carries a nonzero imaginary part, i.e. the
/// local dynamics oscillate.
pub fn is_oscillatory(eigenvalues: &[Complex64]) -> bool {
    eigenvalues.iter().any(|l| l.im.abs() > ZERO_TOLERANCE)
}

/// Classifies a fixed point from the eigenvalues of its Jacobian.
pub fn classify(eigenvalues: &[Complex64]) -> FixedPointClass {
    let oscillatory = is_oscillatory(eigenvalues);
    let mut negative = 0usize;
    let mut positive = 0usize;
    let mut zero = 0usize;
    for lambda in eigenvalues {
        if lambda.re.abs() <= ZERO_TOLERANCE {
            zero += 1;
        } else if lambda.re < 0.0 {
            negative += 1;
        } else {
            positive += 1;
        }
    }

    if zero > 0 {
        if oscillatory && negative == 0 && positive == 0 {
            return FixedPointClass::Center;
        }
        return FixedPointClass::NonHyperbolic;
    }
    if negative > 0 && positive > 0 {
        return FixedPointClass::Saddle;
    }
    match (oscillatory, positive == 0) {
        (true, true) => FixedPointClass::StableSpiral,
        (true, false) => FixedPointClass::UnstableSpiral,
        (false, true) => FixedPointClass::StableNode,
        (false, false) => FixedPointClass::UnstableNode,
    }
}

/// Convenience entry point: eigenvalues of a row-major Jacobian, classified.
pub fn classify_jacobian(dim: usize, jacobian: &[f64]) -> Result<FixedPointClass> {
    let pairs = compute_eigenpairs(dim, jacobian)?;
    let eigenvalues: Vec<Complex64> = pairs.into_iter().map(|p| p.value).collect();
    Ok(classify(&eigenvalues))
}

#[cfg(test)]
mod tests {
    use super::{
        classify, classify_jacobian, is_oscillatory, scalar_stability, FixedPointClass,
        ScalarStability,
    };
    use num_complex::Complex64;

    fn reals(values: &[f64]) -> Vec<Complex64> {
        values.iter().map(|&re| Complex64::new(re, 0.0)).collect()
    }

    #[test]
    fn scalar_stability_follows_derivative_sign() {
        assert_eq!(scalar_stability(-0.8), ScalarStability::Stable);
        assert_eq!(scalar_stability(0.8), ScalarStability::Unstable);
        assert_eq!(scalar_stability(0.0), ScalarStability::Marginal);
    }

    #[test]
    fn real_eigenvalues_give_nodes_and_saddles() {
        assert_eq!(classify(&reals(&[-1.0, -2.0])), FixedPointClass::StableNode);
        assert_eq!(classify(&reals(&[1.0, 2.0])), FixedPointClass::UnstableNode);
        assert_eq!(classify(&reals(&[5.0, -0.2])), FixedPointClass::Saddle);
    }

    #[test]
    fn complex_pairs_give_spirals_and_centers() {
        let decaying = [Complex64::new(-0.1, 1.0), Complex64::new(-0.1, -1.0)];
        assert_eq!(classify(&decaying), FixedPointClass::StableSpiral);
        assert!(classify(&decaying).is_stable());

        let growing = [Complex64::new(0.1, 1.0), Complex64::new(0.1, -1.0)];
        assert_eq!(classify(&growing), FixedPointClass::UnstableSpiral);

        let pure = [Complex64::new(0.0, 2.0), Complex64::new(0.0, -2.0)];
        assert_eq!(classify(&pure), FixedPointClass::Center);
    }

    #[test]
    fn zero_real_part_without_rotation_is_non_hyperbolic() {
        assert_eq!(classify(&reals(&[0.0, -1.0])), FixedPointClass::NonHyperbolic);
    }

    #[test]
    fn oscillation_detection_ignores_tiny_imaginary_noise() {
        assert!(!is_oscillatory(&[Complex64::new(-1.0, 1e-12)]));
        assert!(is_oscillatory(&[Complex64::new(-1.0, 0.5)]));
    }

    #[test]
    fn worked_predator_prey_jacobians_classify_as_stated() {
        // Origin of the a=5, b=1, c=1, d=0.2 system: eigenvalues 5 and -0.2.
        let origin = [5.0, 0.0, 1.0, -0.2];
        assert_eq!(
            classify_jacobian(2, &origin).expect("classification should compute"),
            FixedPointClass::Saddle
        );

        // Coexistence point (1, 5): trace -0.2, determinant 1.
        let coexistence = [0.0, -1.0, 1.0, -0.2];
        assert_eq!(
            classify_jacobian(2, &coexistence).expect("classification should compute"),
            FixedPointClass::StableSpiral
        );
    }
}
