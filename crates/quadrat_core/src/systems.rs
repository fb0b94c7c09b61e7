//! The worked model systems from the course: single-species logistic growth
//! and the two-species predator-prey model. Both implement `VectorField` for
//! every `Scalar` so the same definition serves plain integration and
//! dual-number differentiation.

use crate::traits::{Scalar, VectorField};
use serde::{Deserialize, Serialize};

/// Logistic growth, dN/dt = r N (1 - N/K).
///
/// `r` is the intrinsic growth rate, `k` the carrying capacity. Equilibria
/// sit at N = 0 (extinction) and N = K.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogisticGrowth {
    pub r: f64,
    pub k: f64,
}

impl LogisticGrowth {
    pub fn new(r: f64, k: f64) -> Self {
        Self { r, k }
    }

    /// The two closed-form equilibria, [0, K].
    pub fn equilibria(&self) -> [f64; 2] {
        [0.0, self.k]
    }

    /// d/dN of the growth rate, r (1 - 2N/K).
    ///
    /// Evaluated at an equilibrium this is the 1-D stability quantity:
    /// +r at N = 0, -r at N = K.
    pub fn rate_derivative(&self, n: f64) -> f64 {
        self.r * (1.0 - 2.0 * n / self.k)
    }
}

impl<T: Scalar> VectorField<T> for LogisticGrowth {
    fn dimension(&self) -> usize {
        1
    }

    fn rate(&self, _t: T, state: &[T], out: &mut [T]) {
        let r = T::from_f64(self.r).unwrap();
        let k = T::from_f64(self.k).unwrap();
        let n = state[0];
        out[0] = r * n * (T::one() - n / k);
    }
}

/// Predator-prey model in the course's form:
///
///   dx/dt = a x - b x y
///   dy/dt = c x - d y
///
/// x is the prey density, y the predator density. Besides the origin, the
/// populations coexist at (a d / (b c), a / b).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PredatorPrey {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl PredatorPrey {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    pub fn origin(&self) -> [f64; 2] {
        [0.0, 0.0]
    }

    /// The nontrivial equilibrium (a d / (b c), a / b).
    pub fn coexistence(&self) -> [f64; 2] {
        [self.a * self.d / (self.b * self.c), self.a / self.b]
    }
}

impl<T: Scalar> VectorField<T> for PredatorPrey {
    fn dimension(&self) -> usize {
        2
    }

    fn rate(&self, _t: T, state: &[T], out: &mut [T]) {
        let a = T::from_f64(self.a).unwrap();
        let b = T::from_f64(self.b).unwrap();
        let c = T::from_f64(self.c).unwrap();
        let d = T::from_f64(self.d).unwrap();
        let x = state[0];
        let y = state[1];
        out[0] = a * x - b * x * y;
        out[1] = c * x - d * y;
    }
}

#[cfg(test)]
mod tests {
    use super::{LogisticGrowth, PredatorPrey};
    use crate::traits::VectorField;

    #[test]
    fn logistic_rate_vanishes_at_equilibria() {
        let system = LogisticGrowth::new(0.8, 100.0);
        let mut out = [f64::NAN];
        for n in system.equilibria() {
            VectorField::<f64>::rate(&system, 0.0, &[n], &mut out);
            assert!(out[0].abs() < 1e-12, "rate at N = {n} was {}", out[0]);
        }
    }

    #[test]
    fn logistic_rate_derivative_is_r_and_minus_r() {
        let system = LogisticGrowth::new(0.8, 100.0);
        assert!((system.rate_derivative(0.0) - 0.8).abs() < 1e-12);
        assert!((system.rate_derivative(100.0) + 0.8).abs() < 1e-12);
    }

    #[test]
    fn predator_prey_coexistence_matches_worked_example() {
        // a = 5, b = 1, c = 1, d = 0.2 gives (1, 5).
        let system = PredatorPrey::new(5.0, 1.0, 1.0, 0.2);
        let [x, y] = system.coexistence();
        assert!((x - 1.0).abs() < 1e-12);
        assert!((y - 5.0).abs() < 1e-12);

        let mut out = [f64::NAN, f64::NAN];
        VectorField::<f64>::rate(&system, 0.0, &[x, y], &mut out);
        assert!(out[0].abs() < 1e-12 && out[1].abs() < 1e-12);
    }

    #[test]
    fn predator_prey_origin_is_an_equilibrium() {
        let system = PredatorPrey::new(5.0, 1.0, 1.0, 0.2);
        let mut out = [f64::NAN, f64::NAN];
        VectorField::<f64>::rate(&system, 0.0, &system.origin(), &mut out);
        assert_eq!(out, [0.0, 0.0]);
    }
}
