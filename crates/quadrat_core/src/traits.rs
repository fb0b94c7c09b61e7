use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Numeric types the dynamical-systems code is generic over.
/// Covers `f64` for plain evaluation and `Dual` for differentiation.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A continuous-time system dx/dt = f(t, x).
pub trait VectorField<T: Scalar> {
    /// Dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field, writing dx/dt into `out`.
    fn rate(&self, t: T, state: &[T], out: &mut [T]);
}

/// Fixed-step integrators that advance a system in place.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size `dt`, updating `t` and `state`.
    fn step(&mut self, system: &impl VectorField<T>, t: &mut T, state: &mut [T], dt: T);
}
