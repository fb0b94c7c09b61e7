use crate::traits::{Scalar, Steppable, VectorField};
use anyhow::{bail, Result};
use serde::Serialize;

/// Forward Euler: x <- x + dt * f(t, x).
///
/// First-order only, but it is the method the course derives by hand, so it
/// stays available alongside RK4 for side-by-side comparisons.
pub struct Euler<T: Scalar> {
    k: Vec<T>,
}

impl<T: Scalar> Euler<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for Euler<T> {
    fn step(&mut self, system: &impl VectorField<T>, t: &mut T, state: &mut [T], dt: T) {
        system.rate(*t, state, &mut self.k);
        for i in 0..state.len() {
            state[i] = state[i] + dt * self.k[i];
        }
        *t = *t + dt;
    }
}

/// Classic fourth-order Runge-Kutta with fixed step size.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    probe: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let zero = T::zero();
        Self {
            k1: vec![zero; dim],
            k2: vec![zero; dim],
            k3: vec![zero; dim],
            k4: vec![zero; dim],
            probe: vec![zero; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl VectorField<T>, t: &mut T, state: &mut [T], dt: T) {
        let half = T::from_f64(0.5).unwrap();
        let sixth = T::from_f64(1.0 / 6.0).unwrap();
        let two = T::from_f64(2.0).unwrap();
        let t0 = *t;

        system.rate(t0, state, &mut self.k1);

        for i in 0..state.len() {
            self.probe[i] = state[i] + dt * half * self.k1[i];
        }
        system.rate(t0 + dt * half, &self.probe, &mut self.k2);

        for i in 0..state.len() {
            self.probe[i] = state[i] + dt * half * self.k2[i];
        }
        system.rate(t0 + dt * half, &self.probe, &mut self.k3);

        for i in 0..state.len() {
            self.probe[i] = state[i] + dt * self.k3[i];
        }
        system.rate(t0 + dt, &self.probe, &mut self.k4);

        for i in 0..state.len() {
            let weighted = self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i];
            state[i] = state[i] + dt * sixth * weighted;
        }

        *t = t0 + dt;
    }
}

/// A sampled solution curve: `states[i]` is the state at `times[i]`.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub states: Vec<Vec<f64>>,
}

impl Trajectory {
    /// One component of the solution as (t, x_index) pairs.
    pub fn component(&self, index: usize) -> Vec<(f64, f64)> {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(&t, state)| (t, state[index]))
            .collect()
    }
}

/// Integrates a system from `initial_state` at `initial_time`, recording the
/// state after every step (the initial condition is the first sample).
pub fn integrate<S: VectorField<f64>>(
    system: &S,
    stepper: &mut impl Steppable<f64>,
    initial_state: &[f64],
    initial_time: f64,
    dt: f64,
    steps: usize,
) -> Result<Trajectory> {
    if initial_state.is_empty() {
        bail!("Initial state must have positive dimension.");
    }
    if initial_state.len() != system.dimension() {
        bail!(
            "Initial state dimension mismatch. Expected {}, got {}.",
            system.dimension(),
            initial_state.len()
        );
    }
    if dt <= 0.0 {
        bail!("Step size dt must be positive.");
    }
    if steps == 0 {
        bail!("Integration requires at least one step.");
    }

    let mut t = initial_time;
    let mut state = initial_state.to_vec();
    let mut times = Vec::with_capacity(steps + 1);
    let mut states = Vec::with_capacity(steps + 1);
    times.push(t);
    states.push(state.clone());

    for _ in 0..steps {
        stepper.step(system, &mut t, &mut state, dt);
        times.push(t);
        states.push(state.clone());
    }

    Ok(Trajectory { times, states })
}
