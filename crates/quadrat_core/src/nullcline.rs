use crate::traits::VectorField;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A sampling window along one state variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub var_index: usize,
    pub min: f64,
    pub max: f64,
    pub samples: usize,
}

/// Piecewise-linear approximation of one component's zero set in the plane.
/// `points` holds flattened states; `segments` indexes pairs of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullclineCurve {
    pub dim: usize,
    pub component: usize,
    pub points: Vec<f64>,
    pub segments: Vec<u32>,
}

impl NullclineCurve {
    /// Segment endpoints projected onto the two swept axes, as
    /// ((x0, y0), (x1, y1)) pairs, for plotting.
    pub fn planar_segments(&self, axis_x: usize, axis_y: usize) -> Vec<((f64, f64), (f64, f64))> {
        self.segments
            .chunks_exact(2)
            .map(|pair| {
                let a = pair[0] as usize * self.dim;
                let b = pair[1] as usize * self.dim;
                (
                    (self.points[a + axis_x], self.points[a + axis_y]),
                    (self.points[b + axis_x], self.points[b + axis_y]),
                )
            })
            .collect()
    }
}

fn validate_axis(axis: &AxisSpec, dim: usize) -> Result<()> {
    if axis.var_index >= dim {
        bail!("Axis variable index {} out of range.", axis.var_index);
    }
    if !axis.min.is_finite() || !axis.max.is_finite() || axis.max <= axis.min {
        bail!("Each axis range must be finite with max > min.");
    }
    if axis.samples < 2 {
        bail!("Each axis needs at least 2 samples.");
    }
    Ok(())
}

/// Scans a 1-D system for equilibria inside the window: samples the rate,
/// brackets sign changes, and places each root by linear interpolation.
pub fn scalar_equilibria<S: VectorField<f64>>(system: &S, axis: &AxisSpec) -> Result<Vec<f64>> {
    if system.dimension() != 1 {
        bail!(
            "Scalar equilibrium scan requires a 1-D system; got dimension {}.",
            system.dimension()
        );
    }
    validate_axis(axis, 1)?;

    let count = axis.samples;
    let step = (axis.max - axis.min) / (count - 1) as f64;
    let mut out = [0.0];
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        system.rate(0.0, &[axis.min + step * i as f64], &mut out);
        values.push(out[0]);
    }

    let zero_eps = 1e-10;
    let mut roots = Vec::new();
    for i in 0..count - 1 {
        let x0 = axis.min + step * i as f64;
        let x1 = axis.min + step * (i + 1) as f64;
        let v0 = values[i];
        let v1 = values[i + 1];
        if v0.abs() <= zero_eps {
            roots.push(x0);
        }
        if v1.abs() <= zero_eps {
            roots.push(x1);
        }
        if (v0 < 0.0) != (v1 < 0.0) && v0.abs() > zero_eps && v1.abs() > zero_eps {
            roots.push(x0 + (x1 - x0) * interpolate_factor(v0, v1));
        }
    }

    roots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    roots.dedup_by(|a, b| (*a - *b).abs() <= 1e-8 * (1.0 + a.abs().max(b.abs())));
    Ok(roots)
}

/// Extracts the nullcline of one rate component over a 2-D window by
/// marching squares, holding every other coordinate at its `frozen` value.
pub fn nullcline_segments<S: VectorField<f64>>(
    system: &S,
    component: usize,
    axes: &[AxisSpec; 2],
    frozen_state: &[f64],
) -> Result<NullclineCurve> {
    let dim = system.dimension();
    if dim == 0 {
        bail!("System dimension must be positive.");
    }
    if component >= dim {
        bail!("Rate component {} out of range for dimension {}.", component, dim);
    }
    if frozen_state.len() != dim {
        bail!(
            "Frozen state length ({}) does not match system dimension ({}).",
            frozen_state.len(),
            dim
        );
    }
    for axis in axes.iter() {
        validate_axis(axis, dim)?;
    }
    if axes[0].var_index == axes[1].var_index {
        bail!("Axis variable indices must be unique.");
    }

    let axis_x = &axes[0];
    let axis_y = &axes[1];
    let nx = axis_x.samples;
    let ny = axis_y.samples;
    let step_x = (axis_x.max - axis_x.min) / (nx - 1) as f64;
    let step_y = (axis_y.max - axis_y.min) / (ny - 1) as f64;
    let index = |ix: usize, iy: usize| ix + iy * nx;

    let mut state = frozen_state.to_vec();
    let mut out = vec![0.0; dim];
    let mut values = vec![0.0; nx * ny];
    for iy in 0..ny {
        state[axis_y.var_index] = axis_y.min + step_y * iy as f64;
        for ix in 0..nx {
            state[axis_x.var_index] = axis_x.min + step_x * ix as f64;
            system.rate(0.0, &state, &mut out);
            values[index(ix, iy)] = out[component];
        }
    }

    let mut points = Vec::new();
    let mut segments = Vec::new();
    let mut point_count = 0u32;
    for iy in 0..ny - 1 {
        let y0 = axis_y.min + step_y * iy as f64;
        let y1 = axis_y.min + step_y * (iy + 1) as f64;
        for ix in 0..nx - 1 {
            let x0 = axis_x.min + step_x * ix as f64;
            let x1 = axis_x.min + step_x * (ix + 1) as f64;
            let corners = [
                values[index(ix, iy)],
                values[index(ix + 1, iy)],
                values[index(ix + 1, iy + 1)],
                values[index(ix, iy + 1)],
            ];

            let mut case = 0u8;
            for (bit, value) in corners.iter().enumerate() {
                if *value >= 0.0 {
                    case |= 1 << bit;
                }
            }

            for (edge_a, edge_b) in square_edge_pairs(case) {
                let (ax, ay) = edge_crossing(*edge_a, x0, x1, y0, y1, &corners);
                let (bx, by) = edge_crossing(*edge_b, x0, x1, y0, y1, &corners);

                let mut state_a = frozen_state.to_vec();
                state_a[axis_x.var_index] = ax;
                state_a[axis_y.var_index] = ay;
                let mut state_b = frozen_state.to_vec();
                state_b[axis_x.var_index] = bx;
                state_b[axis_y.var_index] = by;
                points.extend(state_a);
                points.extend(state_b);
                segments.push(point_count);
                segments.push(point_count + 1);
                point_count += 2;
            }
        }
    }

    Ok(NullclineCurve {
        dim,
        component,
        points,
        segments,
    })
}

/// Marching-squares case table: which cell edges the contour crosses.
/// Edges are numbered 0 = bottom, 1 = right, 2 = top, 3 = left.
fn square_edge_pairs(case: u8) -> &'static [(u8, u8)] {
    match case {
        0 | 15 => &[],
        1 => &[(3, 0)],
        2 => &[(0, 1)],
        3 => &[(3, 1)],
        4 => &[(1, 2)],
        5 => &[(3, 2), (0, 1)],
        6 => &[(0, 2)],
        7 => &[(3, 2)],
        8 => &[(2, 3)],
        9 => &[(0, 2)],
        10 => &[(0, 3), (1, 2)],
        11 => &[(1, 2)],
        12 => &[(1, 3)],
        13 => &[(0, 1)],
        14 => &[(3, 0)],
        _ => &[],
    }
}

fn edge_crossing(edge: u8, x0: f64, x1: f64, y0: f64, y1: f64, corners: &[f64; 4]) -> (f64, f64) {
    match edge {
        0 => {
            let t = interpolate_factor(corners[0], corners[1]);
            (x0 + (x1 - x0) * t, y0)
        }
        1 => {
            let t = interpolate_factor(corners[1], corners[2]);
            (x1, y0 + (y1 - y0) * t)
        }
        2 => {
            let t = interpolate_factor(corners[2], corners[3]);
            (x1 + (x0 - x1) * t, y1)
        }
        3 => {
            let t = interpolate_factor(corners[3], corners[0]);
            (x0, y1 + (y0 - y1) * t)
        }
        _ => (x0, y0),
    }
}

fn interpolate_factor(v0: f64, v1: f64) -> f64 {
    let denominator = v0 - v1;
    if denominator.abs() <= 1e-12 {
        0.5
    } else {
        (v0 / denominator).clamp(0.0, 1.0)
    }
}
