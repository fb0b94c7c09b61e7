//! SVG renderings of the three figures the material keeps reaching for:
//! a scatterplot with a fitted line, solution curves against time, and a
//! phase portrait with nullclines and fixed points.

use crate::nullcline::NullclineCurve;
use crate::solvers::Trajectory;
use anyhow::{bail, Context, Result};
use plotters::prelude::*;
use std::path::Path;

const SERIES_COLORS: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
];

fn padded_range(values: impl Iterator<Item = f64>) -> Result<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        min = min.min(value);
        max = max.max(value);
    }
    if !min.is_finite() || !max.is_finite() {
        bail!("Nothing to plot: no finite values.");
    }
    let pad = 0.05 * (max - min).max(1e-9);
    Ok((min - pad, max + pad))
}

/// Observations as points, optionally with the line
/// `y = intercept + slope * x` drawn across the x range.
pub fn scatter_with_line(
    path: &Path,
    title: &str,
    points: &[(f64, f64)],
    line: Option<(f64, f64)>,
) -> Result<()> {
    if points.is_empty() {
        bail!("Nothing to plot: no points supplied.");
    }
    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0))?;
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1))?;

    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).context("filling the drawing area")?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .context("building the chart")?;
    chart.configure_mesh().draw().context("drawing the mesh")?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, SERIES_COLORS[0].filled())),
        )
        .context("drawing the points")?;

    if let Some((intercept, slope)) = line {
        chart
            .draw_series(LineSeries::new(
                [x_min, x_max].map(|x| (x, intercept + slope * x)),
                &SERIES_COLORS[3],
            ))
            .context("drawing the fitted line")?;
    }

    root.present().context("writing the SVG")?;
    Ok(())
}

/// Each labelled state component against time.
pub fn time_series(
    path: &Path,
    title: &str,
    trajectory: &Trajectory,
    labels: &[&str],
) -> Result<()> {
    if trajectory.times.is_empty() {
        bail!("Nothing to plot: empty trajectory.");
    }
    let dim = trajectory.states[0].len();
    if labels.len() != dim {
        bail!("Expected {dim} label(s), got {}.", labels.len());
    }

    let (t_min, t_max) = padded_range(trajectory.times.iter().copied())?;
    let (y_min, y_max) = padded_range(trajectory.states.iter().flatten().copied())?;

    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).context("filling the drawing area")?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(t_min..t_max, y_min..y_max)
        .context("building the chart")?;
    chart.configure_mesh().draw().context("drawing the mesh")?;

    for (index, label) in labels.iter().enumerate() {
        let color = SERIES_COLORS[index % SERIES_COLORS.len()];
        chart
            .draw_series(LineSeries::new(trajectory.component(index), &color))
            .with_context(|| format!("drawing component `{label}`"))?
            .label(*label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color)
            });
    }
    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .draw()
        .context("drawing the legend")?;

    root.present().context("writing the SVG")?;
    Ok(())
}

/// Nullclines, an optional trajectory, and marked fixed points in the
/// (state 0, state 1) plane.
pub fn phase_portrait(
    path: &Path,
    title: &str,
    nullclines: &[NullclineCurve],
    trajectory: Option<&Trajectory>,
    fixed_points: &[[f64; 2]],
) -> Result<()> {
    let mut xs: Vec<f64> = Vec::new();
    let mut ys: Vec<f64> = Vec::new();
    for curve in nullclines {
        for ((x0, y0), (x1, y1)) in curve.planar_segments(0, 1) {
            xs.extend([x0, x1]);
            ys.extend([y0, y1]);
        }
    }
    if let Some(trajectory) = trajectory {
        for state in &trajectory.states {
            xs.push(state[0]);
            ys.push(state[1]);
        }
    }
    for point in fixed_points {
        xs.push(point[0]);
        ys.push(point[1]);
    }
    if xs.is_empty() {
        bail!("Nothing to plot: no nullclines, trajectory, or fixed points.");
    }

    let (x_min, x_max) = padded_range(xs.into_iter())?;
    let (y_min, y_max) = padded_range(ys.into_iter())?;

    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).context("filling the drawing area")?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .context("building the chart")?;
    chart.configure_mesh().draw().context("drawing the mesh")?;

    for (index, curve) in nullclines.iter().enumerate() {
        let color = SERIES_COLORS[index % SERIES_COLORS.len()];
        chart
            .draw_series(
                curve
                    .planar_segments(0, 1)
                    .into_iter()
                    .map(|(a, b)| PathElement::new(vec![a, b], color)),
            )
            .with_context(|| format!("drawing nullcline of component {}", curve.component))?;
    }

    if let Some(trajectory) = trajectory {
        let curve: Vec<(f64, f64)> = trajectory
            .states
            .iter()
            .map(|state| (state[0], state[1]))
            .collect();
        chart
            .draw_series(LineSeries::new(curve, &BLACK))
            .context("drawing the trajectory")?;
    }

    chart
        .draw_series(fixed_points.iter().map(|&[x, y]| {
            Circle::new((x, y), 5, SERIES_COLORS[3].filled())
        }))
        .context("drawing the fixed points")?;

    root.present().context("writing the SVG")?;
    Ok(())
}
