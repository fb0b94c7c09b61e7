//! Stability report for the course's predator-prey system, with a phase
//! portrait and solution curves written next to the working directory.
//!
//! Usage: phase_portrait [OUT_DIR]

use anyhow::{Context, Result};
use quadrat_core::equilibrium::{find_fixed_point, NewtonSettings};
use quadrat_core::nullcline::{nullcline_segments, AxisSpec};
use quadrat_core::plot;
use quadrat_core::solvers::{integrate, RK4};
use quadrat_core::stability::{classify, is_oscillatory};
use quadrat_core::systems::PredatorPrey;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();

    let out_dir: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| ".".to_string())
        .into();
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let system = PredatorPrey::new(5.0, 1.0, 1.0, 0.2);
    println!(
        "dx/dt = {a} x - {b} x y,  dy/dt = {c} x - {d} y",
        a = system.a,
        b = system.b,
        c = system.c,
        d = system.d
    );

    let settings = NewtonSettings::default();
    let mut refined = Vec::new();
    for guess in [system.origin(), system.coexistence()] {
        let fixed_point = find_fixed_point(&system, &guess, settings)?;
        let eigenvalues = fixed_point.eigenvalues();
        println!(
            "\nFixed point ({:.4}, {:.4}): {:?}{}",
            fixed_point.state[0],
            fixed_point.state[1],
            classify(&eigenvalues),
            if is_oscillatory(&eigenvalues) {
                " (oscillatory)"
            } else {
                ""
            }
        );
        for lambda in &eigenvalues {
            println!("  lambda = {:.4} + {:.4}i", lambda.re, lambda.im);
        }
        refined.push([fixed_point.state[0], fixed_point.state[1]]);
    }

    let window = |var_index, min, max| AxisSpec {
        var_index,
        min,
        max,
        samples: 121,
    };
    let prey_nullcline = nullcline_segments(
        &system,
        0,
        &[window(0, 0.01, 2.5), window(1, 0.01, 10.0)],
        &[0.0, 0.0],
    )?;
    let predator_nullcline = nullcline_segments(
        &system,
        1,
        &[window(0, 0.01, 2.5), window(1, 0.01, 10.0)],
        &[0.0, 0.0],
    )?;

    let trajectory = integrate(&system, &mut RK4::new(2), &[1.5, 4.0], 0.0, 0.005, 8000)?;

    let portrait_path = out_dir.join("phase_portrait.svg");
    plot::phase_portrait(
        &portrait_path,
        "Predator-prey phase plane",
        &[prey_nullcline, predator_nullcline],
        Some(&trajectory),
        &refined,
    )?;
    println!("\nWrote {}", portrait_path.display());

    let series_path = out_dir.join("solution_curves.svg");
    plot::time_series(
        &series_path,
        "Predator-prey solution curves",
        &trajectory,
        &["prey", "predators"],
    )?;
    println!("Wrote {}", series_path.display());

    Ok(())
}
