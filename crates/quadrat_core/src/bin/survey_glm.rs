//! Fits a Gaussian GLM on a survey table and prints the coefficient table
//! with 95% and 99% confidence intervals.
//!
//! Usage: survey_glm [CSV_PATH] [FORMULA]
//! With no arguments the bundled trapping-survey sample is fitted with
//! `weight ~ sex`.

use anyhow::Result;
use quadrat_core::datasets;
use quadrat_core::stats::design::Formula;
use quadrat_core::stats::glm::{fit, Family};
use quadrat_core::table::Table;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let table = match args.next() {
        Some(path) => Table::from_csv_path(&path)?,
        None => datasets::surveys()?,
    };
    let formula_text = args.next().unwrap_or_else(|| "weight ~ sex".to_string());
    let formula = Formula::parse(&formula_text)?;

    let model = fit(&table, &formula, Family::Gaussian)?;
    println!("Formula: {formula_text}");
    println!(
        "Rows used: {} of {}\n",
        model.df_residual + model.coefficients.len(),
        table.n_rows()
    );
    print!("{}", model.summary());

    for level in [0.95, 0.99] {
        println!("\n{:.0}% confidence intervals:", level * 100.0);
        let intervals = model.confidence_intervals(level)?;
        for (coefficient, (lower, upper)) in model.coefficients.iter().zip(intervals) {
            println!("  {:<16} [{lower:.4}, {upper:.4}]", coefficient.name);
        }
    }

    Ok(())
}
