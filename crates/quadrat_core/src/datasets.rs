//! Teaching datasets embedded in the crate, so the demonstrations run
//! without any files on disk.

use crate::table::Table;
use anyhow::{bail, Context, Result};

const ANSCOMBE_CSV: &str = include_str!("../data/anscombe.csv");
const SURVEYS_CSV: &str = include_str!("../data/surveys_sample.csv");

/// Anscombe's quartet in wide form: columns `x1..x4`, `y1..y4`. The four
/// (x, y) pairs share their summary statistics to two decimals while
/// looking nothing alike when plotted.
pub fn anscombe() -> Result<Table> {
    Table::from_csv_reader(ANSCOMBE_CSV.as_bytes()).context("parsing the bundled Anscombe CSV")
}

/// One (x, y) series of the quartet, `index` in 1..=4.
pub fn anscombe_pair(table: &Table, index: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    if !(1..=4).contains(&index) {
        bail!("Anscombe series index must be 1..=4; got {index}.");
    }
    let x = table.numeric_values(&format!("x{index}"))?;
    let y = table.numeric_values(&format!("y{index}"))?;
    Ok((x, y))
}

/// A small animal-trapping records sample (species, sex, hindfoot length,
/// weight), including genuinely missing cells, shaped like the survey
/// table the regression material works with.
pub fn surveys() -> Result<Table> {
    Table::from_csv_reader(SURVEYS_CSV.as_bytes()).context("parsing the bundled surveys CSV")
}
