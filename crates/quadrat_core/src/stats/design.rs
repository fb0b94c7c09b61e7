//! Model formulas and design matrices. A formula is written the way the
//! course writes it, `response ~ predictor + predictor`; categorical
//! predictors are dummy coded against their first (sorted) level, so a
//! two-level `sex` column contributes a single `sexM` column.

use crate::table::{Column, Table};
use anyhow::{bail, Context, Result};
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub response: String,
    pub predictors: Vec<String>,
}

impl Formula {
    pub fn new(response: impl Into<String>, predictors: Vec<String>) -> Self {
        Self {
            response: response.into(),
            predictors,
        }
    }

    /// Parses `"y ~ a + b"`. An empty right-hand side (`"y ~ 1"` or
    /// `"y ~"`) gives an intercept-only model.
    pub fn parse(text: &str) -> Result<Self> {
        let Some((lhs, rhs)) = text.split_once('~') else {
            bail!("Formula `{text}` is missing `~`.");
        };
        let response = lhs.trim();
        if response.is_empty() {
            bail!("Formula `{text}` has no response variable.");
        }
        let predictors: Vec<String> = rhs
            .split('+')
            .map(str::trim)
            .filter(|term| !term.is_empty() && *term != "1")
            .map(str::to_string)
            .collect();
        Ok(Self::new(response, predictors))
    }

    fn all_columns(&self) -> Vec<&str> {
        let mut names = vec![self.response.as_str()];
        names.extend(self.predictors.iter().map(String::as_str));
        names
    }
}

/// An assembled regression problem: predictors `x` (with a leading
/// intercept column), response `y`, coefficient names, and the table rows
/// that survived the complete-case filter.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    pub names: Vec<String>,
    pub rows_used: Vec<usize>,
}

/// Builds the design matrix for `formula` over the complete cases of
/// `table`.
pub fn build_design(table: &Table, formula: &Formula) -> Result<DesignMatrix> {
    let rows_used = table
        .complete_cases(&formula.all_columns())
        .context("resolving formula columns")?;
    if rows_used.is_empty() {
        bail!(
            "No complete cases for formula `{} ~ {}`.",
            formula.response,
            formula.predictors.join(" + ")
        );
    }

    let response = table
        .numeric(&formula.response)
        .with_context(|| format!("response `{}`", formula.response))?;
    let y = DVector::from_iterator(
        rows_used.len(),
        rows_used.iter().map(|&row| response[row].unwrap()),
    );

    let mut names = vec!["(Intercept)".to_string()];
    let mut columns: Vec<Vec<f64>> = vec![vec![1.0; rows_used.len()]];

    for predictor in &formula.predictors {
        match table.column(predictor)? {
            Column::Numeric(values) => {
                names.push(predictor.clone());
                columns.push(rows_used.iter().map(|&row| values[row].unwrap()).collect());
            }
            Column::Categorical(values) => {
                let levels = table.levels(predictor)?;
                if levels.len() < 2 {
                    bail!(
                        "Categorical predictor `{}` has {} level(s); need at least 2.",
                        predictor,
                        levels.len()
                    );
                }
                // First level is the reference; one indicator per other level.
                for level in &levels[1..] {
                    names.push(format!("{predictor}{level}"));
                    columns.push(
                        rows_used
                            .iter()
                            .map(|&row| {
                                if values[row].as_deref() == Some(level.as_str()) {
                                    1.0
                                } else {
                                    0.0
                                }
                            })
                            .collect(),
                    );
                }
            }
        }
    }

    let n = rows_used.len();
    let p = columns.len();
    if n <= p {
        bail!(
            "Design matrix has {} rows for {} coefficients; no residual degrees of freedom.",
            n,
            p
        );
    }

    let x = DMatrix::from_fn(n, p, |row, col| columns[col][row]);
    Ok(DesignMatrix {
        x,
        y,
        names,
        rows_used,
    })
}
