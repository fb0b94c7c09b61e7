//! Aggregation diagnostics: does the trend in the pooled data disagree with
//! the trend inside every group? That reversal is the trap the course's
//! scatterplot material warns about, and it is purely a property of the
//! fitted slopes.

use crate::stats::design::{build_design, Formula};
use crate::stats::glm::{fit_design, Family};
use crate::table::{Column, Table};
use anyhow::{bail, Context, Result};
use serde::Serialize;

/// The pooled slope of `y ~ x` next to the slope inside each group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupedSlopes {
    pub pooled: f64,
    pub groups: Vec<(String, f64)>,
}

impl GroupedSlopes {
    /// True when every within-group slope has one sign and the pooled
    /// slope has the other.
    pub fn reverses(&self) -> bool {
        if self.groups.is_empty() || self.pooled == 0.0 {
            return false;
        }
        let pooled_positive = self.pooled > 0.0;
        self.groups
            .iter()
            .all(|(_, slope)| *slope != 0.0 && (*slope > 0.0) != pooled_positive)
    }
}

/// Fits `y ~ x` on the full table and within each level of `group`.
/// Groups too small to fit (fewer than 3 complete rows) are an error, since
/// a silent skip would hide exactly the subgroup the diagnostic is about.
pub fn grouped_slopes(table: &Table, y: &str, x: &str, group: &str) -> Result<GroupedSlopes> {
    table
        .numeric(x)
        .with_context(|| format!("predictor `{x}` must be numeric"))?;
    let formula = Formula::new(y, vec![x.to_string()]);

    let pooled_fit = fit_design(&build_design(table, &formula)?, Family::Gaussian)
        .context("fitting the pooled model")?;
    let pooled = slope_of(&pooled_fit, x)?;

    let mut groups = Vec::new();
    for (level, rows) in table.group_rows(group)? {
        let subset = subset_rows(table, &[y, x], &rows)
            .with_context(|| format!("extracting group `{level}`"))?;
        let design = build_design(&subset, &formula)
            .with_context(|| format!("building the design for group `{level}`"))?;
        let fit = fit_design(&design, Family::Gaussian)
            .with_context(|| format!("fitting group `{level}`"))?;
        groups.push((level, slope_of(&fit, x)?));
    }
    if groups.is_empty() {
        bail!("Grouping column `{group}` has no non-missing levels.");
    }

    Ok(GroupedSlopes { pooled, groups })
}

fn slope_of(fit: &crate::stats::glm::GlmFit, x: &str) -> Result<f64> {
    fit.coefficient(x)
        .map(|c| c.estimate)
        .ok_or_else(|| anyhow::anyhow!("Fitted model has no `{x}` coefficient."))
}

/// A table holding only `names` columns at the given rows.
fn subset_rows(table: &Table, names: &[&str], rows: &[usize]) -> Result<Table> {
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let column = match table.column(name)? {
            Column::Numeric(values) => {
                Column::Numeric(rows.iter().map(|&row| values[row]).collect())
            }
            Column::Categorical(values) => {
                Column::Categorical(rows.iter().map(|&row| values[row].clone()).collect())
            }
        };
        columns.push((name.to_string(), column));
    }
    Table::new(columns)
}

#[cfg(test)]
mod tests {
    use super::grouped_slopes;
    use crate::table::Table;

    /// Within each group y rises with x, but later groups sit at higher x
    /// and lower y, so the pooled trend points down.
    const REVERSING: &str = "\
x,y,cohort
1,10.0,A
2,10.8,A
3,11.6,A
6,6.0,B
7,6.8,B
8,7.6,B
11,2.0,C
12,2.8,C
13,3.6,C
";

    /// One shared trend; grouping changes nothing.
    const CONSISTENT: &str = "\
x,y,cohort
1,2.0,A
2,4.1,A
3,5.9,A
4,8.2,B
5,9.9,B
6,12.1,B
";

    #[test]
    fn reversal_is_detected_when_groups_disagree_with_pool() {
        let table = Table::from_csv_reader(REVERSING.as_bytes()).unwrap();
        let slopes = grouped_slopes(&table, "y", "x", "cohort").expect("slopes should fit");
        assert!(slopes.pooled < 0.0, "pooled slope {}", slopes.pooled);
        for (level, slope) in &slopes.groups {
            assert!(*slope > 0.0, "group {level} slope {slope}");
        }
        assert!(slopes.reverses());
    }

    #[test]
    fn consistent_groups_do_not_flag() {
        let table = Table::from_csv_reader(CONSISTENT.as_bytes()).unwrap();
        let slopes = grouped_slopes(&table, "y", "x", "cohort").expect("slopes should fit");
        assert!(slopes.pooled > 0.0);
        assert!(!slopes.reverses());
    }

    #[test]
    fn tiny_groups_fail_loudly() {
        let csv = "x,y,cohort\n1,2,A\n2,4,A\n3,5,A\n4,9,B\n5,11,B\n";
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();
        let err = grouped_slopes(&table, "y", "x", "cohort").expect_err("group B is too small");
        assert!(format!("{err:#}").contains("B"));
    }

    #[test]
    fn unknown_grouping_column_errors() {
        let table = Table::from_csv_reader(CONSISTENT.as_bytes()).unwrap();
        assert!(grouped_slopes(&table, "y", "x", "region").is_err());
    }
}
