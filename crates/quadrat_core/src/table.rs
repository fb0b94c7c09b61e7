//! Rectangular tables of named columns, the shape every observational
//! dataset in the course takes. Columns are typed on load: numeric when every
//! non-missing cell parses as a float, categorical otherwise.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Tokens treated as a missing cell when loading CSV text.
const MISSING_TOKENS: [&str; 3] = ["", "NA", "NaN"];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column `{0}` not found")]
    MissingColumn(String),
    #[error("column `{0}` is not numeric")]
    NotNumeric(String),
    #[error("column `{0}` is not categorical")]
    NotCategorical(String),
}

/// A single named column. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }
}

/// A rectangular table: equally long named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Builds a table from (name, column) pairs, checking rectangularity.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self> {
        let rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        for (name, column) in &columns {
            if column.len() != rows {
                bail!(
                    "Column `{}` has {} rows; expected {}.",
                    name,
                    column.len(),
                    rows
                );
            }
        }
        let (names, columns) = columns.into_iter().unzip();
        Ok(Self {
            names,
            columns,
            rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// The cells of a numeric column.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], TableError> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            Column::Categorical(_) => Err(TableError::NotNumeric(name.to_string())),
        }
    }

    /// The cells of a categorical column.
    pub fn categorical(&self, name: &str) -> Result<&[Option<String>], TableError> {
        match self.column(name)? {
            Column::Categorical(values) => Ok(values),
            Column::Numeric(_) => Err(TableError::NotCategorical(name.to_string())),
        }
    }

    /// Non-missing values of a numeric column, in row order.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>, TableError> {
        Ok(self.numeric(name)?.iter().filter_map(|v| *v).collect())
    }

    /// Sorted distinct levels of a categorical column.
    pub fn levels(&self, name: &str) -> Result<Vec<String>, TableError> {
        let mut levels: Vec<String> = self
            .categorical(name)?
            .iter()
            .filter_map(|v| v.clone())
            .collect();
        levels.sort();
        levels.dedup();
        Ok(levels)
    }

    /// Row indices per level of a categorical column; missing cells are
    /// left out of every group.
    pub fn group_rows(&self, name: &str) -> Result<BTreeMap<String, Vec<usize>>, TableError> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (row, value) in self.categorical(name)?.iter().enumerate() {
            if let Some(level) = value {
                groups.entry(level.clone()).or_default().push(row);
            }
        }
        Ok(groups)
    }

    /// Indices of rows with no missing value in any of the given columns.
    pub fn complete_cases(&self, names: &[&str]) -> Result<Vec<usize>, TableError> {
        let mut keep = vec![true; self.rows];
        for name in names {
            match self.column(name)? {
                Column::Numeric(values) => {
                    for (row, value) in values.iter().enumerate() {
                        keep[row] &= value.is_some();
                    }
                }
                Column::Categorical(values) => {
                    for (row, value) in values.iter().enumerate() {
                        keep[row] &= value.is_some();
                    }
                }
            }
        }
        Ok(keep
            .iter()
            .enumerate()
            .filter_map(|(row, &ok)| ok.then_some(row))
            .collect())
    }

    /// Loads a CSV file from disk.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        Self::from_csv_reader(file).with_context(|| format!("parsing {}", path.display()))
    }

    /// Loads CSV text served over HTTP(S).
    pub fn from_url(url: &str) -> Result<Self> {
        let body = reqwest::blocking::get(url)
            .with_context(|| format!("fetching {url}"))?
            .error_for_status()
            .with_context(|| format!("fetching {url}"))?
            .text()
            .context("reading response body")?;
        Self::from_csv_reader(body.as_bytes()).with_context(|| format!("parsing {url}"))
    }

    /// Parses CSV from any reader. The first record is the header; every
    /// record must have the same width.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("reading CSV header")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() {
            bail!("CSV input has no columns.");
        }

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for (row, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("reading CSV record {}", row + 1))?;
            for (col, cell) in record.iter().enumerate() {
                let cell = cell.trim();
                let value = if MISSING_TOKENS.contains(&cell) {
                    None
                } else {
                    Some(cell.to_string())
                };
                cells[col].push(value);
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| (name, infer_column(raw)))
            .collect();
        Self::new(columns)
    }
}

/// A column is numeric when every non-missing cell parses as f64.
fn infer_column(raw: Vec<Option<String>>) -> Column {
    let mut parsed = Vec::with_capacity(raw.len());
    for cell in &raw {
        match cell {
            None => parsed.push(None),
            Some(text) => match text.parse::<f64>() {
                Ok(value) => parsed.push(Some(value)),
                Err(_) => return Column::Categorical(raw),
            },
        }
    }
    Column::Numeric(parsed)
}

#[cfg(test)]
mod tests {
    use super::{Column, Table, TableError};

    const SAMPLE: &str = "\
species,sex,weight,hindfoot_length
DM,M,40,36
DM,F,38,35
DS,M,120,NA
DS,F,,49
PP,M,17,21
";

    fn sample() -> Table {
        Table::from_csv_reader(SAMPLE.as_bytes()).expect("sample CSV should parse")
    }

    #[test]
    fn csv_loading_infers_column_types() {
        let table = sample();
        assert_eq!(table.n_rows(), 5);
        assert_eq!(table.n_cols(), 4);
        assert!(table.column("weight").unwrap().is_numeric());
        assert!(!table.column("species").unwrap().is_numeric());
    }

    #[test]
    fn missing_tokens_become_none() {
        let table = sample();
        let weight = table.numeric("weight").unwrap();
        assert_eq!(weight[3], None);
        let hindfoot = table.numeric("hindfoot_length").unwrap();
        assert_eq!(hindfoot[2], None);
    }

    #[test]
    fn lookup_errors_name_the_column() {
        let table = sample();
        match table.column("tail_length") {
            Err(TableError::MissingColumn(name)) => assert_eq!(name, "tail_length"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
        assert!(matches!(
            table.numeric("species"),
            Err(TableError::NotNumeric(_))
        ));
        assert!(matches!(
            table.categorical("weight"),
            Err(TableError::NotCategorical(_))
        ));
    }

    #[test]
    fn levels_are_sorted_and_distinct() {
        let table = sample();
        assert_eq!(table.levels("species").unwrap(), vec!["DM", "DS", "PP"]);
        assert_eq!(table.levels("sex").unwrap(), vec!["F", "M"]);
    }

    #[test]
    fn group_rows_partitions_by_level() {
        let table = sample();
        let groups = table.group_rows("sex").unwrap();
        assert_eq!(groups["M"], vec![0, 2, 4]);
        assert_eq!(groups["F"], vec![1, 3]);
    }

    #[test]
    fn complete_cases_drops_rows_with_gaps() {
        let table = sample();
        let rows = table
            .complete_cases(&["weight", "hindfoot_length"])
            .unwrap();
        assert_eq!(rows, vec![0, 1, 4]);
    }

    #[test]
    fn ragged_records_are_rejected() {
        let bad = "a,b\n1,2\n3\n";
        let err = Table::from_csv_reader(bad.as_bytes()).expect_err("ragged CSV should fail");
        assert!(format!("{err:#}").contains("record"));
    }

    #[test]
    fn new_rejects_unequal_column_lengths() {
        let result = Table::new(vec![
            ("a".to_string(), Column::Numeric(vec![Some(1.0)])),
            ("b".to_string(), Column::Numeric(vec![Some(1.0), Some(2.0)])),
        ]);
        let err = result.expect_err("mismatched lengths should fail");
        assert!(format!("{err}").contains("rows"));
    }
}
