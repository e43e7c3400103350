// Dynamic tabular data: named columns over typed cells.
//
// Every dataset flows through here: the store decodes SQLite rows into
// `Value` cells, the aggregation layer derives new frames, and the output
// layer previews/exports them without knowing the dataset it came from.
use crate::error::{InsightError, InsightResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell. The value menu mirrors what SQLite can hand back for the
/// datasets we query: NULL, INTEGER, REAL, TEXT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Numeric view of a cell. Integers widen to `f64`; text and null have
    /// no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Row-major table with named columns.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Frame {
            columns,
            rows: Vec::new(),
        }
    }

    /// The degraded-load result: zero columns, zero rows.
    pub fn empty() -> Self {
        Frame::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub(crate) fn require_column(&self, name: &str) -> InsightResult<usize> {
        self.column_index(name)
            .ok_or_else(|| InsightError::MissingColumn(name.to_string()))
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> InsightResult<()> {
        if row.len() != self.columns.len() {
            return Err(InsightError::Frame(format!(
                "row has {} cells, frame has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a derived column. The value count must match the row count.
    pub fn add_column(&mut self, name: &str, values: Vec<Value>) -> InsightResult<()> {
        if values.len() != self.rows.len() {
            return Err(InsightError::Frame(format!(
                "column {} has {} values, frame has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Rename a column in place; unknown names are an error.
    pub fn rename_column(&mut self, from: &str, to: &str) -> InsightResult<()> {
        let idx = self.require_column(from)?;
        self.columns[idx] = to.to_string();
        Ok(())
    }

    /// Rewrite every cell of one column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> InsightResult<()>
    where
        F: FnMut(&Value) -> Value,
    {
        let idx = self.require_column(name)?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        Ok(())
    }

    /// Cloned cells of one column.
    pub fn column_values(&self, name: &str) -> InsightResult<Vec<Value>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[idx].clone()).collect())
    }

    /// Numeric view of one column; non-numeric cells read as 0.0.
    pub fn column_f64(&self, name: &str) -> InsightResult<Vec<f64>> {
        let idx = self.require_column(name)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r[idx].as_f64().unwrap_or(0.0))
            .collect())
    }

    /// Text view of one column (display rendering of each cell).
    pub fn column_strings(&self, name: &str) -> InsightResult<Vec<String>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[idx].to_string()).collect())
    }

    /// Distinct integer values of a column, ascending. Used for the
    /// year/quarter selectors; non-integer cells are skipped.
    pub fn distinct_ints(&self, name: &str) -> InsightResult<Vec<i64>> {
        let idx = self.require_column(name)?;
        let mut out: Vec<i64> = self
            .rows
            .iter()
            .filter_map(|r| r[idx].as_i64())
            .collect();
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        let mut f = Frame::new(vec!["State".into(), "Years".into(), "Amount".into()]);
        f.push_row(vec!["kerala".into(), 2022.into(), 10.5.into()])
            .unwrap();
        f.push_row(vec!["goa".into(), 2023.into(), Value::Null])
            .unwrap();
        f.push_row(vec!["kerala".into(), 2022.into(), 4.0.into()])
            .unwrap();
        f
    }

    #[test]
    fn push_row_rejects_wrong_arity() {
        let mut f = Frame::new(vec!["a".into(), "b".into()]);
        assert!(f.push_row(vec![1.into()]).is_err());
    }

    #[test]
    fn add_column_requires_matching_length() {
        let mut f = sample();
        assert!(f.add_column("Extra", vec![1.into()]).is_err());
        assert!(f
            .add_column("Extra", vec![1.into(), 2.into(), 3.into()])
            .is_ok());
        assert_eq!(f.columns().last().map(String::as_str), Some("Extra"));
    }

    #[test]
    fn distinct_ints_sorted_and_deduped() {
        let f = sample();
        assert_eq!(f.distinct_ints("Years").unwrap(), vec![2022, 2023]);
    }

    #[test]
    fn column_f64_reads_null_as_zero() {
        let f = sample();
        assert_eq!(f.column_f64("Amount").unwrap(), vec![10.5, 0.0, 4.0]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let f = sample();
        assert!(f.column_values("Nope").is_err());
    }

    #[test]
    fn rename_column_in_place() {
        let mut f = sample();
        f.rename_column("State", "Region").unwrap();
        assert!(f.column_index("Region").is_some());
        assert!(f.column_index("State").is_none());
    }

    #[test]
    fn map_column_rewrites_cells() {
        let mut f = sample();
        f.map_column("State", |v| match v.as_str() {
            Some(s) => Value::Str(s.to_uppercase()),
            None => Value::Str(String::new()),
        })
        .unwrap();
        assert_eq!(f.rows()[0][0], Value::Str("KERALA".into()));
    }
}
