//! Immutable columnar snapshot produced by every operation.

use crate::error::{Result, TidyError};
use polars::prelude::*;
use std::collections::HashSet;

/// Read-only table snapshot.
///
/// A `Frame` never hands out mutable access to its data; every operation
/// builds a new one. Polars columns are reference counted, so columns that an
/// operation leaves untouched are shared with the previous snapshot instead of
/// copied.
#[derive(Debug, Clone)]
pub struct Frame {
    df: DataFrame,
}

impl Frame {
    /// Wraps a polars frame, re-checking the column invariants.
    pub fn new(df: DataFrame) -> Result<Self> {
        check_columns(df.get_columns())?;
        Ok(Self { df })
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        check_columns(&columns)?;
        let df = DataFrame::new(columns)?;
        Ok(Self { df })
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_columns().iter().any(|c| c.name().as_str() == name)
    }

    pub fn columns(&self) -> &[Column] {
        self.df.get_columns()
    }

    /// Looks up a column, reporting a missing name as a schema error.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.df
            .get_columns()
            .iter()
            .find(|c| c.name().as_str() == name)
            .ok_or_else(|| TidyError::column_not_found(name))
    }

    pub fn series(&self, name: &str) -> Result<&Series> {
        Ok(self.column(name)?.as_materialized_series())
    }

    /// Fails with a schema error naming the first unknown column.
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        match names.iter().find(|n| !self.has_column(n.as_ref())) {
            Some(missing) => Err(TidyError::column_not_found(missing.as_ref())),
            None => Ok(()),
        }
    }

    /// Rows `[offset, offset + len)`, clamped to the frame.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        let start = offset.min(self.height());
        let end = start.saturating_add(len).min(self.height());
        Self {
            df: self.df.slice(start as i64, end - start),
        }
    }

    pub fn as_polars(&self) -> &DataFrame {
        &self.df
    }
}

fn check_columns(columns: &[Column]) -> Result<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if !seen.insert(column.name().as_str()) {
            return Err(TidyError::schema(format!(
                "duplicate column name: {}",
                column.name()
            )));
        }
    }

    if let Some(first) = columns.first()
        && let Some(bad) = columns.iter().find(|c| c.len() != first.len())
    {
        return Err(TidyError::schema(format!(
            "column {} has {} rows, expected {}",
            bad.name(),
            bad.len(),
            first.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Result<Frame> {
        Frame::from_columns(vec![
            Column::new("id".into(), &[1i64, 2, 3]),
            Column::new("name".into(), &["a", "b", "c"]),
        ])
    }

    #[test]
    fn test_accessors() -> Result<()> {
        let frame = sample()?;
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.column_names(), vec!["id", "name"]);
        assert!(frame.has_column("name"));
        assert!(matches!(frame.column("nope"), Err(TidyError::Schema(_))));
        Ok(())
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Frame::from_columns(vec![
            Column::new("x".into(), &[1i64]),
            Column::new("x".into(), &[2i64]),
        ]);
        assert!(matches!(result, Err(TidyError::Schema(_))));
    }

    #[test]
    fn test_unequal_lengths_rejected() {
        let result = Frame::from_columns(vec![
            Column::new("x".into(), &[1i64, 2]),
            Column::new("y".into(), &[2i64]),
        ]);
        assert!(matches!(result, Err(TidyError::Schema(_))));
    }

    #[test]
    fn test_slice_clamps() -> Result<()> {
        let frame = sample()?;
        assert_eq!(frame.slice(1, 10).height(), 2);
        assert_eq!(frame.slice(10, 10).height(), 0);
        Ok(())
    }
}
