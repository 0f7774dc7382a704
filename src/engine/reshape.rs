//! Wide/long reshaping: pivot and unpivot.

use super::operation::PivotAggregate;
use super::rows;
use crate::dataset::{Dtype, Frame};
use crate::error::{Result, TidyError};
use polars::lazy::frame::pivot::pivot_stable;
use polars::prelude::*;

pub const DEFAULT_VARIABLE_NAME: &str = "variable";
pub const DEFAULT_VALUE_NAME: &str = "value";

/// Spreads `values` into one column per distinct value of `columns`, one row
/// per distinct `index` key.
///
/// Groups and generated columns follow first-occurrence order. A cell with no
/// contributing rows is null.
pub fn pivot(
    frame: &Frame,
    index: &[String],
    columns: &str,
    values: &str,
    aggregate: PivotAggregate,
) -> Result<Frame> {
    if index.is_empty() {
        return Err(TidyError::validation("pivot needs at least one index column"));
    }
    frame.require_columns(index)?;
    frame.require_columns(&[columns, values])?;
    if columns == values || index.iter().any(|i| i == columns || i == values) {
        return Err(TidyError::validation(
            "pivot index, columns and values must name different columns",
        ));
    }

    let values_series = frame.series(values)?;
    let numeric_agg = matches!(
        aggregate,
        PivotAggregate::Sum | PivotAggregate::Mean | PivotAggregate::Min | PivotAggregate::Max
    );
    if numeric_agg && !Dtype::from_polars(values_series.dtype()).is_some_and(Dtype::is_numeric) {
        return Err(TidyError::schema(format!(
            "pivot aggregate '{}' needs a numeric values column, {values} is {}",
            aggregate.label(),
            crate::dataset::dtype_label(values_series.dtype())
        )));
    }

    let mut source = frame.as_polars().clone();
    if numeric_agg {
        source.with_column(values_series.cast(&DataType::Float64)?)?;
    }

    let pivoted = pivot_stable(
        &source,
        [columns],
        Some(index.iter().map(String::as_str)),
        Some([values]),
        false,
        Some(pivot_agg_expr(values, aggregate)),
        None,
    )?;
    Frame::new(pivoted)
}

fn pivot_agg_expr(values: &str, aggregate: PivotAggregate) -> Expr {
    let values = col(values);
    match aggregate {
        PivotAggregate::First => values.first(),
        PivotAggregate::Last => values.last(),
        PivotAggregate::Sum => values.sum(),
        PivotAggregate::Mean => values.mean(),
        PivotAggregate::Min => values.min(),
        PivotAggregate::Max => values.max(),
        PivotAggregate::Count => values.count(),
    }
}

/// Melts `value_vars` into a variable/value pair of columns.
///
/// Rows come out variable-major: every input row for the first value
/// variable, then every row for the next.
pub fn unpivot(
    frame: &Frame,
    id_vars: &[String],
    value_vars: &[String],
    variable_name: Option<&str>,
    value_name: Option<&str>,
    sort_by: Option<&str>,
) -> Result<Frame> {
    if value_vars.is_empty() {
        return Err(TidyError::validation("unpivot needs at least one value column"));
    }
    frame.require_columns(id_vars)?;
    frame.require_columns(value_vars)?;
    if let Some(both) = id_vars.iter().find(|c| value_vars.contains(c)) {
        return Err(TidyError::validation(format!(
            "column {both} cannot be both an id and a value column"
        )));
    }

    let sources = value_vars
        .iter()
        .map(|name| frame.series(name))
        .collect::<Result<Vec<_>>>()?;
    let value_dtype = unpivot_dtype(&sources);

    let mut source = frame.as_polars().clone();
    for series in sources {
        if series.dtype() != &value_dtype {
            source.with_column(series.cast(&value_dtype)?)?;
        }
    }

    let melted = source.unpivot2(UnpivotArgsIR {
        on: value_vars.iter().map(|v| v.as_str().into()).collect(),
        index: id_vars.iter().map(|v| v.as_str().into()).collect(),
        variable_name: Some(variable_name.unwrap_or(DEFAULT_VARIABLE_NAME).into()),
        value_name: Some(value_name.unwrap_or(DEFAULT_VALUE_NAME).into()),
    })?;

    let result = Frame::new(melted)?;
    match sort_by {
        Some(column) => rows::sort(&result, column, false, true),
        None => Ok(result),
    }
}

/// Shared dtype of the value columns, widening to Float64 or String.
fn unpivot_dtype(sources: &[&Series]) -> DataType {
    let first = sources.first().map(|s| s.dtype().clone()).unwrap_or(DataType::String);
    if sources.iter().all(|s| s.dtype() == &first) {
        return first;
    }

    let all_numeric = sources
        .iter()
        .all(|s| Dtype::from_polars(s.dtype()).is_some_and(Dtype::is_numeric));
    if all_numeric {
        DataType::Float64
    } else {
        DataType::String
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long() -> Result<Frame> {
        Frame::from_columns(vec![
            Column::new("city".into(), &["oslo", "oslo", "rome", "rome", "oslo"]),
            Column::new("year".into(), &["2023", "2024", "2023", "2024", "2024"]),
            Column::new("temp".into(), &[Some(5.0f64), Some(6.0), Some(15.0), None, Some(8.0)]),
        ])
    }

    fn names(frame: &Frame) -> Vec<String> {
        frame.column_names()
    }

    #[test]
    fn test_pivot_first_occurrence_order() -> Result<()> {
        let out = pivot(&long()?, &["city".to_owned()], "year", "temp", PivotAggregate::First)?;
        assert_eq!(names(&out), vec!["city", "2023", "2024"]);
        assert_eq!(out.height(), 2);
        let y2024 = out.series("2024")?.f64()?;
        assert_eq!(y2024.get(0), Some(6.0));
        assert_eq!(y2024.get(1), None);
        Ok(())
    }

    #[test]
    fn test_pivot_aggregates() -> Result<()> {
        let frame = long()?;
        let idx = ["city".to_owned()];

        let sum = pivot(&frame, &idx, "year", "temp", PivotAggregate::Sum)?;
        assert_eq!(sum.series("2024")?.f64()?.get(0), Some(14.0));

        let mean = pivot(&frame, &idx, "year", "temp", PivotAggregate::Mean)?;
        assert_eq!(mean.series("2024")?.f64()?.get(0), Some(7.0));
        assert_eq!(mean.series("2024")?.f64()?.get(1), None);

        let last = pivot(&frame, &idx, "year", "temp", PivotAggregate::Last)?;
        assert_eq!(last.series("2024")?.f64()?.get(0), Some(8.0));

        let count = pivot(&frame, &idx, "year", "temp", PivotAggregate::Count)?;
        let counts = count.series("2024")?;
        assert_eq!(counts.dtype(), &DataType::UInt32);
        assert_eq!(counts.u32()?.get(0), Some(2));
        assert_eq!(counts.u32()?.get(1), Some(0));
        Ok(())
    }

    #[test]
    fn test_pivot_missing_cell_is_null() -> Result<()> {
        let frame = Frame::from_columns(vec![
            Column::new("k".into(), &["a", "b"]),
            Column::new("c".into(), &["x", "y"]),
            Column::new("v".into(), &[1i64, 2]),
        ])?;
        let out = pivot(&frame, &["k".to_owned()], "c", "v", PivotAggregate::Sum)?;
        assert_eq!(out.series("x")?.f64()?.get(1), None);
        assert_eq!(out.series("y")?.f64()?.get(1), Some(2.0));
        Ok(())
    }

    #[test]
    fn test_pivot_headers_from_non_string_keys() -> Result<()> {
        let frame = Frame::from_columns(vec![
            Column::new("k".into(), &["a", "a", "b"]),
            Column::new("year".into(), &[2024i64, 2023, 2024]),
            Column::new("flag".into(), &[true, false, true]),
            Column::new("v".into(), &[1.5f64, 2.5, 3.5]),
        ])?;

        let by_year = pivot(&frame, &["k".to_owned()], "year", "v", PivotAggregate::Max)?;
        assert_eq!(names(&by_year), vec!["k", "2024", "2023"]);
        assert_eq!(by_year.series("2024")?.f64()?.get(1), Some(3.5));

        let by_flag = pivot(&frame, &["k".to_owned()], "flag", "v", PivotAggregate::Min)?;
        assert_eq!(names(&by_flag), vec!["k", "true", "false"]);
        assert_eq!(by_flag.series("false")?.f64()?.get(0), Some(2.5));
        assert_eq!(by_flag.series("false")?.f64()?.get(1), None);
        Ok(())
    }

    #[test]
    fn test_pivot_numeric_aggregate_on_strings_fails() -> Result<()> {
        let result = pivot(&long()?, &["city".to_owned()], "temp", "year", PivotAggregate::Mean);
        assert!(matches!(result, Err(TidyError::Schema(_))));
        Ok(())
    }

    #[test]
    fn test_unpivot_shape_and_defaults() -> Result<()> {
        let wide = Frame::from_columns(vec![
            Column::new("id".into(), &[1i64, 2, 3]),
            Column::new("a".into(), &[1i64, 2, 3]),
            Column::new("b".into(), &[1.5f64, 2.5, 3.5]),
        ])?;
        let out = unpivot(&wide, &["id".to_owned()], &["a".to_owned(), "b".to_owned()], None, None, None)?;
        assert_eq!(names(&out), vec!["id", "variable", "value"]);
        assert_eq!(out.height(), 6);
        assert_eq!(out.series("value")?.dtype(), &DataType::Float64);
        assert_eq!(out.series("variable")?.str()?.get(3), Some("b"));
        assert_eq!(out.series("id")?.i64()?.get(3), Some(1));
        Ok(())
    }

    #[test]
    fn test_unpivot_mixed_types_become_strings_and_sort() -> Result<()> {
        let wide = Frame::from_columns(vec![
            Column::new("id".into(), &[2i64, 1]),
            Column::new("n".into(), &[10i64, 20]),
            Column::new("s".into(), &["x", "y"]),
        ])?;
        let out = unpivot(
            &wide,
            &["id".to_owned()],
            &["n".to_owned(), "s".to_owned()],
            Some("field"),
            Some("content"),
            Some("id"),
        )?;
        assert_eq!(out.series("content")?.dtype(), &DataType::String);
        let ids: Vec<Option<i64>> = out.series("id")?.i64()?.into_iter().collect();
        assert_eq!(ids, vec![Some(1), Some(1), Some(2), Some(2)]);
        Ok(())
    }

    #[test]
    fn test_unpivot_then_pivot_restores_columns() -> Result<()> {
        let wide = Frame::from_columns(vec![
            Column::new("id".into(), &[1i64, 2]),
            Column::new("a".into(), &[3i64, 4]),
            Column::new("b".into(), &[5i64, 6]),
        ])?;
        let long = unpivot(&wide, &["id".to_owned()], &["a".to_owned(), "b".to_owned()], None, None, None)?;
        let back = pivot(&long, &["id".to_owned()], "variable", "value", PivotAggregate::First)?;
        assert_eq!(names(&back), names(&wide));
        assert_eq!(back.series("b")?.i64()?.get(1), Some(6));
        Ok(())
    }
}
