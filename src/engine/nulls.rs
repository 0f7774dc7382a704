//! Null handling: row drops and per-column fills.

use super::columns::cast_series;
use super::operation::FillStrategy;
use crate::dataset::{Dtype, Frame};
use crate::error::{Result, TidyError};
use polars::prelude::*;

/// Drops every row holding a null in any of `subset` (all columns when `None`).
pub fn drop_nulls(frame: &Frame, subset: Option<&[String]>) -> Result<Frame> {
    let checked: Vec<&Column> = match subset {
        Some(names) => {
            frame.require_columns(names)?;
            names
                .iter()
                .map(|n| frame.column(n))
                .collect::<Result<_>>()?
        }
        None => frame.columns().iter().collect(),
    };

    let mut keep = BooleanChunked::full("keep".into(), true, frame.height());
    for column in checked {
        keep = &keep & &column.as_materialized_series().is_not_null();
    }

    Frame::new(frame.as_polars().filter(&keep)?)
}

/// Drops only the rows that are null in every column.
pub fn drop_all_nulls(frame: &Frame) -> Result<Frame> {
    if frame.width() == 0 {
        return Ok(frame.clone());
    }

    let mut keep = BooleanChunked::full("keep".into(), false, frame.height());
    for column in frame.columns() {
        keep = &keep | &column.as_materialized_series().is_not_null();
    }

    Frame::new(frame.as_polars().filter(&keep)?)
}

/// Fills nulls in the selected columns.
///
/// Replacement values are computed from the column as it was before the fill,
/// so a mean is taken once over the original non-null values. With
/// `columns == None` every column the strategy applies to is filled and the
/// rest are skipped; naming an unsuitable column explicitly is an error.
pub fn fill_null(
    frame: &Frame,
    strategy: &FillStrategy,
    columns: Option<&[String]>,
) -> Result<Frame> {
    let targets: Vec<&Column> = match columns {
        Some(names) => {
            frame.require_columns(names)?;
            let picked = names
                .iter()
                .map(|n| frame.column(n))
                .collect::<Result<Vec<_>>>()?;
            for column in &picked {
                check_fillable(column, strategy)?;
            }
            picked
        }
        None => frame
            .columns()
            .iter()
            .filter(|c| check_fillable(c, strategy).is_ok())
            .collect(),
    };

    let mut positional = Vec::new();
    let mut exprs = Vec::new();
    for column in targets.into_iter().filter(|c| c.null_count() > 0) {
        match strategy {
            FillStrategy::Forward => positional.push(
                column
                    .as_materialized_series()
                    .fill_null(FillNullStrategy::Forward(None))?,
            ),
            FillStrategy::Backward => positional.push(
                column
                    .as_materialized_series()
                    .fill_null(FillNullStrategy::Backward(None))?,
            ),
            other => exprs.push(fill_expr(column, other, frame.height())?),
        }
    }

    if positional.is_empty() && exprs.is_empty() {
        return Ok(frame.clone());
    }

    let mut df = frame.as_polars().clone();
    if !exprs.is_empty() {
        df = df.lazy().with_columns(exprs).collect()?;
    }
    for column in positional {
        df.with_column(column)?;
    }

    Frame::new(df)
}

fn check_fillable(column: &Column, strategy: &FillStrategy) -> Result<()> {
    let dtype = Dtype::from_polars(column.dtype());
    let ok = match strategy {
        FillStrategy::Forward | FillStrategy::Backward => true,
        s if s.numeric_only() => dtype.is_some_and(Dtype::is_numeric),
        FillStrategy::Constant { value } => match dtype {
            Some(d) => parse_constant(column, d, value).is_ok(),
            None => false,
        },
        _ => dtype.is_some(),
    };

    if ok {
        Ok(())
    } else {
        Err(TidyError::validation(format!(
            "fill strategy '{}' cannot be applied to column {} of type {}",
            strategy.label(),
            column.name(),
            crate::dataset::dtype_label(column.dtype())
        )))
    }
}

fn fill_expr(column: &Column, strategy: &FillStrategy, height: usize) -> Result<Expr> {
    let name = column.name().as_str();
    let dtype = column.dtype();
    let target = col(name);

    let filled = match strategy {
        FillStrategy::Min => target.clone().fill_null(col(name).min()),
        FillStrategy::Max => target.clone().fill_null(col(name).max()),
        FillStrategy::Mean => target
            .cast(DataType::Float64)
            .fill_null(col(name).cast(DataType::Float64).mean()),
        FillStrategy::Median => target
            .cast(DataType::Float64)
            .fill_null(col(name).cast(DataType::Float64).median()),
        FillStrategy::Zero => target.fill_null(literal_for(dtype, false)),
        FillStrategy::One => target.fill_null(literal_for(dtype, true)),
        FillStrategy::Constant { value } => {
            let kind = Dtype::from_polars(dtype)
                .ok_or_else(|| TidyError::validation(format!("cannot fill column {name}")))?;
            let parsed = parse_constant(column, kind, value)?;
            target.fill_null(lit(parsed.new_from_index(0, height)))
        }
        FillStrategy::Forward | FillStrategy::Backward => target,
    };

    // Float32 means stay Float32
    let filled = match (strategy, dtype) {
        (FillStrategy::Mean | FillStrategy::Median, DataType::Float32) => {
            filled.cast(DataType::Float32)
        }
        _ => filled,
    };

    Ok(filled.alias(name))
}

/// Literal 0/1 expressed in the column's own type.
fn literal_for(dtype: &DataType, one: bool) -> Expr {
    let n = i32::from(one);
    match dtype {
        DataType::Boolean => lit(one),
        DataType::String => lit(n.to_string()),
        DataType::Date => lit(n).cast(DataType::Date),
        other => lit(i64::from(n)).cast(other.clone()),
    }
}

fn parse_constant(column: &Column, kind: Dtype, value: &str) -> Result<Series> {
    let raw = Series::new(column.name().clone(), [value]);
    let parsed = cast_series(&raw, kind)?.cast(column.dtype())?;
    if parsed.null_count() > 0 {
        return Err(TidyError::validation(format!(
            "fill value {value:?} is not a valid {kind} for column {}",
            column.name()
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse() -> Result<Frame> {
        Frame::from_columns(vec![
            Column::new("x".into(), &[Some(1i64), None, Some(3), None]),
            Column::new("score".into(), &[Some(2.0f64), None, Some(4.0), Some(9.0)]),
            Column::new("label".into(), &[None, Some("b"), None, None]),
        ])
    }

    #[test]
    fn test_drop_nulls_subset_removes_exactly_null_rows() -> Result<()> {
        let out = drop_nulls(&sparse()?, Some(&["x".to_owned()]))?;
        assert_eq!(out.height(), 2);
        assert_eq!(out.series("x")?.null_count(), 0);
        Ok(())
    }

    #[test]
    fn test_drop_nulls_all_columns() -> Result<()> {
        let out = drop_nulls(&sparse()?, None)?;
        assert_eq!(out.height(), 0);
        assert_eq!(out.width(), 3);
        Ok(())
    }

    #[test]
    fn test_drop_all_nulls_only_removes_empty_rows() -> Result<()> {
        let frame = sparse()?;
        let out = drop_all_nulls(&frame)?;
        assert_eq!(out.height(), frame.height());

        let frame = Frame::from_columns(vec![
            Column::new("a".into(), &[Some(1i64), None, None]),
            Column::new("b".into(), &[None, None, Some("z")]),
        ])?;
        let out = drop_all_nulls(&frame)?;
        assert_eq!(out.height(), 2);
        Ok(())
    }

    #[test]
    fn test_mean_fill_uses_original_values() -> Result<()> {
        let out = fill_null(&sparse()?, &FillStrategy::Mean, Some(&["score".to_owned()]))?;
        let score = out.series("score")?.f64()?;
        assert_eq!(score.get(1), Some(5.0));
        assert_eq!(score.null_count(), 0);
        Ok(())
    }

    #[test]
    fn test_mean_fill_of_integers_is_float() -> Result<()> {
        let out = fill_null(&sparse()?, &FillStrategy::Mean, Some(&["x".to_owned()]))?;
        let x = out.series("x")?;
        assert_eq!(x.dtype(), &DataType::Float64);
        assert_eq!(x.f64()?.get(1), Some(2.0));
        Ok(())
    }

    #[test]
    fn test_numeric_strategy_on_string_column_fails() -> Result<()> {
        let result = fill_null(&sparse()?, &FillStrategy::Max, Some(&["label".to_owned()]));
        assert!(matches!(result, Err(TidyError::Validation(_))));
        Ok(())
    }

    #[test]
    fn test_numeric_strategy_without_columns_skips_strings() -> Result<()> {
        let out = fill_null(&sparse()?, &FillStrategy::Min, None)?;
        assert_eq!(out.series("x")?.i64()?.get(1), Some(1));
        assert_eq!(out.series("label")?.null_count(), 3);
        Ok(())
    }

    #[test]
    fn test_forward_and_backward_are_positional() -> Result<()> {
        let frame = sparse()?;
        let forward = fill_null(&frame, &FillStrategy::Forward, Some(&["label".to_owned()]))?;
        let label = forward.series("label")?.str()?;
        assert_eq!(label.get(0), None);
        assert_eq!(label.get(3), Some("b"));

        let backward = fill_null(&frame, &FillStrategy::Backward, Some(&["x".to_owned()]))?;
        let x = backward.series("x")?.i64()?;
        assert_eq!(x.get(1), Some(3));
        assert_eq!(x.get(3), None);
        Ok(())
    }

    #[test]
    fn test_forward_fill_keeps_temporal_and_boolean_dtypes() -> Result<()> {
        let day = Series::new("day".into(), &[Some(19_000i32), None, Some(19_002)])
            .cast(&DataType::Date)?;
        let frame = Frame::from_columns(vec![
            day.into(),
            Column::new("flag".into(), &[Some(true), None, None]),
        ])?;
        let out = fill_null(&frame, &FillStrategy::Forward, None)?;

        let day = out.series("day")?;
        assert_eq!(day.dtype(), &DataType::Date);
        assert_eq!(day.null_count(), 0);
        assert_eq!(out.series("flag")?.bool()?.get(2), Some(true));
        Ok(())
    }

    #[test]
    fn test_zero_and_one_keep_dtype() -> Result<()> {
        let out = fill_null(&sparse()?, &FillStrategy::Zero, Some(&["x".to_owned()]))?;
        let x = out.series("x")?;
        assert_eq!(x.dtype(), &DataType::Int64);
        assert_eq!(x.i64()?.get(3), Some(0));

        let out = fill_null(&sparse()?, &FillStrategy::One, Some(&["label".to_owned()]))?;
        assert_eq!(out.series("label")?.str()?.get(0), Some("1"));
        Ok(())
    }

    #[test]
    fn test_constant_fill_parses_into_column_type() -> Result<()> {
        let strategy = FillStrategy::Constant {
            value: "7".to_owned(),
        };
        let out = fill_null(&sparse()?, &strategy, Some(&["x".to_owned()]))?;
        assert_eq!(out.series("x")?.i64()?.get(1), Some(7));

        let bad = FillStrategy::Constant {
            value: "seven".to_owned(),
        };
        let result = fill_null(&sparse()?, &bad, Some(&["x".to_owned()]));
        assert!(matches!(result, Err(TidyError::Validation(_))));
        Ok(())
    }
}
