//! Rolling-window statistics written to a derived column.

use super::operation::{RollingKind, RollingSpec};
use crate::dataset::{Dtype, Frame};
use crate::error::{Result, TidyError};
use polars::prelude::*;

pub fn validate(spec: &RollingSpec) -> Result<()> {
    if spec.window_size == 0 {
        return Err(TidyError::validation("rolling window size must be at least 1"));
    }
    let min_periods = spec.effective_min_periods();
    if min_periods == 0 || min_periods > spec.window_size {
        return Err(TidyError::validation(format!(
            "min periods must be between 1 and the window size ({}), got {min_periods}",
            spec.window_size
        )));
    }
    if let RollingKind::Quantile { quantile } = spec.kind
        && !(quantile > 0.0 && quantile < 1.0)
    {
        return Err(TidyError::validation(format!(
            "rolling quantile must lie strictly between 0 and 1, got {quantile}"
        )));
    }
    Ok(())
}

/// Appends `<column>_rolling_<stat>` computed over each window.
///
/// A window with fewer than `min_periods` non-null values yields null.
pub fn rolling(frame: &Frame, spec: &RollingSpec) -> Result<Frame> {
    validate(spec)?;

    let source = frame.series(&spec.column)?;
    if !Dtype::from_polars(source.dtype()).is_some_and(Dtype::is_numeric) {
        return Err(TidyError::schema(format!(
            "rolling statistics need a numeric column, {} is {}",
            spec.column,
            crate::dataset::dtype_label(source.dtype())
        )));
    }

    let output = spec.output_name();
    if frame.has_column(&output) {
        return Err(TidyError::schema(format!("column {output} already exists")));
    }

    // Windows wider than the data all clip to the same rows, so the size
    // polars sees is bounded by the frame.
    let height = frame.height();
    let window_size = spec
        .window_size
        .min(height.saturating_mul(2).saturating_add(1))
        .max(1);
    let mut min_periods = spec.effective_min_periods().min(window_size);
    if matches!(spec.kind, RollingKind::Std | RollingKind::Var) {
        min_periods = min_periods.max(2);
    }
    if min_periods > window_size {
        let nulls = Series::full_null(output.as_str().into(), height, &DataType::Float64);
        return frame_with(frame, nulls.into());
    }

    let options = RollingOptionsFixedWindow {
        window_size,
        min_periods,
        center: spec.center,
        ..Default::default()
    };
    let values = col(spec.column.as_str()).cast(DataType::Float64);
    let expr = match spec.kind {
        RollingKind::Sum => values.rolling_sum(options),
        RollingKind::Average => values.rolling_mean(options),
        RollingKind::Min => values.rolling_min(options),
        RollingKind::Max => values.rolling_max(options),
        RollingKind::Var => values.rolling_var(options),
        RollingKind::Std => values.rolling_std(options),
        RollingKind::Median => values.rolling_median(options),
        RollingKind::Quantile { quantile } => {
            values.rolling_quantile(QuantileMethod::Linear, quantile, options)
        }
    };

    let computed = frame
        .as_polars()
        .clone()
        .lazy()
        .select([expr.alias(output.as_str())])
        .collect()?;
    let column = computed.column(output.as_str())?.clone();
    frame_with(frame, column)
}

fn frame_with(frame: &Frame, column: Column) -> Result<Frame> {
    let mut columns = frame.columns().to_vec();
    columns.push(column);
    Frame::from_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: RollingKind, window_size: usize, center: bool, min_periods: Option<usize>) -> RollingSpec {
        RollingSpec {
            kind,
            column: "v".to_owned(),
            window_size,
            center,
            min_periods,
        }
    }

    fn gappy() -> Result<Frame> {
        Frame::from_columns(vec![Column::new(
            "v".into(),
            &[Some(1.0f64), Some(2.0), None, Some(4.0), Some(5.0)],
        )])
    }

    fn computed(frame: &Frame, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(frame.series(name)?.f64()?.into_iter().collect())
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let value = actual.unwrap_or(f64::NAN);
        assert!((value - expected).abs() < 1e-9, "expected {expected}, got {actual:?}");
    }

    #[test]
    fn test_min_periods_blocks_partial_windows() -> Result<()> {
        let out = rolling(&gappy()?, &spec(RollingKind::Sum, 3, false, Some(3)))?;
        assert_eq!(computed(&out, "v_rolling_sum")?, vec![None; 5]);

        let out = rolling(&gappy()?, &spec(RollingKind::Sum, 3, false, Some(2)))?;
        assert_eq!(
            computed(&out, "v_rolling_sum")?,
            vec![None, Some(3.0), Some(3.0), Some(6.0), Some(9.0)]
        );
        Ok(())
    }

    #[test]
    fn test_default_min_periods_is_one() -> Result<()> {
        let out = rolling(&gappy()?, &spec(RollingKind::Average, 2, false, None))?;
        assert_eq!(
            computed(&out, "v_rolling_mean")?,
            vec![Some(1.0), Some(1.5), Some(2.0), Some(4.0), Some(4.5)]
        );
        Ok(())
    }

    #[test]
    fn test_centered_window() -> Result<()> {
        let frame = Frame::from_columns(vec![Column::new("v".into(), &[1i64, 2, 3, 4, 5])])?;
        let out = rolling(&frame, &spec(RollingKind::Max, 3, true, None))?;
        assert_eq!(
            computed(&out, "v_rolling_max")?,
            vec![Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(5.0)]
        );
        Ok(())
    }

    #[test]
    fn test_std_var_and_quantile() -> Result<()> {
        let frame = Frame::from_columns(vec![Column::new("v".into(), &[2.0f64, 4.0, 6.0])])?;
        let out = rolling(&frame, &spec(RollingKind::Var, 3, false, Some(3)))?;
        assert_close(computed(&out, "v_rolling_var")?[2], 4.0);

        let out = rolling(&frame, &spec(RollingKind::Std, 3, false, None))?;
        let std = computed(&out, "v_rolling_std")?;
        assert_eq!(std[0], None, "A single value has no sample deviation");
        assert_close(std[1], 2.0f64.sqrt());
        assert_close(std[2], 2.0);

        let out = rolling(&frame, &spec(RollingKind::Quantile { quantile: 0.25 }, 3, false, None))?;
        assert_close(computed(&out, "v_rolling_quantile_0.25")?[2], 3.0);

        let out = rolling(&frame, &spec(RollingKind::Median, 2, false, None))?;
        assert_close(computed(&out, "v_rolling_median")?[1], 3.0);

        let out = rolling(&frame, &spec(RollingKind::Std, 1, false, None))?;
        assert_eq!(computed(&out, "v_rolling_std")?, vec![None; 3]);
        Ok(())
    }

    #[test]
    fn test_window_wider_than_data() -> Result<()> {
        let out = rolling(&gappy()?, &spec(RollingKind::Sum, usize::MAX, false, None))?;
        assert_eq!(
            computed(&out, "v_rolling_sum")?,
            vec![Some(1.0), Some(3.0), Some(3.0), Some(7.0), Some(12.0)]
        );

        let out = rolling(&gappy()?, &spec(RollingKind::Max, usize::MAX, true, Some(usize::MAX)))?;
        assert_eq!(computed(&out, "v_rolling_max")?, vec![None; 5]);

        let out = rolling(&gappy()?, &spec(RollingKind::Max, usize::MAX, true, Some(4)))?;
        assert_eq!(computed(&out, "v_rolling_max")?, vec![Some(5.0); 5]);
        Ok(())
    }

    #[test]
    fn test_invalid_parameters() -> Result<()> {
        let frame = gappy()?;
        assert!(matches!(
            rolling(&frame, &spec(RollingKind::Sum, 0, false, None)),
            Err(TidyError::Validation(_))
        ));
        assert!(matches!(
            rolling(&frame, &spec(RollingKind::Sum, 2, false, Some(3))),
            Err(TidyError::Validation(_))
        ));
        assert!(matches!(
            rolling(&frame, &spec(RollingKind::Quantile { quantile: 1.5 }, 2, false, None)),
            Err(TidyError::Validation(_))
        ));
        Ok(())
    }

    #[test]
    fn test_non_numeric_column_and_name_collision() -> Result<()> {
        let frame = Frame::from_columns(vec![
            Column::new("v".into(), &["a", "b"]),
            Column::new("w".into(), &[1i64, 2]),
            Column::new("w_rolling_sum".into(), &[0i64, 0]),
        ])?;
        assert!(matches!(
            rolling(&frame, &spec(RollingKind::Sum, 2, false, None)),
            Err(TidyError::Schema(_))
        ));

        let mut on_w = spec(RollingKind::Sum, 2, false, None);
        on_w.column = "w".to_owned();
        assert!(matches!(rolling(&frame, &on_w), Err(TidyError::Schema(_))));
        Ok(())
    }
}
