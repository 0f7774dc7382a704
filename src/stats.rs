//! Per-column summary statistics.
//!
//! Every [`ColumnStats`] carries the counts; the optional fields are filled by
//! dtype family (numeric, temporal, boolean). A `None` means "not applicable
//! to this column", never zero.

use crate::dataset::metadata::{format_date, format_datetime};
use crate::dataset::{Dtype, Frame, dtype_label};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub dtype: String,
    pub total_count: usize,
    pub null_count: usize,
    pub unique_count: usize,

    // numeric
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,

    // date / datetime
    pub min_datetime: Option<String>,
    pub max_datetime: Option<String>,
    pub range_days: Option<f64>,

    // boolean
    pub true_count: Option<usize>,
    pub false_count: Option<usize>,
}

/// Computes the summary of `column_name` in `frame`.
pub fn column_stats(frame: &Frame, column_name: &str) -> Result<ColumnStats> {
    let series = frame.series(column_name)?;

    let mut stats = ColumnStats {
        name: column_name.to_owned(),
        dtype: dtype_label(series.dtype()),
        total_count: series.len(),
        null_count: series.null_count(),
        unique_count: series.n_unique()?,
        ..ColumnStats::default()
    };

    match series.dtype() {
        dt if Dtype::from_polars(dt).is_some_and(Dtype::is_numeric) => {
            analyse_numeric(series, &mut stats)?;
        }
        DataType::Boolean => analyse_boolean(series, &mut stats)?,
        DataType::Date => analyse_date(series, &mut stats)?,
        DataType::Datetime(_, _) => analyse_datetime(series, &mut stats)?,
        _ => {}
    }

    Ok(stats)
}

fn analyse_numeric(series: &Series, stats: &mut ColumnStats) -> Result<()> {
    let floats = series.cast(&DataType::Float64)?;
    let ca = floats.f64()?;

    stats.max = ca.max();
    stats.min = ca.min();
    stats.mean = ca.mean();
    stats.std = ca.std(1);
    stats.q25 = ca.quantile(0.25, QuantileMethod::Linear)?;
    stats.q50 = ca.quantile(0.50, QuantileMethod::Linear)?;
    stats.q75 = ca.quantile(0.75, QuantileMethod::Linear)?;
    Ok(())
}

fn analyse_boolean(series: &Series, stats: &mut ColumnStats) -> Result<()> {
    let ca = series.bool()?;
    let true_count = ca.sum().unwrap_or(0) as usize;
    stats.true_count = Some(true_count);
    stats.false_count = Some(ca.len() - ca.null_count() - true_count);
    Ok(())
}

fn analyse_date(series: &Series, stats: &mut ColumnStats) -> Result<()> {
    let days = series.date()?.physical();
    let (min, max) = (days.min(), days.max());

    stats.min_datetime = min.and_then(format_date);
    stats.max_datetime = max.and_then(format_date);
    stats.range_days = min.zip(max).map(|(lo, hi)| f64::from(hi - lo));
    Ok(())
}

fn analyse_datetime(series: &Series, stats: &mut ColumnStats) -> Result<()> {
    let ca = series.datetime()?;
    let unit = ca.time_unit();
    let physical = ca.physical();
    let (min, max) = (physical.min(), physical.max());

    stats.min_datetime = min.and_then(|v| format_datetime(v, unit));
    stats.max_datetime = max.and_then(|v| format_datetime(v, unit));
    stats.range_days = min.zip(max).map(|(lo, hi)| {
        let span = crate::dataset::metadata::datetime_to_micros(hi, unit)
            - crate::dataset::metadata::datetime_to_micros(lo, unit);
        span as f64 / MICROS_PER_DAY
    });
    Ok(())
}
