//! Lightweight descriptors derived from a [`Frame`], cheap to hand to a UI.

use super::dtype::dtype_label;
use super::frame::Frame;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

/// Per-column descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
}

/// Summary of the dataset at one point in its history.
///
/// `id` identifies the dataset lineage: it is minted on import and carried by
/// every entry derived from that import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub id: Uuid,
    pub name: String,
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub file_path: String,
    pub imported_at: DateTime<Utc>,
}

impl DatasetMetadata {
    /// Metadata for a freshly imported file.
    pub fn for_import(frame: &Frame, file_path: &Path) -> Self {
        let name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_owned();

        Self {
            id: Uuid::new_v4(),
            name,
            row_count: frame.height(),
            columns: column_infos(frame),
            file_path: file_path.display().to_string(),
            imported_at: Utc::now(),
        }
    }

    /// Recomputes the frame-dependent fields, keeping the lineage fields.
    pub fn derive(&self, frame: &Frame) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            row_count: frame.height(),
            columns: column_infos(frame),
            file_path: self.file_path.clone(),
            imported_at: self.imported_at,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

fn column_infos(frame: &Frame) -> Vec<ColumnInfo> {
    frame
        .columns()
        .iter()
        .map(|c| ColumnInfo {
            name: c.name().to_string(),
            dtype: dtype_label(c.dtype()),
            null_count: c.null_count(),
        })
        .collect()
}

/// One page of rows rendered for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPage {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub total_rows: usize,
    pub offset: usize,
}

impl DatasetPage {
    pub fn from_frame(frame: &Frame, offset: usize, limit: usize) -> Self {
        let window = frame.slice(offset, limit);
        let columns = window.column_names();

        let series: Vec<&Series> = window
            .columns()
            .iter()
            .map(Column::as_materialized_series)
            .collect();

        let rows = (0..window.height())
            .map(|row| series.iter().map(|s| cell_to_json(s, row)).collect())
            .collect();

        Self {
            columns,
            rows,
            total_rows: frame.height(),
            offset: offset.min(frame.height()),
        }
    }
}

/// Renders a single cell as JSON.
pub fn cell_to_json(series: &Series, row: usize) -> Value {
    match series.get(row) {
        Ok(value) => any_value_to_json(&value),
        Err(_) => Value::Null,
    }
}

pub fn any_value_to_json(value: &AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String((*s).to_owned()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::Float32(v) => finite_json(f64::from(*v)),
        AnyValue::Float64(v) => finite_json(*v),
        AnyValue::Date(days) => format_date(*days).map_or(Value::Null, Value::String),
        AnyValue::Datetime(v, unit, _) => {
            Value::String(format_datetime(*v, *unit).unwrap_or_else(|| v.to_string()))
        }
        AnyValue::Time(nanos) => {
            Value::String(format_time(*nanos).unwrap_or_else(|| nanos.to_string()))
        }
        other => Value::String(other.to_string()),
    }
}

fn finite_json(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// `YYYY-MM-DD` for a day count since the Unix epoch.
pub fn format_date(days: i32) -> Option<String> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Converts a physical datetime value to microseconds since the epoch.
pub fn datetime_to_micros(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => value / 1_000,
        TimeUnit::Microseconds => value,
        TimeUnit::Milliseconds => value.saturating_mul(1_000),
    }
}

/// `YYYY-MM-DD HH:MM:SS` for a physical datetime value.
pub fn format_datetime(value: i64, unit: TimeUnit) -> Option<String> {
    DateTime::from_timestamp_micros(datetime_to_micros(value, unit))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// `HH:MM:SS` for nanoseconds since midnight.
pub fn format_time(nanos: i64) -> Option<String> {
    let secs = u32::try_from(nanos / 1_000_000_000).ok()?;
    let sub = u32::try_from(nanos % 1_000_000_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, sub)
        .map(|t| t.format("%H:%M:%S").to_string())
}
