//! Column-level operations: select, drop, rename, cast.

use crate::dataset::{Dtype, Frame};
use crate::error::{Result, TidyError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike as _};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};

pub fn select_columns(frame: &Frame, columns: &[String]) -> Result<Frame> {
    frame.require_columns(columns)?;
    let picked = columns
        .iter()
        .map(|name| frame.column(name).cloned())
        .collect::<Result<Vec<_>>>()?;
    Frame::from_columns(picked)
}

pub fn drop_columns(frame: &Frame, columns: &[String]) -> Result<Frame> {
    frame.require_columns(columns)?;
    let dropped: HashSet<&str> = columns.iter().map(String::as_str).collect();
    let kept = frame
        .columns()
        .iter()
        .filter(|c| !dropped.contains(c.name().as_str()))
        .cloned()
        .collect();
    Frame::from_columns(kept)
}

/// Renames columns in place, keeping their position.
///
/// The resulting names must stay unique: two sources mapped to the same
/// target, or a target equal to a column that is not itself renamed away,
/// are schema errors.
pub fn rename_columns(frame: &Frame, mapping: &BTreeMap<String, String>) -> Result<Frame> {
    frame.require_columns(&mapping.keys().collect::<Vec<_>>())?;

    if let Some(blank) = mapping.values().find(|v| v.trim().is_empty()) {
        return Err(TidyError::validation(format!(
            "new column name must not be blank (got {blank:?})"
        )));
    }

    let mut seen = HashSet::with_capacity(frame.width());
    for name in frame.column_names() {
        let target = mapping.get(&name).cloned().unwrap_or(name);
        if !seen.insert(target.clone()) {
            return Err(TidyError::schema(format!(
                "rename would produce duplicate column name: {target}"
            )));
        }
    }

    let renamed = frame
        .columns()
        .iter()
        .map(|c| match mapping.get(c.name().as_str()) {
            Some(new_name) => {
                let mut column = c.clone();
                column.rename(new_name.as_str().into());
                column
            }
            None => c.clone(),
        })
        .collect();

    Frame::from_columns(renamed)
}

/// Casts each mapped column independently.
///
/// Cells that cannot be represented in the target type become null instead of
/// failing the cast.
pub fn cast_types(frame: &Frame, mapping: &BTreeMap<String, Dtype>) -> Result<Frame> {
    frame.require_columns(&mapping.keys().collect::<Vec<_>>())?;

    let columns = frame
        .columns()
        .iter()
        .map(|c| match mapping.get(c.name().as_str()) {
            Some(target) => cast_series(c.as_materialized_series(), *target).map(Column::from),
            None => Ok(c.clone()),
        })
        .collect::<Result<Vec<_>>>()?;

    Frame::from_columns(columns)
}

pub fn cast_series(series: &Series, target: Dtype) -> Result<Series> {
    if series.dtype() == &DataType::String {
        return cast_from_strings(series, target);
    }

    series.cast(&target.to_polars()).map_err(|e| {
        TidyError::schema(format!(
            "cannot cast column {} from {:?} to {target}: {e}",
            series.name(),
            series.dtype()
        ))
    })
}

fn cast_from_strings(series: &Series, target: Dtype) -> Result<Series> {
    let name = series.name().clone();
    let ca = series.str()?;
    let cells = || ca.into_iter().map(|v| v.map(str::trim));

    let parsed = match target {
        Dtype::String => return Ok(series.clone()),
        Dtype::Float32 | Dtype::Float64 => {
            let values: Vec<Option<f64>> = cells().map(|v| v.and_then(|s| s.parse().ok())).collect();
            Series::new(name, values)
        }
        Dtype::Boolean => {
            let values: Vec<Option<bool>> = cells().map(|v| v.and_then(parse_bool)).collect();
            Series::new(name, values)
        }
        Dtype::Date => {
            let values: Vec<Option<i32>> = cells()
                .map(|v| v.and_then(parse_date).map(days_since_epoch))
                .collect();
            Series::new(name, values)
        }
        Dtype::Datetime => {
            let values: Vec<Option<i64>> = cells()
                .map(|v| v.and_then(parse_datetime).map(|dt| dt.and_utc().timestamp_micros()))
                .collect();
            Series::new(name, values)
        }
        Dtype::Time => {
            let values: Vec<Option<i64>> = cells()
                .map(|v| v.and_then(parse_time).map(nanos_since_midnight))
                .collect();
            Series::new(name, values)
        }
        Dtype::Duration => {
            let values: Vec<Option<i64>> = cells().map(|v| v.and_then(parse_integer)).collect();
            Series::new(name, values)
        }
        Dtype::UInt8 | Dtype::UInt16 | Dtype::UInt32 | Dtype::UInt64 => {
            let values: Vec<Option<u64>> = cells().map(|v| v.and_then(parse_unsigned)).collect();
            Series::new(name, values)
        }
        _ => {
            let values: Vec<Option<i64>> = cells().map(|v| v.and_then(parse_integer)).collect();
            Series::new(name, values)
        }
    };

    // Physical values are already in range for the logical types; numeric
    // narrowing is a non-strict cast, so overflow becomes null.
    Ok(parsed.cast(&target.to_polars())?)
}

fn parse_integer(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().or_else(|| {
        whole_float(s)
            .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn parse_unsigned(s: &str) -> Option<u64> {
    s.parse::<u64>().ok().or_else(|| {
        whole_float(s)
            .filter(|f| *f >= 0.0 && *f < u64::MAX as f64)
            .map(|f| f as u64)
    })
}

/// Accepts "3.0" but not "3.5".
fn whole_float(s: &str) -> Option<f64> {
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    i32::try_from((date - epoch).num_days()).unwrap_or(i32::MAX)
}

fn nanos_since_midnight(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1_000_000_000 + i64::from(time.nanosecond())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Result<Frame> {
        Frame::from_columns(vec![
            Column::new("name".into(), &["ann", "bob", "cy"]),
            Column::new("age".into(), &["31", "N/A", " 40 "]),
            Column::new("score".into(), &[Some(1.5f64), None, Some(3.0)]),
        ])
    }

    #[test]
    fn test_select_keeps_requested_order() -> Result<()> {
        let out = select_columns(&people()?, &["score".to_owned(), "name".to_owned()])?;
        assert_eq!(out.column_names(), vec!["score", "name"]);
        assert_eq!(out.height(), 3);
        Ok(())
    }

    #[test]
    fn test_select_unknown_column_is_schema_error() -> Result<()> {
        let result = select_columns(&people()?, &["nope".to_owned()]);
        assert!(matches!(result, Err(TidyError::Schema(_))));
        Ok(())
    }

    #[test]
    fn test_drop_columns() -> Result<()> {
        let out = drop_columns(&people()?, &["age".to_owned()])?;
        assert_eq!(out.column_names(), vec!["name", "score"]);
        Ok(())
    }

    #[test]
    fn test_rename_and_swap() -> Result<()> {
        let frame = people()?;
        let mut mapping = BTreeMap::new();
        mapping.insert("name".to_owned(), "age".to_owned());
        mapping.insert("age".to_owned(), "name".to_owned());
        let out = rename_columns(&frame, &mapping)?;
        assert_eq!(out.column_names(), vec!["age", "name", "score"]);
        Ok(())
    }

    #[test]
    fn test_rename_collision_with_untouched_column() -> Result<()> {
        let mut mapping = BTreeMap::new();
        mapping.insert("name".to_owned(), "score".to_owned());
        let result = rename_columns(&people()?, &mapping);
        assert!(matches!(result, Err(TidyError::Schema(_))));
        Ok(())
    }

    #[test]
    fn test_rename_collision_between_targets() -> Result<()> {
        let mut mapping = BTreeMap::new();
        mapping.insert("name".to_owned(), "x".to_owned());
        mapping.insert("age".to_owned(), "x".to_owned());
        let result = rename_columns(&people()?, &mapping);
        assert!(matches!(result, Err(TidyError::Schema(_))));
        Ok(())
    }

    #[test]
    fn test_lossy_cast_turns_bad_cells_into_null() -> Result<()> {
        let mut mapping = BTreeMap::new();
        mapping.insert("age".to_owned(), Dtype::Int64);
        let out = cast_types(&people()?, &mapping)?;

        let ages = out.series("age")?;
        assert_eq!(ages.dtype(), &DataType::Int64);
        let ages = ages.i64()?;
        assert_eq!(ages.get(0), Some(31));
        assert_eq!(ages.get(1), None);
        assert_eq!(ages.get(2), Some(40));
        Ok(())
    }

    #[test]
    fn test_cast_narrowing_overflow_is_null() -> Result<()> {
        let frame = Frame::from_columns(vec![Column::new("v".into(), &[1i64, 300])])?;
        let mut mapping = BTreeMap::new();
        mapping.insert("v".to_owned(), Dtype::Int8);
        let out = cast_types(&frame, &mapping)?;
        let v = out.series("v")?.i8()?;
        assert_eq!(v.get(0), Some(1));
        assert_eq!(v.get(1), None);
        Ok(())
    }

    #[test]
    fn test_cast_strings_to_dates_and_bools() -> Result<()> {
        let frame = Frame::from_columns(vec![
            Column::new("d".into(), &["2024-01-01", "01/02/2024", "soon"]),
            Column::new("b".into(), &["yes", "0", "maybe"]),
        ])?;
        let mut mapping = BTreeMap::new();
        mapping.insert("d".to_owned(), Dtype::Date);
        mapping.insert("b".to_owned(), Dtype::Boolean);
        let out = cast_types(&frame, &mapping)?;

        let d = out.series("d")?;
        assert_eq!(d.dtype(), &DataType::Date);
        assert_eq!(d.null_count(), 1);

        let b = out.series("b")?.bool()?;
        assert_eq!(b.get(0), Some(true));
        assert_eq!(b.get(1), Some(false));
        assert_eq!(b.get(2), None);
        Ok(())
    }

    #[test]
    fn test_parse_integer_accepts_whole_floats() {
        assert_eq!(parse_integer("3.0"), Some(3));
        assert_eq!(parse_integer("3.5"), None);
        assert_eq!(parse_integer("-12"), Some(-12));
        assert_eq!(parse_integer("1e16"), Some(10_000_000_000_000_000));
        assert_eq!(parse_integer("1e19"), None);
    }

    #[test]
    fn test_cast_strings_to_unsigned_keeps_full_range() -> Result<()> {
        let frame = Frame::from_columns(vec![
            Column::new("big".into(), &["18446744073709551615", "9223372036854775808", "-1"]),
            Column::new("small".into(), &["255", "256", "2.0"]),
        ])?;
        let mut mapping = BTreeMap::new();
        mapping.insert("big".to_owned(), Dtype::UInt64);
        mapping.insert("small".to_owned(), Dtype::UInt8);
        let out = cast_types(&frame, &mapping)?;

        let big = out.series("big")?.u64()?;
        assert_eq!(big.get(0), Some(u64::MAX));
        assert_eq!(big.get(1), Some(9_223_372_036_854_775_808));
        assert_eq!(big.get(2), None, "Negative values do not fit an unsigned type");

        let small = out.series("small")?.u8()?;
        assert_eq!(small.get(0), Some(255));
        assert_eq!(small.get(1), None);
        assert_eq!(small.get(2), Some(2));
        Ok(())
    }
}
