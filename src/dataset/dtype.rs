//! The closed set of column types an operation can name.

use crate::error::{Result, TidyError};
use polars::prelude::{DataType, TimeUnit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column data type as exposed to callers.
///
/// Temporal types with a unit (`Datetime`, `Duration`) are always microsecond
/// based when produced by a cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dtype {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Boolean,
    Date,
    Datetime,
    Time,
    Duration,
}

impl Dtype {
    pub const ALL: [Self; 16] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
        Self::String,
        Self::Boolean,
        Self::Date,
        Self::Datetime,
        Self::Time,
        Self::Duration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Datetime => "Datetime",
            Self::Time => "Time",
            Self::Duration => "Duration",
        }
    }

    pub fn to_polars(self) -> DataType {
        match self {
            Self::Int8 => DataType::Int8,
            Self::Int16 => DataType::Int16,
            Self::Int32 => DataType::Int32,
            Self::Int64 => DataType::Int64,
            Self::UInt8 => DataType::UInt8,
            Self::UInt16 => DataType::UInt16,
            Self::UInt32 => DataType::UInt32,
            Self::UInt64 => DataType::UInt64,
            Self::Float32 => DataType::Float32,
            Self::Float64 => DataType::Float64,
            Self::String => DataType::String,
            Self::Boolean => DataType::Boolean,
            Self::Date => DataType::Date,
            Self::Datetime => DataType::Datetime(TimeUnit::Microseconds, None),
            Self::Time => DataType::Time,
            Self::Duration => DataType::Duration(TimeUnit::Microseconds),
        }
    }

    /// Maps a polars type back into the closed set; `None` for nested and
    /// categorical types.
    pub fn from_polars(dtype: &DataType) -> Option<Self> {
        let mapped = match dtype {
            DataType::Int8 => Self::Int8,
            DataType::Int16 => Self::Int16,
            DataType::Int32 => Self::Int32,
            DataType::Int64 => Self::Int64,
            DataType::UInt8 => Self::UInt8,
            DataType::UInt16 => Self::UInt16,
            DataType::UInt32 => Self::UInt32,
            DataType::UInt64 => Self::UInt64,
            DataType::Float32 => Self::Float32,
            DataType::Float64 => Self::Float64,
            DataType::String => Self::String,
            DataType::Boolean => Self::Boolean,
            DataType::Date => Self::Date,
            DataType::Datetime(_, _) => Self::Datetime,
            DataType::Time => Self::Time,
            DataType::Duration(_) => Self::Duration,
            _ => return None,
        };
        Some(mapped)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }
}

/// Display name for any polars type, using the closed-set name when one exists.
pub fn dtype_label(dtype: &DataType) -> String {
    Dtype::from_polars(dtype).map_or_else(|| format!("{dtype:?}"), |d| d.as_str().to_owned())
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dtype {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        let alias = match lowered.as_str() {
            "utf8" | "str" | "text" => Some(Self::String),
            "bool" => Some(Self::Boolean),
            _ => None,
        };

        alias
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|d| d.as_str().eq_ignore_ascii_case(&lowered))
            })
            .ok_or_else(|| TidyError::validation(format!("unsupported dtype: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_aliases() -> Result<()> {
        assert_eq!("Int64".parse::<Dtype>()?, Dtype::Int64);
        assert_eq!("float32".parse::<Dtype>()?, Dtype::Float32);
        assert_eq!("Utf8".parse::<Dtype>()?, Dtype::String);
        assert_eq!("bool".parse::<Dtype>()?, Dtype::Boolean);
        assert!("Decimal".parse::<Dtype>().is_err());
        Ok(())
    }

    #[test]
    fn test_polars_round_trip() {
        for dtype in Dtype::ALL {
            assert_eq!(Dtype::from_polars(&dtype.to_polars()), Some(dtype));
        }
    }

    #[test]
    fn test_serde_uses_names() -> anyhow::Result<()> {
        let json = serde_json::to_string(&Dtype::UInt16)?;
        assert_eq!(json, "\"UInt16\"");
        Ok(())
    }
}
