//! File import and export.
//!
//! Imports detect their format from the file extension unless one is given.
//! CSV files additionally have their delimiter sniffed from the first lines.

pub mod export;
pub mod loader;

pub use export::export;
pub use loader::{LoadOptions, list_sheets, load};

use crate::error::{Result, TidyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Source format of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileFormat {
    Csv,
    Tsv,
    Excel {
        #[serde(default)]
        sheet: Option<String>,
    },
    Parquet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match extension(path).as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Excel { sheet: None }),
            "parquet" | "pq" => Ok(Self::Parquet),
            other => Err(TidyError::validation(format!(
                "unsupported import file extension: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Tsv => f.write_str("tsv"),
            Self::Excel { sheet: Some(sheet) } => write!(f, "excel ({sheet})"),
            Self::Excel { sheet: None } => f.write_str("excel"),
            Self::Parquet => f.write_str("parquet"),
        }
    }
}

/// Target format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    /// Parquet for `.parquet`/`.pq`, CSV for anything else.
    pub fn from_path(path: &Path) -> Self {
        match extension(path).as_str() {
            "parquet" | "pq" => Self::Parquet,
            _ => Self::Csv,
        }
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}
