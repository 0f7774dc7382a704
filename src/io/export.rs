use super::ExportFormat;
use crate::dataset::Frame;
use crate::error::{Result, ResultExt as _};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Writes `frame` to `path`; the format follows the extension when not given.
pub fn export(frame: &Frame, path: &Path, format: Option<ExportFormat>) -> Result<PathBuf> {
    let format = format.unwrap_or_else(|| ExportFormat::from_path(path));
    let mut df = frame.as_polars().clone();

    match format {
        ExportFormat::Parquet => {
            let file = File::create(path).context("Failed to create Parquet file")?;
            ParquetWriter::new(file)
                .finish(&mut df)
                .context("Failed to write Parquet file")?;
        }
        ExportFormat::Csv => {
            let file = File::create(path).context("Failed to create CSV file")?;
            CsvWriter::new(file)
                .include_header(true)
                .finish(&mut df)
                .context("Failed to write CSV file")?;
        }
    }

    tracing::info!(path = %path.display(), ?format, rows = df.height(), "Exported dataset");
    Ok(path.to_path_buf())
}
