use super::FileFormat;
use crate::dataset::Frame;
use crate::engine::columns::parse_datetime;
use crate::error::{Result, TidyError};
use calamine::{Data, DataType as _, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead as _, BufReader};
use std::path::Path;

const SEPARATOR_CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Reader settings taken from the store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub infer_schema_length: usize,
    pub sniff_lines: usize,
    pub try_parse_dates: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            infer_schema_length: 10_000,
            sniff_lines: 10,
            try_parse_dates: true,
        }
    }
}

/// Loads `path` into a frame, detecting the format from the extension when
/// `format` is `None`.
pub fn load(path: &Path, format: Option<&FileFormat>, opts: &LoadOptions) -> Result<Frame> {
    if !path.is_file() {
        return Err(TidyError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file not found: {}", path.display()),
        )));
    }

    let format = match format {
        Some(f) => f.clone(),
        None => FileFormat::from_path(path)?,
    };

    let df = match &format {
        FileFormat::Csv => {
            let separator = detect_separator(path, opts.sniff_lines)?;
            read_delimited(path, separator, opts)?
        }
        FileFormat::Tsv => read_delimited(path, b'\t', opts)?,
        FileFormat::Parquet => ParquetReader::new(File::open(path)?)
            .finish()
            .map_err(|e| source_error(path, e))?,
        FileFormat::Excel { sheet } => read_excel(path, sheet.as_deref())?,
    };

    tracing::debug!(
        path = %path.display(),
        %format,
        rows = df.height(),
        columns = df.width(),
        "Loaded dataset"
    );
    Frame::new(df)
}

fn read_delimited(path: &Path, separator: u8, opts: &LoadOptions) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(opts.infer_schema_length))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_try_parse_dates(opts.try_parse_dates),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| source_error(path, e))
}

/// Reader failures are parse errors unless the file itself could not be read.
fn source_error(path: &Path, err: PolarsError) -> TidyError {
    match TidyError::from(err) {
        TidyError::Io(e) => TidyError::Io(e),
        other => TidyError::parse(format!("failed to read {}: {other}", path.display())),
    }
}

/// Picks the separator whose per-line field count is most consistent across
/// the first `sample` lines, requiring at least two fields on average.
///
/// Lines are decoded lossily; encoding problems surface when the file is
/// parsed, not here.
pub fn detect_separator(path: &Path, sample: usize) -> Result<u8> {
    let reader = BufReader::new(File::open(path)?);
    let lines: Vec<String> = reader
        .split(b'\n')
        .take(sample.max(1))
        .map(|line| {
            line.map(|bytes| String::from_utf8_lossy(&bytes).trim_end_matches('\r').to_owned())
        })
        .collect::<std::io::Result<_>>()?;

    Ok(sniff_separator(&lines))
}

/// Fields on one line when split on `sep`, ignoring separators inside
/// double-quoted fields.
fn field_count(line: &str, sep: u8) -> usize {
    let mut quoted = false;
    let mut fields = 1;
    for b in line.bytes() {
        if b == b'"' {
            quoted = !quoted;
        } else if b == sep && !quoted {
            fields += 1;
        }
    }
    fields
}

fn sniff_separator(lines: &[String]) -> u8 {
    if lines.len() < 2 {
        return b',';
    }

    let mut best = b',';
    let mut best_variance = f64::MAX;
    for sep in SEPARATOR_CANDIDATES {
        let counts: Vec<f64> = lines
            .iter()
            .map(|line| field_count(line, sep) as f64)
            .collect();
        let n = counts.len() as f64;
        let mean = counts.iter().sum::<f64>() / n;
        let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;

        if mean >= 2.0 && variance < best_variance {
            best = sep;
            best_variance = variance;
        }
    }

    tracing::debug!(separator = %(best as char).escape_default(), "Detected CSV separator");
    best
}

/// Sheet names of a workbook, in workbook order.
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path)?;
    Ok(workbook.sheet_names())
}

fn read_excel(path: &Path, sheet: Option<&str>) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();

    let chosen = match sheet {
        Some(name) if names.iter().any(|n| n == name) => name.to_owned(),
        Some(name) => {
            return Err(TidyError::validation(format!(
                "sheet {name:?} not found; available sheets: {}",
                names.join(", ")
            )));
        }
        None => match names.as_slice() {
            [] => return Err(TidyError::parse("workbook has no worksheets")),
            [only] => only.clone(),
            many => {
                return Err(TidyError::validation(format!(
                    "workbook has several sheets, choose one of: {}",
                    many.join(", ")
                )));
            }
        },
    };

    let range = workbook.worksheet_range(&chosen)?;
    let rows: Vec<&[Data]> = range.rows().collect();
    let Some((header, body)) = rows.split_first() else {
        return Err(TidyError::parse(format!("sheet {chosen:?} is empty")));
    };

    let names = header_names(header);
    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<Option<&Data>> = body.iter().map(|row| row.get(idx)).collect();
            excel_column(name, &cells).map(Column::from)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DataFrame::new(columns)?)
}

/// Header labels with blanks named `column_<n>` and repeats suffixed.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = cell
                .as_string()
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("column_{}", idx + 1));
            let mut name = base.clone();
            let mut n = 2;
            while !seen.insert(name.clone()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            name
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExcelKind {
    Int,
    Float,
    Bool,
    Datetime,
    Text,
}

fn infer_kind(cells: &[Option<&Data>]) -> ExcelKind {
    let present: Vec<&Data> = cells.iter().flatten().copied().filter(|c| !c.is_empty()).collect();
    if present.is_empty() {
        return ExcelKind::Text;
    }

    let all = |pred: fn(&Data) -> bool| present.iter().all(|c| pred(c));

    if all(|c| c.is_bool()) {
        ExcelKind::Bool
    } else if all(|c| c.is_datetime() || c.is_datetime_iso()) {
        ExcelKind::Datetime
    } else if all(|c| c.is_int() || c.as_f64().is_some_and(|f| c.is_float() && f.fract() == 0.0)) {
        ExcelKind::Int
    } else if all(|c| c.is_int() || c.is_float()) {
        ExcelKind::Float
    } else {
        ExcelKind::Text
    }
}

fn excel_column(name: &str, cells: &[Option<&Data>]) -> Result<Series> {
    let name: PlSmallStr = name.into();
    let series = match infer_kind(cells) {
        ExcelKind::Int => {
            let v: Vec<Option<i64>> = cells.iter().map(|c| c.and_then(|cell| cell.as_i64())).collect();
            Series::new(name, v)
        }
        ExcelKind::Float => {
            let v: Vec<Option<f64>> = cells.iter().map(|c| c.and_then(|cell| cell.as_f64())).collect();
            Series::new(name, v)
        }
        ExcelKind::Bool => {
            let v: Vec<Option<bool>> = cells.iter().map(|c| c.and_then(|cell| cell.get_bool())).collect();
            Series::new(name, v)
        }
        ExcelKind::Datetime => {
            let v: Vec<Option<i64>> = cells
                .iter()
                .map(|c| c.and_then(cell_datetime).map(|dt| dt.and_utc().timestamp_micros()))
                .collect();
            Series::new(name, v).cast(&DataType::Datetime(TimeUnit::Microseconds, None))?
        }
        ExcelKind::Text => {
            let v: Vec<Option<String>> = cells
                .iter()
                .map(|c| c.filter(|cell| !cell.is_empty()).and_then(|cell| cell.as_string()))
                .collect();
            Series::new(name, v)
        }
    };
    Ok(series)
}

fn cell_datetime(cell: &Data) -> Option<NaiveDateTime> {
    cell.as_datetime()
        .or_else(|| cell.get_datetime_iso().and_then(parse_datetime))
}
