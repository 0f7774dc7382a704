//! Serializable descriptors for every transformation the engine knows.

use crate::dataset::Dtype;
use crate::io::FileFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A single transformation request.
///
/// Operations double as the replay log and as the source of the
/// human-readable label recorded in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Import {
        file_path: String,
        #[serde(default)]
        format: Option<FileFormat>,
    },
    DropNulls {
        #[serde(default)]
        subset: Option<Vec<String>>,
    },
    DropAllNulls,
    SelectColumns {
        columns: Vec<String>,
    },
    DropColumns {
        columns: Vec<String>,
    },
    RenameColumns {
        mapping: BTreeMap<String, String>,
    },
    CastTypes {
        mapping: BTreeMap<String, Dtype>,
    },
    Sort {
        column: String,
        #[serde(default)]
        descending: bool,
        #[serde(default = "default_nulls_last")]
        nulls_last: bool,
    },
    Filter {
        expression: String,
    },
    FillNull {
        strategy: FillStrategy,
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    Pivot {
        index: Vec<String>,
        columns: String,
        values: String,
        #[serde(default)]
        aggregate: PivotAggregate,
    },
    Unpivot {
        id_vars: Vec<String>,
        value_vars: Vec<String>,
        #[serde(default)]
        variable_name: Option<String>,
        #[serde(default)]
        value_name: Option<String>,
        #[serde(default)]
        sort_by: Option<String>,
    },
    Rolling(RollingSpec),
}

fn default_nulls_last() -> bool {
    true
}

/// How `FillNull` picks replacement values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillStrategy {
    Forward,
    Backward,
    Min,
    Max,
    Mean,
    Median,
    Zero,
    One,
    Constant { value: String },
}

impl FillStrategy {
    /// Strategies that only make sense on numeric columns.
    pub fn numeric_only(&self) -> bool {
        matches!(self, Self::Min | Self::Max | Self::Mean | Self::Median)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Zero => "zero",
            Self::One => "one",
            Self::Constant { .. } => "constant",
        }
    }
}

/// Aggregate applied to each pivot cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotAggregate {
    #[default]
    First,
    Last,
    Sum,
    Mean,
    Min,
    Max,
    Count,
}

impl PivotAggregate {
    pub fn label(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
        }
    }
}

/// Statistic computed over each rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stat", rename_all = "snake_case")]
pub enum RollingKind {
    Sum,
    #[serde(alias = "mean")]
    Average,
    Median,
    Min,
    Max,
    Std,
    Var,
    Quantile { quantile: f64 },
}

impl RollingKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "mean",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
            Self::Std => "std",
            Self::Var => "var",
            Self::Quantile { .. } => "quantile",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingSpec {
    pub kind: RollingKind,
    pub column: String,
    pub window_size: usize,
    #[serde(default)]
    pub center: bool,
    #[serde(default)]
    pub min_periods: Option<usize>,
}

impl RollingSpec {
    pub fn effective_min_periods(&self) -> usize {
        self.min_periods.unwrap_or(1)
    }

    /// Name of the derived column.
    pub fn output_name(&self) -> String {
        match self.kind {
            RollingKind::Quantile { quantile } => {
                format!("{}_rolling_quantile_{quantile}", self.column)
            }
            kind => format!("{}_rolling_{}", self.column, kind.label()),
        }
    }
}

impl Operation {
    /// Short machine-friendly name of the variant, matching its JSON `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Import { .. } => "import",
            Self::DropNulls { .. } => "drop_nulls",
            Self::DropAllNulls => "drop_all_nulls",
            Self::SelectColumns { .. } => "select_columns",
            Self::DropColumns { .. } => "drop_columns",
            Self::RenameColumns { .. } => "rename_columns",
            Self::CastTypes { .. } => "cast_types",
            Self::Sort { .. } => "sort",
            Self::Filter { .. } => "filter",
            Self::FillNull { .. } => "fill_null",
            Self::Pivot { .. } => "pivot",
            Self::Unpivot { .. } => "unpivot",
            Self::Rolling(_) => "rolling",
        }
    }

    /// Human-readable label recorded with the history entry.
    pub fn description(&self) -> String {
        match self {
            Self::Import { file_path, .. } => {
                let file_name = Path::new(file_path)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown file");
                format!("Import file: {file_name}")
            }
            Self::DropNulls { subset: Some(cols) } => {
                format!("Drop rows with nulls (checking {} columns)", cols.len())
            }
            Self::DropNulls { subset: None } => {
                "Drop rows with nulls (checking all columns)".to_owned()
            }
            Self::DropAllNulls => "Drop fully empty rows".to_owned(),
            Self::SelectColumns { columns } => format!("Select columns ({})", columns.len()),
            Self::DropColumns { columns } => format!("Drop columns ({})", columns.len()),
            Self::RenameColumns { mapping } => format!("Rename columns ({})", mapping.len()),
            Self::CastTypes { mapping } => format!("Cast column types ({})", mapping.len()),
            Self::Sort {
                column,
                descending,
                nulls_last,
            } => format!(
                "Sort by {column} ({}, nulls {})",
                if *descending { "descending" } else { "ascending" },
                if *nulls_last { "last" } else { "first" }
            ),
            Self::Filter { expression } => format!("Filter rows: {expression}"),
            Self::FillNull { strategy, columns } => match columns {
                Some(cols) => format!("Fill nulls ({}, {} columns)", strategy.label(), cols.len()),
                None => format!("Fill nulls ({}, all columns)", strategy.label()),
            },
            Self::Pivot {
                index,
                columns,
                values,
                aggregate,
            } => format!(
                "Pivot (index: {}, columns: {columns}, values: {values}, aggregate: {})",
                index.join(", "),
                aggregate.label()
            ),
            Self::Unpivot {
                id_vars,
                value_vars,
                sort_by,
                ..
            } => {
                let base = format!(
                    "Unpivot (id columns: {}, value columns: {})",
                    id_vars.len(),
                    value_vars.len()
                );
                match sort_by {
                    Some(col) => format!("{base} [sorted by {col}]"),
                    None => base,
                }
            }
            Self::Rolling(spec) => {
                let centered = if spec.center { "yes" } else { "no" };
                let quantile = match spec.kind {
                    RollingKind::Quantile { quantile } => format!(", quantile: {quantile}"),
                    _ => String::new(),
                };
                format!(
                    "Rolling {} (column: {}, window: {}{quantile}, centered: {centered}, min periods: {})",
                    spec.kind.label(),
                    spec.column,
                    spec.window_size,
                    spec.effective_min_periods()
                )
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
