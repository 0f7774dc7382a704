//! Stateless transformation engine.
//!
//! [`apply`] maps a [`Frame`] and an [`Operation`] to a new `Frame`. The input
//! is never modified, so a failed operation leaves the caller's snapshot
//! exactly as it was.
//!
//! - `columns`: select, drop, rename, cast
//! - `nulls`: drop rows with nulls, fill nulls
//! - `rows`: sort, SQL filter
//! - `reshape`: pivot, unpivot
//! - `rolling`: windowed statistics

pub mod columns;
pub mod nulls;
pub mod operation;
pub mod reshape;
pub mod rolling;
pub mod rows;

pub use operation::{FillStrategy, Operation, PivotAggregate, RollingKind, RollingSpec};

use crate::dataset::Frame;
use crate::error::{Result, TidyError};

/// Applies one operation.
///
/// `Import` is not a frame transformation; it is loaded by the io layer and
/// rejected here.
pub fn apply(frame: &Frame, op: &Operation) -> Result<Frame> {
    match op {
        Operation::Import { .. } => Err(TidyError::validation(
            "import is not a transformation; load the file instead",
        )),
        Operation::DropNulls { subset } => nulls::drop_nulls(frame, subset.as_deref()),
        Operation::DropAllNulls => nulls::drop_all_nulls(frame),
        Operation::SelectColumns { columns } => columns::select_columns(frame, columns),
        Operation::DropColumns { columns } => columns::drop_columns(frame, columns),
        Operation::RenameColumns { mapping } => columns::rename_columns(frame, mapping),
        Operation::CastTypes { mapping } => columns::cast_types(frame, mapping),
        Operation::Sort {
            column,
            descending,
            nulls_last,
        } => rows::sort(frame, column, *descending, *nulls_last),
        Operation::Filter { expression } => rows::filter(frame, expression),
        Operation::FillNull { strategy, columns } => {
            nulls::fill_null(frame, strategy, columns.as_deref())
        }
        Operation::Pivot {
            index,
            columns,
            values,
            aggregate,
        } => reshape::pivot(frame, index, columns, values, *aggregate),
        Operation::Unpivot {
            id_vars,
            value_vars,
            variable_name,
            value_name,
            sort_by,
        } => reshape::unpivot(
            frame,
            id_vars,
            value_vars,
            variable_name.as_deref(),
            value_name.as_deref(),
            sort_by.as_deref(),
        ),
        Operation::Rolling(spec) => rolling::rolling(frame, spec),
    }
}
