//! Row-level operations: sort and filter.

use crate::dataset::Frame;
use crate::error::{Result, TidyError};
use polars::prelude::*;
use polars::sql::sql_expr;

/// Stable sort on one column with explicit null placement.
pub fn sort(frame: &Frame, column: &str, descending: bool, nulls_last: bool) -> Result<Frame> {
    frame.require_columns(&[column])?;

    let df = frame
        .as_polars()
        .clone()
        .lazy()
        .sort_by_exprs(
            vec![col(column)],
            SortMultipleOptions::default()
                .with_order_descending(descending)
                .with_nulls_last(nulls_last)
                .with_maintain_order(true),
        )
        .collect()?;

    Frame::new(df)
}

/// Keeps the rows for which the SQL predicate holds.
///
/// `expression` is anything valid after `WHERE`, evaluated against the
/// frame's own columns. It must be one complete expression; trailing clauses
/// such as `LIMIT` are rejected.
pub fn filter(frame: &Frame, expression: &str) -> Result<Frame> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(TidyError::validation("filter expression must not be empty"));
    }
    let invalid = |e: PolarsError| match TidyError::from(e) {
        TidyError::Schema(msg) => TidyError::Schema(msg),
        other => TidyError::parse(format!("invalid filter expression '{expression}': {other}")),
    };

    // The parser stops after one expression; the outer parentheses make it
    // consume the whole input.
    if !parentheses_balanced(expression) {
        return Err(TidyError::parse(format!(
            "invalid filter expression '{expression}': unbalanced parentheses"
        )));
    }
    let predicate = sql_expr(format!("({expression})")).map_err(invalid)?;

    let df = frame
        .as_polars()
        .clone()
        .lazy()
        .filter(predicate)
        .collect()
        .map_err(invalid)?;

    Frame::new(df)
}

/// True when every `)` outside quotes closes an earlier `(`.
fn parentheses_balanced(expression: &str) -> bool {
    let mut depth = 0usize;
    let mut quote = None;
    for c in expression.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            (None, _) => {}
        }
    }
    depth == 0 && quote.is_none()
}
