//! Table snapshots and the descriptors derived from them.
//!
//! - [`Frame`]: immutable columnar snapshot backed by a polars `DataFrame`
//! - [`Dtype`]: the closed set of column types an operation can name
//! - [`DatasetMetadata`]: row count and column schema, recomputed per operation
//! - [`DatasetPage`]: a window of rows rendered as JSON for display

pub mod dtype;
pub mod frame;
pub mod metadata;

pub use dtype::{Dtype, dtype_label};
pub use frame::Frame;
pub use metadata::{ColumnInfo, DatasetMetadata, DatasetPage};
