//! # tidyframe
//!
//! An in-memory store for one tabular dataset at a time, with a linear
//! undo/redo history of every transformation applied to it.
//!
//! ```no_run
//! use std::path::Path;
//! use tidyframe::config::StoreConfig;
//! use tidyframe::engine::Operation;
//! use tidyframe::store::DatasetStore;
//!
//! # fn example() -> tidyframe::error::Result<()> {
//! let store = DatasetStore::new(StoreConfig::default());
//! store.import(Path::new("sales.csv"), None)?;
//! store.apply(Operation::DropAllNulls)?;
//! store.undo()?;
//! let page = store.page(0, 50)?;
//! println!("{} rows", page.total_rows);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`dataset`]: immutable [`dataset::Frame`] snapshots and their metadata
//! - [`engine`]: the stateless transformation engine and [`engine::Operation`]
//! - [`history`]: bounded undo/redo stack of snapshots
//! - [`stats`]: per-column summary statistics
//! - [`io`]: CSV/TSV/Excel/Parquet import and CSV/Parquet export
//! - [`store`]: [`store::DatasetStore`], the serialized command surface
//! - [`commands`]: async wrappers over the store for an embedding UI
//! - [`config`], [`logging`], [`error`]: ambient plumbing
//!
//! Every operation produces a new snapshot; nothing is edited in place, so a
//! failed operation can never leave a half-applied table behind.

pub mod commands;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod history;
pub mod io;
pub mod logging;
pub mod stats;
pub mod store;
