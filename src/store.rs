//! The single mutable root of a session.
//!
//! [`DatasetStore`] owns the [`HistoryStack`] behind a mutex. Every command
//! takes the lock for its whole duration, so mutations are serialized and
//! reads always see a complete snapshot. A failing command leaves the history
//! exactly as it found it.

use crate::config::StoreConfig;
use crate::dataset::{DatasetMetadata, DatasetPage, Frame};
use crate::engine::{self, Operation, rolling};
use crate::error::{Result, TidyError};
use crate::history::{HistoryEntry, HistoryEntryInfo, HistoryStack};
use crate::io::{self, ExportFormat, FileFormat};
use crate::stats::{self, ColumnStats};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug)]
pub struct DatasetStore {
    config: StoreConfig,
    history: Mutex<HistoryStack>,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl DatasetStore {
    pub fn new(config: StoreConfig) -> Self {
        let history = HistoryStack::new(config.max_history);
        Self {
            config,
            history: Mutex::new(history),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HistoryStack>> {
        self.history
            .lock()
            .map_err(|e| TidyError::Other(format!("Lock poisoned: {e}")))
    }

    /// Loads a file as a new dataset, replacing the whole history.
    pub fn import(&self, path: &Path, format: Option<FileFormat>) -> Result<DatasetMetadata> {
        let mut history = self.lock()?;

        let frame = io::load(path, format.as_ref(), &self.config.load_options()).inspect_err(|e| {
            tracing::warn!(path = %path.display(), kind = e.kind(), error = %e, "Import failed");
        })?;
        let metadata = DatasetMetadata::for_import(&frame, path);
        let operation = Operation::Import {
            file_path: path.display().to_string(),
            format,
        };

        history.clear();
        history.push(HistoryEntry::new(operation, frame, metadata.clone()));

        tracing::info!(
            dataset = %metadata.id,
            name = %metadata.name,
            rows = metadata.row_count,
            columns = metadata.column_count(),
            "Imported dataset"
        );
        Ok(metadata)
    }

    /// Applies `op` to the current snapshot and records the result.
    pub fn apply(&self, op: Operation) -> Result<DatasetMetadata> {
        let mut history = self.lock()?;
        let current = history.current().ok_or(TidyError::NoDataset)?;

        let outcome = validate_request(&op, &current.frame).and_then(|()| engine::apply(&current.frame, &op));
        let frame = match outcome {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    operation = op.kind(),
                    description = %op,
                    kind = e.kind(),
                    error = %e,
                    "Operation rejected"
                );
                return Err(e);
            }
        };

        let metadata = current.metadata.derive(&frame);
        let operation = op.kind();
        let entry = HistoryEntry::new(op, frame, metadata.clone());
        tracing::info!(
            entry = %entry.id,
            operation,
            description = %entry.description,
            rows = metadata.row_count,
            columns = metadata.column_count(),
            "Recorded history entry"
        );

        history.push(entry);
        Ok(metadata)
    }

    /// Rows `[offset, offset + limit)` of the current snapshot; a zero limit
    /// means the configured page size.
    pub fn page(&self, offset: usize, limit: usize) -> Result<DatasetPage> {
        let limit = if limit == 0 {
            self.config.default_page_size
        } else {
            limit
        };
        self.with_current(|frame| Ok(DatasetPage::from_frame(frame, offset, limit)))
    }

    pub fn column_stats(&self, column: &str) -> Result<ColumnStats> {
        self.with_current(|frame| stats::column_stats(frame, column))
    }

    pub fn export(&self, path: &Path, format: Option<ExportFormat>) -> Result<PathBuf> {
        self.with_current(|frame| io::export(frame, path, format))
    }

    pub fn undo(&self) -> Result<DatasetMetadata> {
        let mut history = self.lock()?;
        let metadata = history.undo()?.metadata.clone();
        tracing::info!(cursor = ?history.cursor(), "Undo");
        Ok(metadata)
    }

    pub fn redo(&self) -> Result<DatasetMetadata> {
        let mut history = self.lock()?;
        let metadata = history.redo()?.metadata.clone();
        tracing::info!(cursor = ?history.cursor(), "Redo");
        Ok(metadata)
    }

    pub fn jump_to(&self, entry_id: Uuid) -> Result<DatasetMetadata> {
        let mut history = self.lock()?;
        let metadata = history.jump_to(entry_id)?.metadata.clone();
        tracing::info!(entry = %entry_id, cursor = ?history.cursor(), "Jumped to history entry");
        Ok(metadata)
    }

    pub fn reset_to_initial(&self) -> Result<DatasetMetadata> {
        let mut history = self.lock()?;
        let metadata = history.reset_to_initial()?.metadata.clone();
        tracing::info!("Reset to initial import");
        Ok(metadata)
    }

    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        tracing::info!("Cleared dataset");
        Ok(())
    }

    pub fn can_undo(&self) -> Result<bool> {
        Ok(self.lock()?.can_undo())
    }

    pub fn can_redo(&self) -> Result<bool> {
        Ok(self.lock()?.can_redo())
    }

    pub fn history(&self) -> Result<Vec<HistoryEntryInfo>> {
        Ok(self.lock()?.entries_info())
    }

    pub fn current_index(&self) -> Result<Option<usize>> {
        Ok(self.lock()?.cursor())
    }

    pub fn current_metadata(&self) -> Result<Option<DatasetMetadata>> {
        Ok(self.lock()?.current().map(|e| e.metadata.clone()))
    }

    pub fn history_len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Runs `f` on the current snapshot while holding the lock.
    fn with_current<T>(&self, f: impl FnOnce(&Frame) -> Result<T>) -> Result<T> {
        let history = self.lock()?;
        let current = history.current().ok_or(TidyError::NoDataset)?;
        f(&current.frame)
    }
}

/// Checks that only matter to an interactive caller, before the engine runs.
fn validate_request(op: &Operation, frame: &Frame) -> Result<()> {
    match op {
        Operation::Import { .. } => Err(TidyError::validation(
            "imports replace the dataset; use import instead of apply",
        )),
        Operation::SelectColumns { columns } => {
            if columns.is_empty() {
                return Err(TidyError::validation("select at least one column"));
            }
            let picked: HashSet<&str> = columns.iter().map(String::as_str).collect();
            if picked.len() >= frame.width() && frame.column_names().iter().all(|c| picked.contains(c.as_str())) {
                return Err(TidyError::validation(
                    "selecting every column changes nothing; pick a subset",
                ));
            }
            Ok(())
        }
        Operation::DropColumns { columns } => {
            if columns.is_empty() {
                return Err(TidyError::validation("choose at least one column to drop"));
            }
            let dropped: HashSet<&str> = columns.iter().map(String::as_str).collect();
            if frame.column_names().iter().all(|c| dropped.contains(c.as_str())) {
                return Err(TidyError::validation("at least one column must remain"));
            }
            Ok(())
        }
        Operation::RenameColumns { mapping } if mapping.is_empty() => {
            Err(TidyError::validation("rename needs at least one column"))
        }
        Operation::CastTypes { mapping } if mapping.is_empty() => {
            Err(TidyError::validation("cast needs at least one column"))
        }
        Operation::Filter { expression } if expression.trim().is_empty() => {
            Err(TidyError::validation("filter expression must not be empty"))
        }
        Operation::Unpivot { value_vars, .. } if value_vars.is_empty() => {
            Err(TidyError::validation("unpivot needs at least one value column"))
        }
        Operation::DropNulls { subset: Some(cols) } if cols.is_empty() => {
            Err(TidyError::validation("choose at least one column to check for nulls"))
        }
        Operation::FillNull { columns: Some(cols), .. } if cols.is_empty() => {
            Err(TidyError::validation("choose at least one column to fill"))
        }
        Operation::Rolling(spec) => rolling::validate(spec),
        _ => Ok(()),
    }
}
