//! Async command surface for an embedding UI.
//!
//! Every command runs its store call on tokio's blocking pool so a long
//! import or scan never stalls the caller's event loop. Errors come back as
//! display strings prefixed with what was being attempted.

use crate::dataset::{DatasetMetadata, DatasetPage};
use crate::engine::Operation;
use crate::error::Result;
use crate::history::HistoryEntryInfo;
use crate::io::{ExportFormat, FileFormat};
use crate::stats::ColumnStats;
use crate::store::DatasetStore;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

async fn run_blocking<T, F>(label: String, f: F) -> std::result::Result<T, String>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| format!("{label}: worker task failed: {e}"))?
        .map_err(|e| format!("{label}: {e}"))
}

pub async fn import_file(
    store: Arc<DatasetStore>,
    path: String,
    format: Option<FileFormat>,
) -> std::result::Result<DatasetMetadata, String> {
    let label = format!("Import {path}");
    run_blocking(label, move || store.import(&PathBuf::from(path), format)).await
}

pub async fn apply_operation(
    store: Arc<DatasetStore>,
    operation: Operation,
) -> std::result::Result<DatasetMetadata, String> {
    run_blocking(operation.description(), move || store.apply(operation)).await
}

pub async fn get_current_data(
    store: Arc<DatasetStore>,
    offset: usize,
    limit: usize,
) -> std::result::Result<DatasetPage, String> {
    run_blocking("Load rows".to_owned(), move || store.page(offset, limit)).await
}

pub async fn get_column_stats(
    store: Arc<DatasetStore>,
    column: String,
) -> std::result::Result<ColumnStats, String> {
    let label = format!("Column statistics for {column}");
    run_blocking(label, move || store.column_stats(&column)).await
}

pub async fn export_data(
    store: Arc<DatasetStore>,
    path: String,
    format: Option<ExportFormat>,
) -> std::result::Result<String, String> {
    let label = format!("Export to {path}");
    run_blocking(label, move || {
        store
            .export(&PathBuf::from(path), format)
            .map(|p| p.display().to_string())
    })
    .await
}

pub async fn undo(store: Arc<DatasetStore>) -> std::result::Result<DatasetMetadata, String> {
    run_blocking("Undo".to_owned(), move || store.undo()).await
}

pub async fn redo(store: Arc<DatasetStore>) -> std::result::Result<DatasetMetadata, String> {
    run_blocking("Redo".to_owned(), move || store.redo()).await
}

pub async fn jump_to_history(
    store: Arc<DatasetStore>,
    entry_id: String,
) -> std::result::Result<DatasetMetadata, String> {
    let label = format!("Jump to history entry {entry_id}");
    let id = Uuid::parse_str(&entry_id).map_err(|e| format!("{label}: {e}"))?;
    run_blocking(label, move || store.jump_to(id)).await
}

pub async fn reset_to_initial(
    store: Arc<DatasetStore>,
) -> std::result::Result<DatasetMetadata, String> {
    run_blocking("Reset to initial import".to_owned(), move || {
        store.reset_to_initial()
    })
    .await
}

pub async fn clear_data(store: Arc<DatasetStore>) -> std::result::Result<(), String> {
    run_blocking("Clear dataset".to_owned(), move || store.clear()).await
}

pub async fn can_undo(store: Arc<DatasetStore>) -> std::result::Result<bool, String> {
    run_blocking("Check undo".to_owned(), move || store.can_undo()).await
}

pub async fn can_redo(store: Arc<DatasetStore>) -> std::result::Result<bool, String> {
    run_blocking("Check redo".to_owned(), move || store.can_redo()).await
}

pub async fn get_history(
    store: Arc<DatasetStore>,
) -> std::result::Result<Vec<HistoryEntryInfo>, String> {
    run_blocking("List history".to_owned(), move || store.history()).await
}

pub async fn get_current_index(
    store: Arc<DatasetStore>,
) -> std::result::Result<Option<usize>, String> {
    run_blocking("Current history index".to_owned(), move || {
        store.current_index()
    })
    .await
}

pub async fn get_current_info(
    store: Arc<DatasetStore>,
) -> std::result::Result<Option<DatasetMetadata>, String> {
    run_blocking("Current dataset info".to_owned(), move || {
        store.current_metadata()
    })
    .await
}
