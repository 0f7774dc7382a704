use anyhow::{Context as _, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tidyframe::commands;
use tidyframe::config::StoreConfig;
use tidyframe::engine::Operation;
use tidyframe::io::{self, FileFormat};
use tidyframe::store::DatasetStore;

#[derive(Parser)]
#[command(name = "tidyframe", about = "Versioned dataset cleaning and reshaping")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a file, apply a list of operations and optionally export the result
    Run {
        /// File to import (CSV, TSV, Excel, Parquet)
        input: PathBuf,

        /// JSON file holding an array of operations, applied in order
        #[arg(long)]
        ops: PathBuf,

        /// Worksheet to read when the input is a workbook
        #[arg(long)]
        sheet: Option<String>,

        /// Where to write the result; `.parquet` writes Parquet, anything else CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a page of rows as JSON
    Preview {
        input: PathBuf,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Rows to print; 0 uses the configured page size
        #[arg(long, default_value_t = 0)]
        limit: usize,

        #[arg(long)]
        sheet: Option<String>,
    },
    /// Print summary statistics for one column as JSON
    Stats {
        input: PathBuf,

        column: String,

        #[arg(long)]
        sheet: Option<String>,
    },
    /// List the worksheets of a workbook
    Sheets { input: PathBuf },
}

pub async fn run_command(command: Commands) -> Result<()> {
    let store = Arc::new(DatasetStore::new(StoreConfig::load_default()));

    match command {
        Commands::Run {
            input,
            ops,
            sheet,
            output,
        } => handle_run(store, input, ops, sheet, output).await,
        Commands::Preview {
            input,
            offset,
            limit,
            sheet,
        } => {
            import(&store, input, sheet).await?;
            let page = commands::get_current_data(store, offset, limit)
                .await
                .map_err(|e| anyhow!(e))?;
            print_json(&page)
        }
        Commands::Stats {
            input,
            column,
            sheet,
        } => {
            import(&store, input, sheet).await?;
            let stats = commands::get_column_stats(store, column)
                .await
                .map_err(|e| anyhow!(e))?;
            print_json(&stats)
        }
        Commands::Sheets { input } => {
            let sheets = io::list_sheets(&input)
                .with_context(|| format!("Failed to list sheets in {}", input.display()))?;
            print_json(&sheets)
        }
    }
}

async fn handle_run(
    store: Arc<DatasetStore>,
    input: PathBuf,
    ops: PathBuf,
    sheet: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let content = std::fs::read_to_string(&ops)
        .with_context(|| format!("Failed to read operations file {}", ops.display()))?;
    let operations: Vec<Operation> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid operations file {}", ops.display()))?;

    let mut metadata = import(&store, input, sheet).await?;
    for (step, op) in operations.into_iter().enumerate() {
        metadata = commands::apply_operation(Arc::clone(&store), op)
            .await
            .map_err(|e| anyhow!("step {}: {e}", step + 1))?;
    }

    if let Some(output) = output {
        let written = commands::export_data(Arc::clone(&store), output.display().to_string(), None)
            .await
            .map_err(|e| anyhow!(e))?;
        tracing::info!(path = %written, "Wrote result");
    }

    print_json(&metadata)
}

async fn import(
    store: &Arc<DatasetStore>,
    input: PathBuf,
    sheet: Option<String>,
) -> Result<tidyframe::dataset::DatasetMetadata> {
    let format = sheet.map(|name| FileFormat::Excel { sheet: Some(name) });
    commands::import_file(Arc::clone(store), input.display().to_string(), format)
        .await
        .map_err(|e| anyhow!(e))
}

#[expect(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
