//! # tidyframe command-line driver
//!
//! Runs a pipeline of operations against a file without a UI:
//!
//! ```bash
//! tidyframe run sales.csv --ops ops.json --output clean.parquet
//! tidyframe preview sales.xlsx --sheet Q1 --limit 20
//! tidyframe stats sales.csv revenue
//! tidyframe sheets sales.xlsx
//! ```
//!
//! JSON results go to stdout; logs go to stderr and the log directory.

#![warn(clippy::all, rust_2018_idioms)]

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    tidyframe::logging::init().context("Failed to initialize logging")?;

    tokio::runtime::Runtime::new()
        .context("Failed to start async runtime")?
        .block_on(cli::run_command(cli.command))
}
