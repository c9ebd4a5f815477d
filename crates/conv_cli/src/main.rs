//! textconv - batch text encoding converter
//!
//! The CLI host around conv_core: expands directories, applies the
//! persisted extension filter, runs conversion jobs, and renders progress
//! and the final report.

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    conv_log::init_logging(args.log_file)?;
    cli::run(args)
}
