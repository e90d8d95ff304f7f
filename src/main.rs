//! # repo-provision CLI
//!
//! Binary entry point. Parses arguments with `clap` and hands off to the
//! matching command; all real work lives in the `repo_provision` library.
//!
//! Exit codes: 0 on success (including runs where individual repositories
//! were skipped or failed) and for `--help`/`--version`; 1 on invalid
//! command-line usage and on startup errors such as a missing list file,
//! missing token, missing document or missing merge backend.

mod cli;
mod commands;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;

/// Exit code for every failure, usage errors included.
const EXIT_FAILURE: i32 = 1;

fn main() -> Result<()> {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(EXIT_FAILURE);
        }
    };
    cli.execute()
}
