//! # Completions Command Implementation
//!
//! Prints a tab-completion script for `provision`, `permissions` and their
//! flags, so `--backend`, `--mode` and `--color` complete to their values.
//!
//! ```bash
//! repo-provision completions bash > ~/.local/share/bash-completion/completions/repo-provision
//! repo-provision completions zsh > ~/.zfunc/_repo-provision
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io;

use crate::cli::Cli;

const BIN_NAME: &str = "repo-provision";

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate the script for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, BIN_NAME, &mut io::stdout());
    Ok(())
}
