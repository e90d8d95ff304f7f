//! Permissions command implementation
//!
//! Grants every listed repository the selected permission set under
//! `customizations.codespaces.repositories` of the dev container document.
//! With `--dry-run` the merged document is printed to stdout; otherwise it
//! replaces the file atomically. Nothing is written when the merge changes
//! nothing.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use repo_provision::defaults;
use repo_provision::document;
use repo_provision::error::Error;
use repo_provision::merge::{self, Backend};
use repo_provision::output::{OutputConfig, Status};
use repo_provision::permissions::{PermissionBatch, PermissionMode};
use repo_provision::specifier::SpecSource;
use repo_provision::suggestions;

/// Permission set granted to each repository
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ModeArg {
    /// actions, contents and workflows write; packages read
    #[default]
    Default,
    /// write-all
    All,
    /// contents write only
    Contents,
}

impl From<ModeArg> for PermissionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Default => PermissionMode::Default,
            ModeArg::All => PermissionMode::All,
            ModeArg::Contents => PermissionMode::Contents,
        }
    }
}

/// Document merge backend
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum BackendArg {
    /// jq when installed, native otherwise
    #[default]
    Auto,
    /// Built-in JSON merge
    Native,
    /// The jq command-line tool
    Jq,
}

impl From<BackendArg> for Backend {
    fn from(backend: BackendArg) -> Self {
        match backend {
            BackendArg::Auto => Backend::Auto,
            BackendArg::Native => Backend::Native,
            BackendArg::Jq => Backend::Jq,
        }
    }
}

/// Arguments for the permissions command
#[derive(Args, Debug)]
pub struct PermissionsArgs {
    /// Repository list to read (one owner/repo per line)
    #[arg(short, long, value_name = "PATH", env = "REPO_PROVISION_LIST")]
    pub file: Option<PathBuf>,

    /// Comma-separated repositories to use instead of the list file
    #[arg(short, long, value_name = "LIST")]
    pub repos: Option<String>,

    /// Permission set to grant
    #[arg(short, long, value_enum, default_value_t = ModeArg::Default)]
    pub mode: ModeArg,

    /// Print the merged document instead of writing it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Dev container document to update
    #[arg(short, long, value_name = "PATH", env = "REPO_PROVISION_DOCUMENT")]
    pub document: Option<PathBuf>,

    /// Start a new document if none exists
    #[arg(long)]
    pub create: bool,

    /// How to merge the document
    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    pub backend: BackendArg,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the permissions command
pub fn execute(args: PermissionsArgs, color_flag: &str) -> Result<()> {
    // stdout carries the document in dry-run mode
    let out = OutputConfig::from_env_and_flag(color_flag).quiet(args.quiet || args.dry_run);

    let source = SpecSource::from_args(args.repos, args.file);
    let batch = super::load_specs(&source, &out)?;

    let merger = match merge::select(args.backend.into()) {
        Ok(merger) => merger,
        Err(e @ Error::NoBackend { .. }) => return Err(suggestions::backend_unavailable(&e)),
        Err(e) => return Err(e.into()),
    };

    let path = args.document.unwrap_or_else(defaults::document_path);
    let existing = document::load(&path)?;
    if existing.is_none() && !args.create {
        return Err(suggestions::document_not_found(&path));
    }

    let mode: PermissionMode = args.mode.into();
    let permissions = PermissionBatch::uniform(&batch.specs, mode.permission_set());
    let merged = merge::merge_to_string(merger.as_ref(), existing.as_deref(), &permissions)?;

    if args.dry_run {
        print!("{}", merged);
        return Ok(());
    }

    if existing.as_deref() == Some(merged.as_str()) {
        out.status(
            Status::Ok,
            format!(
                "{} already grants '{}' to all {} repositories",
                path.display(),
                mode,
                permissions.len()
            ),
        );
        return Ok(());
    }

    document::write_atomic(&path, &merged)?;
    out.status(
        Status::Changed,
        format!(
            "Granted '{}' to {} repositories in {} (via {} backend)",
            mode,
            permissions.len(),
            path.display(),
            merger.name()
        ),
    );
    Ok(())
}
