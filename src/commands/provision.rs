//! Provision command implementation
//!
//! Reads the repository list, then for each valid entry makes sure the
//! repository exists on the host and, when an `@branch` was given, that the
//! branch exists too. Individual failures are printed and the run goes on;
//! only startup problems (list file, token, identity) end it with exit code 1.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_provision::credentials::{self, ChainCredentialProvider};
use repo_provision::defaults;
use repo_provision::host::GitHubClient;
use repo_provision::output::{OutputConfig, Status};
use repo_provision::reconcile::{
    BranchAction, ReconcileOptions, Reconciler, RepoAction, SpecOutcome, Visibility,
};
use repo_provision::specifier::SpecSource;

/// Arguments for the provision command
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Repository list to read (one owner/repo[@branch] per line)
    #[arg(short, long, value_name = "PATH", env = "REPO_PROVISION_LIST")]
    pub file: Option<PathBuf>,

    /// Comma-separated repositories to use instead of the list file
    #[arg(short, long, value_name = "LIST")]
    pub repos: Option<String>,

    /// Create public repositories (default is private)
    #[arg(long)]
    pub public: bool,

    /// Only probe the host and report what would be created
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Base URL of the host's REST API
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL", default_value = defaults::API_URL)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        value_name = "SECS",
        env = "REPO_PROVISION_TIMEOUT",
        default_value_t = defaults::TIMEOUT_SECS
    )]
    pub timeout_secs: u64,

    /// Number of repositories processed concurrently
    #[arg(short, long, value_name = "N", default_value_t = defaults::JOBS)]
    pub jobs: usize,

    /// Do not ask git credential helpers for a token
    #[arg(long, env = "REPO_PROVISION_NO_CREDENTIAL_HELPER")]
    pub no_credential_helper: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the provision command
pub fn execute(args: ProvisionArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag).quiet(args.quiet);

    let source = SpecSource::from_args(args.repos, args.file);
    let batch = super::load_specs(&source, &out)?;

    let api_host = url::Url::parse(&args.api_url)?
        .host_str()
        .unwrap_or(defaults::API_HOST)
        .to_string();
    let provider = ChainCredentialProvider::standard(
        &api_host,
        defaults::WEB_HOST,
        !args.no_credential_helper,
    );
    let credential = credentials::require(&provider)?;
    log::info!("using token from {}", credential.source());

    let client = GitHubClient::new(
        &args.api_url,
        credential,
        std::time::Duration::from_secs(args.timeout_secs.max(1)),
    )?;
    let options = ReconcileOptions {
        visibility: if args.public {
            Visibility::Public
        } else {
            Visibility::Private
        },
        dry_run: args.dry_run,
        jobs: args.jobs.max(1),
    };
    let reconciler = Reconciler::connect(&client, options)?;

    if args.dry_run {
        out.info("DRY RUN: no repositories or branches will be created");
    }
    out.info(format!(
        "Reconciling {} repositories as {}",
        batch.specs.len(),
        reconciler.login()
    ));

    let report = reconciler.reconcile(&batch.specs);
    for outcome in &report.outcomes {
        print_outcome(&out, outcome);
    }
    out.info(format!("Done: {}", report));

    Ok(())
}

fn print_outcome(out: &OutputConfig, outcome: &SpecOutcome) {
    if outcome.is_failure() {
        out.problem(Status::Error, outcome.to_string());
        return;
    }

    let changed = matches!(outcome.repo, RepoAction::Created | RepoAction::WouldCreate)
        || matches!(
            outcome.branch,
            Some(BranchAction::Created { .. }) | Some(BranchAction::WouldCreate)
        );
    let status = if changed { Status::Changed } else { Status::Ok };
    out.status(status, outcome.to_string());
}
