//! # Repository Reconciliation
//!
//! Brings the host in line with a list of [`RepoSpec`]s. Reconciliation is
//! additive only: repositories and branches are created, never deleted or
//! modified.
//!
//! For every spec, strictly in this order:
//!
//! 1. **Probe** the repository. A probe error skips the spec.
//! 2. **Create** it when absent, under the user's namespace if the owner is the
//!    authenticated login and under the organization otherwise. `auto_init` is
//!    requested exactly when a branch is wanted, since a branch needs a commit
//!    to start from. A 422 answer ("already exists or invalid") is not a
//!    failure; any other error skips branch handling.
//! 3. **Branch**: if one was requested and absent, resolve the default branch
//!    and its tip commit and create `refs/heads/<branch>` there. A repository
//!    that existed before the run without any commit can't get a branch; that
//!    is reported as a failure and not retried.
//!
//! Every mutating call is preceded by an existence check, so a second run
//! against unchanged state makes no mutating calls.
//!
//! Specs are independent: they are processed on a bounded `rayon` pool, a
//! failure on one never affects another, and outcomes are reported in input
//! order.

use std::fmt;

use log::{error, info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::{Error, Result};
use crate::host::{CreateOutcome, CreateRepoRequest, CreateScope, HostApi, RemoteRepo};
use crate::specifier::RepoSpec;

/// Visibility of repositories created by the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

/// Knobs for one reconciliation run.
#[derive(Clone, Debug)]
pub struct ReconcileOptions {
    pub visibility: Visibility,
    /// Only probe; report what would be created.
    pub dry_run: bool,
    /// Specs processed concurrently. `1` is sequential.
    pub jobs: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            visibility: Visibility::Private,
            dry_run: false,
            jobs: crate::defaults::JOBS,
        }
    }
}

/// What happened to the repository itself.
#[derive(Debug)]
pub enum RepoAction {
    Existed,
    Created,
    WouldCreate,
    /// The host answered 422 to the create call.
    Unprocessable(String),
    Failed(Error),
}

/// What happened to the requested branch.
#[derive(Debug)]
pub enum BranchAction {
    Existed,
    Created { sha: String },
    WouldCreate,
    /// Not attempted because the repository step failed.
    Skipped,
    Failed(Error),
}

/// Outcome for one spec.
#[derive(Debug)]
pub struct SpecOutcome {
    pub spec: RepoSpec,
    pub repo: RepoAction,
    /// `None` when no branch was requested.
    pub branch: Option<BranchAction>,
}

impl SpecOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.repo, RepoAction::Failed(_))
            || matches!(
                self.branch,
                Some(BranchAction::Failed(_)) | Some(BranchAction::Skipped)
            )
    }

    /// Errors carried by this outcome.
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        let repo = match &self.repo {
            RepoAction::Failed(e) => Some(e),
            _ => None,
        };
        let branch = match &self.branch {
            Some(BranchAction::Failed(e)) => Some(e),
            _ => None,
        };
        repo.into_iter().chain(branch)
    }
}

impl fmt::Display for SpecOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repo = match &self.repo {
            RepoAction::Existed => "exists".to_string(),
            RepoAction::Created => "created".to_string(),
            RepoAction::WouldCreate => "would be created".to_string(),
            RepoAction::Unprocessable(message) if message.is_empty() => {
                "not created (HTTP 422: already exists or invalid)".to_string()
            }
            RepoAction::Unprocessable(message) => format!("not created (HTTP 422: {})", message),
            RepoAction::Failed(e) => format!("failed: {}", e),
        };
        write!(f, "{}: {}", self.spec.key(), repo)?;

        if let (Some(branch), Some(action)) = (&self.spec.branch, &self.branch) {
            let action = match action {
                BranchAction::Existed => "exists".to_string(),
                BranchAction::Created { sha } => format!("created at {}", sha),
                BranchAction::WouldCreate => "would be created".to_string(),
                BranchAction::Skipped => "skipped".to_string(),
                BranchAction::Failed(e) => format!("failed: {}", e),
            };
            write!(f, "; branch {}: {}", branch, action)?;
        }
        Ok(())
    }
}

/// Outcomes of a whole run, in input order.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub outcomes: Vec<SpecOutcome>,
}

impl ReconcileReport {
    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.repo, RepoAction::Created))
            .count()
    }

    pub fn existed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.repo, RepoAction::Existed | RepoAction::Unprocessable(_)))
            .count()
    }

    pub fn branches_created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.branch, Some(BranchAction::Created { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} existed, {} branches created, {} failed",
            self.created(),
            self.existed(),
            self.branches_created(),
            self.failed()
        )
    }
}

/// Drives a [`HostApi`] towards the desired specs.
pub struct Reconciler<'a> {
    host: &'a dyn HostApi,
    login: String,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(host: &'a dyn HostApi, login: impl Into<String>, options: ReconcileOptions) -> Self {
        Self {
            host,
            login: login.into(),
            options,
        }
    }

    /// Look up the authenticated login once, then build the reconciler.
    ///
    /// # Errors
    ///
    /// Any failure here is returned as-is; callers treat it as fatal.
    pub fn connect(host: &'a dyn HostApi, options: ReconcileOptions) -> Result<Self> {
        let login = host.authenticated_login()?;
        info!("authenticated as {}", login);
        Ok(Self::new(host, login, options))
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    /// Reconcile every spec; never fails as a whole.
    pub fn reconcile(&self, specs: &[RepoSpec]) -> ReconcileReport {
        let outcomes: Vec<SpecOutcome> = if self.options.jobs <= 1 || specs.len() <= 1 {
            specs.iter().map(|spec| self.reconcile_one(spec)).collect()
        } else {
            match ThreadPoolBuilder::new().num_threads(self.options.jobs).build() {
                Ok(pool) => pool.install(|| {
                    specs
                        .par_iter()
                        .map(|spec| self.reconcile_one(spec))
                        .collect()
                }),
                Err(e) => {
                    warn!("cannot start worker pool ({}), running sequentially", e);
                    specs.iter().map(|spec| self.reconcile_one(spec)).collect()
                }
            }
        };
        ReconcileReport { outcomes }
    }

    /// Probe, create, then branch for a single spec.
    pub fn reconcile_one(&self, spec: &RepoSpec) -> SpecOutcome {
        let (repo, known) = self.ensure_repository(spec);

        let branch = spec.branch.as_deref().map(|branch| match &repo {
            RepoAction::Failed(_) => BranchAction::Skipped,
            RepoAction::WouldCreate => BranchAction::WouldCreate,
            _ => self.ensure_branch(spec, branch, known.as_ref()),
        });

        let outcome = SpecOutcome {
            spec: spec.clone(),
            repo,
            branch,
        };
        for e in outcome.errors() {
            error!("{}: {}", spec.key(), e);
        }
        outcome
    }

    fn ensure_repository(&self, spec: &RepoSpec) -> (RepoAction, Option<RemoteRepo>) {
        match self.host.get_repository(&spec.owner, &spec.name) {
            Ok(Some(remote)) => (RepoAction::Existed, Some(remote)),
            Ok(None) if self.options.dry_run => (RepoAction::WouldCreate, None),
            Ok(None) => (self.create_repository(spec), None),
            Err(e) => (RepoAction::Failed(e), None),
        }
    }

    fn create_repository(&self, spec: &RepoSpec) -> RepoAction {
        let scope = CreateScope::for_owner(&spec.owner, &self.login);
        let request = CreateRepoRequest {
            name: spec.name.clone(),
            private: self.options.visibility == Visibility::Private,
            auto_init: spec.branch.is_some(),
        };

        match self.host.create_repository(&scope, &request) {
            Ok(CreateOutcome::Created) => {
                info!("created repository {}", spec.key());
                RepoAction::Created
            }
            Ok(CreateOutcome::Unprocessable(message)) => {
                warn!("{}: host refused creation with 422 {}", spec.key(), message);
                RepoAction::Unprocessable(message)
            }
            Err(e) => RepoAction::Failed(e),
        }
    }

    fn ensure_branch(
        &self,
        spec: &RepoSpec,
        branch: &str,
        known: Option<&RemoteRepo>,
    ) -> BranchAction {
        match self.host.get_branch_sha(&spec.owner, &spec.name, branch) {
            Ok(Some(_)) => BranchAction::Existed,
            Ok(None) if self.options.dry_run => BranchAction::WouldCreate,
            Ok(None) => match self.create_branch(spec, branch, known) {
                Ok(sha) => {
                    info!("created branch {} in {} at {}", branch, spec.key(), sha);
                    BranchAction::Created { sha }
                }
                Err(e) => BranchAction::Failed(e),
            },
            Err(e) => BranchAction::Failed(e),
        }
    }

    fn create_branch(
        &self,
        spec: &RepoSpec,
        branch: &str,
        known: Option<&RemoteRepo>,
    ) -> Result<String> {
        let default_branch = match known {
            Some(remote) => remote.default_branch.clone(),
            None => self
                .host
                .get_repository(&spec.owner, &spec.name)?
                .map(|remote| remote.default_branch)
                .ok_or_else(|| Error::HostApi {
                    operation: format!("resolve default branch of {}", spec.key()),
                    status: 404,
                    message: "repository not visible after creation".to_string(),
                })?,
        };
        if default_branch.is_empty() {
            return Err(Error::HostApi {
                operation: format!("resolve default branch of {}", spec.key()),
                status: 200,
                message: "repository reports no default branch".to_string(),
            });
        }

        let sha = self
            .host
            .get_branch_sha(&spec.owner, &spec.name, &default_branch)?
            .ok_or_else(|| Error::HostApi {
                operation: format!("resolve tip of {} in {}", default_branch, spec.key()),
                status: 404,
                message: "default branch has no commit to branch from \
                          (repository was created without an initial commit)"
                    .to_string(),
            })?;

        self.host.create_ref(
            &spec.owner,
            &spec.name,
            &format!("refs/heads/{}", branch),
            &sha,
        )?;
        Ok(sha)
    }
}
