//! # Specifier Validation
//!
//! Filters parsed [`RepoSpec`]s against format and policy rules before any
//! host call or document edit happens:
//!
//! - the owner must not be the reserved `datasets` namespace;
//! - owner and name must be separated by exactly one `/`;
//! - owner and name must only use characters the host accepts;
//! - a requested branch must be a legal git ref name.
//!
//! Rejected specs are reported and dropped. A run left with no valid spec is a
//! fatal [`Error::EmptyBatch`].

use log::warn;
use regex::Regex;

use crate::defaults;
use crate::error::{Error, Result};
use crate::specifier::{RepoSpec, SpecSource};

const OWNER_PATTERN: &str = r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?$";
const NAME_PATTERN: &str = r"^[A-Za-z0-9._-]+$";

/// Compiled validation rules.
#[derive(Debug, Clone)]
pub struct Validator {
    owner: Regex,
    name: Regex,
}

impl Validator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            owner: Regex::new(OWNER_PATTERN)?,
            name: Regex::new(NAME_PATTERN)?,
        })
    }

    /// Check a spec, returning the reason it was rejected.
    pub fn check(&self, spec: &RepoSpec) -> Result<()> {
        let reject = |reason: &str| {
            Err(Error::Validation {
                spec: spec.to_string(),
                reason: reason.to_string(),
            })
        };

        if spec.owner == defaults::RESERVED_OWNER {
            return reject("owner 'datasets' is reserved for datasets, not repositories");
        }
        if spec.key().matches('/').count() != 1 {
            return reject("expected exactly one '/' between owner and name");
        }
        if !self.owner.is_match(&spec.owner) {
            return reject("owner contains characters the host does not allow");
        }
        // "." and ".." pass the character class but are never valid names
        if !self.name.is_match(&spec.name) || spec.name == "." || spec.name == ".." {
            return reject("name contains characters the host does not allow");
        }
        if let Some(branch) = &spec.branch {
            if let Some(problem) = branch_name_problem(branch) {
                return reject(problem);
            }
        }
        Ok(())
    }

    pub fn validate(&self, spec: &RepoSpec) -> bool {
        self.check(spec).is_ok()
    }

    /// Split specs into valid ones and rejection errors, keeping input order.
    pub fn partition(&self, specs: Vec<RepoSpec>) -> (Vec<RepoSpec>, Vec<Error>) {
        let mut valid = Vec::with_capacity(specs.len());
        let mut rejected = Vec::new();
        for spec in specs {
            match self.check(&spec) {
                Ok(()) => valid.push(spec),
                Err(e) => {
                    warn!("{}", e);
                    rejected.push(e);
                }
            }
        }
        (valid, rejected)
    }
}

/// Why `branch` can't be a git branch name, if it can't.
fn branch_name_problem(branch: &str) -> Option<&'static str> {
    const FORBIDDEN: &[char] = &[' ', '~', '^', ':', '?', '*', '[', '\\'];

    if branch.starts_with('-') || branch.starts_with('/') || branch.ends_with('/') {
        Some("branch name must not start with '-' or start/end with '/'")
    } else if branch.contains("..") || branch.contains("//") || branch.contains("@{") {
        Some("branch name must not contain '..', '//' or '@{'")
    } else if branch.ends_with(".lock") || branch.ends_with('.') {
        Some("branch name must not end with '.lock' or '.'")
    } else if branch.split('/').any(|part| part.starts_with('.')) {
        Some("branch name components must not start with '.'")
    } else if branch.chars().any(|c| c.is_control() || FORBIDDEN.contains(&c)) {
        Some("branch name contains characters git does not allow")
    } else {
        None
    }
}

/// Valid specs for one run plus everything that was skipped on the way.
#[derive(Debug)]
pub struct SpecBatch {
    pub specs: Vec<RepoSpec>,
    pub skipped: Vec<Error>,
}

impl SpecBatch {
    /// Parse and validate every specifier from `source`.
    ///
    /// # Errors
    ///
    /// - [`Error::DocumentIo`] if the list file can't be read.
    /// - [`Error::EmptyBatch`] if nothing survives parsing and validation.
    pub fn load(source: &SpecSource) -> Result<Self> {
        let (parsed, mut skipped) = source.load()?.into_parts();
        let (specs, rejected) = Validator::new()?.partition(parsed);
        skipped.extend(rejected);

        if specs.is_empty() {
            return Err(Error::EmptyBatch {
                source_name: source.describe(),
            });
        }
        Ok(Self { specs, skipped })
    }
}
