//! Default values for repo-provision configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication. Every value here can be
//! overridden by a CLI flag or its environment variable.

use std::path::PathBuf;

/// Repository list read when neither `--file` nor `--repos` is given.
pub const LIST_FILE: &str = "repos.txt";

/// Permissions document, relative to the working directory.
pub const DOCUMENT_PATH: &str = ".devcontainer/devcontainer.json";

/// REST endpoint of the hosting service.
pub const API_URL: &str = "https://api.github.com";

/// Host name of [`API_URL`], used for credential lookup.
pub const API_HOST: &str = "api.github.com";

/// Web host; specifiers may be prefixed with `https://<WEB_HOST>/`.
pub const WEB_HOST: &str = "github.com";

/// Owner reserved for non-repository datasets.
pub const RESERVED_OWNER: &str = "datasets";

/// Per-request timeout in seconds.
pub const TIMEOUT_SECS: u64 = 30;

/// Number of specifiers reconciled concurrently.
pub const JOBS: usize = 4;

/// Returns the default repository list path.
pub fn list_file() -> PathBuf {
    PathBuf::from(LIST_FILE)
}

/// Returns the default permissions document path.
pub fn document_path() -> PathBuf {
    PathBuf::from(DOCUMENT_PATH)
}
