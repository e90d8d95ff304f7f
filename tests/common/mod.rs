//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures, helper functions, and an in-memory
//! host to reduce duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_list("acme/svc\n");
//!     fixture.command().arg("permissions").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use repo_provision::error::{Error, Result};
use repo_provision::host::{CreateOutcome, CreateRepoRequest, CreateScope, HostApi, RemoteRepo};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::documents;
    #[allow(unused_imports)]
    pub use super::FakeHost;
    pub use super::TestFixture;
}

/// Common permissions document snippets for testing.
#[allow(dead_code)]
pub mod documents {
    /// Dev container document without any Codespaces customization.
    pub const PLAIN: &str = r#"{
  "name": "dev",
  "image": "mcr.microsoft.com/devcontainers/rust:1",
  "features": {}
}
"#;

    /// Document that already grants one repository.
    pub const WITH_GRANT: &str = r#"{
  "name": "dev",
  "customizations": {
    "vscode": { "extensions": ["rust-lang.rust-analyzer"] },
    "codespaces": {
      "repositories": {
        "acme/old": { "permissions": "write-all" }
      }
    }
  }
}
"#;

    /// Not JSON at all.
    pub const INVALID: &str = "{ \"name\": ";
}

/// A test fixture that provides a temporary directory with an optional
/// repository list and permissions document.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_list("acme/svc@dev\n")
///     .with_document(documents::PLAIN);
///
/// fixture.command().arg("permissions").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `repos.txt` list with the given content.
    pub fn with_list(self, content: &str) -> Self {
        self.with_file("repos.txt", content)
    }

    /// Add `.devcontainer/devcontainer.json` with the given content.
    pub fn with_document(self, content: &str) -> Self {
        self.with_file(".devcontainer/devcontainer.json", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the permissions document.
    pub fn document_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join(".devcontainer/devcontainer.json")
    }

    /// Read the permissions document back.
    pub fn read_document(&self) -> String {
        std::fs::read_to_string(self.document_path()).expect("Failed to read document")
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    ///
    /// Token variables and settings from the caller's environment are removed
    /// and git credential helpers are disabled, so no test ever reaches a
    /// real host.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-provision");
        cmd.current_dir(self.path())
            .env_remove("GH_TOKEN")
            .env_remove("GITHUB_TOKEN")
            .env_remove("GITHUB_API_URL")
            .env_remove("REPO_PROVISION_LIST")
            .env_remove("REPO_PROVISION_DOCUMENT")
            .env_remove("RUST_LOG")
            .env("REPO_PROVISION_NO_CREDENTIAL_HELPER", "true")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// One mutating call recorded by [`FakeHost`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    CreateRepository {
        path: String,
        name: String,
        private: bool,
        auto_init: bool,
    },
    CreateRef {
        repo: String,
        git_ref: String,
        sha: String,
    },
}

#[derive(Default)]
struct HostState {
    /// repo key -> (default branch, branch -> sha)
    repos: BTreeMap<String, (String, BTreeMap<String, String>)>,
    unprocessable: BTreeSet<String>,
    failing_probes: BTreeSet<String>,
    calls: Vec<HostCall>,
}

/// In-memory [`HostApi`] that behaves like the real service for the calls
/// the reconciler makes, and records every mutating call.
pub struct FakeHost {
    login: String,
    state: Mutex<HostState>,
}

#[allow(dead_code)]
impl FakeHost {
    pub fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            state: Mutex::new(HostState::default()),
        }
    }

    /// Seed a repository whose default branch `main` points at `sha`.
    pub fn with_repo(self, key: &str, sha: &str) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert("main".to_string(), sha.to_string());
        self.state
            .lock()
            .unwrap()
            .repos
            .insert(key.to_string(), ("main".to_string(), branches));
        self
    }

    /// Seed a repository with no commits at all.
    pub fn with_empty_repo(self, key: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .repos
            .insert(key.to_string(), ("main".to_string(), BTreeMap::new()));
        self
    }

    /// Seed an extra branch in an existing repository.
    pub fn with_branch(self, key: &str, branch: &str, sha: &str) -> Self {
        if let Some((_, branches)) = self.state.lock().unwrap().repos.get_mut(key) {
            branches.insert(branch.to_string(), sha.to_string());
        }
        self
    }

    /// Answer creation of `name` with 422.
    pub fn refusing(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .unprocessable
            .insert(name.to_string());
        self
    }

    /// Answer probes of `key` with 500.
    pub fn failing_probe(self, key: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_probes
            .insert(key.to_string());
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn has_repo(&self, key: &str) -> bool {
        self.state.lock().unwrap().repos.contains_key(key)
    }

    pub fn branch_sha(&self, key: &str, branch: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .repos
            .get(key)
            .and_then(|(_, branches)| branches.get(branch).cloned())
    }
}

impl HostApi for FakeHost {
    fn authenticated_login(&self) -> Result<String> {
        Ok(self.login.clone())
    }

    fn get_repository(&self, owner: &str, name: &str) -> Result<Option<RemoteRepo>> {
        let key = format!("{}/{}", owner, name);
        let state = self.state.lock().unwrap();
        if state.failing_probes.contains(&key) {
            return Err(Error::HostApi {
                operation: format!("GET repos/{}", key),
                status: 500,
                message: "Server Error".to_string(),
            });
        }
        Ok(state.repos.get(&key).map(|(default_branch, _)| RemoteRepo {
            default_branch: default_branch.clone(),
        }))
    }

    fn create_repository(
        &self,
        scope: &CreateScope,
        request: &CreateRepoRequest,
    ) -> Result<CreateOutcome> {
        let owner = match scope {
            CreateScope::User => self.login.clone(),
            CreateScope::Organization(org) => org.clone(),
        };
        let key = format!("{}/{}", owner, request.name);
        let mut state = self.state.lock().unwrap();
        state.calls.push(HostCall::CreateRepository {
            path: scope.path(),
            name: request.name.clone(),
            private: request.private,
            auto_init: request.auto_init,
        });
        if state.unprocessable.contains(&request.name) || state.repos.contains_key(&key) {
            return Ok(CreateOutcome::Unprocessable(
                "name already exists on this account".to_string(),
            ));
        }

        let mut branches = BTreeMap::new();
        if request.auto_init {
            branches.insert("main".to_string(), "abc123".to_string());
        }
        state.repos.insert(key, ("main".to_string(), branches));
        Ok(CreateOutcome::Created)
    }

    fn get_branch_sha(&self, owner: &str, name: &str, branch: &str) -> Result<Option<String>> {
        let key = format!("{}/{}", owner, name);
        let state = self.state.lock().unwrap();
        match state.repos.get(&key) {
            Some((_, branches)) => Ok(branches.get(branch).cloned()),
            None => Err(Error::HostApi {
                operation: format!("GET repos/{}/git/ref/heads/{}", key, branch),
                status: 404,
                message: "Not Found".to_string(),
            }),
        }
    }

    fn create_ref(&self, owner: &str, name: &str, git_ref: &str, sha: &str) -> Result<()> {
        let key = format!("{}/{}", owner, name);
        let mut state = self.state.lock().unwrap();
        state.calls.push(HostCall::CreateRef {
            repo: key.clone(),
            git_ref: git_ref.to_string(),
            sha: sha.to_string(),
        });
        let branch = git_ref.trim_start_matches("refs/heads/").to_string();
        match state.repos.get_mut(&key) {
            Some((_, branches)) if !branches.contains_key(&branch) => {
                branches.insert(branch, sha.to_string());
                Ok(())
            }
            Some(_) => Err(Error::HostApi {
                operation: format!("POST repos/{}/git/refs", key),
                status: 422,
                message: "Reference already exists".to_string(),
            }),
            None => Err(Error::HostApi {
                operation: format!("POST repos/{}/git/refs", key),
                status: 404,
                message: "Not Found".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_document() {
        let fixture = TestFixture::new().with_document(documents::PLAIN);
        assert!(fixture.document_path().exists());
    }

    #[test]
    fn test_documents_are_valid_json() {
        for document in [documents::PLAIN, documents::WITH_GRANT] {
            serde_json::from_str::<serde_json::Value>(document).expect("Document should be valid JSON");
        }
        assert!(serde_json::from_str::<serde_json::Value>(documents::INVALID).is_err());
    }

    #[test]
    fn test_fake_host_records_creation() {
        let host = FakeHost::new("me");
        host.create_repository(
            &CreateScope::User,
            &CreateRepoRequest {
                name: "svc".to_string(),
                private: true,
                auto_init: false,
            },
        )
        .unwrap();
        assert!(host.has_repo("me/svc"));
        assert_eq!(host.calls().len(), 1);
    }
}
