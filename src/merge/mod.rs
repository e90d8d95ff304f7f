//! # Permissions Document Merging
//!
//! The permissions document is a JSON file (usually
//! `.devcontainer/devcontainer.json`) of which this crate only owns one object:
//! `customizations.codespaces.repositories`. Merging a [`PermissionBatch`] into
//! it is a shallow override at the repository-key level:
//!
//! - an entry whose key is in the batch is replaced as a whole;
//! - entries for other keys stay as they are;
//! - every key outside `repositories`, at every level, stays as it is.
//!
//! When there is no document yet, one is synthesized that contains only the
//! fixed path.
//!
//! ## Backends
//!
//! Two interchangeable [`DocumentMerger`] implementations exist:
//!
//! - [`jq::JqMerger`] runs the `jq` structured-query tool on the
//!   `repositories` object;
//! - [`json::NativeMerger`] does the same with `serde_json`, and is always
//!   available.
//!
//! Whatever the backend, the result goes through [`render`], so equal inputs
//! give byte-identical output. Number literals are kept as written.

pub mod jq;
pub mod json;

use std::fmt;

use log::debug;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::permissions::PermissionBatch;

/// Location of the repository map inside the document.
pub const REPOSITORIES_PATH: &str = "customizations.codespaces.repositories";

/// A dotted key path such as `customizations.codespaces.repositories`.
///
/// A literal dot inside a key is written `\.`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentPath {
    keys: Vec<String>,
}

impl DocumentPath {
    /// Parse a dotted path. Empty segments are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use repo_provision::merge::DocumentPath;
    ///
    /// let path = DocumentPath::parse(r"a.b\.c.d");
    /// assert_eq!(path.keys(), ["a", "b.c", "d"]);
    /// ```
    pub fn parse(path: &str) -> Self {
        let mut keys = Vec::new();
        let mut current = String::new();
        let mut chars = path.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                '.' => {
                    if !current.is_empty() {
                        keys.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            keys.push(current);
        }

        Self { keys }
    }

    /// The path this crate owns.
    pub fn repositories() -> Self {
        Self::parse(REPOSITORIES_PATH)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped: Vec<String> = self.keys.iter().map(|k| k.replace('.', "\\.")).collect();
        f.write_str(&escaped.join("."))
    }
}

/// One way of laying a [`PermissionBatch`] over an existing document.
pub trait DocumentMerger: Send + Sync {
    /// Short backend name for logs and messages.
    fn name(&self) -> &'static str;

    /// Merge `batch` into the document text `existing` (`None` if there is no
    /// document yet) and return the new document.
    fn merge(&self, existing: Option<&str>, batch: &PermissionBatch) -> Result<JsonValue>;
}

/// Backend requested on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// `jq` when installed, otherwise native.
    #[default]
    Auto,
    Native,
    Jq,
}

/// Resolve a [`Backend`] choice to a merger.
///
/// # Errors
///
/// Returns [`Error::NoBackend`] when `jq` is requested explicitly but can't be
/// run.
pub fn select(backend: Backend) -> Result<Box<dyn DocumentMerger>> {
    let jq = jq::JqMerger::default();
    let merger: Box<dyn DocumentMerger> = match backend {
        Backend::Native => Box::new(json::NativeMerger),
        Backend::Jq if jq.is_available() => Box::new(jq),
        Backend::Jq => {
            return Err(Error::NoBackend {
                requested: format!("'{}' was not found on PATH", jq.program()),
            })
        }
        Backend::Auto if jq.is_available() => Box::new(jq),
        Backend::Auto => Box::new(json::NativeMerger),
    };
    debug!("using {} document merge backend", merger.name());
    Ok(merger)
}

/// Serialize a document the one canonical way: two-space indent, key order
/// preserved, trailing newline.
pub fn render(document: &JsonValue) -> Result<String> {
    let mut content = serde_json::to_string_pretty(document).map_err(|err| Error::Serialization {
        message: format!("Failed to serialize JSON: {}", err),
    })?;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    Ok(content)
}

/// Merge with `merger` and render the result.
pub fn merge_to_string(
    merger: &dyn DocumentMerger,
    existing: Option<&str>,
    batch: &PermissionBatch,
) -> Result<String> {
    render(&merger.merge(existing, batch)?)
}

/// `None` for a missing or blank document.
pub(crate) fn present(existing: Option<&str>) -> Option<&str> {
    existing.filter(|text| !text.trim().is_empty())
}
