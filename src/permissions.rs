//! # Codespaces Permission Sets
//!
//! A run picks one [`PermissionMode`] and grants the resulting
//! [`PermissionSet`] to every repository in the batch. The JSON written for a
//! repository looks like:
//!
//! ```json
//! { "permissions": { "contents": "write" } }
//! ```
//!
//! or, for [`PermissionSet::WriteAll`], `{ "permissions": "write-all" }`.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};

use crate::specifier::RepoSpec;

/// Access granted for a single permission scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
}

/// The permissions granted to one repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionSet {
    /// Every scope, written as the `write-all` shorthand.
    WriteAll,
    /// Repository contents only.
    ContentsOnly,
    /// The usual set for a development container.
    Default {
        actions: AccessLevel,
        contents: AccessLevel,
        packages: AccessLevel,
        workflows: AccessLevel,
    },
}

impl PermissionSet {
    /// The `{"permissions": ...}` object stored under the repository key.
    pub fn to_json(&self) -> JsonValue {
        match self {
            PermissionSet::WriteAll => json!({ "permissions": "write-all" }),
            PermissionSet::ContentsOnly => json!({ "permissions": { "contents": "write" } }),
            PermissionSet::Default {
                actions,
                contents,
                packages,
                workflows,
            } => json!({
                "permissions": {
                    "actions": actions,
                    "contents": contents,
                    "packages": packages,
                    "workflows": workflows,
                }
            }),
        }
    }
}

/// Global mode selected on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    #[default]
    Default,
    All,
    Contents,
}

impl PermissionMode {
    pub fn permission_set(self) -> PermissionSet {
        match self {
            PermissionMode::All => PermissionSet::WriteAll,
            PermissionMode::Contents => PermissionSet::ContentsOnly,
            PermissionMode::Default => PermissionSet::Default {
                actions: AccessLevel::Write,
                contents: AccessLevel::Write,
                packages: AccessLevel::Read,
                workflows: AccessLevel::Write,
            },
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PermissionMode::Default => "default",
            PermissionMode::All => "all",
            PermissionMode::Contents => "contents",
        })
    }
}

/// Repository keys mapped to the permissions they should receive, in input
/// order. Keys are unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionBatch {
    entries: Vec<(String, PermissionSet)>,
}

impl PermissionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `set` to every spec. Branches are irrelevant here.
    pub fn uniform<'a>(specs: impl IntoIterator<Item = &'a RepoSpec>, set: PermissionSet) -> Self {
        let mut batch = Self::new();
        for spec in specs {
            batch.insert(spec.key(), set);
        }
        batch
    }

    /// Insert or replace the entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, set: PermissionSet) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = set,
            None => self.entries.push((key, set)),
        }
    }

    pub fn entries(&self) -> &[(String, PermissionSet)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The batch as a JSON object, ready to be laid over `repositories`.
    pub fn to_json_map(&self) -> Map<String, JsonValue> {
        self.entries
            .iter()
            .map(|(key, set)| (key.clone(), set.to_json()))
            .collect()
    }
}
