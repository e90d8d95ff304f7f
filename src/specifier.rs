//! # Repository Specifiers
//!
//! A specifier is one line of the repository list (or one comma-separated
//! token of a `--repos` override) naming a repository and, optionally, a
//! branch to create in it:
//!
//! ```text
//! # comment lines and blank lines are skipped
//! octocat/Hello-World
//! https://github.com/octocat/Hello-World.git@feature-x   extra fields are ignored
//! ```
//!
//! [`normalize`] turns one raw token into a [`RepoSpec`]. It strips, in order:
//! everything after the first whitespace, a single `@branch` suffix, trailing
//! `/`, the `https://github.com/` prefix, and a trailing `.git`. The result of
//! normalizing the [`Display`](std::fmt::Display) form of a spec is the spec
//! itself.
//!
//! [`SpecList`] accumulates specs in first-seen order and collapses duplicate
//! `owner/name` keys.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::defaults;
use crate::error::{Error, Result};

/// One repository (and optional branch) the run should make sure exists.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    pub owner: String,
    pub name: String,
    pub branch: Option<String>,
}

impl RepoSpec {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// The `owner/name` key identifying this repository within a run.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(branch) = &self.branch {
            write!(f, "@{}", branch)?;
        }
        Ok(())
    }
}

/// Normalize a raw specifier into a [`RepoSpec`].
///
/// # Errors
///
/// Returns [`Error::Parse`] when the token is empty, has no `/` between owner
/// and name, or either side of the `/` is empty.
///
/// # Examples
///
/// ```
/// use repo_provision::specifier::normalize;
///
/// let spec = normalize("octocat/Hello-World.git@feature-x extra-dir").unwrap();
/// assert_eq!(spec.owner, "octocat");
/// assert_eq!(spec.name, "Hello-World");
/// assert_eq!(spec.branch.as_deref(), Some("feature-x"));
/// ```
pub fn normalize(raw: &str) -> Result<RepoSpec> {
    let parse_error = |message: &str| Error::Parse {
        input: raw.trim().to_string(),
        message: message.to_string(),
    };

    let token = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| parse_error("empty specifier"))?;

    let (token, branch) = match token.rsplit_once('@') {
        Some((rest, branch)) if !branch.is_empty() => (rest, Some(branch.to_string())),
        Some((rest, _)) => (rest, None),
        None => (token, None),
    };

    let token = token.trim_end_matches('/');
    let web_prefix = format!("https://{}/", defaults::WEB_HOST);
    let token = token.strip_prefix(web_prefix.as_str()).unwrap_or(token);
    let token = token.strip_suffix(".git").unwrap_or(token);

    let (owner, name) = token
        .split_once('/')
        .ok_or_else(|| parse_error("expected owner/name"))?;
    if owner.is_empty() || name.is_empty() {
        return Err(parse_error("owner and name must both be non-empty"));
    }

    Ok(RepoSpec {
        owner: owner.to_string(),
        name: name.to_string(),
        branch,
    })
}

/// Split list-file text into raw specifier lines.
///
/// Blank lines and lines starting with `#` are dropped.
pub fn raw_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Split a comma-separated override into raw specifier tokens.
pub fn raw_override_tokens(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Where the raw specifiers come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpecSource {
    /// Comma-separated list given on the command line.
    Override(String),
    /// Line-oriented list file.
    File(PathBuf),
}

impl SpecSource {
    /// Pick the override when present, otherwise the file (or the default file).
    pub fn from_args(repos: Option<String>, file: Option<PathBuf>) -> Self {
        match repos {
            Some(list) if !list.trim().is_empty() => SpecSource::Override(list),
            _ => SpecSource::File(file.unwrap_or_else(defaults::list_file)),
        }
    }

    /// Human-readable name for messages.
    pub fn describe(&self) -> String {
        match self {
            SpecSource::Override(_) => "--repos override".to_string(),
            SpecSource::File(path) => path.display().to_string(),
        }
    }

    /// Read and parse every specifier.
    ///
    /// Parse failures are collected, not returned: only an unreadable list file
    /// is an error.
    pub fn load(&self) -> Result<SpecList> {
        match self {
            SpecSource::Override(list) => Ok(SpecList::from_raw(raw_override_tokens(list))),
            SpecSource::File(path) => {
                let text = read_list_file(path)?;
                Ok(SpecList::from_raw(raw_lines(&text)))
            }
        }
    }
}

fn read_list_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::DocumentIo {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Ordered, de-duplicated specs plus the tokens that failed to parse.
#[derive(Debug, Default)]
pub struct SpecList {
    specs: Vec<RepoSpec>,
    index: HashMap<String, usize>,
    errors: Vec<Error>,
}

impl SpecList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize every raw token, keeping parse failures aside.
    pub fn from_raw<'a>(raw: impl IntoIterator<Item = &'a str>) -> Self {
        let mut list = Self::new();
        for token in raw {
            match normalize(token) {
                Ok(spec) => list.push(spec),
                Err(e) => {
                    debug!("skipping unparseable specifier: {}", e);
                    list.errors.push(e);
                }
            }
        }
        list
    }

    /// Add a spec. A duplicate key keeps its first position and takes the
    /// branch of the latest occurrence, which may be none.
    pub fn push(&mut self, spec: RepoSpec) {
        match self.index.get(&spec.key()) {
            Some(&at) => self.specs[at].branch = spec.branch,
            None => {
                self.index.insert(spec.key(), self.specs.len());
                self.specs.push(spec);
            }
        }
    }

    pub fn specs(&self) -> &[RepoSpec] {
        &self.specs
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn into_parts(self) -> (Vec<RepoSpec>, Vec<Error>) {
        (self.specs, self.errors)
    }
}
