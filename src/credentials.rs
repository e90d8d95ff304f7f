//! # Host Credentials
//!
//! The bearer token used against the host API is looked up once at startup
//! through a [`CredentialProvider`]. The default chain is:
//!
//! 1. the `GH_TOKEN` and `GITHUB_TOKEN` environment variables;
//! 2. `git credential fill` for the API host, then for the web host.
//!
//! Failing to find any token is a fatal [`Error::Credential`].

use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Error, Result};

/// Environment variables checked for a token, in order.
pub const TOKEN_VARS: &[&str] = &["GH_TOKEN", "GITHUB_TOKEN"];

/// A bearer token and where it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    source: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            source: source.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Something that may know a token.
pub trait CredentialProvider: Send + Sync {
    /// Returns `Ok(None)` when this provider simply has no token.
    fn credential(&self) -> Result<Option<Credential>>;
}

/// Reads the first non-empty variable out of a list.
pub struct EnvCredentialProvider {
    vars: Vec<String>,
}

impl EnvCredentialProvider {
    pub fn new(vars: &[&str]) -> Self {
        Self {
            vars: vars.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new(TOKEN_VARS)
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn credential(&self) -> Result<Option<Credential>> {
        for var in &self.vars {
            if let Ok(value) = std::env::var(var) {
                let value = value.trim();
                if !value.is_empty() {
                    debug!("using token from ${}", var);
                    return Ok(Some(Credential::new(value, format!("${}", var))));
                }
            }
        }
        Ok(None)
    }
}

/// Asks git's configured credential helpers, never prompting.
pub struct GitCredentialProvider {
    program: String,
    hosts: Vec<String>,
}

impl GitCredentialProvider {
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            program: "git".to_string(),
            hosts,
        }
    }

    fn fill(&self, host: &str) -> Option<String> {
        let mut child = Command::new(&self.program)
            .args(["credential", "fill"])
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GCM_INTERACTIVE", "never")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| debug!("cannot run {} credential fill: {}", self.program, e))
            .ok()?;

        if let Some(mut stdin) = child.stdin.take() {
            let request = format!("protocol=https\nhost={}\n\n", host);
            stdin.write_all(request.as_bytes()).ok()?;
        }

        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            debug!("git credential fill for {} exited with {}", host, output.status);
            return None;
        }
        parse_credential_output(&String::from_utf8_lossy(&output.stdout))
    }
}

impl CredentialProvider for GitCredentialProvider {
    fn credential(&self) -> Result<Option<Credential>> {
        for host in &self.hosts {
            if let Some(token) = self.fill(host) {
                debug!("using token from git credential helper for {}", host);
                return Ok(Some(Credential::new(
                    token,
                    format!("git credential ({})", host),
                )));
            }
        }
        Ok(None)
    }
}

/// Extract the `password=` field of `git credential fill` output.
pub fn parse_credential_output(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| *key == "password")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Tries providers in order; the first token wins.
#[derive(Default)]
pub struct ChainCredentialProvider {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Environment variables, then (unless disabled) git credential helpers
    /// for `api_host` and `web_host`.
    pub fn standard(api_host: &str, web_host: &str, use_git_helper: bool) -> Self {
        let chain = Self::new().with(EnvCredentialProvider::default());
        if use_git_helper {
            chain.with(GitCredentialProvider::new(vec![
                api_host.to_string(),
                web_host.to_string(),
            ]))
        } else {
            chain
        }
    }
}

impl CredentialProvider for ChainCredentialProvider {
    fn credential(&self) -> Result<Option<Credential>> {
        for provider in &self.providers {
            if let Some(credential) = provider.credential()? {
                return Ok(Some(credential));
            }
        }
        Ok(None)
    }
}

/// Query `provider` once, turning "no token" into a fatal error.
pub fn require(provider: &dyn CredentialProvider) -> Result<Credential> {
    provider.credential()?.ok_or_else(|| Error::Credential {
        message: "no host API token found".to_string(),
        hint: Some(format!(
            "Set {} or store a token with a git credential helper",
            TOKEN_VARS.join(" or ")
        )),
    })
}
