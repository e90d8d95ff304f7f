//! # Error Handling
//!
//! This module defines the centralized error type for `repo-provision`. It uses
//! `thiserror` to derive an `Error` enum that covers every failure mode of the
//! library, with contextual fields so that messages can name the offending
//! specifier, host API call, or document path.
//!
//! ## Recoverable vs. fatal
//!
//! The variants fall into two groups:
//!
//! - **Per-specifier** (`Parse`, `Validation`, `HostApi`, `Network`): reported
//!   for the offending specifier and skipped; the rest of the batch continues.
//! - **Startup-class** (`Credential`, `EmptyBatch`, `NoBackend`, `DocumentIo`,
//!   `Merge`): abort the invocation with a non-zero exit code.
//!
//! [`Error::is_fatal`] encodes this split so callers don't have to.

use thiserror::Error;

/// Main error type for repo-provision operations
#[derive(Error, Debug)]
pub enum Error {
    /// A raw specifier could not be turned into an `owner/name` pair.
    #[error("Cannot parse specifier '{input}': {message}")]
    Parse { input: String, message: String },

    /// A parsed specifier was rejected by the validator.
    #[error("Invalid repository '{spec}': {reason}")]
    Validation { spec: String, reason: String },

    /// Every specifier was skipped; there is nothing to do.
    #[error("No valid repositories in {source_name}")]
    EmptyBatch { source_name: String },

    /// The hosting service answered with an unexpected status code.
    #[error("Host API error during {operation}: HTTP {status}{}", if message.is_empty() { String::new() } else { format!(" - {}", message) })]
    HostApi {
        operation: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response (connect failure, timeout, TLS).
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// No usable bearer token could be obtained.
    #[error("Credential error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Credential {
        message: String,
        /// Optional hint for how to supply a token
        hint: Option<String>,
    },

    /// The requested document merge backend is not installed.
    #[error("No document merge backend available: {requested}")]
    NoBackend { requested: String },

    /// The permissions document could not be read or written.
    #[error("Document I/O error for {path}: {message}")]
    DocumentIo { path: String, message: String },

    /// The document could not be merged (e.g. a non-object on the fixed path).
    #[error("Merge operation error: {operation} - {message}")]
    Merge { operation: String, message: String },

    /// An error occurred during serialization.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether this error must abort the whole invocation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Credential { .. }
                | Error::EmptyBatch { .. }
                | Error::NoBackend { .. }
                | Error::DocumentIo { .. }
                | Error::Merge { .. }
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
