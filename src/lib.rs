//! # Repository Provisioning Library
//!
//! Provisions repositories and branches on a GitHub-style host from a
//! declarative list, and grants Codespaces access to those repositories in a
//! dev container document.
//!
//! ## Quick Example
//!
//! ```
//! use repo_provision::merge::{json::NativeMerger, merge_to_string};
//! use repo_provision::permissions::{PermissionBatch, PermissionMode};
//! use repo_provision::specifier::normalize;
//!
//! let spec = normalize("https://github.com/acme/new-svc.git@feature-x").unwrap();
//! assert_eq!(spec.key(), "acme/new-svc");
//!
//! let batch = PermissionBatch::uniform([&spec], PermissionMode::Contents.permission_set());
//! let document = merge_to_string(&NativeMerger, None, &batch).unwrap();
//! assert!(document.contains("\"acme/new-svc\""));
//! ```
//!
//! ## Core Concepts
//!
//! - **Specifiers (`specifier`, `validate`)**: raw list lines become
//!   [`specifier::RepoSpec`]s; invalid ones are reported and skipped.
//! - **Reconciliation (`host`, `reconcile`, `credentials`)**: a
//!   [`reconcile::Reconciler`] probes the host through the [`host::HostApi`]
//!   trait and creates whatever is missing, never deleting anything.
//! - **Permissions (`permissions`, `merge`, `document`)**: a
//!   [`permissions::PermissionBatch`] is laid over
//!   `customizations.codespaces.repositories` by a [`merge::DocumentMerger`]
//!   and written back atomically.

pub mod credentials;
pub mod defaults;
pub mod document;
pub mod error;
pub mod host;
pub mod merge;
pub mod output;
pub mod permissions;
pub mod reconcile;
pub mod specifier;
pub mod suggestions;
pub mod validate;

#[cfg(test)]
mod proptests;
