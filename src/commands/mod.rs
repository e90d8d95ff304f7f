//! # CLI Command Implementations
//!
//! One file per subcommand. Each defines an `Args` struct derived with `clap`
//! and an `execute` function that wires the library together and decides
//! what is printed and which errors end the run.

pub mod completions;
pub mod permissions;
pub mod provision;

use std::path::Path;

use repo_provision::error::Error;
use repo_provision::output::{OutputConfig, Status};
use repo_provision::specifier::SpecSource;
use repo_provision::suggestions;
use repo_provision::validate::SpecBatch;

/// Load and validate the specs, reporting every skipped one.
///
/// A missing list file gets a hinted error; running out of valid specs is
/// fatal.
pub(crate) fn load_specs(source: &SpecSource, out: &OutputConfig) -> anyhow::Result<SpecBatch> {
    if let SpecSource::File(path) = source {
        if !Path::new(path).exists() {
            return Err(suggestions::list_file_not_found(path));
        }
    }

    let batch = SpecBatch::load(source)?;
    for skipped in &batch.skipped {
        report_skip(out, skipped);
    }
    Ok(batch)
}

fn report_skip(out: &OutputConfig, error: &Error) {
    out.problem(Status::Skip, error.to_string());
}
