//! # Error Suggestions
//!
//! Helpers that turn startup failures into messages which say what went wrong
//! and how to fix it.
//!
//! ```rust,ignore
//! use repo_provision::suggestions;
//!
//! if !path.exists() {
//!     return Err(suggestions::list_file_not_found(&path));
//! }
//! ```

use std::path::Path;

/// The repository list file does not exist.
pub fn list_file_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Repository list not found: {path}\n\n\
         hint: Create {path} with one owner/repo[@branch] per line\n\
         hint: Use -f/--file to read a different list\n\
         hint: Use -r/--repos owner/a,owner/b to skip the file entirely",
        path = path.display()
    )
}

/// The permissions document does not exist and `--create` was not given.
pub fn document_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Permissions document not found: {path}\n\n\
         hint: Pass --create to start a new document at this path\n\
         hint: Use -d/--document to point at an existing file",
        path = path.display()
    )
}

/// An explicitly requested merge backend is unavailable.
pub fn backend_unavailable(error: &crate::error::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "{error}\n\n\
         hint: Install jq, or use --backend native (always available)\n\
         hint: --backend auto picks jq when installed and native otherwise"
    )
}
