//! Reading and writing the persisted permissions document.
//!
//! Writes never touch the target in place: the new content is written to a
//! temporary file in the same directory, flushed, and renamed over the target,
//! so an interrupted run leaves either the old or the new document.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

fn io_error(path: &Path, message: impl std::fmt::Display) -> Error {
    Error::DocumentIo {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

/// Read the document, or `None` if it doesn't exist.
pub fn load(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

/// Atomically replace `path` with `content`, creating parent directories.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| io_error(path, e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| io_error(path, e))?;
    temp.as_file().sync_all().map_err(|e| io_error(path, e))?;

    // keep the mode of the file being replaced
    #[cfg(unix)]
    {
        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(temp.path(), metadata.permissions())
                .map_err(|e| io_error(path, e))?;
        }
    }

    temp.persist(path).map_err(|e| io_error(path, e.error))?;
    debug!("wrote {}", path.display());
    Ok(())
}
