//! All-or-nothing file replacement
//!
//! Content is written to a temporary file in the destination directory and then
//! renamed over the target, so readers either see the previous file or the new
//! one in full.

use crate::error::{CommonError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically replace `path` with `contents`
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if path.file_name().is_none() {
        return Err(CommonError::InvalidPath(path.display().to_string()));
    }

    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| CommonError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}
