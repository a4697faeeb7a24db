//! Atomic file writes.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `contents` to `path` so readers see either the old or the new file.
///
/// Every call writes its own uniquely named temporary file in the target
/// directory, syncs it, then renames it over `path`. Concurrent writers to
/// the same path never share a temporary file; the last rename wins.
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "Path has no parent directory")
    })?;
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    fs::create_dir_all(parent)?;

    let mut tmp_file = NamedTempFile::new_in(parent)?;
    tmp_file.write_all(contents)?;
    tmp_file.as_file().sync_all()?;
    tmp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
