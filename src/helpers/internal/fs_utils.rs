//! Common filesystem utilities
//!
//! Shared by the downloader, the extractor and artifact relocation.

use crate::core::error::PathError;
use crate::core::output;
use crate::helpers::internal::progress::{DEFAULT_BAR_WIDTH, ProgressReporter};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Ensure a file's parent directory exists.
pub fn ensure_parent_dir(path: &Path) -> Result<(), PathError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| PathError::new(parent, e))?;
    }
    Ok(())
}

/// Create a directory and all of its ancestors.
pub fn create_dir_all(path: &Path) -> Result<(), PathError> {
    fs::create_dir_all(path).map_err(|e| PathError::new(path, e))
}

/// Remove a directory tree; a missing directory is not an error.
pub fn remove_dir_all(path: &Path) -> Result<(), PathError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PathError::new(path, e)),
    }
}

/// Rename `src` to `dest`, creating the destination's parent.
pub fn move_path(src: &Path, dest: &Path) -> Result<(), PathError> {
    ensure_parent_dir(dest)?;
    fs::rename(src, dest).map_err(|e| PathError::new(src, e))
}

/// Count regular files below `path` (a single file counts as one).
pub fn count_files(path: &Path) -> Result<u64, PathError> {
    let mut count = 0;
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|e| walk_error(path, e))?;
        if !entry.file_type().is_dir() {
            count += 1;
        }
    }
    Ok(count)
}

/// Copy a file or a directory tree, reporting one step per copied file.
///
/// Returns the number of files copied.
pub fn copy_path(src: &Path, dest: &Path, progress: &ProgressReporter) -> Result<u64, PathError> {
    let meta = fs::metadata(src).map_err(|e| PathError::new(src, e))?;

    if !meta.is_dir() {
        ensure_parent_dir(dest)?;
        fs::copy(src, dest).map_err(|e| PathError::new(src, e))?;
        progress.advance(1);
        return Ok(1);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(src, e))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| PathError::new(entry.path(), std::io::ErrorKind::InvalidInput.into()))?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            create_dir_all(&target)?;
        } else {
            ensure_parent_dir(&target)?;
            fs::copy(entry.path(), &target).map_err(|e| PathError::new(entry.path(), e))?;
            copied += 1;
            progress.advance(1);
        }
    }

    Ok(copied)
}

/// [`copy_path`] with a terminal progress bar.
pub fn copy_with_progress(src: &Path, dest: &Path) -> Result<u64, PathError> {
    let name = src
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| src.display().to_string());
    output::detail(&format!("copying {}", name));

    let total = count_files(src)?;
    let label = format!("copying {}", name);
    let progress = ProgressReporter::with_display(&label, total, DEFAULT_BAR_WIDTH);
    let copied = copy_path(src, dest, &progress)?;
    progress.update(total);
    progress.finish("copy completed");
    Ok(copied)
}

fn walk_error(root: &Path, err: walkdir::Error) -> PathError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    PathError::new(path, source)
}
