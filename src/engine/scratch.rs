//! The run-scoped scratch directory (`temp/`)
//!
//! Archives are downloaded and unpacked here. The directory belongs to one
//! installer run and is removed exactly once when that run ends, whether it
//! returns normally, returns an error, or unwinds.

use crate::core::error::PathError;
use crate::core::output;
use crate::helpers::internal::fs_utils;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct ScratchArea {
    path: PathBuf,
    removed: bool,
}

impl ScratchArea {
    /// Create the scratch directory, clearing anything a previous run left.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, PathError> {
        let path = path.into();
        if path.exists() {
            output::detail(&format!("clearing leftover {}", path.display()));
            fs_utils::remove_dir_all(&path)?;
        }
        fs_utils::create_dir_all(&path)?;
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now and report failures to the caller.
    pub fn remove(mut self) -> Result<(), PathError> {
        self.removed = true;
        fs_utils::remove_dir_all(&self.path)
    }
}

impl Drop for ScratchArea {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(e) = fs_utils::remove_dir_all(&self.path) {
            output::warning(&format!("could not remove {}: {}", self.path.display(), e));
        }
    }
}
