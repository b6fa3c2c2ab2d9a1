//! Install stamps
//!
//! A dependency counts as installed when `deps/<dir>/.install-stamp.toml`
//! exists. The stamp is written last, after every other step succeeded.

use crate::core::config::DependencySpec;
use crate::core::error::PathError;
use crate::core::output;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STAMP_FILE: &str = ".install-stamp.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStamp {
    pub name: String,
    pub version: String,
    pub url: String,
}

impl InstallStamp {
    pub fn for_spec(spec: &DependencySpec) -> Self {
        Self {
            name: spec.name().to_string(),
            version: spec.version.clone(),
            url: spec.url(),
        }
    }
}

pub fn stamp_path(artifact_dir: &Path) -> PathBuf {
    artifact_dir.join(STAMP_FILE)
}

/// Read the stamp in `artifact_dir`.
///
/// A missing stamp is `None`. So is one that does not parse, after a
/// warning; the directory then counts as unmanaged and is left alone.
pub fn read(artifact_dir: &Path) -> Result<Option<InstallStamp>, PathError> {
    let path = stamp_path(artifact_dir);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PathError::new(path, e)),
    };

    match toml::from_str(&content) {
        Ok(stamp) => Ok(Some(stamp)),
        Err(e) => {
            output::warning(&format!("ignoring unreadable {}: {}", path.display(), e));
            Ok(None)
        }
    }
}

pub fn write(artifact_dir: &Path, stamp: &InstallStamp) -> Result<(), PathError> {
    let path = stamp_path(artifact_dir);
    let content = toml::to_string(stamp)
        .map_err(|e| PathError::new(&path, std::io::Error::other(e)))?;
    std::fs::write(&path, content).map_err(|e| PathError::new(path, e))
}
