//! Native archive extraction (no external tools needed)
//!
//! Zip and gzip-compressed tar archives are expanded into a destination
//! directory with per-entry progress. Tarballs are read twice: once to count
//! the entries that size the progress bar, then again after rewinding the file
//! to write them out.
//!
//! Entries with absolute paths or `..` components are rejected before anything
//! is written for them.

use crate::core::error::{ExtractError, PathError};
use crate::core::output;
use crate::helpers::internal::fs_utils;
use crate::helpers::internal::progress::{DEFAULT_BAR_WIDTH, ProgressReporter};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

/// What an extraction did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Progress total: every zip entry, or the directory and regular entries of a tarball
    pub entries: u64,
    pub files: u64,
    pub directories: u64,
    /// Tar entries that are neither directories nor regular files
    pub skipped: u64,
    /// Number of progress advances made while writing
    pub advances: u64,
}

/// Extract an archive, picking the format from its file name.
pub fn extract(archive: &Path, dest: &Path) -> Result<ExtractSummary, ExtractError> {
    let name = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.ends_with(".zip") {
        extract_zip(archive, dest)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive, dest)
    } else {
        Err(ExtractError::UnsupportedFormat {
            path: archive.to_path_buf(),
        })
    }
}

/// Extract a zip archive into `dest`.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<ExtractSummary, ExtractError> {
    let filename = display_name(archive_path);
    output::detail(&format!("extracting {}", filename));

    let label = format!("extracting {}", filename);
    let progress = ProgressReporter::with_display(&label, 0, DEFAULT_BAR_WIDTH);
    let summary = extract_zip_with(archive_path, dest, &progress)?;
    progress.update(summary.entries);
    progress.finish("extract completed");
    Ok(summary)
}

/// Extract a gzip-compressed tarball into `dest`.
pub fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<ExtractSummary, ExtractError> {
    let filename = display_name(archive_path);
    output::detail(&format!("extracting {}", filename));

    let label = format!("extracting {}", filename);
    let progress = ProgressReporter::with_display(&label, 0, DEFAULT_BAR_WIDTH);
    let summary = extract_tar_gz_with(archive_path, dest, &progress)?;
    progress.finish("extract completed");
    Ok(summary)
}

/// Zip extraction against a caller-supplied reporter.
///
/// The total is the entry count; only file entries advance the counter.
pub fn extract_zip_with(
    archive_path: &Path,
    dest: &Path,
    progress: &ProgressReporter,
) -> Result<ExtractSummary, ExtractError> {
    let file = File::open(archive_path).map_err(|e| PathError::new(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| zip_error(archive_path, e))?;

    let mut summary = ExtractSummary {
        entries: archive.len() as u64,
        ..Default::default()
    };
    progress.set_total(summary.entries);
    fs_utils::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| zip_error(archive_path, e))?;

        let rel = checked_relative(entry.name())?;
        let outpath = dest.join(&rel);

        if entry.is_dir() {
            fs_utils::create_dir_all(&outpath)?;
            summary.directories += 1;
            continue;
        }

        fs_utils::ensure_parent_dir(&outpath)?;
        let mut outfile = File::create(&outpath).map_err(|e| PathError::new(&outpath, e))?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| PathError::new(&outpath, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            set_mode(&outpath, mode)?;
        }

        summary.files += 1;
        summary.advances += 1;
        progress.advance(1);
    }

    Ok(summary)
}

/// Tar+gzip extraction against a caller-supplied reporter.
///
/// Pass one counts directory and regular entries without writing anything.
/// The file is then rewound and pass two writes them, advancing once per
/// counted entry. Other entry types are skipped.
pub fn extract_tar_gz_with(
    archive_path: &Path,
    dest: &Path,
    progress: &ProgressReporter,
) -> Result<ExtractSummary, ExtractError> {
    let file = File::open(archive_path).map_err(|e| PathError::new(archive_path, e))?;

    // Pass one: count
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let mut counted = 0u64;
    for entry in archive.entries().map_err(|e| tar_error(archive_path, e))? {
        let entry = entry.map_err(|e| tar_error(archive_path, e))?;
        let kind = entry.header().entry_type();
        if kind.is_dir() || kind.is_file() {
            counted += 1;
        }
    }

    // Rewind the same handle and start a fresh decoder
    let mut file = archive.into_inner().into_inner().into_inner();
    file.seek(SeekFrom::Start(0))
        .map_err(|e| PathError::new(archive_path, e))?;

    let mut summary = ExtractSummary {
        entries: counted,
        ..Default::default()
    };
    progress.set_total(counted);
    fs_utils::create_dir_all(dest)?;

    // Pass two: write
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    for entry in archive.entries().map_err(|e| tar_error(archive_path, e))? {
        let mut entry = entry.map_err(|e| tar_error(archive_path, e))?;
        let kind = entry.header().entry_type();

        if !kind.is_dir() && !kind.is_file() {
            summary.skipped += 1;
            continue;
        }

        let rel = {
            let raw = entry.path().map_err(|e| tar_error(archive_path, e))?;
            checked_relative(&raw.to_string_lossy())?
        };
        let outpath = dest.join(&rel);

        if kind.is_dir() {
            fs_utils::create_dir_all(&outpath)?;
            summary.directories += 1;
        } else {
            fs_utils::ensure_parent_dir(&outpath)?;
            let mut outfile = File::create(&outpath).map_err(|e| PathError::new(&outpath, e))?;
            std::io::copy(&mut entry, &mut outfile).map_err(|e| PathError::new(&outpath, e))?;

            #[cfg(unix)]
            if let Ok(mode) = entry.header().mode() {
                set_mode(&outpath, mode)?;
            }

            summary.files += 1;
        }

        summary.advances += 1;
        progress.advance(1);
    }

    Ok(summary)
}

/// Turn an archive entry name into a path relative to the destination.
///
/// Rejects absolute paths and any `..` component. A bare `.` maps to the
/// destination itself.
fn checked_relative(name: &str) -> Result<PathBuf, ExtractError> {
    let unsafe_path = || ExtractError::UnsafePath {
        entry: name.to_string(),
    };

    // Zip names always use '/', but some Windows tools write '\'
    let normalized = name.replace('\\', "/");
    let mut rel = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(seg) => rel.push(seg),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path());
            }
        }
    }
    Ok(rel)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), PathError> {
    use std::os::unix::fs::PermissionsExt;
    // Only permission bits; keep files readable and writable by the owner
    let mode = (mode & 0o777) | 0o600;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| PathError::new(path, e))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string())
}

fn zip_error(path: &Path, err: zip::result::ZipError) -> ExtractError {
    match err {
        zip::result::ZipError::Io(source) => ExtractError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => ExtractError::Format {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

/// The tar crate reports both I/O and header problems as `io::Error`
fn tar_error(path: &Path, err: std::io::Error) -> ExtractError {
    match err.kind() {
        std::io::ErrorKind::InvalidData
        | std::io::ErrorKind::InvalidInput
        | std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::Other => ExtractError::Format {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
        _ => ExtractError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    }
}
