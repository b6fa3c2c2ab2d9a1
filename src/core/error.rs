//! Error types for every stage of the pipeline.
//!
//! Each stage has its own enum; [`InstallError`] wraps them with the name of
//! the dependency that failed and maps them onto process exit codes.

use std::path::PathBuf;
use thiserror::Error;

/// An I/O failure tied to the path it happened on.
#[derive(Debug, Error)]
#[error("I/O error on {}: {source}", path.display())]
pub struct PathError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl PathError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Errors from downloading an archive.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("HTTP status {code} for {url}")]
    HttpStatus { url: String, code: u16 },

    /// The request never produced a response (DNS, connect, TLS).
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// Reading the body or writing the destination failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from unpacking an archive.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive is corrupt or not in the expected format.
    #[error("malformed archive {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("unsupported archive format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// An entry would land outside the destination directory.
    #[error("archive entry escapes destination: {entry}")]
    UnsafePath { entry: String },
}

/// Errors from building a dependency or relocating its outputs.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(
        "PowerShell execution policy is {policy}; scripts need RemoteSigned, Unrestricted or Bypass"
    )]
    PolicyDenied { policy: String },

    #[error("unsupported platform {os}; supported platforms are Windows, Linux and macOS")]
    UnsupportedPlatform { os: String },

    #[error("build step '{step}' failed with exit code {}", display_code(*code))]
    StepFailed { step: String, code: Option<i32> },

    #[error("cannot run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build finished but {} was not produced", path.display())]
    MissingArtifact { path: PathBuf },
}

impl From<PathError> for FetchError {
    fn from(e: PathError) -> Self {
        FetchError::Io {
            path: e.path,
            source: e.source,
        }
    }
}

impl From<PathError> for ExtractError {
    fn from(e: PathError) -> Self {
        ExtractError::Io {
            path: e.path,
            source: e.source,
        }
    }
}

impl From<PathError> for BuildError {
    fn from(e: PathError) -> Self {
        BuildError::Io {
            path: e.path,
            source: e.source,
        }
    }
}

impl From<PathError> for InstallError {
    fn from(e: PathError) -> Self {
        InstallError::Io {
            path: e.path,
            source: e.source,
        }
    }
}

fn display_code(code: Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

/// Errors from resolving configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value \"{value}\" for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Top-level error of an installer run.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{dependency}: download failed: {source}")]
    Fetch {
        dependency: String,
        #[source]
        source: FetchError,
    },

    #[error("{dependency}: extraction failed: {source}")]
    Extract {
        dependency: String,
        #[source]
        source: ExtractError,
    },

    #[error("{dependency}: {source}")]
    Build {
        dependency: String,
        #[source]
        source: BuildError,
    },

    /// `deps/<dir>` holds files this tool did not install.
    #[error(
        "{dependency}: {} exists but has no install stamp; remove it to reinstall",
        path.display()
    )]
    Unmanaged { dependency: String, path: PathBuf },

    /// Local filesystem work outside a specific stage (scratch, stamps).
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            InstallError::Config(_) => 2,
            InstallError::Fetch { .. } => 3,
            InstallError::Extract { .. } => 4,
            InstallError::Build { source, .. } => match source {
                BuildError::PolicyDenied { .. } => 6,
                BuildError::UnsupportedPlatform { .. } => 7,
                BuildError::Io { .. } => 8,
                BuildError::StepFailed { .. }
                | BuildError::Spawn { .. }
                | BuildError::MissingArtifact { .. } => 5,
            },
            InstallError::Io { .. } => 8,
            InstallError::Unmanaged { .. } => 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(source: BuildError) -> InstallError {
        InstallError::Build {
            dependency: "openssl".to_string(),
            source,
        }
    }

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let config = InstallError::Config(ConfigError::InvalidValue {
            name: "SQLITE_VERSION".into(),
            value: "x".into(),
            reason: "not a number".into(),
        });
        let fetch = InstallError::Fetch {
            dependency: "sqlite3".into(),
            source: FetchError::HttpStatus {
                url: "http://x".into(),
                code: 404,
            },
        };
        let extract = InstallError::Extract {
            dependency: "gtest".into(),
            source: ExtractError::UnsafePath {
                entry: "../x".into(),
            },
        };
        let step = build(BuildError::StepFailed {
            step: "make".into(),
            code: Some(2),
        });
        let policy = build(BuildError::PolicyDenied {
            policy: "Restricted".into(),
        });
        let platform = build(BuildError::UnsupportedPlatform {
            os: "freebsd".into(),
        });

        let codes = [
            config.exit_code(),
            fetch.exit_code(),
            extract.exit_code(),
            step.exit_code(),
            policy.exit_code(),
            platform.exit_code(),
        ];
        assert_eq!(codes, [2, 3, 4, 5, 6, 7]);
        assert!(codes.iter().all(|c| *c != 0));
    }

    #[test]
    fn test_unmanaged_directory_has_own_exit_code() {
        let err = InstallError::Unmanaged {
            dependency: "openssl".into(),
            path: PathBuf::from("/work/deps/openssl"),
        };
        assert_eq!(err.exit_code(), 9);
        let msg = err.to_string();
        assert!(msg.starts_with("openssl: /work/deps/openssl exists"));
        assert!(msg.contains("remove it to reinstall"));
    }

    #[test]
    fn test_step_failed_message_names_step_and_code() {
        let err = BuildError::StepFailed {
            step: "make install".into(),
            code: Some(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("make install"));
        assert!(msg.contains("exit code 2"));
    }

    #[test]
    fn test_step_failed_without_code() {
        let err = BuildError::StepFailed {
            step: "cmake".into(),
            code: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_install_error_includes_dependency() {
        let err = InstallError::Fetch {
            dependency: "openssl".into(),
            source: FetchError::HttpStatus {
                url: "https://example.test/openssl.tar.gz".into(),
                code: 503,
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("openssl: download failed"));
        assert!(msg.contains("503"));
    }
}
