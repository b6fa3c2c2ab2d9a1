//! Archive downloads
//!
//! Streams an HTTP response body to disk in fixed-size chunks, reporting
//! byte-level progress. The [`Fetcher`] trait lets the installer be driven
//! without network access.

use crate::core::error::{FetchError, PathError};
use crate::core::output;
use crate::helpers::internal::fs_utils;
use crate::helpers::internal::progress::{DEFAULT_BAR_WIDTH, ProgressReporter};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Bytes read from the response per iteration
pub const CHUNK_SIZE: usize = 8192;

/// Default read timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Connect timeout; reads use the configurable timeout instead
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads a URL to a file.
pub trait Fetcher {
    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// A partially written `dest` is left behind on failure.
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// HTTP(S) downloader backed by a `ureq` agent.
pub struct HttpFetcher {
    agent: ureq::Agent,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new(read_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(read_timeout)
            .user_agent(concat!("install-deps/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            show_progress: true,
        }
    }

    /// Read timeout from `DEPS_HTTP_TIMEOUT` (seconds), clamped to 5..=300.
    pub fn from_env() -> Self {
        let value = std::env::var("DEPS_HTTP_TIMEOUT").ok();
        Self::new(read_timeout(value.as_deref()))
    }

    /// Keep the terminal quiet (progress is still tracked).
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

fn read_timeout(value: Option<&str>) -> Duration {
    let secs = value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Duration::from_secs(secs.clamp(5, 300))
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let filename = dest
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "download".to_string());
        output::detail(&format!("downloading {}", url));

        let response = self.agent.get(url).call().map_err(|e| map_ureq_error(url, e))?;
        if !(200..300).contains(&response.status()) {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                code: response.status(),
            });
        }

        // Missing or unparsable length means indeterminate progress
        let total = response
            .header("content-length")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);

        let progress = if self.show_progress {
            ProgressReporter::with_display(&filename, total, DEFAULT_BAR_WIDTH)
        } else {
            ProgressReporter::new(total, DEFAULT_BAR_WIDTH)
        };

        let written = stream_to_file(response.into_reader(), dest, &progress)?;
        if total == 0 {
            progress.set_total(written);
        }
        progress.update(written);
        progress.finish("download completed");

        output::detail(&format!("downloaded {} ({} bytes)", filename, written));
        Ok(written)
    }
}

/// Copy `reader` into a freshly created `dest`, one chunk at a time.
pub fn stream_to_file<R: Read>(
    mut reader: R,
    dest: &Path,
    progress: &ProgressReporter,
) -> Result<u64, FetchError> {
    fs_utils::ensure_parent_dir(dest)?;
    let mut file = File::create(dest).map_err(|e| PathError::new(dest, e))?;

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PathError::new(dest, e).into()),
        };

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| PathError::new(dest, e))?;

        total_bytes += bytes_read as u64;
        progress.update(total_bytes);
    }

    file.flush().map_err(|e| PathError::new(dest, e))?;
    Ok(total_bytes)
}

fn map_ureq_error(url: &str, err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(code, _) => FetchError::HttpStatus {
            url: url.to_string(),
            code,
        },
        ureq::Error::Transport(t) => FetchError::Transport {
            url: url.to_string(),
            reason: t.to_string(),
        },
    }
}
