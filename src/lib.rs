//! Native dependency installer
//!
//! Downloads, unpacks and builds the third-party C/C++ libraries a native
//! project links against, and leaves them in a fixed layout under the
//! project root:
//!
//! ```text
//! deps/
//!   sqlite-amalgamation/   SQLite amalgamation sources
//!   openssl/               OpenSSL install prefix
//!   googletest/            GoogleTest headers, sources and built libraries
//! ```
//!
//! Each dependency goes through the same lifecycle:
//!
//! 1. skip if `deps/<dir>/.install-stamp.toml` exists
//! 2. download the archive into `temp/`
//! 3. extract it there
//! 4. run the host-specific build plan (or just move the sources)
//! 5. write the stamp
//!
//! `temp/` is removed when the run ends, whatever the outcome.
//!
//! # Configuration
//!
//! Versions come from `SQLITE_VERSION`, `SQLITE_VERSION_RELEASE_YEAR`,
//! `OPENSSL_VERSION` and `GTEST_VERSION`; download locations can be pointed
//! at a mirror with `SQLITE_URL`, `OPENSSL_URL` and `GTEST_URL`. See
//! [`core::config`].
//!
//! # Example
//!
//! ```no_run
//! use install_deps::core::config::{Config, Dependency, Layout};
//! use install_deps::helpers::acquire::HttpFetcher;
//! use install_deps::helpers::build::SystemRunner;
//! use install_deps::Installer;
//!
//! let config = Config::from_env()?;
//! let layout = Layout::new(".", ".");
//! let installer = Installer::new(HttpFetcher::from_env(), SystemRunner, layout);
//! installer.run(&config.select(&Dependency::ALL))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod core;
pub mod engine;
pub mod helpers;

pub use crate::core::output;
pub use engine::{Installer, Outcome, RunReport};
