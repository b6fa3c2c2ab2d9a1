//! Acquire phase helpers
//!
//! Get source archives onto disk.

pub mod download;

pub use download::{Fetcher, HttpFetcher};
