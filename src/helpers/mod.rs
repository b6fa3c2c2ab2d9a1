//! Pipeline helpers
//!
//! Each helper takes explicit inputs and returns explicit outputs; the
//! orchestration in [`crate::engine`] decides the order.
//!
//! ## Categories
//!
//! - **acquire**: download archives (`Fetcher`, `HttpFetcher`)
//! - **build**: extract archives, plan and execute builds
//! - **internal**: progress reporting and filesystem utilities

pub mod acquire;
pub mod build;
pub mod internal;
