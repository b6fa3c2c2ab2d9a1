//! Core infrastructure shared by every pipeline stage
//!
//! Configuration, error types and console output.

pub mod config;
pub mod error;
pub mod output;
