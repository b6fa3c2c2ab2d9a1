//! Internal utilities used by the acquire and build helpers

pub mod fs_utils;
pub mod progress;
