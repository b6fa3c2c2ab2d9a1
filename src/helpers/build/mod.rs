//! Build phase helpers: turning downloaded archives into installed artifacts
//!
//! - **extract**: unpack zip and tar.gz archives
//! - **plan**: what to run for a dependency on a given host
//! - **exec**: run a plan and relocate its outputs

pub mod exec;
pub mod extract;
pub mod plan;

pub use exec::{CommandRunner, StepExit, SystemRunner, execute_plan};
pub use extract::{ExtractSummary, extract};
pub use plan::{BuildPlan, HostOs, HostTarget, plan_for};
