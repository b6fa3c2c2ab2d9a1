//! Acquisition orchestrator
//!
//! Runs the selected dependencies one after another through
//! download, extraction and build, skipping those already installed.

mod lifecycle;
pub mod scratch;
pub mod stamp;

pub use scratch::ScratchArea;
pub use stamp::InstallStamp;

use crate::core::config::{DependencySpec, Layout};
use crate::core::error::InstallError;
use crate::core::output;
use crate::helpers::acquire::Fetcher;
use crate::helpers::build::{CommandRunner, HostTarget};
use crate::helpers::internal::fs_utils;

/// What happened to one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Installed,
    Skipped,
}

/// Per-dependency outcomes of a successful run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub entries: Vec<(String, Outcome)>,
}

impl RunReport {
    pub fn outcome(&self, name: &str) -> Option<Outcome> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| *o)
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|(_, o)| *o == outcome).count()
    }
}

/// Installs dependencies into a project's `deps/` directory.
pub struct Installer<F, R> {
    fetcher: F,
    runner: R,
    layout: Layout,
    host: HostTarget,
}

impl<F: Fetcher, R: CommandRunner> Installer<F, R> {
    pub fn new(fetcher: F, runner: R, layout: Layout) -> Self {
        Self {
            fetcher,
            runner,
            layout,
            host: HostTarget::current(),
        }
    }

    /// Plan builds for `host` instead of the running machine.
    pub fn with_host(mut self, host: HostTarget) -> Self {
        self.host = host;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Install `specs` in order, stopping at the first failure.
    ///
    /// The scratch directory is removed before this returns, on every path.
    pub fn run(&self, specs: &[DependencySpec]) -> Result<RunReport, InstallError> {
        fs_utils::create_dir_all(&self.layout.deps_dir)?;
        let scratch = ScratchArea::create(&self.layout.scratch_dir)?;

        let mut report = RunReport::default();
        let total = specs.len();
        for (i, spec) in specs.iter().enumerate() {
            let title = format!("{} {}", spec.name(), spec.version);
            output::action_numbered(i + 1, total, &title);
            let outcome = lifecycle::install(
                spec,
                &self.layout,
                &self.host,
                &self.fetcher,
                &self.runner,
            )?;
            report.entries.push((spec.name().to_string(), outcome));
        }

        let cleanup = output::spinner("removing scratch directory");
        scratch.remove()?;
        cleanup.finish_and_clear();

        output::success(&format!(
            "{} installed, {} already present",
            report.count(Outcome::Installed),
            report.count(Outcome::Skipped)
        ));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lookup() {
        let report = RunReport {
            entries: vec![
                ("sqlite3".to_string(), Outcome::Skipped),
                ("openssl".to_string(), Outcome::Installed),
            ],
        };
        assert_eq!(report.outcome("openssl"), Some(Outcome::Installed));
        assert_eq!(report.outcome("gtest"), None);
        assert_eq!(report.count(Outcome::Skipped), 1);
    }
}
