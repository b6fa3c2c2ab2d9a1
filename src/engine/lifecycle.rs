//! Lifecycle of a single dependency
//!
//! The flow:
//! 1. stamp present - already installed, skip
//! 2. directory present without stamp - not ours, stop without touching it
//! 3. plan - fails here on unsupported hosts, before any download
//! 4. download, extract, build/relocate
//! 5. write the stamp

use super::Outcome;
use super::stamp::{self, InstallStamp};
use crate::core::config::{DependencySpec, Layout};
use crate::core::error::{BuildError, InstallError};
use crate::core::output;
use crate::helpers::acquire::Fetcher;
use crate::helpers::build::{CommandRunner, HostTarget, execute_plan, extract, plan_for};

pub(super) fn install<F, R>(
    spec: &DependencySpec,
    layout: &Layout,
    host: &HostTarget,
    fetcher: &F,
    runner: &R,
) -> Result<Outcome, InstallError>
where
    F: Fetcher + ?Sized,
    R: CommandRunner + ?Sized,
{
    let name = spec.name();
    let artifact_dir = layout.artifact_dir(spec);

    // PHASE 1: already installed?
    if let Some(existing) = stamp::read(&artifact_dir)? {
        if existing.version != spec.version {
            output::info(&format!(
                "{} {} is installed but {} was requested; remove {} to reinstall",
                name,
                existing.version,
                spec.version,
                artifact_dir.display()
            ));
        }
        output::skip(&format!("{} already present, skipping", spec.final_dir()));
        return Ok(Outcome::Skipped);
    }

    // Unstamped content was not put there by a completed install; leave it alone
    if artifact_dir.exists() {
        return Err(InstallError::Unmanaged {
            dependency: name.to_string(),
            path: artifact_dir,
        });
    }

    let build_err = |source: BuildError| InstallError::Build {
        dependency: name.to_string(),
        source,
    };

    let plan = plan_for(spec, host, layout).map_err(build_err)?;

    // PHASE 2: acquire
    output::sub_action("download");
    let archive = layout.archive_path(spec);
    fetcher
        .fetch(&spec.url(), &archive)
        .map_err(|source| InstallError::Fetch {
            dependency: name.to_string(),
            source,
        })?;

    output::sub_action("extract");
    extract(&archive, &layout.scratch_dir).map_err(|source| InstallError::Extract {
        dependency: name.to_string(),
        source,
    })?;

    // PHASE 3: build (or just relocate)
    output::sub_action(if plan.is_prebuilt() { "install" } else { "build" });
    execute_plan(&plan, runner).map_err(build_err)?;

    // PHASE 4: mark complete
    stamp::write(&artifact_dir, &InstallStamp::for_spec(spec))?;
    output::success(&format!("{} {} installed", name, spec.version));

    Ok(Outcome::Installed)
}
