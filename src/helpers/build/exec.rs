//! Running build plans
//!
//! [`execute_plan`] is the single loop that runs any [`BuildPlan`]: precheck,
//! then each step in order until one fails, then the relocations.
//! Processes are started through [`CommandRunner`] so plans can be exercised
//! without the real toolchains.

use crate::core::error::{BuildError, PathError};
use crate::core::output;
use crate::helpers::build::plan::{BuildPlan, CommandStep, OutputMode, Precheck, Relocation};
use crate::helpers::internal::fs_utils;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Command, Stdio};

/// Execution policies that allow running the build scripts
const ALLOWED_POLICIES: &[&str] = &["RemoteSigned", "Unrestricted", "Bypass"];

/// How a finished step exited. `None` means it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepExit(pub Option<i32>);

impl StepExit {
    pub fn success(self) -> bool {
        self.0 == Some(0)
    }
}

/// Starts external processes.
pub trait CommandRunner {
    /// Run a step to completion. `Err` only when it could not be started or
    /// its output could not be read.
    fn run(&self, step: &CommandStep) -> io::Result<StepExit>;

    /// Run a program and return its standard output.
    fn capture(&self, program: &str, args: &[&str]) -> io::Result<String>;
}

/// Runs commands on the host with `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, step: &CommandStep) -> io::Result<StepExit> {
        let mut cmd = Command::new(&step.program);
        cmd.args(&step.args)
            .current_dir(&step.working_dir)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit());

        let status = match step.output {
            OutputMode::Inherit => cmd.stdout(Stdio::inherit()).status()?,
            OutputMode::LineStream => {
                let mut child = cmd.stdout(Stdio::piped()).spawn()?;
                if let Some(stdout) = child.stdout.take()
                    && let Err(e) = stream_lines(stdout, output::passthrough)
                {
                    // Never return while the child is still running
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
                child.wait()?
            }
        };

        Ok(StepExit(status.code()))
    }

    fn capture(&self, program: &str, args: &[&str]) -> io::Result<String> {
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()?;
        Ok(String::from_utf8_lossy(&out.stdout).to_string())
    }
}

/// Echo `reader` line by line as it arrives.
///
/// Lines are decoded lossily; console code pages are often not UTF-8.
fn stream_lines<R: Read>(reader: R, mut emit: impl FnMut(&str)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
        let line = String::from_utf8_lossy(&buf);
        emit(line.trim_end_matches(['\r', '\n']));
    }
}

/// Run `plan` to completion, stopping at the first failure.
pub fn execute_plan<R: CommandRunner + ?Sized>(
    plan: &BuildPlan,
    runner: &R,
) -> Result<(), BuildError> {
    if let Some(check) = plan.precheck {
        run_precheck(check, runner)?;
    }

    let total = plan.steps.len();
    for (i, step) in plan.steps.iter().enumerate() {
        output::detail(&format!("[{}/{}] {}", i + 1, total, step.command_line()));

        let exit = runner.run(step).map_err(|source| BuildError::Spawn {
            program: step.program.clone(),
            source,
        })?;

        if !exit.success() {
            return Err(BuildError::StepFailed {
                step: step.label.clone(),
                code: exit.0,
            });
        }
    }

    for relocation in &plan.relocations {
        relocate(relocation)?;
    }

    if !plan.artifact_dir.is_dir() {
        return Err(BuildError::MissingArtifact {
            path: plan.artifact_dir.clone(),
        });
    }

    Ok(())
}

fn run_precheck<R: CommandRunner + ?Sized>(check: Precheck, runner: &R) -> Result<(), BuildError> {
    match check {
        Precheck::ExecutionPolicy => {
            let program = "powershell.exe";
            let raw = runner
                .capture(program, &["Get-ExecutionPolicy"])
                .map_err(|source| BuildError::Spawn {
                    program: program.to_string(),
                    source,
                })?;
            let policy = raw.trim();
            if !policy_allows_scripts(policy) {
                return Err(BuildError::PolicyDenied {
                    policy: policy.to_string(),
                });
            }
            output::detail(&format!("execution policy {}", policy));
            Ok(())
        }
    }
}

/// Whether a PowerShell execution policy lets local scripts run.
pub fn policy_allows_scripts(policy: &str) -> bool {
    ALLOWED_POLICIES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(policy.trim()))
}

fn relocate(relocation: &Relocation) -> Result<(), PathError> {
    match relocation {
        Relocation::Move { from, to } => {
            output::detail(&format!("moving {} -> {}", from.display(), to.display()));
            fs_utils::move_path(from, to)
        }
        Relocation::Copy { from, to } => fs_utils::copy_with_progress(from, to).map(|_| ()),
    }
}
