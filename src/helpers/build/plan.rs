//! Build plans
//!
//! Host-specific build knowledge lives here as data. [`plan_for`] turns a
//! dependency and a host into the ordered list of commands to run and the
//! moves/copies that put the results under `deps/`. Nothing in this module
//! touches the filesystem or spawns processes; see
//! [`exec`](super::exec) for that.

use crate::core::config::{Dependency, DependencySpec, Layout};
use crate::core::error::BuildError;
use std::fmt;
use std::path::PathBuf;

/// Operating system family of the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Linux,
    MacOs,
    Other(String),
}

impl HostOs {
    pub fn from_name(name: &str) -> Self {
        match name {
            "windows" => HostOs::Windows,
            "linux" => HostOs::Linux,
            "macos" => HostOs::MacOs,
            other => HostOs::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOs::Windows => f.write_str("windows"),
            HostOs::Linux => f.write_str("linux"),
            HostOs::MacOs => f.write_str("macos"),
            HostOs::Other(name) => f.write_str(name),
        }
    }
}

/// The machine the build runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    pub os: HostOs,
    /// As reported by `std::env::consts::ARCH` (`x86_64`, `aarch64`, ...)
    pub arch: String,
}

impl HostTarget {
    pub fn new(os: HostOs, arch: impl Into<String>) -> Self {
        Self {
            os,
            arch: arch.into(),
        }
    }

    pub fn current() -> Self {
        Self::new(
            HostOs::from_name(std::env::consts::OS),
            std::env::consts::ARCH,
        )
    }
}

/// How a step's standard output reaches the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Child writes straight to our stdout/stderr
    Inherit,
    /// Stdout is piped and echoed line by line as it arrives
    LineStream,
}

/// One external command in a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    /// Short name used in progress lines and errors
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub output: OutputMode,
}

impl CommandStep {
    fn new(label: &str, program: &str, args: Vec<String>, working_dir: PathBuf) -> Self {
        Self {
            label: label.to_string(),
            program: program.to_string(),
            args,
            working_dir,
            output: OutputMode::Inherit,
        }
    }

    fn line_stream(mut self) -> Self {
        self.output = OutputMode::LineStream;
        self
    }

    /// `program arg1 arg2 ...`, for display
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Moving built outputs into their final place
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    Move { from: PathBuf, to: PathBuf },
    Copy { from: PathBuf, to: PathBuf },
}

/// Checks that must pass before any step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precheck {
    /// PowerShell must allow running local scripts
    ExecutionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub precheck: Option<Precheck>,
    pub steps: Vec<CommandStep>,
    pub relocations: Vec<Relocation>,
    /// Must exist once the plan has run
    pub artifact_dir: PathBuf,
}

impl BuildPlan {
    /// Nothing to compile, only relocation
    pub fn is_prebuilt(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Compute the build plan for `spec` on `host`.
pub fn plan_for(
    spec: &DependencySpec,
    host: &HostTarget,
    layout: &Layout,
) -> Result<BuildPlan, BuildError> {
    let source = layout.source_dir(spec);
    let artifact_dir = layout.artifact_dir(spec);

    let (precheck, steps, relocations) = match (spec.dependency, &host.os) {
        (Dependency::Sqlite, _) => (
            None,
            Vec::new(),
            vec![Relocation::Move {
                from: source,
                to: artifact_dir.clone(),
            }],
        ),

        (Dependency::OpenSsl, HostOs::Windows) => (
            Some(Precheck::ExecutionPolicy),
            vec![windows_script_step(
                "build openssl",
                layout,
                "win-build-openssl.ps1",
                "-openssl",
                &spec.source_dir,
            )],
            Vec::new(),
        ),
        (Dependency::OpenSsl, HostOs::Linux | HostOs::MacOs) => {
            let target = openssl_target(host)?;
            let mut configure = vec![
                source.join("Configure").display().to_string(),
                "shared".to_string(),
                format!("--prefix={}", artifact_dir.display()),
            ];
            configure.extend(OPENSSL_CONFIGURE_FLAGS.iter().map(|s| s.to_string()));
            configure.push(target.to_string());

            (
                None,
                vec![
                    CommandStep::new("configure", "perl", configure, source.clone()),
                    CommandStep::new(
                        "make",
                        "make",
                        vec![format!("-j{}", num_cpus::get())],
                        source.clone(),
                    ),
                    CommandStep::new("make install", "make", vec!["install".to_string()], source),
                ],
                Vec::new(),
            )
        }

        (Dependency::GTest, HostOs::Windows) => (
            Some(Precheck::ExecutionPolicy),
            vec![windows_script_step(
                "build googletest",
                layout,
                "win-build-gtest.ps1",
                "-gtest",
                &spec.source_dir,
            )],
            Vec::new(),
        ),
        (Dependency::GTest, HostOs::Linux | HostOs::MacOs) => {
            let steps = vec![
                CommandStep::new(
                    "cmake configure",
                    "cmake",
                    args(&[".", "-DBUILD_GMOCK=OFF", "-DGTEST_DISABLE_PTHREADS=ON"]),
                    source.clone(),
                ),
                CommandStep::new(
                    "cmake build",
                    "cmake",
                    vec![
                        "--build".to_string(),
                        ".".to_string(),
                        "--config".to_string(),
                        "Release".to_string(),
                        "--parallel".to_string(),
                        num_cpus::get().to_string(),
                    ],
                    source.clone(),
                ),
            ];
            let relocations = GTEST_OUTPUTS
                .iter()
                .map(|name| Relocation::Copy {
                    from: source.join(name),
                    to: artifact_dir.join(name),
                })
                .collect();
            (None, steps, relocations)
        }

        (Dependency::OpenSsl | Dependency::GTest, HostOs::Other(os)) => {
            return Err(BuildError::UnsupportedPlatform { os: os.clone() });
        }
    };

    Ok(BuildPlan {
        precheck,
        steps,
        relocations,
        artifact_dir,
    })
}

/// Algorithms and features left out of the OpenSSL build
const OPENSSL_CONFIGURE_FLAGS: &[&str] = &[
    "--debug",
    "no-md2",
    "no-rc4",
    "no-idea",
    "no-camellia",
    "no-ec",
    "no-engine",
    "no-tests",
];

/// What downstream builds need from a GoogleTest build tree
const GTEST_OUTPUTS: &[&str] = &["lib", "googletest", "CMakeLists.txt"];

/// OpenSSL `Configure` target name for a POSIX host.
pub fn openssl_target(host: &HostTarget) -> Result<&'static str, BuildError> {
    match (&host.os, host.arch.as_str()) {
        (HostOs::Linux, "x86_64") => Ok("linux-x86_64"),
        (HostOs::Linux, "aarch64") => Ok("linux-aarch64"),
        (HostOs::MacOs, "aarch64") => Ok("darwin64-arm64"),
        (HostOs::MacOs, "x86_64") => Ok("darwin64-x86_64"),
        (os, arch) => Err(BuildError::UnsupportedPlatform {
            os: format!("{}-{}", os, arch),
        }),
    }
}

fn windows_script_step(
    label: &str,
    layout: &Layout,
    script: &str,
    source_flag: &str,
    source_dir: &str,
) -> CommandStep {
    CommandStep::new(
        label,
        "powershell.exe",
        vec![
            "-File".to_string(),
            layout.script(script).display().to_string(),
            "-tempPath".to_string(),
            layout.scratch_dir.display().to_string(),
            "-depsPath".to_string(),
            layout.deps_dir.display().to_string(),
            source_flag.to_string(),
            source_dir.to_string(),
        ],
        layout.project_root.clone(),
    )
    .line_stream()
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
