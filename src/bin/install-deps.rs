//! install-deps - fetch and build the native dependencies of a project
//!
//! Usage:
//!   install-deps                     Install everything not yet present
//!   install-deps --no-gtest          Skip GoogleTest
//!   install-deps --all               Install everything, ignoring --no-*

use anyhow::{Context, Result};
use clap::Parser;
use install_deps::core::config::{Config, Dependency, Layout};
use install_deps::core::error::InstallError;
use install_deps::helpers::acquire::HttpFetcher;
use install_deps::helpers::build::SystemRunner;
use install_deps::{Installer, output};
use std::path::PathBuf;
use std::process::ExitCode;

const AFTER_HELP: &str = "\
Dependencies (disable with --no-<name>):
  sqlite3   SQLite amalgamation  -> deps/sqlite-amalgamation
  openssl   OpenSSL              -> deps/openssl
  gtest     GoogleTest           -> deps/googletest

Environment:
  SQLITE_VERSION, SQLITE_VERSION_RELEASE_YEAR, OPENSSL_VERSION, GTEST_VERSION
  SQLITE_URL, OPENSSL_URL, GTEST_URL    download URL templates
  DEPS_HTTP_TIMEOUT                     read timeout in seconds";

#[derive(Parser, Debug)]
#[command(name = "install-deps")]
#[command(about = "Download and build native dependencies into deps/")]
#[command(version)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Do not install the SQLite amalgamation
    #[arg(long = "no-sqlite3")]
    no_sqlite3: bool,

    /// Do not install OpenSSL
    #[arg(long = "no-openssl")]
    no_openssl: bool,

    /// Do not install GoogleTest
    #[arg(long = "no-gtest")]
    no_gtest: bool,

    /// Install every dependency, ignoring --no-* flags
    #[arg(long)]
    all: bool,

    /// Project root; deps/ and temp/ are created here
    #[arg(long, env = "DEPS_PROJECT_ROOT")]
    project_root: Option<PathBuf>,

    /// Directory containing the Windows build scripts
    #[arg(long, env = "DEPS_SCRIPTS_DIR")]
    scripts_dir: Option<PathBuf>,
}

impl Cli {
    fn selected(&self) -> Vec<Dependency> {
        Dependency::ALL
            .into_iter()
            .filter(|dep| self.all || !self.disabled(*dep))
            .collect()
    }

    fn disabled(&self, dep: Dependency) -> bool {
        match dep {
            Dependency::Sqlite => self.no_sqlite3,
            Dependency::OpenSsl => self.no_openssl,
            Dependency::GTest => self.no_gtest,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            let code = e
                .downcast_ref::<InstallError>()
                .map(InstallError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let root = cli.project_root.clone().unwrap_or_else(|| cwd.clone());
    let scripts = cli.scripts_dir.clone().unwrap_or(cwd);

    let config = Config::from_env().map_err(InstallError::from)?;
    let specs = config.select(&cli.selected());
    if specs.is_empty() {
        output::info("nothing selected");
        return Ok(());
    }

    output::action(&format!(
        "Installing {} into {}",
        specs.iter().map(|s| s.name()).collect::<Vec<_>>().join(", "),
        root.join("deps").display()
    ));
    let layout = Layout::new(root, scripts);
    let installer = Installer::new(HttpFetcher::from_env(), SystemRunner, layout);
    installer.run(&specs)?;
    Ok(())
}
