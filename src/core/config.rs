//! Dependency configuration
//!
//! Resolves versions and download URLs from environment variables with
//! hardcoded defaults, and describes the project layout the installer writes
//! into.

use crate::core::error::ConfigError;
use std::fmt;
use std::path::PathBuf;

const DEFAULT_SQLITE_VERSION: &str = "3.43.0";
const DEFAULT_SQLITE_YEAR: &str = "2023";
const DEFAULT_OPENSSL_VERSION: &str = "1.1.1i";
const DEFAULT_GTEST_VERSION: &str = "1.14.0";

const SQLITE_URL: &str = "https://www.sqlite.org/{year}/{source}.zip";
const OPENSSL_URL: &str = "https://www.openssl.org/source/openssl-{version}.tar.gz";
const GTEST_URL: &str = "https://github.com/google/googletest/archive/refs/tags/v{version}.zip";

/// Archive container of a dependency download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::TarGz => "tar.gz",
        }
    }
}

/// The native dependencies this installer knows how to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    Sqlite,
    OpenSsl,
    GTest,
}

impl Dependency {
    /// Every dependency, in installation order.
    pub const ALL: [Dependency; 3] = [Dependency::Sqlite, Dependency::OpenSsl, Dependency::GTest];

    /// Name used by the `--no-<key>` flags
    pub fn key(self) -> &'static str {
        match self {
            Dependency::Sqlite => "sqlite3",
            Dependency::OpenSsl => "openssl",
            Dependency::GTest => "gtest",
        }
    }

    /// Prefix of the `<PREFIX>_VERSION` / `<PREFIX>_URL` variables
    pub fn env_prefix(self) -> &'static str {
        match self {
            Dependency::Sqlite => "SQLITE",
            Dependency::OpenSsl => "OPENSSL",
            Dependency::GTest => "GTEST",
        }
    }

    /// Directory name under `deps/`
    pub fn final_dir(self) -> &'static str {
        match self {
            Dependency::Sqlite => "sqlite-amalgamation",
            Dependency::OpenSsl => "openssl",
            Dependency::GTest => "googletest",
        }
    }

    pub fn archive(self) -> ArchiveKind {
        match self {
            Dependency::OpenSsl => ArchiveKind::TarGz,
            Dependency::Sqlite | Dependency::GTest => ArchiveKind::Zip,
        }
    }

    fn default_version(self) -> &'static str {
        match self {
            Dependency::Sqlite => DEFAULT_SQLITE_VERSION,
            Dependency::OpenSsl => DEFAULT_OPENSSL_VERSION,
            Dependency::GTest => DEFAULT_GTEST_VERSION,
        }
    }

    fn default_url(self) -> &'static str {
        match self {
            Dependency::Sqlite => SQLITE_URL,
            Dependency::OpenSsl => OPENSSL_URL,
            Dependency::GTest => GTEST_URL,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One acquirable dependency, fully resolved. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub dependency: Dependency,
    pub version: String,
    /// Release year, only used by the SQLite download URL
    pub year: String,
    pub url_template: String,
    /// Top-level directory the archive unpacks into
    pub source_dir: String,
}

impl DependencySpec {
    pub fn name(&self) -> &'static str {
        self.dependency.key()
    }

    pub fn final_dir(&self) -> &'static str {
        self.dependency.final_dir()
    }

    pub fn archive(&self) -> ArchiveKind {
        self.dependency.archive()
    }

    /// File name of the downloaded archive inside the scratch area
    pub fn archive_name(&self) -> String {
        format!("{}.{}", self.source_dir, self.archive().extension())
    }

    /// Download URL with `{version}`, `{year}` and `{source}` substituted
    pub fn url(&self) -> String {
        self.url_template
            .replace("{version}", &self.version)
            .replace("{year}", &self.year)
            .replace("{source}", &self.source_dir)
    }
}

/// Resolved configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    sqlite: DependencySpec,
    openssl: DependencySpec,
    gtest: DependencySpec,
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    ///
    /// Unset and empty values both fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str, default: &str| -> String {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| default.to_string())
        };

        let year = get("SQLITE_VERSION_RELEASE_YEAR", DEFAULT_SQLITE_YEAR);
        validate_year(&year)?;

        let resolve = |dep: Dependency| -> Result<DependencySpec, ConfigError> {
            let version_var = format!("{}_VERSION", dep.env_prefix());
            let version = get(&version_var, dep.default_version());
            validate_version_chars(&version_var, &version)?;

            let source_dir = match dep {
                Dependency::Sqlite => sqlite_source_dir(&version)?,
                Dependency::OpenSsl => format!("openssl-{}", version),
                Dependency::GTest => format!("googletest-{}", version),
            };

            let url_template = get(&format!("{}_URL", dep.env_prefix()), dep.default_url());

            Ok(DependencySpec {
                dependency: dep,
                version,
                year: year.clone(),
                url_template,
                source_dir,
            })
        };

        Ok(Self {
            sqlite: resolve(Dependency::Sqlite)?,
            openssl: resolve(Dependency::OpenSsl)?,
            gtest: resolve(Dependency::GTest)?,
        })
    }

    pub fn spec(&self, dep: Dependency) -> &DependencySpec {
        match dep {
            Dependency::Sqlite => &self.sqlite,
            Dependency::OpenSsl => &self.openssl,
            Dependency::GTest => &self.gtest,
        }
    }

    /// Specs for the given dependencies, in installation order.
    pub fn select(&self, deps: &[Dependency]) -> Vec<DependencySpec> {
        Dependency::ALL
            .into_iter()
            .filter(|dep| deps.contains(dep))
            .map(|dep| self.spec(dep).clone())
            .collect()
    }
}

fn invalid(name: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn validate_year(year: &str) -> Result<(), ConfigError> {
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(
            "SQLITE_VERSION_RELEASE_YEAR",
            year,
            "expected a four digit year",
        ));
    }
    Ok(())
}

/// Versions end up in file names and URLs
fn validate_version_chars(name: &str, version: &str) -> Result<(), ConfigError> {
    let ok = version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if !ok {
        return Err(invalid(
            name,
            version,
            "only letters, digits, '.', '-' and '_' are allowed",
        ));
    }
    Ok(())
}

/// SQLite encodes its version as XYYZZWW in the amalgamation name.
///
/// `3.43.0` becomes `sqlite-amalgamation-3430000`; missing parts are zero.
pub fn sqlite_source_dir(version: &str) -> Result<String, ConfigError> {
    const NAME: &str = "SQLITE_VERSION";

    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() > 4 {
        return Err(invalid(NAME, version, "at most four dotted parts are allowed"));
    }

    let mut nums = [0u32; 4];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| invalid(NAME, version, format!("'{}' is not a number", part)))?;
    }

    if nums[1..].iter().any(|n| *n > 99) {
        return Err(invalid(NAME, version, "minor parts must be between 0 and 99"));
    }

    Ok(format!(
        "sqlite-amalgamation-{}{:02}{:02}{:02}",
        nums[0], nums[1], nums[2], nums[3]
    ))
}

/// Where the installer reads and writes on disk
#[derive(Debug, Clone)]
pub struct Layout {
    pub project_root: PathBuf,
    pub deps_dir: PathBuf,
    pub scratch_dir: PathBuf,
    /// Location of the Windows build scripts
    pub scripts_dir: PathBuf,
}

impl Layout {
    pub fn new(project_root: impl Into<PathBuf>, scripts_dir: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            deps_dir: project_root.join("deps"),
            scratch_dir: project_root.join("temp"),
            scripts_dir: scripts_dir.into(),
            project_root,
        }
    }

    pub fn artifact_dir(&self, spec: &DependencySpec) -> PathBuf {
        self.deps_dir.join(spec.final_dir())
    }

    pub fn source_dir(&self, spec: &DependencySpec) -> PathBuf {
        self.scratch_dir.join(&spec.source_dir)
    }

    pub fn archive_path(&self, spec: &DependencySpec) -> PathBuf {
        self.scratch_dir.join(spec.archive_name())
    }

    pub fn script(&self, name: &str) -> PathBuf {
        self.scripts_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();

        let sqlite = config.spec(Dependency::Sqlite);
        assert_eq!(sqlite.version, "3.43.0");
        assert_eq!(sqlite.source_dir, "sqlite-amalgamation-3430000");
        assert_eq!(
            sqlite.url(),
            "https://www.sqlite.org/2023/sqlite-amalgamation-3430000.zip"
        );

        let openssl = config.spec(Dependency::OpenSsl);
        assert_eq!(openssl.source_dir, "openssl-1.1.1i");
        assert_eq!(
            openssl.url(),
            "https://www.openssl.org/source/openssl-1.1.1i.tar.gz"
        );
        assert_eq!(openssl.archive_name(), "openssl-1.1.1i.tar.gz");

        let gtest = config.spec(Dependency::GTest);
        assert_eq!(gtest.source_dir, "googletest-1.14.0");
        assert_eq!(
            gtest.url(),
            "https://github.com/google/googletest/archive/refs/tags/v1.14.0.zip"
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = config_with(&[
            ("SQLITE_VERSION", "3.45.1"),
            ("SQLITE_VERSION_RELEASE_YEAR", "2024"),
            ("OPENSSL_VERSION", "3.0.13"),
            ("GTEST_URL", "http://mirror.local/gtest-{version}.zip"),
        ])
        .unwrap();

        assert_eq!(
            config.spec(Dependency::Sqlite).url(),
            "https://www.sqlite.org/2024/sqlite-amalgamation-3450100.zip"
        );
        assert_eq!(config.spec(Dependency::OpenSsl).source_dir, "openssl-3.0.13");
        assert_eq!(
            config.spec(Dependency::GTest).url(),
            "http://mirror.local/gtest-1.14.0.zip"
        );
    }

    #[test]
    fn test_empty_value_falls_back_to_default() {
        let config = config_with(&[("OPENSSL_VERSION", ""), ("GTEST_VERSION", "  ")]).unwrap();
        assert_eq!(config.spec(Dependency::OpenSsl).version, "1.1.1i");
        assert_eq!(config.spec(Dependency::GTest).version, "1.14.0");
    }

    #[test]
    fn test_sqlite_source_dir_pads_parts() {
        assert_eq!(sqlite_source_dir("3.43.0").unwrap(), "sqlite-amalgamation-3430000");
        assert_eq!(sqlite_source_dir("3.8").unwrap(), "sqlite-amalgamation-3080000");
        assert_eq!(sqlite_source_dir("3.7.17.1").unwrap(), "sqlite-amalgamation-3071701");
    }

    #[test]
    fn test_sqlite_source_dir_rejects_bad_versions() {
        assert!(sqlite_source_dir("3.x.0").is_err());
        assert!(sqlite_source_dir("3.1.2.3.4").is_err());
        assert!(sqlite_source_dir("3.100.0").is_err());
        assert!(sqlite_source_dir("").is_err());
    }

    #[test]
    fn test_invalid_year_is_config_error() {
        let err = config_with(&[("SQLITE_VERSION_RELEASE_YEAR", "23")]).unwrap_err();
        let ConfigError::InvalidValue { name, .. } = err;
        assert_eq!(name, "SQLITE_VERSION_RELEASE_YEAR");
    }

    #[test]
    fn test_version_with_path_separator_rejected() {
        assert!(config_with(&[("OPENSSL_VERSION", "../1.1.1")]).is_err());
    }

    #[test]
    fn test_spec_matches_requested_dependency() {
        let config = config_with(&[]).unwrap();
        for dep in Dependency::ALL {
            assert_eq!(config.spec(dep).dependency, dep);
        }
        assert_eq!(config.spec(Dependency::GTest).final_dir(), "googletest");
    }

    #[test]
    fn test_select_keeps_install_order() {
        let config = config_with(&[]).unwrap();
        let selected = config.select(&[Dependency::GTest, Dependency::Sqlite]);
        let names: Vec<_> = selected.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["sqlite3", "gtest"]);
    }

    #[test]
    fn test_layout_paths() {
        let config = config_with(&[]).unwrap();
        let layout = Layout::new("/work/project", "/work/project/tools");
        let spec = config.spec(Dependency::OpenSsl);
        assert_eq!(layout.artifact_dir(spec), PathBuf::from("/work/project/deps/openssl"));
        assert_eq!(
            layout.source_dir(spec),
            PathBuf::from("/work/project/temp/openssl-1.1.1i")
        );
        assert_eq!(
            layout.archive_path(spec),
            PathBuf::from("/work/project/temp/openssl-1.1.1i.tar.gz")
        );
    }
}
