//! Common test utilities: in-memory fetcher, recording runner, archive builders.

#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;

use install_deps::core::config::{Config, Layout};
use install_deps::core::error::FetchError;
use install_deps::helpers::acquire::Fetcher;
use install_deps::helpers::build::exec::{CommandRunner, StepExit};
use install_deps::helpers::build::plan::CommandStep;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Serves archives from memory, keyed by URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeFetcher {
    archives: HashMap<String, Vec<u8>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn serve(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.archives.insert(url.into(), bytes);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        let bytes = self.archives.get(url).ok_or_else(|| FetchError::HttpStatus {
            url: url.to_string(),
            code: 404,
        })?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(dest, bytes).unwrap();
        Ok(bytes.len() as u64)
    }
}

/// Something a fake build step leaves behind
#[derive(Debug, Clone)]
pub enum Effect {
    /// File relative to the step's working directory
    File(PathBuf),
    /// Absolute directory
    Dir(PathBuf),
}

/// Records steps instead of running them.
#[derive(Default)]
pub struct RecordingRunner {
    pub policy: String,
    pub fail: Option<(String, Option<i32>)>,
    pub effects: HashMap<String, Vec<Effect>>,
    pub ran: RefCell<Vec<CommandStep>>,
    pub captured: RefCell<Vec<String>>,
}

impl RecordingRunner {
    pub fn fail_at(mut self, label: &str, code: Option<i32>) -> Self {
        self.fail = Some((label.to_string(), code));
        self
    }

    pub fn with_policy(mut self, policy: &str) -> Self {
        self.policy = policy.to_string();
        self
    }

    pub fn on(mut self, label: &str, effect: Effect) -> Self {
        self.effects.entry(label.to_string()).or_default().push(effect);
        self
    }

    pub fn labels(&self) -> Vec<String> {
        self.ran.borrow().iter().map(|s| s.label.clone()).collect()
    }

    pub fn run_count(&self) -> usize {
        self.ran.borrow().len() + self.captured.borrow().len()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, step: &CommandStep) -> io::Result<StepExit> {
        self.ran.borrow_mut().push(step.clone());

        if let Some((label, code)) = &self.fail
            && *label == step.label
        {
            return Ok(StepExit(*code));
        }

        for effect in self.effects.get(&step.label).into_iter().flatten() {
            match effect {
                Effect::File(rel) => {
                    let path = step.working_dir.join(rel);
                    std::fs::create_dir_all(path.parent().unwrap())?;
                    std::fs::write(path, "built")?;
                }
                Effect::Dir(abs) => std::fs::create_dir_all(abs)?,
            }
        }
        Ok(StepExit(Some(0)))
    }

    fn capture(&self, program: &str, _args: &[&str]) -> io::Result<String> {
        self.captured.borrow_mut().push(program.to_string());
        Ok(format!("{}\r\n", self.policy))
    }
}

/// A project directory plus default configuration.
pub struct Project {
    pub dir: TempDir,
    pub config: Config,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            config: Config::from_lookup(|_| None).unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> Layout {
        Layout::new(self.root(), self.root().join("tools"))
    }

    pub fn deps(&self, name: &str) -> PathBuf {
        self.root().join("deps").join(name)
    }

    pub fn scratch(&self) -> PathBuf {
        self.root().join("temp")
    }
}
