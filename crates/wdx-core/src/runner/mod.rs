//! Running wdio and collecting its JSON results.
//!
//! Every execution gets its own scratch directory:
//!
//! ```text
//! $TMP/wdiotests_<uuid><random>/
//!     wdio-wrapper.js        generated; loads the real config, swaps reporters
//!     results-0-0.json       written by the json reporter (mocha, jasmine)
//!     <feature>.json         written by cucumberjs-json (cucumber)
//! ```
//!
//! The directory is removed when the execution ends, whatever the outcome.
//! Success is decided by the result files found, not by the exit code: wdio
//! exits non-zero whenever a single test fails.

mod classify;
mod process;
mod wrapper;

pub use classify::classify_failure;
pub use process::{Invocation, ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use wrapper::{is_result_file, render as render_wrapper};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{RunnerConfig, SCRATCH_DIR_PREFIX, WRAPPER_FILE_NAME};
use crate::discovery::{Configuration, Framework};
use crate::error::EngineError;
use crate::report::{CucumberFile, ExecutionFile, ExecutionReport};
use crate::util::strip_ansi;

/// Runs one configuration at a time through wdio.
pub struct ExecutionDriver {
    settings: RunnerConfig,
    runner: Arc<dyn ProcessRunner>,
    scratch_root: Option<PathBuf>,
}

impl ExecutionDriver {
    pub fn new(settings: RunnerConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            settings,
            runner,
            scratch_root: None,
        }
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn settings(&self) -> &RunnerConfig {
        &self.settings
    }

    fn scratch_dir(&self) -> Result<TempDir, EngineError> {
        let prefix = format!("{}{}", SCRATCH_DIR_PREFIX, Uuid::new_v4().simple());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root).map_err(|e| EngineError::io(root, e)),
            None => builder
                .tempdir()
                .map_err(|e| EngineError::io(std::env::temp_dir(), e)),
        }
    }

    /// The wdio command line for `config` using `wrapper`.
    pub fn invocation(&self, config: &Configuration, wrapper: &Path, scratch: &Path) -> Invocation {
        let mut inv = Invocation::new(&self.settings.command, config.folder())
            .args(self.settings.args.iter().cloned())
            .arg(wrapper.to_string_lossy())
            .timeout(self.settings.timeout())
            .scratch_dir(scratch);
        if self.settings.headless && !self.settings.headless_flag.is_empty() {
            inv = inv.arg(&self.settings.headless_flag);
        }
        inv
    }

    /// Run `config` and decode the results it produced.
    pub async fn execute(&self, config: &Configuration) -> Result<ExecutionReport, EngineError> {
        let scratch = self.scratch_dir()?;
        let wrapper = scratch.path().join(WRAPPER_FILE_NAME);
        tokio::fs::write(&wrapper, render_wrapper(config.framework, &config.source, scratch.path()))
            .await
            .map_err(|e| EngineError::io(&wrapper, e))?;

        let inv = self.invocation(config, &wrapper, scratch.path());
        info!(configuration = %config.id, command = %inv.display(), "Running wdio");
        let output = self.runner.run(&inv).await?;

        let files = scan_results(config.framework, scratch.path()).await?;
        debug!(configuration = %config.id, exit_code = ?output.exit_code, files = files.len(), "wdio finished");

        if !output.success() {
            let stderr = strip_ansi(&output.stderr);
            if let Some(err) = classify_failure(config.framework, &stderr) {
                return Err(err);
            }
            if files.is_empty() {
                let reason = if output.timed_out {
                    "timed out".to_string()
                } else {
                    match output.exit_code {
                        Some(code) => format!("exited with code {}", code),
                        None => "was terminated".to_string(),
                    }
                };
                let message = match classify::last_line(&stderr) {
                    Some(line) => format!("{} {} and produced no results: {}", self.settings.command, reason, line),
                    None => format!("{} {} and produced no results", self.settings.command, reason),
                };
                return Err(EngineError::Execution { message, stderr });
            }
            info!(configuration = %config.id, "wdio reported failures");
        } else if files.is_empty() {
            warn!(configuration = %config.id, "wdio succeeded but wrote no result files");
        }

        decode(config.framework, files)
    }
}

/// Result files in `dir` as `(name, contents)`, sorted by name.
async fn scan_results(framework: Framework, dir: &Path) -> Result<Vec<(String, String)>, EngineError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| EngineError::io(dir, e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| EngineError::io(dir, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_result_file(framework, &name) {
            names.push(name);
        }
    }
    names.sort();

    let mut files = Vec::with_capacity(names.len());
    for name in names {
        let path = dir.join(&name);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| EngineError::io(&path, e))?;
        files.push((name, content));
    }
    Ok(files)
}

fn decode(framework: Framework, files: Vec<(String, String)>) -> Result<ExecutionReport, EngineError> {
    match framework {
        Framework::MochaLike => files
            .into_iter()
            .map(|(name, json)| ExecutionFile::from_json(name, &json))
            .collect::<Result<Vec<_>, _>>()
            .map(ExecutionReport::Mocha),
        Framework::Cucumber => files
            .into_iter()
            .map(|(name, json)| CucumberFile::from_json(name, &json))
            .collect::<Result<Vec<_>, _>>()
            .map(ExecutionReport::Cucumber),
    }
}
