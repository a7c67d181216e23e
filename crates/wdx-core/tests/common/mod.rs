//! Shared fixtures: a scripted process runner and on-disk projects.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use wdx_core::config::CONFIG_PATH_ENV;
use wdx_core::{EngineError, Invocation, ProcessOutput, ProcessRunner};

/// What a scripted wdio run leaves behind.
#[derive(Debug, Clone, Default)]
pub struct WdioRun {
    /// Files written into the scratch directory.
    pub files: Vec<(String, String)>,
    pub exit_code: i32,
    pub stderr: String,
}

/// A [`ProcessRunner`] that answers from scripts instead of spawning.
///
/// Config extraction is recognized by the config path env var; anything
/// else is treated as a wdio run keyed by its working directory.
#[derive(Default)]
pub struct FakeRunner {
    configs: Mutex<HashMap<PathBuf, Result<String, String>>>,
    runs: Mutex<HashMap<PathBuf, WdioRun>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_output(&self, path: &Path, stdout: impl Into<String>) {
        self.configs
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), Ok(stdout.into()));
    }

    pub fn config_failure(&self, path: &Path, stderr: impl Into<String>) {
        self.configs
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), Err(stderr.into()));
    }

    pub fn wdio(&self, folder: &Path, run: WdioRun) {
        self.runs.lock().unwrap().insert(folder.to_path_buf(), run);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Scratch directories handed to wdio runs, in order.
    pub fn scratch_dirs(&self) -> Vec<PathBuf> {
        self.invocations()
            .into_iter()
            .filter_map(|i| i.scratch_dir)
            .collect()
    }

    pub fn wdio_run_count(&self) -> usize {
        self.scratch_dirs().len()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, EngineError> {
        self.invocations.lock().unwrap().push(invocation.clone());

        if let Some((_, path)) = invocation.env.iter().find(|(k, _)| k == CONFIG_PATH_ENV) {
            let scripted = self.configs.lock().unwrap().get(Path::new(path)).cloned();
            return Ok(match scripted {
                Some(Ok(stdout)) => ProcessOutput {
                    exit_code: Some(0),
                    stdout,
                    ..Default::default()
                },
                Some(Err(stderr)) => ProcessOutput {
                    exit_code: Some(1),
                    stderr,
                    ..Default::default()
                },
                None => ProcessOutput {
                    exit_code: Some(1),
                    stderr: format!("Error: Cannot find module '{}'", path),
                    ..Default::default()
                },
            });
        }

        let scratch = invocation
            .scratch_dir
            .clone()
            .expect("wdio runs carry a scratch dir");
        assert!(scratch.join("wdio-wrapper.js").is_file(), "wrapper written before run");

        let run = self
            .runs
            .lock()
            .unwrap()
            .get(&invocation.cwd)
            .cloned()
            .unwrap_or_default();
        for (name, content) in &run.files {
            std::fs::write(scratch.join(name), content).unwrap();
        }
        Ok(ProcessOutput {
            exit_code: Some(run.exit_code),
            stderr: run.stderr,
            ..Default::default()
        })
    }
}

/// A wdio project folder with config, manifest and one spec file.
pub struct Project {
    pub folder: PathBuf,
    pub config: PathBuf,
    pub spec: PathBuf,
}

pub const SPEC_SOURCE: &str = r#"describe("login", () => {
  it("accepts a user", async () => {
    await browser.url("/")
  })

  it("rejects a bad password", async () => {
    await browser.url("/")
  })
})
"#;

/// Create `<root>/<name>` with a mocha configuration and register its
/// extraction output with `runner`.
pub fn mocha_project(root: &Path, name: &str, runner: &FakeRunner, with_reporter: bool) -> Project {
    let folder = root.join(name);
    std::fs::create_dir_all(folder.join("test")).unwrap();

    let config = folder.join("wdio.conf.js");
    std::fs::write(&config, "exports.config = { framework: 'mocha' }\n").unwrap();

    let dev = if with_reporter {
        r#"{ "@wdio/cli": "^8.0.0", "wdio-json-reporter": "^3.0.0" }"#
    } else {
        r#"{ "@wdio/cli": "^8.0.0" }"#
    };
    std::fs::write(
        folder.join("package.json"),
        format!(r#"{{ "name": "{}-e2e", "devDependencies": {} }}"#, name, dev),
    )
    .unwrap();

    let spec = folder.join("test").join("login.e2e.js");
    std::fs::write(&spec, SPEC_SOURCE).unwrap();

    runner.config_output(
        &config,
        r#"{"framework":"mocha","specs":["./test/**/*.e2e.js"],"exclude":[]}"#,
    );
    Project {
        folder,
        config,
        spec,
    }
}

/// A mocha result document for `spec` with one suite.
pub fn mocha_result(spec: &Path, suite: &str, tests: &[(&str, &str)]) -> String {
    let tests: Vec<serde_json::Value> = tests
        .iter()
        .map(|(name, state)| {
            let mut test = serde_json::json!({
                "name": name,
                "start": "2024-03-01T10:00:00.000Z",
                "end": "2024-03-01T10:00:01.000Z",
                "duration": 250,
                "state": state,
            });
            if *state == "failed" {
                test["errorType"] = "AssertionError".into();
                test["error"] = "\u{1b}[31mexpected false to be true\u{1b}[39m".into();
            }
            test
        })
        .collect();

    serde_json::json!({
        "start": "2024-03-01T10:00:00.000Z",
        "end": "2024-03-01T10:00:02.000Z",
        "capabilities": {},
        "suites": [{
            "name": suite,
            "duration": 500,
            "start": "2024-03-01T10:00:00.000Z",
            "end": "2024-03-01T10:00:01.000Z",
            "sessionId": "session-1",
            "tests": tests,
        }],
        "specs": [format!("file://{}", spec.display())],
    })
    .to_string()
}
