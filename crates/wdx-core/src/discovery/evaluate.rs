//! Reading `framework`, `specs` and `exclude` out of a configuration module.
//!
//! The module is evaluated by node in its own process. The configuration
//! path travels in an environment variable and the script is fixed, so no
//! path ever becomes part of executed source text.

use std::path::Path;

use serde::Deserialize;

use super::Framework;
use crate::config::{ExtractionConfig, CONFIG_PATH_ENV};
use crate::error::EngineError;
use crate::runner::{Invocation, ProcessRunner};
use crate::util::{decode_json, strip_ansi};

/// Script evaluated by node; prints one JSON line.
pub const READ_CONFIG_SCRIPT: &str = include_str!("../../scripts/read_config.js");

/// The settings the extraction script reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawConfig {
    pub framework: String,
    pub specs: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl RawConfig {
    /// Decode the script's stdout. Anything the config printed while loading
    /// comes before the last line.
    pub fn from_stdout(subject: &str, stdout: &str) -> Result<Self, EngineError> {
        let line = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("");
        decode_json(subject, line)
    }

    pub fn framework(&self, subject: &str) -> Result<Framework, EngineError> {
        Framework::parse(&self.framework).ok_or_else(|| EngineError::SchemaValidation {
            subject: subject.to_string(),
            field: "framework".to_string(),
            message: format!(
                "unsupported framework {:?}, expected mocha, jasmine or cucumber",
                self.framework
            ),
        })
    }
}

/// Node invocation that evaluates `config_path`.
pub fn invocation(settings: &ExtractionConfig, config_path: &Path) -> Invocation {
    let folder = config_path.parent().unwrap_or(Path::new("."));
    let mut inv = Invocation::new(&settings.node, folder).args(settings.node_args.iter().cloned());

    let is_typescript = matches!(
        config_path.extension().and_then(|e| e.to_str()),
        Some("ts" | "mts" | "cts")
    );
    if is_typescript && !settings.ts_loader.is_empty() {
        inv = inv.arg("-r").arg(&settings.ts_loader);
    }

    inv.arg("-e")
        .arg(READ_CONFIG_SCRIPT)
        .env(CONFIG_PATH_ENV, config_path.to_string_lossy())
        .env("FORCE_COLOR", "0")
        .timeout(Some(settings.timeout()))
}

/// Evaluate a configuration module and decode what it reports.
pub async fn evaluate(
    runner: &dyn ProcessRunner,
    settings: &ExtractionConfig,
    config_path: &Path,
) -> Result<RawConfig, EngineError> {
    let output = runner.run(&invocation(settings, config_path)).await?;
    if !output.success() {
        return Err(EngineError::ConfigParse {
            path: config_path.to_path_buf(),
            stderr: strip_ansi(output.stderr.trim()),
        });
    }
    RawConfig::from_stdout(&config_path.display().to_string(), &output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_decode_last_line() {
        let stdout = "loading env...\n\n{\"framework\":\"mocha\",\"specs\":[\"./test/**/*.js\"]}\n";
        let raw = RawConfig::from_stdout("wdio.conf.js", stdout).unwrap();
        assert_eq!(raw.framework, "mocha");
        assert_eq!(raw.specs, vec!["./test/**/*.js"]);
        assert!(raw.exclude.is_empty());
    }

    #[test]
    fn test_missing_specs_names_field() {
        let err = RawConfig::from_stdout("wdio.conf.js", r#"{"framework":"mocha"}"#).unwrap_err();
        assert!(matches!(err, EngineError::SchemaValidation { ref field, .. } if field == "specs"));
    }

    #[test]
    fn test_mistyped_specs_names_field() {
        let err = RawConfig::from_stdout("wdio.conf.js", r#"{"framework":"mocha","specs":"./test/a.js"}"#)
            .unwrap_err();
        match err {
            EngineError::SchemaValidation { field, message, .. } => {
                assert_eq!(field, "specs");
                assert!(message.contains("expected a sequence"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_framework_mapping() {
        let raw = |f: &str| RawConfig { framework: f.to_string(), specs: vec![], exclude: vec![] };
        assert_eq!(raw("mocha").framework("c").unwrap(), Framework::MochaLike);
        assert_eq!(raw("jasmine").framework("c").unwrap(), Framework::MochaLike);
        assert_eq!(raw("cucumber").framework("c").unwrap(), Framework::Cucumber);
        assert!(matches!(
            raw("qunit").framework("c"),
            Err(EngineError::SchemaValidation { ref field, .. }) if field == "framework"
        ));
    }

    #[test]
    fn test_invocation_passes_path_through_env() {
        let settings = ExtractionConfig::default();
        let path = PathBuf::from("/work/it's here/wdio.conf.js");
        let inv = invocation(&settings, &path);

        assert_eq!(inv.program, "node");
        assert_eq!(inv.cwd, PathBuf::from("/work/it's here"));
        assert!(inv.args.iter().all(|a| !a.contains("it's here")));
        assert!(inv
            .env
            .contains(&(CONFIG_PATH_ENV.to_string(), "/work/it's here/wdio.conf.js".to_string())));
        assert_eq!(inv.timeout, Some(settings.timeout()));
    }

    #[test]
    fn test_typescript_config_gets_loader() {
        let settings = ExtractionConfig::default();
        let inv = invocation(&settings, Path::new("/work/wdio.conf.ts"));
        assert_eq!(&inv.args[..2], &["-r".to_string(), settings.ts_loader.clone()]);
    }
}
