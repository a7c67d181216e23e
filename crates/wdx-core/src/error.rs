//! Engine error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while discovering, running or parsing tests.
///
/// Every variant is produced at the boundary where an untyped external
/// signal (process exit, stderr text, JSON document, source text) is first
/// classified. Failing tests are never reported through this type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The isolated configuration extraction process failed.
    #[error("Failed to read wdio configuration {}: {stderr}", path.display())]
    ConfigParse { path: PathBuf, stderr: String },

    /// A JSON document did not match the expected contract.
    #[error("Invalid {subject}: field `{field}`: {message}")]
    SchemaValidation {
        subject: String,
        field: String,
        message: String,
    },

    /// The JSON reporter plugin is not installed in the project.
    #[error("WDIO JSON reporter not installed. Add it to the project: npm i --save-dev {package}")]
    ReporterMissing { package: String },

    /// The browser driver does not match the installed browser.
    #[error("Chromedriver version only supports Chrome {supported}")]
    ToolVersion { supported: String },

    /// The test tool failed and produced no results.
    #[error("Test run failed: {message}")]
    Execution { message: String, stderr: String },

    /// A test source file could not be parsed.
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// IO error.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Discovery could not run at all (bad glob, unreadable root).
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// Settings error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify a decoding failure for the named document.
    ///
    /// `field` is the path to the offending value (`suites[0].duration`);
    /// for a missing field it is the path of the field that is missing.
    pub fn schema(
        subject: impl Into<String>,
        err: &serde_path_to_error::Error<serde_json::Error>,
    ) -> Self {
        let message = err.inner().to_string();
        let path = err.path().to_string();
        let field = match (path.as_str(), named_field(&message)) {
            (".", Some(name)) => name.to_string(),
            (".", None) => "<root>".to_string(),
            (path, Some(name)) if !path.ends_with(name) => format!("{}.{}", path, name),
            (path, _) => path.to_string(),
        };
        EngineError::SchemaValidation {
            subject: subject.into(),
            field,
            message,
        }
    }

    /// Short machine-friendly name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::SchemaValidation { .. } => "schema_validation",
            Self::ReporterMissing { .. } => "reporter_missing",
            Self::ToolVersion { .. } => "tool_version",
            Self::Execution { .. } => "execution",
            Self::Parse { .. } => "parse",
            Self::Io { .. } => "io",
            Self::Discovery(_) => "discovery",
            Self::Config(_) => "config",
        }
    }
}

/// serde_json names fields as "missing field `x`" or "unknown field `x`".
fn named_field(message: &str) -> Option<&str> {
    let start = message.find("field `")? + "field `".len();
    let len = message[start..].find('`')?;
    Some(&message[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::util::decode_json;

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Shape {
        framework: String,
        #[serde(default)]
        runs: Vec<Run>,
    }

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Run {
        duration: f64,
    }

    #[test]
    fn test_schema_error_names_missing_field() {
        match decode_json::<Shape>("wdio configuration", "{}").unwrap_err() {
            EngineError::SchemaValidation { field, subject, .. } => {
                assert_eq!(field, "framework");
                assert_eq!(subject, "wdio configuration");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_schema_error_without_field_falls_back_to_root() {
        let classified = decode_json::<Shape>("results-0-0.json", "[1, 2]").unwrap_err();
        assert!(matches!(
            classified,
            EngineError::SchemaValidation { ref field, .. } if field == "<root>"
        ));
        assert_eq!(classified.kind(), "schema_validation");
    }

    #[test]
    fn test_schema_error_names_mistyped_nested_field() {
        let json = r#"{"framework": "mocha", "runs": [{"duration": 1}, {"duration": "12"}]}"#;
        match decode_json::<Shape>("results-0-0.json", json).unwrap_err() {
            EngineError::SchemaValidation { field, message, .. } => {
                assert_eq!(field, "runs[1].duration");
                assert!(message.contains("invalid type"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_schema_error_names_missing_nested_field() {
        let json = r#"{"framework": "mocha", "runs": [{}]}"#;
        assert!(matches!(
            decode_json::<Shape>("results-0-0.json", json),
            Err(EngineError::SchemaValidation { ref field, .. }) if field == "runs[0].duration"
        ));
    }

    #[test]
    fn test_reporter_missing_message_names_package() {
        let err = EngineError::ReporterMissing {
            package: "wdio-json-reporter".to_string(),
        };
        assert!(err.to_string().contains("npm i --save-dev wdio-json-reporter"));
    }
}
