//! Results of the `json` reporter (mocha and jasmine frameworks).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{file_label, millis, spec_path, LeafOutcome, ReportItem};
use crate::error::EngineError;
use crate::tree::SourceRange;
use crate::util::{decode_json, strip_ansi};

/// Reported state of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    Passed,
    Failed,
    Pending,
    Skipped,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTest {
    pub name: String,
    pub start: String,
    pub end: String,
    /// Milliseconds.
    pub duration: f64,
    pub state: TestState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<String>,
    /// Declaration site, attached by the correlator.
    #[serde(skip)]
    pub range: Option<SourceRange>,
}

impl ExecutionTest {
    /// Failure text with terminal colours removed.
    pub fn failure_message(&self) -> String {
        let raw = self
            .error
            .as_deref()
            .or(self.standard_error.as_deref())
            .or(self.error_type.as_deref())
            .unwrap_or("");
        strip_ansi(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSuite {
    pub name: String,
    /// Milliseconds.
    pub duration: f64,
    pub start: String,
    pub end: String,
    pub session_id: String,
    pub tests: Vec<ExecutionTest>,
}

/// One `results-<cid>.json` file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionFile {
    /// Result file name, e.g. `results-0-0.json`.
    pub name: String,
    pub specs: Vec<String>,
    pub suites: Vec<ExecutionSuite>,
}

#[derive(Deserialize)]
struct ResultDocument {
    suites: Vec<ExecutionSuite>,
    specs: Vec<String>,
}

impl ExecutionFile {
    /// Decode a result document written by the reporter.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, EngineError> {
        let name = name.into();
        let doc: ResultDocument =
            decode_json(&name, json)?;
        Ok(Self {
            name,
            specs: doc.specs,
            suites: doc.suites,
        })
    }

    /// Path of the spec file this result belongs to.
    pub fn spec_path(&self) -> Option<PathBuf> {
        self.specs.first().map(|s| spec_path(s))
    }

    pub fn test_count(&self) -> usize {
        self.suites.iter().map(|s| s.tests.len()).sum()
    }
}

impl ReportItem for ExecutionFile {
    fn node_id(&self, parent_id: &str, _index: usize) -> String {
        format!("{}_{}", parent_id, self.name)
    }

    fn label(&self) -> String {
        self.spec_path()
            .as_deref()
            .and_then(file_label)
            .unwrap_or_else(|| self.name.clone())
    }

    fn uri(&self) -> Option<PathBuf> {
        self.spec_path()
    }

    fn children(&self) -> Vec<&dyn ReportItem> {
        self.suites.iter().map(|s| s as &dyn ReportItem).collect()
    }
}

impl ReportItem for ExecutionSuite {
    fn node_id(&self, parent_id: &str, index: usize) -> String {
        format!("{}_{}", parent_id, index)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn children(&self) -> Vec<&dyn ReportItem> {
        self.tests.iter().map(|t| t as &dyn ReportItem).collect()
    }
}

impl ReportItem for ExecutionTest {
    fn node_id(&self, parent_id: &str, index: usize) -> String {
        format!("{}_{}", parent_id, index)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn range(&self) -> Option<SourceRange> {
        self.range
    }

    fn outcome(&self) -> Option<LeafOutcome> {
        let duration = millis(self.duration);
        Some(match self.state {
            TestState::Passed => LeafOutcome::Passed { duration },
            TestState::Pending | TestState::Skipped => LeafOutcome::Skipped,
            TestState::Failed | TestState::Unknown => LeafOutcome::Failed {
                message: self.failure_message(),
                duration,
            },
        })
    }

    fn children(&self) -> Vec<&dyn ReportItem> {
        Vec::new()
    }
}
