//! Results of the `cucumberjs-json` reporter.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{file_label, LeafOutcome, ReportItem};
use crate::error::EngineError;
use crate::tree::SourceRange;
use crate::util::{decode_json, strip_ansi};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub status: String,
    /// Nanoseconds, as written by cucumber.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CucumberStep {
    pub keyword: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Hooks (`Before`/`After`) are written as hidden steps.
    #[serde(default)]
    pub hidden: bool,
    pub result: StepResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CucumberElement {
    pub keyword: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub name: String,
    pub id: String,
    pub line: u32,
    pub steps: Vec<CucumberStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CucumberFeature {
    pub keyword: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub line: u32,
    pub name: String,
    pub uri: String,
    pub id: String,
    pub elements: Vec<CucumberElement>,
}

/// One JSON file written by the reporter (a list of features).
#[derive(Debug, Clone, PartialEq)]
pub struct CucumberFile {
    pub name: String,
    pub features: Vec<CucumberFeature>,
}

impl CucumberFile {
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, EngineError> {
        let name = name.into();
        let features: Vec<CucumberFeature> = decode_json(&name, json)?;
        Ok(Self { name, features })
    }
}

fn line_range(line: u32) -> SourceRange {
    SourceRange::line(line.saturating_sub(1))
}

impl StepResult {
    fn duration(&self) -> Option<Duration> {
        self.duration.map(Duration::from_nanos)
    }
}

impl ReportItem for CucumberFile {
    fn node_id(&self, parent_id: &str, _index: usize) -> String {
        format!("{}_{}", parent_id, self.name)
    }

    fn label(&self) -> String {
        file_label(std::path::Path::new(&self.name)).unwrap_or_else(|| self.name.clone())
    }

    fn children(&self) -> Vec<&dyn ReportItem> {
        self.features.iter().map(|f| f as &dyn ReportItem).collect()
    }
}

impl ReportItem for CucumberFeature {
    fn node_id(&self, parent_id: &str, index: usize) -> String {
        format!("{}_{}", parent_id, index)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn uri(&self) -> Option<PathBuf> {
        (!self.uri.is_empty()).then(|| super::spec_path(&self.uri))
    }

    fn range(&self) -> Option<SourceRange> {
        Some(line_range(self.line))
    }

    fn children(&self) -> Vec<&dyn ReportItem> {
        self.elements.iter().map(|e| e as &dyn ReportItem).collect()
    }
}

impl ReportItem for CucumberElement {
    fn node_id(&self, parent_id: &str, index: usize) -> String {
        format!("{}_{}_{}", parent_id, self.id, index)
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn range(&self) -> Option<SourceRange> {
        Some(line_range(self.line))
    }

    fn children(&self) -> Vec<&dyn ReportItem> {
        self.steps
            .iter()
            .filter(|s| !s.hidden)
            .map(|s| s as &dyn ReportItem)
            .collect()
    }
}

impl ReportItem for CucumberStep {
    fn node_id(&self, parent_id: &str, index: usize) -> String {
        format!("{}_{}", parent_id, index)
    }

    fn label(&self) -> String {
        format!("{} {}", self.keyword.trim(), self.name).trim_end().to_string()
    }

    fn range(&self) -> Option<SourceRange> {
        self.line.map(line_range)
    }

    fn outcome(&self) -> Option<LeafOutcome> {
        let duration = self.result.duration();
        Some(match self.result.status.as_str() {
            "passed" => LeafOutcome::Passed { duration },
            "skipped" | "pending" => LeafOutcome::Skipped,
            status => LeafOutcome::Failed {
                message: self
                    .result
                    .error_message
                    .as_deref()
                    .map(strip_ansi)
                    .unwrap_or_else(|| format!("Step {}", status)),
                duration,
            },
        })
    }

    fn children(&self) -> Vec<&dyn ReportItem> {
        Vec::new()
    }
}
