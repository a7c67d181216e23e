//! Structured results produced by the wdio JSON reporters.
//!
//! Two result shapes exist: the mocha/jasmine `json` reporter writes one
//! [`ExecutionFile`] per worker, the `cucumberjs-json` reporter writes one
//! [`CucumberFile`] (a feature list) per feature file. Both are exposed to
//! the tree reconciler through the same [`ReportItem`] shape descriptor so
//! the tree walk is written once:
//!
//! ```text
//! mocha:    ExecutionFile -> ExecutionSuite -> ExecutionTest
//! cucumber: CucumberFile  -> CucumberFeature -> CucumberElement -> CucumberStep
//! ```

mod cucumber;
mod mocha;

pub use cucumber::{CucumberElement, CucumberFeature, CucumberFile, CucumberStep, StepResult};
pub use mocha::{ExecutionFile, ExecutionSuite, ExecutionTest, TestState};

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::discovery::Framework;
use crate::tree::SourceRange;

/// Terminal outcome of a leaf (test or step).
#[derive(Debug, Clone, PartialEq)]
pub enum LeafOutcome {
    Passed {
        duration: Option<Duration>,
    },
    Failed {
        message: String,
        duration: Option<Duration>,
    },
    Skipped,
}

/// One level of a result hierarchy, as seen by the tree reconciler.
pub trait ReportItem {
    /// Node id of this item when it is the `index`-th child of `parent_id`.
    fn node_id(&self, parent_id: &str, index: usize) -> String;

    /// Label shown for the node.
    fn label(&self) -> String;

    /// Source file of the item. Children inherit it when they have none.
    fn uri(&self) -> Option<PathBuf> {
        None
    }

    /// Source location, when known.
    fn range(&self) -> Option<SourceRange> {
        None
    }

    /// `Some` for leaves.
    fn outcome(&self) -> Option<LeafOutcome> {
        None
    }

    fn children(&self) -> Vec<&dyn ReportItem>;
}

/// All results of one configuration run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionReport {
    Mocha(Vec<ExecutionFile>),
    Cucumber(Vec<CucumberFile>),
}

impl ExecutionReport {
    /// An empty report of the shape `framework` produces.
    pub fn empty(framework: Framework) -> Self {
        match framework {
            Framework::MochaLike => Self::Mocha(Vec::new()),
            Framework::Cucumber => Self::Cucumber(Vec::new()),
        }
    }

    pub fn framework(&self) -> Framework {
        match self {
            Self::Mocha(_) => Framework::MochaLike,
            Self::Cucumber(_) => Framework::Cucumber,
        }
    }

    /// Top-level items (one per result file).
    pub fn items(&self) -> Vec<&dyn ReportItem> {
        match self {
            Self::Mocha(files) => files.iter().map(|f| f as &dyn ReportItem).collect(),
            Self::Cucumber(files) => files.iter().map(|f| f as &dyn ReportItem).collect(),
        }
    }

    pub fn file_count(&self) -> usize {
        match self {
            Self::Mocha(files) => files.len(),
            Self::Cucumber(files) => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }

    /// Number of leaves (tests or steps) across all files.
    pub fn leaf_count(&self) -> usize {
        fn count(item: &dyn ReportItem) -> usize {
            if item.outcome().is_some() {
                return 1;
            }
            item.children().into_iter().map(count).sum()
        }
        self.items().into_iter().map(count).sum()
    }
}

/// Convert a reporter duration in milliseconds, ignoring nonsense values.
pub(crate) fn millis(ms: f64) -> Option<Duration> {
    (ms.is_finite() && ms >= 0.0).then(|| Duration::from_secs_f64(ms / 1000.0))
}

/// Spec paths are sometimes reported as percent-encoded `file://` URLs.
pub fn spec_path(raw: &str) -> PathBuf {
    if raw.starts_with("file:") {
        if let Some(path) = Url::parse(raw).ok().and_then(|url| url.to_file_path().ok()) {
            return path;
        }
    }
    PathBuf::from(raw.strip_prefix("file://").unwrap_or(raw))
}

pub(crate) fn file_label(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(|s| s.to_string())
}
