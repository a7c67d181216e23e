//! Per-run state of every node.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::host::RunReporter;
use crate::report::LeafOutcome;

/// State of one node within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Enqueued,
    Started,
    Passed,
    Failed,
    Skipped,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped)
    }

    /// Whether a node may move from `self` to `next`.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match (self, next) {
            (Self::Idle, Self::Enqueued) => true,
            (Self::Enqueued, Self::Started) => true,
            (Self::Enqueued | Self::Started, next) => next.is_terminal(),
            _ => false,
        }
    }
}

/// Leaf outcome totals of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunCounts {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// Tracks node states for one run and forwards valid transitions.
///
/// Terminal states are final: a second outcome for the same node is
/// logged and dropped.
#[derive(Debug, Default)]
pub struct RunLedger {
    states: HashMap<String, RunState>,
    counts: RunCounts,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: &str) -> RunState {
        self.states.get(id).copied().unwrap_or(RunState::Idle)
    }

    pub fn counts(&self) -> RunCounts {
        self.counts
    }

    fn transition(&mut self, id: &str, next: RunState) -> bool {
        let current = self.state(id);
        if !current.can_transition_to(next) {
            warn!(node = id, from = ?current, to = ?next, "Ignoring run state transition");
            return false;
        }
        self.states.insert(id.to_string(), next);
        true
    }

    pub fn enqueue<R: RunReporter + ?Sized>(&mut self, id: &str, reporter: &mut R) -> bool {
        let ok = self.transition(id, RunState::Enqueued);
        if ok {
            reporter.enqueued(id);
        }
        ok
    }

    pub fn start<R: RunReporter + ?Sized>(&mut self, id: &str, reporter: &mut R) -> bool {
        let ok = self.transition(id, RunState::Started);
        if ok {
            reporter.started(id);
        }
        ok
    }

    /// Enqueue then start a node created mid-run. A node recreated under an
    /// id that is still active is announced again.
    pub fn begin<R: RunReporter + ?Sized>(&mut self, id: &str, reporter: &mut R) {
        if matches!(self.state(id), RunState::Enqueued | RunState::Started) {
            self.states.remove(id);
        }
        self.enqueue(id, reporter);
        self.start(id, reporter);
    }

    /// Fail a container node (configuration). Not counted as a test outcome.
    pub fn fail<R: RunReporter + ?Sized>(
        &mut self,
        id: &str,
        message: &str,
        reporter: &mut R,
    ) -> bool {
        let ok = self.transition(id, RunState::Failed);
        if ok {
            reporter.failed(id, message, None);
        }
        ok
    }

    /// Skip a node without counting it as a test outcome.
    pub fn skip<R: RunReporter + ?Sized>(&mut self, id: &str, reporter: &mut R) -> bool {
        let ok = self.transition(id, RunState::Skipped);
        if ok {
            reporter.skipped(id);
        }
        ok
    }

    /// Record the outcome of a leaf.
    pub fn resolve<R: RunReporter + ?Sized>(
        &mut self,
        id: &str,
        outcome: &LeafOutcome,
        reporter: &mut R,
    ) -> bool {
        let next = match outcome {
            LeafOutcome::Passed { .. } => RunState::Passed,
            LeafOutcome::Failed { .. } => RunState::Failed,
            LeafOutcome::Skipped => RunState::Skipped,
        };
        if !self.transition(id, next) {
            return false;
        }
        match outcome {
            LeafOutcome::Passed { duration } => {
                self.counts.passed += 1;
                reporter.passed(id, *duration);
            }
            LeafOutcome::Failed { message, duration } => {
                self.counts.failed += 1;
                reporter.failed(id, message, *duration);
            }
            LeafOutcome::Skipped => {
                self.counts.skipped += 1;
                reporter.skipped(id);
            }
        }
        true
    }

    /// Number of nodes that left `Idle` during the run.
    pub fn tracked(&self) -> usize {
        self.states.len()
    }
}
