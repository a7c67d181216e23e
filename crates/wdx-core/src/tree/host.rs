//! Boundary to the UI that renders the tree and the run.

use std::collections::BTreeMap;
use std::time::Duration;

use super::node::TreeNode;
use crate::engine::RunSummary;

/// Receives tree mutations. `parent` is `None` for top-level nodes.
///
/// Deleting a node removes its whole subtree on the host side.
pub trait TreeHost {
    fn create_node(&mut self, parent: Option<&str>, node: &TreeNode);
    fn update_node(&mut self, node: &TreeNode);
    fn delete_node(&mut self, parent: Option<&str>, id: &str);
}

/// Receives run-state transitions.
pub trait RunReporter {
    fn enqueued(&mut self, id: &str);
    fn started(&mut self, id: &str);
    fn passed(&mut self, id: &str, duration: Option<Duration>);
    fn failed(&mut self, id: &str, message: &str, duration: Option<Duration>);
    fn skipped(&mut self, id: &str);
    fn run_ended(&mut self, summary: &RunSummary);
}

/// A call received by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Created { parent: Option<String>, id: String, label: String },
    Updated { id: String },
    Deleted { parent: Option<String>, id: String },
    Enqueued(String),
    Started(String),
    Passed(String),
    Failed { id: String, message: String },
    Skipped(String),
    RunEnded,
}

#[derive(Debug, Clone, PartialEq)]
struct LiveNode {
    parent: Option<String>,
    label: String,
}

/// Records every call and mirrors the host-side tree.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub events: Vec<HostEvent>,
    live: BTreeMap<String, LiveNode>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids the host currently displays.
    pub fn live_ids(&self) -> Vec<String> {
        self.live.keys().cloned().collect()
    }

    pub fn label_of(&self, id: &str) -> Option<&str> {
        self.live.get(id).map(|n| n.label.as_str())
    }

    /// Number of tree mutations (create, update, delete) recorded.
    pub fn mutation_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    HostEvent::Created { .. } | HostEvent::Updated { .. } | HostEvent::Deleted { .. }
                )
            })
            .count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn is_under(&self, id: &str, ancestor: &str) -> bool {
        let mut current = self.live.get(id).and_then(|n| n.parent.clone());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.live.get(&parent).and_then(|n| n.parent.clone());
        }
        false
    }
}

impl TreeHost for RecordingHost {
    fn create_node(&mut self, parent: Option<&str>, node: &TreeNode) {
        self.live.insert(
            node.id.clone(),
            LiveNode {
                parent: parent.map(str::to_string),
                label: node.label.clone(),
            },
        );
        self.events.push(HostEvent::Created {
            parent: parent.map(str::to_string),
            id: node.id.clone(),
            label: node.label.clone(),
        });
    }

    fn update_node(&mut self, node: &TreeNode) {
        self.events.push(HostEvent::Updated { id: node.id.clone() });
    }

    fn delete_node(&mut self, parent: Option<&str>, id: &str) {
        let doomed: Vec<String> = self
            .live
            .keys()
            .filter(|k| k.as_str() == id || self.is_under(k, id))
            .cloned()
            .collect();
        for key in doomed {
            self.live.remove(&key);
        }
        self.events.push(HostEvent::Deleted {
            parent: parent.map(str::to_string),
            id: id.to_string(),
        });
    }
}

impl RunReporter for RecordingHost {
    fn enqueued(&mut self, id: &str) {
        self.events.push(HostEvent::Enqueued(id.to_string()));
    }

    fn started(&mut self, id: &str) {
        self.events.push(HostEvent::Started(id.to_string()));
    }

    fn passed(&mut self, id: &str, _duration: Option<Duration>) {
        self.events.push(HostEvent::Passed(id.to_string()));
    }

    fn failed(&mut self, id: &str, message: &str, _duration: Option<Duration>) {
        self.events.push(HostEvent::Failed {
            id: id.to_string(),
            message: message.to_string(),
        });
    }

    fn skipped(&mut self, id: &str) {
        self.events.push(HostEvent::Skipped(id.to_string()));
    }

    fn run_ended(&mut self, _summary: &RunSummary) {
        self.events.push(HostEvent::RunEnded);
    }
}
