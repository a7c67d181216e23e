//! Plain terminal rendering of the test tree and run progress.

use std::collections::HashMap;
use std::time::Duration;

use wdx_core::{RunReporter, RunState, RunSummary, TestTree, TreeHost, TreeNode};

/// Prints run progress as it happens and remembers each node's last state
/// so the final tree can be drawn with outcomes.
#[derive(Debug, Default)]
pub struct ConsoleHost {
    states: HashMap<String, RunState>,
    messages: HashMap<String, String>,
    labels: HashMap<String, String>,
    verbose: bool,
}

impl ConsoleHost {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map(String::as_str).unwrap_or(id)
    }

    fn set(&mut self, id: &str, state: RunState) {
        self.states.insert(id.to_string(), state);
    }

    /// Draw `tree` with the outcome of every node seen during the run.
    pub fn print_tree(&self, tree: &TestTree) {
        for config in tree.configurations() {
            config.walk(&mut |node: &TreeNode, depth| {
                let marker = match self.states.get(&node.id) {
                    Some(RunState::Passed) => "✓",
                    Some(RunState::Failed) => "✗",
                    Some(RunState::Skipped) => "-",
                    Some(RunState::Started) | Some(RunState::Enqueued) => "…",
                    Some(RunState::Idle) | None => " ",
                };
                println!("{}{} {}", "  ".repeat(depth), marker, node.label);
                if let Some(message) = self.messages.get(&node.id) {
                    for line in message.lines().take(3) {
                        println!("{}    {}", "  ".repeat(depth), line);
                    }
                }
            });
        }
    }
}

impl TreeHost for ConsoleHost {
    fn create_node(&mut self, parent: Option<&str>, node: &TreeNode) {
        self.labels.insert(node.id.clone(), node.label.clone());
        if self.verbose {
            println!("+ {} ({})", node.label, parent.unwrap_or("<root>"));
        }
    }

    fn update_node(&mut self, node: &TreeNode) {
        self.labels.insert(node.id.clone(), node.label.clone());
    }

    fn delete_node(&mut self, _parent: Option<&str>, id: &str) {
        if self.verbose {
            println!("- {}", self.label(id));
        }
        self.labels.remove(id);
        self.states.remove(id);
        self.messages.remove(id);
    }
}

impl RunReporter for ConsoleHost {
    fn enqueued(&mut self, id: &str) {
        self.set(id, RunState::Enqueued);
    }

    fn started(&mut self, id: &str) {
        self.set(id, RunState::Started);
    }

    fn passed(&mut self, id: &str, duration: Option<Duration>) {
        self.set(id, RunState::Passed);
        if self.verbose {
            match duration {
                Some(d) => println!("✓ {} ({} ms)", self.label(id), d.as_millis()),
                None => println!("✓ {}", self.label(id)),
            }
        }
    }

    fn failed(&mut self, id: &str, message: &str, _duration: Option<Duration>) {
        self.set(id, RunState::Failed);
        self.messages.insert(id.to_string(), message.to_string());
        println!("✗ {}", self.label(id));
    }

    fn skipped(&mut self, id: &str) {
        self.set(id, RunState::Skipped);
    }

    fn run_ended(&mut self, summary: &RunSummary) {
        println!(
            "\n{} passed, {} failed, {} skipped in {:.1}s",
            summary.counts.passed,
            summary.counts.failed,
            summary.counts.skipped,
            summary.duration().num_milliseconds() as f64 / 1000.0
        );
        if summary.was_cancelled() {
            println!("Cancelled before: {}", summary.cancelled.join(", "));
        }
    }
}
