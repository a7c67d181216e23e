//! Identity-preserving diff of the test tree.
//!
//! A level is reconciled in three steps:
//!
//! ```text
//! 1. prune by label   children whose title is gone entirely
//! 2. upsert           same id + same label  -> reuse (update uri/range)
//!                     same id + new label   -> delete, create
//!                     unknown id            -> create
//! 3. prune by id      anything not desired, then reorder
//! ```
//!
//! Unchanged inputs produce no host calls at all.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::host::{RunReporter, TreeHost};
use super::node::{host_parent, SourceRange, TreeNode};
use super::run_state::RunLedger;
use crate::report::{ExecutionReport, ReportItem};

/// A child the level should end up with.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredChild {
    pub id: String,
    pub label: String,
    pub uri: Option<PathBuf>,
    pub range: Option<SourceRange>,
}

impl DesiredChild {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            uri: None,
            range: None,
        }
    }

    fn to_node(&self) -> TreeNode {
        TreeNode {
            id: self.id.clone(),
            label: self.label.clone(),
            uri: self.uri.clone(),
            range: self.range,
            children: Vec::new(),
        }
    }
}

/// Where a desired child ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    /// Index in `parent.children`.
    pub index: usize,
    /// The node is new (or was recreated) and has no children yet.
    pub created: bool,
}

/// Make `parent.children` match `desired`, in order.
///
/// Returns one entry per desired child, in desired order. Ids in `desired`
/// must be unique.
pub fn reconcile_children<H>(
    parent: &mut TreeNode,
    desired: &[DesiredChild],
    host: &mut H,
) -> Vec<Upserted>
where
    H: TreeHost + ?Sized,
{
    let host_parent = host_parent(parent);
    let mut created = Vec::with_capacity(desired.len());

    for want in desired {
        match parent.children.iter().position(|c| c.id == want.id) {
            Some(pos) if parent.children[pos].label == want.label => {
                let child = &mut parent.children[pos];
                if child.uri != want.uri || child.range != want.range {
                    child.uri = want.uri.clone();
                    child.range = want.range;
                    host.update_node(child);
                }
                created.push(false);
            }
            Some(pos) => {
                debug!(id = %want.id, label = %want.label, "Recreating relabelled node");
                host.delete_node(host_parent.as_deref(), &want.id);
                parent.children[pos] = want.to_node();
                host.create_node(host_parent.as_deref(), &parent.children[pos]);
                created.push(true);
            }
            None => {
                let node = want.to_node();
                host.create_node(host_parent.as_deref(), &node);
                parent.children.push(node);
                created.push(true);
            }
        }
    }

    let ids: Vec<&str> = desired.iter().map(|d| d.id.as_str()).collect();
    remove_missing_by_id(parent, &ids, host);

    let order: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    parent
        .children
        .sort_by_key(|c| order.get(c.id.as_str()).copied().unwrap_or(usize::MAX));

    created
        .into_iter()
        .enumerate()
        .map(|(index, created)| Upserted { index, created })
        .collect()
}

/// Delete children whose label is not in `labels`. Returns how many went.
pub fn remove_missing_by_label<H, S>(parent: &mut TreeNode, labels: &[S], host: &mut H) -> usize
where
    H: TreeHost + ?Sized,
    S: AsRef<str>,
{
    remove_where(parent, host, |c| !labels.iter().any(|l| l.as_ref() == c.label))
}

/// Delete children whose id is not in `ids`. Returns how many went.
pub fn remove_missing_by_id<H, S>(parent: &mut TreeNode, ids: &[S], host: &mut H) -> usize
where
    H: TreeHost + ?Sized,
    S: AsRef<str>,
{
    remove_where(parent, host, |c| !ids.iter().any(|id| id.as_ref() == c.id))
}

fn remove_where<H, F>(parent: &mut TreeNode, host: &mut H, stale: F) -> usize
where
    H: TreeHost + ?Sized,
    F: Fn(&TreeNode) -> bool,
{
    if !parent.children.iter().any(&stale) {
        return 0;
    }
    let host_parent = host_parent(parent);
    let (gone, kept): (Vec<TreeNode>, Vec<TreeNode>) =
        std::mem::take(&mut parent.children).into_iter().partition(|c| stale(c));
    parent.children = kept;
    for node in &gone {
        host.delete_node(host_parent.as_deref(), &node.id);
    }
    gone.len()
}

/// Rebuilds a configuration's subtree from an execution report and
/// reports leaf outcomes as it goes.
pub struct ReportReconciler<'a> {
    ledger: &'a mut RunLedger,
}

impl<'a> ReportReconciler<'a> {
    pub fn new(ledger: &'a mut RunLedger) -> Self {
        Self { ledger }
    }

    /// Reconcile the children of `config` (a configuration node) with `report`.
    pub fn reconcile<H>(&mut self, config: &mut TreeNode, report: &ExecutionReport, host: &mut H)
    where
        H: TreeHost + RunReporter + ?Sized,
    {
        let inherited = config.uri.clone();
        self.reconcile_level(config, &report.items(), inherited.as_deref(), host);
    }

    fn reconcile_level<H>(
        &mut self,
        parent: &mut TreeNode,
        items: &[&dyn ReportItem],
        inherited_uri: Option<&Path>,
        host: &mut H,
    ) where
        H: TreeHost + RunReporter + ?Sized,
    {
        let desired: Vec<DesiredChild> = items
            .iter()
            .enumerate()
            .map(|(index, item)| DesiredChild {
                id: item.node_id(&parent.id, index),
                label: item.label(),
                uri: item.uri().or_else(|| inherited_uri.map(Path::to_path_buf)),
                range: item.range(),
            })
            .collect();

        let labels: Vec<&str> = desired.iter().map(|d| d.label.as_str()).collect();
        remove_missing_by_label(parent, &labels, host);

        let slots = reconcile_children(parent, &desired, host);

        for (slot, item) in slots.into_iter().zip(items) {
            let child = &mut parent.children[slot.index];
            if slot.created {
                self.ledger.begin(&child.id, host);
            }
            match item.outcome() {
                Some(outcome) => {
                    self.ledger.resolve(&child.id, &outcome, host);
                }
                None => {
                    let uri = child.uri.clone();
                    self.reconcile_level(child, &item.children(), uri.as_deref(), host);
                }
            }
        }
    }
}
