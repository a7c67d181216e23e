//! The identity-keyed test tree.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Id of the virtual root that configuration nodes hang off.
pub const ROOT_ID: &str = "";

/// Zero-based source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl SourceRange {
    /// The first character of a zero-based line.
    pub fn line(line: u32) -> Self {
        Self {
            start_line: line,
            start_col: 0,
            end_line: line,
            end_col: 1,
        }
    }
}

/// One node of the test tree as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            uri: None,
            range: None,
            children: Vec::new(),
        }
    }

    pub fn with_uri(mut self, uri: impl Into<PathBuf>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Direct child with the given id.
    pub fn child(&self, id: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.id == id)
    }

    /// Depth-first search of this subtree, including `self`.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Ids of this subtree in pre-order, `self` first.
    pub fn subtree_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.walk(&mut |node, _| ids.push(node.id.clone()));
        ids
    }

    /// Visit every node in pre-order with its depth below `self`.
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&TreeNode, usize),
    {
        fn go<F: FnMut(&TreeNode, usize)>(node: &TreeNode, depth: usize, visit: &mut F) {
            visit(node, depth);
            for child in &node.children {
                go(child, depth + 1, visit);
            }
        }
        go(self, 0, visit);
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The whole tree. Top-level nodes are configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestTree {
    root: TreeNode,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    pub fn new() -> Self {
        Self {
            root: TreeNode::new(ROOT_ID, ""),
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut TreeNode {
        &mut self.root
    }

    /// Configuration nodes in display order.
    pub fn configurations(&self) -> &[TreeNode] {
        &self.root.children
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        if id == ROOT_ID {
            return None;
        }
        self.root.find(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        if id == ROOT_ID {
            return None;
        }
        self.root.find_mut(id)
    }

    /// Number of nodes, the virtual root excluded.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.root.walk(&mut |_, _| count += 1);
        count - 1
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

/// Host-facing parent reference: `None` for top-level nodes.
pub(crate) fn host_parent(node: &TreeNode) -> Option<String> {
    (node.id != ROOT_ID).then(|| node.id.clone())
}
