//! Tree-sitter plumbing shared by the extractor.

use std::path::Path;

use tree_sitter::{Language, Node, Parser as TSParser, Tree};

use crate::error::EngineError;

/// Source grammar, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    JavaScript,
    TypeScript,
    Tsx,
}

impl Grammar {
    /// Pick the grammar for a spec file. Unknown extensions parse as JavaScript.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("ts" | "mts" | "cts") => Self::TypeScript,
            Some("tsx") => Self::Tsx,
            _ => Self::JavaScript,
        }
    }

    fn language(self) -> Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Tsx => "TSX",
        }
    }
}

/// Parse source code into a tree-sitter tree, rejecting syntax errors.
pub fn parse_tree(grammar: Grammar, content: &str) -> Result<Tree, EngineError> {
    let mut parser = TSParser::new();
    parser
        .set_language(&grammar.language())
        .map_err(|e| EngineError::Parse {
            message: format!("Failed to set {} language: {}", grammar.name(), e),
        })?;

    let tree = parser.parse(content, None).ok_or_else(|| EngineError::Parse {
        message: "Failed to parse content".to_string(),
    })?;

    if let Some(bad) = first_error(tree.root_node()) {
        let pos = bad.start_position();
        let what = if bad.is_missing() {
            format!("missing `{}`", bad.kind())
        } else {
            "unexpected token".to_string()
        };
        return Err(EngineError::Parse {
            message: format!("{} at line {}, column {}", what, pos.row + 1, pos.column + 1),
        });
    }

    Ok(tree)
}

/// First `ERROR` or `MISSING` node in document order.
fn first_error<'a>(node: Node<'a>) -> Option<Node<'a>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Get text for a node from source content.
pub fn node_text<'a>(node: &Node, content: &'a str) -> &'a str {
    &content[node.byte_range()]
}

/// Get line number (1-based) for a node.
pub fn node_line(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Get end line number (1-based) for a node.
pub fn node_end_line(node: &Node) -> u32 {
    node.end_position().row as u32 + 1
}

/// Named children, skipping comments.
pub fn named_children<'a>(node: &Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}
