//! Title resolution for string and template literals.

use tree_sitter::Node;

use super::treesitter::{named_children, node_text};

/// Separator standing in for an interpolated `${...}` value.
pub const INTERPOLATION_SEPARATOR: &str = "..";

/// Static title of a literal argument, `None` for anything else.
pub fn title_of(node: &Node, source: &str) -> Option<String> {
    match node.kind() {
        "string" => {
            let text = node_text(node, source);
            // Strip the surrounding quotes.
            let inner = text.get(1..text.len().saturating_sub(1)).unwrap_or("");
            Some(unescape(inner))
        }
        "template_string" => Some(template_title(node, source)),
        _ => None,
    }
}

/// Joins the static fragments of a template literal; there is always one
/// more fragment than substitutions, empty ones included.
fn template_title(node: &Node, source: &str) -> String {
    let mut fragments = Vec::new();
    let mut start = node.start_byte() + 1;

    for sub in named_children(node)
        .into_iter()
        .filter(|n| n.kind() == "template_substitution")
    {
        fragments.push(unescape(&source[start..sub.start_byte()]));
        start = sub.end_byte();
    }

    let end = node.end_byte().saturating_sub(1).max(start);
    fragments.push(unescape(&source[start..end]));

    fragments.join(INTERPOLATION_SEPARATOR)
}

/// Resolve JavaScript escape sequences. Unknown escapes keep the escaped char.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // Line continuation.
            '\n' => {}
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex, 'x');
            }
            'u' => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &hex, 'u');
            }
            other => out.push(other),
        }
    }

    out
}

fn push_code_point(out: &mut String, hex: &str, kind: char) {
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(ch) => out.push(ch),
        None => {
            out.push('\\');
            out.push(kind);
            out.push_str(hex);
        }
    }
}
