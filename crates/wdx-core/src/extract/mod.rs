//! Static test extraction from spec sources.
//!
//! Recovers the suites (`describe`/`suite`) and tests (`it`/`test`) a spec
//! file declares, with their source lines, without running anything. Only
//! top-level suites and their direct test calls are extracted:
//!
//! ```text
//! describe("login", () => {      <- SourceSuite { name: "login", start_line: 1 }
//!   beforeEach(async () => {})   <- ignored
//!   it("accepts a user", ...)    <- SourceTest { name: "accepts a user", start_line: 3 }
//! })
//! ```
//!
//! Titles written as template literals keep their static text only; the
//! fragments around each `${...}` are joined with `..`.

mod literal;
mod treesitter;

pub use treesitter::Grammar;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::error::EngineError;
use literal::title_of;
use treesitter::{named_children, node_end_line, node_line, node_text, parse_tree};

/// Callee names that declare a suite.
pub const SUITE_FUNCTIONS: &[&str] = &["describe", "suite"];

/// Callee names that declare a test.
pub const TEST_FUNCTIONS: &[&str] = &["it", "test"];

/// A test declaration found by static parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTest {
    pub name: String,
    /// 1-based line of the declaring statement.
    pub start_line: u32,
    /// 1-based last line of the declaring statement.
    pub end_line: u32,
}

/// A suite declaration and the tests directly inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSuite {
    pub name: String,
    /// 1-based line of the declaring statement.
    pub start_line: u32,
    pub tests: Vec<SourceTest>,
}

/// Extracts suites and tests from spec source text.
#[derive(Debug, Clone, Copy)]
pub struct TestExtractor {
    grammar: Grammar,
}

impl TestExtractor {
    pub fn new(grammar: Grammar) -> Self {
        Self { grammar }
    }

    /// Extractor for the grammar implied by a spec file's extension.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        Self::new(Grammar::from_path(path))
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Extract the declared suites in source order.
    pub fn extract(&self, source: &str) -> Result<Vec<SourceSuite>, EngineError> {
        let tree = parse_tree(self.grammar, source)?;
        let root = tree.root_node();

        let suites = named_children(&root)
            .into_iter()
            .filter_map(|stmt| {
                let call = call_to(&stmt, source, SUITE_FUNCTIONS)?;
                parse_suite(&stmt, &call, source)
            })
            .collect();

        Ok(suites)
    }
}

impl Default for TestExtractor {
    fn default() -> Self {
        Self::new(Grammar::JavaScript)
    }
}

/// The call expression of `stmt` if it is `name(...)` for one of `names`.
fn call_to<'a>(stmt: &Node<'a>, source: &str, names: &[&str]) -> Option<Node<'a>> {
    if stmt.kind() != "expression_statement" {
        return None;
    }
    let call = stmt.named_child(0)?;
    if call.kind() != "call_expression" {
        return None;
    }
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != "identifier" {
        return None;
    }
    let name = node_text(&callee, source);
    names.contains(&name).then_some(call)
}

fn arguments<'a>(call: &Node<'a>) -> Vec<Node<'a>> {
    call.child_by_field_name("arguments")
        .map(|args| named_children(&args))
        .unwrap_or_default()
}

fn parse_suite(stmt: &Node, call: &Node, source: &str) -> Option<SourceSuite> {
    let args = arguments(call);
    let name = args.first().and_then(|n| title_of(n, source)).unwrap_or_default();
    let body = args.get(1).and_then(block_body)?;

    let tests = named_children(&body)
        .into_iter()
        .filter_map(|inner| {
            let test_call = call_to(&inner, source, TEST_FUNCTIONS)?;
            let name = arguments(&test_call)
                .first()
                .and_then(|n| title_of(n, source))
                .unwrap_or_default();
            Some(SourceTest {
                name,
                start_line: node_line(&inner),
                end_line: node_end_line(&inner),
            })
        })
        .collect();

    Some(SourceSuite {
        name,
        start_line: node_line(stmt),
        tests,
    })
}

/// Block body of an inline zero-parameter callback.
fn block_body<'a>(callback: &Node<'a>) -> Option<Node<'a>> {
    match callback.kind() {
        "arrow_function" => {
            if callback.child_by_field_name("parameter").is_some() {
                return None;
            }
        }
        "function_expression" | "function" => {}
        _ => return None,
    }

    if let Some(params) = callback.child_by_field_name("parameters") {
        if !named_children(&params).is_empty() {
            return None;
        }
    }

    let body = callback.child_by_field_name("body")?;
    (body.kind() == "statement_block").then_some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
describe("suite1", () => {
  before(async () => {
      // initialization
  })

  it("test1", async () => {
      // your first test
  })

  it("test2", async () => {
      // your second test
  })
})

describe(`sui${a}te2`, () => {
  it("test3", async () => {
      // your second test
  })
})"#;

    fn extract(source: &str) -> Vec<SourceSuite> {
        TestExtractor::default().extract(source).unwrap()
    }

    #[test]
    fn test_extracts_suites_and_tests_in_order() {
        let suites = extract(SIMPLE);
        assert_eq!(suites.len(), 2);

        assert_eq!(suites[0].name, "suite1");
        assert_eq!(suites[0].start_line, 2);
        let lines: Vec<u32> = suites[0].tests.iter().map(|t| t.start_line).collect();
        assert_eq!(lines, vec![7, 11]);
        assert_eq!(suites[0].tests[0].name, "test1");
        assert_eq!(suites[0].tests[0].end_line, 9);

        assert_eq!(suites[1].name, "sui..te2");
        assert_eq!(suites[1].tests.len(), 1);
        assert_eq!(suites[1].tests[0].start_line, 17);
    }

    #[test]
    fn test_synonyms_are_accepted() {
        let source = "suite('a', function () {\n  test('one', () => {})\n})\n\ndescribe('b', () => {\n  it('two', () => {})\n})\n";
        let suites = extract(source);
        assert_eq!(suites.len(), 2);
        assert_eq!(suites[0].tests[0].name, "one");
        assert_eq!(suites[1].tests[0].name, "two");
        assert_eq!(suites[1].tests[0].start_line, 6);
    }

    #[test]
    fn test_nested_suites_are_not_extracted() {
        let source = "describe('outer', () => {\n  describe('inner', () => {\n    it('deep', () => {})\n  })\n  it('shallow', () => {})\n})\n";
        let suites = extract(source);
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].tests.len(), 1);
        assert_eq!(suites[0].tests[0].name, "shallow");
    }

    #[test]
    fn test_callback_with_parameters_is_skipped() {
        let source = "describe('a', (ctx) => {\n  it('x', () => {})\n})\ndescribe('b', done => {})\n";
        assert!(extract(source).is_empty());
    }

    #[test]
    fn test_expression_bodied_callback_is_skipped() {
        assert!(extract("describe('a', () => it('x', () => {}))\n").is_empty());
    }

    #[test]
    fn test_member_calls_are_ignored() {
        let source = "describe.only('a', () => {\n  it('x', () => {})\n})\ndescribe('b', () => {\n  it.skip('y', () => {})\n  it('z', () => {})\n})\n";
        let suites = extract(source);
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].name, "b");
        assert_eq!(suites[0].tests.len(), 1);
    }

    #[test]
    fn test_non_literal_test_title_is_empty() {
        let source = "describe('a', () => {\n  it(title, () => {})\n})\n";
        assert_eq!(extract(source)[0].tests[0].name, "");
    }

    #[test]
    fn test_non_literal_suite_title_keeps_position() {
        let source = "describe(name, () => {\n  it('x', () => {})\n})\ndescribe('b', () => {\n  it('y', () => {})\n})\n";
        let suites = extract(source);
        assert_eq!(suites.len(), 2);
        assert_eq!(suites[0].name, "");
        assert_eq!(suites[0].tests[0].name, "x");
        assert_eq!(suites[1].name, "b");
    }

    #[test]
    fn test_typescript_source() {
        let source = "import { expect } from '@wdio/globals'\n\ndescribe('typed', () => {\n  const page: string = 'x'\n  it('works', async (): Promise<void> => {\n    await expect(page).toBe('x')\n  })\n})\n";
        let suites = TestExtractor::new(Grammar::TypeScript).extract(source).unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].tests[0].start_line, 5);
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = TestExtractor::default().extract("describe('a', () => {").unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = TestExtractor::default();
        assert_eq!(extractor.extract(SIMPLE).unwrap(), extractor.extract(SIMPLE).unwrap());
    }
}
