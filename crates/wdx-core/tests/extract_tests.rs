use proptest::prelude::*;
use wdx_core::{EngineError, Grammar, TestExtractor};

const LOGIN_SPEC: &str = r#"import { expect } from "@wdio/globals"
import LoginPage from "../pageobjects/login.page.js"

describe("suite1", () => {
  // login flow
  it("test1", async () => {
    await LoginPage.open()
  })

  it("test2", async () => {
    await expect(LoginPage.flash).toBeExisting()
  })
})
"#;

const SYNONYM_SPEC: &str = r#"suite("first", function () {
  test("one", () => {})
  test("two", () => {})
})

describe("second", () => {
  it("three", () => {
    // body
  })
})
"#;

#[test]
fn test_single_suite_with_header_lines() {
    let suites = TestExtractor::default().extract(LOGIN_SPEC).unwrap();
    assert_eq!(suites.len(), 1);
    assert_eq!(suites[0].name, "suite1");
    assert_eq!(suites[0].start_line, 4);
    assert_eq!(suites[0].tests.len(), 2);
    assert_eq!(suites[0].tests[0].start_line, 6);
    assert_eq!(suites[0].tests[0].end_line, 8);
    assert_eq!(suites[0].tests[1].start_line, 10);
}

#[test]
fn test_synonyms_and_positions() {
    let suites = TestExtractor::default().extract(SYNONYM_SPEC).unwrap();
    assert_eq!(suites.len(), 2);
    assert_eq!(suites[0].name, "first");
    assert_eq!(suites[0].tests.len(), 2);
    assert_eq!(suites[1].name, "second");
    assert_eq!(suites[1].tests.len(), 1);
    assert_eq!(suites[1].tests[0].name, "three");
    assert_eq!(suites[1].tests[0].start_line, 7);
    assert_eq!(suites[1].tests[0].end_line, 9);
}

#[test]
fn test_grammar_from_path() {
    assert_eq!(TestExtractor::for_path("a/login.e2e.js").grammar(), Grammar::JavaScript);
    assert_eq!(TestExtractor::for_path("a/login.e2e.ts").grammar(), Grammar::TypeScript);
    assert_eq!(TestExtractor::for_path("a/login.mts").grammar(), Grammar::TypeScript);
    assert_eq!(TestExtractor::for_path("a/Login.tsx").grammar(), Grammar::Tsx);
    assert_eq!(TestExtractor::for_path("a/login.mjs").grammar(), Grammar::JavaScript);
}

#[test]
fn test_tsx_source() {
    let source = "describe('widget', () => {\n  const el = <div className=\"x\" />\n  it('renders', () => {})\n})\n";
    let suites = TestExtractor::new(Grammar::Tsx).extract(source).unwrap();
    assert_eq!(suites[0].tests[0].start_line, 3);
}

#[test]
fn test_parse_error_reports_position() {
    let err = TestExtractor::default()
        .extract("describe('a', () => {\n  it('b', () => {\n})\n")
        .unwrap_err();
    match err {
        EngineError::Parse { message } => assert!(message.contains("line")),
        other => panic!("unexpected error: {other:?}"),
    }
}

fn title() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.-]{0,20}"
}

fn suite_source(suites: &[(String, Vec<String>)]) -> String {
    let mut out = String::new();
    for (suite, tests) in suites {
        out.push_str(&format!("describe({:?}, () => {{\n", suite));
        for test in tests {
            out.push_str(&format!("  it({:?}, async () => {{\n    await browser.pause(1)\n  }})\n", test));
        }
        out.push_str("})\n\n");
    }
    out
}

proptest! {
    /// Generated suites come back with the same names and counts, twice over.
    #[test]
    fn extraction_recovers_generated_suites(
        suites in prop::collection::vec((title(), prop::collection::vec(title(), 0..5)), 0..5)
    ) {
        let source = suite_source(&suites);
        let extractor = TestExtractor::default();
        let first = extractor.extract(&source).unwrap();
        let second = extractor.extract(&source).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), suites.len());
        for (found, (name, tests)) in first.iter().zip(&suites) {
            prop_assert_eq!(&found.name, name);
            let names: Vec<&String> = found.tests.iter().map(|t| &t.name).collect();
            let expected: Vec<&String> = tests.iter().collect();
            prop_assert_eq!(names, expected);
            for pair in found.tests.windows(2) {
                prop_assert!(pair[0].end_line < pair[1].start_line);
            }
        }
    }
}
