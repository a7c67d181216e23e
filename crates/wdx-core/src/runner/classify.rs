//! Recognizing known wdio failures in stderr.

use std::sync::OnceLock;

use regex::Regex;

use crate::discovery::{reporter_packages, Framework};
use crate::error::EngineError;

static REPORTER_MISSING: OnceLock<Regex> = OnceLock::new();
static CHROMEDRIVER_VERSION: OnceLock<Regex> = OnceLock::new();

fn reporter_missing() -> &'static Regex {
    REPORTER_MISSING.get_or_init(|| {
        Regex::new(r#"Error: Couldn't find plugin "(?:json|cucumberjs-json)" reporter"#)
            .expect("reporter regex")
    })
}

fn chromedriver_version() -> &'static Regex {
    CHROMEDRIVER_VERSION.get_or_init(|| {
        Regex::new(r"This version of ChromeDriver only supports Chrome version\s*(\d+)")
            .expect("chromedriver regex")
    })
}

/// Map stderr of a failed run to a known error, if it is one.
pub fn classify_failure(framework: Framework, stderr: &str) -> Option<EngineError> {
    if reporter_missing().is_match(stderr) {
        return Some(EngineError::ReporterMissing {
            package: reporter_packages(framework)[0].to_string(),
        });
    }
    if let Some(caps) = chromedriver_version().captures(stderr) {
        return Some(EngineError::ToolVersion {
            supported: caps[1].to_string(),
        });
    }
    None
}

/// Last meaningful stderr line, for short messages.
pub fn last_line(stderr: &str) -> Option<&str> {
    stderr.lines().map(str::trim).rev().find(|l| !l.is_empty())
}
