//! Small text helpers.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::EngineError;

static ANSI_REGEX: OnceLock<Regex> = OnceLock::new();

// CSI/OSC escape sequences, as emitted by wdio, chalk and cucumber.
fn ansi_regex() -> &'static Regex {
    ANSI_REGEX.get_or_init(|| {
        Regex::new(
            r"[\x1b\x9b][\[\]()#;?]*(?:(?:(?:[a-zA-Z\d]*(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-ntqry=><~]))",
        )
        .expect("ansi regex")
    })
}

/// Remove terminal escape sequences from tool output.
pub fn strip_ansi(text: &str) -> String {
    ansi_regex().replace_all(text, "").into_owned()
}

/// Decode a JSON document, naming the offending field on failure.
pub fn decode_json<T: DeserializeOwned>(subject: &str, json: &str) -> Result<T, EngineError> {
    let mut de = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut de).map_err(|e| EngineError::schema(subject, &e))
}
