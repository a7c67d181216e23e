//! Attaching source locations to execution results.
//!
//! Results carry titles but no positions; the static extractor has
//! positions. The two are aligned by index, and only when every level has
//! the same shape. Titles are not compared: template titles differ between
//! the two sides by construction.

use tracing::debug;

use crate::extract::{SourceSuite, TestExtractor};
use crate::report::ExecutionFile;
use crate::tree::SourceRange;

/// Whether suite and test counts line up at every level.
pub fn shapes_match(file: &ExecutionFile, suites: &[SourceSuite]) -> bool {
    file.suites.len() == suites.len()
        && file
            .suites
            .iter()
            .zip(suites)
            .all(|(run, src)| run.tests.len() == src.tests.len())
}

/// Enrich `file` with the declaration line of every test in `source`.
///
/// Returns the input unchanged when parsing fails or the shapes differ.
pub fn correlate(mut file: ExecutionFile, source: &str, extractor: &TestExtractor) -> ExecutionFile {
    let suites = match extractor.extract(source) {
        Ok(suites) => suites,
        Err(e) => {
            debug!(file = %file.name, "Skipping correlation: {}", e);
            return file;
        }
    };

    if !shapes_match(&file, &suites) {
        debug!(
            file = %file.name,
            executed = file.suites.len(),
            declared = suites.len(),
            "Skipping correlation: shapes differ"
        );
        return file;
    }

    for (run, src) in file.suites.iter_mut().zip(&suites) {
        for (test, declared) in run.tests.iter_mut().zip(&src.tests) {
            test.range = Some(SourceRange::line(declared.start_line.saturating_sub(1)));
        }
    }
    file
}

/// Read the spec source `file` refers to and correlate against it.
pub async fn correlate_file(file: ExecutionFile) -> ExecutionFile {
    let Some(path) = file.spec_path() else {
        return file;
    };
    match tokio::fs::read_to_string(&path).await {
        Ok(source) => correlate(file, &source, &TestExtractor::for_path(&path)),
        Err(e) => {
            debug!(path = %path.display(), "Skipping correlation: {}", e);
            file
        }
    }
}
