//! The generated `wdio-wrapper.js` configuration.
//!
//! It loads the real configuration and swaps in a JSON reporter that writes
//! into the scratch directory. Paths are emitted as JSON string literals,
//! which are valid JavaScript string literals.

use std::path::Path;

use crate::discovery::Framework;

fn js_string(path: &Path) -> String {
    serde_json::Value::String(path.to_string_lossy().into_owned()).to_string()
}

/// Wrapper source for `config_file`, reporting into `output_dir`.
pub fn render(framework: Framework, config_file: &Path, output_dir: &Path) -> String {
    let reporters = match framework {
        Framework::MochaLike => format!(
            "[['json', {{ outputDir: {}, outputFileFormat: (opts) => `results-${{opts.cid}}.json` }}]]",
            js_string(output_dir)
        ),
        Framework::Cucumber => {
            format!("[['cucumberjs-json', {{ jsonFolder: {} }}]]", js_string(output_dir))
        }
    };

    format!(
        "const {{ config }} = require({})\nconfig.reporters = {}\nexports.config = config\n",
        js_string(config_file),
        reporters
    )
}

/// Whether `name` is a result file for `framework`.
pub fn is_result_file(framework: Framework, name: &str) -> bool {
    match framework {
        Framework::MochaLike => name.starts_with("results-") && name.ends_with(".json"),
        Framework::Cucumber => name.ends_with(".json"),
    }
}
