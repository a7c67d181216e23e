//! Default values for wdx configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Discovery Defaults
// ============================================================================

/// Glob (relative to the workspace root) that locates wdio configuration files.
pub const DEFAULT_CONFIG_GLOB: &str = "**/wdio.conf.js";

/// Directories never descended into while looking for configuration files.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Dependencies
    "node_modules",
    // Build output
    "dist",
    "coverage",
];

/// Project-local settings file.
pub const DEFAULT_SETTINGS_FILE: &str = "wdx.toml";

// ============================================================================
// Runner Defaults
// ============================================================================

/// Program used to launch the wdio CLI.
pub const DEFAULT_RUNNER_COMMAND: &str = "npx";

/// Arguments placed before the wrapper configuration path.
pub const DEFAULT_RUNNER_ARGS: &[&str] = &["wdio", "run"];

/// Whether browsers are started headless.
pub const DEFAULT_HEADLESS: bool = true;

/// Flag appended when running headless.
pub const DEFAULT_HEADLESS_FLAG: &str = "--headless";

/// Prefix of the per-run scratch directory.
pub const SCRATCH_DIR_PREFIX: &str = "wdiotests_";

/// File name of the generated wrapper configuration.
pub const WRAPPER_FILE_NAME: &str = "wdio-wrapper.js";

// ============================================================================
// Extraction Defaults
// ============================================================================

/// Node binary used to evaluate configuration modules.
pub const DEFAULT_NODE: &str = "node";

/// Module preloaded for TypeScript configuration files.
pub const DEFAULT_TS_LOADER: &str = "ts-node/register";

/// Seconds the extraction process may run before it is abandoned.
pub const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 30;

/// Environment variable carrying the configuration path to the extraction script.
pub const CONFIG_PATH_ENV: &str = "WDX_CONFIG_PATH";

// ============================================================================
// Reporter Packages
// ============================================================================

/// Packages providing the `json` reporter for mocha and jasmine projects.
pub const MOCHA_JSON_REPORTERS: &[&str] = &["wdio-json-reporter", "@wdio/json-reporter"];

/// Packages providing the `cucumberjs-json` reporter.
pub const CUCUMBER_JSON_REPORTERS: &[&str] = &[
    "wdio-cucumberjs-json-reporter",
    "@seeplusplus/wdio-json-reporter",
];
