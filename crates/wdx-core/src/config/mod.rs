//! Configuration management for wdx.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `wdx.toml` file
//! 3. User config `~/.config/wdx/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where to look for wdio configuration files.
    pub discovery: DiscoveryConfig,

    /// How the wdio CLI is launched.
    pub runner: RunnerConfig,

    /// How configuration modules are evaluated.
    pub extraction: ExtractionConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `<root>/wdx.toml` (project local)
    /// 2. `~/.config/wdx/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let local = root.as_ref().join(DEFAULT_SETTINGS_FILE);
        if local.exists() {
            return Self::from_file(local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("wdx").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(glob) = std::env::var("WDX_CONFIG_GLOB") {
            self.discovery.config_glob = glob;
        }
        if let Ok(headless) = std::env::var("WDX_HEADLESS") {
            self.runner.headless = parse_bool(&headless).ok_or_else(|| {
                ConfigError::Invalid(format!("WDX_HEADLESS must be true or false, got {headless:?}"))
            })?;
        }
        if let Ok(command) = std::env::var("WDX_RUNNER_COMMAND") {
            self.runner.command = command;
        }
        if let Ok(secs) = std::env::var("WDX_RUN_TIMEOUT") {
            if let Ok(n) = secs.parse() {
                self.runner.timeout_secs = Some(n);
            }
        }
        if let Ok(node) = std::env::var("WDX_NODE") {
            self.extraction.node = node;
        }
        if let Ok(secs) = std::env::var("WDX_EXTRACT_TIMEOUT") {
            if let Ok(n) = secs.parse() {
                self.extraction.timeout_secs = n;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.config_glob.trim().is_empty() {
            return Err(ConfigError::Invalid("discovery.config_glob is empty".to_string()));
        }
        if self.runner.command.trim().is_empty() {
            return Err(ConfigError::Invalid("runner.command is empty".to_string()));
        }
        if self.extraction.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "extraction.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration file discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Glob matched against paths relative to the workspace root.
    pub config_glob: String,

    /// Directory names skipped while walking the workspace.
    pub exclude_dirs: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            config_glob: DEFAULT_CONFIG_GLOB.to_string(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// wdio CLI invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Program to launch (default: "npx").
    pub command: String,

    /// Arguments placed before the wrapper path.
    pub args: Vec<String>,

    /// Pass the headless flag to wdio.
    pub headless: bool,

    /// The flag used for headless runs.
    pub headless_flag: String,

    /// Abandon a run after this many seconds. Unlimited when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_RUNNER_COMMAND.to_string(),
            args: DEFAULT_RUNNER_ARGS.iter().map(|s| s.to_string()).collect(),
            headless: DEFAULT_HEADLESS,
            headless_flag: DEFAULT_HEADLESS_FLAG.to_string(),
            timeout_secs: None,
        }
    }
}

impl RunnerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Isolated evaluation of configuration modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Node binary.
    pub node: String,

    /// Extra arguments passed to node before the script.
    pub node_args: Vec<String>,

    /// Module preloaded (`-r`) for `.ts` configuration files.
    pub ts_loader: String,

    /// Seconds before the extraction process is abandoned.
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            node: DEFAULT_NODE.to_string(),
            node_args: Vec::new(),
            ts_loader: DEFAULT_TS_LOADER.to_string(),
            timeout_secs: DEFAULT_EXTRACT_TIMEOUT_SECS,
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
