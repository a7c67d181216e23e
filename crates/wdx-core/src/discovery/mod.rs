//! Locating and reading wdio configuration files.
//!
//! Discovery walks the workspace, matches root-relative paths against the
//! configured glob, and resolves each match independently:
//!
//! ```text
//! wdio.conf.js --node--> {framework, specs, exclude}
//!              +-------> package.json (name, reporter dependency)
//!              = Configuration (+ warnings)
//! ```
//!
//! One broken configuration never hides the others.

mod evaluate;
mod manifest;

pub use evaluate::{RawConfig, READ_CONFIG_SCRIPT};
pub use manifest::{reporter_packages, PackageManifest, MANIFEST_FILE};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::Pattern;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{DiscoveryConfig, ExtractionConfig};
use crate::error::EngineError;
use crate::runner::ProcessRunner;

/// Result shape a configuration produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framework {
    /// mocha or jasmine, reported by the `json` reporter.
    MochaLike,
    /// cucumber, reported by the `cucumberjs-json` reporter.
    Cucumber,
}

impl Framework {
    /// Map a wdio `framework` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mocha" | "jasmine" => Some(Self::MochaLike),
            "cucumber" => Some(Self::Cucumber),
            _ => None,
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MochaLike => write!(f, "mocha"),
            Self::Cucumber => write!(f, "cucumber"),
        }
    }
}

/// A resolved wdio configuration. Identified by its folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub id: String,
    pub display_name: String,
    pub framework: Framework,
    pub specs: Vec<String>,
    pub exclude: Vec<String>,
    /// The configuration file.
    pub source: PathBuf,
    pub has_json_reporter: bool,
}

impl Configuration {
    /// Folder the tool runs in.
    pub fn folder(&self) -> &Path {
        self.source.parent().unwrap_or(Path::new("."))
    }
}

/// Something worth telling the user that does not stop discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    /// `package.json` is missing or unreadable.
    ManifestUnreadable { folder: PathBuf, reason: String },
    /// No JSON reporter package is declared; runs will likely fail.
    ReporterMissing {
        configuration: String,
        package: String,
    },
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManifestUnreadable { folder, reason } => {
                write!(f, "Could not read package.json in {}: {}", folder.display(), reason)
            }
            Self::ReporterMissing { configuration, package } => write!(
                f,
                "{} is missing {}. WDIO tests might fail running",
                configuration, package
            ),
        }
    }
}

/// Outcome of one discovery pass.
#[derive(Debug, Default)]
pub struct Discovery {
    pub configurations: Vec<Configuration>,
    pub warnings: Vec<DiscoveryWarning>,
    /// Configuration files that could not be resolved.
    pub errors: Vec<(PathBuf, EngineError)>,
}

/// Finds and resolves configuration files.
pub struct ConfigResolver {
    discovery: DiscoveryConfig,
    extraction: ExtractionConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl ConfigResolver {
    pub fn new(
        discovery: DiscoveryConfig,
        extraction: ExtractionConfig,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            discovery,
            extraction,
            runner,
        }
    }

    /// Compile a configuration glob.
    pub fn pattern(glob: &str) -> Result<Pattern, EngineError> {
        Pattern::new(glob)
            .map_err(|e| EngineError::Discovery(format!("invalid glob {:?}: {}", glob, e)))
    }

    /// Whether `path` (absolute, or relative to `root`) matches `glob`.
    pub fn matches(root: &Path, path: &Path, glob: &Pattern) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        glob.matches_path(relative)
    }

    /// Configuration files under `root`, sorted.
    pub fn find_config_files(&self, root: &Path, glob: &Pattern) -> Result<Vec<PathBuf>, EngineError> {
        if !root.is_dir() {
            return Err(EngineError::Discovery(format!(
                "{} is not a readable directory",
                root.display()
            )));
        }

        let excluded = self.discovery.exclude_dirs.clone();
        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !(is_dir && excluded.iter().any(|d| entry.file_name() == d.as_str()))
            })
            .build();

        let mut found: Vec<PathBuf> = walker
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.into_path())
            .filter(|p| Self::matches(root, p, glob))
            .collect();
        found.sort();
        Ok(found)
    }

    /// Discover every configuration under `root` matching `glob`.
    ///
    /// Only an invalid glob or an unreadable root fails the pass; a broken
    /// configuration lands in [`Discovery::errors`].
    pub async fn discover(&self, root: &Path, glob: &str) -> Result<Discovery, EngineError> {
        let pattern = Self::pattern(glob)?;
        let files = self.find_config_files(root, &pattern)?;
        info!(root = %root.display(), glob, count = files.len(), "Found configuration files");

        let mut discovery = Discovery::default();
        for path in files {
            match self.resolve(&path).await {
                Ok((config, warnings)) => {
                    if discovery.configurations.iter().any(|c| c.id == config.id) {
                        warn!(id = %config.id, path = %path.display(), "Ignoring second configuration in the same folder");
                        continue;
                    }
                    discovery.configurations.push(config);
                    discovery.warnings.extend(warnings);
                }
                Err(e) => {
                    warn!(path = %path.display(), kind = e.kind(), "Configuration failed: {}", e);
                    discovery.errors.push((path, e));
                }
            }
        }
        Ok(discovery)
    }

    /// Resolve one configuration file.
    pub async fn resolve(
        &self,
        path: &Path,
    ) -> Result<(Configuration, Vec<DiscoveryWarning>), EngineError> {
        let subject = path.display().to_string();
        let raw = evaluate::evaluate(self.runner.as_ref(), &self.extraction, path).await?;
        let framework = raw.framework(&subject)?;

        let folder = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let folder_name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| folder.display().to_string());

        let mut warnings = Vec::new();
        let manifest = match PackageManifest::read(&folder).await {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warnings.push(DiscoveryWarning::ManifestUnreadable {
                    folder: folder.clone(),
                    reason: e.to_string(),
                });
                None
            }
        };

        let display_name = manifest
            .as_ref()
            .and_then(|m| m.display_name())
            .map(str::to_string)
            .unwrap_or(folder_name);
        let has_json_reporter = manifest
            .as_ref()
            .map(|m| m.has_json_reporter(framework))
            .unwrap_or(false);
        if !has_json_reporter {
            warnings.push(DiscoveryWarning::ReporterMissing {
                configuration: display_name.clone(),
                package: reporter_packages(framework)[0].to_string(),
            });
        }

        let config = Configuration {
            id: folder.display().to_string(),
            display_name,
            framework,
            specs: raw.specs,
            exclude: raw.exclude,
            source: path.to_path_buf(),
            has_json_reporter,
        };
        Ok((config, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_parse() {
        assert_eq!(Framework::parse("Mocha"), Some(Framework::MochaLike));
        assert_eq!(Framework::parse("cucumber"), Some(Framework::Cucumber));
        assert_eq!(Framework::parse("qunit"), None);
        assert_eq!(Framework::MochaLike.to_string(), "mocha");
    }

    #[test]
    fn test_invalid_glob_is_discovery_error() {
        assert!(matches!(
            ConfigResolver::pattern("**/[wdio.conf.js"),
            Err(EngineError::Discovery(_))
        ));
    }

    #[test]
    fn test_glob_matches_relative_paths() {
        let pattern = ConfigResolver::pattern("**/wdio.conf.js").unwrap();
        let root = Path::new("/work");
        assert!(ConfigResolver::matches(root, Path::new("/work/wdio.conf.js"), &pattern));
        assert!(ConfigResolver::matches(root, Path::new("/work/e2e/wdio.conf.js"), &pattern));
        assert!(!ConfigResolver::matches(root, Path::new("/work/e2e/wdio.conf.ts"), &pattern));
    }

    #[test]
    fn test_warning_messages() {
        let warning = DiscoveryWarning::ReporterMissing {
            configuration: "shop".to_string(),
            package: "wdio-json-reporter".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "shop is missing wdio-json-reporter. WDIO tests might fail running"
        );
    }
}
