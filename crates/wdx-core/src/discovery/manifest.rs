//! `package.json` next to a configuration file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::Framework;
use crate::config::{CUCUMBER_JSON_REPORTERS, MOCHA_JSON_REPORTERS};
use crate::error::EngineError;
use crate::util::decode_json;

pub const MANIFEST_FILE: &str = "package.json";

/// The parts of an npm manifest discovery cares about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, serde_json::Value>,
}

impl PackageManifest {
    pub fn parse(subject: &str, json: &str) -> Result<Self, EngineError> {
        decode_json(subject, json)
    }

    /// Read `<folder>/package.json`.
    pub async fn read(folder: &Path) -> Result<Self, EngineError> {
        let path = folder.join(MANIFEST_FILE);
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| EngineError::io(&path, e))?;
        Self::parse(&path.display().to_string(), &json)
    }

    pub fn has_dependency(&self, package: &str) -> bool {
        self.dependencies.contains_key(package) || self.dev_dependencies.contains_key(package)
    }

    /// Whether a JSON reporter usable by `framework` is declared.
    pub fn has_json_reporter(&self, framework: Framework) -> bool {
        reporter_packages(framework)
            .iter()
            .any(|p| self.has_dependency(p))
    }

    /// Display name, ignoring blank names.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Reporter packages for a framework, preferred package first.
pub fn reporter_packages(framework: Framework) -> &'static [&'static str] {
    match framework {
        Framework::MochaLike => MOCHA_JSON_REPORTERS,
        Framework::Cucumber => CUCUMBER_JSON_REPORTERS,
    }
}
