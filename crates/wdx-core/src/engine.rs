//! The engine: configurations, the tree, and the run loop.
//!
//! The caller constructs and owns an [`Engine`]; every operation takes
//! `&mut self` and runs on a single task. Configurations run one after the
//! other, in id order, and cancellation is only looked at between them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::correlate::correlate_file;
use crate::discovery::{ConfigResolver, Configuration, DiscoveryWarning, MANIFEST_FILE};
use crate::error::EngineError;
use crate::report::{spec_path, ExecutionReport};
use crate::runner::{ExecutionDriver, ProcessRunner};
use crate::tree::{
    reconcile_children, DesiredChild, ReportReconciler, RunCounts, RunLedger, RunReporter,
    TestTree, TreeHost,
};

/// Shared cancellation request. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Known configurations keyed by id (their folder).
#[derive(Debug, Clone, Default)]
pub struct ConfigurationRepository {
    entries: BTreeMap<String, Configuration>,
}

impl ConfigurationRepository {
    pub fn get(&self, id: &str) -> Option<&Configuration> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, config: Configuration) -> Option<Configuration> {
        self.entries.insert(config.id.clone(), config)
    }

    pub fn remove(&mut self, id: &str) -> Option<Configuration> {
        self.entries.remove(id)
    }

    /// Configurations in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.entries.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which configurations a run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    /// `None` runs everything.
    pub configurations: Option<Vec<String>>,
}

impl RunRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            configurations: Some(ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn includes(&self, id: &str) -> bool {
        match &self.configurations {
            Some(ids) => ids.iter().any(|i| i == id),
            None => true,
        }
    }
}

/// A configuration that could not produce results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationFailure {
    pub id: String,
    pub name: String,
    pub kind: &'static str,
    pub message: String,
}

/// What happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub counts: RunCounts,
    /// Configurations that produced results.
    pub executed: Vec<String>,
    /// Configurations skipped because of cancellation.
    pub cancelled: Vec<String>,
    pub failures: Vec<ConfigurationFailure>,
}

impl RunSummary {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// No configuration failed and no test failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.counts.failed == 0
    }

    pub fn was_cancelled(&self) -> bool {
        !self.cancelled.is_empty()
    }

    /// One message for the user covering every failed configuration.
    pub fn user_message(&self) -> Option<String> {
        match self.failures.as_slice() {
            [] => None,
            [only] => Some(only.message.clone()),
            many => {
                let lines: Vec<String> = many
                    .iter()
                    .map(|f| format!("{}: {}", f.name, f.message))
                    .collect();
                Some(format!(
                    "{} configurations failed:\n{}",
                    many.len(),
                    lines.join("\n")
                ))
            }
        }
    }
}

/// Changes made by a discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Configurations kept from an earlier pass because they failed this time.
    pub retained: Vec<String>,
    pub warnings: Vec<DiscoveryWarning>,
    pub errors: Vec<(PathBuf, EngineError)>,
}

/// Owns the configuration repository and the test tree.
pub struct Engine {
    root: PathBuf,
    config: Config,
    resolver: ConfigResolver,
    driver: ExecutionDriver,
    repository: ConfigurationRepository,
    tree: TestTree,
    warnings: Vec<DiscoveryWarning>,
}

impl Engine {
    pub fn new(root: impl Into<PathBuf>, config: Config, runner: Arc<dyn ProcessRunner>) -> Self {
        let resolver = ConfigResolver::new(
            config.discovery.clone(),
            config.extraction.clone(),
            runner.clone(),
        );
        let driver = ExecutionDriver::new(config.runner.clone(), runner);
        Self {
            root: root.into(),
            config,
            resolver,
            driver,
            repository: ConfigurationRepository::default(),
            tree: TestTree::new(),
            warnings: Vec::new(),
        }
    }

    /// Create scratch directories under `dir` instead of the system temp dir.
    pub fn with_scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.driver = self.driver.with_scratch_root(dir);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> &TestTree {
        &self.tree
    }

    pub fn repository(&self) -> &ConfigurationRepository {
        &self.repository
    }

    /// Warnings of the last discovery pass.
    pub fn warnings(&self) -> &[DiscoveryWarning] {
        &self.warnings
    }

    /// Rediscover configurations and reconcile the top level of the tree.
    ///
    /// Fails only when discovery cannot run at all; the tree and repository
    /// are then left as they were.
    pub async fn discover<H>(&mut self, host: &mut H) -> Result<DiscoveryReport, EngineError>
    where
        H: TreeHost + ?Sized,
    {
        let discovery = self
            .resolver
            .discover(&self.root, &self.config.discovery.config_glob)
            .await?;

        let mut next = ConfigurationRepository::default();
        for config in discovery.configurations {
            next.insert(config);
        }

        let mut retained = Vec::new();
        for (path, err) in &discovery.errors {
            let id = path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            if next.contains(&id) {
                continue;
            }
            if let Some(previous) = self.repository.get(&id) {
                warn!(id = %id, "Keeping previous configuration: {}", err);
                next.insert(previous.clone());
                retained.push(id);
            }
        }

        let added: Vec<String> = next
            .ids()
            .into_iter()
            .filter(|id| !self.repository.contains(id))
            .collect();
        let removed: Vec<String> = self
            .repository
            .ids()
            .into_iter()
            .filter(|id| !next.contains(id))
            .collect();

        let desired: Vec<DesiredChild> = next
            .iter()
            .map(|c| DesiredChild {
                id: c.id.clone(),
                label: c.display_name.clone(),
                uri: Some(c.source.clone()),
                range: None,
            })
            .collect();
        reconcile_children(self.tree.root_mut(), &desired, host);

        self.repository = next;
        self.warnings = discovery.warnings.clone();
        info!(
            configurations = self.repository.len(),
            added = added.len(),
            removed = removed.len(),
            "Discovery finished"
        );

        Ok(DiscoveryReport {
            added,
            removed,
            retained,
            warnings: discovery.warnings,
            errors: discovery.errors,
        })
    }

    /// Run the requested configurations and reconcile their subtrees.
    pub async fn run<H>(
        &mut self,
        request: &RunRequest,
        host: &mut H,
        cancel: &CancellationFlag,
    ) -> RunSummary
    where
        H: TreeHost + RunReporter + ?Sized,
    {
        let started_at = Utc::now();
        let mut ledger = RunLedger::new();
        let selected: Vec<Configuration> = self
            .repository
            .iter()
            .filter(|c| request.includes(&c.id))
            .cloned()
            .collect();

        for config in &selected {
            for id in self.subtree_ids(&config.id) {
                ledger.enqueue(&id, host);
            }
        }

        let mut executed = Vec::new();
        let mut cancelled = Vec::new();
        let mut failures = Vec::new();

        for config in &selected {
            if cancel.is_cancelled() {
                info!(configuration = %config.id, "Run cancelled, skipping");
                for id in self.subtree_ids(&config.id) {
                    ledger.skip(&id, host);
                }
                cancelled.push(config.id.clone());
                continue;
            }

            for id in self.subtree_ids(&config.id) {
                ledger.start(&id, host);
            }

            match self.execute(config).await {
                Ok(report) => {
                    if let Some(node) = self.tree.get_mut(&config.id) {
                        ReportReconciler::new(&mut ledger).reconcile(node, &report, host);
                    }
                    executed.push(config.id.clone());
                }
                Err(e) => {
                    warn!(configuration = %config.id, kind = e.kind(), "Configuration failed: {}", e);
                    let message = e.to_string();
                    ledger.fail(&config.id, &message, host);
                    // Nodes from the previous run get no outcome this time.
                    for id in self.subtree_ids(&config.id).iter().skip(1) {
                        ledger.skip(id, host);
                    }
                    failures.push(ConfigurationFailure {
                        id: config.id.clone(),
                        name: config.display_name.clone(),
                        kind: e.kind(),
                        message,
                    });
                }
            }
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            counts: ledger.counts(),
            executed,
            cancelled,
            failures,
        };
        info!(
            passed = summary.counts.passed,
            failed = summary.counts.failed,
            skipped = summary.counts.skipped,
            "Run finished"
        );
        host.run_ended(&summary);
        summary
    }

    /// React to a file change. Rediscovers when `path` is a configuration
    /// file or the manifest of a known configuration.
    pub async fn notify_changed<H>(
        &mut self,
        path: &Path,
        host: &mut H,
    ) -> Result<Option<DiscoveryReport>, EngineError>
    where
        H: TreeHost + ?Sized,
    {
        if !self.is_relevant(path)? {
            return Ok(None);
        }
        info!(path = %path.display(), "Configuration changed");
        self.discover(host).await.map(Some)
    }

    fn is_relevant(&self, path: &Path) -> Result<bool, EngineError> {
        let pattern = ConfigResolver::pattern(&self.config.discovery.config_glob)?;
        if ConfigResolver::matches(&self.root, path, &pattern) {
            return Ok(true);
        }
        if path.file_name().and_then(|n| n.to_str()) == Some(MANIFEST_FILE) {
            let folder = path.parent();
            return Ok(self.repository.iter().any(|c| Some(c.folder()) == folder));
        }
        Ok(false)
    }

    fn subtree_ids(&self, id: &str) -> Vec<String> {
        self.tree
            .get(id)
            .map(|node| node.subtree_ids())
            .unwrap_or_default()
    }

    async fn execute(&self, config: &Configuration) -> Result<ExecutionReport, EngineError> {
        let report = self.driver.execute(config).await?;
        Ok(match report {
            ExecutionReport::Mocha(files) => {
                let mut correlated = Vec::with_capacity(files.len());
                for file in files {
                    correlated.push(correlate_file(file).await);
                }
                ExecutionReport::Mocha(correlated)
            }
            ExecutionReport::Cucumber(mut files) => {
                // Feature uris are relative to the folder wdio ran in.
                for feature in files.iter_mut().flat_map(|f| f.features.iter_mut()) {
                    let uri = spec_path(&feature.uri);
                    if !feature.uri.is_empty() && uri.is_relative() {
                        feature.uri = config.folder().join(uri).display().to_string();
                    }
                }
                ExecutionReport::Cucumber(files)
            }
        })
    }
}
