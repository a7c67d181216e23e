pub mod config;
pub mod correlate;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod extract;
pub mod report;
pub mod runner;
pub mod tree;
pub mod util;

pub use config::{Config, ConfigError};
pub use correlate::{correlate, correlate_file};
pub use discovery::{ConfigResolver, Configuration, Discovery, DiscoveryWarning, Framework};
pub use engine::{
    CancellationFlag, ConfigurationFailure, ConfigurationRepository, DiscoveryReport, Engine,
    RunRequest, RunSummary,
};
pub use error::EngineError;
pub use extract::{Grammar, SourceSuite, SourceTest, TestExtractor};
pub use report::{ExecutionReport, LeafOutcome, ReportItem};
pub use runner::{ExecutionDriver, Invocation, ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use tree::{
    RecordingHost, RunLedger, RunReporter, RunState, SourceRange, TestTree, TreeHost, TreeNode,
};
