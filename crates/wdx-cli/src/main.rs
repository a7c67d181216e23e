mod console;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, WrapErr};
use tracing_subscriber::EnvFilter;
use wdx_core::config::DEFAULT_SETTINGS_FILE;
use wdx_core::{CancellationFlag, Config, Engine, RunRequest, TestExtractor, TokioProcessRunner};

use console::ConsoleHost;

#[derive(Parser)]
#[command(name = "wdx")]
#[command(about = "Discover, run and report WebdriverIO test suites", long_about = None)]
struct Cli {
    /// Print every tree change and test outcome
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the wdio configurations found under a folder
    Discover {
        /// Workspace root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Run configurations and print the resulting test tree
    Run {
        /// Workspace root
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Only run these configuration ids (repeatable)
        #[arg(long = "config", value_name = "ID")]
        configs: Vec<String>,
        /// Let the browser open a window
        #[arg(long)]
        no_headless: bool,
    },
    /// Print the suites and tests declared in a spec file
    Extract {
        /// Spec source file
        file: PathBuf,
    },
    /// Write a default wdx.toml into the current folder
    Init,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wdx=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Discover { root } => discover(&root, cli.verbose).await,
        Commands::Run {
            root,
            configs,
            no_headless,
        } => run(&root, configs, no_headless, cli.verbose).await,
        Commands::Extract { file } => extract(&file),
        Commands::Init => init(),
    }
}

fn engine(root: &Path) -> color_eyre::Result<Engine> {
    let root = root
        .canonicalize()
        .wrap_err_with(|| format!("Workspace root {} not found", root.display()))?;
    let config = Config::load(&root)?;
    Ok(Engine::new(root, config, Arc::new(TokioProcessRunner)))
}

async fn discover(root: &Path, verbose: bool) -> color_eyre::Result<()> {
    let mut engine = engine(root)?;
    let mut host = ConsoleHost::new(verbose);
    let report = engine.discover(&mut host).await?;

    for config in engine.repository().iter() {
        println!("{}  [{}]  {}", config.display_name, config.framework, config.source.display());
    }
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for (path, err) in &report.errors {
        println!("error: {}: {}", path.display(), err);
    }
    if engine.repository().is_empty() {
        println!("No wdio configurations found under {}", engine.root().display());
    }
    Ok(())
}

async fn run(
    root: &Path,
    configs: Vec<String>,
    no_headless: bool,
    verbose: bool,
) -> color_eyre::Result<()> {
    let mut engine = engine(root)?;
    if no_headless {
        let mut config = engine.config().clone();
        config.runner.headless = false;
        engine = Engine::new(engine.root().to_path_buf(), config, Arc::new(TokioProcessRunner));
    }

    let mut host = ConsoleHost::new(verbose);
    let report = engine.discover(&mut host).await?;
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }

    let request = if configs.is_empty() {
        RunRequest::all()
    } else {
        // Configuration ids are canonical folder paths.
        RunRequest::only(configs.into_iter().map(|id| {
            Path::new(&id)
                .canonicalize()
                .map(|p| p.display().to_string())
                .unwrap_or(id)
        }))
    };

    let cancel = CancellationFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling after the current configuration...");
            on_signal.cancel();
        }
    });

    let summary = engine.run(&request, &mut host, &cancel).await;
    println!();
    host.print_tree(engine.tree());

    if let Some(message) = summary.user_message() {
        bail!(message);
    }
    if summary.counts.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn extract(file: &Path) -> color_eyre::Result<()> {
    let source = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let suites = TestExtractor::for_path(file).extract(&source)?;

    for suite in suites {
        println!("{}:{}  {}", file.display(), suite.start_line, suite.name);
        for test in suite.tests {
            println!("{}:{}    {}", file.display(), test.start_line, test.name);
        }
    }
    Ok(())
}

fn init() -> color_eyre::Result<()> {
    let path = Path::new(DEFAULT_SETTINGS_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    std::fs::write(path, Config::default_config_string())
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}
