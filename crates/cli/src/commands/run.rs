//! `steward run`: pursue one goal in a workspace.

use anyhow::{Context, bail};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use steward_agent::{JsonlSink, Orchestrator, OrchestratorConfig};
use steward_config::{AppConfig, ToolsConfig};
use steward_core::event::EventBus;
use steward_core::session::{Session, SessionStatus};
use steward_core::sink::{IterationSink, NoopSink};
use steward_providers::OpenAiCompatProvider;
use steward_tools::{ExecutorSettings, LocalWorkspace, ToolExecutor};

use crate::approval::ConsoleApproval;
use crate::progress;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// What the agent should accomplish
    #[arg(short, long)]
    pub goal: String,

    /// Workspace root (defaults to the configured root, then the current directory)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Override agent.max_iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Override agent.timeout_secs
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Apply file changes and run commands without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Append every iteration to this JSON lines file
    #[arg(long)]
    pub log: Option<PathBuf>,
}

fn executor_settings(tools: &ToolsConfig, interactive: bool) -> ExecutorSettings {
    ExecutorSettings {
        bash_default_timeout_secs: tools.bash_default_timeout_secs,
        bash_max_timeout_secs: tools.bash_max_timeout_secs,
        grep_max_results: tools.grep_max_results,
        max_output_chars: tools.max_output_chars,
        approve_writes: tools.approve_writes || interactive,
        approve_all_commands: tools.approve_all_commands,
        ignored_dirs: tools.ignored_dirs.clone(),
    }
}

fn apply_overrides(config: &mut AppConfig, args: &RunArgs) -> anyhow::Result<()> {
    if let Some(max) = args.max_iterations {
        config.agent.max_iterations = max;
    }
    if let Some(secs) = args.timeout {
        config.agent.timeout_secs = secs;
    }
    config.validate()?;
    Ok(())
}

fn workspace_root(config: &AppConfig, args: &RunArgs) -> anyhow::Result<PathBuf> {
    match args.workspace.clone().or_else(|| config.workspace.root.clone()) {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("Cannot determine the current directory"),
    }
}

pub async fn run(config_path: Option<&Path>, args: RunArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, &args)?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    STEWARD_API_KEY=...");
        eprintln!("    OPENAI_API_KEY=...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        bail!("No API key found. See above for setup instructions.");
    }

    let root = workspace_root(&config, &args)?;
    let workspace = LocalWorkspace::new(&root)
        .with_context(|| format!("Cannot open workspace {}", root.display()))?;
    info!(root = %workspace.root().display(), "Workspace ready");

    let interactive = !args.yes;
    let mut executor = ToolExecutor::new(
        Arc::new(workspace),
        executor_settings(&config.tools, interactive),
    );
    if interactive {
        executor = executor.with_approval_gate(Arc::new(ConsoleApproval));
    }

    let provider = OpenAiCompatProvider::from_config(&config.provider)?;
    info!(provider = "openai_compat", model = %provider.model(), "Provider ready");

    let sink: Arc<dyn IterationSink> = match &args.log {
        Some(path) => Arc::new(JsonlSink::open(path).await?),
        None => Arc::new(NoopSink),
    };

    let event_bus = Arc::new(EventBus::new(256));
    let printer = tokio::spawn(progress::print_events(event_bus.subscribe()));

    let orchestrator = Orchestrator::new(
        Arc::new(provider),
        Arc::new(executor),
        OrchestratorConfig::from_app_config(&config),
    )
    .with_sink(sink)
    .with_event_bus(event_bus);

    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping the session");
            cancel.cancel();
        }
    });

    let mut session = Session::new("cli", args.goal.clone());
    let result = orchestrator.run(&mut session).await?;
    drop(orchestrator);
    // The bus closes once the orchestrator is gone, which ends the printer
    let _ = printer.await;

    println!();
    println!("  Status:      {}", result.status);
    println!("  Iterations:  {}", result.iterations);
    if let Some(summary) = &result.completion_summary {
        println!("  Summary:");
        for line in summary.lines() {
            println!("    {line}");
        }
    }
    if let Some(error) = &result.error_message {
        println!("  Error:       {error}");
    }
    if !result.file_changes.is_empty() {
        println!("  Files changed:");
        for change in &result.file_changes {
            println!("    {:?}  {}", change.kind, change.path);
        }
    }
    println!();

    if result.status != SessionStatus::Completed {
        bail!("Session {} ended with status {}", result.session_id, result.status);
    }
    Ok(())
}
