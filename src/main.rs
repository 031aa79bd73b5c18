use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkflow::config::Config;
use linkflow::engine::Engine;
use linkflow::nodes::ExecutorRegistry;
use linkflow::storage::{ExecutionRecord, ExecutionStatus, LogPhase};
use linkflow::workflow::{parse_graph_file, validate_graph};

#[derive(Parser)]
#[command(name = "linkflow")]
#[command(about = "Run and validate link-in-bio workflow graphs", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/linkflow/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow graph file
    Run {
        /// Path to a JSON or YAML graph file
        file: String,
        /// Workflow ID recorded on the execution (default: file stem)
        #[arg(long)]
        workflow_id: Option<String>,
        /// JSON initial payload
        #[arg(short, long)]
        input: Option<String>,
        /// Print the full execution record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a workflow graph file without running it
    Validate {
        /// Path to a JSON or YAML graph file
        file: String,
    },
    /// List registered node types
    Nodes,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match &cli.config {
        Some(path) => (Config::load_from_path(path)?, None),
        None => match Config::try_load() {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
    };

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "linkflow=info".into()),
    );
    let (json_layer, text_layer) = if config.logging.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    if let Some(e) = config_error {
        tracing::warn!("Ignoring configuration, using defaults: {}", e);
    }

    match cli.command {
        Commands::Run {
            file,
            workflow_id,
            input,
            json,
        } => cmd_run(&config, &file, workflow_id, input.as_deref(), json).await?,
        Commands::Validate { file } => cmd_validate(&config, &file)?,
        Commands::Nodes => cmd_nodes(&config),
        Commands::Completions { shell } => cmd_completions(shell)?,
    }

    Ok(())
}

/// Shell completion variants
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum CompletionShell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions
fn cmd_completions(shell: CompletionShell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}

// ============================================================================
// Workflow Commands
// ============================================================================

async fn cmd_run(
    config: &Config,
    file: &str,
    workflow_id: Option<String>,
    input: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        anyhow::bail!("File not found: {}", file);
    }
    let graph = parse_graph_file(path)?;

    let payload: serde_json::Value = match input {
        Some(input_str) => serde_json::from_str(input_str)
            .map_err(|e| anyhow::anyhow!("Invalid --input JSON: {}", e))?,
        None => serde_json::json!({}),
    };
    let workflow_id = workflow_id.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workflow".to_string())
    });

    let engine = Engine::from_config(config);
    let record = engine.execute(&workflow_id, &graph, payload).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record)?;
    }

    if record.status == ExecutionStatus::Failed {
        anyhow::bail!(
            "Execution {} failed: {}",
            record.id,
            record.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_record(record: &ExecutionRecord) -> anyhow::Result<()> {
    println!("Execution ID: {}", record.id);
    println!("Workflow: {}", record.workflow_id);
    println!("Status: {}", record.status);
    if let Some(ms) = record.duration_ms() {
        println!("Duration: {}ms", ms);
    }
    println!();

    for entry in &record.log {
        let marker = match entry.phase {
            LogPhase::Started => "→",
            LogPhase::Completed => "✓",
            LogPhase::Failed => "✗",
        };
        let node = entry.node_id.as_deref().unwrap_or("-");
        println!(
            "  {} {} [{}] {}",
            marker,
            entry.timestamp.format("%H:%M:%S%.3f"),
            node,
            entry.message
        );
        if let Some(error) = &entry.error {
            println!("      error: {}", error);
        }
    }

    if let Some(error) = &record.error {
        println!();
        println!("Error: {}", error);
    }
    if let Some(payload) = &record.final_payload {
        println!();
        println!("Final payload:");
        println!("{}", serde_json::to_string_pretty(payload)?);
    }
    Ok(())
}

fn cmd_validate(config: &Config, file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        anyhow::bail!("File not found: {}", file);
    }

    let graph = parse_graph_file(path)?;
    let report = validate_graph(&graph)?;
    let registry = ExecutorRegistry::with_builtins(&config.http);

    println!("✓ Workflow graph '{}' is valid", file);
    println!();
    println!("  Nodes: {}", graph.nodes.len());
    println!("  Edges: {}", graph.edges.len());
    println!("  Trigger: {}", report.trigger_id);

    let unknown: Vec<&str> = graph
        .node_types()
        .into_iter()
        .filter(|t| !registry.has(t))
        .collect();
    if !unknown.is_empty() {
        println!(
            "  Unknown node types (will be skipped): {}",
            unknown.join(", ")
        );
    }
    for warning in &report.warnings {
        println!("  ⚠ {}", warning);
    }

    Ok(())
}

fn cmd_nodes(config: &Config) {
    let registry = ExecutorRegistry::with_builtins(&config.http);
    println!("Registered node types:");
    for (name, description) in registry.descriptions() {
        println!("  {:<20} {}", name, description);
    }
}
