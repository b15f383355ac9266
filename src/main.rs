//! pm-agent - LLM-backed backlog grooming, feedback clustering and roadmap planning.
//!
//! Runs the HTTP API by default; the one-shot subcommands run a single
//! adapter against a JSON file and print the result.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use serde::de::DeserializeOwned;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pm_agent::ai::{self, ModelProvider};
use pm_agent::core::{Config, Credentials, API_KEY_ENV};
use pm_agent::server::{self, AppState};
use pm_agent::{Agents, BacklogItem, FeedbackCluster, FeedbackItem, GeminiProvider, RoadmapPlan};

/// Smart PM agent - backlog grooming, feedback clustering and roadmap planning
#[derive(Parser)]
#[command(name = "pm-agent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default lookup
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Groom one backlog item read from a JSON file
    Groom {
        /// File containing a backlog item
        file: PathBuf,
    },

    /// Cluster feedback items read from a JSON file
    Cluster {
        /// File containing a list of feedback items
        file: PathBuf,
    },

    /// Plan a roadmap for backlog items read from a JSON file
    Roadmap {
        /// File containing a list of backlog items
        file: PathBuf,
    },

    /// Print the JSON schema a task asks the model to follow
    Schema {
        /// Task whose output schema to print
        #[arg(value_enum)]
        task: Task,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Task {
    Groom,
    Cluster,
    Roadmap,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for command output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        None => cmd_serve(cli.config.as_deref(), None, None),
        Some(Commands::Serve { host, port }) => cmd_serve(cli.config.as_deref(), host, port),
        Some(Commands::Groom { file }) => cmd_groom(cli.config.as_deref(), &file),
        Some(Commands::Cluster { file }) => cmd_cluster(cli.config.as_deref(), &file),
        Some(Commands::Roadmap { file }) => cmd_roadmap(cli.config.as_deref(), &file),
        Some(Commands::Schema { task }) => {
            cmd_schema(task);
            Ok(())
        }
        Some(Commands::Config { path }) => cmd_config(cli.config.as_deref(), path),
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

fn build_agents(config: &Config, credentials: &Credentials) -> Result<Agents> {
    let provider: Arc<dyn ModelProvider> =
        Arc::new(GeminiProvider::new(credentials, &config.provider)?);
    Ok(Agents::from_config(provider, &config.agents))
}

fn require_credentials() -> Result<Credentials> {
    Credentials::from_env().with_context(|| format!("{API_KEY_ENV} not set"))
}

/// Run the HTTP API.
fn cmd_serve(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let credentials = Credentials::from_env().unwrap_or_else(|| {
        tracing::warn!("{API_KEY_ENV} not set; model calls will fail until it is configured");
        Credentials::new("")
    });
    let agents = build_agents(&config, &credentials)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::serve(&config.server, AppState::new(agents)))
}

fn read_json<T: DeserializeOwned>(file: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid input in {}", file.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Groom one item offline.
fn cmd_groom(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let item: BacklogItem = read_json(file)?;
    let agents = build_agents(&load_config(config_path)?, &require_credentials()?)?;

    let rt = tokio::runtime::Runtime::new()?;
    let groomed = rt.block_on(agents.groomer.groom(&item))?;
    print_json(&groomed)
}

/// Cluster feedback offline.
fn cmd_cluster(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let items: Vec<FeedbackItem> = read_json(file)?;
    let agents = build_agents(&load_config(config_path)?, &require_credentials()?)?;

    let rt = tokio::runtime::Runtime::new()?;
    let clusters = rt.block_on(agents.analyst.cluster(&items))?;
    print_json(&clusters)
}

/// Plan a roadmap offline.
fn cmd_roadmap(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let items: Vec<BacklogItem> = read_json(file)?;
    let agents = build_agents(&load_config(config_path)?, &require_credentials()?)?;

    let rt = tokio::runtime::Runtime::new()?;
    let plan = rt.block_on(agents.strategist.plan(&items))?;
    print_json(&plan)
}

/// Print the output schema for a task.
fn cmd_schema(task: Task) {
    let schema = match task {
        Task::Groom => ai::schema_json::<BacklogItem>(),
        Task::Cluster => ai::schema_json::<Vec<FeedbackCluster>>(),
        Task::Roadmap => ai::schema_json::<RoadmapPlan>(),
    };
    println!("{schema}");
}

/// Show configuration.
fn cmd_config(config_path: Option<&Path>, show_path: bool) -> Result<()> {
    if show_path {
        match config_path.map(Path::to_path_buf).or_else(Config::find) {
            Some(path) => println!("{}", path.display()),
            None => {
                if let Some(dir) = Config::config_dir() {
                    println!("{} (not found, using defaults)", dir.join("config.toml").display());
                }
            }
        }
        return Ok(());
    }

    let config = load_config(config_path)?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "pm-agent", &mut io::stdout());
}
