//! flowctl - operator CLI for workflow-engine flow instances
//!
//! Provides a terminal interface to:
//! - query instances and definitions
//! - cancel, delete and deploy
//! - wait for an instance to converge on a state
//! - reconstruct the parent/child lineage of an instance

use clap::{Parser, Subcommand};
use flowctl_client::{ApiVersion, Config};
use flowctl_engine::FlowClient;
use flowctl_types::DefinitionFilter;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::{cancel, delete, deploy, get, wait, walk};
use error::CliResult;
use output::{print_error, print_success, OutputFormat};

/// flowctl CLI application
#[derive(Parser)]
#[command(name = "flowctl")]
#[command(about = "flowctl - workflow-engine instance lifecycle CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FLOWCTL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Gateway service base URL
    #[arg(long, env = "FLOWCTL_GATEWAY_URL", global = true)]
    gateway_url: Option<String>,

    /// Operations service base URL (v1 only)
    #[arg(long, env = "FLOWCTL_OPS_URL", global = true)]
    ops_url: Option<String>,

    /// Remote API generation (v1, v2)
    #[arg(long, env = "FLOWCTL_API_VERSION", value_parser = parse_api_version, global = true)]
    api_version: Option<ApiVersion>,

    /// Tenant to scope operations to
    #[arg(long, env = "FLOWCTL_TENANT", global = true)]
    tenant: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Query instances and definitions
    Get {
        #[command(subcommand)]
        command: get::GetCommands,
    },

    /// Cancel a running instance
    Cancel {
        #[command(subcommand)]
        command: cancel::CancelCommands,
    },

    /// Delete an instance
    Delete {
        #[command(subcommand)]
        command: delete::DeleteCommands,
    },

    /// Deploy flow definition resources
    Deploy(deploy::DeployArgs),

    /// Wait for an instance to reach a state
    Wait {
        #[command(subcommand)]
        command: wait::WaitCommands,
    },

    /// Traverse the parent/child lineage of an instance
    Walk {
        #[command(subcommand)]
        command: walk::WalkCommands,
    },

    /// Show the effective configuration (secrets redacted)
    Config,

    /// Check engine connectivity
    Status,
}

fn parse_api_version(raw: &str) -> Result<ApiVersion, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    if let Err(err) = run(cli).await {
        print_error(&err.to_string());
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let mut config = config::load(cli.config.as_deref())?;

    // flags and environment win over the config file
    if let Some(url) = &cli.gateway_url {
        config.api.gateway_url = url.clone();
    }
    if let Some(url) = &cli.ops_url {
        config.api.ops_url = url.clone();
    }
    if let Some(version) = cli.api_version {
        config.api.version = Some(version);
    }
    if let Some(tenant) = &cli.tenant {
        config.app.tenant = tenant.clone();
    }

    match cli.command {
        Commands::Config => {
            output::print_single(&config.redacted(), cli.output);
            Ok(())
        }
        command => {
            let client = flowctl_client::for_version(&config)?;
            execute(command, client.as_ref(), &config, cli.output).await
        }
    }
}

async fn execute(
    command: Commands,
    client: &dyn FlowClient,
    config: &Config,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        Commands::Get { command } => get::execute(command, client, format).await,
        Commands::Cancel { command } => cancel::execute(command, client).await,
        Commands::Delete { command } => {
            delete::execute(command, client, &config.app.backoff).await
        }
        Commands::Deploy(args) => deploy::execute(args, client, &config.app.tenant, format).await,
        Commands::Wait { command } => wait::execute(command, client, &config.app.backoff).await,
        Commands::Walk { command } => walk::execute(command, client, format).await,
        Commands::Status => {
            let version = config
                .api
                .version
                .map(|v| v.to_string())
                .unwrap_or_default();
            match client.search_definitions(&DefinitionFilter::default(), 1).await {
                Ok(_) => {
                    print_success(&format!(
                        "engine is reachable at {} (api {version})",
                        config.api.gateway_url
                    ));
                    Ok(())
                }
                Err(err) => {
                    print_error(&format!("cannot reach engine: {err}"));
                    std::process::exit(1);
                }
            }
        }
        // handled in run() before a client is built
        Commands::Config => Ok(()),
    }
}
