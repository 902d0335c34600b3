//! Berth CLI - deploy container services onto a managed cluster
//!
//! Commands:
//! - `deploy` an application to an environment with an image tag
//! - `create-cluster` directly on the scheduler
//! - `outputs` of a stack that must exist exactly once
//! - `apps` configured in the catalog

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use berth_deployment::DeployRequest;
use config::BerthConfig;
use error::CliResult;

/// Berth CLI application
#[derive(Parser)]
#[command(name = "berth")]
#[command(about = "Berth - container service deployment", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BERTH_CONFIG")]
    config: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Deploy an application to an environment
    Deploy {
        /// Environment, e.g. dev or prod
        environment: String,

        /// Application name in the catalog
        application: String,

        /// Image tag to deploy
        #[arg(default_value = "latest")]
        image_tag: String,
    },

    /// Create a cluster on the scheduler
    CreateCluster {
        name: String,
    },

    /// Show the outputs of a stack
    Outputs {
        stack: String,
    },

    /// List configured applications and environments
    Apps,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    if let Err(err) = run(cli).await {
        output::print_error(&err.to_string());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());

    // stdout carries command output
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = BerthConfig::load(cli.config.as_deref())?;
    let format = cli.output;

    match cli.command {
        Commands::Deploy {
            environment,
            application,
            image_tag,
        } => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling deployment");
                    on_signal.cancel();
                }
            });

            let providers = config.providers().await;
            commands::deploy::execute(
                &config,
                providers,
                DeployRequest::new(environment, application, image_tag),
                &cancel,
                format,
            )
            .await
        }
        Commands::CreateCluster { name } => {
            let providers = config.providers().await;
            commands::cluster::execute(providers.scheduling.as_ref(), &name, format).await
        }
        Commands::Outputs { stack } => {
            let providers = config.providers().await;
            commands::outputs::execute(providers.stacks, &stack, format).await
        }
        Commands::Apps => commands::apps::execute(&config.catalog, format),
    }
}
