//! Stateforge CLI
//!
//! A command-line interface for provisioning Terraform remote state
//! backends: an S3 bucket for state storage and an optional DynamoDB
//! table for state locking.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// Stateforge CLI entry point.
#[derive(Parser, Debug)]
#[command(name = "stateforge", version, about)]
struct Cli {
    /// Custom AWS endpoint URL (e.g. a LocalStack endpoint).
    #[arg(long, env = "STATEFORGE_ENDPOINT_URL", global = true)]
    endpoint_url: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the backend resources (bucket and optional lock table).
    Create(commands::create::CreateArgs),
    /// Delete the backend resources (lock table first, then the bucket).
    Delete(commands::delete::DeleteArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let connector = match cli.endpoint_url {
        Some(ref url) => stateforge_aws::AwsConnector::new().with_endpoint_url(url),
        None => stateforge_aws::AwsConnector::new(),
    };

    match cli.command {
        Command::Create(args) => commands::create::run(connector, &args, &cli.format).await,
        Command::Delete(args) => commands::delete::run(connector, &args, &cli.format).await,
    }
}
