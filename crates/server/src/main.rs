use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use stateforge_aws::AwsConnector;
use stateforge_core::TableWaitConfig;
use stateforge_server::api::{self, AppState};
use stateforge_server::config::StateforgeConfig;
use stateforge_server::error::ServerError;
use stateforge_server::telemetry;

/// Stateforge HTTP server.
#[derive(Parser, Debug)]
#[command(
    name = "stateforge-server",
    about = "HTTP API for provisioning Terraform remote state backends"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "stateforge.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the AWS endpoint URL (e.g. a LocalStack endpoint).
    #[arg(long)]
    endpoint_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    telemetry::init();

    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config: StateforgeConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents).map_err(|e| ServerError::Config(e.to_string()))?
    } else {
        info!(
            path = %cli.config,
            "config file not found, using defaults"
        );
        StateforgeConfig::default()
    };

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let endpoint_url = cli.endpoint_url.or(config.aws.endpoint_url);

    let connector = match endpoint_url {
        Some(url) => {
            info!(endpoint = %url, "using custom AWS endpoint");
            AwsConnector::new().with_endpoint_url(url)
        }
        None => AwsConnector::new(),
    };

    let state = AppState {
        connector: Arc::new(connector),
        wait: TableWaitConfig {
            delay: Duration::from_secs(config.provision.wait_delay_seconds),
            max_attempts: config.provision.wait_max_attempts,
        },
    };

    let app = api::router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "stateforge server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
