use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use stateforge_aws::AwsConnector;
use stateforge_core::{Configuration, Provisioner, TableWaitConfig};

use crate::OutputFormat;

use super::{ResourceArgs, render_failure, render_result};

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub resource: ResourceArgs,

    /// Seconds between table activation polls.
    #[arg(long, default_value_t = 5)]
    pub wait_delay: u64,

    /// Maximum activation polls before giving up.
    #[arg(long, default_value_t = 20)]
    pub wait_attempts: u32,
}

pub async fn run(
    connector: AwsConnector,
    args: &CreateArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let config = Configuration::validate(args.resource.to_request())?;

    let provisioner = Provisioner::new(Arc::new(connector)).with_wait(TableWaitConfig {
        delay: Duration::from_secs(args.wait_delay),
        max_attempts: args.wait_attempts,
    });

    match provisioner.create(&config).await {
        Ok(result) => render_result(&result, format),
        Err(failure) => render_failure(&failure, format),
    }
}
