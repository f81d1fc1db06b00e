use std::sync::Arc;

use clap::Args;

use stateforge_aws::AwsConnector;
use stateforge_core::{Configuration, Provisioner};

use crate::OutputFormat;

use super::{ResourceArgs, render_failure, render_result};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub resource: ResourceArgs,
}

pub async fn run(
    connector: AwsConnector,
    args: &DeleteArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let config = Configuration::validate(args.resource.to_request())?;

    let provisioner = Provisioner::new(Arc::new(connector));

    match provisioner.delete(&config).await {
        Ok(result) => render_result(&result, format),
        Err(failure) => render_failure(&failure, format),
    }
}
