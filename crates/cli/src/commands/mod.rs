pub mod create;
pub mod delete;

use clap::Args;

use stateforge_core::{LockingMechanism, ProvisionFailure, ProvisionRequest, ProvisioningResult};

use crate::OutputFormat;

/// Resource identifiers shared by `create` and `delete`.
///
/// Credentials are never taken as flags; the AWS clients resolve them
/// from the ambient credential chain (environment, profile, instance role).
#[derive(Args, Debug)]
pub struct ResourceArgs {
    /// AWS region for the resources.
    #[arg(long)]
    pub region: String,

    /// Name of the S3 state bucket.
    #[arg(long)]
    pub bucket_name: String,

    /// State locking mechanism.
    #[arg(long, default_value = "dynamodb")]
    pub locking_mechanism: LockingArg,

    /// Name of the DynamoDB lock table. Required with
    /// `--locking-mechanism dynamodb`.
    #[arg(long)]
    pub table_name: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LockingArg {
    S3,
    Dynamodb,
}

impl From<LockingArg> for LockingMechanism {
    fn from(arg: LockingArg) -> Self {
        match arg {
            LockingArg::S3 => Self::S3,
            LockingArg::Dynamodb => Self::DynamoDb,
        }
    }
}

impl ResourceArgs {
    pub fn to_request(&self) -> ProvisionRequest {
        ProvisionRequest {
            region: self.region.clone(),
            bucket_name: self.bucket_name.clone(),
            locking_mechanism: self.locking_mechanism.into(),
            table_name: self.table_name.clone(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
        }
    }
}

pub fn render_result(result: &ProvisioningResult, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Text => {
            println!("{} finished", result.action);
            println!("  bucket: {}", result.bucket_status);
            if let Some(table) = result.table_status {
                println!("  table: {table}");
            }
        }
    }
    Ok(())
}

pub fn render_failure(failure: &ProvisionFailure, format: &OutputFormat) -> ! {
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "error": failure.error.to_string(),
                "kind": failure.error.kind(),
                "bucket_status": failure.partial.bucket_status,
                "table_status": failure.partial.table_status,
            });
            eprintln!("{body}");
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", failure.error);
            eprintln!("  bucket: {}", failure.partial.bucket_status);
            if let Some(table) = failure.partial.table_status {
                eprintln!("  table: {table}");
            }
        }
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(locking: LockingArg, table: Option<&str>) -> ResourceArgs {
        ResourceArgs {
            region: "eu-west-1".into(),
            bucket_name: "tf-state".into(),
            locking_mechanism: locking,
            table_name: table.map(str::to_owned),
        }
    }

    #[test]
    fn request_maps_flags_without_credentials() {
        let request = args(LockingArg::Dynamodb, Some("tf-locks")).to_request();
        assert_eq!(request.region, "eu-west-1");
        assert_eq!(request.bucket_name, "tf-state");
        assert_eq!(request.locking_mechanism, LockingMechanism::DynamoDb);
        assert_eq!(request.table_name.as_deref(), Some("tf-locks"));
        assert!(request.aws_access_key_id.is_none());
        assert!(request.aws_secret_access_key.is_none());
    }

    #[test]
    fn s3_locking_maps_through() {
        let request = args(LockingArg::S3, None).to_request();
        assert_eq!(request.locking_mechanism, LockingMechanism::S3);
    }
}
