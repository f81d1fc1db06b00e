use secrecy::ExposeSecret;
use tracing::debug;

use crate::settings::AwsSettings;

/// Build an AWS SDK configuration from the given [`AwsSettings`].
///
/// Uses the standard SDK credential chain (environment, profile, instance
/// role) unless the settings carry an explicit access key pair, and
/// optionally overrides the endpoint URL for local development (e.g.
/// `LocalStack`).
pub async fn build_sdk_config(settings: &AwsSettings) -> aws_config::SdkConfig {
    let mut loader =
        aws_config::from_env().region(aws_config::Region::new(settings.region.clone()));

    if let Some(endpoint) = &settings.endpoint_url {
        debug!(endpoint = %endpoint, "using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    if let Some(credentials) = &settings.credentials {
        debug!("using explicit access key pair from the request");
        loader = loader.credentials_provider(aws_credential_types::Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.expose_secret().clone(),
            None,
            None,
            "stateforge",
        ));
    }

    loader.load().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::provider::ProvideCredentials;
    use secrecy::SecretString;
    use stateforge_core::config::Credentials;

    #[tokio::test]
    async fn explicit_key_pair_becomes_the_credentials_provider() {
        let settings = AwsSettings::new("eu-west-1").with_credentials(Credentials {
            access_key_id: "AKIAEXAMPLE".to_owned(),
            secret_access_key: SecretString::new("example-secret".to_owned()),
        });

        let config = build_sdk_config(&settings).await;

        let resolved = config
            .credentials_provider()
            .expect("provider is set")
            .provide_credentials()
            .await
            .expect("static credentials resolve without I/O");
        assert_eq!(resolved.access_key_id(), "AKIAEXAMPLE");
        assert_eq!(resolved.secret_access_key(), "example-secret");
    }

    #[tokio::test]
    async fn endpoint_and_region_are_applied() {
        let settings = AwsSettings::new("us-east-1").with_endpoint_url("http://localhost:4566");

        let config = build_sdk_config(&settings).await;

        assert_eq!(config.region().map(ToString::to_string).as_deref(), Some("us-east-1"));
        assert_eq!(config.endpoint_url(), Some("http://localhost:4566"));
    }
}
