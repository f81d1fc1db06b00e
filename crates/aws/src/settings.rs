use stateforge_core::config::Credentials;

/// Connection settings for one pair of AWS clients.
///
/// Region and credentials come from the per-request configuration; the
/// endpoint URL override is fixed deployment-side (e.g. `LocalStack`).
#[derive(Clone)]
pub struct AwsSettings {
    /// AWS region (e.g. `"us-east-1"`).
    pub region: String,

    /// Optional endpoint URL override for local development.
    pub endpoint_url: Option<String>,

    /// Optional explicit access key pair; the ambient SDK credential
    /// chain is used when absent.
    pub credentials: Option<Credentials>,
}

impl std::fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSettings")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field(
                "credentials",
                &self.credentials.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl AwsSettings {
    /// Create settings for the given region with ambient credentials.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint_url: None,
            credentials: None,
        }
    }

    /// Set an endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Use an explicit access key pair instead of the ambient chain.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}
