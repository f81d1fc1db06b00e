use serde::Deserialize;

/// Top-level configuration for the Stateforge server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct StateforgeConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// AWS client configuration.
    #[serde(default)]
    pub aws: AwsConfig,
    /// Provisioning workflow tuning.
    #[serde(default)]
    pub provision: ProvisionConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to. Defaults to `0.0.0.0`.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to. Defaults to `8080`.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

/// AWS client configuration.
///
/// Region and credentials arrive per request, so the only server-side knob
/// is an endpoint override for LocalStack or other S3/`DynamoDB` emulators.
#[derive(Debug, Default, Deserialize)]
pub struct AwsConfig {
    /// Custom endpoint URL applied to every AWS client the server builds.
    pub endpoint_url: Option<String>,
}

/// Tuning for the `DynamoDB` table activation wait.
#[derive(Debug, Deserialize)]
pub struct ProvisionConfig {
    /// Seconds to sleep between table status polls. Defaults to `5`.
    #[serde(default = "default_wait_delay")]
    pub wait_delay_seconds: u64,
    /// Maximum number of status polls before timing out. Defaults to `20`.
    #[serde(default = "default_wait_attempts")]
    pub wait_max_attempts: u32,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            wait_delay_seconds: default_wait_delay(),
            wait_max_attempts: default_wait_attempts(),
        }
    }
}

fn default_wait_delay() -> u64 {
    5
}

fn default_wait_attempts() -> u32 {
    20
}
