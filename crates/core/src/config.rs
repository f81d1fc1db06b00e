use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// State locking mechanism for the Terraform backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum LockingMechanism {
    /// S3 bucket only; locking relies on native S3 locking via versioning.
    S3,
    /// S3 bucket plus a DynamoDB lock table (recommended for teams).
    #[default]
    DynamoDb,
}

impl LockingMechanism {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::DynamoDb => "dynamodb",
        }
    }
}

impl std::fmt::Display for LockingMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An explicit AWS access key pair, supplied per request.
///
/// When absent, the ambient SDK credential chain (environment, profile,
/// instance role) is used instead. The secret is never logged; the `Debug`
/// implementation redacts both halves.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// Raw input for one provisioning action, as received from the CLI or the
/// HTTP API body.
///
/// This is the unvalidated shape; [`Configuration::validate`] turns it into
/// a [`Configuration`] or rejects it before any remote call is made.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProvisionRequest {
    /// AWS region for the resources (e.g. `"eu-west-1"`).
    pub region: String,

    /// Name for the S3 bucket (must be globally unique).
    pub bucket_name: String,

    /// Locking mechanism; defaults to `dynamodb`.
    #[serde(default)]
    pub locking_mechanism: LockingMechanism,

    /// Name for the DynamoDB lock table. Required when
    /// `locking_mechanism` is `dynamodb`, ignored otherwise.
    pub table_name: Option<String>,

    /// Optional explicit AWS access key id. Falls back to the ambient
    /// credential chain when absent.
    pub aws_access_key_id: Option<String>,

    /// Optional explicit AWS secret access key. Must be paired with
    /// `aws_access_key_id`.
    pub aws_secret_access_key: Option<String>,
}

impl std::fmt::Debug for ProvisionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionRequest")
            .field("region", &self.region)
            .field("bucket_name", &self.bucket_name)
            .field("locking_mechanism", &self.locking_mechanism)
            .field("table_name", &self.table_name)
            .field(
                "aws_access_key_id",
                &self.aws_access_key_id.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "aws_secret_access_key",
                &self.aws_secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// A validation failure detected before any remote call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The region field was empty or blank.
    #[error("region must not be empty")]
    EmptyRegion,

    /// The bucket name violates S3 naming rules.
    #[error("invalid bucket name '{name}': {reason}")]
    InvalidBucketName { name: String, reason: String },

    /// The `dynamodb` locking mechanism was chosen without a table name.
    #[error("table_name is required when locking_mechanism is 'dynamodb'")]
    MissingTableName,

    /// The table name violates DynamoDB naming rules.
    #[error("invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: String },

    /// Only one half of an explicit access key pair was supplied.
    #[error("aws_access_key_id and aws_secret_access_key must be supplied together")]
    PartialCredentials,
}

/// A validated, immutable request for one provisioning action.
///
/// The only way to obtain a `Configuration` is through
/// [`Configuration::validate`], so holding one guarantees the naming and
/// pairing rules have passed. The provisioning workflow therefore never
/// re-validates.
#[derive(Debug, Clone)]
pub struct Configuration {
    region: String,
    bucket_name: String,
    locking_mechanism: LockingMechanism,
    table_name: Option<String>,
    credentials: Option<Credentials>,
}

impl Configuration {
    /// Validate a raw [`ProvisionRequest`] into a `Configuration`.
    ///
    /// Pure; issues no remote calls. A `table_name` supplied alongside the
    /// `s3` mechanism is accepted but ignored with a warning.
    pub fn validate(request: ProvisionRequest) -> Result<Self, ValidationError> {
        let region = request.region.trim().to_owned();
        if region.is_empty() {
            return Err(ValidationError::EmptyRegion);
        }

        let bucket_name = request.bucket_name.trim().to_owned();
        if let Some(reason) = bucket_name_violation(&bucket_name) {
            return Err(ValidationError::InvalidBucketName {
                name: bucket_name,
                reason,
            });
        }

        let table_name = match request.locking_mechanism {
            LockingMechanism::DynamoDb => {
                let name = request
                    .table_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or(ValidationError::MissingTableName)?
                    .to_owned();
                if let Some(reason) = table_name_violation(&name) {
                    return Err(ValidationError::InvalidTableName { name, reason });
                }
                Some(name)
            }
            LockingMechanism::S3 => {
                if let Some(ref ignored) = request.table_name {
                    warn!(
                        table_name = %ignored,
                        "table_name ignored because locking_mechanism is 's3'"
                    );
                }
                None
            }
        };

        let credentials = match (request.aws_access_key_id, request.aws_secret_access_key) {
            (Some(id), Some(secret)) => Some(Credentials {
                access_key_id: id,
                secret_access_key: SecretString::new(secret),
            }),
            (None, None) => None,
            _ => return Err(ValidationError::PartialCredentials),
        };

        Ok(Self {
            region,
            bucket_name,
            locking_mechanism: request.locking_mechanism,
            table_name,
            credentials,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    pub fn locking_mechanism(&self) -> LockingMechanism {
        self.locking_mechanism
    }

    /// The lock table name; `None` for the `s3` mechanism.
    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

/// Check S3 bucket naming rules. Returns the violated rule, or `None` when
/// the name is acceptable.
fn bucket_name_violation(name: &str) -> Option<String> {
    if name.len() < 3 || name.len() > 63 {
        return Some(format!(
            "must be between 3 and 63 characters, got {}",
            name.len()
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '.'))
    {
        return Some(format!(
            "character '{bad}' is not allowed (lowercase letters, digits, hyphens and dots only)"
        ));
    }
    let first = name.chars().next()?;
    let last = name.chars().next_back()?;
    if !(first.is_ascii_lowercase() || first.is_ascii_digit())
        || !(last.is_ascii_lowercase() || last.is_ascii_digit())
    {
        return Some("must start and end with a lowercase letter or digit".to_owned());
    }
    None
}

/// Check DynamoDB table naming rules.
fn table_name_violation(name: &str) -> Option<String> {
    if name.len() < 3 || name.len() > 255 {
        return Some(format!(
            "must be between 3 and 255 characters, got {}",
            name.len()
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.' || *c == '-'))
    {
        return Some(format!(
            "character '{bad}' is not allowed (letters, digits, '_', '.' and '-' only)"
        ));
    }
    None
}
