use serde::{Deserialize, Serialize};

/// The provisioning action that was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ProvisionAction {
    Create,
    Delete,
}

impl std::fmt::Display for ProvisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Delete => "delete",
        })
    }
}

/// Outcome of one resource within a provisioning action.
///
/// `Failed` only ever appears in the diagnostic snapshot attached to an
/// error; a successful [`ProvisioningResult`] never carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Created,
    AlreadyExists,
    Deleted,
    NotFound,
    Skipped,
    Failed,
}

impl ResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExists => "already_exists",
            Self::Deleted => "deleted",
            Self::NotFound => "not_found",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one provisioning action.
///
/// Constructed only once every remote operation for the action has either
/// completed or failed; a partially populated result is never returned as
/// success. `table_status` is `None` when the table step was not reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProvisioningResult {
    pub action: ProvisionAction,
    pub bucket_status: ResourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_status: Option<ResourceStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serde_names() {
        assert_eq!(
            serde_json::to_string(&ResourceStatus::AlreadyExists).unwrap(),
            "\"already_exists\""
        );
        assert_eq!(
            serde_json::to_string(&ResourceStatus::NotFound).unwrap(),
            "\"not_found\""
        );
    }

    #[test]
    fn absent_table_status_is_omitted() {
        let result = ProvisioningResult {
            action: ProvisionAction::Create,
            bucket_status: ResourceStatus::Created,
            table_status: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("table_status").is_none());
        assert_eq!(json["action"], "create");
        assert_eq!(json["bucket_status"], "created");
    }
}
