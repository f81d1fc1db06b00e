use stateforge_core::error::CloudError;

/// Classify an AWS SDK failure into a [`CloudError`].
///
/// Typed service codes are matched first; when the SDK surfaces no code
/// (dispatch failures, timeouts before a response), the error message is
/// inspected for common patterns instead.
pub fn classify_sdk_error(code: Option<&str>, message: &str) -> CloudError {
    if let Some(code) = code {
        return match code {
            "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation"
            | "InvalidAccessKeyId" | "SignatureDoesNotMatch" => {
                CloudError::AccessDenied(message.to_owned())
            }
            "Throttling" | "ThrottlingException" | "SlowDown" | "RequestLimitExceeded"
            | "ProvisionedThroughputExceededException" => CloudError::Throttled,
            "RequestTimeout" | "RequestTimeoutException" => CloudError::Timeout,
            _ => CloudError::Service {
                code: code.to_owned(),
                message: message.to_owned(),
            },
        };
    }

    let lower = message.to_lowercase();
    if lower.contains("throttl") || lower.contains("rate exceed") || lower.contains("too many") {
        CloudError::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        CloudError::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        CloudError::Connection(message.to_owned())
    } else if lower.contains("credential") {
        CloudError::Credentials(message.to_owned())
    } else {
        CloudError::Service {
            code: "Unknown".to_owned(),
            message: message.to_owned(),
        }
    }
}
