//! Error types for the workspace provider.

use thiserror::Error;

/// Error codes the workspace API uses to signal a vanished object.
const MISSING_ERROR_CODES: &[&str] = &["RESOURCE_DOES_NOT_EXIST", "NOT_FOUND"];

/// An error returned by the remote workspace API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (status {status_code}, {error_code})")]
pub struct ApiError {
    /// The HTTP status code of the failed call.
    pub status_code: u16,
    /// The machine-readable error code, e.g. `RESOURCE_DOES_NOT_EXIST`.
    pub error_code: String,
    /// The human-readable error message.
    pub message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(
        status_code: u16,
        error_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            error_code: error_code.into(),
            message: message.into(),
        }
    }

    /// Create the error the API returns for an object that does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, "RESOURCE_DOES_NOT_EXIST", message)
    }

    /// Whether this error means the object no longer exists.
    pub fn is_missing(&self) -> bool {
        self.status_code == 404 || MISSING_ERROR_CODES.contains(&self.error_code.as_str())
    }
}

/// Errors that can occur while reconciling a resource or data source.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested object was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The configuration or an import identifier is invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested resource or data source type is not registered.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// State could not be converted to or from the typed model.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted document could not be parsed.
    #[error("failed to parse serialized space: {0}")]
    MalformedDocument(#[source] serde_json::Error),

    /// A document could not be encoded.
    #[error("failed to marshal serialized space: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The workspace API rejected a call.
    #[error("{action}: {source}")]
    Api {
        /// What the provider was doing, e.g. `failed to create genie space`.
        action: String,
        /// The underlying API error.
        #[source]
        source: ApiError,
    },

    /// A SQL statement reached a terminal state other than success.
    #[error("{action}: {message}")]
    Statement {
        /// What the provider was doing.
        action: String,
        /// The final statement state, with the service message if any.
        message: String,
    },

    /// The operation is not supported by this resource.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}

impl ProviderError {
    /// Wrap an API error with a description of the failed action.
    pub fn api(action: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            action: action.into(),
            source,
        }
    }

    /// Get the error message without the action prefix.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::UnknownResource(msg)
            | Self::Unimplemented(msg) => msg.clone(),
            Self::Serialization(e) | Self::MalformedDocument(e) | Self::Encoding(e) => {
                e.to_string()
            }
            Self::Api { source, .. } => source.message.clone(),
            Self::Statement { message, .. } => message.clone(),
        }
    }

    /// Whether this error wraps an API error that signals a vanished object.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Api { source, .. } if source.is_missing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("space-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: space-123");

        let err = ProviderError::Validation("bad id".to_string());
        assert_eq!(format!("{}", err), "Validation error: bad id");

        let err = ProviderError::UnknownResource("databricks_widget".to_string());
        assert_eq!(
            format!("{}", err),
            "Unknown resource type: databricks_widget"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = ProviderError::api(
            "failed to create genie space",
            ApiError::new(400, "INVALID_PARAMETER_VALUE", "warehouse is stopped"),
        );
        assert_eq!(
            format!("{}", err),
            "failed to create genie space: warehouse is stopped (status 400, INVALID_PARAMETER_VALUE)"
        );
        assert_eq!(err.message(), "warehouse is stopped");
    }

    #[test]
    fn test_is_missing() {
        assert!(ApiError::not_found("gone").is_missing());
        assert!(ApiError::new(400, "RESOURCE_DOES_NOT_EXIST", "gone").is_missing());
        assert!(ApiError::new(404, "", "gone").is_missing());
        assert!(!ApiError::new(500, "INTERNAL_ERROR", "boom").is_missing());

        let err = ProviderError::api("failed to read genie space", ApiError::not_found("gone"));
        assert!(err.is_missing());

        let err = ProviderError::Validation("nope".to_string());
        assert!(!err.is_missing());
    }

    #[test]
    fn test_statement_error_display() {
        let err = ProviderError::Statement {
            action: "create SQL statement did not succeed".to_string(),
            message: "FAILED: syntax error".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "create SQL statement did not succeed: FAILED: syntax error"
        );
        assert_eq!(err.message(), "FAILED: syntax error");
    }

    #[test]
    fn test_document_errors() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let detail = parse_err.to_string();
        let err = ProviderError::MalformedDocument(parse_err);
        assert!(format!("{}", err).starts_with("failed to parse serialized space"));
        assert_eq!(err.message(), detail);
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::Unimplemented("update".to_string());
        assert_eq!(err.message(), "update");

        let err = ProviderError::UnknownResource("databricks_widget".to_string());
        assert_eq!(err.message(), "databricks_widget");
    }
}
