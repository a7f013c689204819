//! Convenience types shared by the resource adapters and the dispatcher.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The default prefix of every resource and data source type name.
pub const DEFAULT_TYPE_NAME_PREFIX: &str = "databricks";

/// How long a SQL statement may run before the API cancels it.
pub const DEFAULT_STATEMENT_WAIT_TIMEOUT: Duration = Duration::from_secs(50);

/// Build the production type name of a resource, e.g. `databricks_genie_space`.
pub fn production_name(prefix: &str, name: &str) -> String {
    format!("{}_{}", prefix, name)
}

/// The outcome of reading a managed object back from the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome<T> {
    /// The object exists; this is its refreshed state.
    Found(T),
    /// The object no longer exists and should be dropped from state.
    Removed,
}

impl<T> ReadOutcome<T> {
    /// Convert into an `Option`, mapping [`ReadOutcome::Removed`] to `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(state) => Some(state),
            Self::Removed => None,
        }
    }

    /// Whether the object was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata: the registered type names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
}

/// Options for configuring the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOptions {
    /// Prefix joined to every resource and data source name.
    /// Default: `databricks`.
    pub type_name_prefix: String,
    /// Wait timeout sent with every SQL statement. Default: 50 seconds.
    pub statement_wait_timeout: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            type_name_prefix: DEFAULT_TYPE_NAME_PREFIX.to_string(),
            statement_wait_timeout: DEFAULT_STATEMENT_WAIT_TIMEOUT,
        }
    }
}

impl ProviderOptions {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type name prefix.
    pub fn with_type_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_name_prefix = prefix.into();
        self
    }

    /// Set the SQL statement wait timeout.
    pub fn with_statement_wait_timeout(mut self, timeout: Duration) -> Self {
        self.statement_wait_timeout = timeout;
        self
    }
}
