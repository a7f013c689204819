//! Workspace API collaborator traits.
//!
//! The provider never talks HTTP itself. Every adapter goes through these
//! traits, which a binding implements on top of the vendor SDK (handling
//! authentication, retries, and long-running operation waiters) and which
//! [`crate::testing::MockWorkspace`] implements in memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// =========================================================================
// Genie
// =========================================================================

/// A Genie space as returned by the workspace API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenieSpace {
    /// Server-assigned identifier.
    pub space_id: String,
    /// Display title.
    pub title: String,
    /// SQL warehouse backing the space.
    pub warehouse_id: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// The serialized space document. Empty unless requested.
    #[serde(default)]
    pub serialized_space: String,
}

/// Request body for creating a space.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateSpaceRequest {
    /// Display title.
    pub title: String,
    /// SQL warehouse backing the space.
    pub warehouse_id: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Workspace folder the space is created in.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_path: String,
    /// The serialized space document.
    pub serialized_space: String,
}

/// Request for fetching a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSpaceRequest {
    /// The space to fetch.
    pub space_id: String,
    /// Whether to return the serialized document inline.
    pub include_serialized_space: bool,
}

impl GetSpaceRequest {
    /// Fetch a space together with its serialized document.
    pub fn with_serialized_space(space_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            include_serialized_space: true,
        }
    }
}

/// Request body for replacing a space's fields and document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateSpaceRequest {
    /// The space to update.
    pub space_id: String,
    /// Display title.
    pub title: String,
    /// SQL warehouse backing the space.
    pub warehouse_id: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// The serialized space document.
    pub serialized_space: String,
}

/// The Genie spaces API.
#[async_trait]
pub trait GenieApi: Send + Sync {
    /// Create a space and return it with its assigned identifier.
    async fn create_space(&self, request: CreateSpaceRequest) -> Result<GenieSpace, ApiError>;

    /// Fetch a space.
    async fn get_space(&self, request: GetSpaceRequest) -> Result<GenieSpace, ApiError>;

    /// Replace a space's scalar fields and document.
    async fn update_space(&self, request: UpdateSpaceRequest) -> Result<GenieSpace, ApiError>;

    /// Move a space to the trash.
    async fn trash_space(&self, space_id: &str) -> Result<(), ApiError>;
}

// =========================================================================
// Apps
// =========================================================================

/// A deployment of an app.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppDeployment {
    /// Server-assigned identifier.
    pub deployment_id: String,
    /// Workspace path of the deployed source code.
    pub source_code_path: String,
}

/// Request body for deploying an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAppDeploymentRequest {
    /// The app to deploy.
    pub app_name: String,
    /// Workspace path of the source code.
    pub source_code_path: String,
}

/// The apps API.
#[async_trait]
pub trait AppsApi: Send + Sync {
    /// Start a deployment and return it once it has succeeded.
    async fn deploy(&self, request: CreateAppDeploymentRequest) -> Result<AppDeployment, ApiError>;

    /// Fetch a single deployment of an app.
    async fn get_deployment(
        &self,
        app_name: &str,
        deployment_id: &str,
    ) -> Result<AppDeployment, ApiError>;
}

// =========================================================================
// SQL statement execution
// =========================================================================

/// What the service does when the wait timeout elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnWaitTimeout {
    /// Cancel the statement.
    #[default]
    Cancel,
    /// Keep running asynchronously.
    Continue,
}

/// Lifecycle state of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementState {
    /// Waiting for a warehouse.
    Pending,
    /// Executing.
    Running,
    /// Completed successfully.
    Succeeded,
    /// Completed with an error.
    Failed,
    /// Cancelled before completion.
    Canceled,
    /// Results were discarded.
    Closed,
}

impl StatementState {
    /// The wire name of the state, e.g. `SUCCEEDED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for StatementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error details attached to a failed statement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceError {
    /// Machine-readable error code.
    #[serde(default)]
    pub error_code: String,
    /// Human-readable message.
    pub message: String,
}

/// Status of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementStatus {
    /// Current state.
    pub state: StatementState,
    /// Error details, present when the statement failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
}

impl StatementStatus {
    /// A successful status.
    pub fn succeeded() -> Self {
        Self {
            state: StatementState::Succeeded,
            error: None,
        }
    }

    /// A failed status carrying a service error message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: StatementState::Failed,
            error: Some(ServiceError {
                error_code: String::new(),
                message: message.into(),
            }),
        }
    }
}

/// Request body for executing a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteStatementRequest {
    /// The SQL text.
    pub statement: String,
    /// Warehouse to run on.
    pub warehouse_id: String,
    /// How long to wait synchronously, e.g. `50s`.
    pub wait_timeout: String,
    /// What to do when the wait timeout elapses.
    pub on_wait_timeout: OnWaitTimeout,
}

/// Response of a statement execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementResponse {
    /// Server-assigned identifier.
    pub statement_id: String,
    /// Final or current status.
    pub status: StatementStatus,
}

/// The SQL statement execution API.
#[async_trait]
pub trait StatementExecutionApi: Send + Sync {
    /// Execute a statement, waiting up to the request's wait timeout.
    async fn execute_statement(
        &self,
        request: ExecuteStatementRequest,
    ) -> Result<StatementResponse, ApiError>;
}

/// A client for every workspace API the provider uses.
pub trait WorkspaceClient: GenieApi + AppsApi + StatementExecutionApi {}

impl<T> WorkspaceClient for T where T: GenieApi + AppsApi + StatementExecutionApi {}
