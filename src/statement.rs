//! Running SQL statements for the SQL-backed resources.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{
    ExecuteStatementRequest, OnWaitTimeout, StatementExecutionApi, StatementStatus,
    WorkspaceClient,
};
use crate::error::{ApiError, ProviderError};

/// Executes statements on a SQL warehouse with a fixed wait timeout.
#[derive(Clone)]
pub struct StatementRunner {
    client: Arc<dyn WorkspaceClient>,
    wait_timeout: Duration,
}

impl StatementRunner {
    /// Create a runner that waits up to `wait_timeout` for each statement.
    pub fn new(client: Arc<dyn WorkspaceClient>, wait_timeout: Duration) -> Self {
        Self {
            client,
            wait_timeout,
        }
    }

    /// Execute `statement` and return its final status.
    ///
    /// The API cancels the statement if it is still running when the wait
    /// timeout elapses.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] if the call itself fails. A statement that
    /// ran and failed is reported through the returned status.
    pub async fn execute(
        &self,
        warehouse_id: &str,
        statement: impl Into<String>,
    ) -> Result<StatementStatus, ApiError> {
        let response = self
            .client
            .execute_statement(ExecuteStatementRequest {
                statement: statement.into(),
                warehouse_id: warehouse_id.to_string(),
                wait_timeout: format_wait_timeout(self.wait_timeout),
                on_wait_timeout: OnWaitTimeout::Cancel,
            })
            .await?;
        Ok(response.status)
    }
}

/// Render a wait timeout the way the API expects it, e.g. `50s`.
pub fn format_wait_timeout(timeout: Duration) -> String {
    format!("{}s", timeout.as_secs())
}

/// Describe a non-successful status: the state, plus the service message if any.
pub fn describe_failure(status: &StatementStatus) -> String {
    match &status.error {
        Some(error) => format!("{}: {}", status.state, error.message),
        None => status.state.to_string(),
    }
}

/// Turn a finished statement into a result, failing unless it succeeded.
///
/// # Errors
///
/// Returns [`ProviderError::Statement`] labelled with `action` if the
/// statement did not succeed.
pub fn require_success(
    status: &StatementStatus,
    action: impl Into<String>,
) -> Result<(), ProviderError> {
    if status.state == crate::client::StatementState::Succeeded {
        Ok(())
    } else {
        Err(ProviderError::Statement {
            action: action.into(),
            message: describe_failure(status),
        })
    }
}
