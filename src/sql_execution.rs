//! A generic resource driven by user-supplied SQL.
//!
//! The user provides the statements that create, probe, and destroy some
//! object; the resource only runs them and tracks the object's name.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::WorkspaceClient;
use crate::error::ProviderError;
use crate::resource::Resource;
use crate::statement::{self, StatementRunner};
use crate::types::ReadOutcome;

/// State of a `sql_execution` resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SqlExecutionModel {
    /// Warehouse the statements run on.
    #[serde(default)]
    pub warehouse_id: String,
    /// Statement that creates the object.
    #[serde(default)]
    pub create_sql: String,
    /// Statement that succeeds only while the object exists.
    #[serde(default)]
    pub read_sql: String,
    /// Statement that removes the object.
    #[serde(default)]
    pub destroy_sql: String,
    /// Name of the managed object.
    #[serde(default)]
    pub object_name: String,
    /// Same as `object_name` (computed).
    #[serde(default)]
    pub id: Option<String>,
}

/// Runs user-supplied SQL to manage an arbitrary object.
pub struct SqlExecutionResource {
    statements: StatementRunner,
}

impl SqlExecutionResource {
    /// Create the resource on top of a workspace client.
    pub fn new(client: Arc<dyn WorkspaceClient>, wait_timeout: Duration) -> Self {
        Self {
            statements: StatementRunner::new(client, wait_timeout),
        }
    }
}

#[async_trait]
impl Resource for SqlExecutionResource {
    type Model = SqlExecutionModel;

    fn type_name(&self) -> &'static str {
        "sql_execution"
    }

    async fn create(
        &self,
        mut plan: SqlExecutionModel,
    ) -> Result<SqlExecutionModel, ProviderError> {
        let status = self
            .statements
            .execute(&plan.warehouse_id, plan.create_sql.as_str())
            .await
            .map_err(|e| ProviderError::api("failed to execute create SQL statement", e))?;
        statement::require_success(&status, "create SQL statement did not succeed")?;

        plan.id = Some(plan.object_name.clone());
        Ok(plan)
    }

    async fn read(
        &self,
        state: SqlExecutionModel,
    ) -> Result<ReadOutcome<SqlExecutionModel>, ProviderError> {
        let status = match self
            .statements
            .execute(&state.warehouse_id, state.read_sql.as_str())
            .await
        {
            Ok(status) => status,
            Err(e) if e.is_missing() => return Ok(ReadOutcome::Removed),
            Err(e) => return Err(ProviderError::api("failed to execute read SQL statement", e)),
        };

        // Any unsuccessful probe means the object is gone.
        if statement::require_success(&status, "read SQL statement did not succeed").is_err() {
            return Ok(ReadOutcome::Removed);
        }

        Ok(ReadOutcome::Found(state))
    }

    async fn update(
        &self,
        prior: SqlExecutionModel,
        mut plan: SqlExecutionModel,
    ) -> Result<SqlExecutionModel, ProviderError> {
        plan.id = prior.id;
        Ok(plan)
    }

    async fn delete(&self, state: SqlExecutionModel) -> Result<(), ProviderError> {
        let status = match self
            .statements
            .execute(&state.warehouse_id, state.destroy_sql.as_str())
            .await
        {
            Ok(status) => status,
            Err(e) if e.is_missing() => return Ok(()),
            Err(e) => {
                return Err(ProviderError::api(
                    "failed to execute destroy SQL statement",
                    e,
                ))
            }
        };
        statement::require_success(&status, "destroy SQL statement did not succeed")
    }

    fn import_state(&self, id: &str) -> Result<SqlExecutionModel, ProviderError> {
        Ok(SqlExecutionModel {
            object_name: id.to_string(),
            id: Some(id.to_string()),
            ..Default::default()
        })
    }
}
