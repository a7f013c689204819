//! The metric view resource, managed entirely through SQL statements.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::WorkspaceClient;
use crate::error::ProviderError;
use crate::resource::Resource;
use crate::statement::{self, StatementRunner};
use crate::types::ReadOutcome;

/// Statement failure markers that mean the view does not exist.
const MISSING_VIEW_MARKERS: &[&str] = &["TABLE_OR_VIEW_NOT_FOUND", "RESOURCE_DOES_NOT_EXIST"];

/// State of a `metric_view` resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricViewModel {
    /// Warehouse the DDL runs on.
    #[serde(default)]
    pub warehouse_id: String,
    /// Name of the view.
    #[serde(default)]
    pub name: String,
    /// Catalog holding the view.
    #[serde(default)]
    pub catalog_name: String,
    /// Schema holding the view.
    #[serde(default)]
    pub schema_name: String,
    /// The YAML definition of the view.
    #[serde(default)]
    pub yaml_specification: String,
    /// `catalog.schema.name` (computed).
    #[serde(default)]
    pub id: Option<String>,
}

impl MetricViewModel {
    /// The dotted three-part name, e.g. `main.sales.revenue`.
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.catalog_name, self.schema_name, self.name)
    }

    /// The three-part name with each part back-quoted for SQL.
    pub fn sql_full_name(&self) -> String {
        format!(
            "{}.{}.{}",
            quote_identifier(&self.catalog_name),
            quote_identifier(&self.schema_name),
            quote_identifier(&self.name)
        )
    }

    fn create_statement(&self, or_replace: bool) -> String {
        let verb = if or_replace {
            "CREATE OR REPLACE"
        } else {
            "CREATE"
        };
        format!(
            "{} METRIC VIEW {} AS\n{};",
            verb,
            self.sql_full_name(),
            self.yaml_specification
        )
    }
}

fn has_missing_marker(message: &str) -> bool {
    MISSING_VIEW_MARKERS.iter().any(|m| message.contains(m))
}

/// Back-quote a SQL identifier, doubling embedded back-quotes.
fn quote_identifier(part: &str) -> String {
    format!("`{}`", part.replace('`', "``"))
}

/// Manages a metric view in the catalog.
pub struct MetricViewResource {
    statements: StatementRunner,
}

impl MetricViewResource {
    /// Create the resource on top of a workspace client.
    pub fn new(client: Arc<dyn WorkspaceClient>, wait_timeout: Duration) -> Self {
        Self {
            statements: StatementRunner::new(client, wait_timeout),
        }
    }

    async fn run(
        &self,
        warehouse_id: &str,
        sql: String,
        action: &str,
    ) -> Result<(), ProviderError> {
        let status = self
            .statements
            .execute(warehouse_id, sql)
            .await
            .map_err(|e| ProviderError::api(action, e))?;
        statement::require_success(&status, action)
    }
}

#[async_trait]
impl Resource for MetricViewResource {
    type Model = MetricViewModel;

    fn type_name(&self) -> &'static str {
        "metric_view"
    }

    async fn create(&self, mut plan: MetricViewModel) -> Result<MetricViewModel, ProviderError> {
        self.run(
            &plan.warehouse_id,
            plan.create_statement(false),
            "failed to create metric view",
        )
        .await?;

        plan.id = Some(plan.full_name());
        Ok(plan)
    }

    async fn read(
        &self,
        state: MetricViewModel,
    ) -> Result<ReadOutcome<MetricViewModel>, ProviderError> {
        let sql = format!("DESCRIBE EXTENDED {};", state.sql_full_name());

        let status = match self.statements.execute(&state.warehouse_id, sql).await {
            Ok(status) => status,
            Err(e) if e.is_missing() || has_missing_marker(&e.message) => {
                return Ok(ReadOutcome::Removed)
            }
            Err(e) => return Err(ProviderError::api("failed to read metric view", e)),
        };

        match statement::require_success(&status, "failed to read metric view") {
            Ok(()) => Ok(ReadOutcome::Found(state)),
            Err(ProviderError::Statement { message, .. }) if has_missing_marker(&message) => {
                Ok(ReadOutcome::Removed)
            }
            Err(e) => Err(e),
        }
    }

    async fn update(
        &self,
        prior: MetricViewModel,
        mut plan: MetricViewModel,
    ) -> Result<MetricViewModel, ProviderError> {
        self.run(
            &plan.warehouse_id,
            plan.create_statement(true),
            "failed to update metric view",
        )
        .await?;

        plan.id = prior.id.or_else(|| Some(plan.full_name()));
        Ok(plan)
    }

    async fn delete(&self, state: MetricViewModel) -> Result<(), ProviderError> {
        let sql = format!("DROP METRIC VIEW IF EXISTS {};", state.sql_full_name());
        match self.run(&state.warehouse_id, sql, "failed to delete metric view").await {
            Err(e) if !e.is_missing() => Err(e),
            _ => Ok(()),
        }
    }

    fn import_state(&self, id: &str) -> Result<MetricViewModel, ProviderError> {
        let parts: Vec<&str> = id.splitn(3, '.').collect();
        match parts.as_slice() {
            [catalog_name, schema_name, name] => Ok(MetricViewModel {
                catalog_name: catalog_name.to_string(),
                schema_name: schema_name.to_string(),
                name: name.to_string(),
                id: Some(id.to_string()),
                ..Default::default()
            }),
            _ => Err(ProviderError::Validation(format!(
                "expected format: catalog_name.schema_name.name, got: {}",
                id
            ))),
        }
    }
}
