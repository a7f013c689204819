//! Testing utilities for the workspace provider.
//!
//! [`MockWorkspace`] is an in-memory [`WorkspaceClient`] whose stored objects
//! can be edited behind the provider's back to simulate drift, and whose calls
//! can be scripted to fail. [`ProviderTester`] drives a [`WorkspaceProvider`]
//! through whole lifecycles using plain JSON state.
//!
//! # Example
//!
//! ```
//! use workspace_provider::testing::ProviderTester;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let (tester, mock) = ProviderTester::with_mock();
//!
//! let state = tester
//!     .lifecycle_create(
//!         "databricks_genie_space",
//!         json!({
//!             "title": "Sales",
//!             "warehouse_id": "abc123",
//!             "tables": ["samples.tpch.customer"]
//!         }),
//!     )
//!     .await
//!     .unwrap();
//!
//! let id = state["id"].as_str().unwrap();
//! assert!(mock.space(id).await.is_some());
//! # });
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::client::{
    AppDeployment, AppsApi, CreateAppDeploymentRequest, CreateSpaceRequest,
    ExecuteStatementRequest, GenieApi, GenieSpace, GetSpaceRequest, StatementExecutionApi,
    StatementResponse, StatementStatus, UpdateSpaceRequest,
};
use crate::error::{ApiError, ProviderError};
use crate::provider::WorkspaceProvider;
use crate::types::{ImportedResource, ProviderOptions};

// =========================================================================
// Mock workspace
// =========================================================================

/// A workspace API call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    /// [`GenieApi::create_space`].
    CreateSpace,
    /// [`GenieApi::get_space`].
    GetSpace,
    /// [`GenieApi::update_space`].
    UpdateSpace,
    /// [`GenieApi::trash_space`].
    TrashSpace,
    /// [`AppsApi::deploy`].
    Deploy,
    /// [`AppsApi::get_deployment`].
    GetDeployment,
    /// [`StatementExecutionApi::execute_statement`].
    ExecuteStatement,
}

type StatementOutcome = Result<StatementStatus, ApiError>;

#[derive(Default)]
struct MockState {
    spaces: HashMap<String, GenieSpace>,
    parent_paths: HashMap<String, String>,
    deployments: HashMap<(String, String), AppDeployment>,
    statements: Vec<ExecuteStatementRequest>,
    statement_rules: Vec<(String, StatementOutcome)>,
    failures: HashMap<MockOperation, ApiError>,
}

impl MockState {
    fn check(&self, operation: MockOperation) -> Result<(), ApiError> {
        match self.failures.get(&operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// An in-memory workspace.
///
/// Spaces and deployments live in maps; every SQL statement succeeds unless a
/// rule registered with [`MockWorkspace::respond_to_statements`] matches it.
#[derive(Default)]
pub struct MockWorkspace {
    state: Mutex<MockState>,
    next_id: AtomicU64,
}

impl MockWorkspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", prefix, n)
    }

    /// The stored space, including its serialized document.
    pub async fn space(&self, space_id: &str) -> Option<GenieSpace> {
        self.state.lock().await.spaces.get(space_id).cloned()
    }

    /// The folder a space was created in.
    pub async fn parent_path(&self, space_id: &str) -> Option<String> {
        self.state.lock().await.parent_paths.get(space_id).cloned()
    }

    /// Store a space as if it had been created out of band.
    pub async fn insert_space(&self, space: GenieSpace) {
        self.state
            .lock()
            .await
            .spaces
            .insert(space.space_id.clone(), space);
    }

    /// Edit a stored space in place. Does nothing if the space is absent.
    pub async fn modify_space<F>(&self, space_id: &str, edit: F)
    where
        F: FnOnce(&mut GenieSpace),
    {
        if let Some(space) = self.state.lock().await.spaces.get_mut(space_id) {
            edit(space);
        }
    }

    /// Delete a space out of band.
    pub async fn remove_space(&self, space_id: &str) -> Option<GenieSpace> {
        self.state.lock().await.spaces.remove(space_id)
    }

    /// The stored deployment of an app.
    pub async fn deployment(&self, app_name: &str, deployment_id: &str) -> Option<AppDeployment> {
        self.state
            .lock()
            .await
            .deployments
            .get(&(app_name.to_string(), deployment_id.to_string()))
            .cloned()
    }

    /// Store a deployment as if it had been made out of band.
    pub async fn insert_deployment(&self, app_name: &str, deployment: AppDeployment) {
        self.state.lock().await.deployments.insert(
            (app_name.to_string(), deployment.deployment_id.clone()),
            deployment,
        );
    }

    /// The SQL text of every executed statement, in order.
    pub async fn executed_statements(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .statements
            .iter()
            .map(|request| request.statement.clone())
            .collect()
    }

    /// Every statement request, in order.
    pub async fn statement_requests(&self) -> Vec<ExecuteStatementRequest> {
        self.state.lock().await.statements.clone()
    }

    /// Answer every statement containing `pattern` with `outcome`.
    ///
    /// The most recently registered matching rule wins.
    pub async fn respond_to_statements(
        &self,
        pattern: impl Into<String>,
        outcome: Result<StatementStatus, ApiError>,
    ) {
        self.state
            .lock()
            .await
            .statement_rules
            .push((pattern.into(), outcome));
    }

    /// Make every later call of `operation` fail with `error`.
    pub async fn fail(&self, operation: MockOperation, error: ApiError) {
        self.state.lock().await.failures.insert(operation, error);
    }
}

fn space_not_found(space_id: &str) -> ApiError {
    ApiError::not_found(format!("space {} does not exist", space_id))
}

#[async_trait]
impl GenieApi for MockWorkspace {
    async fn create_space(&self, request: CreateSpaceRequest) -> Result<GenieSpace, ApiError> {
        let mut state = self.state.lock().await;
        state.check(MockOperation::CreateSpace)?;

        let space = GenieSpace {
            space_id: self.generate_id("space"),
            title: request.title,
            warehouse_id: request.warehouse_id,
            description: request.description,
            serialized_space: request.serialized_space,
        };
        if !request.parent_path.is_empty() {
            state
                .parent_paths
                .insert(space.space_id.clone(), request.parent_path);
        }
        state.spaces.insert(space.space_id.clone(), space.clone());
        Ok(space)
    }

    async fn get_space(&self, request: GetSpaceRequest) -> Result<GenieSpace, ApiError> {
        let state = self.state.lock().await;
        state.check(MockOperation::GetSpace)?;

        let mut space = state
            .spaces
            .get(&request.space_id)
            .cloned()
            .ok_or_else(|| space_not_found(&request.space_id))?;
        if !request.include_serialized_space {
            space.serialized_space.clear();
        }
        Ok(space)
    }

    async fn update_space(&self, request: UpdateSpaceRequest) -> Result<GenieSpace, ApiError> {
        let mut state = self.state.lock().await;
        state.check(MockOperation::UpdateSpace)?;

        let space = state
            .spaces
            .get_mut(&request.space_id)
            .ok_or_else(|| space_not_found(&request.space_id))?;
        space.title = request.title;
        space.warehouse_id = request.warehouse_id;
        space.description = request.description;
        space.serialized_space = request.serialized_space;
        Ok(space.clone())
    }

    async fn trash_space(&self, space_id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.check(MockOperation::TrashSpace)?;

        state
            .spaces
            .remove(space_id)
            .map(|_| ())
            .ok_or_else(|| space_not_found(space_id))
    }
}

#[async_trait]
impl AppsApi for MockWorkspace {
    async fn deploy(
        &self,
        request: CreateAppDeploymentRequest,
    ) -> Result<AppDeployment, ApiError> {
        let mut state = self.state.lock().await;
        state.check(MockOperation::Deploy)?;

        let deployment = AppDeployment {
            deployment_id: self.generate_id("deploy"),
            source_code_path: request.source_code_path,
        };
        state.deployments.insert(
            (request.app_name, deployment.deployment_id.clone()),
            deployment.clone(),
        );
        Ok(deployment)
    }

    async fn get_deployment(
        &self,
        app_name: &str,
        deployment_id: &str,
    ) -> Result<AppDeployment, ApiError> {
        let state = self.state.lock().await;
        state.check(MockOperation::GetDeployment)?;

        state
            .deployments
            .get(&(app_name.to_string(), deployment_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                ApiError::not_found(format!(
                    "deployment {} of app {} does not exist",
                    deployment_id, app_name
                ))
            })
    }
}

#[async_trait]
impl StatementExecutionApi for MockWorkspace {
    async fn execute_statement(
        &self,
        request: ExecuteStatementRequest,
    ) -> Result<StatementResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.check(MockOperation::ExecuteStatement)?;

        let outcome = state
            .statement_rules
            .iter()
            .rev()
            .find(|(pattern, _)| request.statement.contains(pattern.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| Ok(StatementStatus::succeeded()));
        state.statements.push(request);

        Ok(StatementResponse {
            statement_id: self.generate_id("statement"),
            status: outcome?,
        })
    }
}

// =========================================================================
// Provider tester
// =========================================================================

/// A test harness around a [`WorkspaceProvider`].
pub struct ProviderTester {
    provider: WorkspaceProvider,
}

impl ProviderTester {
    /// Create a new tester for the given provider.
    pub fn new(provider: WorkspaceProvider) -> Self {
        Self { provider }
    }

    /// Create a tester backed by a fresh [`MockWorkspace`] with default options.
    pub fn with_mock() -> (Self, Arc<MockWorkspace>) {
        Self::with_mock_and_options(ProviderOptions::default())
    }

    /// Create a tester backed by a fresh [`MockWorkspace`].
    pub fn with_mock_and_options(options: ProviderOptions) -> (Self, Arc<MockWorkspace>) {
        let mock = Arc::new(MockWorkspace::new());
        let provider = WorkspaceProvider::with_options(mock.clone(), options);
        (Self::new(provider), mock)
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &WorkspaceProvider {
        &self.provider
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource. `None` means it was removed.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<ImportedResource, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read_data_source(data_source_type, config).await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Read a resource that is expected to exist.
    async fn read_existing(
        &self,
        resource_type: &str,
        state: Value,
    ) -> Result<Value, ProviderError> {
        self.read(resource_type, state).await?.ok_or_else(|| {
            ProviderError::NotFound(format!("{} disappeared during the lifecycle", resource_type))
        })
    }

    /// Run a create lifecycle: create → read.
    ///
    /// Returns the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.create(resource_type, config).await?;
        self.read_existing(resource_type, created).await
    }

    /// Run an update lifecycle: update → read.
    ///
    /// Returns the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let updated = self.update(resource_type, prior_state, planned_state).await?;
        self.read_existing(resource_type, updated).await
    }

    /// Run an import lifecycle: import → read.
    pub async fn lifecycle_import(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Value, ProviderError> {
        let imported = self.import_resource(resource_type, id).await?;
        self.read_existing(resource_type, imported.state).await
    }

    /// Run a full CRUD lifecycle: create → read → update → read → delete.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.delete(resource_type, updated.clone()).await?;
        Ok(updated)
    }
}
