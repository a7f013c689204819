//! The provider dispatcher.
//!
//! [`WorkspaceProvider`] is what the surrounding framework talks to. It keeps
//! a registry of resources and data sources keyed by their production type
//! name, converts JSON state into each adapter's typed model, and logs every
//! operation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use workspace_provider::testing::MockWorkspace;
//! use workspace_provider::WorkspaceProvider;
//!
//! let provider = WorkspaceProvider::new(Arc::new(MockWorkspace::new()));
//! let metadata = provider.metadata();
//! assert!(metadata.resources.contains(&"databricks_genie_space".to_string()));
//! assert_eq!(metadata.data_sources, vec!["databricks_genie_space"]);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::app_deployment::AppDeploymentResource;
use crate::client::WorkspaceClient;
use crate::error::ProviderError;
use crate::genie_space::{GenieSpaceDataSource, GenieSpaceResource};
use crate::metric_view::MetricViewResource;
use crate::resource::{DataSource, Resource};
use crate::sql_execution::SqlExecutionResource;
use crate::types::{production_name, ImportedResource, ProviderMetadata, ProviderOptions};

/// A [`Resource`] with its model erased to JSON.
#[async_trait]
trait DynResource: Send + Sync {
    async fn create(&self, planned: Value) -> Result<Value, ProviderError>;
    async fn read(&self, current: Value) -> Result<Option<Value>, ProviderError>;
    async fn update(&self, prior: Value, planned: Value) -> Result<Value, ProviderError>;
    async fn delete(&self, current: Value) -> Result<(), ProviderError>;
    fn import_state(&self, id: &str) -> Result<Value, ProviderError>;
}

#[async_trait]
impl<R: Resource + 'static> DynResource for R {
    async fn create(&self, planned: Value) -> Result<Value, ProviderError> {
        let state = Resource::create(self, serde_json::from_value(planned)?).await?;
        Ok(serde_json::to_value(state)?)
    }

    async fn read(&self, current: Value) -> Result<Option<Value>, ProviderError> {
        match Resource::read(self, serde_json::from_value(current)?)
            .await?
            .into_option()
        {
            Some(state) => Ok(Some(serde_json::to_value(state)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, prior: Value, planned: Value) -> Result<Value, ProviderError> {
        let prior = serde_json::from_value(prior)?;
        let planned = serde_json::from_value(planned)?;
        let state = Resource::update(self, prior, planned).await?;
        Ok(serde_json::to_value(state)?)
    }

    async fn delete(&self, current: Value) -> Result<(), ProviderError> {
        Resource::delete(self, serde_json::from_value(current)?).await
    }

    fn import_state(&self, id: &str) -> Result<Value, ProviderError> {
        Ok(serde_json::to_value(Resource::import_state(self, id)?)?)
    }
}

/// A [`DataSource`] with its model erased to JSON.
#[async_trait]
trait DynDataSource: Send + Sync {
    async fn read(&self, config: Value) -> Result<Value, ProviderError>;
}

#[async_trait]
impl<D: DataSource + 'static> DynDataSource for D {
    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let result = DataSource::read(self, serde_json::from_value(config)?).await?;
        Ok(serde_json::to_value(result)?)
    }
}

/// Dispatches framework calls to the registered resources and data sources.
pub struct WorkspaceProvider {
    options: ProviderOptions,
    resources: BTreeMap<String, Box<dyn DynResource>>,
    data_sources: BTreeMap<String, Box<dyn DynDataSource>>,
}

impl WorkspaceProvider {
    /// Create a provider with every built-in resource and data source and
    /// default options.
    pub fn new(client: Arc<dyn WorkspaceClient>) -> Self {
        Self::with_options(client, ProviderOptions::default())
    }

    /// Create a provider with every built-in resource and data source.
    pub fn with_options(client: Arc<dyn WorkspaceClient>, options: ProviderOptions) -> Self {
        let wait_timeout = options.statement_wait_timeout;

        Self::empty(options)
            .with_resource(GenieSpaceResource::new(client.clone()))
            .with_resource(AppDeploymentResource::new(client.clone()))
            .with_resource(MetricViewResource::new(client.clone(), wait_timeout))
            .with_resource(SqlExecutionResource::new(client.clone(), wait_timeout))
            .with_data_source(GenieSpaceDataSource::new(client))
    }

    /// Create a provider with nothing registered.
    pub fn empty(options: ProviderOptions) -> Self {
        Self {
            options,
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    /// Register a resource under its prefixed type name.
    ///
    /// A resource registered under an existing name replaces it.
    pub fn with_resource<R: Resource + 'static>(mut self, resource: R) -> Self {
        let name = production_name(&self.options.type_name_prefix, resource.type_name());
        self.resources.insert(name, Box::new(resource));
        self
    }

    /// Register a data source under its prefixed type name.
    pub fn with_data_source<D: DataSource + 'static>(mut self, data_source: D) -> Self {
        let name = production_name(&self.options.type_name_prefix, data_source.type_name());
        self.data_sources.insert(name, Box::new(data_source));
        self
    }

    /// The options this provider was built with.
    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    /// The registered type names, sorted.
    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.resources.keys().cloned().collect(),
            data_sources: self.data_sources.keys().cloned().collect(),
        }
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn DynResource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DynDataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    /// Create a new resource and return its state.
    #[instrument(skip(self, planned_state), name = "provider.create")]
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        info!(resource_type = %resource_type, "Create called");

        let result = match self.resource(resource_type) {
            Ok(resource) => resource.create(planned_state).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => info!(resource_type = %resource_type, "Create completed successfully"),
            Err(e) => error!(resource_type = %resource_type, error = %e, "Create failed"),
        }
        result
    }

    /// Refresh a resource's state.
    ///
    /// Returns `None` when the remote object no longer exists and the resource
    /// should be dropped from state.
    #[instrument(skip(self, current_state), name = "provider.read")]
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        debug!(resource_type = %resource_type, "Read called");

        let result = match self.resource(resource_type) {
            Ok(resource) => resource.read(current_state).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(Some(_)) => debug!(resource_type = %resource_type, "Read completed successfully"),
            Ok(None) => warn!(
                resource_type = %resource_type,
                "Remote object no longer exists, removing from state"
            ),
            Err(e) => error!(resource_type = %resource_type, error = %e, "Read failed"),
        }
        result
    }

    /// Update an existing resource and return its new state.
    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        info!(resource_type = %resource_type, "Update called");

        let result = match self.resource(resource_type) {
            Ok(resource) => resource.update(prior_state, planned_state).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => info!(resource_type = %resource_type, "Update completed successfully"),
            Err(e) => error!(resource_type = %resource_type, error = %e, "Update failed"),
        }
        result
    }

    /// Delete a resource.
    #[instrument(skip(self, current_state), name = "provider.delete")]
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        info!(resource_type = %resource_type, "Delete called");

        let result = match self.resource(resource_type) {
            Ok(resource) => resource.delete(current_state).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(()) => info!(resource_type = %resource_type, "Delete completed successfully"),
            Err(e) => error!(resource_type = %resource_type, error = %e, "Delete failed"),
        }
        result
    }

    /// Build the initial state for importing an existing object.
    ///
    /// The framework is expected to follow up with [`WorkspaceProvider::read`].
    #[instrument(skip(self), name = "provider.import_resource")]
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<ImportedResource, ProviderError> {
        info!(resource_type = %resource_type, id = %id, "ImportResource called");

        let result = self
            .resource(resource_type)
            .and_then(|resource| resource.import_state(id))
            .map(|state| ImportedResource::new(resource_type, state));
        match &result {
            Ok(_) => info!(resource_type = %resource_type, id = %id, "ImportResource completed"),
            Err(e) => {
                error!(resource_type = %resource_type, id = %id, error = %e, "ImportResource failed")
            }
        }
        result
    }

    /// Read a data source.
    #[instrument(skip(self, config), name = "provider.read_data_source")]
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        debug!(data_source_type = %data_source_type, "ReadDataSource called");

        let result = match self.data_source(data_source_type) {
            Ok(data_source) => data_source.read(config).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => info!(
                data_source_type = %data_source_type,
                "ReadDataSource completed successfully"
            ),
            Err(e) => error!(
                data_source_type = %data_source_type,
                error = %e,
                "ReadDataSource failed"
            ),
        }
        result
    }
}
