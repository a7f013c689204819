//! The traits every resource and data source adapter implements.
//!
//! Adapters work on a typed model. The [`crate::provider::WorkspaceProvider`]
//! converts framework state (`serde_json::Value`) to and from that model, so an
//! adapter only has to map the model onto workspace API calls.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ProviderError;
use crate::types::ReadOutcome;

/// A managed resource with a create/read/update/delete lifecycle.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The typed state of the resource.
    type Model: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// The unprefixed type name, e.g. `genie_space`.
    fn type_name(&self) -> &'static str;

    /// Create the remote object and return the state with computed fields set.
    async fn create(&self, plan: Self::Model) -> Result<Self::Model, ProviderError>;

    /// Refresh state from the remote object.
    ///
    /// Returns [`ReadOutcome::Removed`] when the object no longer exists.
    async fn read(&self, state: Self::Model) -> Result<ReadOutcome<Self::Model>, ProviderError>;

    /// Apply `plan` to the object identified by `prior`.
    async fn update(
        &self,
        prior: Self::Model,
        plan: Self::Model,
    ) -> Result<Self::Model, ProviderError>;

    /// Delete the remote object. Deleting an object that is already gone succeeds.
    async fn delete(&self, state: Self::Model) -> Result<(), ProviderError>;

    /// Build the minimal state for importing an existing object by identifier.
    ///
    /// The framework follows an import with a read, which fills in the rest.
    fn import_state(&self, id: &str) -> Result<Self::Model, ProviderError> {
        Err(ProviderError::Unimplemented(format!(
            "import is not supported for {} (id {})",
            self.type_name(),
            id
        )))
    }
}

/// A read-only data source.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The typed configuration and result of the data source.
    type Model: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// The unprefixed type name, e.g. `genie_space`.
    fn type_name(&self) -> &'static str;

    /// Look up the object described by `config` and return the filled-in model.
    async fn read(&self, config: Self::Model) -> Result<Self::Model, ProviderError>;
}
