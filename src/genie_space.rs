//! The Genie space resource and data source.
//!
//! A space has a handful of scalar fields plus a serialized document holding
//! its tables and sample questions (see [`crate::serialized_space`]). Every
//! write rebuilds the document from configuration; every read decodes the
//! stored document and overwrites the local lists, so out-of-band edits show
//! up as drift.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::{
    CreateSpaceRequest, GenieApi, GetSpaceRequest, UpdateSpaceRequest, WorkspaceClient,
};
use crate::error::ProviderError;
use crate::resource::{DataSource, Resource};
use crate::serialized_space::{self, SpaceContents};
use crate::types::ReadOutcome;

const TYPE_NAME: &str = "genie_space";

/// State of a `genie_space` resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenieSpaceModel {
    /// Identifier of the space (computed).
    #[serde(default)]
    pub id: Option<String>,
    /// Title of the space.
    pub title: String,
    /// SQL warehouse the space runs queries on.
    pub warehouse_id: String,
    /// Description of the space.
    #[serde(default)]
    pub description: Option<String>,
    /// Folder the space is created in. Only sent on create.
    #[serde(default)]
    pub parent_path: Option<String>,
    /// Same as `id` (computed).
    #[serde(default)]
    pub space_id: Option<String>,
    /// Tables in `catalog.schema.table` form.
    #[serde(default)]
    pub tables: Vec<String>,
    /// Sample question strings.
    #[serde(default)]
    pub sample_questions: Vec<String>,
}

impl GenieSpaceModel {
    fn contents(&self) -> SpaceContents {
        SpaceContents {
            tables: self.tables.clone(),
            sample_questions: self.sample_questions.clone(),
        }
    }

    fn apply_contents(&mut self, contents: SpaceContents) {
        self.tables = contents.tables;
        self.sample_questions = contents.sample_questions;
    }

    fn require_id(&self) -> Result<&str, ProviderError> {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ProviderError::Validation(
                "genie space id is not set".to_string(),
            )),
        }
    }
}

/// Manages a Genie space.
pub struct GenieSpaceResource {
    client: Arc<dyn WorkspaceClient>,
}

impl GenieSpaceResource {
    /// Create the resource on top of a workspace client.
    pub fn new(client: Arc<dyn WorkspaceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for GenieSpaceResource {
    type Model = GenieSpaceModel;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    async fn create(&self, mut plan: GenieSpaceModel) -> Result<GenieSpaceModel, ProviderError> {
        let serialized_space = serialized_space::encode(&plan.contents())?;

        let space = self
            .client
            .create_space(CreateSpaceRequest {
                title: plan.title.clone(),
                warehouse_id: plan.warehouse_id.clone(),
                description: plan.description.clone().unwrap_or_default(),
                parent_path: plan.parent_path.clone().unwrap_or_default(),
                serialized_space,
            })
            .await
            .map_err(|e| ProviderError::api("failed to create genie space", e))?;

        if plan.description.is_none() {
            plan.description = Some(space.description);
        }
        plan.id = Some(space.space_id.clone());
        plan.space_id = Some(space.space_id);
        Ok(plan)
    }

    async fn read(
        &self,
        mut state: GenieSpaceModel,
    ) -> Result<ReadOutcome<GenieSpaceModel>, ProviderError> {
        let request = GetSpaceRequest::with_serialized_space(state.require_id()?);

        let space = match self.client.get_space(request).await {
            Ok(space) => space,
            Err(e) if e.is_missing() => return Ok(ReadOutcome::Removed),
            Err(e) => return Err(ProviderError::api("failed to read genie space", e)),
        };

        state.title = space.title;
        state.warehouse_id = space.warehouse_id;
        state.description = Some(space.description);
        state.space_id = Some(space.space_id);
        state.apply_contents(serialized_space::decode(&space.serialized_space)?);

        Ok(ReadOutcome::Found(state))
    }

    async fn update(
        &self,
        prior: GenieSpaceModel,
        mut plan: GenieSpaceModel,
    ) -> Result<GenieSpaceModel, ProviderError> {
        let space_id = prior.require_id()?.to_string();
        plan.id = prior.id;
        plan.space_id = prior.space_id;

        let serialized_space = serialized_space::encode(&plan.contents())?;

        self.client
            .update_space(UpdateSpaceRequest {
                space_id,
                title: plan.title.clone(),
                warehouse_id: plan.warehouse_id.clone(),
                description: plan.description.clone().unwrap_or_default(),
                serialized_space,
            })
            .await
            .map_err(|e| ProviderError::api("failed to update genie space", e))?;

        Ok(plan)
    }

    async fn delete(&self, state: GenieSpaceModel) -> Result<(), ProviderError> {
        match self.client.trash_space(state.require_id()?).await {
            Err(e) if !e.is_missing() => Err(ProviderError::api("failed to delete genie space", e)),
            _ => Ok(()),
        }
    }

    fn import_state(&self, id: &str) -> Result<GenieSpaceModel, ProviderError> {
        Ok(GenieSpaceModel {
            id: Some(id.to_string()),
            ..Default::default()
        })
    }
}

/// Configuration and result of the `genie_space` data source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenieSpaceDataModel {
    /// Identifier of the space to read.
    pub space_id: String,
    /// Identifier of the space (computed).
    #[serde(default)]
    pub id: Option<String>,
    /// Title of the space (computed).
    #[serde(default)]
    pub title: Option<String>,
    /// SQL warehouse of the space (computed).
    #[serde(default)]
    pub warehouse_id: Option<String>,
    /// Description of the space (computed).
    #[serde(default)]
    pub description: Option<String>,
    /// Tables of the space (computed).
    #[serde(default)]
    pub tables: Vec<String>,
    /// Sample questions of the space (computed).
    #[serde(default)]
    pub sample_questions: Vec<String>,
}

/// Reads an existing Genie space.
pub struct GenieSpaceDataSource {
    client: Arc<dyn WorkspaceClient>,
}

impl GenieSpaceDataSource {
    /// Create the data source on top of a workspace client.
    pub fn new(client: Arc<dyn WorkspaceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for GenieSpaceDataSource {
    type Model = GenieSpaceDataModel;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    async fn read(
        &self,
        mut config: GenieSpaceDataModel,
    ) -> Result<GenieSpaceDataModel, ProviderError> {
        let space = self
            .client
            .get_space(GetSpaceRequest::with_serialized_space(
                config.space_id.as_str(),
            ))
            .await
            .map_err(|e| ProviderError::api("failed to read genie space", e))?;

        let contents = serialized_space::decode(&space.serialized_space)?;

        config.id = Some(space.space_id);
        config.title = Some(space.title);
        config.warehouse_id = Some(space.warehouse_id);
        config.description = Some(space.description);
        config.tables = contents.tables;
        config.sample_questions = contents.sample_questions;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GenieSpace;
    use crate::error::ApiError;
    use crate::testing::{MockOperation, MockWorkspace};
    use serde_json::Value;
    use tokio_test::{assert_err, assert_ok};

    const TPCH_TABLES: [&str; 8] = [
        "samples.tpch.customer",
        "samples.tpch.lineitem",
        "samples.tpch.nation",
        "samples.tpch.orders",
        "samples.tpch.part",
        "samples.tpch.partsupp",
        "samples.tpch.region",
        "samples.tpch.supplier",
    ];

    fn plan() -> GenieSpaceModel {
        GenieSpaceModel {
            title: "My Genie Space".to_string(),
            warehouse_id: "abc123".to_string(),
            description: Some("A test space".to_string()),
            parent_path: Some("/Workspace/Users/me".to_string()),
            tables: vec!["catalog.schema.table1".to_string()],
            sample_questions: vec!["Show total revenue".to_string()],
            ..Default::default()
        }
    }

    fn setup() -> (Arc<MockWorkspace>, GenieSpaceResource) {
        let mock = Arc::new(MockWorkspace::new());
        let resource = GenieSpaceResource::new(mock.clone());
        (mock, resource)
    }

    #[tokio::test]
    async fn test_create_sends_document_and_sets_ids() {
        let (mock, resource) = setup();

        let state = resource.create(plan()).await.unwrap();
        let id = state.id.clone().unwrap();
        assert_eq!(state.space_id.as_deref(), Some(id.as_str()));
        assert_eq!(state.title, "My Genie Space");

        let stored = mock.space(&id).await.unwrap();
        assert_eq!(stored.title, "My Genie Space");
        assert_eq!(stored.warehouse_id, "abc123");
        assert_eq!(stored.description, "A test space");
        assert_eq!(
            mock.parent_path(&id).await.as_deref(),
            Some("/Workspace/Users/me")
        );

        let document: Value = serde_json::from_str(&stored.serialized_space).unwrap();
        assert_eq!(document["version"], 1);
        assert_eq!(
            document["data_sources"]["tables"][0]["identifier"],
            "catalog.schema.table1"
        );
        assert_eq!(
            document["config"]["sample_questions"][0]["question"][0],
            "Show total revenue"
        );
    }

    #[tokio::test]
    async fn test_create_fills_missing_description_from_server() {
        let (_mock, resource) = setup();
        let mut plan = plan();
        plan.description = None;

        let state = resource.create(plan).await.unwrap();
        assert_eq!(state.description.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_create_api_failure() {
        let (mock, resource) = setup();
        mock.fail(
            MockOperation::CreateSpace,
            ApiError::new(400, "INVALID_PARAMETER_VALUE", "warehouse does not exist"),
        )
        .await;

        let err = resource.create(plan()).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to create genie space"));
        assert!(!err.is_missing());
    }

    #[tokio::test]
    async fn test_read_overwrites_from_server() {
        let (mock, _resource) = setup();
        mock.insert_space(GenieSpace {
            space_id: "space-1".to_string(),
            title: "My Genie Space".to_string(),
            warehouse_id: "abc123".to_string(),
            description: "A test space".to_string(),
            serialized_space: r#"{"version":1,"config":{},"data_sources":{"tables":[{"identifier":"catalog.schema.table1"},{"identifier":"catalog.schema.table2"}]}}"#.to_string(),
        })
        .await;
        let resource = GenieSpaceResource::new(mock.clone());

        let state = GenieSpaceModel {
            id: Some("space-1".to_string()),
            title: "stale".to_string(),
            parent_path: Some("/Workspace/Users/me".to_string()),
            sample_questions: vec!["stale question".to_string()],
            ..Default::default()
        };

        let refreshed = match resource.read(state).await.unwrap() {
            ReadOutcome::Found(state) => state,
            ReadOutcome::Removed => panic!("space should exist"),
        };
        assert_eq!(refreshed.id.as_deref(), Some("space-1"));
        assert_eq!(refreshed.space_id.as_deref(), Some("space-1"));
        assert_eq!(refreshed.title, "My Genie Space");
        assert_eq!(refreshed.warehouse_id, "abc123");
        assert_eq!(refreshed.description.as_deref(), Some("A test space"));
        assert_eq!(
            refreshed.tables,
            vec!["catalog.schema.table1", "catalog.schema.table2"]
        );
        assert!(refreshed.sample_questions.is_empty());
        assert_eq!(
            refreshed.parent_path.as_deref(),
            Some("/Workspace/Users/me")
        );
    }

    #[tokio::test]
    async fn test_read_missing_space_is_removed() {
        let (_mock, resource) = setup();
        let state = GenieSpaceModel {
            id: Some("gone".to_string()),
            ..plan()
        };

        let outcome = resource.read(state).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Removed);
    }

    #[tokio::test]
    async fn test_read_api_failure_is_fatal() {
        let (mock, resource) = setup();
        let created = resource.create(plan()).await.unwrap();
        mock.fail(
            MockOperation::GetSpace,
            ApiError::new(503, "TEMPORARILY_UNAVAILABLE", "try later"),
        )
        .await;

        let err = resource.read(created).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to read genie space"));
    }

    #[tokio::test]
    async fn test_read_malformed_document_is_fatal() {
        let (mock, resource) = setup();
        let created = resource.create(plan()).await.unwrap();
        let id = created.id.clone().unwrap();
        mock.modify_space(&id, |space| space.serialized_space = "{broken".to_string())
            .await;

        let err = resource.read(created).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedDocument(_)));
    }

    #[tokio::test]
    async fn test_read_without_id_fails() {
        let (_mock, resource) = setup();
        assert_err!(resource.read(plan()).await);
    }

    #[tokio::test]
    async fn test_read_detects_truncated_tables() {
        let (mock, resource) = setup();
        let created = resource
            .create(GenieSpaceModel {
                tables: TPCH_TABLES.iter().map(|t| t.to_string()).collect(),
                sample_questions: vec![
                    "Show total revenue by month".to_string(),
                    "What are the top 10 customers?".to_string(),
                ],
                ..plan()
            })
            .await
            .unwrap();
        let id = created.id.clone().unwrap();

        mock.modify_space(&id, |space| {
            let mut document: Value = serde_json::from_str(&space.serialized_space).unwrap();
            let tables = document["data_sources"]["tables"].as_array_mut().unwrap();
            tables.truncate(1);
            space.serialized_space = document.to_string();
        })
        .await;

        let refreshed = resource.read(created).await.unwrap().into_option().unwrap();
        assert_eq!(refreshed.tables, vec!["samples.tpch.customer"]);
        assert_eq!(refreshed.sample_questions.len(), 2);
    }

    #[tokio::test]
    async fn test_read_detects_removed_questions() {
        let (mock, resource) = setup();
        let created = resource.create(plan()).await.unwrap();
        let id = created.id.clone().unwrap();

        mock.modify_space(&id, |space| {
            let mut document: Value = serde_json::from_str(&space.serialized_space).unwrap();
            document["config"]
                .as_object_mut()
                .unwrap()
                .remove("sample_questions");
            space.serialized_space = document.to_string();
        })
        .await;

        let refreshed = resource.read(created).await.unwrap().into_option().unwrap();
        assert!(refreshed.sample_questions.is_empty());
        assert_eq!(refreshed.tables, vec!["catalog.schema.table1"]);
    }

    #[tokio::test]
    async fn test_update_replaces_document_and_keeps_identity() {
        let (mock, resource) = setup();
        let created = resource.create(plan()).await.unwrap();
        let id = created.id.clone().unwrap();
        let before = mock.space(&id).await.unwrap().serialized_space;

        let new_plan = GenieSpaceModel {
            title: "Updated Title".to_string(),
            description: None,
            tables: vec![
                "catalog.schema.table2".to_string(),
                "catalog.schema.table1".to_string(),
            ],
            ..plan()
        };
        let updated = resource.update(created, new_plan).await.unwrap();
        assert_eq!(updated.id.as_deref(), Some(id.as_str()));
        assert_eq!(updated.space_id.as_deref(), Some(id.as_str()));

        let stored = mock.space(&id).await.unwrap();
        assert_eq!(stored.title, "Updated Title");
        assert_eq!(stored.description, "");
        assert_ne!(stored.serialized_space, before);

        let contents = serialized_space::decode(&stored.serialized_space).unwrap();
        assert_eq!(
            contents.tables,
            vec!["catalog.schema.table2", "catalog.schema.table1"]
        );
        assert_eq!(contents.sample_questions, vec!["Show total revenue"]);
    }

    #[tokio::test]
    async fn test_update_missing_space_fails() {
        let (_mock, resource) = setup();
        let prior = GenieSpaceModel {
            id: Some("gone".to_string()),
            ..plan()
        };

        let err = resource.update(prior, plan()).await.unwrap_err();
        assert!(err.is_missing());
    }

    #[tokio::test]
    async fn test_delete_trashes_space() {
        let (mock, resource) = setup();
        let created = resource.create(plan()).await.unwrap();
        let id = created.id.clone().unwrap();

        assert_ok!(resource.delete(created.clone()).await);
        assert!(mock.space(&id).await.is_none());

        // A second delete finds nothing and still succeeds.
        assert_ok!(resource.delete(created).await);
    }

    #[tokio::test]
    async fn test_delete_api_failure_is_fatal() {
        let (mock, resource) = setup();
        let created = resource.create(plan()).await.unwrap();
        mock.fail(
            MockOperation::TrashSpace,
            ApiError::new(403, "PERMISSION_DENIED", "not an owner"),
        )
        .await;

        let err = resource.delete(created).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to delete genie space"));
    }

    #[test]
    fn test_import_state() {
        let resource = GenieSpaceResource::new(Arc::new(MockWorkspace::new()));
        let state = resource.import_state("space-9").unwrap();
        assert_eq!(state.id.as_deref(), Some("space-9"));
        assert!(state.tables.is_empty());
    }

    #[tokio::test]
    async fn test_data_source_reads_space() {
        let (mock, resource) = setup();
        let created = resource.create(plan()).await.unwrap();
        let data_source = GenieSpaceDataSource::new(mock.clone());

        let result = data_source
            .read(GenieSpaceDataModel {
                space_id: created.id.clone().unwrap(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.id, created.id);
        assert_eq!(result.title.as_deref(), Some("My Genie Space"));
        assert_eq!(result.warehouse_id.as_deref(), Some("abc123"));
        assert_eq!(result.description.as_deref(), Some("A test space"));
        assert_eq!(result.tables, vec!["catalog.schema.table1"]);
        assert_eq!(result.sample_questions, vec!["Show total revenue"]);
    }

    #[tokio::test]
    async fn test_data_source_missing_space_is_an_error() {
        let mock = Arc::new(MockWorkspace::new());
        let data_source = GenieSpaceDataSource::new(mock);

        let err = data_source
            .read(GenieSpaceDataModel {
                space_id: "gone".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_missing());
    }
}
