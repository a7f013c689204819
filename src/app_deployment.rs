//! The app deployment resource.
//!
//! Every field forces replacement, so a deployment is only ever created,
//! refreshed, and forgotten. Deployments are superseded by newer ones rather
//! than deleted, which makes delete a no-op.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::{AppsApi, CreateAppDeploymentRequest, WorkspaceClient};
use crate::error::ProviderError;
use crate::resource::Resource;
use crate::types::ReadOutcome;

/// Separator between app name and deployment id in import identifiers.
const IMPORT_SEPARATOR: char = '|';

/// State of an `app_deployment` resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppDeploymentModel {
    /// Name of the app to deploy.
    #[serde(default)]
    pub app_name: String,
    /// Workspace path of the source code to deploy.
    #[serde(default)]
    pub source_code_path: String,
    /// Arbitrary values that force a new deployment when they change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<BTreeMap<String, String>>,
    /// Identifier of the deployment (computed).
    #[serde(default)]
    pub deployment_id: Option<String>,
}

/// Deploys source code to an existing app.
pub struct AppDeploymentResource {
    client: Arc<dyn WorkspaceClient>,
}

impl AppDeploymentResource {
    /// Create the resource on top of a workspace client.
    pub fn new(client: Arc<dyn WorkspaceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for AppDeploymentResource {
    type Model = AppDeploymentModel;

    fn type_name(&self) -> &'static str {
        "app_deployment"
    }

    async fn create(
        &self,
        mut plan: AppDeploymentModel,
    ) -> Result<AppDeploymentModel, ProviderError> {
        let deployment = self
            .client
            .deploy(CreateAppDeploymentRequest {
                app_name: plan.app_name.clone(),
                source_code_path: plan.source_code_path.clone(),
            })
            .await
            .map_err(|e| ProviderError::api("failed to deploy app", e))?;

        plan.deployment_id = Some(deployment.deployment_id);
        Ok(plan)
    }

    async fn read(
        &self,
        mut state: AppDeploymentModel,
    ) -> Result<ReadOutcome<AppDeploymentModel>, ProviderError> {
        let deployment_id = state.deployment_id.clone().unwrap_or_default();
        if state.app_name.is_empty() || deployment_id.is_empty() {
            return Err(ProviderError::Validation(format!(
                "both app_name and deployment_id must be set, got app_name={:?} deployment_id={:?}",
                state.app_name, deployment_id
            )));
        }

        let deployment = match self
            .client
            .get_deployment(&state.app_name, &deployment_id)
            .await
        {
            Ok(deployment) => deployment,
            Err(e) if e.is_missing() => return Ok(ReadOutcome::Removed),
            Err(e) => return Err(ProviderError::api("failed to read app deployment", e)),
        };

        state.deployment_id = Some(deployment.deployment_id);
        state.source_code_path = deployment.source_code_path;
        Ok(ReadOutcome::Found(state))
    }

    async fn update(
        &self,
        _prior: AppDeploymentModel,
        _plan: AppDeploymentModel,
    ) -> Result<AppDeploymentModel, ProviderError> {
        Err(ProviderError::Unimplemented(
            "all fields force replacement; update should not be called".to_string(),
        ))
    }

    async fn delete(&self, _state: AppDeploymentModel) -> Result<(), ProviderError> {
        Ok(())
    }

    fn import_state(&self, id: &str) -> Result<AppDeploymentModel, ProviderError> {
        match id.split_once(IMPORT_SEPARATOR) {
            Some((app_name, deployment_id))
                if !app_name.is_empty() && !deployment_id.is_empty() =>
            {
                Ok(AppDeploymentModel {
                    app_name: app_name.to_string(),
                    deployment_id: Some(deployment_id.to_string()),
                    ..Default::default()
                })
            }
            _ => Err(ProviderError::Validation(format!(
                "expected format: app_name|deployment_id, got: {}",
                id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::AppDeployment;
    use crate::error::ApiError;
    use crate::testing::{MockOperation, MockWorkspace};
    use tokio_test::assert_ok;

    fn plan() -> AppDeploymentModel {
        AppDeploymentModel {
            app_name: "sales-dashboard".to_string(),
            source_code_path: "/Workspace/Users/me/apps/sales".to_string(),
            triggers: Some(BTreeMap::from([(
                "source_hash".to_string(),
                "abc123".to_string(),
            )])),
            ..Default::default()
        }
    }

    fn setup() -> (Arc<MockWorkspace>, AppDeploymentResource) {
        let mock = Arc::new(MockWorkspace::new());
        let resource = AppDeploymentResource::new(mock.clone());
        (mock, resource)
    }

    #[tokio::test]
    async fn test_create_records_deployment_id() {
        let (mock, resource) = setup();

        let state = resource.create(plan()).await.unwrap();
        let deployment_id = state.deployment_id.clone().unwrap();
        assert_eq!(state.triggers, plan().triggers);

        let stored = mock
            .deployment("sales-dashboard", &deployment_id)
            .await
            .unwrap();
        assert_eq!(stored.source_code_path, "/Workspace/Users/me/apps/sales");
    }

    #[tokio::test]
    async fn test_create_api_failure() {
        let (mock, resource) = setup();
        mock.fail(
            MockOperation::Deploy,
            ApiError::new(409, "RESOURCE_CONFLICT", "a deployment is already in progress"),
        )
        .await;

        let err = resource.create(plan()).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to deploy app"));
    }

    #[tokio::test]
    async fn test_read_overwrites_from_server() {
        let (mock, resource) = setup();
        mock.insert_deployment(
            "sales-dashboard",
            AppDeployment {
                deployment_id: "dep-7".to_string(),
                source_code_path: "/Workspace/Shared/sales".to_string(),
            },
        )
        .await;

        let state = AppDeploymentModel {
            deployment_id: Some("dep-7".to_string()),
            ..plan()
        };
        let refreshed = resource.read(state).await.unwrap().into_option().unwrap();
        assert_eq!(refreshed.deployment_id.as_deref(), Some("dep-7"));
        assert_eq!(refreshed.source_code_path, "/Workspace/Shared/sales");
        assert_eq!(refreshed.triggers, plan().triggers);
    }

    #[tokio::test]
    async fn test_read_missing_deployment_is_removed() {
        let (_mock, resource) = setup();
        let state = AppDeploymentModel {
            deployment_id: Some("gone".to_string()),
            ..plan()
        };

        assert_eq!(resource.read(state).await.unwrap(), ReadOutcome::Removed);
    }

    #[tokio::test]
    async fn test_read_requires_both_keys() {
        let (_mock, resource) = setup();

        let err = resource.read(plan()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(err.to_string().contains("both app_name and deployment_id"));

        let err = resource
            .read(AppDeploymentModel {
                deployment_id: Some("dep-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_read_api_failure_is_fatal() {
        let (mock, resource) = setup();
        let created = resource.create(plan()).await.unwrap();
        mock.fail(
            MockOperation::GetDeployment,
            ApiError::new(500, "INTERNAL_ERROR", "boom"),
        )
        .await;

        let err = resource.read(created).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to read app deployment"));
    }

    #[tokio::test]
    async fn test_update_is_rejected() {
        let (_mock, resource) = setup();
        let err = resource.update(plan(), plan()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unimplemented(_)));
    }

    #[tokio::test]
    async fn test_delete_is_a_no_op() {
        let (mock, resource) = setup();
        let created = resource.create(plan()).await.unwrap();
        let deployment_id = created.deployment_id.clone().unwrap();

        assert_ok!(resource.delete(created).await);
        assert!(mock
            .deployment("sales-dashboard", &deployment_id)
            .await
            .is_some());
    }

    #[test]
    fn test_import_state() {
        let resource = AppDeploymentResource::new(Arc::new(MockWorkspace::new()));

        let state = resource.import_state("sales-dashboard|dep-3").unwrap();
        assert_eq!(state.app_name, "sales-dashboard");
        assert_eq!(state.deployment_id.as_deref(), Some("dep-3"));

        // Only the first separator splits.
        let state = resource.import_state("app|dep|extra").unwrap();
        assert_eq!(state.deployment_id.as_deref(), Some("dep|extra"));

        for bad in ["sales-dashboard", "|dep-3", "app|", ""] {
            let err = resource.import_state(bad).unwrap_err();
            assert!(
                err.to_string().contains("expected format: app_name|deployment_id"),
                "{bad}: {err}"
            );
        }
    }
}
