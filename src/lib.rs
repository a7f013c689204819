//! Workspace Provider
//!
//! Resource and data source adapters for managing workspace objects from an
//! infrastructure-as-code framework. The framework owns planning, schemas,
//! and the plugin protocol; this crate owns the mapping between declared
//! configuration and remote API calls.
//!
//! # Overview
//!
//! - **`databricks_genie_space`** (resource and data source): a Genie space
//!   whose tables and sample questions live in one serialized JSON document
//!   on the remote object (see [`serialized_space`])
//! - **`databricks_app_deployment`**: a deployment of an existing app
//! - **`databricks_metric_view`**: a metric view created through SQL DDL
//! - **`databricks_sql_execution`**: an object managed by user-supplied SQL
//!
//! [`WorkspaceProvider`] dispatches framework calls by type name. Remote
//! access goes through the [`WorkspaceClient`] traits, which a binding
//! implements on top of the vendor SDK and [`testing::MockWorkspace`]
//! implements in memory.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use workspace_provider::testing::MockWorkspace;
//! use workspace_provider::WorkspaceProvider;
//!
//! # tokio_test::block_on(async {
//! let provider = WorkspaceProvider::new(Arc::new(MockWorkspace::new()));
//!
//! let state = provider
//!     .create(
//!         "databricks_genie_space",
//!         json!({"title": "Sales", "warehouse_id": "abc123", "tables": ["main.sales.orders"]}),
//!     )
//!     .await
//!     .unwrap();
//!
//! let refreshed = provider.read("databricks_genie_space", state).await.unwrap();
//! assert!(refreshed.is_some());
//! # });
//! ```
//!
//! # Drift
//!
//! Every read overwrites local state from the server. When the remote object
//! is gone, [`WorkspaceProvider::read`] returns `None` and the framework
//! drops the resource from state instead of reporting an error. Deleting an
//! object that is already gone succeeds.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app_deployment;
pub mod client;
pub mod error;
pub mod genie_space;
pub mod logging;
pub mod metric_view;
pub mod provider;
pub mod resource;
pub mod serialized_space;
pub mod sql_execution;
pub mod statement;
pub mod testing;
pub mod types;

// Re-export main types at crate root
pub use client::{AppsApi, GenieApi, StatementExecutionApi, WorkspaceClient};
pub use error::{ApiError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::WorkspaceProvider;
pub use resource::{DataSource, Resource};
pub use types::{ImportedResource, ProviderMetadata, ProviderOptions, ReadOutcome};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
