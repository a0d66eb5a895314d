//! Client for the external workflow persistence API
//!
//! The backend owns workflow identities and stores the serialized cell
//! list; this client only moves content in and out. Draft saves and
//! the final publish save share one call shape, distinguished by the
//! `type` field.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Whether a save is a draft or the publish promotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveType {
    /// Continuous draft save
    Temp,
    /// Promote the draft to an executable workflow definition
    Final,
}

/// Persisted content of one workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowContent {
    pub content: String,
}

/// Body of a save call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    /// Serialized cell list
    pub content: String,
    #[serde(rename = "type")]
    pub save_type: SaveType,
    /// Rendered preview as a data URI, when the canvas produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// An assignable executor role from the read-only catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorRole {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// The external persistence API
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// Load the persisted cell list for a workflow
    async fn fetch_content(&self, workflow_id: &str) -> Result<WorkflowContent>;

    /// Persist the cell list, as a draft or as the final publish
    async fn save_content(&self, workflow_id: &str, request: SaveRequest) -> Result<()>;

    /// Fetch the executor role catalog
    async fn fetch_roles(&self) -> Result<Vec<ExecutorRole>>;
}

/// HTTP implementation against the governance console backend
pub struct HttpWorkflowApi {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpWorkflowApi {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WorkflowApi for HttpWorkflowApi {
    async fn fetch_content(&self, workflow_id: &str) -> Result<WorkflowContent> {
        let url = format!("{}/workflows/{}/content", self.base_url, workflow_id);
        let response = self.http_client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::WorkflowNotFound(workflow_id.to_string()));
        }
        let content = response.error_for_status()?.json().await?;
        Ok(content)
    }

    async fn save_content(&self, workflow_id: &str, request: SaveRequest) -> Result<()> {
        let url = format!("{}/workflows/{}/content", self.base_url, workflow_id);
        log::debug!(
            "saving workflow '{}' ({:?}, {} bytes)",
            workflow_id,
            request.save_type,
            request.content.len()
        );
        self.http_client
            .put(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn fetch_roles(&self) -> Result<Vec<ExecutorRole>> {
        let url = format!("{}/executor-roles", self.base_url);
        let roles = self
            .http_client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(roles)
    }
}
