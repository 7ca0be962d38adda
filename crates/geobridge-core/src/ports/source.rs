use async_trait::async_trait;
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{AreaType, ProjectData, ProjectTag, SystemDetail, SystemSummary};

/// How an externally referenced diagram is stored by the source system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalLayerType {
    /// A binary geometry container served from object storage
    FlatgeobufUrl,
    /// A live layer of a remote layer service
    FeatureLayer,
}

/// Request body for posting a diagram that references remote geometries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDiagram {
    pub url: String,
    pub layer_type: ExternalLayerType,
    pub project_or_policy: AreaType,
    pub feature_type: String,
    pub description: String,
    #[serde(rename = "sysid")]
    pub system_id: i64,
    #[serde(rename = "fundingtype")]
    pub funding_type: String,
    pub cost: f64,
    #[serde(rename = "costtype")]
    pub cost_type: String,
}

/// Port for the source system REST API, bound to one project and token
///
/// Any non-200 answer surfaces as [`crate::BridgeError::Upstream`].
#[async_trait]
pub trait SourceSystem: Send + Sync {
    async fn get_all_systems(&self) -> Result<Vec<SystemSummary>>;

    async fn get_single_system(&self, system_id: i64) -> Result<SystemDetail>;

    async fn get_project_bounds(&self) -> Result<String>;

    async fn get_project_center(&self) -> Result<String>;

    async fn get_project_tags(&self) -> Result<Vec<ProjectTag>>;

    /// Feature collection of a negotiated design
    async fn get_single_synthesis(
        &self,
        team_id: &str,
        synthesis_id: &str,
    ) -> Result<FeatureCollection>;

    /// Descriptive metadata of a negotiated design
    async fn get_single_synthesis_details(
        &self,
        team_id: &str,
        synthesis_id: &str,
    ) -> Result<serde_json::Value>;

    async fn post_as_diagram_with_external_geometries(
        &self,
        diagram: &ExternalDiagram,
    ) -> Result<()>;

    /// Systems, per-system details, bounds, center and tags in one record
    async fn download_project_data(&self) -> Result<ProjectData> {
        let systems = self.get_all_systems().await?;
        let mut system_details = Vec::with_capacity(systems.len());
        for system in &systems {
            system_details.push(self.get_single_system(system.id).await?);
        }

        Ok(ProjectData {
            systems,
            system_details,
            bounds: self.get_project_bounds().await?,
            center: self.get_project_center().await?,
            tags: self.get_project_tags().await?,
        })
    }
}

/// Creates source system clients for a project and its API token
pub trait SourceConnector: Send + Sync {
    fn connect(&self, project_id: &str, token: &str) -> Result<Arc<dyn SourceSystem>>;
}
