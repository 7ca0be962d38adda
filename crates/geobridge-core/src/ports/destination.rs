use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{LayerExtent, StoryDocument, WebMapDocument};

/// An item in the destination platform's content catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub item_type: String,
    pub snippet: String,
    pub owner: String,
    pub url: String,
    pub created: DateTime<Utc>,
}

/// Properties for creating a new item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemProperties {
    pub title: String,
    pub item_type: String,
    pub snippet: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub title: String,
}

/// Declared column of a published layer service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "sqlType")]
    pub sql_type: String,
}

/// Parameters for turning an uploaded item into a layer service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishParameters {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

/// Geometry kinds of a layer service sub-layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerGeometry {
    #[serde(rename = "esriGeometryPolygon")]
    Polygon,
    #[serde(rename = "esriGeometryPolyline")]
    Polyline,
    #[serde(rename = "esriGeometryPoint")]
    Point,
}

impl LayerGeometry {
    /// Name used by the source system for the diagram feature type
    pub fn feature_type(&self) -> &'static str {
        match self {
            LayerGeometry::Polygon => "polygon",
            LayerGeometry::Polyline => "polyline",
            LayerGeometry::Point => "point",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub alias: Option<String>,
}

/// A sub-layer of a layer service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLayer {
    pub id: u32,
    pub name: String,
    pub url: String,
    pub geometry_type: Option<LayerGeometry>,
    pub fields: Vec<LayerField>,
    pub extent: LayerExtent,
}

/// A stored feature's attributes, addressed by object id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub object_id: i64,
    pub attributes: Map<String, Value>,
}

/// Port for the destination GIS platform, bound to one user's token
#[async_trait]
pub trait DestinationPlatform: Send + Sync {
    /// User name owning the token
    async fn current_user(&self) -> Result<String>;

    /// Content search by query string and item type
    async fn search_content(&self, query: &str, item_type: &str) -> Result<Vec<ContentItem>>;

    async fn get_item(&self, item_id: &str) -> Result<Option<ContentItem>>;

    /// Download an item's data file into `dir`
    async fn download_item(&self, item_id: &str, dir: &Path) -> Result<PathBuf>;

    async fn find_or_create_folder(&self, title: &str) -> Result<Folder>;

    async fn add_item_from_file(
        &self,
        properties: &ItemProperties,
        path: &Path,
        folder: Option<&Folder>,
    ) -> Result<ContentItem>;

    /// Publish an uploaded item as a queryable layer service
    async fn publish_item(
        &self,
        item_id: &str,
        parameters: &PublishParameters,
    ) -> Result<ContentItem>;

    async fn delete_item(&self, item_id: &str) -> Result<()>;

    /// Sub-layers of a layer service URL
    async fn service_layers(&self, service_url: &str) -> Result<Vec<ServiceLayer>>;

    /// Replace part of a layer's definition, such as its renderer
    async fn update_layer_definition(&self, layer_url: &str, definition: &Value) -> Result<()>;

    async fn query_features(&self, layer_url: &str, where_clause: &str)
        -> Result<Vec<FeatureRecord>>;

    async fn apply_edits(&self, layer_url: &str, updates: &[FeatureRecord]) -> Result<()>;

    async fn save_web_map(
        &self,
        document: &WebMapDocument,
        folder: Option<&Folder>,
    ) -> Result<ContentItem>;

    /// Attach a local file as a resource usable in story documents
    async fn attach_resource(&self, path: &Path, content_type: &str) -> Result<String>;

    async fn save_story(&self, document: &StoryDocument) -> Result<ContentItem>;

    async fn update_item(&self, item_id: &str, title: &str, snippet: &str) -> Result<()>;
}

/// Creates destination platform clients for a user token
pub trait DestinationConnector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Arc<dyn DestinationPlatform>>;
}
