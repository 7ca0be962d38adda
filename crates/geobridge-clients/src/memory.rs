//! In-memory collaborators for development and testing.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state. Every adapter records what it was asked to do so
//! tests can assert on call counts.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use geo::algorithm::bounding_rect::BoundingRect;
use geobridge_core::models::{
    ExtentAccumulator, ExtentBox, LayerExtent, ProjectTag, SpatialReference, StoryDocument,
    SystemDetail, SystemSummary, WebMapDocument,
};
use geobridge_core::ports::{
    ContentItem, DestinationConnector, DestinationPlatform, ExternalDiagram, FeatureRecord,
    FieldDefinition, Folder, ItemProperties, LayerField, LayerGeometry, ObjectStorage,
    PublishParameters, ServiceLayer, SourceConnector, SourceSystem,
};
use geobridge_core::{BridgeError, Result};
use geojson::FeatureCollection;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

const DESTINATION: &str = "destination platform";
const SOURCE: &str = "source system";

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Number of calls made per destination operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub searches: usize,
    pub uploads: usize,
    pub publishes: usize,
    pub deletes: usize,
    pub definition_updates: usize,
    pub edits: usize,
    pub web_maps: usize,
    pub resources: usize,
    pub stories: usize,
}

#[derive(Debug, Clone)]
struct StoredFile {
    name: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct DestinationState {
    items: Vec<ContentItem>,
    files: HashMap<String, StoredFile>,
    folders: Vec<Folder>,
    services: HashMap<String, Vec<ServiceLayer>>,
    features: HashMap<String, Vec<FeatureRecord>>,
    definitions: HashMap<String, Value>,
    web_maps: Vec<WebMapDocument>,
    stories: Vec<StoryDocument>,
    resources: Vec<String>,
    resource_bytes: HashMap<String, (String, Vec<u8>)>,
    competing_snippets: Vec<String>,
    calls: CallCounts,
}

/// In-memory destination platform bound to a single user
///
/// Clones share state, so a test can keep a handle while the pipeline owns
/// another.
#[derive(Debug, Clone)]
pub struct MemoryDestination {
    user: String,
    fail_publish: bool,
    state: Arc<RwLock<DestinationState>>,
}

impl MemoryDestination {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            fail_publish: false,
            state: Arc::new(RwLock::new(DestinationState::default())),
        }
    }

    /// Make every publish-to-layer-service call fail
    pub fn failing_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    /// Seed an item owned by this user, created an hour ago
    pub fn seed_item(&self, title: &str, item_type: &str, snippet: &str) -> String {
        let id = new_id();
        self.state.write().unwrap().items.push(ContentItem {
            id: id.clone(),
            title: title.to_string(),
            item_type: item_type.to_string(),
            snippet: snippet.to_string(),
            owner: self.user.clone(),
            url: self.item_url(&id),
            created: Utc::now() - ChronoDuration::hours(1),
        });
        id
    }

    /// Seed an item whose data file can be downloaded
    pub fn seed_file_item(
        &self,
        title: &str,
        item_type: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> String {
        let id = self.seed_item(title, item_type, "");
        self.state.write().unwrap().files.insert(
            id.clone(),
            StoredFile { name: file_name.to_string(), bytes },
        );
        id
    }

    /// Seed a layer service with one sub-layer per entry
    pub fn seed_service(&self, title: &str, layers: &[(&str, LayerGeometry)]) -> ContentItem {
        let service_url = self.service_url(title);
        let layers = layers
            .iter()
            .enumerate()
            .map(|(idx, (name, geometry))| ServiceLayer {
                id: idx as u32,
                name: name.to_string(),
                url: format!("{}/{}", service_url, idx),
                geometry_type: Some(*geometry),
                fields: vec![object_id_field()],
                extent: LayerExtent::default(),
            })
            .collect();

        let item = ContentItem {
            id: new_id(),
            title: title.to_string(),
            item_type: "Feature Service".to_string(),
            snippet: String::new(),
            owner: self.user.clone(),
            url: service_url.clone(),
            created: Utc::now() - ChronoDuration::hours(1),
        };

        let mut state = self.state.write().unwrap();
        state.services.insert(service_url, layers);
        state.items.push(item.clone());
        item
    }

    /// The next upload carrying `snippet` races with an identical, slightly
    /// older upload
    pub fn compete_on(&self, snippet: &str) {
        self.state.write().unwrap().competing_snippets.push(snippet.to_string());
    }

    pub fn calls(&self) -> CallCounts {
        self.state.read().unwrap().calls
    }

    pub fn items(&self) -> Vec<ContentItem> {
        self.state.read().unwrap().items.clone()
    }

    pub fn items_with_snippet(&self, snippet: &str) -> Vec<ContentItem> {
        self.items().into_iter().filter(|i| i.snippet == snippet).collect()
    }

    pub fn folders(&self) -> Vec<Folder> {
        self.state.read().unwrap().folders.clone()
    }

    pub fn web_maps(&self) -> Vec<WebMapDocument> {
        self.state.read().unwrap().web_maps.clone()
    }

    pub fn stories(&self) -> Vec<StoryDocument> {
        self.state.read().unwrap().stories.clone()
    }

    pub fn resources(&self) -> Vec<String> {
        self.state.read().unwrap().resources.clone()
    }

    /// Content type and bytes of an attached resource
    pub fn resource_content(&self, resource: &str) -> Option<(String, Vec<u8>)> {
        self.state.read().unwrap().resource_bytes.get(resource).cloned()
    }

    pub fn features(&self, layer_url: &str) -> Vec<FeatureRecord> {
        self.state.read().unwrap().features.get(layer_url).cloned().unwrap_or_default()
    }

    pub fn definition(&self, layer_url: &str) -> Option<Value> {
        self.state.read().unwrap().definitions.get(layer_url).cloned()
    }

    fn item_url(&self, id: &str) -> String {
        format!("https://memory.local/home/item.html?id={}", id)
    }

    fn service_url(&self, name: &str) -> String {
        let slug: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("https://services.memory.local/{}/rest/services/{}/FeatureServer", self.user, slug)
    }

    fn not_found(item_id: &str) -> BridgeError {
        BridgeError::ItemNotFound { item_id: item_id.to_string() }
    }
}

fn object_id_field() -> LayerField {
    LayerField {
        name: "ObjectID".to_string(),
        field_type: "esriFieldTypeOID".to_string(),
        alias: Some("ObjectID".to_string()),
    }
}

/// Extract `field:value` or `field:"quoted value"` from a search query
fn query_term<'a>(query: &'a str, field: &str) -> Option<&'a str> {
    let marker = format!("{}:", field);
    let start = query.find(&marker)? + marker.len();
    let rest = &query[start..];
    match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next(),
        None => rest.split_whitespace().next(),
    }
}

fn layer_kind(geometry: Option<&geojson::Geometry>) -> Option<LayerGeometry> {
    match &geometry?.value {
        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => {
            Some(LayerGeometry::Polygon)
        }
        geojson::Value::LineString(_) | geojson::Value::MultiLineString(_) => {
            Some(LayerGeometry::Polyline)
        }
        geojson::Value::Point(_) | geojson::Value::MultiPoint(_) => Some(LayerGeometry::Point),
        geojson::Value::GeometryCollection(_) => None,
    }
}

fn layer_fields(kind: Option<LayerGeometry>, declared: &[FieldDefinition]) -> Vec<LayerField> {
    let mut fields = vec![object_id_field()];
    for field in declared {
        let keep = match field.name.as_str() {
            "ObjectID" => false,
            "Shape__Area" => kind == Some(LayerGeometry::Polygon),
            "Shape__Length" => {
                matches!(kind, Some(LayerGeometry::Polygon) | Some(LayerGeometry::Polyline))
            }
            _ => true,
        };
        if keep {
            fields.push(LayerField {
                name: field.name.clone(),
                field_type: field.field_type.clone(),
                alias: None,
            });
        }
    }
    fields
}

/// Split an uploaded collection into sub-layers by geometry kind
fn build_layers(
    service_url: &str,
    name: &str,
    collection: &FeatureCollection,
    declared: &[FieldDefinition],
) -> Vec<(ServiceLayer, Vec<FeatureRecord>)> {
    let mut order: Vec<Option<LayerGeometry>> = Vec::new();
    let mut groups: HashMap<Option<LayerGeometry>, Vec<&geojson::Feature>> = HashMap::new();
    for feature in &collection.features {
        let kind = layer_kind(feature.geometry.as_ref());
        if !order.contains(&kind) {
            order.push(kind);
        }
        groups.entry(kind).or_default().push(feature);
    }

    order
        .into_iter()
        .enumerate()
        .map(|(idx, kind)| {
            let features = groups.remove(&kind).unwrap_or_default();
            let mut extent = ExtentAccumulator::new();
            let mut records = Vec::with_capacity(features.len());

            for (n, feature) in features.iter().enumerate() {
                let bounds = feature
                    .geometry
                    .as_ref()
                    .and_then(|g| geo::Geometry::<f64>::try_from(&g.value).ok())
                    .and_then(|g| g.bounding_rect());
                if let Some(rect) = bounds {
                    extent.include_box(&ExtentBox {
                        xmin: rect.min().x,
                        ymin: rect.min().y,
                        xmax: rect.max().x,
                        ymax: rect.max().y,
                        spatial_reference: SpatialReference::default(),
                    });
                }

                let mut attributes = feature.properties.clone().unwrap_or_default();
                let object_id = n as i64 + 1;
                attributes.insert("ObjectID".to_string(), Value::from(object_id));
                records.push(FeatureRecord { object_id, attributes });
            }

            let layer = ServiceLayer {
                id: idx as u32,
                name: match kind {
                    Some(k) => format!("{}_{}", name, k.feature_type()),
                    None => name.to_string(),
                },
                url: format!("{}/{}", service_url, idx),
                geometry_type: kind,
                fields: layer_fields(kind, declared),
                extent: extent.extent().map(LayerExtent::from).unwrap_or_default(),
            };
            (layer, records)
        })
        .collect()
}

#[async_trait]
impl DestinationPlatform for MemoryDestination {
    async fn current_user(&self) -> Result<String> {
        Ok(self.user.clone())
    }

    async fn search_content(&self, query: &str, item_type: &str) -> Result<Vec<ContentItem>> {
        let snippet = query_term(query, "snippet");
        let owner = query_term(query, "owner");

        let mut state = self.state.write().unwrap();
        state.calls.searches += 1;

        Ok(state
            .items
            .iter()
            .filter(|item| item.item_type == item_type)
            .filter(|item| owner.map(|o| item.owner == o).unwrap_or(true))
            .filter(|item| snippet.map(|s| item.snippet.contains(s)).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn get_item(&self, item_id: &str) -> Result<Option<ContentItem>> {
        Ok(self.state.read().unwrap().items.iter().find(|i| i.id == item_id).cloned())
    }

    async fn download_item(&self, item_id: &str, dir: &Path) -> Result<PathBuf> {
        let file = self
            .state
            .read()
            .unwrap()
            .files
            .get(item_id)
            .cloned()
            .ok_or_else(|| Self::not_found(item_id))?;

        let path = dir.join(&file.name);
        tokio::fs::write(&path, &file.bytes).await?;
        Ok(path)
    }

    async fn find_or_create_folder(&self, title: &str) -> Result<Folder> {
        let mut state = self.state.write().unwrap();
        if let Some(folder) = state.folders.iter().find(|f| f.title == title) {
            return Ok(folder.clone());
        }

        let folder = Folder { id: new_id(), title: title.to_string() };
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn add_item_from_file(
        &self,
        properties: &ItemProperties,
        path: &Path,
        folder: Option<&Folder>,
    ) -> Result<ContentItem> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| properties.title.clone());

        let mut state = self.state.write().unwrap();
        state.calls.uploads += 1;

        if let Some(folder) = folder {
            if !state.folders.iter().any(|f| f.id == folder.id) {
                return Err(Self::not_found(&folder.id));
            }
        }

        if let Some(pos) = state.competing_snippets.iter().position(|s| *s == properties.snippet)
        {
            state.competing_snippets.remove(pos);
            let rival = new_id();
            state.items.push(ContentItem {
                id: rival.clone(),
                title: properties.title.clone(),
                item_type: properties.item_type.clone(),
                snippet: properties.snippet.clone(),
                owner: self.user.clone(),
                url: self.item_url(&rival),
                created: Utc::now() - ChronoDuration::seconds(1),
            });
        }

        let id = new_id();
        let item = ContentItem {
            id: id.clone(),
            title: properties.title.clone(),
            item_type: properties.item_type.clone(),
            snippet: properties.snippet.clone(),
            owner: self.user.clone(),
            url: self.item_url(&id),
            created: Utc::now(),
        };
        state.files.insert(id, StoredFile { name, bytes });
        state.items.push(item.clone());
        Ok(item)
    }

    async fn publish_item(
        &self,
        item_id: &str,
        parameters: &PublishParameters,
    ) -> Result<ContentItem> {
        let mut state = self.state.write().unwrap();
        state.calls.publishes += 1;

        if self.fail_publish {
            return Err(BridgeError::upstream(DESTINATION, 500, "Publishing service unavailable"));
        }

        let source = state
            .items
            .iter()
            .find(|i| i.id == item_id)
            .cloned()
            .ok_or_else(|| Self::not_found(item_id))?;
        let file = state.files.get(item_id).cloned().ok_or_else(|| Self::not_found(item_id))?;

        let collection: FeatureCollection = serde_json::from_slice(&file.bytes).map_err(|e| {
            BridgeError::upstream(DESTINATION, 400, format!("Unable to analyze file: {}", e))
        })?;

        let service_url = self.service_url(&parameters.name);
        let mut layers = Vec::new();
        for (layer, records) in
            build_layers(&service_url, &parameters.name, &collection, &parameters.fields)
        {
            state.features.insert(layer.url.clone(), records);
            layers.push(layer);
        }
        state.services.insert(service_url.clone(), layers);

        let item = ContentItem {
            id: new_id(),
            title: parameters.name.clone(),
            item_type: "Feature Service".to_string(),
            snippet: source.snippet,
            owner: self.user.clone(),
            url: service_url,
            created: Utc::now(),
        };
        state.items.push(item.clone());
        Ok(item)
    }

    async fn delete_item(&self, item_id: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.deletes += 1;

        let before = state.items.len();
        state.items.retain(|i| i.id != item_id);
        state.files.remove(item_id);
        if state.items.len() == before {
            return Err(Self::not_found(item_id));
        }
        Ok(())
    }

    async fn service_layers(&self, service_url: &str) -> Result<Vec<ServiceLayer>> {
        self.state
            .read()
            .unwrap()
            .services
            .get(service_url)
            .cloned()
            .ok_or_else(|| Self::not_found(service_url))
    }

    async fn update_layer_definition(&self, layer_url: &str, definition: &Value) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.definition_updates += 1;
        state.definitions.insert(layer_url.to_string(), definition.clone());
        Ok(())
    }

    async fn query_features(
        &self,
        layer_url: &str,
        where_clause: &str,
    ) -> Result<Vec<FeatureRecord>> {
        tracing::debug!(layer_url, where_clause, "Querying in-memory layer");
        Ok(self.features(layer_url))
    }

    async fn apply_edits(&self, layer_url: &str, updates: &[FeatureRecord]) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.calls.edits += 1;

        let records = state
            .features
            .get_mut(layer_url)
            .ok_or_else(|| Self::not_found(layer_url))?;
        for update in updates {
            if let Some(record) = records.iter_mut().find(|r| r.object_id == update.object_id) {
                for (key, value) in &update.attributes {
                    record.attributes.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn save_web_map(
        &self,
        document: &WebMapDocument,
        folder: Option<&Folder>,
    ) -> Result<ContentItem> {
        tracing::debug!(folder = ?folder.map(|f| &f.title), "Saving web map");
        let mut state = self.state.write().unwrap();
        state.calls.web_maps += 1;
        state.web_maps.push(document.clone());

        let id = new_id();
        let item = ContentItem {
            id: id.clone(),
            title: document.title.clone(),
            item_type: "Web Map".to_string(),
            snippet: document.snippet.clone(),
            owner: self.user.clone(),
            url: self.item_url(&id),
            created: Utc::now(),
        };
        state.items.push(item.clone());
        Ok(item)
    }

    async fn attach_resource(&self, path: &Path, content_type: &str) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(new_id);
        tracing::debug!(name = %name, content_type, bytes = bytes.len(), "Attaching resource");

        let resource = format!("resources/{}", name);
        let mut state = self.state.write().unwrap();
        state.calls.resources += 1;
        state.resources.push(resource.clone());
        state.resource_bytes.insert(resource.clone(), (content_type.to_string(), bytes));
        Ok(resource)
    }

    async fn save_story(&self, document: &StoryDocument) -> Result<ContentItem> {
        let mut state = self.state.write().unwrap();
        state.calls.stories += 1;
        state.stories.push(document.clone());

        let id = new_id();
        let item = ContentItem {
            id: id.clone(),
            title: document.cover.title.clone(),
            item_type: "StoryMap".to_string(),
            snippet: String::new(),
            owner: self.user.clone(),
            url: format!("https://storymaps.memory.local/stories/{}", id),
            created: Utc::now(),
        };
        state.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, item_id: &str, title: &str, snippet: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| Self::not_found(item_id))?;
        item.title = title.to_string();
        item.snippet = snippet.to_string();
        Ok(())
    }
}

/// Hands out one shared in-memory destination for every token
#[derive(Debug, Clone)]
pub struct MemoryDestinationConnector {
    destination: MemoryDestination,
}

impl MemoryDestinationConnector {
    pub fn new(destination: MemoryDestination) -> Self {
        Self { destination }
    }
}

impl DestinationConnector for MemoryDestinationConnector {
    fn connect(&self, token: &str) -> Result<Arc<dyn DestinationPlatform>> {
        if token.trim().is_empty() {
            return Err(BridgeError::ConfigMissing { key: "destination_token".to_string() });
        }
        Ok(Arc::new(self.destination.clone()))
    }
}

/// Metadata of an object held by [`MemoryObjectStorage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub size: usize,
}

/// In-memory object storage bucket
#[derive(Debug, Clone)]
pub struct MemoryObjectStorage {
    cdn_endpoint: String,
    available: bool,
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

impl MemoryObjectStorage {
    pub fn new(cdn_endpoint: impl Into<String>) -> Self {
        Self {
            cdn_endpoint: cdn_endpoint.into(),
            available: true,
            objects: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// A bucket that does not exist
    pub fn unavailable(cdn_endpoint: impl Into<String>) -> Self {
        Self { available: false, ..Self::new(cdn_endpoint) }
    }

    /// Keys of every stored object, sorted
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn bucket_exists(&self) -> Result<bool> {
        Ok(self.available)
    }

    async fn put_object(&self, key: &str, path: &Path, content_type: &str) -> Result<()> {
        if !self.available {
            return Err(BridgeError::StorageUnavailable {
                reason: format!("bucket missing while uploading {}", key),
            });
        }

        let bytes = tokio::fs::read(path).await?;
        self.objects.write().unwrap().insert(
            key.to_string(),
            StoredObject { content_type: content_type.to_string(), size: bytes.len() },
        );
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.cdn_endpoint.trim_end_matches('/'), key.trim_start_matches('/'))
    }
}

/// Scripted source system that records every posted diagram
#[derive(Debug, Clone, Default)]
pub struct MemorySourceSystem {
    systems: Vec<SystemDetail>,
    tags: Vec<ProjectTag>,
    syntheses: HashMap<(String, String), FeatureCollection>,
    bounds: String,
    center: String,
    posted: Arc<RwLock<Vec<ExternalDiagram>>>,
}

impl MemorySourceSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_systems(mut self, systems: Vec<SystemDetail>) -> Self {
        self.systems = systems;
        self
    }

    pub fn with_tags(mut self, tags: Vec<ProjectTag>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_bounds(mut self, bounds: impl Into<String>, center: impl Into<String>) -> Self {
        self.bounds = bounds.into();
        self.center = center.into();
        self
    }

    pub fn with_synthesis(
        mut self,
        team_id: &str,
        synthesis_id: &str,
        collection: FeatureCollection,
    ) -> Self {
        self.syntheses.insert((team_id.to_string(), synthesis_id.to_string()), collection);
        self
    }

    /// Diagrams posted so far, oldest first
    pub fn posted(&self) -> Vec<ExternalDiagram> {
        self.posted.read().unwrap().clone()
    }
}

#[async_trait]
impl SourceSystem for MemorySourceSystem {
    async fn get_all_systems(&self) -> Result<Vec<SystemSummary>> {
        Ok(self
            .systems
            .iter()
            .map(|s| SystemSummary { id: s.id, sysname: s.name.clone(), syscolor: s.color.clone() })
            .collect())
    }

    async fn get_single_system(&self, system_id: i64) -> Result<SystemDetail> {
        self.systems
            .iter()
            .find(|s| s.id == system_id)
            .cloned()
            .ok_or_else(|| BridgeError::upstream(SOURCE, 404, format!("system {}", system_id)))
    }

    async fn get_project_bounds(&self) -> Result<String> {
        Ok(self.bounds.clone())
    }

    async fn get_project_center(&self) -> Result<String> {
        Ok(self.center.clone())
    }

    async fn get_project_tags(&self) -> Result<Vec<ProjectTag>> {
        Ok(self.tags.clone())
    }

    async fn get_single_synthesis(
        &self,
        team_id: &str,
        synthesis_id: &str,
    ) -> Result<FeatureCollection> {
        self.syntheses
            .get(&(team_id.to_string(), synthesis_id.to_string()))
            .cloned()
            .ok_or_else(|| BridgeError::upstream(SOURCE, 404, "synthesis not found"))
    }

    async fn get_single_synthesis_details(
        &self,
        team_id: &str,
        synthesis_id: &str,
    ) -> Result<Value> {
        let collection = self.get_single_synthesis(team_id, synthesis_id).await?;
        Ok(serde_json::json!({
            "id": synthesis_id,
            "cteamid": team_id,
            "diagram_count": collection.features.len(),
        }))
    }

    async fn post_as_diagram_with_external_geometries(
        &self,
        diagram: &ExternalDiagram,
    ) -> Result<()> {
        self.posted.write().unwrap().push(diagram.clone());
        Ok(())
    }
}

/// Hands out the same scripted source system for every project
#[derive(Debug, Clone)]
pub struct MemorySourceConnector {
    system: MemorySourceSystem,
}

impl MemorySourceConnector {
    pub fn new(system: MemorySourceSystem) -> Self {
        Self { system }
    }
}

impl SourceConnector for MemorySourceConnector {
    fn connect(&self, _project_id: &str, _token: &str) -> Result<Arc<dyn SourceSystem>> {
        Ok(Arc::new(self.system.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn upload_file(collection: Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", collection).unwrap();
        file
    }

    fn props(snippet: &str) -> ItemProperties {
        ItemProperties {
            title: "Design".to_string(),
            item_type: "GeoJson".to_string(),
            snippet: snippet.to_string(),
            description: String::new(),
            tags: vec![],
        }
    }

    #[test]
    fn test_query_terms() {
        let query = r#"snippet:"s9-p1" AND owner:planner"#;
        assert_eq!(query_term(query, "snippet"), Some("s9-p1"));
        assert_eq!(query_term(query, "owner"), Some("planner"));
        assert_eq!(query_term(query, "title"), None);
    }

    #[tokio::test]
    async fn test_search_is_scoped_to_owner_and_type() {
        let destination = MemoryDestination::new("planner");
        destination.seed_item("A", "GeoJson", "s9-p1");
        destination.seed_item("B", "CSV", "s9-p1");

        let hits = destination
            .search_content(r#"snippet:"s9-p1" AND owner:planner"#, "GeoJson")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let foreign = destination
            .search_content(r#"snippet:"s9-p1" AND owner:someone"#, "GeoJson")
            .await
            .unwrap();
        assert!(foreign.is_empty());
        assert_eq!(destination.calls().searches, 2);
    }

    #[tokio::test]
    async fn test_publish_splits_layers_by_geometry() {
        let destination = MemoryDestination::new("planner");
        let file = upload_file(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"system_name": "Housing"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
                {"type": "Feature", "properties": {"system_name": "Roads"},
                 "geometry": {"type": "LineString", "coordinates": [[2,2],[3,3]]}}
            ]
        }));

        let raw = destination.add_item_from_file(&props("s9-p1"), file.path(), None).await.unwrap();
        let params = PublishParameters { name: "Design".to_string(), fields: vec![] };
        let service = destination.publish_item(&raw.id, &params).await.unwrap();

        let layers = destination.service_layers(&service.url).await.unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].geometry_type, Some(LayerGeometry::Polygon));
        assert_eq!(layers[1].extent.complete().map(|b| b.xmax), Some(3.0));
        assert_eq!(destination.features(&layers[0].url).len(), 1);
    }

    #[tokio::test]
    async fn test_failing_publish_counts_call() {
        let destination = MemoryDestination::new("planner").failing_publish();
        let params = PublishParameters { name: "x".to_string(), fields: vec![] };

        assert!(destination.publish_item("missing", &params).await.is_err());
        assert_eq!(destination.calls().publishes, 1);
    }

    #[tokio::test]
    async fn test_competing_upload_creates_older_rival() {
        let destination = MemoryDestination::new("planner");
        destination.compete_on("s9-p1");
        let file = upload_file(json!({"type": "FeatureCollection", "features": []}));

        let ours = destination.add_item_from_file(&props("s9-p1"), file.path(), None).await.unwrap();
        let all = destination.items_with_snippet("s9-p1");
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|i| i.id != ours.id && i.created < ours.created));
    }

    #[tokio::test]
    async fn test_storage_urls_and_availability() {
        let storage = MemoryObjectStorage::new("https://cdn.example.com/");
        assert_eq!(
            storage.object_url("/projects/p1/systems/3/a.fgb"),
            "https://cdn.example.com/projects/p1/systems/3/a.fgb"
        );
        assert!(storage.bucket_exists().await.unwrap());

        let missing = MemoryObjectStorage::unavailable("https://cdn.example.com");
        assert!(!missing.bucket_exists().await.unwrap());
        let file = NamedTempFile::new().unwrap();
        let result = missing.put_object("k", file.path(), "application/octet-stream").await;
        assert!(matches!(result, Err(BridgeError::StorageUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_source_system_records_posts() {
        let source = MemorySourceSystem::new();
        let connector = MemorySourceConnector::new(source.clone());
        let client = connector.connect("p1", "tok").unwrap();

        client
            .post_as_diagram_with_external_geometries(&ExternalDiagram {
                url: "https://cdn.example.com/a.fgb".to_string(),
                layer_type: geobridge_core::ports::ExternalLayerType::FlatgeobufUrl,
                project_or_policy: geobridge_core::models::AreaType::Project,
                feature_type: "polygon".to_string(),
                description: "Parcels".to_string(),
                system_id: 3,
                funding_type: "o".to_string(),
                cost: 0.0,
                cost_type: "total".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(source.posted().len(), 1);
    }
}
