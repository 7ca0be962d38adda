//! Package-layer adapter: multi-layer archives to binary geometry containers
//! in object storage, referenced back into the source system.

use async_trait::async_trait;
use geo::Geometry;
use geobridge_core::models::{ImportFormat, MigrationBatch, MigrationItem, SessionId};
use geobridge_core::ports::{
    ArchiveLayer, DestinationPlatform, ExternalDiagram, ExternalLayerType, LayerCodec,
    LayerGeometry, ObjectStorage, SourceConnector,
};
use geobridge_core::{BridgeError, Result};
use geobridge_geo::{explode, simplify, Reprojector};
use geobridge_store::ProgressLogger;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{run_batch, BatchSummary, ImportAdapter, COST_TYPE, FUNDING_TYPE};
use crate::settings::PipelineSettings;

const CONTAINER_CONTENT_TYPE: &str = "application/octet-stream";

/// A layer written to disk in both resolutions
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedLayer {
    pub name: String,
    pub geometry: LayerGeometry,
    pub full_path: PathBuf,
    pub simplified_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerOutcome {
    Empty(String),
    Prepared(PreparedLayer),
}

pub struct PackageImporter {
    destination: Arc<dyn DestinationPlatform>,
    storage: Arc<dyn ObjectStorage>,
    sources: Arc<dyn SourceConnector>,
    codec: Arc<dyn LayerCodec>,
    logger: ProgressLogger,
    settings: PipelineSettings,
}

impl PackageImporter {
    pub fn new(
        destination: Arc<dyn DestinationPlatform>,
        storage: Arc<dyn ObjectStorage>,
        sources: Arc<dyn SourceConnector>,
        codec: Arc<dyn LayerCodec>,
        logger: ProgressLogger,
        settings: PipelineSettings,
    ) -> Self {
        Self { destination, storage, sources, codec, logger, settings }
    }

    pub async fn run(&self, batch: &MigrationBatch) -> Result<BatchSummary> {
        run_batch(self, batch, &self.settings.scratch_dir, &self.logger).await
    }

    async fn upload(&self, key: &str, path: &Path, session: &SessionId) -> Result<()> {
        self.storage.put_object(key, path, CONTAINER_CONTENT_TYPE).await?;
        self.logger.log(format!("Uploaded {}", key), session).await;
        Ok(())
    }
}

#[async_trait]
impl ImportAdapter for PackageImporter {
    fn format(&self) -> ImportFormat {
        ImportFormat::GeoPackage
    }

    async fn preflight(&self, session: &SessionId) -> Result<()> {
        match self.storage.bucket_exists().await {
            Ok(true) => {
                self.logger.log("Connected to object storage", session).await;
                Ok(())
            }
            Ok(false) => Err(BridgeError::StorageUnavailable {
                reason: "the configured bucket does not exist".to_string(),
            }),
            Err(e) => Err(BridgeError::StorageUnavailable { reason: e.to_string() }),
        }
    }

    async fn import_item(
        &self,
        item: &MigrationItem,
        scratch: &Path,
        session: &SessionId,
    ) -> Result<usize> {
        let content = self
            .destination
            .get_item(&item.source_id)
            .await?
            .ok_or_else(|| BridgeError::ItemNotFound { item_id: item.source_id.clone() })?;

        let item_dir = scratch.join(&content.id);
        tokio::fs::create_dir_all(&item_dir).await?;
        let archive = self.destination.download_item(&content.id, &item_dir).await?;
        self.logger.log(format!("Downloaded {}", content.title), session).await;

        let codec = self.codec.clone();
        let (target_epsg, tolerance) =
            (self.settings.target_epsg, self.settings.simplify_tolerance);
        let out_dir = item_dir.clone();
        let outcomes = tokio::task::spawn_blocking(move || {
            prepare_layers(codec.as_ref(), &archive, &out_dir, target_epsg, tolerance)
        })
        .await
        .map_err(|e| BridgeError::Geometry(format!("Layer preparation task failed: {}", e)))??;

        let source = self.sources.connect(&item.target_project_id, &item.target_api_token)?;
        let prefix = format!("projects/{}/systems/{}", item.target_project_id, item.target_system);
        let mut posted = 0;

        for outcome in outcomes {
            let layer = match outcome {
                LayerOutcome::Empty(name) => {
                    self.logger.log(format!("Skipping empty layer {}", name), session).await;
                    continue;
                }
                LayerOutcome::Prepared(layer) => layer,
            };

            let full_key = object_key(&prefix, &layer.full_path)?;
            let simplified_key = object_key(&prefix, &layer.simplified_path)?;
            self.upload(&full_key, &layer.full_path, session).await?;
            self.upload(&simplified_key, &layer.simplified_path, session).await?;

            let diagram = ExternalDiagram {
                url: self.storage.object_url(&simplified_key),
                layer_type: ExternalLayerType::FlatgeobufUrl,
                project_or_policy: item.target_project_or_policy,
                feature_type: layer.geometry.feature_type().to_string(),
                description: format!("{} - {}", item.source_title, layer.name),
                system_id: item.target_system,
                funding_type: FUNDING_TYPE.to_string(),
                cost: 0.0,
                cost_type: COST_TYPE.to_string(),
            };
            source.post_as_diagram_with_external_geometries(&diagram).await?;
            self.logger.log(format!("Posted diagram for layer {}", layer.name), session).await;
            posted += 1;
        }

        Ok(posted)
    }
}

/// Read every layer of `archive` and write full and simplified containers
/// for the non-empty ones. Geometries are exploded into single parts and
/// reprojected to `target_epsg`; attributes are dropped.
pub fn prepare_layers(
    codec: &dyn LayerCodec,
    archive: &Path,
    out_dir: &Path,
    target_epsg: u32,
    tolerance: f64,
) -> Result<Vec<LayerOutcome>> {
    let stem = archive
        .file_stem()
        .map(|s| slug(&s.to_string_lossy()))
        .unwrap_or_else(|| "archive".to_string());
    let extension = codec.container_extension().to_string();

    let mut outcomes = Vec::new();
    for layer in codec.read_layers(archive)? {
        if layer.is_empty() {
            outcomes.push(LayerOutcome::Empty(layer.name));
            continue;
        }

        let reprojector = Reprojector::new(layer.epsg, target_epsg)?;
        let mut geometries = Vec::with_capacity(layer.geometries.len());
        for geometry in layer.geometries.into_iter().flat_map(explode) {
            geometries.push(reprojector.reproject(&geometry)?);
        }

        let Some(geometry) = geometries.iter().find_map(layer_geometry) else {
            outcomes.push(LayerOutcome::Empty(layer.name));
            continue;
        };

        let base = format!("{}_{}", stem, slug(&layer.name));
        let full_path = out_dir.join(format!("{}.{}", base, extension));
        let simplified_path = out_dir.join(format!("{}_simplified.{}", base, extension));

        let simplified = ArchiveLayer {
            name: layer.name.clone(),
            epsg: target_epsg,
            geometries: geometries.iter().map(|g| simplify(g, tolerance)).collect(),
        };
        let full = ArchiveLayer { name: layer.name.clone(), epsg: target_epsg, geometries };

        codec.write_container(&full, &full_path)?;
        codec.write_container(&simplified, &simplified_path)?;
        tracing::debug!(layer = %full.name, features = full.geometries.len(), "Prepared layer");

        outcomes.push(LayerOutcome::Prepared(PreparedLayer {
            name: full.name,
            geometry,
            full_path,
            simplified_path,
        }));
    }
    Ok(outcomes)
}

fn layer_geometry(geometry: &Geometry<f64>) -> Option<LayerGeometry> {
    match geometry {
        Geometry::Polygon(_)
        | Geometry::MultiPolygon(_)
        | Geometry::Rect(_)
        | Geometry::Triangle(_) => Some(LayerGeometry::Polygon),
        Geometry::LineString(_) | Geometry::MultiLineString(_) | Geometry::Line(_) => {
            Some(LayerGeometry::Polyline)
        }
        Geometry::Point(_) | Geometry::MultiPoint(_) => Some(LayerGeometry::Point),
        Geometry::GeometryCollection(gc) => gc.0.iter().find_map(layer_geometry),
    }
}

fn object_key(prefix: &str, path: &Path) -> Result<String> {
    let name = path.file_name().ok_or_else(|| BridgeError::UnreadableArchive {
        path: path.to_path_buf(),
        reason: "container has no file name".to_string(),
    })?;
    Ok(format!("{}/{}", prefix, name.to_string_lossy()))
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
