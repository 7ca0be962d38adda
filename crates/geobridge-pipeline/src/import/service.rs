//! Live-service adapter: references sub-layers of an existing layer service
//! without downloading anything.

use async_trait::async_trait;
use geobridge_core::models::{ImportFormat, MigrationBatch, MigrationItem, SessionId};
use geobridge_core::ports::{
    DestinationPlatform, ExternalDiagram, ExternalLayerType, ServiceLayer, SourceConnector,
};
use geobridge_core::{BridgeError, Result};
use geobridge_store::ProgressLogger;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{run_batch, BatchSummary, ImportAdapter, COST_TYPE, FUNDING_TYPE};

pub struct ServiceImporter {
    destination: Arc<dyn DestinationPlatform>,
    sources: Arc<dyn SourceConnector>,
    logger: ProgressLogger,
    scratch_root: PathBuf,
}

impl ServiceImporter {
    pub fn new(
        destination: Arc<dyn DestinationPlatform>,
        sources: Arc<dyn SourceConnector>,
        logger: ProgressLogger,
        scratch_root: PathBuf,
    ) -> Self {
        Self { destination, sources, logger, scratch_root }
    }

    pub async fn run(&self, batch: &MigrationBatch) -> Result<BatchSummary> {
        run_batch(self, batch, &self.scratch_root, &self.logger).await
    }

    /// Sub-layers of a layer service item
    pub async fn list_layers(&self, service_item_id: &str) -> Result<Vec<ServiceLayer>> {
        let item = self
            .destination
            .get_item(service_item_id)
            .await?
            .ok_or_else(|| BridgeError::ItemNotFound { item_id: service_item_id.to_string() })?;
        self.destination.service_layers(&item.url).await
    }

    /// Resolve an item to the sub-layers it names: a sub-layer URL selects one
    /// layer, an item id selects every layer of the service
    async fn resolve_layers(&self, item: &MigrationItem) -> Result<Vec<ServiceLayer>> {
        match split_layer_url(&item.source_id) {
            Some((service_url, layer_id)) => {
                let layer = self
                    .destination
                    .service_layers(service_url)
                    .await?
                    .into_iter()
                    .find(|layer| layer.id == layer_id)
                    .ok_or_else(|| BridgeError::ItemNotFound { item_id: item.source_id.clone() })?;
                Ok(vec![layer])
            }
            None => self.list_layers(&item.source_id).await,
        }
    }
}

/// One migration item per chosen sub-layer, each referencing the sub-layer URL
pub fn select_layers(
    item: &MigrationItem,
    layers: &[ServiceLayer],
    chosen: &[u32],
) -> Vec<MigrationItem> {
    layers
        .iter()
        .filter(|layer| chosen.contains(&layer.id))
        .map(|layer| MigrationItem {
            source_id: layer.url.clone(),
            source_title: format!("{} - {}", item.source_title, layer.name),
            ..item.clone()
        })
        .collect()
}

/// Split `.../FeatureServer/3` into the service URL and layer id
fn split_layer_url(source: &str) -> Option<(&str, u32)> {
    if !source.starts_with("http") {
        return None;
    }
    let (service_url, id) = source.trim_end_matches('/').rsplit_once('/')?;
    Some((service_url, id.parse().ok()?))
}

#[async_trait]
impl ImportAdapter for ServiceImporter {
    fn format(&self) -> ImportFormat {
        ImportFormat::FeatureService
    }

    async fn import_item(
        &self,
        item: &MigrationItem,
        _scratch: &Path,
        session: &SessionId,
    ) -> Result<usize> {
        let layers = self.resolve_layers(item).await?;
        let source = self.sources.connect(&item.target_project_id, &item.target_api_token)?;
        let mut posted = 0;

        for layer in &layers {
            let Some(geometry) = layer.geometry_type else {
                self.logger.log(format!("Skipping table layer {}", layer.name), session).await;
                continue;
            };

            let description = if layers.len() == 1 {
                item.source_title.clone()
            } else {
                format!("{} - {}", item.source_title, layer.name)
            };
            let diagram = ExternalDiagram {
                url: layer.url.clone(),
                layer_type: ExternalLayerType::FeatureLayer,
                project_or_policy: item.target_project_or_policy,
                feature_type: geometry.feature_type().to_string(),
                description,
                system_id: item.target_system,
                funding_type: FUNDING_TYPE.to_string(),
                cost: 0.0,
                cost_type: COST_TYPE.to_string(),
            };
            source.post_as_diagram_with_external_geometries(&diagram).await?;
            self.logger.log(format!("Referenced layer {}", layer.url), session).await;
            posted += 1;
        }

        Ok(posted)
    }
}
