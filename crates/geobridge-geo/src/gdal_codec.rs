//! GDAL-backed package reader and FlatGeobuf writer.

use gdal::errors::GdalError;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{LayerAccess, LayerOptions, ToGdal};
use gdal::{Dataset, DriverManager};
use geobridge_core::ports::{ArchiveLayer, LayerCodec};
use geobridge_core::{BridgeError, Result};
use std::path::Path;

const CONTAINER_DRIVER: &str = "FlatGeobuf";
const DEFAULT_EPSG: u32 = 4326;

fn archive_error(path: &Path, err: GdalError, context: &str) -> BridgeError {
    BridgeError::UnreadableArchive {
        path: path.to_path_buf(),
        reason: format!("{}: {}", context, err),
    }
}

/// Reads every vector layer GDAL can open and writes FlatGeobuf containers
#[derive(Debug, Default, Clone, Copy)]
pub struct GdalCodec;

impl LayerCodec for GdalCodec {
    fn read_layers(&self, path: &Path) -> Result<Vec<ArchiveLayer>> {
        if !path.is_file() {
            return Err(BridgeError::UnreadableArchive {
                path: path.to_path_buf(),
                reason: "not a file".to_string(),
            });
        }

        let dataset =
            Dataset::open(path).map_err(|e| archive_error(path, e, "Failed to open dataset"))?;

        let mut layers = Vec::new();
        for mut layer in dataset.layers() {
            let name = layer.name();
            let epsg = layer
                .spatial_ref()
                .and_then(|srs| srs.auth_code().ok())
                .and_then(|code| u32::try_from(code).ok())
                .unwrap_or(DEFAULT_EPSG);

            let mut geometries = Vec::new();
            for feature in layer.features() {
                let Some(geometry) = feature.geometry() else {
                    continue;
                };
                let converted = geometry.to_geo().map_err(|e| {
                    archive_error(path, e, &format!("Failed to decode geometry in {}", name))
                })?;
                geometries.push(converted);
            }

            tracing::debug!(layer = %name, epsg, features = geometries.len(), "Read layer");
            layers.push(ArchiveLayer { name, epsg, geometries });
        }

        Ok(layers)
    }

    fn write_container(&self, layer: &ArchiveLayer, path: &Path) -> Result<()> {
        let encode = |e: GdalError| {
            BridgeError::Geometry(format!("Failed to write {}: {}", path.display(), e))
        };

        let driver = DriverManager::get_driver_by_name(CONTAINER_DRIVER).map_err(encode)?;
        let mut dataset = driver.create_vector_only(path).map_err(encode)?;
        let srs = SpatialRef::from_epsg(layer.epsg).map_err(encode)?;

        let mut output = dataset
            .create_layer(LayerOptions {
                name: &layer.name,
                srs: Some(&srs),
                ..Default::default()
            })
            .map_err(encode)?;

        for geometry in &layer.geometries {
            output.create_feature(geometry.to_gdal().map_err(encode)?).map_err(encode)?;
        }

        Ok(())
    }
}
