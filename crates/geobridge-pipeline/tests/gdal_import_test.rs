//! GeoPackage batches through the GDAL codec of the default build
#![cfg(feature = "gdal")]

mod common;

use common::{Harness, CDN};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{LayerAccess, LayerOptions, ToGdal};
use gdal::DriverManager;
use geo::{polygon, Geometry};
use geobridge_core::models::{
    AreaType, ImportFormat, MigrationBatch, MigrationItem, RunOutcome, SessionId,
};
use geobridge_core::ports::ExternalLayerType;
use geobridge_geo::gdal_codec::GdalCodec;
use geobridge_pipeline::{MigrationRunner, PipelineRunner, UnitOfWork};
use std::sync::Arc;

/// A one-layer Web Mercator package around 5°E 52°N
fn mercator_package() -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zoning.gpkg");
    {
        let driver = DriverManager::get_driver_by_name("GPKG").unwrap();
        let mut dataset = driver.create_vector_only(&path).unwrap();
        let srs = SpatialRef::from_epsg(3857).unwrap();
        let mut layer = dataset
            .create_layer(LayerOptions { name: "parcels", srs: Some(&srs), ..Default::default() })
            .unwrap();
        let parcel = Geometry::Polygon(polygon![
            (x: 556_597.0, y: 6_800_125.0),
            (x: 567_729.0, y: 6_800_125.0),
            (x: 567_729.0, y: 6_818_400.0),
            (x: 556_597.0, y: 6_818_400.0),
            (x: 556_597.0, y: 6_800_125.0),
        ]);
        layer.create_feature(parcel.to_gdal().unwrap()).unwrap();
    }
    std::fs::read(&path).unwrap()
}

fn package_batch(item_id: &str) -> UnitOfWork {
    UnitOfWork::ImportBatch(MigrationBatch {
        session_id: SessionId::new(),
        source_token: "agol-token".to_string(),
        format: ImportFormat::GeoPackage,
        items: vec![MigrationItem {
            source_id: item_id.to_string(),
            source_title: "Zoning".to_string(),
            source_type: "GeoPackage".to_string(),
            target_system: 4,
            target_project_or_policy: AreaType::Project,
            target_project_id: "p1".to_string(),
            target_api_token: "gdh-token".to_string(),
        }],
    })
}

#[tokio::test]
async fn test_real_package_is_reprojected_and_published() {
    let h = Harness::new();
    let id = h.destination.seed_file_item("Zoning", "GeoPackage", "zoning.gpkg", mercator_package());
    let runner = PipelineRunner::new(
        h.collaborators(Some(Arc::new(GdalCodec))),
        h.cache.clone(),
        h.logger.clone(),
        h.settings.clone(),
    );

    let result = runner.run(&package_batch(&id)).await.unwrap();

    assert_eq!(result.outcome(), RunOutcome::Published);
    assert_eq!(result.message, "Imported 1 of 1 items (1 diagrams), 0 failed");
    assert_eq!(
        h.storage.keys(),
        vec![
            "projects/p1/systems/4/zoning_parcels.fgb",
            "projects/p1/systems/4/zoning_parcels_simplified.fgb",
        ]
    );

    let posted = h.source.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].layer_type, ExternalLayerType::FlatgeobufUrl);
    assert_eq!(posted[0].feature_type, "polygon");
    assert_eq!(posted[0].description, "Zoning - parcels");
    assert_eq!(
        posted[0].url,
        format!("{}/projects/p1/systems/4/zoning_parcels_simplified.fgb", CDN)
    );
    assert_eq!(h.scratch_entries(), 0);
}

#[tokio::test]
async fn test_unreadable_package_is_a_failed_item() {
    let h = Harness::new();
    let id = h.destination.seed_file_item(
        "Zoning",
        "GeoPackage",
        "zoning.gpkg",
        b"SQLite format 3\0 but not really".to_vec(),
    );
    let runner = PipelineRunner::new(
        h.collaborators(Some(Arc::new(GdalCodec))),
        h.cache.clone(),
        h.logger.clone(),
        h.settings.clone(),
    );

    let result = runner.run(&package_batch(&id)).await.unwrap();

    assert_eq!(result.outcome(), RunOutcome::Failed);
    assert!(h.source.posted().is_empty());
}
