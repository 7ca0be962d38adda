//! Import batches through both adapters

mod common;

use common::{Harness, CDN, USER};
use geobridge_clients::{MemoryDestination, MemoryObjectStorage};
use geobridge_core::models::{
    AreaType, ImportFormat, MigrationBatch, MigrationItem, RunOutcome, SessionId,
};
use geobridge_core::ports::{ExternalLayerType, LayerGeometry};
use geobridge_core::BridgeError;
use geobridge_pipeline::{MigrationRunner, PipelineRunner, UnitOfWork};

fn item(id: &str, title: &str, source_type: &str) -> MigrationItem {
    MigrationItem {
        source_id: id.to_string(),
        source_title: title.to_string(),
        source_type: source_type.to_string(),
        target_system: 4,
        target_project_or_policy: AreaType::Project,
        target_project_id: "p1".to_string(),
        target_api_token: "gdh-token".to_string(),
    }
}

fn batch(format: ImportFormat, items: Vec<MigrationItem>) -> UnitOfWork {
    UnitOfWork::ImportBatch(MigrationBatch {
        session_id: SessionId::new(),
        source_token: "agol-token".to_string(),
        items,
        format,
    })
}

fn seed_package(h: &Harness, title: &str, file: &str) -> String {
    h.destination.seed_file_item(title, "GeoPackage", file, b"SQLite format 3\0".to_vec())
}

#[tokio::test]
async fn test_corrupt_package_does_not_stop_the_batch() {
    let h = Harness::new();
    let good = seed_package(&h, "Parcels", "parcels.gpkg");
    let bad = seed_package(&h, "Broken", "corrupt.gpkg");

    let unit = batch(
        ImportFormat::GeoPackage,
        vec![
            item(&bad, "Broken", "GeoPackage"),
            item("svc1", "Roads", "Feature Service"),
            item(&good, "Parcels", "GeoPackage"),
        ],
    );
    let result = h.runner().run(&unit).await.unwrap();

    assert_eq!(result.outcome(), RunOutcome::Published);
    assert_eq!(result.destination_item_reference.as_deref(), Some(good.as_str()));
    assert_eq!(result.message, "Imported 1 of 2 items (1 diagrams), 1 failed");

    // the empty layer is skipped, the parcel layer lands in both resolutions
    let keys = h.storage.keys();
    assert_eq!(
        keys,
        vec![
            "projects/p1/systems/4/parcels_parcels.fgb",
            "projects/p1/systems/4/parcels_parcels_simplified.fgb",
        ]
    );

    let posted = h.source.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].layer_type, ExternalLayerType::FlatgeobufUrl);
    assert_eq!(
        posted[0].url,
        format!("{}/projects/p1/systems/4/parcels_parcels_simplified.fgb", CDN)
    );
    assert_eq!(posted[0].feature_type, "polygon");
    assert_eq!(posted[0].funding_type, "o");
    assert_eq!(posted[0].cost_type, "t");

    let transcript = h.transcript(&unit.session_id()).await;
    assert!(transcript.iter().any(|l| l.starts_with("Error processing Broken")));
    assert!(transcript.iter().any(|l| l.starts_with("Skipping Roads")));
    assert_eq!(h.scratch_entries(), 0);
}

#[tokio::test]
async fn test_missing_bucket_aborts_before_any_item() {
    let h = Harness::with(MemoryDestination::new(USER), MemoryObjectStorage::unavailable(CDN));
    let good = seed_package(&h, "Parcels", "parcels.gpkg");

    let err = h
        .runner()
        .run(&batch(ImportFormat::GeoPackage, vec![item(&good, "Parcels", "GeoPackage")]))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::StorageUnavailable { .. }));
    assert!(h.source.posted().is_empty());
}

#[tokio::test]
async fn test_unknown_item_is_recorded_as_failure() {
    let h = Harness::new();

    let result = h
        .runner()
        .run(&batch(ImportFormat::GeoPackage, vec![item("gone", "Ghost", "GeoPackage")]))
        .await
        .unwrap();

    assert_eq!(result.outcome(), RunOutcome::Failed);
    assert_eq!(result.message, "Imported 0 of 1 items (0 diagrams), 1 failed");
}

#[tokio::test]
async fn test_packages_need_a_codec() {
    let h = Harness::new();
    let runner = PipelineRunner::new(
        h.collaborators(None),
        h.cache.clone(),
        h.logger.clone(),
        h.settings.clone(),
    );
    let good = seed_package(&h, "Parcels", "parcels.gpkg");

    let err = runner
        .run(&batch(ImportFormat::GeoPackage, vec![item(&good, "Parcels", "GeoPackage")]))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::ConfigInvalid { .. }));
}

#[tokio::test]
async fn test_service_layers_are_referenced_not_copied() {
    let h = Harness::new();
    let service = h.destination.seed_service(
        "Roads",
        &[("major", LayerGeometry::Polyline), ("stops", LayerGeometry::Point)],
    );

    let result = h
        .runner()
        .run(&batch(
            ImportFormat::FeatureService,
            vec![item(&service.id, "Roads", "Feature Service")],
        ))
        .await
        .unwrap();

    assert_eq!(result.outcome(), RunOutcome::Published);
    let posted = h.source.posted();
    assert_eq!(posted.len(), 2);
    assert!(posted.iter().all(|d| d.layer_type == ExternalLayerType::FeatureLayer));
    assert_eq!(posted[0].url, format!("{}/0", service.url));
    assert_eq!(posted[0].description, "Roads - major");
    assert_eq!(posted[1].feature_type, LayerGeometry::Point.feature_type());
    assert!(h.storage.keys().is_empty());
}

#[tokio::test]
async fn test_single_sub_layer_by_url() {
    let h = Harness::new();
    let service = h.destination.seed_service(
        "Roads",
        &[("major", LayerGeometry::Polyline), ("minor", LayerGeometry::Polyline)],
    );
    let layer_url = format!("{}/1", service.url);

    h.runner()
        .run(&batch(
            ImportFormat::FeatureService,
            vec![item(&layer_url, "Minor roads", "Feature Service")],
        ))
        .await
        .unwrap();

    let posted = h.source.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].url, layer_url);
    assert_eq!(posted[0].description, "Minor roads");
}
