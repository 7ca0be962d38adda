//! Shared fixtures for the pipeline integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use geo::{polygon, Geometry};
use geobridge_clients::{
    MemoryDestination, MemoryDestinationConnector, MemoryObjectStorage, MemorySourceConnector,
    MemorySourceSystem,
};
use geobridge_core::models::{DesignRecord, ExportSubmission, ProjectTag, SessionId};
use geobridge_core::ports::{ArchiveLayer, ImageSource, LayerCodec};
use geobridge_core::{BridgeError, Result};
use geobridge_pipeline::{Collaborators, PipelineRunner, PipelineSettings};
use geobridge_store::{MemorySessionStore, ProgressLogger, SessionCache};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const USER: &str = "planner";
pub const CDN: &str = "https://cdn.example.test/bucket";
pub const DESIGN_SNIPPET: &str = "s9-p1";

/// Every collaborator a pipeline run touches, all in memory
pub struct Harness {
    pub destination: MemoryDestination,
    pub storage: MemoryObjectStorage,
    pub source: MemorySourceSystem,
    pub cache: SessionCache,
    pub logger: ProgressLogger,
    pub settings: PipelineSettings,
    pub scratch: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MemoryDestination::new(USER), MemoryObjectStorage::new(CDN))
    }

    pub fn with(destination: MemoryDestination, storage: MemoryObjectStorage) -> Self {
        let store = Arc::new(MemorySessionStore::new());
        let ttl = Duration::from_secs(600);
        let scratch = tempfile::tempdir().unwrap();
        let settings = PipelineSettings {
            scratch_dir: scratch.path().to_path_buf(),
            ..PipelineSettings::default()
        };

        Self {
            destination,
            storage,
            source: MemorySourceSystem::new(),
            cache: SessionCache::new(store.clone(), ttl, ttl),
            logger: ProgressLogger::new(store, ttl),
            settings,
            scratch,
        }
    }

    pub fn collaborators(&self, codec: Option<Arc<dyn LayerCodec>>) -> Collaborators {
        Collaborators {
            destinations: Arc::new(MemoryDestinationConnector::new(self.destination.clone())),
            sources: Arc::new(MemorySourceConnector::new(self.source.clone())),
            storage: Arc::new(self.storage.clone()),
            images: Arc::new(FakeImages),
            codec,
        }
    }

    pub fn runner(&self) -> PipelineRunner {
        PipelineRunner::new(
            self.collaborators(Some(Arc::new(FakeCodec))),
            self.cache.clone(),
            self.logger.clone(),
            self.settings.clone(),
        )
    }

    /// Files left behind in the scratch directory
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }

    pub async fn transcript(&self, session: &SessionId) -> Vec<String> {
        self.logger.transcript(session).await.unwrap()
    }
}

fn square(x: f64, y: f64) -> serde_json::Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[x, y], [x + 0.01, y], [x + 0.01, y + 0.01], [x, y + 0.01], [x, y]]]
    })
}

/// A design of `count` project polygons in system 4
pub fn design(count: usize) -> DesignRecord {
    let features: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": square(5.0 + i as f64 * 0.02, 52.0),
                "properties": {
                    "diagramid": i,
                    "areatype": "project",
                    "description": format!("Diagram {}", i),
                    "color": "#e31a1c",
                    "tag_codes": "12,7",
                    "notes": "",
                    "start_date": "2024-01-01",
                    "end_date": null,
                    "grid_location": "B2",
                    "sysid": 4,
                    "volume_information": {"min_height": 0.0, "max_height": 9.0}
                }
            })
        })
        .collect();

    serde_json::from_value(json!({
        "design_id": "s9",
        "design_team_id": "t3",
        "project_id": "p1",
        "design_name": "Final synthesis",
        "feature_collection": {"type": "FeatureCollection", "features": features}
    }))
    .unwrap()
}

pub fn submission(session: SessionId) -> ExportSubmission {
    serde_json::from_value(json!({
        "session_id": session,
        "destination_token": "agol-token",
        "project_id": "p1",
        "design_id": "s9",
        "design_team_id": "t3",
        "design_name": "Final synthesis",
        "project": {"project_title": "Riverside", "project_description": "Flood-safe growth"},
        "systems": [
            {"id": 4, "sysname": "Housing", "syscolor": "#e31a1c"},
            {"id": 5, "sysname": "Green", "syscolor": "#33a02c"}
        ]
    }))
    .unwrap()
}

pub fn tags() -> Vec<ProjectTag> {
    serde_json::from_value(json!([
        {"id": "t1", "tag": "Flood defence", "slug": "flood-defence", "code": "12", "diagrams": [0]},
        {"id": "t2", "tag": "Housing", "slug": "housing", "code": "7", "diagrams": [1, 2]}
    ]))
    .unwrap()
}

/// Serves a tiny PNG for every URL
pub struct FakeImages;

#[async_trait]
impl ImageSource for FakeImages {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        let pixels = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 40, 40]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(pixels)
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| BridgeError::Serialization(e.to_string()))?;
        Ok(out.into_inner())
    }
}

/// Reads one parcel layer and one empty layer from any package; packages
/// whose file name contains "corrupt" cannot be read
pub struct FakeCodec;

impl LayerCodec for FakeCodec {
    fn read_layers(&self, path: &Path) -> Result<Vec<ArchiveLayer>> {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if name.contains("corrupt") {
            return Err(BridgeError::UnreadableArchive {
                path: path.to_path_buf(),
                reason: "file is not a database".to_string(),
            });
        }

        let parcel = polygon![
            (x: 5.0, y: 52.0),
            (x: 5.1, y: 52.0),
            (x: 5.1, y: 52.1),
            (x: 5.0, y: 52.1),
            (x: 5.0, y: 52.0),
        ];
        Ok(vec![
            ArchiveLayer {
                name: "parcels".to_string(),
                epsg: 4326,
                geometries: vec![Geometry::Polygon(parcel)],
            },
            ArchiveLayer { name: "notes".to_string(), epsg: 4326, geometries: vec![] },
        ])
    }

    fn write_container(&self, layer: &ArchiveLayer, path: &Path) -> Result<()> {
        let body: Vec<String> = layer.geometries.iter().map(|g| format!("{:?}", g)).collect();
        std::fs::write(path, body.join("\n"))?;
        Ok(())
    }
}
