//! Request-side session preparation: download a design and its project data
//! from the source system and cache them under a fresh session, then serve the
//! cached design back in the 3D design shape.

use geobridge_core::models::{DesignRecord, ProjectData, SessionId};
use geobridge_core::ports::SourceConnector;
use geobridge_core::Result;
use geobridge_store::{ProgressLogger, SessionCache};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::transform::FormatTransformer;

/// Which design to fetch, and with which source credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRequest {
    pub project_id: String,
    pub api_token: String,
    pub design_team_id: String,
    pub design_id: String,
}

/// What the client needs to build an export submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedSession {
    pub session_id: SessionId,
    pub design_name: String,
    pub feature_count: usize,
    pub project: ProjectData,
}

pub struct DesignDownloader {
    sources: Arc<dyn SourceConnector>,
    cache: SessionCache,
    logger: ProgressLogger,
    transformer: FormatTransformer,
}

impl DesignDownloader {
    pub fn new(
        sources: Arc<dyn SourceConnector>,
        cache: SessionCache,
        logger: ProgressLogger,
        transformer: FormatTransformer,
    ) -> Self {
        Self { sources, cache, logger, transformer }
    }

    pub async fn prepare(&self, request: &DesignRequest) -> Result<PreparedSession> {
        let session_id = SessionId::new();
        let source = self.sources.connect(&request.project_id, &request.api_token)?;

        let feature_collection =
            source.get_single_synthesis(&request.design_team_id, &request.design_id).await?;
        let details = source
            .get_single_synthesis_details(&request.design_team_id, &request.design_id)
            .await?;
        let design_name = details
            .get("description")
            .and_then(|v| v.as_str())
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| request.design_id.clone());

        let project = source.download_project_data().await?;

        let design = DesignRecord {
            design_id: request.design_id.clone(),
            design_team_id: request.design_team_id.clone(),
            project_id: request.project_id.clone(),
            design_name: design_name.clone(),
            feature_collection,
        };
        let feature_count = design.feature_collection.features.len();

        self.cache.cache_design(&session_id, &design).await?;
        self.cache.cache_tags(&session_id, &project.tags).await?;
        let message = format!("Cached design {} with {} diagrams", design_name, feature_count);
        self.logger.log(message, &session_id).await;

        Ok(PreparedSession { session_id, design_name, feature_count, project })
    }

    /// The session's cached design with heights applied, policies sampled to
    /// point grids and bare project points buffered
    pub async fn design_shape(&self, session: &SessionId) -> Result<FeatureCollection> {
        let design = self.cache.load_design(session).await?;
        let shape = self.transformer.to_designs(&design.feature_collection)?;
        tracing::info!(
            session_id = %session,
            diagrams = design.feature_collection.features.len(),
            features = shape.features.len(),
            "Built design shape"
        );
        Ok(shape)
    }
}
