use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::models::session::SessionId;
use crate::models::system::SystemDetail;

/// A design's feature collection plus its identifying metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesignRecord {
    pub design_id: String,
    pub design_team_id: String,
    pub project_id: String,
    pub design_name: String,
    pub feature_collection: FeatureCollection,
}

/// Project-level descriptive metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDetails {
    pub project_title: String,
    #[serde(default)]
    pub project_description: String,
}

/// Resolved payload for an export job
///
/// The design itself travels through the session store; the payload only
/// carries what the worker cannot look up on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSubmission {
    pub session_id: SessionId,
    pub destination_token: String,
    pub project_id: String,
    pub design_id: String,
    pub design_team_id: String,
    pub design_name: String,
    pub project: ProjectDetails,
    pub systems: Vec<SystemDetail>,
    #[serde(default)]
    pub include_web_map: bool,
    #[serde(default)]
    pub include_story_map: bool,
}

impl ExportSubmission {
    /// Reject payloads that cannot identify a design
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("project_id", &self.project_id),
            ("design_id", &self.design_id),
            ("destination_token", &self.destination_token),
        ] {
            if value.trim().is_empty() {
                return Err(BridgeError::ConfigMissing { key: key.to_string() });
            }
        }
        if self.include_story_map && !self.include_web_map {
            return Err(BridgeError::ConfigInvalid {
                key: "include_story_map".to_string(),
                reason: "A story document embeds the web map and requires include_web_map"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Identity snippet used for duplicate detection on the destination platform
    pub fn design_snippet(&self) -> String {
        format!("{}-{}", self.design_id, self.project_id)
    }

    pub fn tags_snippet(&self) -> String {
        format!("{}-tags", self.project_id)
    }
}
