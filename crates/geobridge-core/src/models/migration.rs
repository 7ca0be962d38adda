use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::models::properties::AreaType;
use crate::models::session::SessionId;

/// Input format handled by an import batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportFormat {
    #[serde(rename = "GeoPackage")]
    GeoPackage,
    #[serde(rename = "Feature Service")]
    FeatureService,
}

impl ImportFormat {
    /// Destination platform item type carrying this format
    pub fn item_type(&self) -> &'static str {
        match self {
            ImportFormat::GeoPackage => "GeoPackage",
            ImportFormat::FeatureService => "Feature Service",
        }
    }

    /// Whether an item's declared type belongs to this format
    pub fn matches(&self, source_type: &str) -> bool {
        source_type.eq_ignore_ascii_case(self.item_type())
    }
}

/// One unit of work inside an import batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationItem {
    #[serde(rename = "id")]
    pub source_id: String,
    #[serde(rename = "title")]
    pub source_title: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub target_system: i64,
    pub target_project_or_policy: AreaType,
    pub target_project_id: String,
    pub target_api_token: String,
}

/// A list of migration items sharing one session, token, and format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationBatch {
    pub session_id: SessionId,
    pub source_token: String,
    pub items: Vec<MigrationItem>,
    pub format: ImportFormat,
}

impl MigrationBatch {
    /// Reject batches that cannot be processed at all
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(BridgeError::ConfigInvalid {
                key: "items".to_string(),
                reason: "An import batch needs at least one item".to_string(),
            });
        }
        if let Some(item) = self.items.iter().find(|i| i.target_project_id.trim().is_empty()) {
            return Err(BridgeError::ConfigInvalid {
                key: "target_project_id".to_string(),
                reason: format!("Item {} has no target project", item.source_id),
            });
        }
        Ok(())
    }

    /// Items whose declared type matches the batch format
    pub fn matching_items(&self) -> impl Iterator<Item = &MigrationItem> {
        self.items.iter().filter(|item| self.format.matches(&item.source_type))
    }
}
