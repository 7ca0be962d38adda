//! Feature attribute shapes.
//!
//! Source features arrive with source-native property names. Every feature the
//! pipeline emits carries either the diagram shape (export) or the design shape
//! (3D-aware consumers), never anything else.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record category of a diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaType {
    Project,
    Policy,
}

impl AreaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaType::Project => "project",
            AreaType::Policy => "policy",
        }
    }
}

/// Height range attached to a source diagram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeInformation {
    pub min_height: f64,
    pub max_height: f64,
}

/// Properties as delivered by the source system
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceFeatureProperties {
    pub diagramid: i64,
    pub areatype: AreaType,
    pub description: String,
    pub color: String,
    #[serde(default)]
    pub tag_codes: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub grid_location: String,
    #[serde(default)]
    pub sysid: Option<i64>,
    #[serde(default)]
    pub sysname: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub volume_information: Option<VolumeInformation>,
}

/// Export attribute shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagramProperties {
    pub project_or_policy: AreaType,
    pub diagram_name: String,
    pub color: String,
    pub diagram_id: i64,
    pub tag_codes: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: String,
    pub grid_location: String,
    pub system_name: String,
}

/// 3D-aware attribute shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesignProperties {
    pub author: String,
    pub description: String,
    pub height: f64,
    pub base_height: f64,
    pub color: String,
    pub diagram_id: i64,
    pub building_id: String,
    pub areatype: AreaType,
    pub volume_information: Option<VolumeInformation>,
    pub tag_codes: String,
}

/// The shape a serialized property map validated against
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureShape {
    Diagram(DiagramProperties),
    Design(DesignProperties),
}

impl FeatureShape {
    /// Validate a property map against both shapes.
    ///
    /// Succeeds only when exactly one shape accepts the map.
    pub fn classify(properties: &Map<String, Value>) -> Result<Self, String> {
        let value = Value::Object(properties.clone());
        let diagram = serde_json::from_value::<DiagramProperties>(value.clone());
        let design = serde_json::from_value::<DesignProperties>(value);

        match (diagram, design) {
            (Ok(d), Err(_)) => Ok(FeatureShape::Diagram(d)),
            (Err(_), Ok(d)) => Ok(FeatureShape::Design(d)),
            (Ok(_), Ok(_)) => Err("properties match both diagram and design shapes".to_string()),
            (Err(a), Err(b)) => Err(format!(
                "properties match no known shape (diagram: {}; design: {})",
                a, b
            )),
        }
    }
}

/// Serialize a shape into a GeoJSON property map
pub fn to_property_map<T: Serialize>(properties: &T) -> serde_json::Result<Map<String, Value>> {
    match serde_json::to_value(properties)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}
