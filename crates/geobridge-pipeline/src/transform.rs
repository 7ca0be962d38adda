//! Format Transformer
//!
//! Converts source-native feature collections into the two attribute shapes the
//! pipeline emits. Both modes are all-or-nothing: the first offending feature
//! aborts the transform and is reported by index.

use geobridge_core::models::properties::to_property_map;
use geobridge_core::models::{
    AreaType, DesignProperties, DiagramProperties, FeatureShape, SourceFeatureProperties,
    SystemDetail,
};
use geobridge_core::{BridgeError, Result};
use geobridge_geo::models::geometry_type;
use geobridge_geo::{buffer_point, from_geo_geometry, point_grid, to_geo_geometry};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use uuid::Uuid;

use crate::settings::PipelineSettings;

#[derive(Debug, Clone, Copy)]
pub struct FormatTransformer {
    grid_spacing_deg: f64,
    point_buffer_m: f64,
}

impl FormatTransformer {
    pub fn new(grid_spacing_deg: f64, point_buffer_m: f64) -> Self {
        Self { grid_spacing_deg, point_buffer_m }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(settings.grid_spacing_deg, settings.point_buffer_m)
    }

    /// Reshape source features into the diagram shape used for export.
    ///
    /// Only `Polygon` and `LineString` geometries are accepted. The system name
    /// comes from the feature's `sysname`, falling back to a lookup of its
    /// `sysid` in `systems`.
    pub fn to_diagrams(
        &self,
        raw: &FeatureCollection,
        systems: &[SystemDetail],
    ) -> Result<FeatureCollection> {
        let mut features = Vec::with_capacity(raw.features.len());

        for (index, feature) in raw.features.iter().enumerate() {
            let geometry = required_geometry(index, feature)?;
            if !matches!(geometry.value, Value::Polygon(_) | Value::LineString(_)) {
                return Err(BridgeError::UnsupportedGeometry {
                    index,
                    geometry_type: geometry_type(&geometry.value).to_string(),
                });
            }

            let source = source_properties(index, feature)?;
            let system_name = match (&source.sysname, source.sysid) {
                (Some(name), _) => name.clone(),
                (None, Some(id)) => systems
                    .iter()
                    .find(|s| s.id == id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
                (None, None) => String::new(),
            };

            let properties = DiagramProperties {
                project_or_policy: source.areatype,
                diagram_name: source.description,
                color: source.color,
                diagram_id: source.diagramid,
                tag_codes: source.tag_codes,
                start_date: source.start_date,
                end_date: source.end_date,
                notes: source.notes,
                grid_location: source.grid_location,
                system_name,
            };

            features.push(output_feature(index, geometry.clone(), &properties, feature)?);
        }

        tracing::debug!(feature_count = features.len(), "Transformed features to diagram shape");
        Ok(collection(features))
    }

    /// Reshape source features into the 3D-aware design shape.
    ///
    /// Policy records are rasterized into a point grid with zero heights.
    /// Project records keep their geometry, except bare points which are
    /// buffered into a small polygon.
    pub fn to_designs(&self, raw: &FeatureCollection) -> Result<FeatureCollection> {
        let mut features = Vec::with_capacity(raw.features.len());

        for (index, feature) in raw.features.iter().enumerate() {
            let geometry = required_geometry(index, feature)?;
            let source = source_properties(index, feature)?;

            match source.areatype {
                AreaType::Policy => {
                    let shape = to_geo_geometry(&geometry.value).map_err(|e| {
                        BridgeError::UnsupportedGeometry {
                            index,
                            geometry_type: format!("{} ({})", geometry_type(&geometry.value), e),
                        }
                    })?;

                    for point in point_grid(&shape, self.grid_spacing_deg) {
                        let properties = design_properties(&source, 0.0, 0.0);
                        let value = from_geo_geometry(&geo::Geometry::Point(point));
                        features.push(output_feature(
                            index,
                            Geometry::new(value),
                            &properties,
                            feature,
                        )?);
                    }
                }
                AreaType::Project => {
                    let (height, base_height) = source
                        .volume_information
                        .map(|v| (v.max_height, v.min_height))
                        .unwrap_or((0.0, 0.0));

                    let output_geometry = match &geometry.value {
                        Value::Point(_) => {
                            let point = match to_geo_geometry(&geometry.value)? {
                                geo::Geometry::Point(p) => p,
                                other => {
                                    return Err(BridgeError::Geometry(format!(
                                        "Expected a point, found {:?}",
                                        other
                                    )))
                                }
                            };
                            let buffered = buffer_point(&point, self.point_buffer_m);
                            Geometry::new(from_geo_geometry(&geo::Geometry::Polygon(buffered)))
                        }
                        _ => geometry.clone(),
                    };

                    let properties = design_properties(&source, height, base_height);
                    features.push(output_feature(index, output_geometry, &properties, feature)?);
                }
            }
        }

        tracing::debug!(feature_count = features.len(), "Transformed features to design shape");
        Ok(collection(features))
    }
}

fn required_geometry(index: usize, feature: &Feature) -> Result<&Geometry> {
    feature.geometry.as_ref().ok_or_else(|| BridgeError::UnsupportedGeometry {
        index,
        geometry_type: "null".to_string(),
    })
}

fn source_properties(index: usize, feature: &Feature) -> Result<SourceFeatureProperties> {
    let map = feature.properties.clone().unwrap_or_default();
    serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| {
        BridgeError::InvalidProperties {
            index,
            reason: e.to_string(),
        }
    })
}

fn design_properties(
    source: &SourceFeatureProperties,
    height: f64,
    base_height: f64,
) -> DesignProperties {
    DesignProperties {
        author: source.author.clone().unwrap_or_default(),
        description: source.description.clone(),
        height,
        base_height,
        color: source.color.clone(),
        diagram_id: source.diagramid,
        building_id: Uuid::new_v4().to_string(),
        areatype: source.areatype,
        volume_information: source.volume_information,
        tag_codes: source.tag_codes.clone(),
    }
}

/// Serialize properties and check they validate against exactly one shape
fn output_feature<T: serde::Serialize>(
    index: usize,
    geometry: Geometry,
    properties: &T,
    original: &Feature,
) -> Result<Feature> {
    let map: JsonObject = to_property_map(properties)?;
    FeatureShape::classify(&map)
        .map_err(|reason| BridgeError::InvalidProperties { index, reason })?;

    Ok(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: original.id.clone(),
        properties: Some(map),
        foreign_members: None,
    })
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
