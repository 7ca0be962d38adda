//! Conversions between GeoJSON geometry values and `geo` geometries.

use geo::Geometry as GeoGeometry;
use geobridge_core::{BridgeError, Result};

/// Convert a GeoJSON geometry value to a geo::Geometry
pub fn to_geo_geometry(value: &geojson::Value) -> Result<GeoGeometry<f64>> {
    GeoGeometry::<f64>::try_from(value).map_err(|e| {
        BridgeError::Geometry(format!("{} could not be converted: {}", geometry_type(value), e))
    })
}

/// Convert a geo::Geometry to a GeoJSON geometry value
pub fn from_geo_geometry(geom: &GeoGeometry<f64>) -> geojson::Value {
    geojson::Value::from(geom)
}

/// GeoJSON type name of a geometry value
pub fn geometry_type(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
