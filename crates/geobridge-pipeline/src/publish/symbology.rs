//! Unique-value renderers keyed on `system_name`.

use geobridge_core::models::SystemDetail;
use geobridge_core::ports::LayerGeometry;
use serde::Serialize;
use serde_json::{json, Value};

pub const RENDERER_FIELD: &str = "system_name";
pub const DEFAULT_LABEL: &str = "Other System";

const DEFAULT_COLOR: [u8; 4] = [128, 128, 128, 255];
const OUTLINE_COLOR: [u8; 4] = [110, 110, 110, 255];

/// Layer-native symbol encodings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Symbol {
    #[serde(rename = "esriSFS")]
    Fill {
        style: &'static str,
        color: [u8; 4],
        outline: Box<Symbol>,
    },
    #[serde(rename = "esriSLS")]
    Line {
        style: &'static str,
        color: [u8; 4],
        width: f64,
    },
    #[serde(rename = "esriSMS")]
    Marker {
        style: &'static str,
        color: [u8; 4],
        size: f64,
        outline: Box<Symbol>,
    },
}

impl Symbol {
    pub fn for_geometry(geometry: LayerGeometry, color: [u8; 4]) -> Self {
        match geometry {
            LayerGeometry::Polygon => Symbol::Fill {
                style: "esriSFSSolid",
                color,
                outline: Box::new(Symbol::outline()),
            },
            LayerGeometry::Polyline => Symbol::Line {
                style: "esriSLSSolid",
                color,
                width: 2.0,
            },
            LayerGeometry::Point => Symbol::Marker {
                style: "esriSMSCircle",
                color,
                size: 8.0,
                outline: Box::new(Symbol::outline()),
            },
        }
    }

    fn outline() -> Self {
        Symbol::Line {
            style: "esriSLSSolid",
            color: OUTLINE_COLOR,
            width: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueValueInfo {
    pub value: String,
    pub label: String,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueValueRenderer {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub field1: &'static str,
    pub default_symbol: Symbol,
    pub default_label: &'static str,
    pub unique_value_infos: Vec<UniqueValueInfo>,
}

impl UniqueValueRenderer {
    /// One value entry per system, colored with the system's declared color
    pub fn for_systems(geometry: LayerGeometry, systems: &[SystemDetail]) -> Self {
        let unique_value_infos = systems
            .iter()
            .map(|system| UniqueValueInfo {
                value: system.name.clone(),
                label: system.name.clone(),
                symbol: Symbol::for_geometry(geometry, hex_to_rgba(&system.color)),
            })
            .collect();

        Self {
            kind: "uniqueValue",
            field1: RENDERER_FIELD,
            default_symbol: Symbol::for_geometry(geometry, DEFAULT_COLOR),
            default_label: DEFAULT_LABEL,
            unique_value_infos,
        }
    }

    /// Layer definition fragment carrying this renderer
    pub fn to_definition(&self) -> Value {
        json!({ "drawingInfo": { "renderer": self } })
    }
}

/// Parse `#rrggbb` or `#rgb` into opaque RGBA; anything else maps to grey
pub fn hex_to_rgba(hex: &str) -> [u8; 4] {
    let digits = hex.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return DEFAULT_COLOR,
    };

    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => [r, g, b, 255],
        _ => DEFAULT_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn systems() -> Vec<SystemDetail> {
        serde_json::from_value(json!([
            {"id": 1, "sysname": "Housing", "syscolor": "#e31a1c"},
            {"id": 2, "sysname": "Transport", "syscolor": "not-a-color"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(hex_to_rgba("#e31a1c"), [227, 26, 28, 255]);
        assert_eq!(hex_to_rgba("#fff"), [255, 255, 255, 255]);
        assert_eq!(hex_to_rgba("#zzzzzz"), DEFAULT_COLOR);
        assert_eq!(hex_to_rgba(""), DEFAULT_COLOR);
    }

    #[test]
    fn test_symbol_type_follows_geometry() {
        let fill = UniqueValueRenderer::for_systems(LayerGeometry::Polygon, &systems());
        let line = UniqueValueRenderer::for_systems(LayerGeometry::Polyline, &systems());
        let point = UniqueValueRenderer::for_systems(LayerGeometry::Point, &systems());

        let json = fill.to_definition();
        let renderer = &json["drawingInfo"]["renderer"];
        assert_eq!(renderer["type"], "uniqueValue");
        assert_eq!(renderer["field1"], "system_name");
        assert_eq!(renderer["defaultLabel"], "Other System");
        assert_eq!(renderer["uniqueValueInfos"][0]["symbol"]["type"], "esriSFS");
        assert_eq!(
            renderer["uniqueValueInfos"][0]["symbol"]["color"],
            json!([227, 26, 28, 255])
        );

        assert_eq!(line.to_definition()["drawingInfo"]["renderer"]["defaultSymbol"]["type"], "esriSLS");
        assert_eq!(point.to_definition()["drawingInfo"]["renderer"]["defaultSymbol"]["type"], "esriSMS");
    }

    #[test]
    fn test_one_entry_per_system() {
        let renderer = UniqueValueRenderer::for_systems(LayerGeometry::Polygon, &systems());
        assert_eq!(renderer.unique_value_infos.len(), 2);
        assert_eq!(renderer.unique_value_infos[1].label, "Transport");
    }
}
