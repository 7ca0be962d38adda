//! Map document assembly over the sub-layers of a published service.

use geobridge_core::models::{
    ExtentAccumulator, OperationalLayer, PopupField, PopupInfo, WebMapDocument,
};
use geobridge_core::ports::{LayerField, ServiceLayer};

const INTERNAL_FIELDS: &[&str] = &["OBJECTID", "ObjectID", "FID", "GlobalID"];
const INTERNAL_SUFFIXES: &[&str] = &["__Area", "__Length"];

/// Whether a field is platform bookkeeping rather than design data
pub fn is_internal_field(name: &str) -> bool {
    INTERNAL_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(name))
        || INTERNAL_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// `diagram_name` becomes `Diagram Name`
pub fn field_label(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn popup_fields(fields: &[LayerField]) -> Vec<PopupField> {
    fields
        .iter()
        .filter(|f| !is_internal_field(&f.name))
        .map(|f| PopupField {
            field_name: f.name.clone(),
            label: f.alias.clone().unwrap_or_else(|| field_label(&f.name)),
            visible: true,
        })
        .collect()
}

/// Build a map document over `layers`.
///
/// A layer with an incomplete extent is still referenced but does not
/// contribute to the merged extent.
pub fn build_web_map(
    title: &str,
    snippet: &str,
    tags: Vec<String>,
    layers: &[ServiceLayer],
) -> WebMapDocument {
    let mut extent = ExtentAccumulator::new();
    let mut operational_layers = Vec::with_capacity(layers.len());

    for layer in layers {
        if !extent.include(&layer.extent) {
            tracing::warn!(layer = %layer.name, "Incomplete layer extent left out of map extent");
        }

        operational_layers.push(OperationalLayer {
            id: format!("layer_{}", layer.id),
            title: layer.name.clone(),
            url: layer.url.clone(),
            popup_info: PopupInfo {
                title: format!("{}: {{diagram_name}}", layer.name),
                fields: popup_fields(&layer.fields),
            },
        });
    }

    WebMapDocument {
        title: title.to_string(),
        snippet: snippet.to_string(),
        tags,
        extent: extent.extent(),
        operational_layers,
    }
}
