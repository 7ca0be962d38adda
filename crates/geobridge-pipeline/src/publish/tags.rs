//! Tabular export of project tags.

use geobridge_core::models::ProjectTag;
use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::Value;

pub const TAGS_ITEM_TYPE: &str = "Feature Collection";

/// One geometry-less record per tag
pub fn tags_table(tags: &[ProjectTag]) -> FeatureCollection {
    let features = tags
        .iter()
        .map(|tag| {
            let mut properties = JsonObject::new();
            properties.insert("tag_id".to_string(), Value::from(tag.id.clone()));
            properties.insert("tag".to_string(), Value::from(tag.tag.clone()));
            properties.insert("slug".to_string(), Value::from(tag.slug.clone()));
            properties.insert("code".to_string(), Value::from(tag.code.clone()));
            let diagrams: Vec<String> = tag.diagrams.iter().map(|d| d.to_string()).collect();
            properties.insert("diagrams".to_string(), Value::from(diagrams.join(",")));

            Feature {
                bbox: None,
                geometry: None,
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_table_has_no_geometry() {
        let tags = vec![ProjectTag {
            id: "t1".to_string(),
            tag: "Flooding".to_string(),
            slug: "flooding".to_string(),
            code: "FLD".to_string(),
            diagrams: vec![3, 9],
        }];
        let table = tags_table(&tags);

        assert_eq!(table.features.len(), 1);
        assert!(table.features[0].geometry.is_none());
        let props = table.features[0].properties.as_ref().unwrap();
        assert_eq!(props["diagrams"], "3,9");
        assert_eq!(props["code"], "FLD");
    }
}
