//! Reversible prefixing of tag codes.
//!
//! Tag codes such as `12,7` look numeric to the destination's column type
//! inference. They travel prefixed and are restored once the layer exists.

use geobridge_core::ports::FeatureRecord;
use geojson::FeatureCollection;
use serde_json::Value;

pub const TAG_CODE_FIELD: &str = "tag_codes";
pub const TAG_CODE_PREFIX: &str = "tc_";

pub fn obfuscate(value: &str) -> String {
    format!("{}{}", TAG_CODE_PREFIX, value)
}

/// Remove exactly one prefix, leaving unprefixed values alone
pub fn strip(value: &str) -> &str {
    value.strip_prefix(TAG_CODE_PREFIX).unwrap_or(value)
}

/// Prefix the tag codes of every feature in place
pub fn obfuscate_collection(collection: &mut FeatureCollection) {
    for feature in &mut collection.features {
        if let Some(properties) = feature.properties.as_mut() {
            if let Some(Value::String(codes)) = properties.get(TAG_CODE_FIELD) {
                let prefixed = obfuscate(codes);
                properties.insert(TAG_CODE_FIELD.to_string(), Value::String(prefixed));
            }
        }
    }
}

/// Edits restoring the original tag codes; records without a prefix are left out
pub fn restore_edits(records: &[FeatureRecord]) -> Vec<FeatureRecord> {
    records
        .iter()
        .filter_map(|record| {
            let codes = record.attributes.get(TAG_CODE_FIELD)?.as_str()?;
            let original = codes.strip_prefix(TAG_CODE_PREFIX)?;

            let mut attributes = serde_json::Map::new();
            attributes.insert(TAG_CODE_FIELD.to_string(), Value::String(original.to_string()));
            Some(FeatureRecord { object_id: record.object_id, attributes })
        })
        .collect()
}

/// Where clause selecting the records that still carry the prefix
pub fn prefixed_where_clause() -> String {
    format!("{} LIKE '{}%'", TAG_CODE_FIELD, TAG_CODE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn collection(codes: &[&str]) -> FeatureCollection {
        let features: Vec<_> = codes
            .iter()
            .map(|c| json!({"type": "Feature", "geometry": null, "properties": {"tag_codes": c}}))
            .collect();
        serde_json::from_value(json!({"type": "FeatureCollection", "features": features})).unwrap()
    }

    fn records(collection: &FeatureCollection) -> Vec<FeatureRecord> {
        collection
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| FeatureRecord {
                object_id: i as i64 + 1,
                attributes: f.properties.clone().unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_strip_only_removes_one_prefix() {
        assert_eq!(strip("tc_12"), "12");
        assert_eq!(strip("tc_tc_12"), "tc_12");
        assert_eq!(strip("12"), "12");
    }

    #[test]
    fn test_missing_field_untouched() {
        let mut fc: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "geometry": null, "properties": {"notes": "x"}}]
        }))
        .unwrap();
        obfuscate_collection(&mut fc);
        assert!(fc.features[0].properties.as_ref().unwrap().get(TAG_CODE_FIELD).is_none());
    }

    proptest! {
        #[test]
        fn prop_prefix_then_strip_is_identity(codes in prop::collection::vec(".{0,16}", 0..8)) {
            let codes: Vec<&str> = codes.iter().map(String::as_str).collect();
            let original = collection(&codes);

            let mut prefixed = original.clone();
            obfuscate_collection(&mut prefixed);
            let edits = restore_edits(&records(&prefixed));

            prop_assert_eq!(edits.len(), codes.len());
            for (edit, code) in edits.iter().zip(&codes) {
                prop_assert_eq!(edit.attributes[TAG_CODE_FIELD].as_str(), Some(*code));
            }
        }
    }
}
