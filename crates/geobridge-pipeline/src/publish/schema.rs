use geobridge_core::ports::{FieldDefinition, PublishParameters};

/// Declared columns of a published diagram layer, in publish order
const DIAGRAM_FIELDS: &[(&str, &str, &str)] = &[
    ("project_or_policy", "esriFieldTypeString", "sqlTypeNVarchar"),
    ("diagram_name", "esriFieldTypeString", "sqlTypeNVarchar"),
    ("color", "esriFieldTypeString", "sqlTypeNVarchar"),
    ("diagram_id", "esriFieldTypeInteger", "sqlTypeInteger"),
    ("tag_codes", "esriFieldTypeString", "sqlTypeNVarchar"),
    ("start_date", "esriFieldTypeDate", "sqlTypeDate"),
    ("end_date", "esriFieldTypeDate", "sqlTypeDate"),
    ("notes", "esriFieldTypeString", "sqlTypeNVarchar"),
    ("grid_location", "esriFieldTypeString", "sqlTypeNVarchar"),
    ("system_name", "esriFieldTypeString", "sqlTypeNVarchar"),
    ("ObjectID", "esriFieldTypeOID", "sqlTypeOther"),
    ("Shape__Area", "esriFieldTypeDouble", "sqlTypeDouble"),
    ("Shape__Length", "esriFieldTypeDouble", "sqlTypeDouble"),
];

pub fn field_definitions() -> Vec<FieldDefinition> {
    DIAGRAM_FIELDS
        .iter()
        .map(|(name, field_type, sql_type)| FieldDefinition {
            name: name.to_string(),
            field_type: field_type.to_string(),
            sql_type: sql_type.to_string(),
        })
        .collect()
}

pub fn publish_parameters(name: &str) -> PublishParameters {
    PublishParameters {
        name: name.to_string(),
        fields: field_definitions(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_codes_declared_as_text() {
        let fields = field_definitions();
        let tag_codes = fields.iter().find(|f| f.name == "tag_codes").unwrap();
        assert_eq!(tag_codes.field_type, "esriFieldTypeString");
        assert_eq!(fields.len(), 13);
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(publish_parameters("Design")).unwrap();
        assert_eq!(json["fields"][3]["type"], "esriFieldTypeInteger");
        assert_eq!(json["fields"][3]["sqlType"], "sqlTypeInteger");
    }
}
