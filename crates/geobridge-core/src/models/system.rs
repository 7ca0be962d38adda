use serde::{Deserialize, Serialize};

/// A project-level category with the color used for symbology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDetail {
    pub id: i64,
    #[serde(rename = "sysname")]
    pub name: String,
    #[serde(rename = "syscolor")]
    pub color: String,
    #[serde(rename = "systag", default)]
    pub tag: String,
    #[serde(rename = "syscost", default)]
    pub cost: i64,
    #[serde(rename = "sysbudget", default)]
    pub budget: i64,
    #[serde(default)]
    pub current_ha: f64,
    #[serde(default)]
    pub target_ha: f64,
    #[serde(rename = "verbose_description", default)]
    pub description: String,
}

/// Entry of the systems collection endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSummary {
    pub id: i64,
    pub sysname: String,
    pub syscolor: String,
}

/// A project tag that can be attached to diagrams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTag {
    pub id: String,
    pub tag: String,
    pub slug: String,
    pub code: String,
    #[serde(default)]
    pub diagrams: Vec<i64>,
}

/// Everything downloaded about a project before an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub systems: Vec<SystemSummary>,
    pub system_details: Vec<SystemDetail>,
    pub bounds: String,
    pub center: String,
    pub tags: Vec<ProjectTag>,
}

impl ProjectData {
    /// Look up a system name by id
    pub fn system_name(&self, id: i64) -> Option<&str> {
        self.system_details.iter().find(|s| s.id == id).map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_detail_wire_names() {
        let detail: SystemDetail = serde_json::from_value(json!({
            "id": 4,
            "sysname": "Housing",
            "syscolor": "#e31a1c",
            "systag": "HOUS",
            "syscost": 10,
            "sysbudget": 100,
            "current_ha": 1.5,
            "target_ha": 3.0,
            "verbose_description": "Residential development"
        }))
        .unwrap();

        assert_eq!(detail.name, "Housing");
        assert_eq!(detail.color, "#e31a1c");
        assert_eq!(detail.description, "Residential development");
    }
}
