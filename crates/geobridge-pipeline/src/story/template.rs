//! Declarative story templates.
//!
//! Templates are TOML. Placeholders such as `{design_name}` are replaced in
//! the raw text before parsing, with values escaped for TOML basic strings.

use geobridge_core::{BridgeError, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TEMPLATE: &str = include_str!("default_story.toml");

pub const DEFAULT_TITLE: &str = "Geodesignhub ESRI Bridge Alpha";
pub const DEFAULT_DESCRIPTION: &str = "A story map for the Geodesignhub project";

/// Values available to template placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct StoryContext {
    pub design_name: String,
    pub project_id: String,
    pub project_title: String,
    pub project_description: String,
    pub webmap_id: String,
}

impl StoryContext {
    fn placeholders(&self) -> [(&'static str, &str); 5] {
        [
            ("design_name", &self.design_name),
            ("project_id", &self.project_id),
            ("project_title", &self.project_title),
            ("project_description", &self.project_description),
            ("webmap_id", &self.webmap_id),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoverSpec {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub cover_image_url: Option<String>,
    pub byline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageSpec {
    pub url: String,
    pub caption: Option<String>,
}

/// A panel as written in the template. Which fields matter depends on
/// `content_type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PanelSpec {
    pub content_type: String,
    pub text: Option<String>,
    pub style: Option<String>,
    pub url: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageSpec>,
    pub headers: Option<Vec<String>>,
    pub rows: Option<Vec<Vec<String>>>,
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectionSpec {
    pub title: Option<String>,
    #[serde(default)]
    pub panels: Vec<PanelSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoryTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub cover: CoverSpec,
    #[serde(default)]
    pub sections: Vec<SectionSpec>,
}

impl StoryTemplate {
    /// Load a template file, or the built-in template when `path` is `None`
    pub fn load(path: Option<&Path>, context: &StoryContext) -> Result<Self> {
        let raw = match path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| BridgeError::Template {
                reason: format!("Failed to read {}: {}", path.display(), e),
            })?,
            None => DEFAULT_TEMPLATE.to_string(),
        };
        Self::render(&raw, context)
    }

    pub fn render(raw: &str, context: &StoryContext) -> Result<Self> {
        toml::from_str(&substitute(raw, context))
            .map_err(|e| BridgeError::Template { reason: e.to_string() })
    }

    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn summary(&self) -> &str {
        self.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION)
    }
}

fn substitute(raw: &str, context: &StoryContext) -> String {
    context
        .placeholders()
        .iter()
        .fold(raw.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{}}}", key), &escape_basic_string(value))
        })
}

fn escape_basic_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.push_str(&format!("\\u{:04X}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}
