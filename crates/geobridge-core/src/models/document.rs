//! Map and story documents saved on the destination platform.

use serde::{Deserialize, Serialize};

use crate::models::extent::ExtentBox;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupField {
    pub field_name: String,
    pub label: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupInfo {
    pub title: String,
    pub fields: Vec<PopupField>,
}

/// One sub-layer referenced by a map document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalLayer {
    pub id: String,
    pub title: String,
    pub url: String,
    pub popup_info: PopupInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebMapDocument {
    pub title: String,
    pub snippet: String,
    pub tags: Vec<String>,
    pub extent: Option<ExtentBox>,
    pub operational_layers: Vec<OperationalLayer>,
}

/// Paragraph styles understood by story documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Heading,
    Subheading,
    Paragraph,
    Quote,
    Bullets,
    Numbered,
    Large,
}

impl TextStyle {
    /// Parse a template style name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "heading" => Some(TextStyle::Heading),
            "subheading" => Some(TextStyle::Subheading),
            "paragraph" => Some(TextStyle::Paragraph),
            "quote" => Some(TextStyle::Quote),
            "bullets" | "bullet_list" => Some(TextStyle::Bullets),
            "numbered" | "numbered_list" => Some(TextStyle::Numbered),
            "large" | "large_paragraph" => Some(TextStyle::Large),
            _ => None,
        }
    }
}

/// An image already attached to the destination platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub resource: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoryBlock {
    Text { text: String, style: TextStyle },
    Image(ImageRef),
    Gallery { images: Vec<ImageRef>, caption: String },
    Table { header: Vec<String>, rows: Vec<Vec<String>> },
    Map { item_id: String, caption: String },
    Separator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryCover {
    pub title: String,
    pub summary: String,
    pub byline: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDocument {
    pub cover: StoryCover,
    pub blocks: Vec<StoryBlock>,
}
