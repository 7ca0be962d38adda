use geobridge_core::models::{StoryBlock, TextStyle};
use geobridge_core::{BridgeError, Result};

pub const MAX_TABLE_ROWS: usize = 9;
pub const MAX_TABLE_COLUMNS: usize = 8;

/// Text block; an unknown style name falls back to a paragraph
pub fn text_block(text: &str, style: Option<&str>) -> StoryBlock {
    let style = match style {
        None => TextStyle::Paragraph,
        Some(name) => TextStyle::parse(name).unwrap_or_else(|| {
            tracing::warn!(style = name, "Unknown text style, using paragraph");
            TextStyle::Paragraph
        }),
    };
    StoryBlock::Text { text: text.to_string(), style }
}

pub fn heading_block(text: &str) -> StoryBlock {
    StoryBlock::Text { text: text.to_string(), style: TextStyle::Heading }
}

/// Table block with 1 to 9 rows and 1 to 8 columns; every row must fill
/// every column
pub fn table_block(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<StoryBlock> {
    let columns = header.len();
    if !(1..=MAX_TABLE_COLUMNS).contains(&columns) {
        return Err(BridgeError::TableShape {
            reason: format!("{} columns, expected 1 to {}", columns, MAX_TABLE_COLUMNS),
        });
    }
    if !(1..=MAX_TABLE_ROWS).contains(&rows.len()) {
        return Err(BridgeError::TableShape {
            reason: format!("{} rows, expected 1 to {}", rows.len(), MAX_TABLE_ROWS),
        });
    }
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != columns) {
        return Err(BridgeError::TableShape {
            reason: format!("row {} has {} cells for {} columns", index, row.len(), columns),
        });
    }

    Ok(StoryBlock::Table { header, rows })
}
