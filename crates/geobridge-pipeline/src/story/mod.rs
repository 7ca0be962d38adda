//! Story documents assembled from a template.
//!
//! Content problems inside a template (a broken image, an oversized table, an
//! unknown panel type) are logged and the affected panel is skipped. Only a
//! template that cannot be loaded or a failed save ends the story step.

pub mod blocks;
pub mod images;
pub mod template;

pub use images::ImageAttacher;
pub use template::{PanelSpec, StoryContext, StoryTemplate};

use geobridge_core::models::{ImageRef, SessionId, StoryBlock, StoryCover, StoryDocument};
use geobridge_core::ports::{ContentItem, DestinationPlatform, ImageSource};
use geobridge_core::Result;
use geobridge_store::ProgressLogger;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_BYLINE: &str = "Geodesignhub";
const DEFAULT_GALLERY_CAPTION: &str = "Gallery Caption";
const DEFAULT_SECTION_TITLE: &str = "Untitled Section";

pub struct StoryPublisher {
    destination: Arc<dyn DestinationPlatform>,
    attacher: ImageAttacher,
    logger: ProgressLogger,
}

impl StoryPublisher {
    pub fn new(
        destination: Arc<dyn DestinationPlatform>,
        images: Arc<dyn ImageSource>,
        logger: ProgressLogger,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            attacher: ImageAttacher::new(images, destination.clone(), scratch_dir),
            destination,
            logger,
        }
    }

    /// Render, save, then retitle the story document
    pub async fn publish(
        &self,
        template: &StoryTemplate,
        context: &StoryContext,
        session: &SessionId,
    ) -> Result<ContentItem> {
        let document = self.render(template, context, session).await;
        let item = self.destination.save_story(&document).await?;
        self.destination.update_item(&item.id, template.title(), template.summary()).await?;

        self.logger.log(format!("Saved story {}", item.id), session).await;
        Ok(item)
    }

    /// Build the document; panels that cannot be rendered are left out
    pub async fn render(
        &self,
        template: &StoryTemplate,
        context: &StoryContext,
        session: &SessionId,
    ) -> StoryDocument {
        let cover = StoryCover {
            title: template.cover.title.clone().unwrap_or_else(|| template.title().to_string()),
            summary: template.cover.subtitle.clone().unwrap_or_default(),
            byline: template.cover.byline.clone().unwrap_or_else(|| DEFAULT_BYLINE.to_string()),
            image_url: template.cover.cover_image_url.clone().unwrap_or_default(),
        };

        let mut blocks = Vec::new();
        for section in &template.sections {
            let title = section.title.as_deref().unwrap_or(DEFAULT_SECTION_TITLE);
            blocks.push(blocks::heading_block(title));
            for panel in &section.panels {
                match self.panel_block(panel, context, session).await {
                    Some(block) => blocks.push(block),
                    None => tracing::debug!(content_type = %panel.content_type, "Panel skipped"),
                }
            }
        }

        StoryDocument { cover, blocks }
    }

    async fn panel_block(
        &self,
        panel: &PanelSpec,
        context: &StoryContext,
        session: &SessionId,
    ) -> Option<StoryBlock> {
        match panel.content_type.trim().to_ascii_lowercase().as_str() {
            "text" => match &panel.text {
                Some(text) => Some(blocks::text_block(text, panel.style.as_deref())),
                None => {
                    tracing::warn!("Text panel without text");
                    None
                }
            },
            "image" => {
                let url = panel.url.as_deref()?;
                match self.attacher.attach(url).await {
                    Ok(resource) => Some(StoryBlock::Image(ImageRef {
                        resource,
                        caption: panel.caption.clone().unwrap_or_default(),
                    })),
                    Err(e) => {
                        self.logger.log(format!("Skipped image {}: {}", url, e), session).await;
                        None
                    }
                }
            }
            "gallery" => {
                let mut images = Vec::with_capacity(panel.images.len());
                for image in &panel.images {
                    match self.attacher.attach(&image.url).await {
                        Ok(resource) => images.push(ImageRef {
                            resource,
                            caption: image.caption.clone().unwrap_or_default(),
                        }),
                        Err(e) => {
                            self.logger
                                .log(format!("Skipped gallery image {}: {}", image.url, e), session)
                                .await
                        }
                    }
                }
                if images.is_empty() {
                    return None;
                }
                let caption = panel
                    .caption
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GALLERY_CAPTION.to_string());
                Some(StoryBlock::Gallery { images, caption })
            }
            "table" => {
                let (Some(header), Some(rows)) = (&panel.headers, &panel.rows) else {
                    tracing::warn!("Table panel needs headers and rows");
                    return None;
                };
                match blocks::table_block(header.clone(), rows.clone()) {
                    Ok(block) => Some(block),
                    Err(e) => {
                        self.logger.log(format!("Skipped table: {}", e), session).await;
                        None
                    }
                }
            }
            "map" => {
                let item_id = panel
                    .item_id
                    .clone()
                    .filter(|id| !id.trim().is_empty())
                    .or_else(|| Some(context.webmap_id.clone()).filter(|id| !id.is_empty()));
                match item_id {
                    Some(item_id) => Some(StoryBlock::Map {
                        item_id,
                        caption: panel.caption.clone().unwrap_or_default(),
                    }),
                    None => {
                        tracing::warn!("Map panel without a map item");
                        None
                    }
                }
            }
            "separator" => Some(StoryBlock::Separator),
            other => {
                tracing::warn!(content_type = other, "Unsupported panel type");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geobridge_clients::MemoryDestination;
    use geobridge_core::models::TextStyle;
    use geobridge_core::BridgeError;
    use geobridge_store::MemorySessionStore;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::time::Duration;

    fn png() -> Vec<u8> {
        let image = RgbaImage::from_pixel(6, 4, Rgba([30, 120, 200, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Serves a PNG for URLs containing "good", text for "text", 404 otherwise
    struct FakeImages;

    #[async_trait]
    impl ImageSource for FakeImages {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            if url.contains("good") {
                Ok(png())
            } else if url.contains("text") {
                Ok(b"just words".to_vec())
            } else {
                Err(BridgeError::upstream("image host", 404, "not found"))
            }
        }
    }

    fn context() -> StoryContext {
        StoryContext {
            design_name: "Synthesis".to_string(),
            project_id: "p1".to_string(),
            project_title: "Riverside".to_string(),
            project_description: "About".to_string(),
            webmap_id: "map42".to_string(),
        }
    }

    fn publisher(destination: &MemoryDestination, scratch: &std::path::Path) -> StoryPublisher {
        let logger =
            ProgressLogger::new(Arc::new(MemorySessionStore::new()), Duration::from_secs(60));
        StoryPublisher::new(
            Arc::new(destination.clone()),
            Arc::new(FakeImages),
            logger,
            scratch.to_path_buf(),
        )
    }

    const TEMPLATE: &str = r#"
        name = "{design_name} story"

        [cover]
        title = "{design_name}"

        [[sections]]
        title = "Overview"

        [[sections.panels]]
        content_type = "text"
        style = "shouting"
        text = "Project {project_id}"

        [[sections.panels]]
        content_type = "image"
        url = "https://img/good.png"
        caption = "Site"

        [[sections.panels]]
        content_type = "image"
        url = "https://img/missing.png"

        [[sections.panels]]
        content_type = "gallery"
        images = [
            { url = "https://img/good-1.png" },
            { url = "https://img/text.png" },
            { url = "https://img/good-2.png" },
        ]

        [[sections.panels]]
        content_type = "table"
        headers = ["a"]
        rows = [["1"], ["2"], ["3"], ["4"], ["5"], ["6"], ["7"], ["8"], ["9"], ["10"]]

        [[sections.panels]]
        content_type = "map"

        [[sections.panels]]
        content_type = "video"

        [[sections.panels]]
        content_type = "separator"
    "#;

    #[tokio::test]
    async fn test_render_skips_bad_panels() {
        let scratch = tempfile::tempdir().unwrap();
        let destination = MemoryDestination::new("planner");
        let template = StoryTemplate::render(TEMPLATE, &context()).unwrap();

        let document = publisher(&destination, scratch.path())
            .render(&template, &context(), &SessionId::new())
            .await;

        assert_eq!(document.cover.title, "Synthesis");
        assert_eq!(document.cover.byline, "Geodesignhub");
        assert_eq!(document.blocks.len(), 6);
        assert_eq!(
            document.blocks[1],
            StoryBlock::Text { text: "Project p1".to_string(), style: TextStyle::Paragraph }
        );
        assert!(matches!(&document.blocks[2], StoryBlock::Image(img) if img.caption == "Site"));
        match &document.blocks[3] {
            StoryBlock::Gallery { images, caption } => {
                assert_eq!(images.len(), 2);
                assert_eq!(caption, "Gallery Caption");
            }
            other => panic!("expected gallery, got {:?}", other),
        }
        assert!(matches!(&document.blocks[4], StoryBlock::Map { item_id, .. } if item_id == "map42"));
        assert_eq!(document.blocks[5], StoryBlock::Separator);

        // every downloaded image was removed locally
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
        assert_eq!(destination.resources().len(), 3);
        assert!(destination.resources().iter().all(|r| r.ends_with(".jpg")));
    }

    #[tokio::test]
    async fn test_png_is_attached_as_jpeg() {
        let scratch = tempfile::tempdir().unwrap();
        let destination = MemoryDestination::new("planner");
        let attacher = ImageAttacher::new(
            Arc::new(FakeImages),
            Arc::new(destination.clone()),
            scratch.path().to_path_buf(),
        );

        let resource = attacher.attach("https://img/good.png").await.unwrap();

        assert!(resource.ends_with(".jpg"));
        let (content_type, bytes) = destination.resource_content(&resource).unwrap();
        assert_eq!(content_type, "image/jpeg");
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_untitled_section_gets_a_heading() {
        let scratch = tempfile::tempdir().unwrap();
        let destination = MemoryDestination::new("planner");
        let template = StoryTemplate::render(
            r#"
            [[sections]]
            [[sections.panels]]
            content_type = "separator"
            "#,
            &context(),
        )
        .unwrap();

        let document = publisher(&destination, scratch.path())
            .render(&template, &context(), &SessionId::new())
            .await;

        assert_eq!(document.blocks.len(), 2);
        assert_eq!(document.blocks[0], blocks::heading_block("Untitled Section"));
        assert_eq!(document.blocks[1], StoryBlock::Separator);
    }

    #[tokio::test]
    async fn test_publish_retitles_story() {
        let scratch = tempfile::tempdir().unwrap();
        let destination = MemoryDestination::new("planner");
        let template = StoryTemplate::render(TEMPLATE, &context()).unwrap();

        let item = publisher(&destination, scratch.path())
            .publish(&template, &context(), &SessionId::new())
            .await
            .unwrap();

        let stored = destination.items().into_iter().find(|i| i.id == item.id).unwrap();
        assert_eq!(stored.title, "Synthesis story");
        assert_eq!(stored.snippet, template::DEFAULT_DESCRIPTION);
        assert_eq!(destination.calls().stories, 1);
    }
}
