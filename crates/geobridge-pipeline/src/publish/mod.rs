//! Publishing Orchestrator
//!
//! Drives one export run through its steps in a fixed order:
//! check for a duplicate, upload the raw collection, publish it as a layer
//! service, symbolize, then optionally build a web map and a story. Every
//! step returns a `Result`; [`PublishingOrchestrator::run`] turns the first
//! error into the run's terminal [`PublishResult`] according to its
//! disposition.

pub mod schema;
pub mod symbology;
pub mod tagcodes;
pub mod tags;
pub mod webmap;

use geobridge_core::models::{
    DesignRecord, ExportSubmission, ProjectTag, PublishResult, SessionId, SystemDetail,
};
use geobridge_core::ports::{
    ContentItem, DestinationPlatform, Folder, ImageSource, ItemProperties, ServiceLayer,
};
use geobridge_core::{BridgeError, ErrorDisposition, Result};
use geobridge_store::ProgressLogger;
use geojson::FeatureCollection;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::idempotency::{AssetCategory, IdempotencyGuard};
use crate::settings::PipelineSettings;
use crate::story::{StoryContext, StoryPublisher, StoryTemplate};
use crate::transform::FormatTransformer;

use self::symbology::UniqueValueRenderer;

const RAW_ITEM_TYPE: &str = "GeoJson";
const FAILED_MESSAGE: &str =
    "Export to the destination platform failed, please review the session log";

/// Terminal results of one export; the design and the tags are independent
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub design: PublishResult,
    pub tags: Option<PublishResult>,
}

pub struct PublishingOrchestrator {
    destination: Arc<dyn DestinationPlatform>,
    images: Arc<dyn ImageSource>,
    guard: IdempotencyGuard,
    logger: ProgressLogger,
    transformer: FormatTransformer,
    settings: PipelineSettings,
}

impl PublishingOrchestrator {
    pub fn new(
        destination: Arc<dyn DestinationPlatform>,
        images: Arc<dyn ImageSource>,
        logger: ProgressLogger,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            guard: IdempotencyGuard::new(destination.clone()),
            transformer: FormatTransformer::from_settings(&settings),
            destination,
            images,
            logger,
            settings,
        }
    }

    /// Run an export to completion. Never returns an error: every failure is
    /// folded into the returned results.
    pub async fn run(
        &self,
        submission: &ExportSubmission,
        design: &DesignRecord,
        tags: Option<&[ProjectTag]>,
    ) -> ExportReport {
        let session = &submission.session_id;
        self.logger.log("Starting export to the destination platform", session).await;

        let outcome = self.publish_design(submission, design).await;
        let design_result = self.settle("design", outcome, session).await;

        let tags_result = match tags {
            Some(tags) if !tags.is_empty() => {
                let outcome = self.export_tags(submission, tags).await;
                Some(self.settle("tags", outcome, session).await)
            }
            _ => None,
        };

        ExportReport { design: design_result, tags: tags_result }
    }

    async fn settle(
        &self,
        asset: &str,
        outcome: Result<PublishResult>,
        session: &SessionId,
    ) -> PublishResult {
        match outcome {
            Ok(result) => result,
            Err(e) if e.disposition() == ErrorDisposition::DuplicateExpected => {
                self.logger
                    .log(format!("An identical {} export already exists, skipping", asset), session)
                    .await;
                PublishResult::duplicate()
            }
            Err(e) => {
                tracing::error!(session_id = %session, asset, error = %e, "Export failed");
                self.logger.log(format!("Export of {} failed: {}", asset, e), session).await;
                PublishResult::failed(FAILED_MESSAGE)
            }
        }
    }

    async fn publish_design(
        &self,
        submission: &ExportSubmission,
        design: &DesignRecord,
    ) -> Result<PublishResult> {
        let session = &submission.session_id;
        let snippet = submission.design_snippet();

        // CheckDuplicate
        if self.guard.exists(&snippet, AssetCategory::Design).await? {
            return Err(BridgeError::Duplicate { snippet });
        }

        let mut collection =
            self.transformer.to_diagrams(&design.feature_collection, &submission.systems)?;
        self.logger
            .log(format!("Transformed {} features", collection.features.len()), session)
            .await;

        // UploadRaw
        tagcodes::obfuscate_collection(&mut collection);
        let artifact = self.write_artifact("design-", &collection)?;
        let folder =
            self.destination.find_or_create_folder(&submission.project.project_title).await?;

        let properties = ItemProperties {
            title: design.design_name.clone(),
            item_type: RAW_ITEM_TYPE.to_string(),
            snippet: snippet.clone(),
            description: submission.project.project_description.clone(),
            tags: vec!["Geodesignhub".to_string(), submission.project.project_title.clone()],
        };
        let raw = self
            .destination
            .add_item_from_file(&properties, artifact.path(), Some(&folder))
            .await?;
        self.logger.log(format!("Uploaded raw design as item {}", raw.id), session).await;

        self.settle_race(&raw, &snippet).await?;

        // PublishLayer
        let service = self.publish_layer(&raw, &design.design_name, artifact).await?;
        self.logger.log(format!("Published layer service {}", service.url), session).await;

        // Symbolize
        let layers = self.destination.service_layers(&service.url).await?;
        self.symbolize(&layers, &submission.systems).await?;
        self.logger.log("Applied system symbology", session).await;

        let mut message = format!("Design exported as {}", service.title);

        if submission.include_web_map {
            let map = webmap::build_web_map(
                &design.design_name,
                &snippet,
                properties.tags.clone(),
                &layers,
            );
            let map_item = self.destination.save_web_map(&map, Some(&folder)).await?;
            self.logger.log(format!("Saved web map {}", map_item.id), session).await;
            message.push_str(&format!(", web map {}", map_item.id));

            if submission.include_story_map {
                let story = self.publish_story(submission, &map_item).await?;
                message.push_str(&format!(", story {}", story.id));
            }
        }

        self.logger.log("Export complete", session).await;
        Ok(PublishResult::succeeded(service.id, service.url, message))
    }

    /// Keep the oldest of several identical uploads; a later one removes itself
    async fn settle_race(&self, raw: &ContentItem, snippet: &str) -> Result<()> {
        let matches = self.guard.owned_matches(snippet, AssetCategory::Design).await?;
        match matches.first() {
            Some(oldest) if oldest.id != raw.id => {
                tracing::warn!(
                    snippet,
                    kept = %oldest.id,
                    dropped = %raw.id,
                    "Concurrent identical export detected"
                );
                self.destination.delete_item(&raw.id).await?;
                Err(BridgeError::Duplicate { snippet: snippet.to_string() })
            }
            _ => Ok(()),
        }
    }

    /// Publish the raw item. The local artifact is removed before this returns,
    /// and a failed publish also removes the raw item.
    async fn publish_layer(
        &self,
        raw: &ContentItem,
        name: &str,
        artifact: NamedTempFile,
    ) -> Result<ContentItem> {
        let published = self
            .destination
            .publish_item(&raw.id, &schema::publish_parameters(name))
            .await;

        if let Err(e) = artifact.close() {
            tracing::warn!(error = %e, "Failed to remove local design artifact");
        }

        match published {
            Ok(service) => Ok(service),
            Err(e) => {
                if let Err(cleanup) = self.destination.delete_item(&raw.id).await {
                    tracing::warn!(
                        item_id = %raw.id,
                        error = %cleanup,
                        "Failed to remove raw item"
                    );
                }
                Err(BridgeError::publish("PublishLayer", e))
            }
        }
    }

    async fn symbolize(&self, layers: &[ServiceLayer], systems: &[SystemDetail]) -> Result<()> {
        for layer in layers {
            if let Some(geometry) = layer.geometry_type {
                let renderer = UniqueValueRenderer::for_systems(geometry, systems);
                self.destination
                    .update_layer_definition(&layer.url, &renderer.to_definition())
                    .await
                    .map_err(|e| BridgeError::publish("Symbolize", e))?;
            }

            let records = self
                .destination
                .query_features(&layer.url, &tagcodes::prefixed_where_clause())
                .await?;
            let edits = tagcodes::restore_edits(&records);
            if !edits.is_empty() {
                self.destination.apply_edits(&layer.url, &edits).await?;
                tracing::debug!(layer = %layer.name, restored = edits.len(), "Restored tag codes");
            }
        }
        Ok(())
    }

    async fn publish_story(
        &self,
        submission: &ExportSubmission,
        map_item: &ContentItem,
    ) -> Result<ContentItem> {
        let context = StoryContext {
            design_name: submission.design_name.clone(),
            project_id: submission.project_id.clone(),
            project_title: submission.project.project_title.clone(),
            project_description: submission.project.project_description.clone(),
            webmap_id: map_item.id.clone(),
        };
        let template = StoryTemplate::load(self.settings.story_template.as_deref(), &context)?;

        let publisher = StoryPublisher::new(
            self.destination.clone(),
            self.images.clone(),
            self.logger.clone(),
            self.settings.scratch_dir.clone(),
        );
        publisher.publish(&template, &context, &submission.session_id).await
    }

    async fn export_tags(
        &self,
        submission: &ExportSubmission,
        tags: &[ProjectTag],
    ) -> Result<PublishResult> {
        let session = &submission.session_id;
        let snippet = submission.tags_snippet();

        if self.guard.exists(&snippet, AssetCategory::Tags).await? {
            return Err(BridgeError::Duplicate { snippet });
        }

        let artifact = self.write_artifact("tags-", &tags::tags_table(tags))?;
        let folder: Folder =
            self.destination.find_or_create_folder(&submission.project.project_title).await?;
        let properties = ItemProperties {
            title: format!("{} tags", submission.project.project_title),
            item_type: tags::TAGS_ITEM_TYPE.to_string(),
            snippet,
            description: String::new(),
            tags: vec!["Geodesignhub".to_string(), "tags".to_string()],
        };

        let uploaded = self
            .destination
            .add_item_from_file(&properties, artifact.path(), Some(&folder))
            .await;
        if let Err(e) = artifact.close() {
            tracing::warn!(error = %e, "Failed to remove local tags artifact");
        }
        let item = uploaded?;

        self.logger.log(format!("Exported {} project tags", tags.len()), session).await;
        Ok(PublishResult::succeeded(item.id, item.url, "Project tags exported"))
    }

    fn write_artifact(
        &self,
        prefix: &str,
        collection: &FeatureCollection,
    ) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".geojson")
            .tempfile_in(&self.settings.scratch_dir)?;
        serde_json::to_writer(&mut file, collection)?;
        file.flush()?;
        Ok(file)
    }
}
