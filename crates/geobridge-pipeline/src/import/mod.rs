//! Import Adapters
//!
//! Both adapters share one batch template: a preflight check, then every item
//! whose type matches the batch format, each in isolation. A per-item failure
//! is recorded and the batch moves on; only an abort-class error stops it.
//! The scratch directory lives for the whole batch and is removed once, after
//! the last item.

pub mod package;
pub mod service;

pub use package::PackageImporter;
pub use service::ServiceImporter;

use async_trait::async_trait;
use geobridge_core::models::{
    ImportFormat, MigrationBatch, MigrationItem, PublishResult, SessionId,
};
use geobridge_core::{ErrorDisposition, Result};
use geobridge_store::ProgressLogger;
use std::path::Path;

/// Funding and cost classification posted with imported diagrams
pub(crate) const FUNDING_TYPE: &str = "o";
pub(crate) const COST_TYPE: &str = "t";

/// A failed batch item and why it failed
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub source_id: String,
    pub source_title: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Items whose type matched the batch format
    pub total_items: usize,

    /// Source ids of imported items
    pub successful: Vec<String>,

    pub failed: Vec<ItemFailure>,

    /// Diagrams posted to the source system across all items
    pub diagrams_posted: usize,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, item: &MigrationItem, diagrams: usize) {
        self.successful.push(item.source_id.clone());
        self.diagrams_posted += diagrams;
    }

    pub fn add_failure(&mut self, item: &MigrationItem, reason: impl Into<String>) {
        self.failed.push(ItemFailure {
            source_id: item.source_id.clone(),
            source_title: item.source_title.clone(),
            reason: reason.into(),
        });
    }

    pub fn success_count(&self) -> usize {
        self.successful.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Terminal result for the session status key
    pub fn to_publish_result(&self) -> PublishResult {
        let message = format!(
            "Imported {} of {} items ({} diagrams), {} failed",
            self.success_count(),
            self.total_items,
            self.diagrams_posted,
            self.failure_count()
        );
        if self.successful.is_empty() {
            PublishResult::failed(message)
        } else {
            PublishResult::succeeded(self.successful.join(","), String::new(), message)
        }
    }
}

/// One format-specific import pipeline
#[async_trait]
pub trait ImportAdapter: Send + Sync {
    fn format(&self) -> ImportFormat;

    /// Runs once before any item; an error here aborts the batch
    async fn preflight(&self, _session: &SessionId) -> Result<()> {
        Ok(())
    }

    /// Import one item, returning the number of diagrams posted
    async fn import_item(
        &self,
        item: &MigrationItem,
        scratch: &Path,
        session: &SessionId,
    ) -> Result<usize>;
}

/// Run every matching item of `batch` through `adapter`
pub async fn run_batch(
    adapter: &dyn ImportAdapter,
    batch: &MigrationBatch,
    scratch_root: &Path,
    logger: &ProgressLogger,
) -> Result<BatchSummary> {
    let session = &batch.session_id;
    if batch.format != adapter.format() {
        tracing::warn!(
            batch_format = ?batch.format,
            adapter_format = ?adapter.format(),
            "Batch handed to an adapter for another format"
        );
    }

    if let Err(e) = adapter.preflight(session).await {
        logger.log(format!("Import aborted: {}", e), session).await;
        return Err(e);
    }

    let scratch = tempfile::Builder::new().prefix("import-").tempdir_in(scratch_root)?;
    let mut summary = BatchSummary::new();

    for item in &batch.items {
        if !batch.format.matches(&item.source_type) {
            let reason = format!(
                "Skipping {}: {} is not {}",
                item.source_title,
                item.source_type,
                batch.format.item_type()
            );
            logger.log(reason, session).await;
            continue;
        }

        summary.total_items += 1;
        logger.log(format!("Processing {}", item.source_title), session).await;

        match adapter.import_item(item, scratch.path(), session).await {
            Ok(diagrams) => {
                logger.log(format!("Finished {}", item.source_title), session).await;
                summary.add_success(item, diagrams);
            }
            Err(e) if e.disposition() == ErrorDisposition::AbortBatch => {
                let reason = format!("Import aborted at {}: {}", item.source_title, e);
                logger.log(reason, session).await;
                return Err(e);
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session,
                    item = %item.source_id,
                    error = %e,
                    "Import item failed"
                );
                logger.log(format!("Error processing {}: {}", item.source_title, e), session).await;
                summary.add_failure(item, e.to_string());
            }
        }
    }

    if let Err(e) = scratch.close() {
        tracing::warn!(error = %e, "Failed to remove import scratch directory");
    }

    logger
        .log(
            format!(
                "Import finished: {} succeeded, {} failed",
                summary.success_count(),
                summary.failure_count()
            ),
            session,
        )
        .await;
    Ok(summary)
}
