//! Job Dispatcher
//!
//! Jobs are keyed by their session id and run on a fixed number of worker
//! slots, one job per slot at a time. Enqueueing never waits for a job. When a
//! job ends, the worker calls exactly one of the [`JobHooks`]; a job that
//! overruns its timeout is aborted and reported as a failure, leaving anything
//! it already wrote in place. Each job runs in its own task, so a job that
//! panics is reported as a failure and the slot keeps serving the queue.

use async_trait::async_trait;
use geobridge_core::models::{
    ExportSubmission, ImportFormat, MigrationBatch, PublishResult, SessionId,
};
use geobridge_core::ports::{
    DestinationConnector, ImageSource, LayerCodec, ObjectStorage, SourceConnector,
};
use geobridge_core::{BridgeError, Result};
use geobridge_store::{ProgressLogger, SessionCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::import::{PackageImporter, ServiceImporter};
use crate::publish::PublishingOrchestrator;
use crate::settings::PipelineSettings;

/// A migration to run in the background
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOfWork {
    ExportDesign(ExportSubmission),
    ImportBatch(MigrationBatch),
}

impl UnitOfWork {
    pub fn name(&self) -> &'static str {
        match self {
            UnitOfWork::ExportDesign(_) => "export_design",
            UnitOfWork::ImportBatch(_) => "import_batch",
        }
    }

    pub fn session_id(&self) -> SessionId {
        match self {
            UnitOfWork::ExportDesign(submission) => submission.session_id,
            UnitOfWork::ImportBatch(batch) => batch.session_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Always the session id of the unit of work
    pub id: SessionId,
    pub unit: UnitOfWork,
    pub timeout: Duration,
}

impl Job {
    pub fn new(unit: UnitOfWork, timeout: Duration) -> Self {
        Self { id: unit.session_id(), unit, timeout }
    }
}

/// Executes a unit of work to its terminal result
#[async_trait]
pub trait MigrationRunner: Send + Sync {
    async fn run(&self, unit: &UnitOfWork) -> Result<PublishResult>;
}

/// Completion callbacks invoked by the worker, never by the enqueuing caller
#[async_trait]
pub trait JobHooks: Send + Sync {
    async fn on_success(&self, job_id: &SessionId, result: &PublishResult);

    async fn on_failure(&self, job_id: &SessionId, error: &BridgeError);
}

/// Hooks that publish the terminal result through the session store
#[derive(Clone)]
pub struct SessionStatusHooks {
    cache: SessionCache,
    logger: ProgressLogger,
}

impl SessionStatusHooks {
    pub fn new(cache: SessionCache, logger: ProgressLogger) -> Self {
        Self { cache, logger }
    }

    async fn record(&self, job_id: &SessionId, result: &PublishResult) {
        if let Err(e) = self.cache.write_status(job_id, result).await {
            tracing::error!(session_id = %job_id, error = %e, "Failed to write session status");
        }
    }
}

#[async_trait]
impl JobHooks for SessionStatusHooks {
    async fn on_success(&self, job_id: &SessionId, result: &PublishResult) {
        self.record(job_id, result).await;
        self.logger.log(format!("Job finished: {}", result.message), job_id).await;
    }

    async fn on_failure(&self, job_id: &SessionId, error: &BridgeError) {
        self.record(job_id, &PublishResult::failed(error.to_string())).await;
        self.logger.log(format!("Job failed: {}", error), job_id).await;
    }
}

/// Process-wide collaborators handed to every job
#[derive(Clone)]
pub struct Collaborators {
    pub destinations: Arc<dyn DestinationConnector>,
    pub sources: Arc<dyn SourceConnector>,
    pub storage: Arc<dyn ObjectStorage>,
    pub images: Arc<dyn ImageSource>,
    /// Archive codec; GeoPackage batches are rejected without one
    pub codec: Option<Arc<dyn LayerCodec>>,
}

/// Runs exports through the orchestrator and batches through an adapter
pub struct PipelineRunner {
    collaborators: Collaborators,
    cache: SessionCache,
    logger: ProgressLogger,
    settings: PipelineSettings,
}

impl PipelineRunner {
    pub fn new(
        collaborators: Collaborators,
        cache: SessionCache,
        logger: ProgressLogger,
        settings: PipelineSettings,
    ) -> Self {
        Self { collaborators, cache, logger, settings }
    }

    async fn export(&self, submission: &ExportSubmission) -> Result<PublishResult> {
        submission.validate()?;
        let destination = self.collaborators.destinations.connect(&submission.destination_token)?;
        let design = self.cache.load_design(&submission.session_id).await?;
        let tags = self.cache.load_tags(&submission.session_id).await?;

        let orchestrator = PublishingOrchestrator::new(
            destination,
            self.collaborators.images.clone(),
            self.logger.clone(),
            self.settings.clone(),
        );
        let report = orchestrator.run(submission, &design, tags.as_deref()).await;

        if let Some(tags) = &report.tags {
            tracing::info!(
                session_id = %submission.session_id,
                outcome = ?tags.outcome(),
                "Tag export finished"
            );
        }
        Ok(report.design)
    }

    async fn import(&self, batch: &MigrationBatch) -> Result<PublishResult> {
        batch.validate()?;
        let destination = self.collaborators.destinations.connect(&batch.source_token)?;

        let summary = match batch.format {
            ImportFormat::GeoPackage => {
                let codec = self.collaborators.codec.clone().ok_or_else(|| {
                    BridgeError::ConfigInvalid {
                        key: "format".to_string(),
                        reason: "GeoPackage imports need an archive codec".to_string(),
                    }
                })?;
                PackageImporter::new(
                    destination,
                    self.collaborators.storage.clone(),
                    self.collaborators.sources.clone(),
                    codec,
                    self.logger.clone(),
                    self.settings.clone(),
                )
                .run(batch)
                .await?
            }
            ImportFormat::FeatureService => {
                ServiceImporter::new(
                    destination,
                    self.collaborators.sources.clone(),
                    self.logger.clone(),
                    self.settings.scratch_dir.clone(),
                )
                .run(batch)
                .await?
            }
        };
        Ok(summary.to_publish_result())
    }
}

#[async_trait]
impl MigrationRunner for PipelineRunner {
    async fn run(&self, unit: &UnitOfWork) -> Result<PublishResult> {
        match unit {
            UnitOfWork::ExportDesign(submission) => self.export(submission).await,
            UnitOfWork::ImportBatch(batch) => self.import(batch).await,
        }
    }
}

/// In-process job queue with a fixed pool of worker slots
pub struct LocalJobQueue {
    sender: mpsc::UnboundedSender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl LocalJobQueue {
    /// Spawn `slots` workers; must be called inside a Tokio runtime
    pub fn start(
        slots: usize,
        runner: Arc<dyn MigrationRunner>,
        hooks: Arc<dyn JobHooks>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..slots.max(1))
            .map(|slot| {
                let receiver = receiver.clone();
                let runner = runner.clone();
                let hooks = hooks.clone();
                tokio::spawn(async move {
                    loop {
                        let job = receiver.lock().await.recv().await;
                        match job {
                            Some(job) => execute(slot, job, runner.clone(), hooks.as_ref()).await,
                            None => break,
                        }
                    }
                    tracing::debug!(slot, "Worker stopped");
                })
            })
            .collect();

        Self { sender, workers }
    }

    /// Queue a job and return its id immediately
    pub fn enqueue(&self, job: Job) -> Result<SessionId> {
        let id = job.id;
        let name = job.unit.name();
        self.sender.send(job).map_err(|_| BridgeError::QueueClosed)?;
        tracing::info!(job_id = %id, unit = name, "Job enqueued");
        Ok(id)
    }

    /// Stop accepting jobs and wait for queued ones to finish
    pub async fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Worker terminated abnormally");
            }
        }
    }
}

async fn execute(slot: usize, job: Job, runner: Arc<dyn MigrationRunner>, hooks: &dyn JobHooks) {
    tracing::info!(slot, job_id = %job.id, unit = job.unit.name(), "Job started");

    let unit = job.unit.clone();
    let mut handle = tokio::spawn(async move { runner.run(&unit).await });

    match tokio::time::timeout(job.timeout, &mut handle).await {
        Ok(Ok(Ok(result))) => hooks.on_success(&job.id, &result).await,
        Ok(Ok(Err(e))) => {
            tracing::error!(job_id = %job.id, error = %e, "Job failed");
            hooks.on_failure(&job.id, &e).await
        }
        Ok(Err(join_error)) => {
            let error = BridgeError::JobAborted {
                job_id: job.id.to_string(),
                reason: abort_reason(join_error),
            };
            tracing::error!(slot, job_id = %job.id, error = %error, "Job aborted");
            hooks.on_failure(&job.id, &error).await
        }
        Err(_) => {
            handle.abort();
            let error = BridgeError::Timeout {
                job_id: job.id.to_string(),
                seconds: job.timeout.as_secs(),
            };
            tracing::error!(job_id = %job.id, "Job timed out");
            hooks.on_failure(&job.id, &error).await
        }
    }
}

fn abort_reason(error: tokio::task::JoinError) -> String {
    if !error.is_panic() {
        return "cancelled".to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
