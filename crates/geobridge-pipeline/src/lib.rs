//! GeoBridge Pipeline - the asynchronous migration pipeline.
//!
//! Exports run the format transformer, the idempotency guard and the
//! publishing orchestrator. Imports run one of the import adapters. Both are
//! queued through the job dispatcher and report through the session store.

pub mod dispatch;
pub mod idempotency;
pub mod import;
pub mod prepare;
pub mod publish;
pub mod settings;
pub mod status;
pub mod story;
pub mod transform;

pub use dispatch::{
    Collaborators, Job, JobHooks, LocalJobQueue, MigrationRunner, PipelineRunner,
    SessionStatusHooks, UnitOfWork,
};
pub use idempotency::{AssetCategory, IdempotencyGuard};
pub use import::{
    run_batch, BatchSummary, ImportAdapter, ItemFailure, PackageImporter, ServiceImporter,
};
pub use prepare::{DesignDownloader, DesignRequest, PreparedSession};
pub use publish::{ExportReport, PublishingOrchestrator};
pub use settings::PipelineSettings;
pub use status::StatusReader;
pub use transform::FormatTransformer;
