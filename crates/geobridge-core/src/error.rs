//! Error types for GeoBridge

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    // Remote collaborator errors
    #[error("{service} returned HTTP {status}: {message}")]
    Upstream {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Could not reach {service}: {reason}")]
    Unreachable { service: String, reason: String },

    // Transform errors
    #[error("Unsupported geometry {geometry_type} at feature {index}")]
    UnsupportedGeometry { index: usize, geometry_type: String },

    #[error("Invalid properties at feature {index}: {reason}")]
    InvalidProperties { index: usize, reason: String },

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Reprojection from EPSG:{from} to EPSG:{to} failed: {reason}")]
    Reprojection { from: u32, to: u32, reason: String },

    // Publishing errors
    #[error("An asset with snippet '{snippet}' already exists")]
    Duplicate { snippet: String },

    #[error("Publishing step {step} failed: {reason}")]
    Publish { step: String, reason: String },

    #[error("Invalid story template: {reason}")]
    Template { reason: String },

    #[error("Invalid table: {reason}")]
    TableShape { reason: String },

    // Import errors
    #[error("Object storage unavailable: {reason}")]
    StorageUnavailable { reason: String },

    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: String },

    #[error("Failed to read {path}: {reason}")]
    UnreadableArchive { path: PathBuf, reason: String },

    // Session errors
    #[error("Session artifact not found: {key}")]
    SessionMissing { key: String },

    // Job errors
    #[error("Job {job_id} exceeded its {seconds}s timeout")]
    Timeout { job_id: String, seconds: u64 },

    #[error("Job {job_id} aborted: {reason}")]
    JobAborted { job_id: String, reason: String },

    #[error("Job queue closed")]
    QueueClosed,

    // Session store errors
    #[error("Session store error: {0}")]
    Database(String),

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// How the pipeline reacts to an error raised inside a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// The current run ends in `Failed`
    StepFatal,
    /// The current batch item is logged and skipped, the batch continues
    SkipItem,
    /// A normal terminal outcome, reported as a duplicate
    DuplicateExpected,
    /// The whole batch stops before any further item is processed
    AbortBatch,
}

impl BridgeError {
    /// Classify this error for the orchestrator and import adapters
    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            BridgeError::Duplicate { .. } => ErrorDisposition::DuplicateExpected,
            BridgeError::StorageUnavailable { .. }
            | BridgeError::QueueClosed
            | BridgeError::Database(_) => ErrorDisposition::AbortBatch,
            BridgeError::ItemNotFound { .. }
            | BridgeError::UnreadableArchive { .. }
            | BridgeError::Reprojection { .. }
            | BridgeError::Geometry(_)
            | BridgeError::Io(_) => ErrorDisposition::SkipItem,
            _ => ErrorDisposition::StepFatal,
        }
    }

    /// Build an upstream error from a status code and response body
    pub fn upstream(service: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        BridgeError::Upstream {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    /// Build a publish step error
    pub fn publish(step: impl Into<String>, reason: impl ToString) -> Self {
        BridgeError::Publish {
            step: step.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
