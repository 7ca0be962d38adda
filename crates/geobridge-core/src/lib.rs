//! GeoBridge Core - Domain models, configuration, and port definitions
//!
//! This crate contains the domain records exchanged by the migration pipeline
//! and the port traits implemented by the session store, the source system,
//! the destination platform, and object storage adapters.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{BridgeError, ErrorDisposition, Result};
