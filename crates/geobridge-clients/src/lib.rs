//! GeoBridge Clients - adapters for the remote collaborators.
//!
//! The source system and image downloads go over HTTP. The destination
//! platform, object storage and a scripted source system are provided as
//! in-memory adapters for local runs and tests.

pub mod media;
pub mod memory;
pub mod source;

pub use media::HttpImageSource;
pub use memory::{
    CallCounts, MemoryDestination, MemoryDestinationConnector, MemoryObjectStorage,
    MemorySourceConnector, MemorySourceSystem,
};
pub use source::{HttpSourceClient, HttpSourceConnector};
