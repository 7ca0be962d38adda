//! GeoBridge Store - session store adapters, the typed session cache and
//! the progress logger.

pub mod memory;
pub mod postgres;
pub mod progress;
pub mod session;

pub use memory::MemorySessionStore;
pub use postgres::{PostgresConfig, PostgresSessionStore};
pub use progress::ProgressLogger;
pub use session::SessionCache;
