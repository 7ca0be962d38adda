mod exports;
mod health;
mod imports;
mod sessions;

pub use exports::enqueue_export;
pub use health::health_check;
pub use imports::enqueue_import;
pub use sessions::{prepare_session, session_design, session_status};
