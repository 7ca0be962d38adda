mod response;

pub use response::{EnqueueResponse, HealthResponse};
