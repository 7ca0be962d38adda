use geobridge_pipeline::{DesignDownloader, LocalJobQueue, StatusReader};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<LocalJobQueue>,
    pub downloader: Arc<DesignDownloader>,
    pub status: StatusReader,
    pub job_timeout: Duration,
}

impl AppState {
    pub fn new(
        queue: Arc<LocalJobQueue>,
        downloader: Arc<DesignDownloader>,
        status: StatusReader,
        job_timeout: Duration,
    ) -> Self {
        Self { queue, downloader, status, job_timeout }
    }
}
