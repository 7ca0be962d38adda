use geobridge_core::config::LayeredConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Tunables the pipeline reads from the layered configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub scratch_dir: PathBuf,
    pub story_template: Option<PathBuf>,
    pub grid_spacing_deg: f64,
    pub point_buffer_m: f64,
    pub simplify_tolerance: f64,
    pub target_epsg: u32,
    pub job_timeout: Duration,
}

impl From<&LayeredConfig> for PipelineSettings {
    fn from(config: &LayeredConfig) -> Self {
        Self {
            scratch_dir: config.scratch_dir.value.clone(),
            story_template: config.story_template.value.clone(),
            grid_spacing_deg: config.grid_spacing_deg.value,
            point_buffer_m: config.point_buffer_m.value,
            simplify_tolerance: config.simplify_tolerance.value,
            target_epsg: config.target_epsg.value,
            job_timeout: config.job_timeout(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&LayeredConfig::with_defaults())
    }
}
