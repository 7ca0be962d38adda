use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for the migration pipeline
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub design_ttl_secs: ConfigValue<u64>,
    pub status_ttl_secs: ConfigValue<u64>,
    pub job_timeout_secs: ConfigValue<u64>,
    pub worker_slots: ConfigValue<usize>,
    pub source_service_url: ConfigValue<String>,
    pub cdn_endpoint: ConfigValue<String>,
    pub bucket_name: ConfigValue<String>,
    pub scratch_dir: ConfigValue<PathBuf>,
    pub story_template: ConfigValue<Option<PathBuf>>,
    pub grid_spacing_deg: ConfigValue<f64>,
    pub point_buffer_m: ConfigValue<f64>,
    pub simplify_tolerance: ConfigValue<f64>,
    pub target_epsg: ConfigValue<u32>,
    /// Postgres URL for the durable session store; unset means in-memory
    pub database_url: ConfigValue<Option<String>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            design_ttl_secs: ConfigValue::new(60_000, ConfigSource::Default),
            status_ttl_secs: ConfigValue::new(6_000, ConfigSource::Default),
            job_timeout_secs: ConfigValue::new(3_600, ConfigSource::Default),
            worker_slots: ConfigValue::new(2, ConfigSource::Default),
            source_service_url: ConfigValue::new(
                "https://www.geodesignhub.com/api/v1/".to_string(),
                ConfigSource::Default,
            ),
            cdn_endpoint: ConfigValue::new(
                "https://cdn.example.com".to_string(),
                ConfigSource::Default,
            ),
            bucket_name: ConfigValue::new("default-bucket".to_string(), ConfigSource::Default),
            scratch_dir: ConfigValue::new(env::temp_dir(), ConfigSource::Default),
            story_template: ConfigValue::new(None, ConfigSource::Default),
            grid_spacing_deg: ConfigValue::new(0.0005, ConfigSource::Default),
            point_buffer_m: ConfigValue::new(10.0, ConfigSource::Default),
            simplify_tolerance: ConfigValue::new(0.0001, ConfigSource::Default),
            target_epsg: ConfigValue::new(4326, ConfigSource::Default),
            database_url: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| BridgeError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| BridgeError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        self.apply(file_config, ConfigSource::File);
        Ok(self)
    }

    /// Load configuration from `GEOBRIDGE_*` environment variables
    pub fn load_from_env(self) -> Self {
        self.load_from_lookup(|key| env::var(key).ok())
    }

    /// Load `GEOBRIDGE_*` keys through an arbitrary lookup
    pub fn load_from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = FileConfig::default();

        parse_var(&lookup, "GEOBRIDGE_DESIGN_TTL_SECS", &mut values.design_ttl_secs);
        parse_var(&lookup, "GEOBRIDGE_STATUS_TTL_SECS", &mut values.status_ttl_secs);
        parse_var(&lookup, "GEOBRIDGE_JOB_TIMEOUT_SECS", &mut values.job_timeout_secs);
        parse_var(&lookup, "GEOBRIDGE_WORKER_SLOTS", &mut values.worker_slots);
        parse_var(&lookup, "GEOBRIDGE_GRID_SPACING_DEG", &mut values.grid_spacing_deg);
        parse_var(&lookup, "GEOBRIDGE_POINT_BUFFER_M", &mut values.point_buffer_m);
        parse_var(&lookup, "GEOBRIDGE_SIMPLIFY_TOLERANCE", &mut values.simplify_tolerance);
        parse_var(&lookup, "GEOBRIDGE_TARGET_EPSG", &mut values.target_epsg);

        values.source_service_url = lookup("GEOBRIDGE_SOURCE_SERVICE_URL");
        values.cdn_endpoint = lookup("GEOBRIDGE_CDN_ENDPOINT");
        values.bucket_name = lookup("GEOBRIDGE_BUCKET_NAME");
        values.scratch_dir = lookup("GEOBRIDGE_SCRATCH_DIR").map(PathBuf::from);
        values.story_template = lookup("GEOBRIDGE_STORY_TEMPLATE").map(PathBuf::from);
        values.database_url = lookup("GEOBRIDGE_DATABASE_URL");

        self.apply(values, ConfigSource::Environment);
        self
    }

    /// Merge one layer; an invalid value is logged and skipped, the rest still apply
    fn apply(&mut self, values: FileConfig, source: ConfigSource) {
        match values.worker_slots {
            Some(0) => tracing::warn!(
                key = "worker_slots",
                ?source,
                "At least one worker slot is required: ignoring 0"
            ),
            Some(slots) => self.worker_slots.update(slots, source),
            None => {}
        }

        match values.grid_spacing_deg {
            Some(spacing) if !(spacing.is_finite() && spacing > 0.0) => tracing::warn!(
                key = "grid_spacing_deg",
                ?source,
                "Grid spacing must be positive: ignoring {}",
                spacing
            ),
            Some(spacing) => self.grid_spacing_deg.update(spacing, source),
            None => {}
        }

        if let Some(v) = values.design_ttl_secs {
            self.design_ttl_secs.update(v, source);
        }
        if let Some(v) = values.status_ttl_secs {
            self.status_ttl_secs.update(v, source);
        }
        if let Some(v) = values.job_timeout_secs {
            self.job_timeout_secs.update(v, source);
        }
        if let Some(v) = values.source_service_url {
            self.source_service_url.update(v, source);
        }
        if let Some(v) = values.cdn_endpoint {
            self.cdn_endpoint.update(v, source);
        }
        if let Some(v) = values.bucket_name {
            self.bucket_name.update(v, source);
        }
        if let Some(v) = values.scratch_dir {
            self.scratch_dir.update(v, source);
        }
        if let Some(v) = values.story_template {
            self.story_template.update(Some(v), source);
        }
        if let Some(v) = values.point_buffer_m {
            self.point_buffer_m.update(v, source);
        }
        if let Some(v) = values.simplify_tolerance {
            self.simplify_tolerance.update(v, source);
        }
        if let Some(v) = values.target_epsg {
            self.target_epsg.update(v, source);
        }
        if let Some(v) = values.database_url.filter(|url| !url.trim().is_empty()) {
            self.database_url.update(Some(v), source);
        }
    }

    /// Time-to-live for cached design and tag artifacts
    pub fn design_ttl(&self) -> Duration {
        Duration::from_secs(self.design_ttl_secs.value)
    }

    /// Time-to-live for the session status key
    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs.value)
    }

    /// Hard wall-clock limit for a single job
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs.value)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, slot: &mut Option<T>)
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        match raw.parse::<T>() {
            Ok(value) => *slot = Some(value),
            Err(_) => tracing::warn!("Invalid {} value '{}': ignoring", key, raw),
        }
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    design_ttl_secs: Option<u64>,
    status_ttl_secs: Option<u64>,
    job_timeout_secs: Option<u64>,
    worker_slots: Option<usize>,
    source_service_url: Option<String>,
    cdn_endpoint: Option<String>,
    bucket_name: Option<String>,
    scratch_dir: Option<PathBuf>,
    story_template: Option<PathBuf>,
    grid_spacing_deg: Option<f64>,
    point_buffer_m: Option<f64>,
    simplify_tolerance: Option<f64>,
    target_epsg: Option<u32>,
    database_url: Option<String>,
}
