use geobridge_core::config::LayeredConfig;
use geobridge_core::Result;
use std::env;
use std::path::PathBuf;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    /// Optional TOML file layered between defaults and the environment
    pub config_file: Option<PathBuf>,
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("GEOBRIDGE_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(5001);

        let cors_origin = env::var("GEOBRIDGE_CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let config_file = env::var("GEOBRIDGE_CONFIG").ok().map(PathBuf::from);

        Self { port, cors_origin, config_file }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Pipeline configuration: defaults, then the config file, then `GEOBRIDGE_*`
    pub fn pipeline_config(&self) -> Result<LayeredConfig> {
        let config = match &self.config_file {
            Some(path) => LayeredConfig::with_defaults().load_from_file(path)?,
            None => LayeredConfig::with_defaults(),
        };
        Ok(config.load_from_env())
    }
}
