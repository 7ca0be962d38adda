use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use geobridge_clients::{
    HttpImageSource, HttpSourceConnector, MemoryDestination, MemoryDestinationConnector,
    MemoryObjectStorage,
};
use geobridge_core::config::LayeredConfig;
use geobridge_core::ports::{LayerCodec, SessionStore};
use geobridge_pipeline::{
    Collaborators, DesignDownloader, FormatTransformer, LocalJobQueue, PipelineRunner,
    PipelineSettings, SessionStatusHooks, StatusReader,
};
use geobridge_store::{
    MemorySessionStore, PostgresConfig, PostgresSessionStore, ProgressLogger, SessionCache,
};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geobridge_api::{create_router, ApiConfig, AppState};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geobridge=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_config = ApiConfig::from_env();
    let config = api_config.pipeline_config().context("Failed to load configuration")?;
    let settings = PipelineSettings::from(&config);

    tracing::info!(
        port = api_config.port,
        worker_slots = config.worker_slots.value,
        source = %config.source_service_url.value,
        scratch_dir = %settings.scratch_dir.display(),
        "Starting GeoBridge API server"
    );

    let store = session_store(&config).await?;
    let cache = SessionCache::from_config(store.clone(), &config);
    let logger = ProgressLogger::new(store.clone(), config.design_ttl());

    tracing::warn!(
        "Using in-memory destination platform and object storage; published content is not \
         persisted across restarts"
    );
    let sources = Arc::new(HttpSourceConnector::new(config.source_service_url.value.clone()));
    let collaborators = Collaborators {
        destinations: Arc::new(MemoryDestinationConnector::new(MemoryDestination::new(
            "geobridge",
        ))),
        sources: sources.clone(),
        storage: Arc::new(MemoryObjectStorage::new(config.cdn_endpoint.value.clone())),
        images: Arc::new(HttpImageSource::new()),
        codec: archive_codec(),
    };

    let transformer = FormatTransformer::from_settings(&settings);
    let runner = PipelineRunner::new(collaborators, cache.clone(), logger.clone(), settings);
    let hooks = SessionStatusHooks::new(cache.clone(), logger.clone());
    let queue = LocalJobQueue::start(config.worker_slots.value, Arc::new(runner), Arc::new(hooks));

    let state = Arc::new(AppState::new(
        Arc::new(queue),
        Arc::new(DesignDownloader::new(sources, cache.clone(), logger.clone(), transformer)),
        StatusReader::new(cache, logger),
        config.job_timeout(),
    ));

    let cors = CorsLayer::new()
        .allow_origin(api_config.cors_origin.parse::<HeaderValue>().context("Invalid CORS origin")?)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(state).layer(cors);

    let addr = api_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", api_config.cors_origin);

    axum::serve(listener, app).await?;
    Ok(())
}

/// PostgreSQL when a database URL is configured, otherwise in-memory
async fn session_store(config: &LayeredConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    match &config.database_url.value {
        Some(url) => {
            let postgres = PostgresConfig::new(url.clone())?;
            let store = PostgresSessionStore::connect(postgres)
                .await
                .context("Failed to open the session store")?;
            tracing::info!("Using PostgreSQL session store");

            let purger = store.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(PURGE_INTERVAL);
                loop {
                    ticker.tick().await;
                    match purger.purge_expired().await {
                        Ok(0) => {}
                        Ok(purged) => tracing::debug!(purged, "Purged expired session keys"),
                        Err(e) => tracing::warn!(error = %e, "Failed to purge session keys"),
                    }
                }
            });
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!(
                "GEOBRIDGE_DATABASE_URL not set; session state is kept in memory and lost on restart"
            );
            let store = MemorySessionStore::new();

            let purger = store.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(PURGE_INTERVAL);
                loop {
                    ticker.tick().await;
                    let purged = purger.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "Purged expired session keys");
                    }
                }
            });
            Ok(Arc::new(store))
        }
    }
}

#[cfg(feature = "gdal")]
fn archive_codec() -> Option<Arc<dyn LayerCodec>> {
    Some(Arc::new(geobridge_geo::gdal_codec::GdalCodec))
}

#[cfg(not(feature = "gdal"))]
fn archive_codec() -> Option<Arc<dyn LayerCodec>> {
    tracing::warn!("Built without the gdal feature; GeoPackage imports are disabled");
    None
}
