mod config;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use clap::Parser;
use forecast::{
    ConfigError, ForecastConfig, ForecastFeed, ForecastOrchestrator, HttpBackend, InferenceBackend,
};
use layers::{OverlayRenderer, SatellitePosition, StyleTable};
use parking_lot::RwLock;
use runtime::Poller;
use tokio::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Args, ServerConfig};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    poller: Arc<Poller<ForecastFeed>>,
    renderer: Arc<OverlayRenderer>,
    satellites: Arc<RwLock<Vec<SatellitePosition>>>,
    highlighted: Arc<RwLock<Option<String>>>,
    started: Instant,
}

impl AppState {
    /// Wire the forecast pipeline. Polling is left stopped.
    pub fn from_config(
        backend: Arc<dyn InferenceBackend>,
        config: &ForecastConfig,
    ) -> Result<Self, ConfigError> {
        let orchestrator = ForecastOrchestrator::from_config(backend, config)?;
        let renderer = OverlayRenderer::new(StyleTable::default(), orchestrator.horizons().to_vec());
        let feed = Arc::new(ForecastFeed::new(orchestrator));

        Ok(Self {
            poller: Arc::new(Poller::new(feed, config.poll_interval())),
            renderer: Arc::new(renderer),
            satellites: Arc::new(RwLock::new(Vec::new())),
            highlighted: Arc::new(RwLock::new(None)),
            started: Instant::now(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/overlay/status", get(routes::get_status))
        .route("/overlay/snapshot", get(routes::get_snapshot))
        .route("/overlay/frame", get(routes::get_frame))
        .route("/overlay/enabled", post(routes::set_enabled))
        .route("/satellites", put(routes::put_satellites))
        .route(
            "/satellites/highlight",
            get(routes::get_highlight).post(routes::set_highlight),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(&args)?;

    let http = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    let backend = Arc::new(HttpBackend::with_client(&config.forecast.api_base, http));
    info!(endpoint = backend.endpoint(), "using inference backend");

    let state = AppState::from_config(backend, &config.forecast)?;
    state.poller.set_enabled(config.forecast.enabled);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("overlay server listening on http://{}", config.addr);
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.poller.stop();
    info!("overlay server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
