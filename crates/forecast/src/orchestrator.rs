use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::backend::InferenceBackend;
use crate::client::{ForecastRequestClient, InflightRegistry};
use crate::config::{ConfigError, ForecastConfig};
use crate::disaster::{DisasterKind, Horizon, RequestKey};
use crate::geojson::Feature;
use crate::snapshot::ForecastSnapshot;

/// Fans a full {disaster x horizon} grid out to the inference backend and
/// folds the results into one snapshot.
///
/// A failing cell degrades to an empty feature list; it never aborts the
/// cycle or its siblings. The orchestrator owns the registry of in-flight
/// cancellation handles and shares it with its request client.
pub struct ForecastOrchestrator {
    client: ForecastRequestClient,
    inflight: Arc<InflightRegistry>,
    horizons: Vec<Horizon>,
    options: Value,
}

impl ForecastOrchestrator {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        horizons: Vec<Horizon>,
        request_timeout: Duration,
    ) -> Self {
        let inflight = Arc::new(InflightRegistry::new());
        let mut unique: Vec<Horizon> = Vec::with_capacity(horizons.len());
        for h in horizons {
            if !unique.contains(&h) {
                unique.push(h);
            }
        }
        Self {
            client: ForecastRequestClient::new(backend, inflight.clone(), request_timeout),
            inflight,
            horizons: unique,
            options: Value::Object(Map::new()),
        }
    }

    pub fn from_config(
        backend: Arc<dyn InferenceBackend>,
        config: &ForecastConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(backend, config.horizons()?, config.request_timeout())
            .with_options(config.options.clone()))
    }

    /// Options forwarded with every request.
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    pub fn client(&self) -> &ForecastRequestClient {
        &self.client
    }

    pub fn inflight(&self) -> &InflightRegistry {
        &self.inflight
    }

    /// Every grid cell, disaster-major in [`DisasterKind::ALL`] order.
    pub fn grid(&self) -> Vec<RequestKey> {
        DisasterKind::ALL
            .into_iter()
            .flat_map(|disaster| {
                self.horizons
                    .iter()
                    .map(move |&horizon| RequestKey::new(disaster, horizon))
            })
            .collect()
    }

    /// Run one full cycle: issue every cell, wait for all of them, and build
    /// the snapshot. Nothing is published here.
    pub async fn run_cycle(&self) -> ForecastSnapshot {
        let started = Instant::now();
        let cells = self.grid().into_iter().map(|key| async move {
            let features = self.run_cell(key).await;
            (key, features)
        });
        let snapshot = ForecastSnapshot::from_cells(join_all(cells).await);

        debug!(
            cells = snapshot.cell_count(),
            features = snapshot.feature_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "forecast cycle complete"
        );
        snapshot
    }

    async fn run_cell(&self, key: RequestKey) -> Vec<Feature> {
        match self
            .client
            .infer(key.disaster, key.horizon, &self.options)
            .await
        {
            Ok(features) => features,
            Err(err) if err.is_abort() => {
                debug!(%key, "forecast request cancelled");
                Vec::new()
            }
            Err(err) => {
                warn!(%key, status = ?err.status(), "forecast request failed: {err}");
                Vec::new()
            }
        }
    }

    pub fn cancel(&self, key: RequestKey) -> bool {
        self.client.cancel(key.disaster, key.horizon)
    }

    /// Best-effort cancellation of every in-flight request.
    pub fn cancel_all(&self) -> usize {
        self.client.cancel_all()
    }
}
