use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backend::InferenceBackend;
use crate::disaster::{DisasterKind, Horizon, RequestKey};
use crate::error::InferenceError;
use crate::geojson::Feature;
use crate::protocol::InferRequest;

#[derive(Debug)]
struct InflightEntry {
    id: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct InflightState {
    next_id: u64,
    entries: HashMap<RequestKey, InflightEntry>,
}

/// Cancellation handles of requests currently in flight, keyed by grid cell.
///
/// Owned by an orchestrator and shared with its request client. A handle
/// lives exactly as long as its request.
#[derive(Debug, Default)]
pub struct InflightRegistry {
    state: Mutex<InflightState>,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request for `key`, superseding (and cancelling) any request
    /// still registered under the same key.
    fn register(&self, key: RequestKey) -> InflightGuard<'_> {
        let token = CancellationToken::new();
        let mut state = self.state.lock();
        state.next_id = state.next_id.wrapping_add(1);
        let id = state.next_id;
        let entry = InflightEntry {
            id,
            token: token.clone(),
        };
        if let Some(prev) = state.entries.insert(key, entry) {
            debug!(%key, "superseding in-flight request");
            prev.token.cancel();
        }
        InflightGuard {
            registry: self,
            key,
            id,
            token,
        }
    }

    /// Cancel the request registered under `key`.
    ///
    /// Returns `false` when nothing is in flight for that key.
    pub fn cancel(&self, key: RequestKey) -> bool {
        match self.state.lock().entries.get(&key) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every registered request. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let state = self.state.lock();
        for entry in state.entries.values() {
            entry.token.cancel();
        }
        state.entries.len()
    }

    pub fn contains(&self, key: RequestKey) -> bool {
        self.state.lock().entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: RequestKey, id: u64) {
        let mut state = self.state.lock();
        if state.entries.get(&key).is_some_and(|e| e.id == id) {
            state.entries.remove(&key);
        }
    }
}

/// Removes its registry entry on drop, whichever way the request ends.
struct InflightGuard<'a> {
    registry: &'a InflightRegistry,
    key: RequestKey,
    id: u64,
    token: CancellationToken,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.registry.release(self.key, self.id);
    }
}

/// Issues one cancellable inference request per grid cell.
pub struct ForecastRequestClient {
    backend: Arc<dyn InferenceBackend>,
    inflight: Arc<InflightRegistry>,
    timeout: Duration,
}

impl ForecastRequestClient {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        inflight: Arc<InflightRegistry>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            inflight,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inflight(&self) -> &InflightRegistry {
        &self.inflight
    }

    /// Run inference for `(disaster, horizon)`.
    ///
    /// Fails with [`InferenceError::Aborted`] when cancelled mid-flight and
    /// with [`InferenceError::Timeout`] when the backend does not answer
    /// within the client timeout.
    pub async fn infer(
        &self,
        disaster: DisasterKind,
        horizon: Horizon,
        options: &Value,
    ) -> Result<Vec<Feature>, InferenceError> {
        let key = RequestKey::new(disaster, horizon);
        let guard = self.inflight.register(key);
        let request = InferRequest::new(key, options.clone());

        tokio::select! {
            biased;
            _ = guard.token.cancelled() => Err(InferenceError::Aborted(key)),
            res = tokio::time::timeout(self.timeout, self.backend.infer(request)) => {
                res.unwrap_or(Err(InferenceError::Timeout(self.timeout)))
            }
        }
    }

    /// Cancel the in-flight request for `(disaster, horizon)`, if any.
    pub fn cancel(&self, disaster: DisasterKind, horizon: Horizon) -> bool {
        self.inflight.cancel(RequestKey::new(disaster, horizon))
    }

    pub fn cancel_all(&self) -> usize {
        self.inflight.cancel_all()
    }
}
