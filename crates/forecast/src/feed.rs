use parking_lot::Mutex;
use runtime::{BoxFuture, PollTask};
use tracing::{debug, info};

use crate::cache::ForecastCache;
use crate::orchestrator::ForecastOrchestrator;

/// An orchestrator paired with the cache its cycles publish into.
///
/// This is what the poller drives: each cycle runs the full grid and replaces
/// the cached snapshot once every cell has resolved.
///
/// `reset` starts a new epoch; a cycle that began in an earlier epoch never
/// publishes, even if it is still finishing on another worker.
pub struct ForecastFeed {
    orchestrator: ForecastOrchestrator,
    cache: ForecastCache,
    epoch: Mutex<u64>,
}

impl ForecastFeed {
    pub fn new(orchestrator: ForecastOrchestrator) -> Self {
        Self::with_cache(orchestrator, ForecastCache::new())
    }

    pub fn with_cache(orchestrator: ForecastOrchestrator, cache: ForecastCache) -> Self {
        Self {
            orchestrator,
            cache,
            epoch: Mutex::new(0),
        }
    }

    pub fn orchestrator(&self) -> &ForecastOrchestrator {
        &self.orchestrator
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    /// Run one cycle and publish it. Returns the published sequence number, or
    /// `None` when the feed was reset while the cycle ran.
    pub async fn refresh(&self) -> Option<u64> {
        let epoch = *self.epoch.lock();
        let snapshot = self.orchestrator.run_cycle().await;
        let cells = snapshot.cell_count();
        let features = snapshot.feature_count();

        let current = self.epoch.lock();
        if *current != epoch {
            debug!(cells, "discarding snapshot of a reset cycle");
            return None;
        }
        let cycle = self.cache.publish(snapshot);
        drop(current);

        info!(cycle, cells, features, "forecast snapshot published");
        Some(cycle)
    }
}

impl PollTask for ForecastFeed {
    fn run_cycle(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.refresh().await;
        })
    }

    fn cancel_inflight(&self) {
        let cancelled = self.orchestrator.cancel_all();
        debug!(cancelled, "cancelled in-flight forecast requests");
    }

    fn reset(&self) {
        let mut epoch = self.epoch.lock();
        *epoch = epoch.wrapping_add(1);
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use runtime::{BoxFuture, PollTask, Poller};
    use tokio::sync::Notify;

    use super::ForecastFeed;
    use crate::backend::InferenceBackend;
    use crate::disaster::{DisasterKind, Horizon};
    use crate::error::InferenceError;
    use crate::geojson::{Feature, Geometry};
    use crate::orchestrator::ForecastOrchestrator;
    use crate::protocol::InferRequest;

    /// Answers with one point per cell; with `hang` set, never answers.
    #[derive(Default)]
    struct CountingBackend {
        calls: AtomicUsize,
        hang: bool,
        entered: Notify,
    }

    impl InferenceBackend for CountingBackend {
        fn infer(
            &self,
            _request: InferRequest,
        ) -> BoxFuture<'_, Result<Vec<Feature>, InferenceError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.entered.notify_one();
                if self.hang {
                    std::future::pending::<()>().await;
                }
                Ok(vec![Feature::new(Geometry::point(0.0, 0.0))])
            })
        }
    }

    /// Holds every request until `gate` fires.
    #[derive(Default)]
    struct GatedBackend {
        entered: Notify,
        gate: Notify,
    }

    impl InferenceBackend for GatedBackend {
        fn infer(
            &self,
            _request: InferRequest,
        ) -> BoxFuture<'_, Result<Vec<Feature>, InferenceError>> {
            Box::pin(async move {
                self.entered.notify_one();
                self.gate.notified().await;
                Ok(vec![Feature::new(Geometry::point(1.0, 1.0))])
            })
        }
    }

    /// Blocks its worker thread inside the poll, so the answer cannot be
    /// interrupted by aborting the task.
    struct BlockingBackend {
        entered: Notify,
        block: Duration,
    }

    impl InferenceBackend for BlockingBackend {
        fn infer(
            &self,
            _request: InferRequest,
        ) -> BoxFuture<'_, Result<Vec<Feature>, InferenceError>> {
            Box::pin(async move {
                self.entered.notify_one();
                std::thread::sleep(self.block);
                Ok(vec![Feature::new(Geometry::point(2.0, 2.0))])
            })
        }
    }

    fn feed(backend: Arc<dyn InferenceBackend>, horizons: &[u32]) -> Arc<ForecastFeed> {
        let horizons = horizons
            .iter()
            .map(|&hours| Horizon::new(hours).expect("horizon"))
            .collect();
        Arc::new(ForecastFeed::new(ForecastOrchestrator::new(
            backend,
            horizons,
            Duration::from_secs(30),
        )))
    }

    #[tokio::test]
    async fn refresh_publishes_a_full_snapshot() {
        let backend = Arc::new(CountingBackend::default());
        let feed = feed(backend.clone(), &[6, 12]);

        assert_eq!(feed.refresh().await, Some(1));
        let snap = feed.cache().latest();
        assert_eq!(snap.cycle, 1);
        assert_eq!(snap.cell_count(), 6);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_publishes_on_start_and_interval() {
        let backend = Arc::new(CountingBackend::default());
        let feed = feed(backend.clone(), &[6]);
        let poller = Poller::new(feed.clone(), Duration::from_secs(60));

        poller.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(feed.cache().published_cycles(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(feed.cache().published_cycles(), 2);
        assert_eq!(feed.cache().latest().cell_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_requests_and_issues_no_more() {
        let backend = Arc::new(CountingBackend {
            hang: true,
            ..CountingBackend::default()
        });
        let feed = feed(backend.clone(), &[6, 12]);
        let poller = Poller::new(feed.clone(), Duration::from_secs(10));

        poller.start();
        backend.entered.notified().await;
        tokio::task::yield_now().await;
        assert_eq!(feed.orchestrator().inflight().len(), 6);

        poller.stop();
        let calls_at_stop = backend.calls.load(Ordering::SeqCst);
        assert_eq!(calls_at_stop, 6);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), calls_at_stop);
        assert!(feed.orchestrator().inflight().is_empty());
        assert_eq!(feed.cache().published_cycles(), 0);
        assert!(feed.cache().latest().is_empty());
        assert_eq!(DisasterKind::ALL.len() * 2, calls_at_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn disable_discards_snapshot_and_enable_refetches() {
        let backend = Arc::new(CountingBackend::default());
        let feed = feed(backend.clone(), &[24]);
        let poller = Poller::new(feed.clone(), Duration::from_secs(60));

        poller.set_enabled(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(feed.cache().latest().cell_count(), 3);

        poller.set_enabled(false);
        assert!(feed.cache().latest().is_empty());

        poller.set_enabled(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(feed.cache().latest().cell_count(), 3);
        assert_eq!(feed.cache().published_cycles(), 2);
    }

    #[tokio::test]
    async fn reset_during_refresh_discards_the_cycle() {
        let backend = Arc::new(GatedBackend::default());
        let feed = feed(backend.clone(), &[6]);

        let interrupt = async {
            backend.entered.notified().await;
            feed.reset();
            backend.gate.notify_waiters();
        };
        let (published, ()) = tokio::join!(feed.refresh(), interrupt);

        assert_eq!(published, None);
        assert_eq!(feed.cache().published_cycles(), 0);
        assert!(feed.cache().latest().is_empty());

        // The next cycle belongs to the new epoch and publishes normally.
        let next = async {
            backend.entered.notified().await;
            tokio::task::yield_now().await;
            backend.gate.notify_waiters();
        };
        let (published, ()) = tokio::join!(feed.refresh(), next);
        assert_eq!(published, Some(1));
        assert_eq!(feed.cache().latest().cell_count(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_mid_poll_on_another_worker_publishes_nothing() {
        let backend = Arc::new(BlockingBackend {
            entered: Notify::new(),
            block: Duration::from_millis(150),
        });
        let feed = feed(backend.clone(), &[6]);
        let poller = Poller::new(feed.clone(), Duration::from_secs(60));

        poller.start();
        backend.entered.notified().await;
        assert!(poller.stop());
        assert!(feed.cache().latest().is_empty());

        // The aborted task is still inside its poll; let it run to the end.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(feed.cache().published_cycles(), 0);
        assert!(feed.cache().latest().is_empty());
    }
}
