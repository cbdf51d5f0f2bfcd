use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::stats::CycleStats;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Work driven by a [`Poller`].
pub trait PollTask: Send + Sync + 'static {
    /// Run one complete cycle, publishing its results before returning.
    ///
    /// The future may be dropped at any suspension point when the poller stops.
    fn run_cycle(&self) -> BoxFuture<'_, ()>;

    /// Request cancellation of everything the current cycle has in flight.
    ///
    /// Called synchronously from [`Poller::stop`]; must not block or panic.
    fn cancel_inflight(&self);

    /// Discard results published by earlier cycles.
    fn reset(&self) {}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
}

struct ActiveLoop {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Fixed-interval driver for a [`PollTask`].
///
/// `start` runs one cycle immediately and then one per interval tick. Cycles
/// never overlap: they run sequentially on a single task and a tick that
/// fires while a cycle is still running is skipped.
pub struct Poller<T: PollTask> {
    task: Arc<T>,
    interval: Duration,
    active: Mutex<Option<ActiveLoop>>,
    stats: Arc<Mutex<CycleStats>>,
}

impl<T: PollTask> Poller<T> {
    pub fn new(task: Arc<T>, interval: Duration) -> Self {
        Self {
            task,
            interval: interval.max(Duration::from_millis(1)),
            active: Mutex::new(None),
            stats: Arc::new(Mutex::new(CycleStats::default())),
        }
    }

    pub fn task(&self) -> &Arc<T> {
        &self.task
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> CycleStats {
        *self.stats.lock()
    }

    pub fn state(&self) -> PollerState {
        match self.active.lock().as_ref() {
            Some(active) if !active.handle.is_finished() => PollerState::Running,
            _ => PollerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == PollerState::Running
    }

    /// Start polling. Must be called from within a Tokio runtime.
    ///
    /// Returns `false` (and does nothing) when already running.
    pub fn start(&self) -> bool {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|a| !a.handle.is_finished()) {
            return false;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            self.task.clone(),
            self.interval,
            token.clone(),
            self.stats.clone(),
        ));
        *active = Some(ActiveLoop { token, handle });

        info!(
            interval_ms = self.interval.as_millis() as u64,
            "poller started"
        );
        true
    }

    /// Stop polling and cancel in-flight work.
    ///
    /// No new cycle begins after this returns. Returns `false` when already
    /// stopped.
    pub fn stop(&self) -> bool {
        let Some(active) = self.active.lock().take() else {
            return false;
        };

        active.token.cancel();
        self.task.cancel_inflight();
        active.handle.abort();
        self.task.reset();

        info!("poller stopped");
        true
    }

    /// Map an external enabled flag onto `start`/`stop`.
    ///
    /// Returns `true` if the state changed.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        if enabled { self.start() } else { self.stop() }
    }
}

impl<T: PollTask> Drop for Poller<T> {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.token.cancel();
            self.task.cancel_inflight();
            active.handle.abort();
        }
    }
}

async fn run_loop<T: PollTask>(
    task: Arc<T>,
    period: Duration,
    token: CancellationToken,
    stats: Arc<Mutex<CycleStats>>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // The first tick completes immediately.
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        stats.lock().record_start();
        let started = Instant::now();

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = task.run_cycle() => {}
        }

        let elapsed = started.elapsed();
        let skipped = (elapsed.as_nanos() / period.as_nanos().max(1)) as u64;
        {
            let mut stats = stats.lock();
            stats.record_completion(elapsed.as_millis() as u64);
            stats.record_skipped(skipped);
        }
        debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            skipped_ticks = skipped,
            "poll cycle finished"
        );
    }
}
