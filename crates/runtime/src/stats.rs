use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Histogram {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl Histogram {
    pub fn record(&mut self, value: u64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum = self.sum.saturating_add(value);
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

/// Counters for the cycles a [`Poller`](crate::Poller) has driven.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CycleStats {
    pub started: u64,
    pub completed: u64,
    /// Ticks dropped because a cycle was still running.
    pub skipped_ticks: u64,
    pub last_duration_ms: Option<u64>,
    pub duration_ms: Histogram,
}

impl CycleStats {
    pub fn record_start(&mut self) {
        self.started += 1;
    }

    pub fn record_completion(&mut self, duration_ms: u64) {
        self.completed += 1;
        self.last_duration_ms = Some(duration_ms);
        self.duration_ms.record(duration_ms);
    }

    pub fn record_skipped(&mut self, ticks: u64) {
        self.skipped_ticks += ticks;
    }

    /// Cycles that started but never completed (cancelled by `stop`).
    pub fn abandoned(&self) -> u64 {
        self.started.saturating_sub(self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::{CycleStats, Histogram};

    #[test]
    fn histogram_tracks_min_max_sum_count() {
        let mut h = Histogram::default();
        assert_eq!(h.mean(), None);
        h.record(5);
        h.record(2);
        h.record(8);
        assert_eq!(h.count, 3);
        assert_eq!(h.sum, 15);
        assert_eq!(h.min, 2);
        assert_eq!(h.max, 8);
        assert_eq!(h.mean(), Some(5.0));
    }

    #[test]
    fn abandoned_counts_unfinished_cycles() {
        let mut s = CycleStats::default();
        s.record_start();
        s.record_completion(12);
        s.record_start();
        assert_eq!(s.completed, 1);
        assert_eq!(s.abandoned(), 1);
        assert_eq!(s.last_duration_ms, Some(12));
    }
}
