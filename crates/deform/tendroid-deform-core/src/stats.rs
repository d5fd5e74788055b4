//! Call-level performance accumulators for compute calls.

use instant::Duration;
use serde::{Deserialize, Serialize};

/// Running totals across compute calls since the last reset.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTracker {
    total_calls: u64,
    total_vertices: u64,
    total_time: Duration,
}

/// Point-in-time view derived from a [`PerformanceTracker`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfSnapshot {
    pub total_calls: u64,
    /// Vertices processed across all calls.
    pub total_vertices: u64,
    pub total_time_ms: f64,
    /// `total_time_ms / total_calls`, or 0 before the first call.
    pub average_time_ms: f64,
}

impl PerformanceTracker {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed call.
    #[inline]
    pub fn record(&mut self, vertices: usize, elapsed: Duration) {
        self.total_calls += 1;
        self.total_vertices += vertices as u64;
        self.total_time += elapsed;
    }

    pub fn snapshot(&self) -> PerfSnapshot {
        let total_time_ms = self.total_time.as_secs_f64() * 1000.0;
        let average_time_ms = if self.total_calls == 0 {
            0.0
        } else {
            total_time_ms / self.total_calls as f64
        };
        PerfSnapshot {
            total_calls: self.total_calls,
            total_vertices: self.total_vertices,
            total_time_ms,
            average_time_ms,
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_has_zero_average() {
        let snap = PerformanceTracker::new().snapshot();
        assert_eq!(snap, PerfSnapshot::default());
    }

    #[test]
    fn record_accumulates_and_averages() {
        let mut t = PerformanceTracker::new();
        t.record(100, Duration::from_millis(2));
        t.record(50, Duration::from_millis(4));
        let snap = t.snapshot();
        assert_eq!(snap.total_calls, 2);
        assert_eq!(snap.total_vertices, 150);
        assert!((snap.total_time_ms - 6.0).abs() < 1e-9);
        assert!((snap.average_time_ms - 3.0).abs() < 1e-9);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut t = PerformanceTracker::new();
        t.record(10, Duration::from_micros(300));
        t.reset();
        assert_eq!(t.snapshot(), PerfSnapshot::default());
    }
}
