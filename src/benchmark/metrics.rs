//! Tick timing statistics backed by HDR histograms.

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn histogram() -> Histogram<u64> {
    Histogram::new(3).expect("three significant figures is a supported precision")
}

// ============================================================================
// TIMING METRICS - Thread-safe tick timing
// ============================================================================

#[derive(Clone)]
pub struct TimingMetrics {
    tick_hist: Arc<Mutex<Histogram<u64>>>,
    cycle_hist: Arc<Mutex<Histogram<u64>>>,
    jitter_hist: Arc<Mutex<Histogram<u64>>>,
    last_cycle_time_ns: Arc<AtomicU64>,
}

impl TimingMetrics {
    pub fn new() -> Self {
        Self {
            tick_hist: Arc::new(Mutex::new(histogram())),
            cycle_hist: Arc::new(Mutex::new(histogram())),
            jitter_hist: Arc::new(Mutex::new(histogram())),
            last_cycle_time_ns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Time spent draining inputs and running one tick.
    pub fn record_tick(&self, duration: Duration) {
        self.tick_hist.lock().record(duration.as_nanos() as u64).ok();
    }

    /// Time between consecutive tick starts; jitter is the change from the previous one.
    pub fn record_cycle(&self, duration: Duration) {
        let cycle_ns = duration.as_nanos() as u64;
        self.cycle_hist.lock().record(cycle_ns).ok();

        let last = self.last_cycle_time_ns.swap(cycle_ns, Ordering::Relaxed);
        if last > 0 {
            self.jitter_hist.lock().record(cycle_ns.abs_diff(last)).ok();
        }
    }

    pub fn report(&self) -> MetricsReport {
        let tick = self.tick_hist.lock();
        let cycle = self.cycle_hist.lock();
        let jitter = self.jitter_hist.lock();

        MetricsReport {
            ticks: tick.len(),
            tick_p50: Duration::from_nanos(tick.value_at_quantile(0.5)),
            tick_p99: Duration::from_nanos(tick.value_at_quantile(0.99)),
            tick_max: Duration::from_nanos(tick.max()),
            cycle_p50: Duration::from_nanos(cycle.value_at_quantile(0.5)),
            cycle_p99: Duration::from_nanos(cycle.value_at_quantile(0.99)),
            jitter_p50: Duration::from_nanos(jitter.value_at_quantile(0.5)),
            jitter_p99: Duration::from_nanos(jitter.value_at_quantile(0.99)),
        }
    }
}

impl Default for TimingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// METRICS REPORT - Summary statistics
// ============================================================================

#[derive(Debug)]
pub struct MetricsReport {
    pub ticks: u64,
    pub tick_p50: Duration,
    pub tick_p99: Duration,
    pub tick_max: Duration,
    pub cycle_p50: Duration,
    pub cycle_p99: Duration,
    pub jitter_p50: Duration,
    pub jitter_p99: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_needs_two_cycles() {
        let metrics = TimingMetrics::new();
        metrics.record_cycle(Duration::from_millis(50));
        assert_eq!(metrics.report().jitter_p99, Duration::ZERO);

        metrics.record_cycle(Duration::from_millis(52));
        let jitter = metrics.report().jitter_p99;
        assert!(jitter >= Duration::from_micros(1990) && jitter <= Duration::from_micros(2010));
    }

    #[test]
    fn counts_ticks() {
        let metrics = TimingMetrics::new();
        for _ in 0..10 {
            metrics.record_tick(Duration::from_micros(3));
        }
        assert_eq!(metrics.report().ticks, 10);
    }
}
