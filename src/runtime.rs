//! Pieces shared by the threaded and async control loops.

use log::warn;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::benchmark::metrics::TimingMetrics;
use crate::control::AltitudeController;
use crate::error::LoopError;
use crate::ipc::{ConfigBuffer, ControllerChannels};
use crate::types::CommandOutput;

// ============================================================================
// LOOP STATS - Counters shared with the owner of the loop
// ============================================================================

pub struct LoopStats {
    pub cycles: AtomicU64,
    pub events_applied: AtomicU64,
    pub saturated_ticks: AtomicU64,
    pub stale_ticks: AtomicU64,
    pub dropped_commands: AtomicU64,
    pub overruns: AtomicU64,
    pub shutdown: AtomicBool,
}

impl LoopStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cycles: AtomicU64::new(0),
            events_applied: AtomicU64::new(0),
            saturated_ticks: AtomicU64::new(0),
            stale_ticks: AtomicU64::new(0),
            dropped_commands: AtomicU64::new(0),
            overruns: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> String {
        format!(
            "cycles: {}, events: {}, saturated: {}, stale: {}, dropped: {}, overruns: {}",
            self.cycles.load(Ordering::Relaxed),
            self.events_applied.load(Ordering::Relaxed),
            self.saturated_ticks.load(Ordering::Relaxed),
            self.stale_ticks.load(Ordering::Relaxed),
            self.dropped_commands.load(Ordering::Relaxed),
            self.overruns.load(Ordering::Relaxed),
        )
    }
}

// ============================================================================
// CONTROL CYCLE - Tunables, drain inputs, tick, publish
// ============================================================================

/// One control period's worth of work. All pending inputs are applied before the
/// tick, and the command is published whether or not it changed.
pub fn run_cycle(
    controller: &mut AltitudeController,
    channels: &ControllerChannels,
    tunables: &ConfigBuffer,
    stats: &LoopStats,
    metrics: &TimingMetrics,
) -> Result<CommandOutput, LoopError> {
    let start = Instant::now();

    let limits = tunables.get();
    if (limits.max_vup, limits.max_vdown) != controller.rate_limits() {
        if let Err(e) = controller.set_rate_limits(limits.max_vup, limits.max_vdown) {
            warn!("Ignoring live rate limit update: {}", e);
        }
    }

    let applied = channels.drain_inputs(controller)?;
    let command = controller.tick();
    metrics.record_tick(start.elapsed());

    let telemetry = controller.telemetry();
    stats.cycles.fetch_add(1, Ordering::Relaxed);
    stats.events_applied.fetch_add(applied as u64, Ordering::Relaxed);
    if telemetry.saturated {
        stats.saturated_ticks.fetch_add(1, Ordering::Relaxed);
    }
    if telemetry.position_stale {
        stats.stale_ticks.fetch_add(1, Ordering::Relaxed);
    }

    if channels.publish(command)? {
        stats.dropped_commands.fetch_add(1, Ordering::Relaxed);
    }
    Ok(command)
}
