use log::info;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::benchmark::metrics::TimingMetrics;
use crate::control::AltitudeController;
use crate::error::LoopError;
use crate::ipc::{ConfigBuffer, ControllerChannels};
use crate::runtime::{run_cycle, LoopStats};

/// Ticks `controller` every `period` until shutdown is requested through `stats`.
/// `period` must be non-zero, as returned by `ControllerConfig::loop_period`.
pub async fn control_task(
    mut controller: AltitudeController,
    period: Duration,
    channels: ControllerChannels,
    tunables: ConfigBuffer,
    stats: Arc<LoopStats>,
    metrics: TimingMetrics,
) -> Result<(), LoopError> {
    let report_every = (10_000_000 / period.as_micros().max(1)).max(1) as u64;
    let mut interval_timer = interval(period);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_start: Option<Instant> = None;

    info!("Control task started ({:?} period)", period);
    loop {
        interval_timer.tick().await;
        if stats.is_shutdown() {
            info!("Control task shutting down ({})", stats.summary());
            return Ok(());
        }

        let cycle_start = Instant::now();
        if let Some(prev) = last_start {
            metrics.record_cycle(cycle_start.duration_since(prev));
        }
        last_start = Some(cycle_start);

        let command = run_cycle(&mut controller, &channels, &tunables, &stats, &metrics)?;

        if cycle_start.elapsed() > period {
            stats.overruns.fetch_add(1, Ordering::Relaxed);
        }
        if stats.cycles.load(Ordering::Relaxed) % report_every == 0 {
            info!(
                "Cycle #{}: vz = {:.3} m/s, error = {:.3} m ({})",
                command.sequence_id,
                command.vz,
                controller.telemetry().altitude_error,
                stats.summary()
            );
        }
    }
}
