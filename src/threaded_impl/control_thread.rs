use log::{debug, info};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::benchmark::metrics::TimingMetrics;
use crate::config::ControllerConfig;
use crate::control::AltitudeController;
use crate::error::{ConfigError, LoopError};
use crate::ipc::{ConfigBuffer, ControllerChannels};
use crate::runtime::{run_cycle, LoopStats};

/// Runs the controller at `config.loop_rate_hz` until shutdown is requested
/// through the returned stats. Configuration is validated before the thread starts.
pub fn spawn_control_thread(
    config: &ControllerConfig,
    channels: ControllerChannels,
    tunables: ConfigBuffer,
    metrics: TimingMetrics,
) -> Result<(thread::JoinHandle<Result<(), LoopError>>, Arc<LoopStats>), ConfigError> {
    let mut controller = AltitudeController::new(config)?;
    let period = config.loop_period()?;
    let report_every = (config.loop_rate_hz * 10.0).max(1.0) as u64;

    let stats = LoopStats::new();
    let stats_clone = stats.clone();

    let handle = thread::spawn(move || -> Result<(), LoopError> {
        info!("Control thread started ({:?} period)", period);
        let mut last_start: Option<Instant> = None;

        loop {
            if stats_clone.shutdown.load(Ordering::Relaxed) {
                info!("Control thread shutting down ({})", stats_clone.summary());
                return Ok(());
            }

            let cycle_start = Instant::now();
            if let Some(prev) = last_start {
                metrics.record_cycle(cycle_start.duration_since(prev));
            }
            last_start = Some(cycle_start);

            let command = run_cycle(&mut controller, &channels, &tunables, &stats_clone, &metrics)?;

            let cycles = stats_clone.cycles.load(Ordering::Relaxed);
            if cycles % report_every == 0 {
                info!(
                    "Cycle #{}: vz = {:.3} m/s, error = {:.3} m ({})",
                    command.sequence_id,
                    command.vz,
                    controller.telemetry().altitude_error,
                    stats_clone.summary()
                );
            }

            // Sleep to maintain the loop rate
            let elapsed = cycle_start.elapsed();
            if elapsed < period {
                thread::sleep(period - elapsed);
            } else {
                stats_clone.overruns.fetch_add(1, Ordering::Relaxed);
                debug!("Cycle overran its period: {:?} > {:?}", elapsed, period);
            }
        }
    });

    Ok((handle, stats))
}
