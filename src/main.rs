use std::io::ErrorKind;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use altitude_controller::async_impl::control_task;
use altitude_controller::{
    load_config, AltitudeController, CommandOutput, ConfigBuffer, ConfigError, ControllerChannels,
    ControllerConfig, InputEvent, LoopError, LoopStats, SimulatedVehicle, TimingMetrics,
};

const DEFAULT_CONFIG_PATH: &str = "config/altitude_controller.toml";
const SIM_RATE_HZ: f32 = 50.0;
/// Simulated vehicle arms and switches to offboard after this many steps.
const ARM_AFTER_STEPS: u64 = 50;

fn read_config(path: &str) -> Result<ControllerConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            warn!("{} not found, using default configuration", path);
            Ok(ControllerConfig::default())
        }
        other => other,
    }
}

async fn simulated_vehicle_task(
    config: ControllerConfig,
    channels: ControllerChannels,
    stats: Arc<LoopStats>,
) -> Result<(), LoopError> {
    let dt = 1.0 / SIM_RATE_HZ;
    let mut vehicle = SimulatedVehicle::new(42);
    let mut command = CommandOutput::new(config.coordinate_frame, config.type_mask());
    let mut interval_timer = tokio::time::interval(Duration::from_secs_f32(dt));

    loop {
        interval_timer.tick().await;
        if stats.is_shutdown() {
            return Ok(());
        }

        if vehicle.get_sequence() == ARM_AFTER_STEPS {
            info!("Simulated vehicle armed in {}", config.autonomous_mode);
            vehicle.arm(&config.autonomous_mode);
            channels.submit(InputEvent::Setpoint {
                vx: 0.0,
                vy: 0.0,
                altitude: config.altitude_setpoint,
            })?;
        }

        if let Some(latest) = channels.latest_command() {
            command = latest;
        }
        vehicle.step(&command, dt);
        for event in vehicle.events() {
            channels.submit(event)?;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("===========================================");
    println!("Starting Altitude Controller");
    println!("===========================================\n");

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = read_config(&path)?;
    info!(
        "Setpoint {:.2} m, limits +{:.2}/-{:.2} m/s, gains kp = {}, ki = {}, kd = {}",
        config.altitude_setpoint,
        config.max_vup,
        config.max_vdown,
        config.pid.kp,
        config.pid.ki,
        config.pid.kd
    );

    let controller = AltitudeController::new(&config)?;
    let period = config.loop_period()?;
    let channels = ControllerChannels::new(config.channel_capacity);
    let tunables = ConfigBuffer::new(&config);
    let stats = LoopStats::new();
    let metrics = TimingMetrics::new();

    let control = tokio::spawn(control_task(
        controller,
        period,
        channels.clone(),
        tunables,
        stats.clone(),
        metrics.clone(),
    ));
    let simulation = tokio::spawn(simulated_vehicle_task(
        config.clone(),
        channels.clone(),
        stats.clone(),
    ));

    println!("Running until Ctrl-C...\n");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown requested");
    stats.request_shutdown();
    control.await??;
    simulation.await??;

    let report = metrics.report();
    println!("\n===========================================");
    println!("FINAL CONTROL LOOP RESULTS");
    println!("===========================================");
    println!("Cycles: {}", stats.cycles.load(Ordering::Relaxed));
    println!("Events applied: {}", stats.events_applied.load(Ordering::Relaxed));
    println!("Saturated ticks: {}", stats.saturated_ticks.load(Ordering::Relaxed));
    println!("Stale-position ticks: {}", stats.stale_ticks.load(Ordering::Relaxed));
    println!("Dropped commands: {}", stats.dropped_commands.load(Ordering::Relaxed));
    println!("Overruns: {}", stats.overruns.load(Ordering::Relaxed));
    println!("\n=== Timing ===");
    println!(
        "Tick P50: {:?}, P99: {:?}, max: {:?}",
        report.tick_p50, report.tick_p99, report.tick_max
    );
    println!("Cycle P50: {:?}, P99: {:?}", report.cycle_p50, report.cycle_p99);
    println!("Jitter P50: {:?}, P99: {:?}", report.jitter_p50, report.jitter_p99);

    Ok(())
}
