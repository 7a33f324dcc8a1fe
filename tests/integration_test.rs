//! Integration tests for the altitude controller

use altitude_controller::async_impl::control_task;
use altitude_controller::threaded_impl::spawn_control_thread;
use altitude_controller::{
    integral_gate_open, AltitudeController, ConfigBuffer, ControllerChannels, ControllerConfig,
    Gains, InputEvent, LoopStats, PidConfig, Position, SimulatedVehicle, TimingMetrics, TypeMask,
};
use approx::assert_relative_eq;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn config_with(kp: f32, ki: f32, kd: f32, max_vup: f32) -> ControllerConfig {
    ControllerConfig {
        max_vup,
        pid: PidConfig { kp, ki, kd },
        ..ControllerConfig::default()
    }
}

// ============================================================================
// SATURATION TESTS
// ============================================================================

#[test]
fn test_output_always_within_rate_limits() {
    let config = config_with(4.0, 1.0, 0.5, 1.5);
    let mut controller = AltitudeController::new(&config).unwrap();
    controller.ingest_vehicle_state("OFFBOARD", true);
    controller.ingest_landing_state(2);

    let mut vehicle = SimulatedVehicle::new(11);
    for step in 0..400 {
        let altitude = if step % 100 < 50 { 50.0 } else { -20.0 };
        controller.ingest_setpoint(0.0, 0.0, altitude);
        controller.ingest_position(vehicle.report_position());
        vehicle.inject_disturbance(((step % 7) as f32 - 3.0) * 0.5);

        let cmd = controller.tick();
        assert!(cmd.vz <= 1.5 && cmd.vz >= -0.5, "vz {} out of range", cmd.vz);
    }
}

#[test]
fn test_scenarios_a_and_b() {
    for (max_vup, expected) in [(2.0, 2.0), (1.5, 1.5)] {
        let mut controller = AltitudeController::new(&config_with(1.0, 0.0, 0.0, max_vup)).unwrap();
        controller.ingest_vehicle_state("POSCTL", true);
        controller.ingest_setpoint(0.0, 0.0, 5.0);
        controller.ingest_position(Position::new(0.0, 0.0, 3.0));

        let cmd = controller.tick();
        assert!(!controller.telemetry().integral_gate_open);
        assert_relative_eq!(controller.telemetry().raw_command, 2.0);
        assert_relative_eq!(cmd.vz, expected);
    }
}

// ============================================================================
// INTEGRAL GATING TESTS
// ============================================================================

#[test]
fn test_disarmed_gate_closed_for_every_mode_and_state() {
    for mode in ["OFFBOARD", "POSCTL", "AUTO.LAND", ""] {
        for code in 0..=4 {
            assert!(!integral_gate_open(false, code, mode, "OFFBOARD"));
        }
    }
}

#[test]
fn test_integral_freeze_across_disabled_ticks() {
    let mut controller = AltitudeController::new(&ControllerConfig::default()).unwrap();
    controller.ingest_vehicle_state("OFFBOARD", true);
    controller.ingest_landing_state(2);
    controller.ingest_setpoint(0.0, 0.0, 4.0);
    for _ in 0..5 {
        controller.tick();
    }
    let before = controller.regulator().integral();
    assert!(before > 0.0);

    // Mode switch away from offboard closes the gate
    controller.ingest_vehicle_state("POSCTL", true);
    for n in 0..25 {
        controller.ingest_position(Position::new(0.0, 0.0, n as f32 * 0.3));
        controller.tick();
    }
    assert_eq!(controller.regulator().integral(), before);
}

#[test]
fn test_custom_autonomous_mode() {
    let config = ControllerConfig {
        autonomous_mode: "GUIDED".to_string(),
        ..ControllerConfig::default()
    };
    let mut controller = AltitudeController::new(&config).unwrap();
    controller.ingest_landing_state(3);
    controller.ingest_setpoint(0.0, 0.0, 2.0);

    controller.ingest_vehicle_state("OFFBOARD", true);
    controller.tick();
    assert!(!controller.telemetry().integral_gate_open);

    controller.ingest_vehicle_state("GUIDED", true);
    controller.tick();
    assert!(controller.telemetry().integral_gate_open);
}

// ============================================================================
// PASS-THROUGH AND GAIN TESTS
// ============================================================================

#[test]
fn test_horizontal_velocity_tracks_latest_setpoint() {
    let mut controller = AltitudeController::new(&ControllerConfig::default()).unwrap();
    controller.ingest_setpoint(1.2, -0.4, 1.0);

    for altitude in [2.0, 8.0, 0.5] {
        controller.ingest_setpoint(1.2, -0.4, altitude);
        let cmd = controller.tick();
        assert_eq!((cmd.vx, cmd.vy), (1.2, -0.4));
    }

    controller.ingest_setpoint(-2.0, 0.0, 0.5);
    let cmd = controller.tick();
    assert_eq!((cmd.vx, cmd.vy), (-2.0, 0.0));
}

#[test]
fn test_command_metadata() {
    let mut controller = AltitudeController::new(&ControllerConfig::default()).unwrap();
    let first = controller.tick();
    let second = controller.tick();

    assert_eq!(first.coordinate_frame, 1);
    assert_eq!(first.type_mask, TypeMask::VELOCITY_AND_YAW);
    assert_eq!(first.yaw, 0.0);
    assert_eq!(second.sequence_id, first.sequence_id + 1);
}

#[test]
fn test_gain_change_applies_to_following_tick() {
    let mut controller = AltitudeController::new(&config_with(0.5, 0.0, 0.0, 10.0)).unwrap();
    controller.ingest_setpoint(0.0, 0.0, 3.0);
    controller.ingest_position(Position::new(0.0, 0.0, 1.0));

    let before = controller.tick();
    controller.ingest_gains(Gains::new(2.0, 0.0, 0.0));
    let after = controller.tick();

    assert_relative_eq!(before.vz, 1.0);
    assert_relative_eq!(after.vz, 4.0);
}

// ============================================================================
// CLOSED LOOP TESTS
// ============================================================================

#[test]
fn test_closed_loop_reaches_altitude() {
    let config = ControllerConfig {
        sample_period: 0.05,
        ..ControllerConfig::default()
    };
    let mut controller = AltitudeController::new(&config).unwrap();
    let mut vehicle = SimulatedVehicle::new(42);
    vehicle.noise_amplitude = 0.0;
    vehicle.arm("OFFBOARD");
    controller.ingest_setpoint(0.0, 0.0, 2.0);

    for _ in 0..400 {
        for event in vehicle.events() {
            event.apply(&mut controller);
        }
        let cmd = controller.tick();
        vehicle.step(&cmd, 0.05);
    }

    assert!(
        (vehicle.position.z - 2.0).abs() < 0.1,
        "Vehicle should settle near 2 m, got {}",
        vehicle.position.z
    );
}

#[test]
fn test_control_thread_publishes_every_cycle() {
    let config = ControllerConfig {
        loop_rate_hz: 100.0,
        sample_period: 0.01,
        ..ControllerConfig::default()
    };
    let channels = ControllerChannels::new(256);
    let tunables = ConfigBuffer::new(&config);
    let metrics = TimingMetrics::new();

    let (handle, stats) =
        spawn_control_thread(&config, channels.clone(), tunables.clone(), metrics.clone()).unwrap();

    channels
        .submit(InputEvent::Setpoint { vx: 0.3, vy: 0.1, altitude: 10.0 })
        .unwrap();
    channels.submit(InputEvent::Position(Position::new(0.0, 0.0, 1.0))).unwrap();
    tunables.update(|limits| limits.max_vup = 0.75);

    std::thread::sleep(Duration::from_millis(200));
    stats.request_shutdown();
    handle.join().unwrap().unwrap();

    let cycles = stats.cycles.load(Ordering::Relaxed);
    let commands: Vec<_> = channels.command_rx.try_iter().collect();
    assert!(cycles > 5, "Loop should have run, got {} cycles", cycles);
    assert_eq!(commands.len() as u64, cycles);
    assert_eq!(stats.events_applied.load(Ordering::Relaxed), 2);

    let last = commands.last().unwrap();
    assert_eq!((last.vx, last.vy), (0.3, 0.1));
    assert_relative_eq!(last.vz, 0.75);
    assert_eq!(metrics.report().ticks, cycles);
}

#[tokio::test]
async fn test_control_task_publishes_every_cycle() {
    let config = ControllerConfig {
        loop_rate_hz: 100.0,
        sample_period: 0.01,
        ..ControllerConfig::default()
    };
    let controller = AltitudeController::new(&config).unwrap();
    let channels = ControllerChannels::new(256);
    let tunables = ConfigBuffer::new(&config);
    let stats = LoopStats::new();
    let metrics = TimingMetrics::new();

    let handle = tokio::spawn(control_task(
        controller,
        config.loop_period().unwrap(),
        channels.clone(),
        tunables.clone(),
        stats.clone(),
        metrics.clone(),
    ));

    channels
        .submit(InputEvent::Setpoint { vx: 0.3, vy: 0.1, altitude: 10.0 })
        .unwrap();
    channels.submit(InputEvent::Position(Position::new(0.0, 0.0, 1.0))).unwrap();
    tunables.update(|limits| limits.max_vup = 0.75);

    tokio::time::sleep(Duration::from_millis(200)).await;
    stats.request_shutdown();
    handle.await.unwrap().unwrap();

    let cycles = stats.cycles.load(Ordering::Relaxed);
    let commands: Vec<_> = channels.command_rx.try_iter().collect();
    assert!(cycles > 5, "Task should have run, got {} cycles", cycles);
    assert_eq!(commands.len() as u64, cycles);
    assert_eq!(stats.events_applied.load(Ordering::Relaxed), 2);

    let last = commands.last().unwrap();
    assert_eq!((last.vx, last.vy), (0.3, 0.1));
    assert_relative_eq!(last.vz, 0.75);
    assert_eq!(metrics.report().ticks, cycles);
}

// ============================================================================
// TIMING TESTS
// ============================================================================

#[test]
fn test_tick_is_fast() {
    let mut controller = AltitudeController::new(&ControllerConfig::default()).unwrap();
    controller.ingest_vehicle_state("OFFBOARD", true);
    controller.ingest_landing_state(2);

    let start = std::time::Instant::now();
    for n in 0..10_000 {
        controller.ingest_position(Position::new(0.0, 0.0, (n % 50) as f32 * 0.1));
        let _ = controller.tick();
    }
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_millis(100),
        "10k ticks should be fast, took {:?}",
        elapsed
    );
}
