use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ipc::InputEvent;
use crate::types::{CommandOutput, LandedState, Position};

/// Altitude above which the simulated vehicle reports itself in the air [m].
const AIRBORNE_ALTITUDE: f32 = 0.2;

/// Point-mass vertical plant: the commanded velocity is tracked through a
/// first-order lag, and position reports carry uniform noise.
pub struct SimulatedVehicle {
    rng: StdRng,
    sequence_counter: u64,
    pub position: Position,
    pub climb_rate: f32,
    pub armed: bool,
    pub mode: String,
    pub landed_state: LandedState,
    /// Velocity tracking time constant [s]
    pub response_time: f32,
    pub noise_amplitude: f32,
}

impl SimulatedVehicle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sequence_counter: 0,
            position: Position::default(),
            climb_rate: 0.0,
            armed: false,
            mode: "MANUAL".to_string(),
            landed_state: LandedState::OnGround,
            response_time: 0.3,
            noise_amplitude: 0.02,
        }
    }

    pub fn arm(&mut self, mode: &str) {
        self.armed = true;
        self.mode = mode.to_string();
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.climb_rate = 0.0;
    }

    /// Advances the plant by `dt` seconds under `command`.
    pub fn step(&mut self, command: &CommandOutput, dt: f32) {
        self.sequence_counter += 1;

        let target_rate = if self.armed { command.vz } else { 0.0 };
        let alpha = (dt / (self.response_time + dt)).clamp(0.0, 1.0);
        self.climb_rate += alpha * (target_rate - self.climb_rate);

        self.position.z += self.climb_rate * dt;
        if self.armed {
            self.position.x += command.vx * dt;
            self.position.y += command.vy * dt;
        }
        if self.position.z <= 0.0 {
            self.position.z = 0.0;
            self.climb_rate = self.climb_rate.max(0.0);
        }

        self.landed_state = self.phase();
    }

    fn phase(&self) -> LandedState {
        if self.position.z <= 0.0 && self.climb_rate <= 0.0 {
            LandedState::OnGround
        } else if self.position.z < AIRBORNE_ALTITUDE {
            if self.climb_rate >= 0.0 {
                LandedState::Takeoff
            } else {
                LandedState::Landing
            }
        } else {
            LandedState::InAir
        }
    }

    /// Position as reported by the autopilot, with measurement noise.
    pub fn report_position(&mut self) -> Position {
        let mut reported = self.position;
        if self.noise_amplitude > 0.0 {
            reported.z += self
                .rng
                .gen_range(-self.noise_amplitude..self.noise_amplitude);
        }
        reported
    }

    /// State reports for one simulation step, as the transport would deliver them.
    pub fn events(&mut self) -> Vec<InputEvent> {
        vec![
            InputEvent::Position(self.report_position()),
            InputEvent::VehicleState {
                mode: self.mode.clone(),
                armed: self.armed,
            },
            InputEvent::LandingState(self.landed_state.code()),
        ]
    }

    pub fn get_sequence(&self) -> u64 {
        self.sequence_counter
    }

    pub fn inject_disturbance(&mut self, dz: f32) {
        self.position.z = (self.position.z + dz).max(0.0);
    }
}
