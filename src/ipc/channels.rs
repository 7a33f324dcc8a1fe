use crossbeam::channel::{bounded, unbounded, Receiver, Sender, TryRecvError, TrySendError};
use std::sync::Arc;

use crate::control::AltitudeController;
use crate::error::LoopError;
use crate::types::{CommandOutput, Gains, Position};

// ============================================================================
// INPUT EVENTS - One variant per inbound topic
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Position(Position),
    Setpoint { vx: f32, vy: f32, altitude: f32 },
    VehicleState { mode: String, armed: bool },
    LandingState(u8),
    Gains(Gains),
}

impl InputEvent {
    pub fn apply(self, controller: &mut AltitudeController) {
        match self {
            InputEvent::Position(p) => controller.ingest_position(p),
            InputEvent::Setpoint { vx, vy, altitude } => {
                controller.ingest_setpoint(vx, vy, altitude)
            }
            InputEvent::VehicleState { mode, armed } => {
                controller.ingest_vehicle_state(mode, armed)
            }
            InputEvent::LandingState(code) => controller.ingest_landing_state(code),
            InputEvent::Gains(gains) => controller.ingest_gains(gains),
        }
    }
}

// ============================================================================
// CONTROLLER CHANNELS - Event sources -> control loop -> command consumer
// ============================================================================

/// The control loop is the single consumer of `input_rx`, which serializes every
/// ingest against the tick. Inputs are unbounded so producers never block; the
/// command channel is bounded and keeps the newest commands.
#[derive(Clone)]
pub struct ControllerChannels {
    pub input_tx: Sender<InputEvent>,
    pub input_rx: Arc<Receiver<InputEvent>>,
    pub command_tx: Sender<CommandOutput>,
    pub command_rx: Arc<Receiver<CommandOutput>>,
}

impl ControllerChannels {
    pub fn new(command_buffer: usize) -> Self {
        let (input_tx, input_rx) = unbounded();
        let (command_tx, command_rx) = bounded(command_buffer.max(1));

        Self {
            input_tx,
            input_rx: Arc::new(input_rx),
            command_tx,
            command_rx: Arc::new(command_rx),
        }
    }

    /// Fire-and-forget from the producer's side.
    pub fn submit(&self, event: InputEvent) -> Result<(), LoopError> {
        self.input_tx
            .send(event)
            .map_err(|_| LoopError::InputDisconnected)
    }

    /// Applies every pending event in arrival order. Returns how many were applied.
    pub fn drain_inputs(&self, controller: &mut AltitudeController) -> Result<usize, LoopError> {
        let mut applied = 0;
        loop {
            match self.input_rx.try_recv() {
                Ok(event) => {
                    event.apply(controller);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => return Ok(applied),
                Err(TryRecvError::Disconnected) => return Err(LoopError::InputDisconnected),
            }
        }
    }

    /// Publishes without blocking. When the consumer lags, the oldest queued
    /// command is discarded; returns `true` if that happened.
    pub fn publish(&self, command: CommandOutput) -> Result<bool, LoopError> {
        match self.command_tx.try_send(command) {
            Ok(()) => Ok(false),
            Err(TrySendError::Full(command)) => {
                let _ = self.command_rx.try_recv();
                match self.command_tx.try_send(command) {
                    Ok(()) | Err(TrySendError::Full(_)) => Ok(true),
                    Err(TrySendError::Disconnected(_)) => Err(LoopError::OutputDisconnected),
                }
            }
            Err(TrySendError::Disconnected(_)) => Err(LoopError::OutputDisconnected),
        }
    }

    /// Newest published command, discarding older ones.
    pub fn latest_command(&self) -> Option<CommandOutput> {
        self.command_rx.try_iter().last()
    }
}
