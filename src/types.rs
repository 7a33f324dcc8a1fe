//! Vehicle state, setpoint and command records exchanged with the transport layer.

use std::fmt;

// ============================================================================
// POSITION - Latest local-frame position report
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

// ============================================================================
// LANDED STATE - MAV_LANDED_STATE codes
// ============================================================================

/// Flight phase reported by the autopilot's extended state.
///
/// The integral gate works on the raw code (anything above `OnGround` counts
/// as airborne); this enum only exists for readable logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandedState {
    Undefined,
    OnGround,
    InAir,
    Takeoff,
    Landing,
    Unknown(u8),
}

impl LandedState {
    pub const ON_GROUND_CODE: u8 = 1;

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => LandedState::Undefined,
            1 => LandedState::OnGround,
            2 => LandedState::InAir,
            3 => LandedState::Takeoff,
            4 => LandedState::Landing,
            other => LandedState::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            LandedState::Undefined => 0,
            LandedState::OnGround => 1,
            LandedState::InAir => 2,
            LandedState::Takeoff => 3,
            LandedState::Landing => 4,
            LandedState::Unknown(code) => code,
        }
    }

    pub fn is_airborne(self) -> bool {
        self.code() > Self::ON_GROUND_CODE
    }
}

impl fmt::Display for LandedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandedState::Undefined => write!(f, "Undefined"),
            LandedState::OnGround => write!(f, "OnGround"),
            LandedState::InAir => write!(f, "InAir"),
            LandedState::Takeoff => write!(f, "Takeoff"),
            LandedState::Landing => write!(f, "Landing"),
            LandedState::Unknown(code) => write!(f, "Unknown({})", code),
        }
    }
}

// ============================================================================
// VEHICLE STATE - Arm flag, flight mode and landed state
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub mode: String,
    pub armed: bool,
    pub landed_state: u8,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            mode: String::new(),
            armed: false,
            landed_state: LandedState::ON_GROUND_CODE,
        }
    }
}

// ============================================================================
// SETPOINT - Altitude target, XY velocity pass-through and gains
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Gains {
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }

    pub fn is_finite(&self) -> bool {
        self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoint {
    pub altitude: f32,
    pub vx: f32,
    pub vy: f32,
    pub gains: Gains,
}

// ============================================================================
// COMMAND OUTPUT - Velocity setpoint published once per tick
// ============================================================================

/// Field-validity bits of a local position target (`POSITION_TARGET_TYPEMASK`).
/// A set bit tells the consumer to ignore that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMask(pub u16);

impl TypeMask {
    pub const IGNORE_PX: u16 = 1;
    pub const IGNORE_PY: u16 = 2;
    pub const IGNORE_PZ: u16 = 4;
    pub const IGNORE_VX: u16 = 8;
    pub const IGNORE_VY: u16 = 16;
    pub const IGNORE_VZ: u16 = 32;
    pub const IGNORE_AFX: u16 = 64;
    pub const IGNORE_AFY: u16 = 128;
    pub const IGNORE_AFZ: u16 = 256;
    pub const FORCE: u16 = 512;
    pub const IGNORE_YAW: u16 = 1024;
    pub const IGNORE_YAW_RATE: u16 = 2048;

    /// Velocity XY/Z and yaw authoritative; position, acceleration and yaw rate ignored.
    pub const VELOCITY_AND_YAW: TypeMask = TypeMask(
        Self::IGNORE_PX
            | Self::IGNORE_PY
            | Self::IGNORE_PZ
            | Self::IGNORE_AFX
            | Self::IGNORE_AFY
            | Self::IGNORE_AFZ
            | Self::IGNORE_YAW_RATE,
    );

    pub fn ignores(self, bit: u16) -> bool {
        self.0 & bit != 0
    }
}

/// `MAV_FRAME_LOCAL_NED`
pub const FRAME_LOCAL_NED: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandOutput {
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub yaw: f32,
    pub coordinate_frame: u8,
    pub type_mask: TypeMask,
    pub sequence_id: u64,
}

impl CommandOutput {
    pub fn new(coordinate_frame: u8, type_mask: TypeMask) -> Self {
        Self {
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            yaw: 0.0,
            coordinate_frame,
            type_mask,
            sequence_id: 0,
        }
    }
}
