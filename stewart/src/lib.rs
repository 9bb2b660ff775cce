use serde::{Deserialize, Serialize};

pub mod platform_config;
pub use platform_config::PlatformConfig;

pub mod geometry;
pub use geometry::PlatformGeometry;

pub mod kinematics;
pub use kinematics::{KinematicsSnapshot, LegSolution, StewartKinematics};

pub mod homing;
pub use homing::{HomingConfig, HomingController, HomingState};

pub mod cadence;
pub use cadence::{CadenceController, CadenceOutcome, NanPolicy};

pub mod protocol;
pub use protocol::Telemetry;

pub mod transforms;

pub mod errors;
pub use errors::*;

pub mod drivers;

/// Number of legs (and actuators) on the platform.
pub const LEG_COUNT: usize = 6;

/// Commanded pose of the moving plate relative to its home position.
///
/// Translation is in millimeters, rotation in radians. `roll` turns about X,
/// `pitch` about Y and `yaw` about Z.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Default for Pose {
    fn default() -> Self {
        Self::HOME
    }
}

impl Pose {
    pub const HOME: Pose = Pose {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        roll: 0.0,
        pitch: 0.0,
        yaw: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { x, y, z, roll, pitch, yaw }
    }

    /// Builds a pose from a rotation given in degrees, the unit operators type in.
    pub fn from_degrees(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::new(
            x,
            y,
            z,
            roll.to_radians(),
            pitch.to_radians(),
            yaw.to_radians(),
        )
    }

    pub fn translation(&self) -> nalgebra::Vector3<f64> {
        nalgebra::Vector3::new(self.x, self.y, self.z)
    }

    pub fn rotation(&self) -> nalgebra::Vector3<f64> {
        nalgebra::Vector3::new(self.roll, self.pitch, self.yaw)
    }

    /// Axes in `x, y, z, roll, pitch, yaw` order.
    pub fn axes(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.roll, self.pitch, self.yaw]
    }

    pub fn axes_mut(&mut self) -> [&mut f64; 6] {
        [
            &mut self.x,
            &mut self.y,
            &mut self.z,
            &mut self.roll,
            &mut self.pitch,
            &mut self.yaw,
        ]
    }

    pub fn is_home(&self) -> bool {
        self.axes().iter().all(|v| *v == 0.0)
    }
}
