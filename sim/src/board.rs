use stewart::protocol::from_centidegrees;
use stewart::{PlatformConfig, Pose, StewartKinematics, Telemetry, LEG_COUNT};
use tracing::debug;

use crate::forward::estimate_pose;

const AMBIENT_TEMPERATURE: f64 = 24.0;
/// Heating per received frame (°C), up to `MAX_WARMUP`.
const WARMUP_PER_FRAME: f64 = 0.002;
const MAX_WARMUP: f64 = 12.0;

/// Simulated servo controller: the horn angles it was last commanded and
/// what its IMU would report for them.
#[derive(Debug, Clone)]
pub struct BoardState {
    kinematics: StewartKinematics,
    commanded: Option<[i32; LEG_COUNT]>,
    estimate: Pose,
    frames: u64,
    rejected: u64,
}

impl BoardState {
    pub fn new(platform: PlatformConfig) -> Self {
        Self {
            kinematics: StewartKinematics::from_config(platform),
            commanded: None,
            estimate: Pose::HOME,
            frames: 0,
            rejected: 0,
        }
    }

    /// Latest commanded angles in centi-degrees.
    pub fn commanded(&self) -> Option<[i32; LEG_COUNT]> {
        self.commanded
    }

    pub fn estimate(&self) -> Pose {
        self.estimate
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames whose angles match no reachable pose.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Applies one decoded frame. The pose estimate is kept when the angles
    /// cannot be matched to a reachable pose.
    pub fn receive(&mut self, values: [i32; LEG_COUNT]) {
        self.frames += 1;
        self.commanded = Some(values);

        let alpha = values.map(from_centidegrees);
        match estimate_pose(&mut self.kinematics, &alpha, self.estimate) {
            Some(pose) => self.estimate = pose,
            None => {
                self.rejected += 1;
                debug!("no reachable pose for {:?}", values);
            }
        }
    }

    /// What the board reports back: estimated orientation in degrees and a
    /// temperature that rises with use.
    pub fn telemetry(&self) -> Telemetry {
        let warmup = (self.frames as f64 * WARMUP_PER_FRAME).min(MAX_WARMUP);
        Telemetry {
            roll: self.estimate.roll.to_degrees(),
            pitch: self.estimate.pitch.to_degrees(),
            yaw: self.estimate.yaw.to_degrees(),
            temperature: AMBIENT_TEMPERATURE + warmup,
        }
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(PlatformConfig::default())
    }
}
