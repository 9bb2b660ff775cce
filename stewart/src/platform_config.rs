use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::LEG_COUNT;

/// Physical description of a six-leg rotary Stewart platform.
///
/// All lengths are in millimeters. Joint positions on the base and on the
/// moving plate are given as angles (degrees) around circles of the matching
/// radius; `beta_angles` (radians) orient the plane each horn swings in.
/// Index `i` of every array describes leg `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Radius of the circle the base joints sit on.
    pub base_radius: f64,

    /// Radius of the circle the platform joints sit on.
    pub platform_radius: f64,

    /// Servo horn (crank) length.
    pub horn_length: f64,

    /// Connecting rod length between horn tip and platform joint.
    pub rod_length: f64,

    /// Resting elevation of the plate above the base plane.
    pub initial_height: f64,

    pub base_angles: [f64; LEG_COUNT],     // degrees
    pub platform_angles: [f64; LEG_COUNT], // degrees
    pub beta_angles: [f64; LEG_COUNT],     // radians

    /// Serial link speed of the servo controller board.
    pub baud_rate: u32,
}

const BASE_ANGLES: [f64; LEG_COUNT] = [-50.0, -70.0, -170.0, -190.0, -290.0, -310.0];
const PLATFORM_ANGLES: [f64; LEG_COUNT] = [-54.0, -66.0, -174.0, -186.0, -294.0, -306.0];
const BETA_ANGLES: [f64; LEG_COUNT] = [
    PI / 6.0,        // 30 deg
    -5.0 * PI / 6.0, // -150 deg
    -PI / 2.0,       // -90 deg
    PI / 2.0,        // 90 deg
    5.0 * PI / 6.0,  // 150 deg
    -PI / 6.0,       // -30 deg
];

impl PlatformConfig {
    /// Desktop platform driven by hobby servos.
    ///
    /// The home height puts every horn level (alpha ~ 0) in the neutral pose.
    pub fn desktop() -> Self {
        Self {
            base_radius: 76.0,
            platform_radius: 60.0,
            horn_length: 40.0,
            rod_length: 130.0,
            initial_height: 120.28183632,
            base_angles: BASE_ANGLES,
            platform_angles: PLATFORM_ANGLES,
            beta_angles: BETA_ANGLES,
            baud_rate: 115200,
        }
    }

    /// Larger frame sharing the desktop joint layout.
    pub fn large_frame() -> Self {
        Self {
            base_radius: 300.0,
            platform_radius: 284.0,
            horn_length: 40.0,
            rod_length: 118.0,
            initial_height: 100.0,
            ..Self::desktop()
        }
    }

    /// Parses a configuration from JSON, rejecting values that fail [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: PlatformConfig =
            serde_json::from_str(json).map_err(|e| format!("Invalid platform config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let lengths = [
            ("base_radius", self.base_radius),
            ("platform_radius", self.platform_radius),
            ("horn_length", self.horn_length),
            ("rod_length", self.rod_length),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be a positive length, got {}.", name, value));
            }
        }
        if !self.initial_height.is_finite() {
            return Err("initial_height must be finite.".to_string());
        }
        let mut angles = self
            .base_angles
            .iter()
            .chain(self.platform_angles.iter())
            .chain(self.beta_angles.iter());
        if angles.any(|a| !a.is_finite()) {
            return Err("Joint angles must be finite.".to_string());
        }
        if self.baud_rate == 0 {
            return Err("Baud rate must be greater than 0.".to_string());
        }
        Ok(())
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(PlatformConfig::desktop().validate().is_ok());
        assert!(PlatformConfig::large_frame().validate().is_ok());
        assert_eq!(PlatformConfig::default(), PlatformConfig::desktop());
    }

    #[test]
    fn large_frame_keeps_joint_layout() {
        let large = PlatformConfig::large_frame();
        let desktop = PlatformConfig::desktop();
        assert_eq!(large.base_angles, desktop.base_angles);
        assert_eq!(large.beta_angles, desktop.beta_angles);
        assert_eq!(large.rod_length, 118.0);
    }

    #[test]
    fn rejects_non_positive_lengths() {
        let config = PlatformConfig {
            horn_length: 0.0,
            ..PlatformConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("horn_length"), "unexpected message: {}", err);

        let config = PlatformConfig {
            rod_length: f64::NAN,
            ..PlatformConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_finite_angles_and_zero_baud() {
        let mut config = PlatformConfig::default();
        config.beta_angles[3] = f64::INFINITY;
        assert!(config.validate().is_err());

        let config = PlatformConfig {
            baud_rate: 0,
            ..PlatformConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_roundtrip() {
        let config = PlatformConfig::large_frame();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = PlatformConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn json_with_invalid_values_is_rejected() {
        let mut value = serde_json::to_value(PlatformConfig::default()).unwrap();
        value["base_radius"] = serde_json::json!(-1.0);
        let result = PlatformConfig::from_json(&value.to_string());
        assert!(result.is_err());

        assert!(PlatformConfig::from_json("{\"base_radius\": 1.0}").is_err());
    }
}
