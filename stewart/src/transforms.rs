//! Conversions between [`Pose`] and nalgebra rigid transforms.
//!
//! # Examples
//!
//! ```rust
//! use stewart::Pose;
//! use nalgebra::Isometry3;
//!
//! let pose = Pose::from_degrees(10.0, 0.0, -5.0, 0.0, 2.0, 0.0);
//! let iso: Isometry3<f64> = pose.into();
//! let back: Pose = iso.into();
//! assert!((back.pitch - pose.pitch).abs() < 1e-12);
//! ```
//!
//! # Notes
//!
//! - Rotation uses the same roll (X), pitch (Y), yaw (Z) composition as the
//!   solver, so `iso * p` equals the solver's rotated platform joint before the
//!   home height is added.
//! - Converting back extracts Euler angles, which are only unique for
//!   `|pitch| < 90°`.

use nalgebra::{Isometry3, Translation3, UnitQuaternion};

use crate::Pose;

impl From<Pose> for Isometry3<f64> {
    fn from(pose: Pose) -> Self {
        let translation = Translation3::new(pose.x, pose.y, pose.z);
        let rotation = UnitQuaternion::from_euler_angles(pose.roll, pose.pitch, pose.yaw);
        Isometry3::from_parts(translation, rotation)
    }
}

impl From<&Pose> for Isometry3<f64> {
    fn from(pose: &Pose) -> Self {
        (*pose).into()
    }
}

impl From<Isometry3<f64>> for Pose {
    fn from(iso: Isometry3<f64>) -> Self {
        let (roll, pitch, yaw) = iso.rotation.euler_angles();
        Pose {
            x: iso.translation.x,
            y: iso.translation.y,
            z: iso.translation.z,
            roll,
            pitch,
            yaw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::rotate_rpy;
    use nalgebra::Vector3;

    #[test]
    fn test_pose_to_isometry_translation() {
        let pose = Pose::new(100.0, 200.0, 300.0, 0.0, 0.0, 0.0);
        let iso: Isometry3<f64> = pose.into();

        assert!((iso.translation.x - 100.0).abs() < 1e-10);
        assert!((iso.translation.y - 200.0).abs() < 1e-10);
        assert!((iso.translation.z - 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let original = Pose::new(12.5, -7.25, 3.0, 0.05, -0.03, 0.02);
        let iso: Isometry3<f64> = (&original).into();
        let converted: Pose = iso.into();

        assert!((converted.x - original.x).abs() < 1e-10);
        assert!((converted.y - original.y).abs() < 1e-10);
        assert!((converted.z - original.z).abs() < 1e-10);
        assert!((converted.roll - original.roll).abs() < 1e-9);
        assert!((converted.pitch - original.pitch).abs() < 1e-9);
        assert!((converted.yaw - original.yaw).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_matches_solver() {
        let pose = Pose::new(0.0, 0.0, 0.0, 0.2, -0.1, 0.4);
        let iso: Isometry3<f64> = pose.into();
        let p = Vector3::new(60.0, -25.0, 0.0);

        let expected = iso.rotation * p;
        let actual = rotate_rpy(&pose.rotation(), &p);
        assert!((expected - actual).norm() < 1e-9);
    }
}
