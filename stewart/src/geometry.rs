use nalgebra::Vector3;

use crate::{PlatformConfig, LEG_COUNT};

/// Fixed joint positions of the platform, computed once from a [`PlatformConfig`].
///
/// Base joints are expressed in the base frame, platform joints in the body
/// frame of the moving plate. Both lie in their own `z = 0` plane.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformGeometry {
    base: [Vector3<f64>; LEG_COUNT],
    platform: [Vector3<f64>; LEG_COUNT],
}

impl PlatformGeometry {
    pub fn from_config(config: &PlatformConfig) -> Self {
        let base = std::array::from_fn(|i| {
            joint_on_circle(config.base_radius, config.base_angles[i])
        });
        let platform = std::array::from_fn(|i| {
            joint_on_circle(config.platform_radius, config.platform_angles[i])
        });
        Self { base, platform }
    }

    /// Base joints `b[i]`.
    pub fn base_joints(&self) -> &[Vector3<f64>; LEG_COUNT] {
        &self.base
    }

    /// Platform joints `p[i]` in the plate's body frame.
    pub fn platform_joints(&self) -> &[Vector3<f64>; LEG_COUNT] {
        &self.platform
    }
}

fn joint_on_circle(radius: f64, angle_deg: f64) -> Vector3<f64> {
    let angle = angle_deg.to_radians();
    Vector3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joints_lie_on_their_circles() {
        let config = PlatformConfig::default();
        let geometry = PlatformGeometry::from_config(&config);

        for i in 0..LEG_COUNT {
            let b = geometry.base_joints()[i];
            let p = geometry.platform_joints()[i];
            assert!((b.norm() - config.base_radius).abs() < 1e-9);
            assert!((p.norm() - config.platform_radius).abs() < 1e-9);
            assert_eq!(b.z, 0.0);
            assert_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn first_base_joint_position() {
        let geometry = PlatformGeometry::from_config(&PlatformConfig::default());
        let b0 = geometry.base_joints()[0];
        let expected_x = 76.0 * (-50.0_f64).to_radians().cos();
        let expected_y = 76.0 * (-50.0_f64).to_radians().sin();
        assert!((b0.x - expected_x).abs() < 1e-12);
        assert!((b0.y - expected_y).abs() < 1e-12);
        assert!(b0.y < 0.0, "leg 0 sits below the X axis");
    }

    #[test]
    fn legs_are_index_aligned() {
        let geometry = PlatformGeometry::from_config(&PlatformConfig::default());
        // each platform joint is 4 degrees away from its own base joint
        for i in 0..LEG_COUNT {
            let b = geometry.base_joints()[i];
            let p = geometry.platform_joints()[i];
            let between = b.angle(&p).to_degrees();
            assert!((between - 4.0).abs() < 1e-9, "leg {} is {} deg apart", i, between);
        }
    }
}
