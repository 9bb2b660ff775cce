// Inverse kinematics for a six-leg rotary Stewart platform.
//
// Each leg is a servo horn of fixed length pivoting at a base joint, joined to
// the moving plate by a rod of fixed length. For a commanded pose the platform
// joints are moved into the world frame and every horn angle is solved in
// closed form.

use nalgebra::Vector3;
use tracing::debug;

use crate::geometry::PlatformGeometry;
use crate::{PlatformConfig, Pose, LEG_COUNT};

/// Result of solving one leg.
///
/// `alpha` is `NaN` when the leg has no solution at all (the horn plane
/// degenerates). When the target is merely out of reach, `ratio` falls outside
/// `[-1, 1]`, `saturated` is set and `alpha` is the fully extended/retracted
/// horn angle instead of a rejection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegSolution {
    pub alpha: f64,
    /// `L / sqrt(M^2 + N^2)` before clamping.
    pub ratio: f64,
    pub m: f64,
    pub n: f64,
    pub saturated: bool,
}

impl LegSolution {
    pub fn is_defined(&self) -> bool {
        !self.alpha.is_nan()
    }
}

/// Everything a visualization or status display needs from one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicsSnapshot {
    pub pose: Pose,
    pub alpha: [f64; LEG_COUNT],
    pub alpha_degrees: [f64; LEG_COUNT],
    pub base_points: [Vector3<f64>; LEG_COUNT],
    pub platform_points: [Vector3<f64>; LEG_COUNT],
    pub horn_end_points: [Vector3<f64>; LEG_COUNT],
    pub saturated: [bool; LEG_COUNT],
    pub valid: bool,
}

/// Owns the platform model and the result of the most recent solve.
///
/// The commanded pose only changes through [`apply_pose`](Self::apply_pose),
/// which recomputes every leg angle and horn tip in one go.
#[derive(Debug, Clone)]
pub struct StewartKinematics {
    config: PlatformConfig,
    geometry: PlatformGeometry,

    pose: Pose,
    platform_world: [Vector3<f64>; LEG_COUNT],
    legs: [LegSolution; LEG_COUNT],
    alpha: [f64; LEG_COUNT],
    horn_tips: [Vector3<f64>; LEG_COUNT],
}

impl StewartKinematics {
    /// Builds the model and solves the home pose.
    pub fn from_config(config: PlatformConfig) -> Self {
        let geometry = PlatformGeometry::from_config(&config);
        let undefined = LegSolution {
            alpha: f64::NAN,
            ratio: f64::NAN,
            m: 0.0,
            n: 0.0,
            saturated: false,
        };
        let mut kinematics = Self {
            config,
            geometry,
            pose: Pose::HOME,
            platform_world: [Vector3::zeros(); LEG_COUNT],
            legs: [undefined; LEG_COUNT],
            alpha: [f64::NAN; LEG_COUNT],
            horn_tips: [Vector3::zeros(); LEG_COUNT],
        };
        kinematics.apply_pose(Pose::HOME);
        kinematics
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn geometry(&self) -> &PlatformGeometry {
        &self.geometry
    }

    /// Sets the commanded pose and re-solves all six legs.
    pub fn apply_pose(&mut self, pose: Pose) -> &[f64; LEG_COUNT] {
        self.pose = pose;

        let height = Vector3::new(0.0, 0.0, self.config.initial_height);
        let translation = pose.translation();
        let rotation = pose.rotation();

        for i in 0..LEG_COUNT {
            let b = self.geometry.base_joints()[i];
            let p = self.geometry.platform_joints()[i];
            let beta = self.config.beta_angles[i];

            let q = rotate_rpy(&rotation, &p) + translation + height;
            let leg = solve_leg(
                &q,
                &b,
                beta,
                self.config.horn_length,
                self.config.rod_length,
            );
            if leg.saturated {
                debug!("leg {} saturated (ratio {:.4}), clamping horn angle", i, leg.ratio);
            }

            self.platform_world[i] = q;
            self.legs[i] = leg;
            self.alpha[i] = leg.alpha;
            self.horn_tips[i] = horn_tip(leg.alpha, beta, &b, self.config.horn_length);
        }

        &self.alpha
    }

    /// Same as [`apply_pose`](Self::apply_pose) with the six axes passed separately.
    pub fn apply_translation_and_rotation(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        roll: f64,
        pitch: f64,
        yaw: f64,
    ) -> &[f64; LEG_COUNT] {
        self.apply_pose(Pose::new(x, y, z, roll, pitch, yaw))
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Horn angles in radians.
    pub fn alpha(&self) -> &[f64; LEG_COUNT] {
        &self.alpha
    }

    /// Horn angle of one leg in degrees.
    ///
    /// # Panics
    /// If `index >= LEG_COUNT`.
    pub fn alpha_degree(&self, index: usize) -> f64 {
        self.alpha[index].to_degrees()
    }

    pub fn alpha_degrees(&self) -> [f64; LEG_COUNT] {
        self.alpha.map(f64::to_degrees)
    }

    pub fn leg_solutions(&self) -> &[LegSolution; LEG_COUNT] {
        &self.legs
    }

    /// True when every leg has a defined angle.
    pub fn is_valid(&self) -> bool {
        self.alpha.iter().all(|a| !a.is_nan())
    }

    pub fn base_points(&self) -> &[Vector3<f64>; LEG_COUNT] {
        self.geometry.base_joints()
    }

    /// Platform joints in the world frame for the current pose.
    pub fn platform_points(&self) -> &[Vector3<f64>; LEG_COUNT] {
        &self.platform_world
    }

    pub fn horn_end_points(&self) -> &[Vector3<f64>; LEG_COUNT] {
        &self.horn_tips
    }

    pub fn snapshot(&self) -> KinematicsSnapshot {
        KinematicsSnapshot {
            pose: self.pose,
            alpha: self.alpha,
            alpha_degrees: self.alpha_degrees(),
            base_points: *self.geometry.base_joints(),
            platform_points: self.platform_world,
            horn_end_points: self.horn_tips,
            saturated: self.legs.map(|leg| leg.saturated),
            valid: self.is_valid(),
        }
    }
}

impl Default for StewartKinematics {
    fn default() -> Self {
        Self::from_config(PlatformConfig::default())
    }
}

// ============================================================================
// Closed-form pieces
// ============================================================================

/// Rotates a body-frame point by roll (X), pitch (Y) and yaw (Z).
///
/// The matrix is `Rz(yaw) * Ry(pitch) * Rx(roll)` written out term by term;
/// keep the expression order so repeated solves stay bit-identical.
pub fn rotate_rpy(rotation: &Vector3<f64>, p: &Vector3<f64>) -> Vector3<f64> {
    let cx = rotation.x.cos();
    let sx = rotation.x.sin();
    let cy = rotation.y.cos();
    let sy = rotation.y.sin();
    let cz = rotation.z.cos();
    let sz = rotation.z.sin();

    let qx = (cz * cy) * p.x + (-sz * cx + cz * sy * sx) * p.y + (sz * sx + cz * sy * cx) * p.z;
    let qy = (sz * cy) * p.x + (cz * cx + sz * sy * sx) * p.y + (-cz * sx + sz * sy * cx) * p.z;
    let qz = (-sy) * p.x + (cy * sx) * p.y + (cy * cx) * p.z;

    Vector3::new(qx, qy, qz)
}

/// Solves the horn angle of one leg.
///
/// # Arguments
/// * `q` - platform joint in the world frame
/// * `b` - base joint
/// * `beta` - orientation of the horn's swing plane (radians)
/// * `horn_length`, `rod_length` - link lengths
pub fn solve_leg(
    q: &Vector3<f64>,
    b: &Vector3<f64>,
    beta: f64,
    horn_length: f64,
    rod_length: f64,
) -> LegSolution {
    let l = q - b;
    let big_l = l.norm_squared() - (rod_length * rod_length) + (horn_length * horn_length);
    let m = 2.0 * horn_length * (q.z - b.z);
    let n = 2.0 * horn_length * (beta.cos() * (q.x - b.x) + beta.sin() * (q.y - b.y));

    let ratio = big_l / (m * m + n * n).sqrt();

    // Out-of-reach targets saturate; a zero denominator has no answer at all.
    let (val, saturated) = if !ratio.is_finite() {
        (f64::NAN, false)
    } else if ratio > 1.0 {
        (1.0, true)
    } else if ratio < -1.0 {
        (-1.0, true)
    } else {
        (ratio, false)
    };

    LegSolution {
        alpha: val.asin() - n.atan2(m),
        ratio,
        m,
        n,
        saturated,
    }
}

/// World position of a horn tip for a solved angle. `NaN` in, `NaN` out.
pub fn horn_tip(alpha: f64, beta: f64, b: &Vector3<f64>, horn_length: f64) -> Vector3<f64> {
    Vector3::new(
        horn_length * alpha.cos() * beta.cos() + b.x,
        horn_length * alpha.cos() * beta.sin() + b.y,
        horn_length * alpha.sin() + b.z,
    )
}
