//! Forward kinematics by inverting the inverse solver.
//!
//! A Stewart platform has no closed-form forward solution, so the simulated
//! board recovers the pose numerically: Newton iterations on
//! `alpha(pose) = target` with a finite-difference Jacobian, warm-started
//! from the previous estimate.

use nalgebra::{Matrix6, Vector6};
use stewart::{Pose, StewartKinematics, LEG_COUNT};

const MAX_ITERATIONS: usize = 25;
const PROBE_STEP: f64 = 1e-6;
const TOLERANCE: f64 = 1e-10;
/// Accepted residual (rad) when the iteration budget runs out.
const LOOSE_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Pose recovery
// ============================================================================

/// Finds the pose whose horn angles are `alpha`, starting from `guess`.
///
/// Returns `None` when an iterate leaves the reachable workspace (undefined
/// or saturated legs flatten the Jacobian) or the Jacobian is singular.
/// `kinematics` is used as scratch space and is left at the last iterate.
pub fn estimate_pose(
    kinematics: &mut StewartKinematics,
    alpha: &[f64; LEG_COUNT],
    guess: Pose,
) -> Option<Pose> {
    let target = Vector6::from_column_slice(alpha);
    let mut x = Vector6::from_column_slice(&guess.axes());

    for _ in 0..MAX_ITERATIONS {
        let residual = solve(kinematics, &x)? - target;
        if residual.norm() < TOLERANCE {
            return Some(to_pose(&x));
        }

        let mut jacobian = Matrix6::zeros();
        for axis in 0..LEG_COUNT {
            let mut probe = x;
            probe[axis] += PROBE_STEP;
            let column = (solve(kinematics, &probe)? - target - residual) / PROBE_STEP;
            jacobian.set_column(axis, &column);
        }

        let delta = jacobian.lu().solve(&residual)?;
        x -= delta;
    }

    let residual = solve(kinematics, &x)? - target;
    (residual.norm() < LOOSE_TOLERANCE).then(|| to_pose(&x))
}

fn solve(kinematics: &mut StewartKinematics, x: &Vector6<f64>) -> Option<Vector6<f64>> {
    kinematics.apply_pose(to_pose(x));
    let reachable = kinematics
        .leg_solutions()
        .iter()
        .all(|leg| leg.is_defined() && !leg.saturated);
    reachable.then(|| Vector6::from_column_slice(kinematics.alpha()))
}

fn to_pose(x: &Vector6<f64>) -> Pose {
    Pose::new(x[0], x[1], x[2], x[3], x[4], x[5])
}

#[cfg(test)]
mod tests {
    use super::*;
    use stewart::PlatformConfig;

    fn alpha_for(pose: Pose) -> [f64; LEG_COUNT] {
        let mut kinematics = StewartKinematics::default();
        *kinematics.apply_pose(pose)
    }

    #[test]
    fn test_recovers_home() {
        let mut scratch = StewartKinematics::default();
        let alpha = alpha_for(Pose::HOME);

        let pose = estimate_pose(&mut scratch, &alpha, Pose::HOME).unwrap();
        for value in pose.axes() {
            assert!(value.abs() < 1e-6, "{:?}", pose);
        }
    }

    #[test]
    fn test_recovers_tilted_pose_from_home_guess() {
        let commanded = Pose::new(5.0, -3.0, 4.0, 0.05, -0.03, 0.02);
        let alpha = alpha_for(commanded);

        let mut scratch = StewartKinematics::default();
        let pose = estimate_pose(&mut scratch, &alpha, Pose::HOME).unwrap();

        for (got, want) in pose.axes().iter().zip(commanded.axes().iter()) {
            assert!((got - want).abs() < 1e-5, "got {:?}, want {:?}", pose, commanded);
        }
    }

    #[test]
    fn test_large_frame_preset() {
        let commanded = Pose::from_degrees(10.0, 0.0, -5.0, 2.0, 0.0, -3.0);
        let mut kinematics = StewartKinematics::from_config(PlatformConfig::large_frame());
        let alpha = *kinematics.apply_pose(commanded);

        let mut scratch = StewartKinematics::from_config(PlatformConfig::large_frame());
        let pose = estimate_pose(&mut scratch, &alpha, Pose::HOME).unwrap();
        assert!((pose.yaw - commanded.yaw).abs() < 1e-5);
        assert!((pose.x - commanded.x).abs() < 1e-4);
    }

    #[test]
    fn test_undefined_angles_give_up() {
        let mut scratch = StewartKinematics::default();
        let mut alpha = alpha_for(Pose::HOME);
        alpha[3] = f64::NAN;
        assert!(estimate_pose(&mut scratch, &alpha, Pose::HOME).is_none());
    }
}
