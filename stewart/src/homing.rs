use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Pose;

/// Step sizes and tick period of the return-to-home motion.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct HomingConfig {
    /// Millimeters moved per tick on x, y and z.
    pub translation_step: f64,
    /// Radians moved per tick on roll, pitch and yaw.
    pub rotation_step: f64,
    pub interval: Duration,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            translation_step: 0.5,
            rotation_step: 0.05_f64.to_radians(),
            interval: Duration::from_millis(20),
        }
    }
}

impl HomingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.translation_step.is_finite() && self.translation_step > 0.0) {
            return Err("Homing translation step must be greater than 0.".to_string());
        }
        if !(self.rotation_step.is_finite() && self.rotation_step > 0.0) {
            return Err("Homing rotation step must be greater than 0.".to_string());
        }
        if self.interval.is_zero() {
            return Err("Homing interval must be greater than 0.".to_string());
        }
        Ok(())
    }

    /// Step size for an axis in `Pose::axes` order.
    fn step_for(&self, axis: usize) -> f64 {
        if axis < 3 {
            self.translation_step
        } else {
            self.rotation_step
        }
    }

    /// Number of ticks needed to bring `pose` home, never less than one.
    pub fn ticks_to_home(&self, pose: &Pose) -> u64 {
        pose.axes()
            .iter()
            .enumerate()
            .map(|(axis, value)| (value.abs() / self.step_for(axis)).ceil() as u64)
            .max()
            .unwrap_or(0)
            .max(1)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomingState {
    #[default]
    Idle,
    Animating,
}

/// Eases the commanded pose back to zero, one bounded step per axis per tick.
///
/// Each axis moves linearly toward zero and snaps to exactly zero once it is
/// within one step, so it never overshoots. The controller returns to `Idle`
/// on the tick at which all six axes are zero.
#[derive(Debug, Clone, Default)]
pub struct HomingController {
    config: HomingConfig,
    state: HomingState,
}

impl HomingController {
    pub fn new(config: HomingConfig) -> Self {
        Self {
            config,
            state: HomingState::Idle,
        }
    }

    pub fn config(&self) -> &HomingConfig {
        &self.config
    }

    pub fn state(&self) -> HomingState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state == HomingState::Animating
    }

    /// Starts (or keeps) the animation.
    pub fn request(&mut self) {
        self.state = HomingState::Animating;
    }

    /// Abandons the animation where it is.
    pub fn cancel(&mut self) {
        self.state = HomingState::Idle;
    }

    /// Advances `pose` one step toward home.
    ///
    /// Does nothing while idle. Returns the state after the tick; the caller
    /// re-applies `pose` to the kinematics whenever this moved it.
    pub fn tick(&mut self, pose: &mut Pose) -> HomingState {
        if self.state == HomingState::Idle {
            return self.state;
        }

        let config = self.config;
        let mut home = true;
        for (axis, value) in pose.axes_mut().into_iter().enumerate() {
            home &= step_toward_zero(value, config.step_for(axis));
        }

        if home {
            self.state = HomingState::Idle;
        }
        self.state
    }
}

/// Moves `value` one `step` toward zero. Returns true once it is exactly zero.
fn step_toward_zero(value: &mut f64, step: f64) -> bool {
    if value.abs() > step {
        if *value > 0.0 {
            *value -= step;
        } else {
            *value += step;
        }
        false
    } else {
        *value = 0.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_home(controller: &mut HomingController, pose: &mut Pose) -> u64 {
        let mut ticks = 0;
        while controller.is_animating() {
            controller.tick(pose);
            ticks += 1;
            assert!(ticks < 100_000, "homing never converged");
        }
        ticks
    }

    #[test]
    fn idle_tick_leaves_pose_alone() {
        let mut controller = HomingController::default();
        let mut pose = Pose::new(1.0, 2.0, 3.0, 0.1, 0.2, 0.3);
        assert_eq!(controller.tick(&mut pose), HomingState::Idle);
        assert_eq!(pose, Pose::new(1.0, 2.0, 3.0, 0.1, 0.2, 0.3));
    }

    #[test]
    fn converges_on_the_computed_tick() {
        let config = HomingConfig::default();
        let mut controller = HomingController::new(config);
        let mut pose = Pose::new(10.0, -10.0, 5.0, 0.05, -0.03, 0.02);

        let expected = config.ticks_to_home(&pose);
        // 0.05 rad at 0.05 deg per tick dominates
        assert_eq!(expected, 58);

        controller.request();
        for tick in 1..expected {
            assert_eq!(controller.tick(&mut pose), HomingState::Animating, "tick {}", tick);
            assert!(!pose.is_home());
        }
        assert_eq!(controller.tick(&mut pose), HomingState::Idle);
        assert!(pose.is_home());
        assert_eq!(pose.axes(), [0.0; 6]);
    }

    #[test]
    fn translation_dominated_convergence() {
        let config = HomingConfig {
            translation_step: 0.5,
            rotation_step: 0.05,
            ..HomingConfig::default()
        };
        let mut controller = HomingController::new(config);
        let mut pose = Pose::new(10.0, -10.0, 5.0, 0.05, -0.03, 0.02);

        controller.request();
        let ticks = run_to_home(&mut controller, &mut pose);
        assert_eq!(ticks, 20);
        assert_eq!(ticks, config.ticks_to_home(&Pose::new(10.0, -10.0, 5.0, 0.05, -0.03, 0.02)));
        assert!(pose.is_home());
    }

    #[test]
    fn axes_move_monotonically_without_overshoot() {
        let mut controller = HomingController::default();
        let mut pose = Pose::new(3.2, -1.7, 0.4, -0.01, 0.004, 0.0);
        controller.request();

        let mut previous = pose.axes();
        while controller.is_animating() {
            controller.tick(&mut pose);
            let current = pose.axes();
            for axis in 0..6 {
                assert!(current[axis].abs() <= previous[axis].abs());
                // sign never flips
                assert!(current[axis] * previous[axis] >= 0.0);
            }
            previous = current;
        }
        assert!(pose.is_home());
    }

    #[test]
    fn already_home_finishes_on_first_tick() {
        let mut controller = HomingController::default();
        let mut pose = Pose::HOME;
        controller.request();
        assert_eq!(controller.tick(&mut pose), HomingState::Idle);
        assert_eq!(HomingConfig::default().ticks_to_home(&pose), 1);
    }

    #[test]
    fn cancel_stops_midway() {
        let mut controller = HomingController::default();
        let mut pose = Pose::new(10.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        controller.request();
        controller.tick(&mut pose);
        controller.cancel();
        assert_eq!(controller.tick(&mut pose), HomingState::Idle);
        assert_eq!(pose.x, 9.5);
    }

    #[test]
    fn rejects_zero_steps() {
        let config = HomingConfig {
            rotation_step: 0.0,
            ..HomingConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(HomingConfig::default().validate().is_ok());
    }
}
