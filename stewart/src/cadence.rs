use serde::{Deserialize, Serialize};

use crate::drivers::LinkState;
use crate::kinematics::StewartKinematics;
use crate::protocol::encode_frame;

/// What to do when a tick finds an undefined leg angle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NanPolicy {
    /// Drop this tick, keep the timer running.
    #[default]
    SkipTick,
    /// Suspend streaming until explicitly resumed.
    StopStreaming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CadenceOutcome {
    /// A frame ready to be written to the transport.
    Transmit(Vec<u8>),
    /// The solve was invalid; nothing is sent this tick.
    Skipped,
    /// The solve was invalid and streaming is now suspended.
    Suspended,
    /// Not streaming (detached, failed or suspended).
    Inactive,
}

/// Fixed-rate sampler of the latest solve.
///
/// It only reads whatever angles the kinematics hold at tick time, so pose
/// updates between ticks are coalesced and only the newest one goes out.
#[derive(Debug, Clone, Default)]
pub struct CadenceController {
    policy: NanPolicy,
    state: LinkState,
    frames: u64,
    skipped: u64,
}

impl CadenceController {
    pub fn new(policy: NanPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> NanPolicy {
        self.policy
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Frames produced since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Ticks dropped because of an undefined leg angle.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// A transport was opened; streaming starts on the next tick.
    pub fn attach(&mut self) {
        self.state = LinkState::Streaming;
    }

    pub fn detach(&mut self) {
        self.state = LinkState::Detached;
    }

    /// The transport reported an error. Nothing is sent until `attach`.
    pub fn fail(&mut self) {
        self.state = LinkState::Failed;
    }

    /// Leaves a NaN suspension. Returns false if streaming was not suspended.
    pub fn resume(&mut self) -> bool {
        if self.state == LinkState::Suspended {
            self.state = LinkState::Streaming;
            true
        } else {
            false
        }
    }

    pub fn tick(&mut self, kinematics: &StewartKinematics) -> CadenceOutcome {
        if self.state != LinkState::Streaming {
            return CadenceOutcome::Inactive;
        }

        match encode_frame(kinematics.alpha()) {
            Some(frame) => {
                self.frames += 1;
                CadenceOutcome::Transmit(frame)
            }
            None => {
                self.skipped += 1;
                match self.policy {
                    NanPolicy::SkipTick => CadenceOutcome::Skipped,
                    NanPolicy::StopStreaming => {
                        self.state = LinkState::Suspended;
                        CadenceOutcome::Suspended
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode_frame;
    use crate::{PlatformConfig, Pose};

    fn degenerate_kinematics() -> StewartKinematics {
        let mut config = PlatformConfig::default();
        config.platform_radius = config.base_radius;
        config.platform_angles[0] = config.base_angles[0];
        config.initial_height = 0.0;
        StewartKinematics::from_config(config)
    }

    #[test]
    fn inactive_until_attached() {
        let kin = StewartKinematics::default();
        let mut cadence = CadenceController::default();
        assert_eq!(cadence.tick(&kin), CadenceOutcome::Inactive);

        cadence.attach();
        assert!(matches!(cadence.tick(&kin), CadenceOutcome::Transmit(_)));
        assert_eq!(cadence.frames(), 1);
    }

    #[test]
    fn transmits_only_the_latest_pose() {
        let mut kin = StewartKinematics::default();
        let mut cadence = CadenceController::default();
        cadence.attach();

        kin.apply_pose(Pose::new(5.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        kin.apply_pose(Pose::new(0.0, 5.0, 0.0, 0.0, 0.0, 0.0));
        kin.apply_pose(Pose::new(0.0, 0.0, 5.0, 0.0, 0.0, 0.0));

        let CadenceOutcome::Transmit(frame) = cadence.tick(&kin) else {
            panic!("expected a frame");
        };
        let values = decode_frame(&frame).unwrap();
        let expected = kin.alpha().map(crate::protocol::to_centidegrees);
        assert_eq!(values, expected);
        assert_eq!(cadence.frames(), 1);
    }

    #[test]
    fn undefined_leg_skips_tick_and_keeps_running() {
        let kin = degenerate_kinematics();
        let mut cadence = CadenceController::new(NanPolicy::SkipTick);
        cadence.attach();

        assert_eq!(cadence.tick(&kin), CadenceOutcome::Skipped);
        assert_eq!(cadence.tick(&kin), CadenceOutcome::Skipped);
        assert_eq!(cadence.state(), LinkState::Streaming);
        assert_eq!(cadence.frames(), 0);
        assert_eq!(cadence.skipped(), 2);
    }

    #[test]
    fn stop_policy_suspends_until_resumed() {
        let kin = degenerate_kinematics();
        let mut cadence = CadenceController::new(NanPolicy::StopStreaming);
        cadence.attach();

        assert_eq!(cadence.tick(&kin), CadenceOutcome::Suspended);
        assert_eq!(cadence.state(), LinkState::Suspended);
        assert_eq!(cadence.tick(&kin), CadenceOutcome::Inactive);

        let good = StewartKinematics::default();
        assert!(cadence.resume());
        assert!(matches!(cadence.tick(&good), CadenceOutcome::Transmit(_)));
        assert!(!cadence.resume());
    }

    #[test]
    fn failed_transport_stops_transmission_until_reattached() {
        let kin = StewartKinematics::default();
        let mut cadence = CadenceController::default();
        cadence.attach();
        cadence.fail();

        assert_eq!(cadence.tick(&kin), CadenceOutcome::Inactive);
        assert!(!cadence.resume());

        cadence.attach();
        assert!(matches!(cadence.tick(&kin), CadenceOutcome::Transmit(_)));
    }
}
