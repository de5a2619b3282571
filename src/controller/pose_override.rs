//! Short-lived pose hold used to hand the camera back to a controller without a snap.

use super::behaviour::{BehaviourId, Behaviours};
use super::calibration::reconcile;
use crate::model::{CameraPose, NodeHandle, Scene};

#[derive(Debug)]
struct Hold {
    pose: CameraPose,
    camera: NodeHandle,
    ticks_remaining: u32,
    calibrate: Option<BehaviourId>,
    paused: Vec<BehaviourId>,
    calibrated: bool,
}

/// Forces a pose onto the camera for a fixed number of ticks.
///
/// The pose is written twice per tick: in [`update`](Self::update) and again in
/// [`pre_render`](Self::pre_render), after every other behaviour has run.
#[derive(Debug, Default)]
pub struct PoseOverride {
    hold: Option<Hold>,
}

impl PoseOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.hold.is_some()
    }

    pub fn ticks_remaining(&self) -> u32 {
        self.hold.as_ref().map_or(0, |h| h.ticks_remaining)
    }

    pub fn pose(&self) -> Option<CameraPose> {
        self.hold.as_ref().map(|h| h.pose)
    }

    /// Arm a hold of `hold_ticks` (at least one) and pause `paused` right away.
    ///
    /// `paused` are always re-enabled when the hold ends, whatever their state was before.
    pub fn setup(
        &mut self,
        behaviours: &mut Behaviours,
        camera: NodeHandle,
        pose: CameraPose,
        hold_ticks: u32,
        calibrate: Option<BehaviourId>,
        paused: &[BehaviourId],
    ) {
        if self.is_armed() {
            self.release(behaviours);
        }
        for &id in paused {
            behaviours.set_enabled(id, false);
        }
        let ticks_remaining = hold_ticks.max(1);
        tracing::info!(ticks = ticks_remaining, "pose override armed");
        self.hold = Some(Hold {
            pose,
            camera,
            ticks_remaining,
            calibrate,
            paused: paused.to_vec(),
            calibrated: false,
        });
    }

    /// First assertion of the tick. Calibrates once, then counts down.
    pub fn update(&mut self, scene: &mut Scene, behaviours: &mut Behaviours) {
        let Some(hold) = self.hold.as_mut() else {
            return;
        };
        if !scene.apply_camera_pose(hold.camera, &hold.pose) {
            tracing::warn!("override camera lost, disarming");
            self.release(behaviours);
            return;
        }
        if !hold.calibrated {
            if let Some(c) = hold.calibrate.and_then(|id| behaviours.get_mut(id)) {
                reconcile(c, hold.pose.rotation);
            }
            hold.calibrated = true;
        }
        hold.ticks_remaining = hold.ticks_remaining.saturating_sub(1);
        if hold.ticks_remaining == 0 {
            self.release(behaviours);
        }
    }

    /// Second assertion, after every behaviour's late update.
    pub fn pre_render(&mut self, scene: &mut Scene, behaviours: &mut Behaviours) {
        let Some(hold) = self.hold.as_ref() else {
            return;
        };
        if !scene.apply_camera_pose(hold.camera, &hold.pose) {
            tracing::warn!("override camera lost, disarming");
            self.release(behaviours);
        }
    }

    /// Drop the hold early. Paused behaviours are still re-enabled.
    pub fn cancel(&mut self, behaviours: &mut Behaviours) {
        if self.is_armed() {
            tracing::debug!(remaining = self.ticks_remaining(), "pose override cancelled");
            self.release(behaviours);
        }
    }

    fn release(&mut self, behaviours: &mut Behaviours) {
        if let Some(hold) = self.hold.take() {
            for id in hold.paused {
                behaviours.set_enabled(id, true);
            }
            tracing::info!("pose override released");
        }
    }
}
