//! Mirrors the editor viewport onto the rig camera.

use thiserror::Error;

use super::behaviour::{BehaviourId, Behaviours};
use super::calibration::{reconcile_yaw_pitch, zero_velocity_like_fields};
use crate::model::{CameraPose, NodeHandle, Scene};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    #[error("no scene viewport is available")]
    NoViewport,
    #[error("rig camera is missing, inactive or disabled")]
    MissingCamera,
}

/// Live pose of the external navigation camera, if there is one.
pub trait ViewportSource {
    fn current_pose(&self) -> Option<CameraPose>;
}

/// A viewport whose pose is pushed in by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneViewport {
    pose: Option<CameraPose>,
}

impl SceneViewport {
    pub fn new(pose: CameraPose) -> Self {
        Self { pose: Some(pose) }
    }

    /// No viewport open.
    pub fn closed() -> Self {
        Self { pose: None }
    }

    pub fn set_pose(&mut self, pose: Option<CameraPose>) {
        self.pose = pose;
    }
}

impl ViewportSource for SceneViewport {
    fn current_pose(&self) -> Option<CameraPose> {
        self.pose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Edit,
    Play,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Stopped,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PausedBehaviour {
    pub id: BehaviourId,
    pub was_enabled: bool,
}

fn pause(behaviours: &mut Behaviours, id: BehaviourId) -> Option<PausedBehaviour> {
    let b = behaviours.get_mut(id)?;
    let was_enabled = b.enabled();
    b.set_enabled(false);
    Some(PausedBehaviour { id, was_enabled })
}

#[derive(Debug, Default)]
pub struct ViewportMirror {
    active: bool,
    camera: Option<NodeHandle>,
    controller: Option<BehaviourId>,
    paused: Vec<PausedBehaviour>,
    calibrated: bool,
}

impl ViewportMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        if self.active { SyncState::Active } else { SyncState::Stopped }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn paused(&self) -> &[PausedBehaviour] {
        &self.paused
    }

    /// Start mirroring `viewport` onto `camera`.
    ///
    /// `controller` is the look controller to pause, strip of lock-on and momentum, and
    /// calibrate on the first tick. `others` are paused alongside it. The camera jumps to
    /// the viewport pose before this returns. On error nothing is touched.
    pub fn begin(
        &mut self,
        scene: &mut Scene,
        behaviours: &mut Behaviours,
        viewport: &dyn ViewportSource,
        camera: NodeHandle,
        controller: Option<BehaviourId>,
        others: &[BehaviourId],
    ) -> Result<(), SyncError> {
        let pose = viewport.current_pose().ok_or(SyncError::NoViewport)?;
        if !scene.is_camera_live(camera) {
            return Err(SyncError::MissingCamera);
        }
        if self.active {
            self.cancel(behaviours);
        }

        if let Some(c) = controller.and_then(|id| behaviours.get_mut(id)) {
            c.clear_lock_on();
            zero_velocity_like_fields(c);
        }
        self.paused.clear();
        for id in controller.into_iter().chain(others.iter().copied()) {
            // A repeated id would record itself as already disabled
            if self.paused.iter().any(|p| p.id == id) {
                continue;
            }
            if let Some(p) = pause(behaviours, id) {
                self.paused.push(p);
            }
        }

        scene.apply_camera_pose(camera, &pose);

        self.active = true;
        self.camera = Some(camera);
        self.controller = controller;
        self.calibrated = false;
        tracing::info!(paused = self.paused.len(), "scene sync started");
        Ok(())
    }

    /// Copy the viewport pose once. Stops the session if the camera went away.
    pub fn tick(&mut self, scene: &mut Scene, behaviours: &mut Behaviours, viewport: &dyn ViewportSource) -> SyncState {
        let Some(camera) = self.camera.filter(|_| self.active) else {
            return SyncState::Stopped;
        };
        if !scene.is_camera_live(camera) {
            tracing::warn!("rig camera lost, stopping scene sync");
            self.cancel(behaviours);
            return SyncState::Stopped;
        }
        // Viewport closing for a frame is not fatal
        let Some(pose) = viewport.current_pose() else {
            return SyncState::Active;
        };
        scene.apply_camera_pose(camera, &pose);

        if !self.calibrated {
            if let Some(c) = self.controller.and_then(|id| behaviours.get_mut(id)) {
                reconcile_yaw_pitch(c, pose.rotation);
            }
            self.calibrated = true;
        }
        SyncState::Active
    }

    /// Stop mirroring and return the pose to hold.
    ///
    /// The pose is read before anything is re-enabled. In play mode the look controller stays
    /// paused so it cannot overwrite that pose before the hold takes over. Without a pose there
    /// is no hold, so it is restored like everything else.
    pub fn end(
        &mut self,
        scene: &Scene,
        behaviours: &mut Behaviours,
        viewport: &dyn ViewportSource,
        mode: RunMode,
    ) -> Option<CameraPose> {
        if !self.active {
            return None;
        }
        let camera_pose = self.camera.and_then(|c| scene.camera_pose(c));
        let captured = match mode {
            RunMode::Play => camera_pose,
            RunMode::Edit => viewport.current_pose().or(camera_pose),
        };

        for p in std::mem::take(&mut self.paused) {
            if mode == RunMode::Play && captured.is_some() && Some(p.id) == self.controller {
                continue;
            }
            behaviours.set_enabled(p.id, p.was_enabled);
        }
        self.reset();
        tracing::info!(?mode, captured = captured.is_some(), "scene sync stopped");
        captured
    }

    /// Stop without handing off a pose. Every paused behaviour gets its old flag back.
    pub fn cancel(&mut self, behaviours: &mut Behaviours) {
        if !self.active {
            return;
        }
        for p in std::mem::take(&mut self.paused) {
            behaviours.set_enabled(p.id, p.was_enabled);
        }
        self.reset();
        tracing::debug!("scene sync cancelled");
    }

    fn reset(&mut self) {
        self.active = false;
        self.camera = None;
        self.controller = None;
        self.calibrated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::behaviour::ForeignController;
    use crate::controller::camera_controller::{FreeFlyConfig, FreeFlyController};
    use crate::controller::reflect::{Introspect, Value};
    use crate::model::{Camera, SceneNode, Transform};
    use crate::utils::from_euler_degrees;
    use approx::assert_abs_diff_eq;
    use glam::{Quat, Vec3};

    struct Fixture {
        scene: Scene,
        behaviours: Behaviours,
        camera: NodeHandle,
        free_fly: BehaviourId,
        brain: BehaviourId,
    }

    fn fixture() -> Fixture {
        let mut scene = Scene::new("sync");
        let camera = scene.spawn(SceneNode::new("ShotCam", Transform::default()).with_camera(Camera::new(16, 9)));
        let mut behaviours = Behaviours::new();
        let free_fly = behaviours.add(FreeFlyController::new(FreeFlyConfig::default()));
        let brain = behaviours.add(ForeignController::with_look_fields("brain", 0.0, 0.0));
        Fixture { scene, behaviours, camera, free_fly, brain }
    }

    fn viewport_pose() -> CameraPose {
        CameraPose::perspective(Vec3::new(4.0, 2.0, -6.0), from_euler_degrees(20.0, -35.0, 0.0), 45.0)
    }

    #[test]
    fn begin_without_viewport_changes_nothing() {
        let mut f = fixture();
        let before = f.scene.camera_pose(f.camera).unwrap();
        let mut mirror = ViewportMirror::new();

        let result = mirror.begin(&mut f.scene, &mut f.behaviours, &SceneViewport::closed(), f.camera, Some(f.free_fly), &[f.brain]);

        assert_eq!(result, Err(SyncError::NoViewport));
        assert_eq!(mirror.state(), SyncState::Stopped);
        assert_eq!(f.scene.camera_pose(f.camera).unwrap(), before);
        assert!(f.behaviours.is_enabled(f.free_fly));
        assert!(f.behaviours.is_enabled(f.brain));
    }

    #[test]
    fn begin_pauses_and_copies_pose_at_once() {
        let mut f = fixture();
        let viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();

        mirror.begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[f.brain]).unwrap();

        assert!(!f.behaviours.is_enabled(f.free_fly), "free-fly must not keep writing");
        assert!(!f.behaviours.is_enabled(f.brain));
        assert!(f.scene.camera_pose(f.camera).unwrap().approx_eq(&viewport_pose(), 1e-5));
    }

    #[test]
    fn begin_clears_lock_on_and_momentum() {
        let mut f = fixture();
        let target = f.scene.spawn(SceneNode::new("Target", Transform::new(Vec3::Z * 5.0, Quat::IDENTITY)));
        {
            let ff = f.behaviours.downcast_mut::<FreeFlyController>(f.free_fly).unwrap();
            ff.set_lock_target(Some(target));
            ff.toggle_lock_look(&f.scene, f.camera);
            ff.set_field("vel", Value::Vec3(Vec3::new(3.0, 0.0, 1.0))).unwrap();
        }
        let mut mirror = ViewportMirror::new();
        mirror
            .begin(&mut f.scene, &mut f.behaviours, &SceneViewport::new(viewport_pose()), f.camera, Some(f.free_fly), &[])
            .unwrap();

        let ff = f.behaviours.downcast::<FreeFlyController>(f.free_fly).unwrap();
        assert!(!ff.lock_look_at());
        assert_eq!(ff.velocity(), Vec3::ZERO);
    }

    #[test]
    fn first_tick_calibrates_yaw_pitch_once() {
        let mut f = fixture();
        let mut viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();
        mirror.begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[]).unwrap();

        assert_eq!(mirror.tick(&mut f.scene, &mut f.behaviours, &viewport), SyncState::Active);
        let (yaw, pitch, _) = f.behaviours.downcast::<FreeFlyController>(f.free_fly).unwrap().look();
        assert_abs_diff_eq!(yaw, -35.0, epsilon = 1e-3);
        assert_abs_diff_eq!(pitch, 20.0, epsilon = 1e-3);

        let moved = CameraPose::orthographic(Vec3::ONE, from_euler_degrees(0.0, 90.0, 0.0), 7.0);
        viewport.set_pose(Some(moved));
        mirror.tick(&mut f.scene, &mut f.behaviours, &viewport);
        assert!(f.scene.camera_pose(f.camera).unwrap().approx_eq(&moved, 1e-5), "every tick copies verbatim");
        let (yaw, _, _) = f.behaviours.downcast::<FreeFlyController>(f.free_fly).unwrap().look();
        assert_abs_diff_eq!(yaw, -35.0, epsilon = 1e-3);
    }

    #[test]
    fn missing_viewport_skips_the_tick() {
        let mut f = fixture();
        let mut viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();
        mirror.begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[]).unwrap();

        viewport.set_pose(None);
        assert_eq!(mirror.tick(&mut f.scene, &mut f.behaviours, &viewport), SyncState::Active);
        assert!(f.scene.camera_pose(f.camera).unwrap().approx_eq(&viewport_pose(), 1e-5));
    }

    #[test]
    fn end_restores_paused_behaviours_in_edit_mode() {
        let mut f = fixture();
        let viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();
        mirror.begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[f.brain]).unwrap();

        let captured = mirror.end(&f.scene, &mut f.behaviours, &viewport, RunMode::Edit);

        assert!(captured.unwrap().approx_eq(&viewport_pose(), 1e-5));
        assert!(f.behaviours.is_enabled(f.free_fly));
        assert!(f.behaviours.is_enabled(f.brain));
        assert_eq!(mirror.state(), SyncState::Stopped);
        assert_eq!(mirror.end(&f.scene, &mut f.behaviours, &viewport, RunMode::Edit), None);
    }

    #[test]
    fn play_mode_end_keeps_free_fly_paused_and_captures_camera() {
        let mut f = fixture();
        let mut viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();
        mirror.begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[f.brain]).unwrap();

        // viewport moved after the last copy: play mode still holds what the camera shows
        viewport.set_pose(Some(CameraPose::perspective(Vec3::splat(9.0), Quat::IDENTITY, 30.0)));
        let captured = mirror.end(&f.scene, &mut f.behaviours, &viewport, RunMode::Play);

        assert!(captured.unwrap().approx_eq(&viewport_pose(), 1e-5));
        assert!(!f.behaviours.is_enabled(f.free_fly));
        assert!(f.behaviours.is_enabled(f.brain));
    }

    #[test]
    fn behaviours_disabled_before_begin_stay_disabled() {
        let mut f = fixture();
        f.behaviours.set_enabled(f.brain, false);
        let viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();
        mirror.begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[f.brain]).unwrap();
        mirror.end(&f.scene, &mut f.behaviours, &viewport, RunMode::Edit);
        assert!(!f.behaviours.is_enabled(f.brain));
        assert!(f.behaviours.is_enabled(f.free_fly));
    }

    #[test]
    fn controller_listed_twice_is_restored_once() {
        let mut f = fixture();
        let viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();
        mirror
            .begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[f.free_fly, f.brain, f.brain])
            .unwrap();
        assert_eq!(mirror.paused().len(), 2);

        mirror.end(&f.scene, &mut f.behaviours, &viewport, RunMode::Edit);
        assert!(f.behaviours.is_enabled(f.free_fly));
        assert!(f.behaviours.is_enabled(f.brain));
    }

    #[test]
    fn play_mode_end_without_camera_restores_free_fly() {
        let mut f = fixture();
        let viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();
        mirror.begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[f.brain]).unwrap();

        f.scene.despawn(f.camera);
        let captured = mirror.end(&f.scene, &mut f.behaviours, &viewport, RunMode::Play);

        assert!(captured.is_none());
        assert!(f.behaviours.is_enabled(f.free_fly));
        assert!(f.behaviours.is_enabled(f.brain));
    }

    #[test]
    fn lost_camera_stops_session_and_restores() {
        let mut f = fixture();
        let viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();
        mirror.begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[f.brain]).unwrap();

        f.scene.despawn(f.camera);
        assert_eq!(mirror.tick(&mut f.scene, &mut f.behaviours, &viewport), SyncState::Stopped);
        assert!(f.behaviours.is_enabled(f.free_fly));
        assert!(f.behaviours.is_enabled(f.brain));
    }

    #[test]
    fn removed_behaviour_does_not_break_restore() {
        let mut f = fixture();
        let viewport = SceneViewport::new(viewport_pose());
        let mut mirror = ViewportMirror::new();
        mirror.begin(&mut f.scene, &mut f.behaviours, &viewport, f.camera, Some(f.free_fly), &[f.brain]).unwrap();
        f.behaviours.remove(f.brain);
        mirror.cancel(&mut f.behaviours);
        assert!(f.behaviours.is_enabled(f.free_fly));
    }
}
