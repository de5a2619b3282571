//! One open shot-camera panel: the scene, its behaviours and the hand-off machinery.

use super::behaviour::{BehaviourId, Behaviours, CameraBehaviour, FrameContext};
use super::calibration::reconcile;
use super::camera_controller::{FreeFlyConfig, FreeFlyController};
use super::input::{InputSource, KeyBindings};
use super::pose_override::PoseOverride;
use super::scene_sync::{RunMode, SyncError, SyncState, ViewportMirror, ViewportSource};
use super::schedule::TickQueue;
use crate::model::{CameraPose, NodeHandle, Scene};

#[derive(Debug, Clone, PartialEq)]
pub struct RigConfig {
    /// Ticks the final viewport pose is held after scene sync ends.
    pub hold_ticks: u32,
    /// Extra ticks [`ShotRig::ensure_scene_sync`] waits for a viewport.
    pub ensure_sync_retries: u32,
    pub run_mode: RunMode,
    pub free_fly: FreeFlyConfig,
    pub bindings: KeyBindings,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            hold_ticks: 40,
            ensure_sync_retries: 3,
            run_mode: RunMode::Edit,
            free_fly: FreeFlyConfig::default(),
            bindings: KeyBindings::default(),
        }
    }
}

/// Things the host may want to react to, drained from [`ShotRig::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigEvent {
    CaptureRequested,
    SceneSyncStarted,
    SceneSyncStopped,
    /// Scene sync was requested but no viewport showed up.
    SceneSyncUnavailable,
    OverrideReleased,
}

/// Host hooks behind the rig hotkeys.
pub trait ShotService {
    fn capture(&mut self, _scene: &Scene, _camera: NodeHandle) {}
    fn scene_sync_toggled(&mut self, _on: bool) {}
}

/// Does nothing; hosts that only poll [`RigEvent`]s use this.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullService;

impl ShotService for NullService {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredTask {
    EnableSceneSync,
    EnsureSceneSync { attempts_left: u32 },
}

pub struct ShotRig {
    pub config: RigConfig,
    pub scene: Scene,
    pub behaviours: Behaviours,
    camera: NodeHandle,
    free_fly: BehaviourId,
    aux: Vec<BehaviourId>,
    mirror: ViewportMirror,
    hold: PoseOverride,
    queue: TickQueue<DeferredTask>,
    viewport: Box<dyn ViewportSource>,
    service: Box<dyn ShotService>,
    events: Vec<RigEvent>,
    closed: bool,
}

impl ShotRig {
    /// Open a rig on `camera`, attaching a free-fly controller that starts from its current pose.
    pub fn open(
        config: RigConfig,
        scene: Scene,
        camera: NodeHandle,
        viewport: Box<dyn ViewportSource>,
    ) -> Result<Self, SyncError> {
        let transform = match scene.transform(camera) {
            Some(t) if scene.is_camera_live(camera) => *t,
            _ => return Err(SyncError::MissingCamera),
        };
        let mut free_fly = FreeFlyController::new(config.free_fly.clone());
        free_fly.bindings = config.bindings.clone();
        free_fly.start(&transform);

        let mut behaviours = Behaviours::new();
        let free_fly = behaviours.add(free_fly);
        tracing::info!(scene = %scene.name, mode = ?config.run_mode, "shot rig opened");

        Ok(Self {
            config,
            scene,
            behaviours,
            camera,
            free_fly,
            aux: Vec::new(),
            mirror: ViewportMirror::new(),
            hold: PoseOverride::new(),
            queue: TickQueue::new(),
            viewport,
            service: Box::new(NullService),
            events: Vec::new(),
            closed: false,
        })
    }

    pub fn with_service(mut self, service: impl ShotService + 'static) -> Self {
        self.service = Box::new(service);
        self
    }

    pub fn set_viewport(&mut self, viewport: Box<dyn ViewportSource>) {
        self.viewport = viewport;
    }

    /// Register a behaviour that also writes the camera (a third-party brain, say).
    /// It is paused whenever the mirror or a hold owns the camera.
    pub fn add_aux<B: CameraBehaviour>(&mut self, behaviour: B) -> BehaviourId {
        let id = self.behaviours.add(behaviour);
        self.aux.push(id);
        id
    }

    pub fn camera(&self) -> NodeHandle {
        self.camera
    }

    pub fn camera_pose(&self) -> Option<CameraPose> {
        self.scene.camera_pose(self.camera)
    }

    pub fn free_fly_id(&self) -> BehaviourId {
        self.free_fly
    }

    pub fn free_fly(&self) -> Option<&FreeFlyController> {
        self.behaviours.downcast(self.free_fly)
    }

    pub fn free_fly_mut(&mut self) -> Option<&mut FreeFlyController> {
        self.behaviours.downcast_mut(self.free_fly)
    }

    pub fn is_scene_sync_on(&self) -> bool {
        self.mirror.is_active()
    }

    pub fn is_holding(&self) -> bool {
        self.hold.is_armed()
    }

    /// Turn viewport mirroring on or off.
    ///
    /// Turning it off hands the last pose to a hold so the free-fly controller resumes from it.
    pub fn set_scene_sync(&mut self, on: bool) -> Result<(), SyncError> {
        if on == self.mirror.is_active() {
            return Ok(());
        }
        if on {
            self.hold.cancel(&mut self.behaviours);
            let result = self.mirror.begin(
                &mut self.scene,
                &mut self.behaviours,
                self.viewport.as_ref(),
                self.camera,
                Some(self.free_fly),
                &self.aux,
            );
            match result {
                Ok(()) => self.events.push(RigEvent::SceneSyncStarted),
                Err(SyncError::NoViewport) => self.events.push(RigEvent::SceneSyncUnavailable),
                Err(_) => {}
            }
            return result;
        }

        let captured = self.mirror.end(&self.scene, &mut self.behaviours, self.viewport.as_ref(), self.config.run_mode);
        if let Some(pose) = captured {
            self.persist_pose(pose);
        }
        self.events.push(RigEvent::SceneSyncStopped);
        Ok(())
    }

    /// Hold `pose` on the camera and line the free-fly controller up with it.
    pub fn persist_pose(&mut self, pose: CameraPose) {
        if let Some(ff) = self.behaviours.get_mut(self.free_fly) {
            reconcile(ff, pose.rotation);
        }
        let paused: Vec<BehaviourId> = std::iter::once(self.free_fly).chain(self.aux.iter().copied()).collect();
        self.hold.setup(&mut self.behaviours, self.camera, pose, self.config.hold_ticks, Some(self.free_fly), &paused);
    }

    /// Make sure mirroring is running fresh: wait for a viewport, then restart it on the next tick.
    pub fn ensure_scene_sync(&mut self) {
        self.ensure(self.config.ensure_sync_retries);
    }

    fn ensure(&mut self, attempts_left: u32) {
        if self.viewport.current_pose().is_none() {
            if attempts_left > 0 {
                tracing::debug!(attempts_left, "waiting for a viewport");
                self.queue.schedule_after(1, DeferredTask::EnsureSceneSync { attempts_left: attempts_left - 1 });
            } else {
                tracing::warn!("no viewport, scene sync not started");
                self.events.push(RigEvent::SceneSyncUnavailable);
            }
            return;
        }
        self.mirror.cancel(&mut self.behaviours);
        self.queue.schedule_after(1, DeferredTask::EnableSceneSync);
    }

    fn run_deferred(&mut self) {
        for task in self.queue.drain_due() {
            match task {
                DeferredTask::EnableSceneSync => {
                    if let Err(e) = self.set_scene_sync(true) {
                        tracing::warn!(error = %e, "deferred scene sync failed");
                    }
                }
                DeferredTask::EnsureSceneSync { attempts_left } => self.ensure(attempts_left),
            }
        }
    }

    fn handle_hotkeys(&mut self, input: &dyn InputSource) {
        if input.key_down(&self.config.bindings.capture) {
            self.events.push(RigEvent::CaptureRequested);
            self.service.capture(&self.scene, self.camera);
        }
        if input.key_down(&self.config.bindings.toggle_scene_sync) {
            let on = !self.mirror.is_active();
            match self.set_scene_sync(on) {
                Ok(()) => self.service.scene_sync_toggled(on),
                Err(e) => tracing::warn!(error = %e, "scene sync toggle failed"),
            }
        }
    }

    /// Advance one frame and return what happened.
    pub fn update(&mut self, dt: f32, input: &dyn InputSource) -> Vec<RigEvent> {
        if self.closed {
            return Vec::new();
        }
        self.run_deferred();
        self.handle_hotkeys(input);

        for id in self.behaviours.ids() {
            if let Some(b) = self.behaviours.get_mut(id).filter(|b| b.enabled()) {
                let mut ctx = FrameContext { dt, input, scene: &mut self.scene, camera: self.camera };
                b.update(&mut ctx);
            }
        }

        let was_syncing = self.mirror.is_active();
        if self.mirror.tick(&mut self.scene, &mut self.behaviours, self.viewport.as_ref()) == SyncState::Stopped
            && was_syncing
        {
            self.events.push(RigEvent::SceneSyncStopped);
        }

        let was_holding = self.hold.is_armed();
        self.hold.update(&mut self.scene, &mut self.behaviours);

        for id in self.behaviours.ids() {
            if let Some(b) = self.behaviours.get_mut(id).filter(|b| b.enabled()) {
                let mut ctx = FrameContext { dt, input, scene: &mut self.scene, camera: self.camera };
                b.late_update(&mut ctx);
            }
        }

        self.hold.pre_render(&mut self.scene, &mut self.behaviours);
        if was_holding && !self.hold.is_armed() {
            self.events.push(RigEvent::OverrideReleased);
        }

        std::mem::take(&mut self.events)
    }

    /// Tear the session down, giving every paused behaviour its flag back.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.queue.clear();
        self.mirror.cancel(&mut self.behaviours);
        self.hold.cancel(&mut self.behaviours);
        self.closed = true;
        tracing::info!("shot rig closed");
    }
}

impl Drop for ShotRig {
    fn drop(&mut self) {
        self.close();
    }
}
