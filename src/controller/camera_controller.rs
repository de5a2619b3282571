use glam::{Quat, Vec3};
use std::any::Any;

use super::behaviour::{CameraBehaviour, FrameContext};
use super::input::{InputSource, KeyBindings, MouseButton};
use super::reflect::{expect_shape, Introspect, PropertyInfo, ReflectError, Shape, Value};
use crate::model::{NodeHandle, Scene, Transform};
use crate::utils::{euler_degrees, exp_smoothing, from_euler_degrees, lerp_angle, look_angles, normalize_angle};

/// Tuning for [`FreeFlyController`]. Angles in degrees, speeds in units/s.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeFlyConfig {
    pub move_speed: f32,
    pub sprint_speed: f32,
    pub slow_speed: f32,
    pub acceleration: f32,
    pub idle_damping: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub scroll_speed_step: f32,

    pub hold_right_mouse_to_look: bool,
    pub look_sensitivity: f32,
    pub look_smoothing: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,

    pub roll_speed: f32,
    pub roll_smoothing: f32,

    pub zero_roll_when_locked: bool,
    pub follow_target: bool,
    pub follow_offset: Vec3,
    pub follow_pos_smoothing: f32,

    /// Mouse deltas dropped after entering look mode (cursor warp).
    pub ignore_mouse_frames_on_enter: u32,
}

impl Default for FreeFlyConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            sprint_speed: 12.0,
            slow_speed: 2.0,
            acceleration: 12.0,
            idle_damping: 20.0,
            min_speed: 0.1,
            max_speed: 50.0,
            scroll_speed_step: 1.0,
            hold_right_mouse_to_look: true,
            look_sensitivity: 2.0,
            look_smoothing: 12.0,
            pitch_min: -89.0,
            pitch_max: 89.0,
            roll_speed: 90.0,
            roll_smoothing: 12.0,
            zero_roll_when_locked: true,
            follow_target: false,
            follow_offset: Vec3::new(0.0, 1.6, -3.0),
            follow_pos_smoothing: 6.0,
            ignore_mouse_frames_on_enter: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookState {
    Idle,
    Looking,
    LockedOnTarget,
}

/// Cursor state the host should apply after the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    Free,
    Locked,
}

/// Free-flying camera: smoothed mouse look, roll, WASD/EQ movement and optional lock-on.
pub struct FreeFlyController {
    pub config: FreeFlyConfig,
    pub bindings: KeyBindings,
    pub lock_target: Option<NodeHandle>,
    enabled: bool,
    started: bool,
    lock_look_at: bool,
    looking: bool,
    ignore_frames: u32,
    vel: Vec3,
    yaw: f32,
    pitch: f32,
    roll: f32,
    tyaw: f32,
    tpitch: f32,
    troll: f32,
    cur_speed: f32,
}

impl FreeFlyController {
    pub fn new(config: FreeFlyConfig) -> Self {
        let cur_speed = config.move_speed.clamp(config.min_speed, config.max_speed);
        Self {
            config,
            bindings: KeyBindings::default(),
            lock_target: None,
            enabled: true,
            started: false,
            lock_look_at: false,
            looking: false,
            ignore_frames: 0,
            vel: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            tyaw: 0.0,
            tpitch: 0.0,
            troll: 0.0,
            cur_speed,
        }
    }

    /// Adopt the transform's current orientation as both actual and target look.
    pub fn start(&mut self, transform: &Transform) {
        self.snap_to_rotation(transform.rotation);
        self.cur_speed = self.config.move_speed.clamp(self.config.min_speed, self.config.max_speed);
        self.set_looking(false);
        self.started = true;
    }

    pub fn snap_to_rotation(&mut self, rotation: Quat) {
        let (pitch, yaw, roll) = euler_degrees(rotation);
        self.yaw = yaw;
        self.tyaw = yaw;
        self.pitch = pitch;
        self.tpitch = pitch;
        self.roll = roll;
        self.troll = roll;
    }

    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.tyaw = yaw;
        self.pitch = pitch;
        self.tpitch = pitch;
    }

    /// Actual `(yaw, pitch, roll)`.
    pub fn look(&self) -> (f32, f32, f32) {
        (self.yaw, self.pitch, self.roll)
    }

    /// Smoothing targets `(yaw, pitch, roll)`.
    pub fn target_look(&self) -> (f32, f32, f32) {
        (self.tyaw, self.tpitch, self.troll)
    }

    pub fn velocity(&self) -> Vec3 {
        self.vel
    }

    pub fn current_speed(&self) -> f32 {
        self.cur_speed
    }

    pub fn reset_speed(&mut self) {
        self.cur_speed = self.config.move_speed.clamp(self.config.min_speed, self.config.max_speed);
    }

    pub fn lock_look_at(&self) -> bool {
        self.lock_look_at
    }

    /// Lock flag set and the target still exists.
    pub fn lock_active(&self, scene: &Scene) -> bool {
        self.lock_look_at && self.target_position(scene).is_some()
    }

    pub fn state(&self, scene: &Scene) -> LookState {
        if self.lock_active(scene) {
            LookState::LockedOnTarget
        } else if self.looking {
            LookState::Looking
        } else {
            LookState::Idle
        }
    }

    pub fn cursor_mode(&self) -> CursorMode {
        if self.enabled && self.looking { CursorMode::Locked } else { CursorMode::Free }
    }

    pub fn set_lock_target(&mut self, target: Option<NodeHandle>) {
        self.lock_target = target;
    }

    /// Flip lock-on. Turning it on aims the targets at once so smoothing starts from the right place.
    pub fn toggle_lock_look(&mut self, scene: &Scene, camera: NodeHandle) {
        let Some(target) = self.target_position(scene) else {
            self.lock_look_at = false;
            return;
        };
        self.lock_look_at = !self.lock_look_at;
        tracing::info!(locked = self.lock_look_at, "free-fly lock-on toggled");
        if self.lock_look_at {
            if let Some(from) = scene.transform(camera).map(|t| t.position) {
                self.aim_at(from, target);
            }
        }
    }

    fn target_position(&self, scene: &Scene) -> Option<Vec3> {
        self.lock_target.and_then(|t| scene.transform(t)).map(|t| t.position)
    }

    fn aim_at(&mut self, from: Vec3, target: Vec3) {
        if let Some((yaw, pitch)) = look_angles(from, target) {
            self.tyaw = yaw;
            self.tpitch = pitch;
            if self.config.zero_roll_when_locked {
                self.troll = 0.0;
            }
        }
    }

    fn set_looking(&mut self, enable: bool) {
        self.looking = enable;
        if enable {
            self.ignore_frames = self.config.ignore_mouse_frames_on_enter;
        }
    }

    fn update_look_mode(&mut self, input: &dyn InputSource) {
        if self.config.hold_right_mouse_to_look {
            if input.mouse_button_down(MouseButton::Right) {
                self.set_looking(true);
            }
            if input.mouse_button_up(MouseButton::Right) {
                self.set_looking(false);
            }
        } else if !self.looking {
            self.set_looking(true);
        }
    }

    fn axis(input: &dyn InputSource, positive: &str, negative: &str) -> f32 {
        let p = if input.key_held(positive) { 1.0 } else { 0.0 };
        let n = if input.key_held(negative) { 1.0 } else { 0.0 };
        p - n
    }
}

impl CameraBehaviour for FreeFlyController {
    fn name(&self) -> &str {
        "free-fly"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        let dt = ctx.dt;
        let input = ctx.input;
        let Some(transform) = ctx.scene.transform(ctx.camera).copied() else {
            return;
        };
        if !self.started {
            self.start(&transform);
        }

        self.update_look_mode(input);

        let lock_target = if self.lock_look_at { self.target_position(ctx.scene) } else { None };

        // Mouse look, ignored while auto-aiming
        if self.looking {
            if self.ignore_frames > 0 {
                self.ignore_frames -= 1;
            } else if lock_target.is_none() {
                let delta = input.mouse_delta();
                let sens = self.config.look_sensitivity;
                self.tyaw += delta.x * sens;
                self.tpitch = (self.tpitch - delta.y * sens).clamp(self.config.pitch_min, self.config.pitch_max);
            }
        }

        if let Some(target) = lock_target {
            self.aim_at(transform.position, target);
        }

        // Roll
        if input.key_held(&self.bindings.roll_left) {
            self.troll += self.config.roll_speed * dt;
        }
        if input.key_held(&self.bindings.roll_right) {
            self.troll -= self.config.roll_speed * dt;
        }
        if input.key_down(&self.bindings.roll_reset) {
            self.troll = 0.0;
        }
        self.troll = normalize_angle(self.troll);

        // Smooth rotation
        let k_look = exp_smoothing(self.config.look_smoothing, dt);
        let k_roll = exp_smoothing(self.config.roll_smoothing, dt);
        self.yaw = lerp_angle(self.yaw, self.tyaw, k_look);
        self.pitch = lerp_angle(self.pitch, self.tpitch, k_look);
        self.roll = lerp_angle(self.roll, self.troll, k_roll);
        let rotation = from_euler_degrees(self.pitch, self.yaw, 0.0) * Quat::from_axis_angle(Vec3::Z, self.roll.to_radians());

        // Move
        let b = &self.bindings;
        let wish_local = Vec3::new(
            Self::axis(input, &b.right, &b.left),
            Self::axis(input, &b.up, &b.down),
            Self::axis(input, &b.forward, &b.backward),
        )
        .clamp_length_max(1.0);
        let wish_world = rotation * wish_local;

        let mut base_speed = self.cur_speed;
        if input.key_held(&b.sprint) {
            base_speed = base_speed.max(self.config.sprint_speed);
        } else if input.key_held(&b.slow) {
            base_speed = base_speed.min(self.config.slow_speed);
        }

        let wheel = input.scroll_delta();
        if wheel.abs() > 1e-4 {
            self.cur_speed = (self.cur_speed + wheel * self.config.scroll_speed_step)
                .clamp(self.config.min_speed, self.config.max_speed);
        }

        let desired = wish_world * base_speed;
        self.vel = self.vel.lerp(desired, exp_smoothing(self.config.acceleration, dt));
        if wish_local.length_squared() < 1e-6 {
            self.vel = self.vel.lerp(Vec3::ZERO, exp_smoothing(self.config.idle_damping, dt));
        }

        let mut position = transform.position + self.vel * dt;

        // Follow
        if self.config.follow_target {
            if let Some(anchor) = self.lock_target.and_then(|t| ctx.scene.transform(t)) {
                let p = anchor.transform_point(self.config.follow_offset);
                position = position.lerp(p, exp_smoothing(self.config.follow_pos_smoothing, dt));
            }
        }

        if let Some(node) = ctx.scene.node_mut(ctx.camera) {
            node.transform.rotation = rotation;
            node.transform.position = position;
        }

        if input.key_down(&self.bindings.toggle_lock) {
            self.toggle_lock_look(ctx.scene, ctx.camera);
        }
    }

    fn clear_lock_on(&mut self) {
        if self.lock_look_at {
            tracing::debug!("free-fly lock-on cleared");
        }
        self.lock_look_at = false;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

const FLOAT_FIELDS: [&str; 7] = ["yaw", "pitch", "roll", "tyaw", "tpitch", "troll", "curSpeed"];

impl Introspect for FreeFlyController {
    fn field_names(&self) -> Vec<String> {
        FLOAT_FIELDS.iter().chain(["vel"].iter()).map(|s| s.to_string()).collect()
    }

    fn field_shape(&self, name: &str) -> Option<Shape> {
        if FLOAT_FIELDS.contains(&name) {
            Some(Shape::Float)
        } else if name == "vel" {
            Some(Shape::Vec3)
        } else {
            None
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        let shape = self.field_shape(name).ok_or_else(|| ReflectError::NotFound(name.to_string()))?;
        expect_shape(name, shape, &value)?;
        match (name, value) {
            ("vel", Value::Vec3(v)) => self.vel = v,
            ("yaw", Value::Float(f)) => self.yaw = f,
            ("pitch", Value::Float(f)) => self.pitch = f,
            ("roll", Value::Float(f)) => self.roll = f,
            ("tyaw", Value::Float(f)) => self.tyaw = f,
            ("tpitch", Value::Float(f)) => self.tpitch = f,
            ("troll", Value::Float(f)) => self.troll = normalize_angle(f),
            ("curSpeed", Value::Float(f)) => self.cur_speed = f.clamp(self.config.min_speed, self.config.max_speed),
            _ => return Err(ReflectError::NotFound(name.to_string())),
        }
        Ok(())
    }

    fn property(&self, name: &str) -> Option<PropertyInfo> {
        (name == "CurrentSpeed").then_some(PropertyInfo { shape: Shape::Float, writable: false })
    }

    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), ReflectError> {
        match name {
            "CurrentSpeed" => Err(ReflectError::ReadOnly(name.to_string())),
            _ => Err(ReflectError::NotFound(name.to_string())),
        }
    }

    fn method(&self, name: &str) -> Option<Vec<Shape>> {
        match name {
            "SetYawPitch" => Some(vec![Shape::Float, Shape::Float]),
            "SnapToRotation" => Some(vec![Shape::Quat]),
            _ => None,
        }
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<(), ReflectError> {
        match (name, args) {
            ("SetYawPitch", [Value::Float(yaw), Value::Float(pitch)]) => {
                self.set_yaw_pitch(*yaw, *pitch);
                Ok(())
            }
            ("SnapToRotation", [Value::Quat(q)]) => {
                self.snap_to_rotation(*q);
                Ok(())
            }
            _ if self.method(name).is_some() => Err(ReflectError::Rejected {
                name: name.to_string(),
                reason: "argument shapes do not match".to_string(),
            }),
            _ => Err(ReflectError::NotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::calibration::{reconcile, zero_velocity_like_fields};
    use crate::controller::input::{InputEvent, InputState};
    use crate::model::{Camera, SceneNode};
    use approx::assert_abs_diff_eq;

    fn setup() -> (Scene, NodeHandle, FreeFlyController) {
        let mut scene = Scene::new("test");
        let cam = scene.spawn(SceneNode::new("ShotCam", Transform::default()).with_camera(Camera::new(16, 9)));
        let mut ff = FreeFlyController::new(FreeFlyConfig::default());
        ff.start(&Transform::default());
        (scene, cam, ff)
    }

    fn tick(ff: &mut FreeFlyController, scene: &mut Scene, cam: NodeHandle, input: &mut InputState, dt: f32) {
        let mut ctx = FrameContext { dt, input: &*input, scene, camera: cam };
        ff.update(&mut ctx);
        input.end_frame();
    }

    #[test]
    fn look_smoothing_uses_exponential_approach() {
        let (mut scene, cam, mut ff) = setup();
        ff.config.ignore_mouse_frames_on_enter = 0;
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseButton { button: MouseButton::Right, is_down: true });
        // 50 counts * sensitivity 2 = 100 degrees of target yaw
        input.process_event(&InputEvent::MouseMove { dx: 50.0, dy: 0.0 });

        tick(&mut ff, &mut scene, cam, &mut input, 0.016);

        let (tyaw, _, _) = ff.target_look();
        assert_abs_diff_eq!(tyaw, 100.0, epsilon = 1e-4);
        let expected = 100.0 * (1.0 - (-12.0f32 * 0.016).exp());
        assert_abs_diff_eq!(ff.look().0, expected, epsilon = 1e-4);
    }

    #[test]
    fn mouse_is_ignored_right_after_entering_look() {
        let (mut scene, cam, mut ff) = setup();
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseButton { button: MouseButton::Right, is_down: true });
        input.process_event(&InputEvent::MouseMove { dx: 30.0, dy: 0.0 });
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        input.process_event(&InputEvent::MouseMove { dx: 30.0, dy: 0.0 });
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert_eq!(ff.target_look().0, 0.0, "first two look frames are dropped");

        input.process_event(&InputEvent::MouseMove { dx: 10.0, dy: 0.0 });
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert_abs_diff_eq!(ff.target_look().0, 20.0, epsilon = 1e-4);
        assert_eq!(ff.cursor_mode(), CursorMode::Locked);

        input.process_event(&InputEvent::MouseButton { button: MouseButton::Right, is_down: false });
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert_eq!(ff.state(&scene), LookState::Idle);
        assert_eq!(ff.cursor_mode(), CursorMode::Free);
    }

    #[test]
    fn pitch_target_is_clamped() {
        let (mut scene, cam, mut ff) = setup();
        ff.config.ignore_mouse_frames_on_enter = 0;
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseButton { button: MouseButton::Right, is_down: true });
        input.process_event(&InputEvent::MouseMove { dx: 0.0, dy: 1000.0 });
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert_eq!(ff.target_look().1, 89.0);
    }

    #[test]
    fn sprint_overrides_base_speed_instead_of_adding() {
        let (mut scene, cam, mut ff) = setup();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("w".into()));
        input.process_event(&InputEvent::KeyDown("Shift".into()));

        for _ in 0..60 {
            tick(&mut ff, &mut scene, cam, &mut input, 1.0 / 60.0);
        }

        let speed = ff.velocity().length();
        assert!((speed - 12.0).abs() < 0.01, "velocity should converge on sprint speed, got {speed}");
        assert!(scene.transform(cam).unwrap().position.z > 5.0, "camera should have flown forward");
    }

    #[test]
    fn slow_key_caps_speed() {
        let (mut scene, cam, mut ff) = setup();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("d".into()));
        input.process_event(&InputEvent::KeyDown("Control".into()));
        for _ in 0..120 {
            tick(&mut ff, &mut scene, cam, &mut input, 1.0 / 60.0);
        }
        assert!((ff.velocity().length() - 2.0).abs() < 0.01);
        assert!(ff.velocity().x > 0.0, "D strafes along +X");
    }

    #[test]
    fn idle_damping_stops_the_camera() {
        let (mut scene, cam, mut ff) = setup();
        ff.set_field("vel", Value::Vec3(Vec3::new(0.0, 0.0, 10.0))).unwrap();
        let mut input = InputState::new();
        for _ in 0..60 {
            tick(&mut ff, &mut scene, cam, &mut input, 1.0 / 60.0);
        }
        assert!(ff.velocity().length() < 1e-3);
    }

    #[test]
    fn scroll_adjusts_persistent_speed_within_bounds() {
        let (mut scene, cam, mut ff) = setup();
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseWheel { delta_y: 3.0 });
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert_eq!(ff.current_speed(), 8.0);

        input.process_event(&InputEvent::MouseWheel { delta_y: -100.0 });
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert_eq!(ff.current_speed(), 0.1);

        ff.reset_speed();
        assert_eq!(ff.current_speed(), 5.0);
    }

    #[test]
    fn roll_keys_and_reset() {
        let (mut scene, cam, mut ff) = setup();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("z".into()));
        tick(&mut ff, &mut scene, cam, &mut input, 0.5);
        assert_abs_diff_eq!(ff.target_look().2, 45.0, epsilon = 1e-4);

        input.process_event(&InputEvent::KeyUp("z".into()));
        input.process_event(&InputEvent::KeyDown("x".into()));
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert_eq!(ff.target_look().2, 0.0);
    }

    #[test]
    fn roll_twists_about_forward_axis() {
        let (mut scene, cam, mut ff) = setup();
        ff.config.roll_smoothing = 0.0;
        ff.config.look_smoothing = 0.0;
        ff.set_yaw_pitch(90.0, 0.0);
        ff.set_field("troll", Value::Float(30.0)).unwrap();
        let mut input = InputState::new();
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);

        let t = *scene.transform(cam).unwrap();
        assert!(t.forward().abs_diff_eq(Vec3::X, 1e-4), "roll must not move the forward axis");
        assert_abs_diff_eq!(t.up().dot(Vec3::Y), 30f32.to_radians().cos(), epsilon = 1e-4);
    }

    #[test]
    fn lock_toggle_snaps_targets_on_the_same_tick() {
        let (mut scene, cam, mut ff) = setup();
        let target = scene.spawn(SceneNode::new("Target", Transform::new(Vec3::new(10.0, 0.0, 10.0), Quat::IDENTITY)));
        ff.set_lock_target(Some(target));

        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("r".into()));
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);

        assert!(ff.lock_active(&scene));
        let (tyaw, tpitch, troll) = ff.target_look();
        assert_abs_diff_eq!(tyaw, 45.0, epsilon = 1e-3);
        assert_abs_diff_eq!(tpitch, 0.0, epsilon = 1e-3);
        assert_eq!(troll, 0.0);
        assert_eq!(ff.state(&scene), LookState::LockedOnTarget);
    }

    #[test]
    fn lock_on_keeps_aiming_and_ignores_mouse() {
        let (mut scene, cam, mut ff) = setup();
        ff.config.ignore_mouse_frames_on_enter = 0;
        let target = scene.spawn(SceneNode::new("Target", Transform::new(Vec3::new(0.0, 0.0, 10.0), Quat::IDENTITY)));
        ff.set_lock_target(Some(target));
        ff.toggle_lock_look(&scene, cam);

        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseButton { button: MouseButton::Right, is_down: true });
        input.process_event(&InputEvent::MouseMove { dx: 90.0, dy: 0.0 });
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert_abs_diff_eq!(ff.target_look().0, 0.0, epsilon = 1e-3);

        if let Some(node) = scene.node_mut(target) {
            node.transform.position = Vec3::new(-10.0, 0.0, 0.0);
        }
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert_abs_diff_eq!(ff.target_look().0, -90.0, epsilon = 1e-3);
    }

    #[test]
    fn lost_target_disables_aim_but_keeps_flag() {
        let (mut scene, cam, mut ff) = setup();
        let target = scene.spawn(SceneNode::new("Target", Transform::new(Vec3::new(0.0, 0.0, 10.0), Quat::IDENTITY)));
        ff.set_lock_target(Some(target));
        ff.toggle_lock_look(&scene, cam);
        scene.despawn(target);

        let mut input = InputState::new();
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        assert!(ff.lock_look_at(), "flag is cleared by the rig, not by the controller");
        assert!(!ff.lock_active(&scene));

        ff.toggle_lock_look(&scene, cam);
        assert!(!ff.lock_look_at(), "toggling without a target clears the flag");
    }

    #[test]
    fn follow_pulls_position_toward_offset() {
        let (mut scene, cam, mut ff) = setup();
        ff.config.follow_target = true;
        ff.config.follow_pos_smoothing = 0.0;
        let target = scene.spawn(SceneNode::new("Target", Transform::new(Vec3::new(5.0, 0.0, 5.0), Quat::IDENTITY)));
        ff.set_lock_target(Some(target));
        let mut input = InputState::new();
        tick(&mut ff, &mut scene, cam, &mut input, 0.016);
        let p = scene.transform(cam).unwrap().position;
        assert!(p.abs_diff_eq(Vec3::new(5.0, 1.6, 2.0), 1e-4), "got {p}");
    }

    #[test]
    fn reconcile_aligns_actual_and_target_look() {
        let (_, _, mut ff) = setup();
        ff.set_field("troll", Value::Float(25.0)).unwrap();
        reconcile(&mut ff, from_euler_degrees(-15.0, 150.0, 0.0));
        let (yaw, pitch, _) = ff.look();
        let (tyaw, tpitch, troll) = ff.target_look();
        assert_abs_diff_eq!(yaw, 150.0, epsilon = 1e-3);
        assert_abs_diff_eq!(pitch, -15.0, epsilon = 1e-3);
        assert_abs_diff_eq!(tyaw, 150.0, epsilon = 1e-3);
        assert_abs_diff_eq!(tpitch, -15.0, epsilon = 1e-3);
        assert_eq!(troll, 0.0);
    }

    #[test]
    fn zeroing_velocity_reaches_internal_state() {
        let (_, _, mut ff) = setup();
        ff.set_field("vel", Value::Vec3(Vec3::ONE)).unwrap();
        zero_velocity_like_fields(&mut ff);
        assert_eq!(ff.velocity(), Vec3::ZERO);
    }
}
