use std::any::Any;

use super::input::InputSource;
use super::reflect::{Introspect, PropertyBag, PropertyInfo, ReflectError, Shape, Value};
use crate::model::{NodeHandle, Scene};
use crate::utils::{from_euler_degrees, Handle, Slots};

/// What a behaviour sees during one tick.
pub struct FrameContext<'a> {
    pub dt: f32,
    pub input: &'a dyn InputSource,
    pub scene: &'a mut Scene,
    /// Node the behaviour drives.
    pub camera: NodeHandle,
}

/// A per-tick writer of the rig camera that can be paused and resumed.
pub trait CameraBehaviour: Introspect + Any {
    fn name(&self) -> &str;
    fn enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);

    fn update(&mut self, ctx: &mut FrameContext<'_>);

    /// Runs after every behaviour's `update` for the same tick.
    fn late_update(&mut self, _ctx: &mut FrameContext<'_>) {}

    /// Turn auto-aim off, if the behaviour has one.
    fn clear_lock_on(&mut self) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub type BehaviourId = Handle<Box<dyn CameraBehaviour>>;

/// Registry of behaviours. Removal invalidates the id, so every caller re-resolves.
#[derive(Default)]
pub struct Behaviours {
    slots: Slots<Box<dyn CameraBehaviour>>,
}

impl Behaviours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<B: CameraBehaviour>(&mut self, behaviour: B) -> BehaviourId {
        tracing::debug!(name = behaviour.name(), "add behaviour");
        self.slots.insert(Box::new(behaviour))
    }

    pub fn remove(&mut self, id: BehaviourId) -> Option<Box<dyn CameraBehaviour>> {
        self.slots.remove(id)
    }

    pub fn get(&self, id: BehaviourId) -> Option<&dyn CameraBehaviour> {
        self.slots.get(id).map(|b| b.as_ref())
    }

    pub fn get_mut(&mut self, id: BehaviourId) -> Option<&mut dyn CameraBehaviour> {
        match self.slots.get_mut(id) {
            Some(b) => Some(b.as_mut()),
            None => None,
        }
    }

    pub fn downcast<B: CameraBehaviour>(&self, id: BehaviourId) -> Option<&B> {
        self.get(id)?.as_any().downcast_ref::<B>()
    }

    pub fn downcast_mut<B: CameraBehaviour>(&mut self, id: BehaviourId) -> Option<&mut B> {
        self.get_mut(id)?.as_any_mut().downcast_mut::<B>()
    }

    pub fn is_enabled(&self, id: BehaviourId) -> bool {
        self.get(id).is_some_and(|b| b.enabled())
    }

    /// No-op for a stale id.
    pub fn set_enabled(&mut self, id: BehaviourId, enabled: bool) {
        if let Some(b) = self.get_mut(id) {
            b.set_enabled(enabled);
        }
    }

    pub fn ids(&self) -> Vec<BehaviourId> {
        self.slots.handles()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A camera rig the host does not control, driven by whatever fields it happens to carry.
///
/// Every enabled tick it writes `Euler(pitch, yaw, 0)` from its `yaw`/`pitch` fields onto
/// the camera, in `update` or, when `writes_late` is set, in `late_update`.
pub struct ForeignController {
    name: String,
    enabled: bool,
    pub writes_late: bool,
    pub state: PropertyBag,
}

impl ForeignController {
    pub fn new(name: impl Into<String>, state: PropertyBag) -> Self {
        Self { name: name.into(), enabled: true, writes_late: false, state }
    }

    /// Bag with `yaw`/`pitch` fields, a velocity vector and a `SetYawPitch` method.
    pub fn with_look_fields(name: impl Into<String>, yaw: f32, pitch: f32) -> Self {
        let state = PropertyBag::new()
            .with_field("yaw", Value::Float(yaw))
            .with_field("pitch", Value::Float(pitch))
            .with_field("velocity", Value::Vec3(glam::Vec3::ZERO))
            .with_method("SetYawPitch", &[Shape::Float, Shape::Float]);
        Self::new(name, state)
    }

    fn float(&self, name: &str) -> Option<f32> {
        self.state.field(name).and_then(|v| v.as_float())
    }

    fn replay_calls(&mut self) {
        for (name, args) in self.state.take_calls() {
            if name == "SetYawPitch" {
                if let [Value::Float(yaw), Value::Float(pitch)] = args.as_slice() {
                    for (field, value) in [("yaw", *yaw), ("pitch", *pitch)] {
                        if let Err(e) = self.state.set_field(field, Value::Float(value)) {
                            tracing::trace!(controller = %self.name, field, error = %e, "SetYawPitch replay dropped");
                        }
                    }
                }
            }
        }
    }

    fn write_camera(&mut self, ctx: &mut FrameContext<'_>) {
        self.replay_calls();
        let (Some(yaw), Some(pitch)) = (self.float("yaw"), self.float("pitch")) else {
            return;
        };
        if let Some(node) = ctx.scene.node_mut(ctx.camera) {
            node.transform.rotation = from_euler_degrees(pitch, yaw, 0.0);
        }
    }
}

impl Introspect for ForeignController {
    fn field_names(&self) -> Vec<String> {
        self.state.field_names()
    }

    fn field_shape(&self, name: &str) -> Option<Shape> {
        self.state.field_shape(name)
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        self.state.set_field(name, value)
    }

    fn property(&self, name: &str) -> Option<PropertyInfo> {
        self.state.property(name)
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        self.state.set_property(name, value)
    }

    fn method(&self, name: &str) -> Option<Vec<Shape>> {
        self.state.method(name)
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<(), ReflectError> {
        self.state.invoke(name, args)?;
        self.replay_calls();
        Ok(())
    }
}

impl CameraBehaviour for ForeignController {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) {
        if !self.writes_late {
            self.write_camera(ctx);
        }
    }

    fn late_update(&mut self, ctx: &mut FrameContext<'_>) {
        if self.writes_late {
            self.write_camera(ctx);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
