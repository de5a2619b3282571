// CONTROLLER: input, camera behaviours and the hand-off state machine
pub mod input;
pub mod reflect;
pub mod calibration;
pub mod behaviour;
pub mod camera_controller;
pub mod scene_sync;
pub mod pose_override;
pub mod schedule;
pub mod rig;

pub use input::{InputEvent, InputSource, InputState, KeyBindings, MouseButton};
pub use reflect::{Introspect, PropertyBag, PropertyInfo, ReflectError, Shape, Value};
pub use calibration::{reconcile, reconcile_yaw_pitch, zero_velocity_like_fields};
pub use behaviour::{BehaviourId, Behaviours, CameraBehaviour, ForeignController, FrameContext};
pub use camera_controller::{CursorMode, FreeFlyConfig, FreeFlyController, LookState};
pub use scene_sync::{RunMode, SceneViewport, SyncError, SyncState, ViewportMirror, ViewportSource};
pub use pose_override::PoseOverride;
pub use schedule::TickQueue;
pub use rig::{NullService, RigConfig, RigEvent, ShotRig, ShotService};
