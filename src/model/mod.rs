// MODEL: camera, scene and settings data
pub mod camera;
pub mod scene;
pub mod settings;

pub use camera::{Camera, CameraPose, Transform};
pub use scene::{NodeHandle, Scene, SceneNode};
pub use settings::{AspectPreset, FisheyeSettings, MemoryStore, PersistenceStore, SafeFrameSettings, ShotSettings, StoredValue};
