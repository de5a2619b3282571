use crate::model::camera::{Camera, CameraPose, Transform};
use crate::utils::{Handle, Slots};

/// A named object in the scene. Cameras are nodes carrying a [`Camera`] component.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub active: bool,
    pub transform: Transform,
    pub camera: Option<Camera>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self { name: name.into(), active: true, transform, camera: None }
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }
}

pub type NodeHandle = Handle<SceneNode>;

/// Owns every node. Everything else holds [`NodeHandle`]s and re-resolves them on each use,
/// since the host may delete a node at any time.
#[derive(Default)]
pub struct Scene {
    pub name: String,
    nodes: Slots<SceneNode>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), nodes: Slots::new() }
    }

    pub fn spawn(&mut self, node: SceneNode) -> NodeHandle {
        tracing::debug!(name = %node.name, "spawn node");
        self.nodes.insert(node)
    }

    pub fn despawn(&mut self, handle: NodeHandle) -> Option<SceneNode> {
        let node = self.nodes.remove(handle);
        if let Some(n) = &node {
            tracing::debug!(name = %n.name, "despawn node");
        }
        node
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(handle)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle)
    }

    pub fn transform(&self, handle: NodeHandle) -> Option<&Transform> {
        self.node(handle).map(|n| &n.transform)
    }

    /// Camera component and transform of a live node, if it has a camera.
    pub fn camera_mut(&mut self, handle: NodeHandle) -> Option<(&mut Camera, &mut Transform)> {
        let node = self.nodes.get_mut(handle)?;
        let camera = node.camera.as_mut()?;
        Some((camera, &mut node.transform))
    }

    /// True when the node exists, is active, and carries an enabled camera.
    pub fn is_camera_live(&self, handle: NodeHandle) -> bool {
        self.node(handle)
            .map(|n| n.active && n.camera.as_ref().is_some_and(|c| c.enabled))
            .unwrap_or(false)
    }

    pub fn camera_pose(&self, handle: NodeHandle) -> Option<CameraPose> {
        let node = self.node(handle)?;
        node.camera.as_ref().map(|c| c.pose(&node.transform))
    }

    /// Write a pose onto a camera node. Returns false when the camera is gone.
    pub fn apply_camera_pose(&mut self, handle: NodeHandle, pose: &CameraPose) -> bool {
        match self.camera_mut(handle) {
            Some((camera, transform)) => {
                camera.apply_pose(transform, pose);
                true
            }
            None => false,
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes.iter().find(|(_, n)| n.name == name).map(|(h, _)| h)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
