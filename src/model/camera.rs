use glam::{Mat4, Quat, Vec3};

const DEFAULT_FOV_DEGREES: f32 = 60.0;
const DEFAULT_ORTHO_SIZE: f32 = 5.0;
const NEAR_PLANE: f32 = 0.01;
const FAR_PLANE: f32 = 1000.0;

/// World placement of a scene node. Forward is +Z, up is +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Quat::IDENTITY }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation: rotation.normalize() }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Local direction to world space.
    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    /// Local point to world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

/// Snapshot of everything a viewport hands to the rig camera.
///
/// Only one of `field_of_view` / `ortho_size` is meaningful, picked by `is_orthographic`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub is_orthographic: bool,
    pub field_of_view: f32,
    pub ortho_size: f32,
}

impl CameraPose {
    pub fn perspective(position: Vec3, rotation: Quat, field_of_view: f32) -> Self {
        Self {
            position,
            rotation: rotation.normalize(),
            is_orthographic: false,
            field_of_view,
            ortho_size: DEFAULT_ORTHO_SIZE,
        }
    }

    pub fn orthographic(position: Vec3, rotation: Quat, ortho_size: f32) -> Self {
        Self {
            position,
            rotation: rotation.normalize(),
            is_orthographic: true,
            field_of_view: DEFAULT_FOV_DEGREES,
            ortho_size,
        }
    }

    /// Compare position, rotation and the active projection parameter.
    pub fn approx_eq(&self, other: &CameraPose, eps: f32) -> bool {
        let projection_matches = if self.is_orthographic {
            (self.ortho_size - other.ortho_size).abs() <= eps
        } else {
            (self.field_of_view - other.field_of_view).abs() <= eps
        };
        self.is_orthographic == other.is_orthographic
            && projection_matches
            && self.position.abs_diff_eq(other.position, eps)
            // q and -q are the same rotation
            && self.rotation.dot(other.rotation).abs() >= 1.0 - eps
    }
}

/// Camera component attached to a scene node.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub enabled: bool,
    pub orthographic: bool,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub ortho_size: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            enabled: true,
            orthographic: false,
            fov_y: DEFAULT_FOV_DEGREES,
            ortho_size: DEFAULT_ORTHO_SIZE,
            aspect: width as f32 / height.max(1) as f32,
            z_near: NEAR_PLANE,
            z_far: FAR_PLANE,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Read the camera's pose given the transform of the node it sits on.
    pub fn pose(&self, transform: &Transform) -> CameraPose {
        CameraPose {
            position: transform.position,
            rotation: transform.rotation,
            is_orthographic: self.orthographic,
            field_of_view: self.fov_y,
            ortho_size: self.ortho_size,
        }
    }

    /// Write a pose verbatim. Only the projection parameter matching the pose's mode is touched.
    pub fn apply_pose(&mut self, transform: &mut Transform, pose: &CameraPose) {
        transform.position = pose.position;
        transform.rotation = pose.rotation.normalize();
        self.orthographic = pose.is_orthographic;
        if pose.is_orthographic {
            self.ortho_size = pose.ortho_size;
        } else {
            self.fov_y = pose.field_of_view;
        }
    }

    pub fn view(&self, transform: &Transform) -> Mat4 {
        Mat4::look_to_lh(transform.position, transform.forward(), transform.up())
    }

    pub fn projection(&self) -> Mat4 {
        if self.orthographic {
            let h = self.ortho_size;
            let w = h * self.aspect;
            Mat4::orthographic_lh(-w, w, -h, h, self.z_near, self.z_far)
        } else {
            Mat4::perspective_lh(self.fov_y.to_radians(), self.aspect, self.z_near, self.z_far)
        }
    }

    pub fn view_proj(&self, transform: &Transform) -> Mat4 {
        self.projection() * self.view(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::from_euler_degrees;

    #[test]
    fn apply_pose_only_touches_active_projection() {
        let mut cam = Camera::new(1920, 1080);
        let mut t = Transform::default();
        cam.fov_y = 35.0;

        let pose = CameraPose::orthographic(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, 12.0);
        cam.apply_pose(&mut t, &pose);

        assert!(cam.orthographic);
        assert_eq!(cam.ortho_size, 12.0);
        assert_eq!(cam.fov_y, 35.0, "fov must survive an orthographic pose");
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn pose_round_trips_through_camera() {
        let mut cam = Camera::new(800, 600);
        let mut t = Transform::default();
        let pose = CameraPose::perspective(Vec3::new(-4.0, 1.5, 9.0), from_euler_degrees(10.0, 80.0, 0.0), 42.0);
        cam.apply_pose(&mut t, &pose);
        assert!(cam.pose(&t).approx_eq(&pose, 1e-5));
    }

    #[test]
    fn view_proj_is_finite_in_both_modes() {
        let mut cam = Camera::new(16, 9);
        let t = Transform::new(Vec3::new(0.0, 1.0, -5.0), from_euler_degrees(15.0, 30.0, 0.0));
        for ortho in [false, true] {
            cam.orthographic = ortho;
            let m = cam.view_proj(&t).to_cols_array();
            assert!(m.iter().all(|v| v.is_finite()), "view_proj contains non-finite values (ortho={ortho})");
        }
    }
}
