//! CPU preview renderer: sky gradient over a checkered ground plane.
//!
//! Stands in for the host's offscreen renderer in headless runs and tests.

use glam::{Vec2, Vec3, Vec4};

use super::output::{OutputError, PixelBuffer, RenderRequest, RenderSink, Rgba8};
use crate::model::{Camera, Transform};

const SKY_ZENITH: Vec3 = Vec3::new(0.25, 0.45, 0.85);
const SKY_HORIZON: Vec3 = Vec3::new(0.75, 0.85, 0.95);
const GROUND_A: Vec3 = Vec3::new(0.35, 0.35, 0.35);
const GROUND_B: Vec3 = Vec3::new(0.55, 0.55, 0.55);

#[derive(Debug, Clone)]
pub struct PreviewSink {
    pub max_texture_size: u32,
    /// Side of one ground checker tile in world units.
    pub tile: f32,
}

impl Default for PreviewSink {
    fn default() -> Self {
        Self { max_texture_size: 8192, tile: 1.0 }
    }
}

/// Barrel-distort an NDC coordinate.
fn fisheye(ndc: Vec2, strength: f32) -> Vec2 {
    ndc * (1.0 + strength * ndc.length_squared())
}

impl PreviewSink {
    fn shade(&self, origin: Vec3, dir: Vec3, transparent: bool) -> Vec4 {
        if dir.y < -1e-4 && origin.y > 0.0 {
            let t = -origin.y / dir.y;
            let hit = origin + dir * t;
            let cell = (hit.x / self.tile).floor() as i64 + (hit.z / self.tile).floor() as i64;
            let c = if cell.rem_euclid(2) == 0 { GROUND_A } else { GROUND_B };
            return c.extend(1.0);
        }
        let alpha = if transparent { 0.0 } else { 1.0 };
        SKY_HORIZON.lerp(SKY_ZENITH, dir.y.clamp(0.0, 1.0)).extend(alpha)
    }
}

impl RenderSink for PreviewSink {
    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn render(&mut self, camera: &Camera, transform: &Transform, request: &RenderRequest) -> Result<PixelBuffer, OutputError> {
        let inv = camera.view_proj(transform).inverse();
        if !inv.is_finite() {
            return Err(OutputError::Render("camera matrix is not invertible".to_string()));
        }
        let samples = request.msaa.max(1);
        let strength = if request.fisheye.enabled { request.fisheye.strength() } else { 0.0 };
        let (w, h) = (request.width as f32, request.height as f32);

        let mut buffer = PixelBuffer::new(request.width, request.height);
        for y in 0..request.height {
            for x in 0..request.width {
                let mut acc = Vec4::ZERO;
                for s in 0..samples {
                    // rotated-grid subpixel offsets
                    let ox = (s as f32 + 0.5) / samples as f32;
                    let oy = ((s as f32 * 0.618_034) + 0.5).fract();
                    let ndc = Vec2::new((x as f32 + ox) / w * 2.0 - 1.0, 1.0 - (y as f32 + oy) / h * 2.0);
                    let ndc = fisheye(ndc, strength);
                    let near = inv.project_point3(ndc.extend(0.0));
                    let far = inv.project_point3(ndc.extend(1.0));
                    acc += self.shade(near, (far - near).normalize_or_zero(), request.transparent_background);
                }
                let c = (acc / samples as f32).clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
                buffer.put(x, y, Rgba8::new(c.x as u8, c.y as u8, c.z as u8, c.w as u8));
            }
        }
        Ok(buffer)
    }
}
