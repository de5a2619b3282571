//! Screenshot output: sizing, naming, encoding and writing.

use bytemuck::{Pod, Zeroable};
use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::controller::ShotService;
use crate::model::settings::DEFAULT_FILE_NAME_TEMPLATE;
use crate::model::{Camera, FisheyeSettings, NodeHandle, Scene, ShotSettings, Transform};
use crate::utils::timestamp;

const OUTPUT_FOLDER: &str = "ShotCam";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("capture camera is missing")]
    MissingCamera,
    #[error("{width}x{height} exceeds the maximum texture size {max}")]
    ExceedsMaxTextureSize { width: u32, height: u32, max: u32 },
    #[error("invalid output size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("render failed: {0}")]
    Render(String),
    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// `<Pictures>/ShotCam`, then `<Documents>/ShotCam`, then the working directory.
pub fn default_output_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::document_dir)
        .map(|dir| dir.join(OUTPUT_FOLDER))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png { keep_alpha: bool },
    Jpeg { quality: u8 },
}

impl OutputFormat {
    pub fn from_settings(settings: &ShotSettings) -> Self {
        if settings.png {
            OutputFormat::Png { keep_alpha: settings.png_keep_alpha }
        } else {
            OutputFormat::Jpeg { quality: settings.jpg_quality.clamp(1, 100) }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png { .. } => "png",
            OutputFormat::Jpeg { .. } => "jpg",
        }
    }

    pub fn transparent_background(self) -> bool {
        matches!(self, OutputFormat::Png { keep_alpha: true })
    }
}

/// Clamp to [1, 8], then snap to the nearest power of two (ties go up).
pub fn clamp_msaa(samples: u32) -> u32 {
    let v = samples.clamp(1, 8);
    if v.is_power_of_two() {
        return v;
    }
    let next = v.next_power_of_two();
    let prev = next / 2;
    if v - prev < next - v { prev } else { next }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Expand `{scene}`, `{camera}`, `{w}`, `{h}`, `{wxh}` and `{yyyyMMdd_HHmmss}`.
pub fn build_file_name(template: &str, scene: &str, camera: &str, size: (u32, u32), now: DateTime<Local>) -> String {
    let template = if template.trim().is_empty() { DEFAULT_FILE_NAME_TEMPLATE } else { template };
    let (w, h) = size;
    let name = template
        .replace("{scene}", scene)
        .replace("{camera}", camera)
        .replace("{wxh}", &format!("{w}x{h}"))
        .replace("{w}", &w.to_string())
        .replace("{h}", &h.to_string())
        .replace("{yyyyMMdd_HHmmss}", &timestamp(&now));
    sanitize_file_name(&name)
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Row-major RGBA8 image produced by a [`RenderSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixels: vec![Rgba8::default(); width as usize * height as usize] }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgba8> {
        (x < self.width && y < self.height).then(|| self.pixels[(y * self.width + x) as usize])
    }

    pub fn put(&mut self, x: u32, y: u32, color: Rgba8) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    fn to_image(&self) -> Result<RgbaImage, OutputError> {
        ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(self.width, self.height, self.as_bytes().to_vec())
            .ok_or_else(|| OutputError::Render("pixel buffer does not match its size".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub width: u32,
    pub height: u32,
    pub msaa: u32,
    pub transparent_background: bool,
    pub fisheye: FisheyeSettings,
}

/// Offscreen renderer provided by the host.
pub trait RenderSink {
    fn max_texture_size(&self) -> u32 {
        16384
    }

    fn render(&mut self, camera: &Camera, transform: &Transform, request: &RenderRequest) -> Result<PixelBuffer, OutputError>;
}

pub fn encode(buffer: &PixelBuffer, format: OutputFormat) -> Result<Vec<u8>, OutputError> {
    let image = buffer.to_image()?;
    let mut bytes = Vec::new();
    match format {
        OutputFormat::Png { keep_alpha: true } => {
            image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        }
        OutputFormat::Png { keep_alpha: false } => {
            let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
            rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        }
        OutputFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&rgb)?;
        }
    }
    Ok(bytes)
}

/// Render `camera` at the configured output size and write it under `settings.out_dir`.
pub fn capture(
    scene: &Scene,
    camera: NodeHandle,
    sink: &mut dyn RenderSink,
    settings: &ShotSettings,
    now: DateTime<Local>,
) -> Result<PathBuf, OutputError> {
    let node = scene.node(camera).ok_or(OutputError::MissingCamera)?;
    let mut cam = node.camera.clone().ok_or(OutputError::MissingCamera)?;

    let (width, height) = settings.output_size();
    if width == 0 || height == 0 {
        return Err(OutputError::InvalidSize { width, height });
    }
    let max = sink.max_texture_size();
    if width > max || height > max {
        return Err(OutputError::ExceedsMaxTextureSize { width, height, max });
    }
    cam.set_aspect(width, height);

    let format = OutputFormat::from_settings(settings);
    let request = RenderRequest {
        width,
        height,
        msaa: clamp_msaa(settings.msaa),
        transparent_background: format.transparent_background(),
        fisheye: settings.fisheye,
    };
    let buffer = sink.render(&cam, &node.transform, &request)?;
    if buffer.width != width || buffer.height != height {
        return Err(OutputError::Render(format!(
            "sink returned {}x{}, expected {width}x{height}",
            buffer.width, buffer.height
        )));
    }
    let bytes = encode(&buffer, format)?;

    let name = build_file_name(&settings.file_name_template, &scene.name, &node.name, (width, height), now);
    let path = write_unique(&settings.out_dir, &name, format.extension(), &bytes)?;
    tracing::info!(path = %path.display(), width, height, "screenshot saved");
    Ok(path)
}

fn write_unique(dir: &Path, name: &str, ext: &str, bytes: &[u8]) -> Result<PathBuf, OutputError> {
    std::fs::create_dir_all(dir)?;
    let mut path = dir.join(format!("{name}.{ext}"));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{name}_{n}.{ext}"));
        n += 1;
    }
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Writes a screenshot whenever the rig's capture hotkey fires.
pub struct ShotWriter<S: RenderSink> {
    pub sink: S,
    pub settings: ShotSettings,
}

impl<S: RenderSink> ShotWriter<S> {
    pub fn new(sink: S, settings: ShotSettings) -> Self {
        Self { sink, settings }
    }
}

impl<S: RenderSink> ShotService for ShotWriter<S> {
    fn capture(&mut self, scene: &Scene, camera: NodeHandle) {
        match capture(scene, camera, &mut self.sink, &self.settings, Local::now()) {
            Ok(path) => self.settings.last_saved_path = Some(path),
            Err(e) => tracing::error!(error = %e, "screenshot failed"),
        }
    }
}
