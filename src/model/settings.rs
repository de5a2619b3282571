//! Panel settings and their persistence.
//!
//! Settings are plain data with tuned defaults. Persistence goes through the
//! [`PersistenceStore`] collaborator so the host decides where values live.

use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_FILE_NAME_TEMPLATE: &str = "{scene}_{yyyyMMdd_HHmmss}";

/// Output resolution presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectPreset {
    Uhd4k,
    #[default]
    Fhd,
    Qhd,
    Hd,
    Square,
    Custom,
}

impl AspectPreset {
    pub const ALL: [AspectPreset; 6] = [
        AspectPreset::Uhd4k,
        AspectPreset::Fhd,
        AspectPreset::Qhd,
        AspectPreset::Hd,
        AspectPreset::Square,
        AspectPreset::Custom,
    ];

    /// Landscape size of the preset; `Custom` resolves to the supplied size.
    pub fn size(self, custom: (u32, u32)) -> (u32, u32) {
        match self {
            AspectPreset::Uhd4k => (3840, 2160),
            AspectPreset::Qhd => (2560, 1440),
            AspectPreset::Fhd => (1920, 1080),
            AspectPreset::Hd => (1280, 720),
            AspectPreset::Square => (1024, 1024),
            AspectPreset::Custom => custom,
        }
    }

    fn index(self) -> i64 {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(1) as i64
    }

    fn from_index(i: i64) -> Self {
        usize::try_from(i).ok().and_then(|i| Self::ALL.get(i).copied()).unwrap_or_default()
    }
}

/// Composition-guide overlay options.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeFrameSettings {
    pub show: bool,
    pub thirds: bool,
    pub diagonals: bool,
    pub center_cross: bool,
    /// Title-safe scale of the inner frame; >= 0.999 hides it.
    pub title_safe: f32,
    pub line_width: f32,
    pub line_color: [f32; 4],
    pub mask_alpha: f32,
}

impl Default for SafeFrameSettings {
    fn default() -> Self {
        Self {
            show: false,
            thirds: true,
            diagonals: false,
            center_cross: true,
            title_safe: 0.90,
            line_width: 2.0,
            line_color: [1.0, 1.0, 1.0, 0.9],
            mask_alpha: 0.35,
        }
    }
}

/// Fisheye post-effect parameters handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FisheyeSettings {
    pub enabled: bool,
    strength: f32,
}

impl Default for FisheyeSettings {
    fn default() -> Self {
        Self { enabled: false, strength: 0.3 }
    }
}

impl FisheyeSettings {
    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength.clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShotSettings {
    pub preset: AspectPreset,
    pub portrait: bool,
    pub custom_size: (u32, u32),
    pub png: bool,
    pub jpg_quality: u8,
    pub png_keep_alpha: bool,
    pub out_dir: PathBuf,
    pub last_saved_path: Option<PathBuf>,
    pub file_name_template: String,
    pub msaa: u32,
    pub safe_frame: SafeFrameSettings,
    pub fisheye: FisheyeSettings,
}

impl Default for ShotSettings {
    fn default() -> Self {
        Self {
            preset: AspectPreset::Fhd,
            portrait: false,
            custom_size: (1920, 1080),
            png: true,
            jpg_quality: 95,
            png_keep_alpha: true,
            out_dir: crate::view::output::default_output_dir(),
            last_saved_path: None,
            file_name_template: DEFAULT_FILE_NAME_TEMPLATE.to_string(),
            msaa: 1,
            safe_frame: SafeFrameSettings::default(),
            fisheye: FisheyeSettings::default(),
        }
    }
}

/// A value the host's preference store can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Text(String),
}

/// Key-value preference storage provided by the host.
pub trait PersistenceStore {
    fn get(&self, key: &str) -> Option<StoredValue>;
    fn set(&mut self, key: &str, value: StoredValue);
}

/// In-process store, used when the host has nothing better.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, StoredValue>,
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: StoredValue) {
        self.values.insert(key.to_string(), value);
    }
}

mod keys {
    pub const OUT_DIR: &str = "shotcam.out_dir";
    pub const PNG: &str = "shotcam.png";
    pub const JPG_QUALITY: &str = "shotcam.jpg_quality";
    pub const PNG_ALPHA: &str = "shotcam.png_alpha";
    pub const LAST_PATH: &str = "shotcam.last_path";
    pub const NAME_TEMPLATE: &str = "shotcam.name_template";
    pub const MSAA: &str = "shotcam.msaa";
    pub const PRESET: &str = "shotcam.preset";
    pub const PORTRAIT: &str = "shotcam.portrait";
    pub const CUSTOM_W: &str = "shotcam.custom_w";
    pub const CUSTOM_H: &str = "shotcam.custom_h";
    pub const SF_SHOW: &str = "shotcam.sf.show";
    pub const SF_THIRDS: &str = "shotcam.sf.thirds";
    pub const SF_DIAGONALS: &str = "shotcam.sf.diag";
    pub const SF_CENTER: &str = "shotcam.sf.center";
    pub const SF_TITLE_SAFE: &str = "shotcam.sf.title_safe";
    pub const SF_LINE_WIDTH: &str = "shotcam.sf.line_width";
    pub const SF_COLOR: [&str; 4] = ["shotcam.sf.color.r", "shotcam.sf.color.g", "shotcam.sf.color.b", "shotcam.sf.color.a"];
    pub const SF_MASK: &str = "shotcam.sf.mask";
    pub const FISHEYE_ON: &str = "shotcam.fisheye.enabled";
    pub const FISHEYE_STRENGTH: &str = "shotcam.fisheye.strength";
}

fn get_bool(store: &dyn PersistenceStore, key: &str, default: bool) -> bool {
    match store.get(key) {
        Some(StoredValue::Bool(b)) => b,
        _ => default,
    }
}

fn get_int(store: &dyn PersistenceStore, key: &str, default: i64) -> i64 {
    match store.get(key) {
        Some(StoredValue::Int(i)) => i,
        _ => default,
    }
}

fn get_float(store: &dyn PersistenceStore, key: &str, default: f32) -> f32 {
    match store.get(key) {
        Some(StoredValue::Float(f)) => f,
        _ => default,
    }
}

fn get_text(store: &dyn PersistenceStore, key: &str) -> Option<String> {
    match store.get(key) {
        Some(StoredValue::Text(s)) => Some(s),
        _ => None,
    }
}

impl ShotSettings {
    /// Read settings, falling back to defaults for missing or mistyped keys.
    pub fn load(store: &dyn PersistenceStore) -> Self {
        let d = Self::default();
        let sf = &d.safe_frame;
        let mut line_color = sf.line_color;
        for (c, key) in line_color.iter_mut().zip(keys::SF_COLOR) {
            *c = get_float(store, key, *c);
        }
        let mut fisheye = FisheyeSettings {
            enabled: get_bool(store, keys::FISHEYE_ON, d.fisheye.enabled),
            ..FisheyeSettings::default()
        };
        fisheye.set_strength(get_float(store, keys::FISHEYE_STRENGTH, d.fisheye.strength()));

        Self {
            preset: AspectPreset::from_index(get_int(store, keys::PRESET, d.preset.index())),
            portrait: get_bool(store, keys::PORTRAIT, d.portrait),
            custom_size: (
                get_int(store, keys::CUSTOM_W, d.custom_size.0 as i64).clamp(1, u32::MAX as i64) as u32,
                get_int(store, keys::CUSTOM_H, d.custom_size.1 as i64).clamp(1, u32::MAX as i64) as u32,
            ),
            png: get_bool(store, keys::PNG, d.png),
            jpg_quality: get_int(store, keys::JPG_QUALITY, d.jpg_quality as i64).clamp(1, 100) as u8,
            png_keep_alpha: get_bool(store, keys::PNG_ALPHA, d.png_keep_alpha),
            out_dir: get_text(store, keys::OUT_DIR).map(PathBuf::from).unwrap_or(d.out_dir.clone()),
            last_saved_path: get_text(store, keys::LAST_PATH).map(PathBuf::from),
            file_name_template: get_text(store, keys::NAME_TEMPLATE).unwrap_or(d.file_name_template.clone()),
            msaa: get_int(store, keys::MSAA, d.msaa as i64).clamp(1, 8) as u32,
            safe_frame: SafeFrameSettings {
                show: get_bool(store, keys::SF_SHOW, sf.show),
                thirds: get_bool(store, keys::SF_THIRDS, sf.thirds),
                diagonals: get_bool(store, keys::SF_DIAGONALS, sf.diagonals),
                center_cross: get_bool(store, keys::SF_CENTER, sf.center_cross),
                title_safe: get_float(store, keys::SF_TITLE_SAFE, sf.title_safe),
                line_width: get_float(store, keys::SF_LINE_WIDTH, sf.line_width),
                line_color,
                mask_alpha: get_float(store, keys::SF_MASK, sf.mask_alpha),
            },
            fisheye,
        }
    }

    pub fn save(&self, store: &mut dyn PersistenceStore) {
        store.set(keys::OUT_DIR, StoredValue::Text(self.out_dir.to_string_lossy().into_owned()));
        store.set(keys::PNG, StoredValue::Bool(self.png));
        store.set(keys::JPG_QUALITY, StoredValue::Int(self.jpg_quality as i64));
        store.set(keys::PNG_ALPHA, StoredValue::Bool(self.png_keep_alpha));
        store.set(keys::NAME_TEMPLATE, StoredValue::Text(self.file_name_template.clone()));
        store.set(keys::MSAA, StoredValue::Int(self.msaa as i64));
        store.set(keys::PRESET, StoredValue::Int(self.preset.index()));
        store.set(keys::PORTRAIT, StoredValue::Bool(self.portrait));
        store.set(keys::CUSTOM_W, StoredValue::Int(self.custom_size.0 as i64));
        store.set(keys::CUSTOM_H, StoredValue::Int(self.custom_size.1 as i64));
        if let Some(path) = &self.last_saved_path {
            store.set(keys::LAST_PATH, StoredValue::Text(path.to_string_lossy().into_owned()));
        }

        let sf = &self.safe_frame;
        store.set(keys::SF_SHOW, StoredValue::Bool(sf.show));
        store.set(keys::SF_THIRDS, StoredValue::Bool(sf.thirds));
        store.set(keys::SF_DIAGONALS, StoredValue::Bool(sf.diagonals));
        store.set(keys::SF_CENTER, StoredValue::Bool(sf.center_cross));
        store.set(keys::SF_TITLE_SAFE, StoredValue::Float(sf.title_safe));
        store.set(keys::SF_LINE_WIDTH, StoredValue::Float(sf.line_width));
        for (c, key) in sf.line_color.iter().zip(keys::SF_COLOR) {
            store.set(key, StoredValue::Float(*c));
        }
        store.set(keys::SF_MASK, StoredValue::Float(sf.mask_alpha));
        store.set(keys::FISHEYE_ON, StoredValue::Bool(self.fisheye.enabled));
        store.set(keys::FISHEYE_STRENGTH, StoredValue::Float(self.fisheye.strength()));
    }

    /// Panel "reset" button. Keeps the output directory; turns the safe frame on with a heavier mask.
    pub fn reset_to_default(&mut self) {
        let out_dir = std::mem::take(&mut self.out_dir);
        *self = Self { out_dir, ..Self::default() };
        self.safe_frame.show = true;
        self.safe_frame.mask_alpha = 0.8;
    }

    /// Output size after preset lookup and portrait swap.
    pub fn output_size(&self) -> (u32, u32) {
        let (w, h) = self.preset.size(self.custom_size);
        if self.portrait { (h, w) } else { (w, h) }
    }
}
