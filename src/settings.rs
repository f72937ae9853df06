use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::components::crop::{DEFAULT_CROP_SIZE, DEFAULT_HANDLE_TOLERANCE, DEFAULT_MIN_CROP};
use crate::components::history::DEFAULT_MAX_UNDO_STEPS;
use crate::ops::brush::{DEFAULT_BRUSH_SIZE, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::ops::selection::DEFAULT_TOLERANCE;
use crate::viewport::{MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings path unavailable")]
    MissingSettingsPath,
}

pub type Result<T> = std::result::Result<T, SettingsError>;

pub const DEFAULT_GALLERY_CAPACITY: usize = 20;
pub const DEFAULT_HISTORY_MEMORY_MIB: usize = 512;

/// Editor preferences, stored as JSON. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub tolerance: f32,
    pub brush_size: u32,
    pub max_undo_steps: usize,
    pub history_memory_mib: usize,
    pub crop_min_size: f32,
    pub crop_handle_tolerance: f32,
    pub crop_default_size: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_step: f32,
    pub gallery_capacity: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            brush_size: DEFAULT_BRUSH_SIZE,
            max_undo_steps: DEFAULT_MAX_UNDO_STEPS,
            history_memory_mib: DEFAULT_HISTORY_MEMORY_MIB,
            crop_min_size: DEFAULT_MIN_CROP,
            crop_handle_tolerance: DEFAULT_HANDLE_TOLERANCE,
            crop_default_size: DEFAULT_CROP_SIZE,
            zoom_min: MIN_ZOOM,
            zoom_max: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
            gallery_capacity: DEFAULT_GALLERY_CAPACITY,
        }
    }
}

impl EditorSettings {
    /// Load from the platform config directory; defaults if no file exists.
    pub fn load() -> Result<Self> {
        let path = settings_file_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&settings_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: EditorSettings = serde_json::from_str(&content)?;
        Ok(settings.sanitized())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    /// Clamp every value into its usable range.
    pub fn sanitized(mut self) -> Self {
        let d = EditorSettings::default();
        let finite = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };

        self.tolerance = finite(self.tolerance, d.tolerance).clamp(0.0, 100.0);
        self.brush_size = self.brush_size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
        self.max_undo_steps = self.max_undo_steps.clamp(1, 1000);
        self.history_memory_mib = self.history_memory_mib.max(16);
        self.crop_min_size = finite(self.crop_min_size, d.crop_min_size).max(1.0);
        self.crop_handle_tolerance = finite(self.crop_handle_tolerance, d.crop_handle_tolerance).clamp(1.0, 100.0);
        self.crop_default_size = finite(self.crop_default_size, d.crop_default_size).max(self.crop_min_size);
        self.zoom_min = finite(self.zoom_min, d.zoom_min).clamp(0.01, 1.0);
        self.zoom_max = finite(self.zoom_max, d.zoom_max).clamp(1.0, 32.0);
        self.zoom_step = finite(self.zoom_step, d.zoom_step).clamp(0.01, 1.0);
        self.gallery_capacity = self.gallery_capacity.clamp(1, 500);
        self
    }

    pub fn history_memory_bytes(&self) -> usize {
        self.history_memory_mib.saturating_mul(1024 * 1024)
    }
}

/// `<config dir>/cutoutfe/settings.json`.
pub fn settings_file_path() -> Result<PathBuf> {
    let base = directories::BaseDirs::new().ok_or(SettingsError::MissingSettingsPath)?;
    let mut path = base.config_dir().to_path_buf();
    path.push("cutoutfe");
    path.push("settings.json");
    Ok(path)
}
