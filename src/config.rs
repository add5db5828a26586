//! Tool configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [crop]
//! initial_x = 10.0          # Selection a crop session starts from,
//! initial_y = 10.0          # in percent of the source image
//! initial_width = 80.0
//!
//! [platforms]               # Target aspect ratios as [width, height]
//! instagram = [1, 1]
//! instagram_story = [9, 16]
//! facebook = [191, 100]
//! linkedin = [191, 100]
//! twitter = [16, 9]
//! pinterest = [2, 3]
//! tiktok = [9, 16]
//!
//! [overlay]                 # Style a new overlay starts from
//! font_family = "Inter, DejaVu Sans, sans-serif"
//! font_weight = "bold"
//! color = "#ffffff"
//! font_size = 32            # px at a 500px-wide image (10-100)
//! position_y = 50           # baseline, percent of image height
//!
//! [fonts]
//! system = true             # Search installed fonts after the faces below
//!
//! [[fonts.faces]]           # Extra faces, path relative to the config file
//! family = "Inter"
//! weight = 700
//! path = "fonts/Inter-Bold.ttf"
//!
//! [render]
//! max_dimension = 16384     # Longest surface edge the renderer allocates
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Platforms merge with the stock list: adding `story = [9, 16]` keeps the
//! built-in platforms. Unknown keys are rejected to catch typos early.

use crate::crop::CropSelection;
use crate::imaging::{FontBook, FontWeight, RenderError, TargetRatio};
use crate::overlay::OverlayStyle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrandConfig {
    /// Initial crop selection.
    pub crop: CropConfig,
    /// Named target ratios as `[width, height]`.
    pub platforms: BTreeMap<String, [u32; 2]>,
    /// Default overlay style.
    pub overlay: OverlayDefaults,
    /// Font faces and system lookup.
    pub fonts: FontsConfig,
    /// Surface limits.
    pub render: RenderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            crop: CropConfig::default(),
            platforms: default_platforms(),
            overlay: OverlayDefaults::default(),
            fonts: FontsConfig::default(),
            render: RenderConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

fn default_platforms() -> BTreeMap<String, [u32; 2]> {
    [
        ("instagram", [1, 1]),
        ("instagram_story", [9, 16]),
        ("facebook", [191, 100]),
        ("linkedin", [191, 100]),
        ("twitter", [16, 9]),
        ("pinterest", [2, 3]),
        ("tiktok", [9, 16]),
    ]
    .into_iter()
    .map(|(name, ratio)| (name.to_string(), ratio))
    .collect()
}

impl BrandConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.crop
            .selection()
            .validate()
            .map_err(|e| ConfigError::Validation(format!("crop: {e}")))?;

        for (name, [w, h]) in &self.platforms {
            if *w == 0 || *h == 0 {
                return Err(ConfigError::Validation(format!(
                    "platforms.{name} values must be non-zero"
                )));
            }
        }

        self.overlay
            .style("")
            .resolve()
            .map_err(|e| ConfigError::Validation(format!("overlay: {e}")))?;

        for face in &self.fonts.faces {
            if !(100..=900).contains(&face.weight) {
                return Err(ConfigError::Validation(format!(
                    "fonts.faces weight for {:?} must be 100-900",
                    face.family
                )));
            }
            if face.family.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "fonts.faces family must not be empty".into(),
                ));
            }
        }

        if self.render.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "render.max_dimension must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Target ratio of a configured platform (case-insensitive name).
    pub fn platform_ratio(&self, name: &str) -> Option<TargetRatio> {
        self.platforms
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, [w, h])| TargetRatio::from_aspect(*w, *h).ok())
    }
}

/// Initial crop selection, percent of the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    pub initial_x: f64,
    pub initial_y: f64,
    pub initial_width: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        let CropSelection { x, y, width } = CropSelection::INITIAL;
        Self {
            initial_x: x,
            initial_y: y,
            initial_width: width,
        }
    }
}

impl CropConfig {
    pub fn selection(&self) -> CropSelection {
        CropSelection {
            x: self.initial_x,
            y: self.initial_y,
            width: self.initial_width,
        }
    }
}

/// Overlay style defaults; the text itself always comes from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayDefaults {
    pub font_family: String,
    pub font_weight: String,
    pub color: String,
    pub font_size: u32,
    pub position_y: u32,
}

impl Default for OverlayDefaults {
    fn default() -> Self {
        let OverlayStyle {
            font_family,
            font_weight,
            color,
            font_size,
            position_y,
            ..
        } = OverlayStyle::default();
        Self {
            font_family,
            font_weight,
            color,
            font_size,
            position_y,
        }
    }
}

impl OverlayDefaults {
    /// A full style carrying `text` and these defaults.
    pub fn style(&self, text: &str) -> OverlayStyle {
        OverlayStyle {
            text: text.to_string(),
            font_family: self.font_family.clone(),
            font_weight: self.font_weight.clone(),
            color: self.color.clone(),
            font_size: self.font_size,
            position_y: self.position_y,
        }
    }
}

/// Font sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    /// Search installed fonts after the listed faces.
    pub system: bool,
    /// Explicit faces, tried before system fonts.
    pub faces: Vec<FaceConfig>,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            system: true,
            faces: Vec::new(),
        }
    }
}

/// One font file bound to a family name and weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaceConfig {
    pub family: String,
    #[serde(default = "default_face_weight")]
    pub weight: u16,
    /// Relative paths resolve against the directory holding `config.toml`.
    pub path: PathBuf,
}

fn default_face_weight() -> u16 {
    FontWeight::NORMAL.value()
}

impl FontsConfig {
    /// Load every listed face into a [`FontBook`].
    pub fn build(&self, base_dir: &Path) -> Result<FontBook, RenderError> {
        if self.system && !cfg!(feature = "system-fonts") {
            tracing::warn!(
                "fonts.system is set but this build lacks the system-fonts feature; \
                 only [[fonts.faces]] will resolve"
            );
        }
        let mut book = FontBook::new().with_system_fonts(self.system);
        for face in &self.faces {
            let path = if face.path.is_absolute() {
                face.path.clone()
            } else {
                base_dir.join(&face.path)
            };
            book.add_face_file(&face.family, FontWeight(face.weight), &path)?;
        }
        Ok(book)
    }
}

/// Surface limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Longest surface edge, in pixels, the renderer will allocate.
    pub max_dimension: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_dimension: crate::imaging::cpu_backend::DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel crop workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(BrandConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<BrandConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(dir)? {
        Some(user) => merge_toml(base, user),
        None => base,
    };
    let config: BrandConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# brandkit configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Cropping
# ---------------------------------------------------------------------------
[crop]
# Selection a crop starts from, in percent of the source image.
# initial_x + initial_width must not exceed 100.
initial_x = 10.0
initial_y = 10.0
initial_width = 80.0

# ---------------------------------------------------------------------------
# Platforms
# ---------------------------------------------------------------------------
# Target aspect ratio per platform as [width, height]. Entries here are added
# to (or override) the built-in list.
[platforms]
facebook = [191, 100]
instagram = [1, 1]
instagram_story = [9, 16]
linkedin = [191, 100]
pinterest = [2, 3]
tiktok = [9, 16]
twitter = [16, 9]

# ---------------------------------------------------------------------------
# Text overlay defaults
# ---------------------------------------------------------------------------
[overlay]
# Family list, first installed family wins.
font_family = "Inter, DejaVu Sans, sans-serif"
# normal, bold, or 100-900.
font_weight = "bold"
# #rgb, #rrggbb or #rrggbbaa.
color = "#ffffff"
# Pixel size on a 500px-wide image; scaled with the real width (10-100).
font_size = 32
# Text baseline, in percent of the image height (0-100).
position_y = 50

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
# Search installed system fonts after the faces below. On by default; a
# build without the system-fonts feature only uses the faces listed here.
system = true

# Register font files under a family name. Relative paths resolve against
# the directory holding this file.
# [[fonts.faces]]
# family = "Inter"
# weight = 700
# path = "fonts/Inter-Bold.ttf"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Longest edge, in pixels, of any surface the renderer will allocate.
max_dimension = 16384

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for crop-all.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
