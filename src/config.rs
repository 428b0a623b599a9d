//! Application configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user `config.toml` in the configuration directory only
//! needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! dir = "output"                 # Where processed images are written
//! quality = 95                   # JPEG quality (1-100)
//!
//! [processing]
//! # max_processes = 4            # Max parallel workers (omit for auto = CPU cores)
//! fail_fast = false              # Stop the batch at the first failed image
//! recursive = false              # Descend into sub-directories of the input
//! chain = ["watermark_left_logo"]
//! processor_store = "config/processors"
//!
//! [watermark]
//! logo_position = "left"
//! logo_enabled = true
//! background_color = "#ffffff"
//! line_color = "#a9a9a9"
//! font_padding_level = 2         # 0-5, larger = taller strip
//! white_margin_width = 3         # Margin/border thickness, % of short edge
//! use_equivalent_focal_length = true
//!
//! [watermark.left_top]
//! element = "model"
//! color = "#212121"
//! bold = true
//!
//! [watermark.left_bottom]
//! element = "make"
//! color = "#424242"
//!
//! [watermark.right_top]
//! element = "param"
//! color = "#212121"
//! bold = true
//!
//! [watermark.right_bottom]
//! element = "datetime"
//! color = "#424242"
//!
//! [fonts]
//! # regular = "fonts/Regular.ttf"
//! # bold = "fonts/Bold.ttf"
//! size = 240
//! bold_size = 250
//!
//! [logos]
//! dir = "logos"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::parse_color;
use crate::metadata::AttributeKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
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

/// Application configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Output directory and encoding quality.
    pub output: OutputConfig,
    /// Parallelism, failure policy and the default processor chain.
    pub processing: ProcessingConfig,
    /// Watermark strip layout and palette.
    pub watermark: WatermarkConfig,
    /// Fonts used for the watermark text.
    pub fonts: FontsConfig,
    /// Camera-brand logo directory.
    pub logos: LogosConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.watermark.white_margin_width > 50 {
            return Err(ConfigError::Validation(
                "watermark.white_margin_width must be 0-50".into(),
            ));
        }
        if self.watermark.font_padding_level > 5 {
            return Err(ConfigError::Validation(
                "watermark.font_padding_level must be 0-5".into(),
            ));
        }
        if self.fonts.size == 0 || self.fonts.bold_size == 0 {
            return Err(ConfigError::Validation(
                "fonts.size and fonts.bold_size must be non-zero".into(),
            ));
        }

        let colors = [
            ("watermark.background_color", &self.watermark.background_color),
            ("watermark.line_color", &self.watermark.line_color),
            ("watermark.left_top.color", &self.watermark.left_top.color),
            ("watermark.left_bottom.color", &self.watermark.left_bottom.color),
            ("watermark.right_top.color", &self.watermark.right_top.color),
            ("watermark.right_bottom.color", &self.watermark.right_bottom.color),
        ];
        for (key, value) in colors {
            parse_color(value).map_err(|e| ConfigError::Validation(format!("{key}: {e}")))?;
        }
        Ok(())
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory processed images are written to. Created when missing.
    pub dir: String,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            quality: 95,
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Skip the remaining images after the first failure.
    pub fail_fast: bool,
    /// Walk sub-directories of the input directory.
    pub recursive: bool,
    /// Processor ids applied to every image, in order.
    pub chain: Vec<String>,
    /// Directory holding one JSON file per stored processor config.
    pub processor_store: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_processes: None,
            fail_fast: false,
            recursive: false,
            chain: vec!["watermark_left_logo".to_string()],
            processor_store: "config/processors".to_string(),
        }
    }
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

/// Which end of the watermark strip the logo sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoPosition {
    #[default]
    Left,
    Right,
}

/// Text style of one corner of the watermark strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CornerStyle {
    /// Attribute displayed in this corner.
    pub element: AttributeKey,
    pub color: String,
    pub bold: bool,
    /// Text shown when `element = "custom"`.
    pub text: String,
}

impl CornerStyle {
    pub fn new(element: AttributeKey, color: &str, bold: bool) -> Self {
        Self {
            element,
            color: color.to_string(),
            bold,
            text: String::new(),
        }
    }
}

impl Default for CornerStyle {
    fn default() -> Self {
        Self::new(AttributeKey::None, "#212121", false)
    }
}

/// Watermark strip settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    pub logo_position: LogoPosition,
    pub logo_enabled: bool,
    pub background_color: String,
    /// Separator line drawn between logo and text.
    pub line_color: String,
    /// 0-5. Each level makes the strip taller and its text padding tighter.
    pub font_padding_level: u32,
    /// Margin and border thickness as a percentage of the short image edge.
    pub white_margin_width: u32,
    /// Prefer the 35mm-equivalent focal length in the `param` attribute.
    pub use_equivalent_focal_length: bool,
    pub left_top: CornerStyle,
    pub left_bottom: CornerStyle,
    pub right_top: CornerStyle,
    pub right_bottom: CornerStyle,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            logo_position: LogoPosition::Left,
            logo_enabled: true,
            background_color: "#ffffff".to_string(),
            line_color: "#a9a9a9".to_string(),
            font_padding_level: 2,
            white_margin_width: 3,
            use_equivalent_focal_length: true,
            left_top: CornerStyle::new(AttributeKey::Model, "#212121", true),
            left_bottom: CornerStyle::new(AttributeKey::Make, "#424242", false),
            right_top: CornerStyle::new(AttributeKey::Param, "#212121", true),
            right_bottom: CornerStyle::new(AttributeKey::DateTime, "#424242", false),
        }
    }
}

/// Font settings. Sizes are in pixels at the strip's working height of 1000.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    /// TrueType/OpenType file for regular text. Common system fonts are
    /// tried when absent.
    pub regular: Option<String>,
    /// Font file for bold text. Falls back to the regular font.
    pub bold: Option<String>,
    pub size: u32,
    pub bold_size: u32,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            regular: None,
            bold: None,
            size: 240,
            bold_size: 250,
        }
    }
}

/// Logo settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogosConfig {
    /// Directory of `<brand>.png` files, matched against the camera make.
    pub dir: String,
}

impl Default for LogosConfig {
    fn default() -> Self {
        Self {
            dir: "logos".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# exif-frame Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory processed images are written to (created when missing).
dir = "output"

# JPEG encoding quality (1 = worst, 100 = best).
quality = 95

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# Stop the whole batch at the first image that fails.
fail_fast = false

# Also process images in sub-directories of the input directory.
recursive = false

# Processor ids applied to every image, in order. Built-in ids are listed by
# `exif-frame builtins`; stored configs by `exif-frame processors list`.
chain = ["watermark_left_logo"]

# Directory of stored processor configs (one JSON file per config).
processor_store = "config/processors"

# ---------------------------------------------------------------------------
# Watermark strip
# ---------------------------------------------------------------------------
[watermark]
# "left" or "right".
logo_position = "left"
logo_enabled = true

background_color = "#ffffff"

# Separator between the logo and the text block.
line_color = "#a9a9a9"

# 0-5. Higher levels make the strip taller and the text larger.
font_padding_level = 2

# Thickness of margins and borders, in percent of the shorter image edge.
white_margin_width = 3

# Show the 35mm-equivalent focal length when the file records one.
use_equivalent_focal_length = true

# Corner text. `element` is one of: model, make, lens, param, datetime, date,
# filename, geo_info, total_pixel, "make+model", "lens make+model",
# "model+lens", "date+filename", "datetime+filename", custom, none.
# With element = "custom" the corner shows `text`.
[watermark.left_top]
element = "model"
color = "#212121"
bold = true
text = ""

[watermark.left_bottom]
element = "make"
color = "#424242"
bold = false
text = ""

[watermark.right_top]
element = "param"
color = "#212121"
bold = true
text = ""

[watermark.right_bottom]
element = "datetime"
color = "#424242"
bold = false
text = ""

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
# TrueType/OpenType files. Common system fonts are tried when omitted.
# regular = "fonts/AlibabaPuHuiTi-2-45-Light.otf"
# bold = "fonts/AlibabaPuHuiTi-2-85-Bold.otf"

# Pixel sizes at the strip's internal working height of 1000.
size = 240
bold_size = 250

# ---------------------------------------------------------------------------
# Logos
# ---------------------------------------------------------------------------
[logos]
# Directory of <brand>.png files. A logo is used when its file name appears
# in the camera make, e.g. logos/canon.png for "Canon".
dir = "logos"
"##
}
