//! Serializable processor descriptions.
//!
//! A [`ProcessorConfig`] names one effect and its parameters; a
//! [`CompositeProcessorConfig`] names an ordered list of them. Both persist as
//! JSON objects:
//!
//! ```json
//! {
//!   "id": "border_20240501103000",
//!   "name": "Border 20240501103000",
//!   "category": "border",
//!   "params": { "border_size": 10, "border_color": "#ffffff", "sides": "tlrb" },
//!   "created_at": "2024-05-01T10:30:00.000000",
//!   "updated_at": "2024-05-01T10:30:00.000000"
//! }
//! ```
//!
//! The `category` tag is derived from the [`ProcessorParams`] variant, so a
//! config can never carry parameters of a different category than it claims.

use crate::config::LogoPosition;
use crate::imaging::Sides;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Format of `created_at` / `updated_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Format of the timestamp suffix in generated ids and names.
const ID_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Error, Debug)]
pub enum ProcessorConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown processor category: {0}")]
    UnknownCategory(String),
    #[error("Unknown transform type: {0}")]
    UnknownTransformKind(String),
    #[error("Unknown processor: {0}")]
    UnknownProcessor(String),
    #[error("Invalid processor config: {0}")]
    Invalid(String),
}

/// The four kinds of configurable processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Border,
    Blur,
    Transform,
    Watermark,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Border,
        Category::Blur,
        Category::Transform,
        Category::Watermark,
    ];

    /// Tag used in JSON and in generated ids.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Border => "border",
            Category::Blur => "blur",
            Category::Transform => "transform",
            Category::Watermark => "watermark",
        }
    }

    /// Human-readable label used in default names.
    pub fn label(self) -> &'static str {
        match self {
            Category::Border => "Border",
            Category::Blur => "Blur",
            Category::Transform => "Transform",
            Category::Watermark => "Watermark",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ProcessorConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProcessorConfigError::UnknownCategory(s.to_string()))
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Solid band around the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BorderParams {
    pub border_size: u32,
    pub border_color: String,
    pub sides: Sides,
}

impl Default for BorderParams {
    fn default() -> Self {
        Self {
            border_size: 10,
            border_color: "#ffffff".to_string(),
            sides: Sides::ALL,
        }
    }
}

/// Blurred, enlarged backdrop behind the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlurParams {
    pub blur_radius: u32,
    /// Backdrop growth, `(0, 1]`.
    pub padding_percent: f64,
    /// Blend toward white, `[0, 1]`.
    pub blend_alpha: f64,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            blur_radius: 35,
            padding_percent: 0.15,
            blend_alpha: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Pad to 1:1.
    #[default]
    Square,
    /// Pad to `target_ratio`.
    Ratio,
    /// Round the corners with `radius`.
    Rounded,
}

impl TransformKind {
    pub const ALL: [TransformKind; 3] = [
        TransformKind::Square,
        TransformKind::Ratio,
        TransformKind::Rounded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransformKind::Square => "square",
            TransformKind::Ratio => "ratio",
            TransformKind::Rounded => "rounded",
        }
    }
}

impl FromStr for TransformKind {
    type Err = ProcessorConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransformKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ProcessorConfigError::UnknownTransformKind(s.to_string()))
    }
}

/// Shape change; `target_ratio` applies to `ratio`, `radius` to `rounded`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformParams {
    pub transform_type: TransformKind,
    pub target_ratio: Option<f64>,
    pub radius: Option<u32>,
}

impl TransformParams {
    pub fn new(kind: TransformKind) -> Self {
        Self {
            transform_type: kind,
            ..Self::default()
        }
    }
}

/// Colour and weight of one strip corner.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerParams {
    pub color: String,
    pub bold: bool,
}

impl CornerParams {
    fn new(color: &str, bold: bool) -> Self {
        Self {
            color: color.to_string(),
            bold,
        }
    }
}

/// Metadata strip settings. Corner contents come from the application
/// configuration; only the palette and logo policy are stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WatermarkParamsWire", into = "WatermarkParamsWire")]
pub struct WatermarkParams {
    pub logo_position: LogoPosition,
    pub logo_enabled: bool,
    /// Logo file name, or `"auto"` to pick it from the camera make.
    pub logo_name: String,
    pub background_color: String,
    pub left_top: CornerParams,
    pub left_bottom: CornerParams,
    pub right_top: CornerParams,
    pub right_bottom: CornerParams,
}

impl Default for WatermarkParams {
    fn default() -> Self {
        Self {
            logo_position: LogoPosition::Left,
            logo_enabled: true,
            logo_name: "auto".to_string(),
            background_color: "#ffffff".to_string(),
            left_top: CornerParams::new("#212121", true),
            left_bottom: CornerParams::new("#424242", false),
            right_top: CornerParams::new("#212121", true),
            right_bottom: CornerParams::new("#424242", false),
        }
    }
}

/// Flat JSON layout of [`WatermarkParams`].
#[derive(Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WatermarkParamsWire {
    logo_position: LogoPosition,
    logo_enable: bool,
    logo_name: String,
    bg_color: String,
    font_color_lt: String,
    bold_font_lt: bool,
    font_color_lb: String,
    bold_font_lb: bool,
    font_color_rt: String,
    bold_font_rt: bool,
    font_color_rb: String,
    bold_font_rb: bool,
}

impl Default for WatermarkParamsWire {
    fn default() -> Self {
        WatermarkParams::default().into()
    }
}

impl From<WatermarkParams> for WatermarkParamsWire {
    fn from(p: WatermarkParams) -> Self {
        Self {
            logo_position: p.logo_position,
            logo_enable: p.logo_enabled,
            logo_name: p.logo_name,
            bg_color: p.background_color,
            font_color_lt: p.left_top.color,
            bold_font_lt: p.left_top.bold,
            font_color_lb: p.left_bottom.color,
            bold_font_lb: p.left_bottom.bold,
            font_color_rt: p.right_top.color,
            bold_font_rt: p.right_top.bold,
            font_color_rb: p.right_bottom.color,
            bold_font_rb: p.right_bottom.bold,
        }
    }
}

impl From<WatermarkParamsWire> for WatermarkParams {
    fn from(w: WatermarkParamsWire) -> Self {
        Self {
            logo_position: w.logo_position,
            logo_enabled: w.logo_enable,
            logo_name: w.logo_name,
            background_color: w.bg_color,
            left_top: CornerParams {
                color: w.font_color_lt,
                bold: w.bold_font_lt,
            },
            left_bottom: CornerParams {
                color: w.font_color_lb,
                bold: w.bold_font_lb,
            },
            right_top: CornerParams {
                color: w.font_color_rt,
                bold: w.bold_font_rt,
            },
            right_bottom: CornerParams {
                color: w.font_color_rb,
                bold: w.bold_font_rb,
            },
        }
    }
}

/// Parameters of one processor; the variant determines the category.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorParams {
    Border(BorderParams),
    Blur(BlurParams),
    Transform(TransformParams),
    Watermark(WatermarkParams),
}

impl ProcessorParams {
    pub fn category(&self) -> Category {
        match self {
            ProcessorParams::Border(_) => Category::Border,
            ProcessorParams::Blur(_) => Category::Blur,
            ProcessorParams::Transform(_) => Category::Transform,
            ProcessorParams::Watermark(_) => Category::Watermark,
        }
    }

    /// Default parameters of a category.
    pub fn default_for(category: Category) -> Self {
        match category {
            Category::Border => ProcessorParams::Border(BorderParams::default()),
            Category::Blur => ProcessorParams::Blur(BlurParams::default()),
            Category::Transform => ProcessorParams::Transform(TransformParams::default()),
            Category::Watermark => ProcessorParams::Watermark(WatermarkParams::default()),
        }
    }

    pub fn to_value(&self) -> Result<Value, ProcessorConfigError> {
        let value = match self {
            ProcessorParams::Border(p) => serde_json::to_value(p)?,
            ProcessorParams::Blur(p) => serde_json::to_value(p)?,
            ProcessorParams::Transform(p) => serde_json::to_value(p)?,
            ProcessorParams::Watermark(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }

    /// Parse the `params` object of a config tagged `category`.
    pub fn from_value(category: Category, value: Value) -> Result<Self, ProcessorConfigError> {
        let params = match category {
            Category::Border => ProcessorParams::Border(serde_json::from_value(value)?),
            Category::Blur => ProcessorParams::Blur(serde_json::from_value(value)?),
            Category::Transform => {
                // Checked up front so a bad kind is reported as such, not as a
                // generic JSON error
                if let Some(kind) = value.get("transform_type").and_then(Value::as_str) {
                    kind.parse::<TransformKind>()?;
                }
                ProcessorParams::Transform(serde_json::from_value(value)?)
            }
            Category::Watermark => ProcessorParams::Watermark(serde_json::from_value(value)?),
        };
        params.validate()?;
        Ok(params)
    }

    /// Range checks serde cannot express.
    pub fn validate(&self) -> Result<(), ProcessorConfigError> {
        match self {
            ProcessorParams::Blur(p) => {
                if !(p.padding_percent > 0.0 && p.padding_percent <= 1.0) {
                    return Err(ProcessorConfigError::Invalid(format!(
                        "padding_percent must be in (0, 1], got {}",
                        p.padding_percent
                    )));
                }
                if !(0.0..=1.0).contains(&p.blend_alpha) {
                    return Err(ProcessorConfigError::Invalid(format!(
                        "blend_alpha must be in [0, 1], got {}",
                        p.blend_alpha
                    )));
                }
            }
            ProcessorParams::Transform(TransformParams {
                target_ratio: Some(ratio),
                ..
            }) if !(ratio.is_finite() && *ratio > 0.0) => {
                return Err(ProcessorConfigError::Invalid(format!(
                    "target_ratio must be positive, got {ratio}"
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

// =============================================================================
// Ids and timestamps
// =============================================================================

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    format_timestamp(&Local::now().naive_local())
}

pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// `"{category}_{YYYYmmddHHMMSS}"`.
pub fn processor_id(category: Category, at: &NaiveDateTime) -> String {
    format!("{}_{}", category.as_str(), at.format(ID_TIMESTAMP_FORMAT))
}

/// `"composite_{YYYYmmddHHMMSS}"`.
pub fn composite_id(at: &NaiveDateTime) -> String {
    format!("composite_{}", at.format(ID_TIMESTAMP_FORMAT))
}

/// `"Border 20240501103000"`.
pub fn default_name(category: Category, at: &NaiveDateTime) -> String {
    format!("{} {}", category.label(), at.format(ID_TIMESTAMP_FORMAT))
}

// =============================================================================
// ProcessorConfig
// =============================================================================

/// A named, parameterised processor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    pub id: String,
    pub name: String,
    pub params: ProcessorParams,
    pub created_at: String,
    pub updated_at: String,
}

/// JSON envelope; `params` stays untyped until the category is known.
#[derive(Serialize, Deserialize)]
struct ProcessorConfigWire {
    id: String,
    name: String,
    category: String,
    params: Value,
    #[serde(default = "now_timestamp")]
    created_at: String,
    #[serde(default = "now_timestamp")]
    updated_at: String,
}

impl ProcessorConfig {
    /// New config stamped with the current time.
    pub fn new(id: impl Into<String>, name: impl Into<String>, params: ProcessorParams) -> Self {
        let now = now_timestamp();
        Self {
            id: id.into(),
            name: name.into(),
            params,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Default parameters of `category` with a generated id and name.
    pub fn default_for(category: Category, name: Option<&str>) -> Self {
        Self::default_at(category, name, &Local::now().naive_local())
    }

    pub fn default_at(category: Category, name: Option<&str>, at: &NaiveDateTime) -> Self {
        let stamp = format_timestamp(at);
        Self {
            id: processor_id(category, at),
            name: name.map_or_else(|| default_name(category, at), str::to_string),
            params: ProcessorParams::default_for(category),
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }

    pub fn category(&self) -> Category {
        self.params.category()
    }

    /// Mark as modified now.
    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }

    pub fn to_dict(&self) -> Result<Value, ProcessorConfigError> {
        Ok(json!({
            "id": self.id,
            "name": self.name,
            "category": self.category().as_str(),
            "params": self.params.to_value()?,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        }))
    }

    pub fn from_dict(value: &Value) -> Result<Self, ProcessorConfigError> {
        let wire: ProcessorConfigWire = serde_json::from_value(value.clone())?;
        let category: Category = wire.category.parse()?;
        Ok(Self {
            id: wire.id,
            name: wire.name,
            params: ProcessorParams::from_value(category, wire.params)?,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }

    pub fn to_json(&self) -> Result<String, ProcessorConfigError> {
        Ok(serde_json::to_string_pretty(&self.to_dict()?)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ProcessorConfigError> {
        Self::from_dict(&serde_json::from_str(json)?)
    }
}

// =============================================================================
// CompositeProcessorConfig
// =============================================================================

/// An ordered list of processors applied as one.
///
/// `processor_ids` gives the order. Ids that match an entry of
/// `processor_configs` use that config; the rest name built-in processors.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeProcessorConfig {
    pub id: String,
    pub name: String,
    pub processor_ids: Vec<String>,
    pub processor_configs: Vec<ProcessorConfig>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize, Deserialize)]
struct CompositeWire {
    id: String,
    name: String,
    processor_ids: Vec<String>,
    #[serde(default)]
    processor_configs: Vec<Value>,
    #[serde(default = "now_timestamp")]
    created_at: String,
    #[serde(default = "now_timestamp")]
    updated_at: String,
}

impl CompositeProcessorConfig {
    /// Composite of `configs` in order, with a generated id.
    pub fn from_configs(name: Option<&str>, configs: Vec<ProcessorConfig>) -> Self {
        let at = Local::now().naive_local();
        let stamp = format_timestamp(&at);
        Self {
            id: composite_id(&at),
            name: name.map_or_else(
                || format!("Composite {}", at.format(ID_TIMESTAMP_FORMAT)),
                str::to_string,
            ),
            processor_ids: configs.iter().map(|c| c.id.clone()).collect(),
            processor_configs: configs,
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }

    /// Stored config for `id`, if this composite carries one.
    pub fn config_for(&self, id: &str) -> Option<&ProcessorConfig> {
        self.processor_configs.iter().find(|c| c.id == id)
    }

    pub fn touch(&mut self) {
        self.updated_at = now_timestamp();
    }

    /// Whether a JSON object describes a composite rather than a single config.
    pub fn is_composite_dict(value: &Value) -> bool {
        value.get("processor_ids").is_some()
    }

    pub fn to_dict(&self) -> Result<Value, ProcessorConfigError> {
        let configs = self
            .processor_configs
            .iter()
            .map(ProcessorConfig::to_dict)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({
            "id": self.id,
            "name": self.name,
            "processor_ids": self.processor_ids,
            "processor_configs": configs,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        }))
    }

    pub fn from_dict(value: &Value) -> Result<Self, ProcessorConfigError> {
        let wire: CompositeWire = serde_json::from_value(value.clone())?;
        let processor_configs = wire
            .processor_configs
            .iter()
            .map(ProcessorConfig::from_dict)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: wire.id,
            name: wire.name,
            processor_ids: wire.processor_ids,
            processor_configs,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }

    pub fn to_json(&self) -> Result<String, ProcessorConfigError> {
        Ok(serde_json::to_string_pretty(&self.to_dict()?)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ProcessorConfigError> {
        Self::from_dict(&serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn round_trip(config: &ProcessorConfig) -> ProcessorConfig {
        let via_dict = ProcessorConfig::from_dict(&config.to_dict().unwrap()).unwrap();
        let via_json = ProcessorConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(via_dict, via_json);
        via_dict
    }

    // =========================================================================
    // Ids and defaults
    // =========================================================================

    #[test]
    fn generated_ids_and_names() {
        assert_eq!(processor_id(Category::Border, &at()), "border_20240501103000");
        assert_eq!(composite_id(&at()), "composite_20240501103000");
        assert_eq!(default_name(Category::Blur, &at()), "Blur 20240501103000");
        assert_eq!(format_timestamp(&at()), "2024-05-01T10:30:00.000000");
    }

    #[test]
    fn default_for_every_category() {
        for category in Category::ALL {
            let config = ProcessorConfig::default_at(category, None, &at());
            assert_eq!(config.category(), category);
            assert!(config.id.starts_with(category.as_str()));
            assert_eq!(config.created_at, config.updated_at);
        }
        let named = ProcessorConfig::default_at(Category::Watermark, Some("Mine"), &at());
        assert_eq!(named.name, "Mine");
    }

    #[test]
    fn category_parse() {
        assert_eq!("blur".parse::<Category>().unwrap(), Category::Blur);
        assert!(matches!(
            "sepia".parse::<Category>(),
            Err(ProcessorConfigError::UnknownCategory(c)) if c == "sepia"
        ));
    }

    // =========================================================================
    // Round trips
    // =========================================================================

    #[test]
    fn border_round_trip() {
        let config = ProcessorConfig::new(
            "border_1",
            "Thin top",
            ProcessorParams::Border(BorderParams {
                border_size: 4,
                border_color: "#000000".into(),
                sides: Sides::TOP,
            }),
        );
        assert_eq!(round_trip(&config), config);
    }

    #[test]
    fn blur_round_trip() {
        let config = ProcessorConfig::new(
            "blur_1",
            "Soft",
            ProcessorParams::Blur(BlurParams {
                blur_radius: 12,
                padding_percent: 0.3,
                blend_alpha: 0.0,
            }),
        );
        assert_eq!(round_trip(&config), config);
    }

    #[test]
    fn transform_round_trip_keeps_absent_values() {
        for kind in TransformKind::ALL {
            let config = ProcessorConfig::new(
                "transform_1",
                "t",
                ProcessorParams::Transform(TransformParams::new(kind)),
            );
            let back = round_trip(&config);
            assert_eq!(back, config);
            let ProcessorParams::Transform(p) = back.params else {
                panic!("expected transform params");
            };
            assert_eq!(p.target_ratio, None);
            assert_eq!(p.radius, None);
        }

        let set = ProcessorConfig::new(
            "transform_2",
            "t",
            ProcessorParams::Transform(TransformParams {
                transform_type: TransformKind::Ratio,
                target_ratio: Some(1.5),
                radius: Some(20),
            }),
        );
        assert_eq!(round_trip(&set), set);
    }

    #[test]
    fn watermark_round_trip() {
        let mut params = WatermarkParams {
            logo_position: LogoPosition::Right,
            logo_enabled: false,
            logo_name: "nikon".into(),
            background_color: "#212121".into(),
            ..WatermarkParams::default()
        };
        params.right_bottom.bold = true;
        let config = ProcessorConfig::new("watermark_1", "w", ProcessorParams::Watermark(params));
        assert_eq!(round_trip(&config), config);
    }

    #[test]
    fn json_shape_uses_category_tag_and_flat_keys() {
        let config = ProcessorConfig::default_at(Category::Watermark, None, &at());
        let dict = config.to_dict().unwrap();
        assert_eq!(dict["category"], "watermark");
        assert_eq!(dict["params"]["logo_enable"], true);
        assert_eq!(dict["params"]["bg_color"], "#ffffff");
        assert_eq!(dict["params"]["font_color_lt"], "#212121");
        assert_eq!(dict["params"]["bold_font_lb"], false);

        let border = ProcessorConfig::default_at(Category::Border, None, &at()).to_dict().unwrap();
        assert_eq!(border["params"]["sides"], "tlrb");

        let transform = ProcessorConfig::default_at(Category::Transform, None, &at())
            .to_dict()
            .unwrap();
        assert_eq!(transform["params"]["transform_type"], "square");
        assert!(transform["params"]["target_ratio"].is_null());
    }

    #[test]
    fn missing_params_take_defaults() {
        let value = json!({
            "id": "blur_x",
            "name": "x",
            "category": "blur",
            "params": { "blur_radius": 5 },
        });
        let config = ProcessorConfig::from_dict(&value).unwrap();
        assert_eq!(
            config.params,
            ProcessorParams::Blur(BlurParams {
                blur_radius: 5,
                ..BlurParams::default()
            })
        );
        assert!(!config.created_at.is_empty());
    }

    // =========================================================================
    // Rejections
    // =========================================================================

    #[test]
    fn unknown_category_rejected() {
        let value = json!({ "id": "a", "name": "a", "category": "sepia", "params": {} });
        assert!(matches!(
            ProcessorConfig::from_dict(&value),
            Err(ProcessorConfigError::UnknownCategory(_))
        ));
    }

    #[test]
    fn unknown_transform_kind_rejected() {
        let value = json!({
            "id": "a", "name": "a", "category": "transform",
            "params": { "transform_type": "skew" },
        });
        assert!(matches!(
            ProcessorConfig::from_dict(&value),
            Err(ProcessorConfigError::UnknownTransformKind(k)) if k == "skew"
        ));
    }

    #[test]
    fn out_of_range_blur_rejected() {
        let value = json!({
            "id": "a", "name": "a", "category": "blur",
            "params": { "padding_percent": 0.0 },
        });
        assert!(matches!(
            ProcessorConfig::from_dict(&value),
            Err(ProcessorConfigError::Invalid(_))
        ));
    }

    #[test]
    fn bad_sides_and_unknown_fields_rejected() {
        let sides = json!({
            "id": "a", "name": "a", "category": "border",
            "params": { "sides": "tx" },
        });
        assert!(matches!(
            ProcessorConfig::from_dict(&sides),
            Err(ProcessorConfigError::Json(_))
        ));
        let extra = json!({
            "id": "a", "name": "a", "category": "border",
            "params": { "thickness": 3 },
        });
        assert!(ProcessorConfig::from_dict(&extra).is_err());
    }

    // =========================================================================
    // Composite
    // =========================================================================

    #[test]
    fn composite_round_trip() {
        let border = ProcessorConfig::default_at(Category::Border, None, &at());
        let mut composite =
            CompositeProcessorConfig::from_configs(Some("Framed"), vec![border.clone()]);
        composite.processor_ids.insert(0, "rounded_corner".to_string());

        let back = CompositeProcessorConfig::from_json(&composite.to_json().unwrap()).unwrap();
        assert_eq!(back, composite);
        assert_eq!(back.processor_ids, vec!["rounded_corner", "border_20240501103000"]);
        assert_eq!(back.config_for("border_20240501103000"), Some(&border));
        assert!(back.config_for("rounded_corner").is_none());
        assert!(back.id.starts_with("composite_"));
    }

    #[test]
    fn composite_detection() {
        let single = ProcessorConfig::default_at(Category::Blur, None, &at()).to_dict().unwrap();
        let composite = CompositeProcessorConfig::from_configs(None, vec![]).to_dict().unwrap();
        assert!(!CompositeProcessorConfig::is_composite_dict(&single));
        assert!(CompositeProcessorConfig::is_composite_dict(&composite));
        assert!(composite["name"].as_str().unwrap().starts_with("Composite "));
    }
}
