//! Per-image camera metadata and the named-attribute lookup.
//!
//! A [`MetadataRecord`] is built once, when a container is opened, from the
//! flat tag dictionary returned by
//! [`ImageBackend::read_metadata`](crate::imaging::ImageBackend::read_metadata).
//! After that it is read-only except for the single custom-text slot.
//!
//! ## Missing tags
//!
//! Absent tags never surface as errors. Every text attribute falls back to the
//! [`NOT_AVAILABLE`] sentinel, except the location which falls back to
//! [`NO_LOCATION`] and the custom slot which starts empty.
//!
//! ## Attribute keys
//!
//! Text-producing effects ask for values by [`AttributeKey`], a closed enum.
//! Configuration files and stored processor configs name keys by their wire
//! name (`"model"`, `"make+model"`, ...); [`MetadataRecord::lookup_name`]
//! accepts those and returns an empty string for names it does not know.
//!
//! ## Shooting parameters
//!
//! The `param` attribute reads `"50mm  f/1.8  1/200s  ISO400"`: focal length,
//! aperture, shutter speed and sensitivity joined by two spaces.
//!
//! - Focal length is the integer part of the first decimal number in the
//!   `FocalLength` tag (`"50.0 mm"` → 50), falling back to the first integer
//!   (`"50mm"` → 50). With `use_equivalent_focal_length` the 35mm-equivalent
//!   value is used when the file carries one, either as its own tag or as the
//!   second number in `"50.0 mm (35 mm equivalent: 75.0 mm)"`.
//! - A leading `f/` on the aperture is dropped so it is never doubled.
//! - The shutter speed gets an `s` suffix unless it already ends in one.

use crate::imaging::RawMetadata;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Placeholder for any tag the file does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for the location when the file has no GPS tags.
pub const NO_LOCATION: &str = "none";

static DECIMAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.\d*").expect("valid regex"));
static INTEGER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("valid regex"));
static GPS_DEGREES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) deg (\d+)").expect("valid regex"));

/// Datetime layouts accepted for `DateTimeOriginal`, EXIF's own first.
const DATETIME_FORMATS: &[&str] = &[
    "%Y:%m:%d %H:%M:%S",
    "%Y:%m:%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y:%m:%d %H:%M",
    "%Y-%m-%d %H:%M",
];

/// Named attributes a watermark corner can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKey {
    #[serde(rename = "model")]
    Model,
    #[serde(rename = "make")]
    Make,
    #[serde(rename = "lens")]
    Lens,
    #[serde(rename = "param")]
    Param,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "filename")]
    Filename,
    #[serde(rename = "geo_info")]
    GeoInfo,
    #[serde(rename = "total_pixel")]
    TotalPixel,
    #[serde(rename = "make+model")]
    MakeModel,
    #[serde(rename = "lens make+model")]
    LensMakeModel,
    #[serde(rename = "model+lens")]
    ModelLens,
    #[serde(rename = "date+filename")]
    DateFilename,
    #[serde(rename = "datetime+filename")]
    DateTimeFilename,
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "none")]
    None,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 16] = [
        AttributeKey::Model,
        AttributeKey::Make,
        AttributeKey::Lens,
        AttributeKey::Param,
        AttributeKey::DateTime,
        AttributeKey::Date,
        AttributeKey::Filename,
        AttributeKey::GeoInfo,
        AttributeKey::TotalPixel,
        AttributeKey::MakeModel,
        AttributeKey::LensMakeModel,
        AttributeKey::ModelLens,
        AttributeKey::DateFilename,
        AttributeKey::DateTimeFilename,
        AttributeKey::Custom,
        AttributeKey::None,
    ];

    /// The name used in configuration files.
    pub fn wire_name(self) -> &'static str {
        match self {
            AttributeKey::Model => "model",
            AttributeKey::Make => "make",
            AttributeKey::Lens => "lens",
            AttributeKey::Param => "param",
            AttributeKey::DateTime => "datetime",
            AttributeKey::Date => "date",
            AttributeKey::Filename => "filename",
            AttributeKey::GeoInfo => "geo_info",
            AttributeKey::TotalPixel => "total_pixel",
            AttributeKey::MakeModel => "make+model",
            AttributeKey::LensMakeModel => "lens make+model",
            AttributeKey::ModelLens => "model+lens",
            AttributeKey::DateFilename => "date+filename",
            AttributeKey::DateTimeFilename => "datetime+filename",
            AttributeKey::Custom => "custom",
            AttributeKey::None => "none",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wire_name() == name)
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for AttributeKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| format!("unknown attribute \"{s}\""))
    }
}

/// EXIF orientation, restricted to the four pure rotations.
///
/// Mirrored orientations are treated as [`Orientation::Normal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90Cw,
    Rotate180,
    Rotate270Cw,
}

impl Orientation {
    /// Parse either the numeric tag (`1`, `3`, `6`, `8`) or exiftool's text
    /// form (`"Rotate 90 CW"`).
    pub fn from_tag(value: &str) -> Self {
        match value.trim() {
            "6" | "Rotate 90 CW" => Orientation::Rotate90Cw,
            "3" | "Rotate 180" => Orientation::Rotate180,
            "8" | "Rotate 270 CW" => Orientation::Rotate270Cw,
            _ => Orientation::Normal,
        }
    }

    /// Swaps width and height when the rotation is a quarter turn.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Orientation::Rotate90Cw | Orientation::Rotate270Cw)
    }
}

/// Camera metadata of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub make: String,
    pub model: String,
    pub lens_make: String,
    pub lens_model: String,
    pub captured_at: Option<NaiveDateTime>,
    /// Integer millimetres, as text.
    pub focal_length: Option<String>,
    pub focal_length_35mm: Option<String>,
    pub f_number: String,
    pub exposure_time: String,
    pub iso: String,
    /// Dimensions of the file as decoded, before any orientation fix.
    pub original_width: u32,
    pub original_height: u32,
    pub orientation: Orientation,
    pub geo_info: String,
    pub filename: String,
    pub use_equivalent_focal_length: bool,
    custom: String,
}

impl MetadataRecord {
    /// Build a record from a raw tag dictionary.
    ///
    /// `filename` is the file stem, `dimensions` the decoded pixel size.
    pub fn from_raw(
        raw: &RawMetadata,
        filename: &str,
        dimensions: (u32, u32),
        use_equivalent_focal_length: bool,
    ) -> Self {
        let text = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| raw.get(*k))
                .map(|v| v.trim())
                .find(|v| !v.is_empty())
                .map(str::to_string)
        };

        let (focal_length, inline_35mm) = text(&["FocalLength"])
            .map(|v| parse_focal_lengths(&v))
            .unwrap_or((None, None));
        let focal_length_35mm = text(&["FocalLengthIn35mmFormat"])
            .and_then(|v| parse_focal_lengths(&v).0)
            .or(inline_35mm);

        let f_number = text(&["FNumber", "Aperture"])
            .map(|v| v.trim_start_matches("f/").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let exposure_time = text(&["ExposureTime", "ShutterSpeed"])
            .map(|v| if v.ends_with('s') { v } else { format!("{v}s") })
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let geo_info = text(&["GPSPosition"])
            .and_then(|pos| {
                let (lat, lon) = pos.split_once(", ")?;
                format_gps(lat, lon)
            })
            .or_else(|| format_gps(&text(&["GPSLatitude"])?, &text(&["GPSLongitude"])?))
            .unwrap_or_else(|| NO_LOCATION.to_string());

        let or_na = |v: Option<String>| v.unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            make: or_na(text(&["Make"])),
            model: or_na(text(&["CameraModelName", "Model"])),
            lens_make: or_na(text(&["LensMake"])),
            lens_model: or_na(text(&["LensModel", "Lens"])),
            captured_at: text(&["DateTimeOriginal"]).and_then(|v| parse_datetime(&v)),
            focal_length,
            focal_length_35mm,
            f_number,
            exposure_time,
            iso: or_na(text(&["ISO"])),
            original_width: dimensions.0,
            original_height: dimensions.1,
            orientation: text(&["Orientation"])
                .map(|v| Orientation::from_tag(&v))
                .unwrap_or_default(),
            geo_info,
            filename: filename.to_string(),
            use_equivalent_focal_length,
            custom: String::new(),
        }
    }

    /// Value of a named attribute, ready for display.
    pub fn get(&self, key: AttributeKey) -> String {
        match key {
            AttributeKey::Model => self.model.clone(),
            AttributeKey::Make => self.make.clone(),
            AttributeKey::Lens => self.lens_model.clone(),
            AttributeKey::Param => self.param(),
            AttributeKey::DateTime => self.datetime(),
            AttributeKey::Date => self.date(),
            AttributeKey::Filename => self.filename.clone(),
            AttributeKey::GeoInfo => self.geo_info.clone(),
            AttributeKey::TotalPixel => total_pixel(self.original_width, self.original_height),
            AttributeKey::MakeModel => format!("{} {}", self.make, self.model),
            AttributeKey::LensMakeModel => format!("{} {}", self.lens_make, self.lens_model),
            AttributeKey::ModelLens => format!("{} {}", self.model, self.lens_model),
            AttributeKey::DateFilename => format!("{} {}", self.date(), self.filename),
            AttributeKey::DateTimeFilename => format!("{} {}", self.datetime(), self.filename),
            AttributeKey::Custom => self.custom.clone(),
            AttributeKey::None => String::new(),
        }
    }

    /// Lookup by wire name; unknown names give an empty string.
    pub fn lookup_name(&self, name: &str) -> String {
        AttributeKey::from_wire(name)
            .map(|key| self.get(key))
            .unwrap_or_default()
    }

    pub fn custom(&self) -> &str {
        &self.custom
    }

    pub fn set_custom(&mut self, text: impl Into<String>) {
        self.custom = text.into();
    }

    fn param(&self) -> String {
        let focal = if self.use_equivalent_focal_length {
            self.focal_length_35mm.as_ref().or(self.focal_length.as_ref())
        } else {
            self.focal_length.as_ref()
        };
        let focal = focal
            .map(|f| format!("{f}mm"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        format!(
            "{}  f/{}  {}  ISO{}",
            focal, self.f_number, self.exposure_time, self.iso
        )
    }

    fn datetime(&self) -> String {
        self.captured_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    fn date(&self) -> String {
        self.captured_at
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

/// First and second focal lengths in a tag value, as integer millimetres.
fn parse_focal_lengths(value: &str) -> (Option<String>, Option<String>) {
    let decimals: Vec<String> = DECIMAL_NUMBER
        .captures_iter(value)
        .map(|c| c[1].to_string())
        .collect();
    let numbers = if decimals.is_empty() {
        INTEGER_NUMBER
            .captures_iter(value)
            .map(|c| c[1].to_string())
            .collect()
    } else {
        decimals
    };
    let mut it = numbers.into_iter();
    (it.next(), it.next())
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    // Drop timezone suffixes such as "+02:00" or "Z"
    let trimmed = value.trim().trim_end_matches('Z');
    let candidate = match trimmed.rfind(['+', '-']) {
        Some(idx) if idx > 10 => &trimmed[..idx],
        _ => trimmed,
    };
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(candidate, fmt).ok())
}

/// `34 deg 3' 8.45" N` + `118 deg 14' 37.3" W` → `34°3'N 118°14'W`.
fn format_gps(latitude: &str, longitude: &str) -> Option<String> {
    let part = |value: &str, hemispheres: [char; 2]| {
        let caps = GPS_DEGREES.captures(value)?;
        let dir = value.chars().rev().find(|c| hemispheres.contains(c))?;
        Some(format!("{}°{}'{}", &caps[1], &caps[2], dir))
    };
    Some(format!(
        "{} {}",
        part(latitude, ['N', 'S'])?,
        part(longitude, ['E', 'W'])?
    ))
}

fn total_pixel(width: u32, height: u32) -> String {
    format!("{:.2} MP", width as f64 * height as f64 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(tags: &[(&str, &str)]) -> RawMetadata {
        tags.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn canon_r5() -> MetadataRecord {
        MetadataRecord::from_raw(
            &raw(&[
                ("Make", "Canon"),
                ("CameraModelName", "EOS R5"),
                ("LensModel", "RF50mm F1.8 STM"),
                ("LensMake", "Canon"),
                ("FocalLength", "50mm"),
                ("FNumber", "1.8"),
                ("ISO", "400"),
                ("ExposureTime", "1/200s"),
                ("DateTimeOriginal", "2024:05:01 10:30:00"),
            ]),
            "IMG_0001",
            (4000, 3000),
            true,
        )
    }

    // =========================================================================
    // Attribute lookup
    // =========================================================================

    #[test]
    fn param_string_for_full_exif() {
        assert_eq!(canon_r5().get(AttributeKey::Param), "50mm  f/1.8  1/200s  ISO400");
    }

    #[test]
    fn composite_attributes_join_with_space() {
        let record = canon_r5();
        assert_eq!(record.get(AttributeKey::MakeModel), "Canon EOS R5");
        assert_eq!(record.get(AttributeKey::ModelLens), "EOS R5 RF50mm F1.8 STM");
        assert_eq!(record.get(AttributeKey::LensMakeModel), "Canon RF50mm F1.8 STM");
        assert_eq!(record.get(AttributeKey::DateFilename), "2024-05-01 IMG_0001");
        assert_eq!(
            record.get(AttributeKey::DateTimeFilename),
            "2024-05-01 10:30 IMG_0001"
        );
    }

    #[test]
    fn total_pixel_in_megapixels() {
        assert_eq!(canon_r5().get(AttributeKey::TotalPixel), "12.00 MP");
    }

    #[test]
    fn missing_attributes_fall_back_to_sentinel() {
        let record = MetadataRecord::from_raw(&RawMetadata::new(), "photo", (10, 10), true);
        for key in [
            AttributeKey::Model,
            AttributeKey::Make,
            AttributeKey::Lens,
            AttributeKey::DateTime,
            AttributeKey::Date,
        ] {
            assert_eq!(record.get(key), NOT_AVAILABLE, "{key}");
        }
        assert_eq!(record.get(AttributeKey::GeoInfo), NO_LOCATION);
        assert_eq!(record.get(AttributeKey::Param), "N/A  f/N/A  N/A  ISON/A");
    }

    #[test]
    fn unknown_name_returns_empty_string() {
        assert_eq!(canon_r5().lookup_name("shutter_count"), "");
        assert_eq!(canon_r5().lookup_name(""), "");
        assert_eq!(canon_r5().lookup_name("make"), "Canon");
    }

    #[test]
    fn none_key_is_always_empty() {
        assert_eq!(canon_r5().get(AttributeKey::None), "");
    }

    #[test]
    fn custom_slot_is_writable() {
        let mut record = canon_r5();
        assert_eq!(record.get(AttributeKey::Custom), "");
        record.set_custom("Shot on a Tuesday");
        assert_eq!(record.lookup_name("custom"), "Shot on a Tuesday");
    }

    #[test]
    fn lens_falls_back_to_lens_tag() {
        let record =
            MetadataRecord::from_raw(&raw(&[("Lens", "XF23mmF2")]), "a", (1, 1), false);
        assert_eq!(record.get(AttributeKey::Lens), "XF23mmF2");
    }

    // =========================================================================
    // Tag parsing
    // =========================================================================

    #[test]
    fn focal_length_decimal_form() {
        let record = MetadataRecord::from_raw(
            &raw(&[("FocalLength", "23.0 mm (35 mm equivalent: 35.0 mm)")]),
            "a",
            (1, 1),
            true,
        );
        assert_eq!(record.focal_length.as_deref(), Some("23"));
        assert_eq!(record.focal_length_35mm.as_deref(), Some("35"));
        assert!(record.get(AttributeKey::Param).starts_with("35mm  "));
    }

    #[test]
    fn focal_length_actual_when_equivalent_disabled() {
        let record = MetadataRecord::from_raw(
            &raw(&[
                ("FocalLength", "23.0 mm"),
                ("FocalLengthIn35mmFormat", "35 mm"),
            ]),
            "a",
            (1, 1),
            false,
        );
        assert!(record.get(AttributeKey::Param).starts_with("23mm  "));
    }

    #[test]
    fn f_number_prefix_not_doubled() {
        let record = MetadataRecord::from_raw(&raw(&[("FNumber", "f/2.8")]), "a", (1, 1), true);
        assert!(record.get(AttributeKey::Param).contains("  f/2.8  "));
    }

    #[test]
    fn exposure_gets_seconds_suffix() {
        let record =
            MetadataRecord::from_raw(&raw(&[("ExposureTime", "1/125")]), "a", (1, 1), true);
        assert_eq!(record.exposure_time, "1/125s");
    }

    #[test]
    fn datetime_accepts_exif_and_iso_forms() {
        for value in [
            "2023:12:24 18:05:09",
            "2023-12-24 18:05:09",
            "2023-12-24T18:05:09.123",
            "2023:12:24 18:05:09+01:00",
        ] {
            let record =
                MetadataRecord::from_raw(&raw(&[("DateTimeOriginal", value)]), "a", (1, 1), true);
            assert_eq!(record.get(AttributeKey::DateTime), "2023-12-24 18:05", "{value}");
        }
    }

    #[test]
    fn unparsable_datetime_is_sentinel() {
        let record =
            MetadataRecord::from_raw(&raw(&[("DateTimeOriginal", "yesterday")]), "a", (1, 1), true);
        assert_eq!(record.get(AttributeKey::Date), NOT_AVAILABLE);
    }

    #[test]
    fn gps_from_latitude_and_longitude() {
        let record = MetadataRecord::from_raw(
            &raw(&[
                ("GPSLatitude", "34 deg 3' 8.45\" N"),
                ("GPSLongitude", "118 deg 14' 37.30\" W"),
            ]),
            "a",
            (1, 1),
            true,
        );
        assert_eq!(record.get(AttributeKey::GeoInfo), "34°3'N 118°14'W");
    }

    #[test]
    fn gps_from_position() {
        let record = MetadataRecord::from_raw(
            &raw(&[("GPSPosition", "51 deg 30' 26.00\" N, 0 deg 7' 39.00\" E")]),
            "a",
            (1, 1),
            true,
        );
        assert_eq!(record.get(AttributeKey::GeoInfo), "51°30'N 0°7'E");
    }

    #[test]
    fn orientation_from_number_or_text() {
        assert_eq!(Orientation::from_tag("6"), Orientation::Rotate90Cw);
        assert_eq!(Orientation::from_tag("Rotate 270 CW"), Orientation::Rotate270Cw);
        assert_eq!(Orientation::from_tag("3"), Orientation::Rotate180);
        assert_eq!(Orientation::from_tag("Mirror horizontal"), Orientation::Normal);
    }

    #[test]
    fn attribute_key_wire_names_round_trip() {
        for key in AttributeKey::ALL {
            assert_eq!(AttributeKey::from_wire(key.wire_name()), Some(key));
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.wire_name()));
        }
    }
}
