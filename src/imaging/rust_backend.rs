//! Pure Rust codec backend, no external tools.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Camera tags | `kamadak-exif` (`exif::Reader::read_from_container`) |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` with quality + JFIF density |
//! | Encode PNG / TIFF / WebP | `image::DynamicImage::write_to` |
//! | EXIF pass-through | `img-parts` (JPEG APP1 segment, PNG eXIf chunk) |

use super::backend::{BackendError, ImageBackend, RawMetadata};
use super::params::SaveOptions;
use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
use image::{DynamicImage, ImageFormat, ImageReader};
use img_parts::{Bytes, ImageEXIF};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

// =============================================================================
// Tag reading
// =============================================================================

/// Read camera tags into an exiftool-style dictionary.
///
/// Missing or unreadable EXIF gives an empty map; only an unopenable file is
/// an error.
fn read_exif_tags(path: &Path) -> Result<RawMetadata, BackendError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut tags = RawMetadata::new();

    let Ok(exif) = exif::Reader::new().read_from_container(&mut reader) else {
        return Ok(tags);
    };

    let text = |tag: exif::Tag| {
        exif.get_field(tag, exif::In::PRIMARY)
            .map(|f| f.display_value().to_string().trim_matches('"').trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let rational = |tag: exif::Tag| {
        exif.get_field(tag, exif::In::PRIMARY)
            .and_then(|f| match &f.value {
                exif::Value::Rational(v) if !v.is_empty() && v[0].denom != 0 => Some(v[0]),
                _ => None,
            })
    };
    let uint = |tag: exif::Tag| {
        exif.get_field(tag, exif::In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
    };

    let mut put = |key: &str, value: Option<String>| {
        if let Some(v) = value {
            tags.insert(key.to_string(), v);
        }
    };

    put("Make", text(exif::Tag::Make));
    put("CameraModelName", text(exif::Tag::Model));
    put("LensModel", text(exif::Tag::LensModel));
    put("LensMake", text(exif::Tag::LensMake));
    put("DateTimeOriginal", text(exif::Tag::DateTimeOriginal));
    put(
        "FocalLength",
        rational(exif::Tag::FocalLength).map(|r| format!("{:.1} mm", r.to_f64())),
    );
    put(
        "FocalLengthIn35mmFormat",
        uint(exif::Tag::FocalLengthIn35mmFilm)
            .filter(|v| *v > 0)
            .map(|v| format!("{v} mm")),
    );
    put(
        "FNumber",
        rational(exif::Tag::FNumber).map(|r| format_decimal(r.to_f64())),
    );
    put(
        "ExposureTime",
        rational(exif::Tag::ExposureTime).map(|r| format_exposure(r.num, r.denom)),
    );
    put(
        "ISO",
        uint(exif::Tag::PhotographicSensitivity).map(|v| v.to_string()),
    );
    put(
        "Orientation",
        uint(exif::Tag::Orientation).map(|v| v.to_string()),
    );
    put(
        "XResolution",
        rational(exif::Tag::XResolution).map(|r| format_decimal(r.to_f64())),
    );
    put(
        "YResolution",
        rational(exif::Tag::YResolution).map(|r| format_decimal(r.to_f64())),
    );
    put(
        "GPSLatitude",
        gps_coordinate(&exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef),
    );
    put(
        "GPSLongitude",
        gps_coordinate(&exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef),
    );

    Ok(tags)
}

/// `1.8`, `11`, `5.6`: one decimal, trailing `.0` dropped.
fn format_decimal(value: f64) -> String {
    let s = format!("{value:.1}");
    s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
}

/// Shutter speeds below a second as `1/N`, longer ones as plain seconds.
fn format_exposure(num: u32, denom: u32) -> String {
    if num == 0 || denom == 0 {
        return "0".to_string();
    }
    if num < denom {
        format!("1/{}", (denom as f64 / num as f64).round() as u64)
    } else {
        format_decimal(num as f64 / denom as f64)
    }
}

/// Degrees/minutes/seconds in exiftool's notation: `34 deg 3' 8.45" N`.
fn gps_coordinate(exif: &exif::Exif, value_tag: exif::Tag, ref_tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(value_tag, exif::In::PRIMARY)?;
    let exif::Value::Rational(parts) = &field.value else {
        return None;
    };
    if parts.len() < 3 || parts.iter().any(|p| p.denom == 0) {
        return None;
    }
    let hemisphere = exif
        .get_field(ref_tag, exif::In::PRIMARY)
        .map(|f| f.display_value().to_string().trim_matches('"').to_string())
        .unwrap_or_default();
    Some(format!(
        "{} deg {}' {:.2}\" {}",
        parts[0].to_f64() as u32,
        parts[1].to_f64() as u32,
        parts[2].to_f64(),
        hemisphere
    ))
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode to memory in the format implied by the extension.
fn encode(
    image: &DynamicImage,
    path: &Path,
    options: &SaveOptions,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    match extension(path).as_str() {
        "jpg" | "jpeg" => {
            let rgb = image.to_rgb8();
            let quality = options.quality.value() as u8;
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            if let Some(density) = options.density {
                encoder.set_pixel_density(PixelDensity {
                    density: (density.x, density.y),
                    unit: PixelDensityUnit::Inches,
                });
            }
            encoder
                .encode_image(&rgb)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
        }
        ext => {
            let format = PHOTO_CANDIDATES
                .iter()
                .find(|(candidate, _)| *candidate == ext)
                .map(|(_, fmt)| *fmt)
                .ok_or_else(|| {
                    BackendError::ProcessingFailed(format!("Unsupported output format: {ext}"))
                })?;
            image
                .write_to(&mut Cursor::new(&mut buf), format)
                .map_err(|e| BackendError::ProcessingFailed(format!("Encode failed: {e}")))?;
        }
    }
    Ok(buf)
}

/// Attach a raw EXIF payload to an encoded JPEG or PNG.
///
/// Other containers come back unchanged.
fn attach_exif(encoded: Vec<u8>, path: &Path, exif: &[u8]) -> Result<Vec<u8>, BackendError> {
    let exif = Bytes::copy_from_slice(exif);
    let mut out = Vec::new();
    match extension(path).as_str() {
        "jpg" | "jpeg" => {
            let mut jpeg = img_parts::jpeg::Jpeg::from_bytes(encoded.into()).map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to re-parse JPEG: {e}"))
            })?;
            jpeg.set_exif(Some(exif));
            jpeg.encoder().write_to(&mut out)?;
        }
        "png" => {
            let mut png = img_parts::png::Png::from_bytes(encoded.into()).map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to re-parse PNG: {e}"))
            })?;
            png.set_exif(Some(exif));
            png.encoder().write_to(&mut out)?;
        }
        _ => {
            log::debug!("EXIF pass-through not supported for {}", path.display());
            return Ok(encoded);
        }
    }
    Ok(out)
}

/// Raw EXIF payload from a JPEG or PNG file.
fn extract_exif(path: &Path) -> Option<Vec<u8>> {
    let bytes = std::fs::read(path).ok()?;
    let exif = match extension(path).as_str() {
        "jpg" | "jpeg" => img_parts::jpeg::Jpeg::from_bytes(bytes.into()).ok()?.exif(),
        "png" => img_parts::png::Png::from_bytes(bytes.into()).ok()?.exif(),
        _ => None,
    };
    exif.map(|b| b.to_vec())
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        load_image(path)
    }

    fn read_metadata(&self, path: &Path) -> Result<RawMetadata, BackendError> {
        read_exif_tags(path)
    }

    fn read_exif_blob(&self, path: &Path) -> Option<Vec<u8>> {
        extract_exif(path)
    }

    fn save(
        &self,
        image: &DynamicImage,
        path: &Path,
        options: &SaveOptions,
    ) -> Result<(), BackendError> {
        let mut encoded = encode(image, path, options)?;
        if let Some(exif) = &options.exif {
            encoded = match attach_exif(encoded.clone(), path, exif) {
                Ok(with_exif) => with_exif,
                Err(e) => {
                    log::warn!("Dropping EXIF for {}: {}", path.display(), e);
                    encoded
                }
            };
        }
        std::fs::write(path, encoded)?;
        Ok(())
    }
}
