//! Shared fixtures for the test suite.
//!
//! Camera tag sets as the EXIF reader would report them, synthetic rasters,
//! and ready-made containers and render contexts.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let backend = MockBackend::new().with_image("/in/a.jpg", gradient(64, 48), CANON_R5);
//! let container = canon_container(400, 300);
//! assert_eq!(container.metadata().get(AttributeKey::Param), "50mm  f/1.8  1/200s  ISO400");
//! ```

use crate::config::AppConfig;
use crate::container::ImageContainer;
use crate::metadata::MetadataRecord;
use crate::resources::RenderContext;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;
use std::sync::Arc;

// =========================================================================
// Tag sets
// =========================================================================

/// A landscape frame from a Canon body with a 50mm prime.
pub const CANON_R5: &[(&str, &str)] = &[
    ("Make", "Canon"),
    ("CameraModelName", "Canon EOS R5"),
    ("LensModel", "RF50mm F1.2 L USM"),
    ("LensMake", "Canon"),
    ("FocalLength", "50.0 mm"),
    ("FNumber", "1.8"),
    ("ExposureTime", "1/200"),
    ("ISO", "400"),
    ("DateTimeOriginal", "2024:05:01 10:30:00"),
    ("Orientation", "1"),
    ("XResolution", "300"),
    ("YResolution", "300"),
];

/// Shot in portrait, stored sideways.
pub const ROTATED_NIKON: &[(&str, &str)] = &[
    ("Make", "NIKON CORPORATION"),
    ("CameraModelName", "NIKON Z 6"),
    ("FocalLength", "35.0 mm"),
    ("FocalLengthIn35mmFormat", "35 mm"),
    ("FNumber", "4.0"),
    ("ExposureTime", "1/60"),
    ("ISO", "800"),
    ("Orientation", "6"),
];

pub fn raw_tags(tags: &[(&str, &str)]) -> crate::imaging::RawMetadata {
    tags.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =========================================================================
// Rasters
// =========================================================================

/// RGB image whose pixels encode their coordinates, so crops and rotations
/// are detectable.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    }))
}

/// Write a real JPEG to `path` for tests that go through the decoder.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    gradient(width, height).save(path).unwrap();
}

// =========================================================================
// Containers and contexts
// =========================================================================

/// Container over a `width x height` gradient with the Canon tags.
pub fn canon_container(width: u32, height: u32) -> ImageContainer {
    let record = MetadataRecord::from_raw(&raw_tags(CANON_R5), "IMG_0001", (width, height), true);
    ImageContainer::from_parts("/in/IMG_0001.jpg", gradient(width, height), record)
}

/// Default configuration, no fonts, no logos.
pub fn bare_context() -> Arc<RenderContext> {
    Arc::new(RenderContext::without_resources(AppConfig::default()))
}
