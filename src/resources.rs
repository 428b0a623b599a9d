//! Fonts and camera-brand logos used by the watermark strip.
//!
//! Both are loaded once per run and shared read-only by every worker through
//! [`RenderContext`]. Neither is essential: a missing font renders empty text
//! and a missing logo falls back to the no-logo layout, each with a logged
//! warning instead of an error.

use crate::config::{AppConfig, FontsConfig};
use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_text_mut, text_size};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid font {0}")]
    Font(String),
    #[error("invalid logo {0}: {1}")]
    Logo(String, String),
}

/// Tried in order when no regular font is configured.
const FALLBACK_REGULAR: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Tried in order when no bold font is configured.
const FALLBACK_BOLD: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

fn read_font(path: &Path) -> Result<FontArc, ResourceError> {
    let data = fs::read(path)?;
    FontArc::try_from_vec(data).map_err(|_| ResourceError::Font(path.display().to_string()))
}

/// Configured path first, then the first fallback that loads.
fn find_font(configured: Option<&str>, fallbacks: &[&str]) -> Option<FontArc> {
    if let Some(path) = configured {
        match read_font(Path::new(path)) {
            Ok(font) => return Some(font),
            Err(e) => log::warn!("Cannot load font {path}: {e}"),
        }
    }
    fallbacks
        .iter()
        .map(Path::new)
        .filter(|p| p.exists())
        .find_map(|p| read_font(p).ok())
}

// =============================================================================
// Fonts
// =============================================================================

/// Regular and bold faces with their pixel sizes.
#[derive(Clone)]
pub struct FontSet {
    regular: Option<FontArc>,
    bold: Option<FontArc>,
    size: f32,
    bold_size: f32,
}

impl FontSet {
    pub fn new(regular: Option<FontArc>, bold: Option<FontArc>, size: u32, bold_size: u32) -> Self {
        Self {
            regular,
            bold,
            size: size as f32,
            bold_size: bold_size as f32,
        }
    }

    /// A set without faces; every render is empty.
    pub fn empty() -> Self {
        let defaults = FontsConfig::default();
        Self::new(None, None, defaults.size, defaults.bold_size)
    }

    /// Load the configured faces, falling back to common system fonts.
    pub fn load(config: &FontsConfig) -> Self {
        let regular = find_font(config.regular.as_deref(), FALLBACK_REGULAR);
        let bold = find_font(config.bold.as_deref(), FALLBACK_BOLD);
        if regular.is_none() && bold.is_none() {
            log::warn!("No usable font found; watermark text will be empty");
        }
        Self::new(regular, bold, config.size, config.bold_size)
    }

    pub fn is_available(&self) -> bool {
        self.regular.is_some() || self.bold.is_some()
    }

    /// Rasterize `text` on a transparent background, cropped tight to the ink.
    ///
    /// Empty text, or no usable face, gives a 1x1 transparent image. Bold
    /// falls back to the regular face and vice versa.
    pub fn render(&self, text: &str, bold: bool, color: Rgba<u8>) -> RgbaImage {
        let (font, size) = if bold {
            (self.bold.as_ref().or(self.regular.as_ref()), self.bold_size)
        } else {
            (self.regular.as_ref().or(self.bold.as_ref()), self.size)
        };
        let Some(font) = font else {
            return blank();
        };
        if text.trim().is_empty() {
            return blank();
        }

        let scale = PxScale::from(size);
        let (w, h) = text_size(scale, font, text);
        // Headroom for glyphs that overhang their advance box
        let margin = (size / 4.0).ceil() as u32;
        let mut canvas = RgbaImage::new(w + 2 * margin, h + 2 * margin);
        draw_text_mut(
            &mut canvas,
            color,
            margin as i32,
            margin as i32,
            scale,
            font,
            text,
        );
        crop_to_content(&canvas)
    }
}

fn blank() -> RgbaImage {
    RgbaImage::new(1, 1)
}

/// Smallest sub-image containing every pixel with non-zero alpha.
fn crop_to_content(image: &RgbaImage) -> RgbaImage {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    match bounds {
        Some((x0, y0, x1, y1)) => {
            imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
        }
        None => blank(),
    }
}

// =============================================================================
// Logos
// =============================================================================

/// Brand logos keyed by lowercase file stem.
#[derive(Clone, Default)]
pub struct LogoLibrary {
    /// Longest key first, so `"leica"` wins over a shorter overlapping key.
    logos: Vec<(String, RgbaImage)>,
}

impl LogoLibrary {
    pub fn from_logos(logos: impl IntoIterator<Item = (String, RgbaImage)>) -> Self {
        let mut logos: Vec<(String, RgbaImage)> = logos
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        logos.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { logos }
    }

    /// Decode every PNG/JPEG in `dir`. Undecodable files are skipped.
    pub fn from_dir(dir: &Path) -> Result<Self, ResourceError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| matches!(e.to_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut logos = Vec::new();
        for path in paths {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            match image::open(&path) {
                Ok(img) => logos.push((stem, img.to_rgba8())),
                Err(e) => log::warn!(
                    "{}",
                    ResourceError::Logo(path.display().to_string(), e.to_string())
                ),
            }
        }
        Ok(Self::from_logos(logos))
    }

    /// Like [`from_dir`](Self::from_dir) but never fails: a missing directory
    /// is an empty library.
    pub fn load(dir: &Path) -> Self {
        match Self::from_dir(dir) {
            Ok(library) => {
                log::debug!("Loaded {} logos from {}", library.len(), dir.display());
                library
            }
            Err(e) => {
                log::warn!("No logos loaded from {}: {}", dir.display(), e);
                Self::default()
            }
        }
    }

    /// The logo whose name appears in the camera make, case-insensitively.
    pub fn lookup(&self, make: &str) -> Option<&RgbaImage> {
        let make = make.to_lowercase();
        self.logos
            .iter()
            .find(|(key, _)| make.contains(key.as_str()))
            .map(|(_, img)| img)
    }

    pub fn len(&self) -> usize {
        self.logos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logos.is_empty()
    }
}

// =============================================================================
// Render context
// =============================================================================

/// Everything effects may read besides the image: the loaded configuration,
/// fonts and logos. Built once per run, then shared behind an `Arc`.
#[derive(Clone)]
pub struct RenderContext {
    pub config: AppConfig,
    pub fonts: FontSet,
    pub logos: LogoLibrary,
}

impl RenderContext {
    pub fn new(config: AppConfig, fonts: FontSet, logos: LogoLibrary) -> Self {
        Self {
            config,
            fonts,
            logos,
        }
    }

    /// Load fonts and logos named by `config`.
    pub fn load(config: AppConfig) -> Self {
        let fonts = FontSet::load(&config.fonts);
        let logos = LogoLibrary::load(Path::new(&config.logos.dir));
        Self::new(config, fonts, logos)
    }

    /// Configuration only; text renders empty and no logo is found.
    pub fn without_resources(config: AppConfig) -> Self {
        Self::new(config, FontSet::empty(), LogoLibrary::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn system_fonts() -> FontSet {
        FontSet::load(&FontsConfig {
            size: 40,
            bold_size: 40,
            ..FontsConfig::default()
        })
    }

    #[test]
    fn empty_font_set_renders_blank() {
        let img = FontSet::empty().render("EOS R5", false, Rgba([0, 0, 0, 255]));
        assert_eq!(img.dimensions(), (1, 1));
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn render_is_tightly_cropped() {
        let fonts = system_fonts();
        if !fonts.is_available() {
            eprintln!("no system font, skipping");
            return;
        }
        let img = fonts.render("EOS R5", true, Rgba([33, 33, 33, 255]));
        assert!(img.width() > img.height());
        // Every edge row/column holds some ink
        let ink = |x: u32, y: u32| img.get_pixel(x, y)[3] > 0;
        assert!((0..img.width()).any(|x| ink(x, 0)));
        assert!((0..img.width()).any(|x| ink(x, img.height() - 1)));
        assert!((0..img.height()).any(|y| ink(0, y)));
        assert!((0..img.height()).any(|y| ink(img.width() - 1, y)));
    }

    #[test]
    fn render_empty_text_is_blank() {
        let img = system_fonts().render("", false, Rgba([0, 0, 0, 255]));
        assert_eq!(img.dimensions(), (1, 1));
    }

    #[test]
    fn missing_configured_font_falls_back() {
        let fonts = FontSet::load(&FontsConfig {
            regular: Some("/nonexistent/font.ttf".into()),
            ..FontsConfig::default()
        });
        // The system faces stand in for the missing file
        assert_eq!(fonts.is_available(), system_fonts().is_available());
        let img = fonts.render("x", false, Rgba([0, 0, 0, 255]));
        if fonts.is_available() {
            assert!(img.pixels().any(|p| p[3] > 0));
        } else {
            assert_eq!(img.dimensions(), (1, 1));
            assert_eq!(img.get_pixel(0, 0)[3], 0);
        }
    }

    #[test]
    fn crop_to_content_finds_bounds() {
        let mut img = RgbaImage::new(10, 10);
        img.put_pixel(2, 3, Rgba([1, 1, 1, 255]));
        img.put_pixel(6, 4, Rgba([1, 1, 1, 10]));
        assert_eq!(crop_to_content(&img).dimensions(), (5, 2));
        assert_eq!(crop_to_content(&RgbaImage::new(4, 4)).dimensions(), (1, 1));
    }

    // =========================================================================
    // Logos
    // =========================================================================

    #[test]
    fn logo_lookup_matches_make_substring() {
        let library = LogoLibrary::from_logos([
            ("Canon".to_string(), RgbaImage::new(3, 1)),
            ("nikon".to_string(), RgbaImage::new(5, 1)),
        ]);
        assert_eq!(library.lookup("Canon").map(|l| l.width()), Some(3));
        assert_eq!(library.lookup("NIKON CORPORATION").map(|l| l.width()), Some(5));
        assert!(library.lookup("SONY").is_none());
        assert!(library.lookup("N/A").is_none());
    }

    #[test]
    fn logo_lookup_prefers_longest_name() {
        let library = LogoLibrary::from_logos([
            ("fuji".to_string(), RgbaImage::new(1, 1)),
            ("fujifilm".to_string(), RgbaImage::new(2, 1)),
        ]);
        assert_eq!(library.lookup("FUJIFILM").map(|l| l.width()), Some(2));
    }

    #[test]
    fn logos_loaded_from_directory() {
        let tmp = TempDir::new().unwrap();
        RgbaImage::from_pixel(8, 4, Rgba([200, 0, 0, 255]))
            .save(tmp.path().join("leica.png"))
            .unwrap();
        fs::write(tmp.path().join("broken.png"), b"nope").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"ignored").unwrap();

        let library = LogoLibrary::from_dir(tmp.path()).unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.lookup("Leica Camera AG").unwrap().dimensions(), (8, 4));
    }

    #[test]
    fn missing_logo_dir_is_empty_library() {
        let library = LogoLibrary::load(Path::new("/nonexistent/logos"));
        assert!(library.is_empty());
        assert!(LogoLibrary::from_dir(Path::new("/nonexistent/logos")).is_err());
    }
}
