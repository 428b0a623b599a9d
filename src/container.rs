//! The per-image container effects operate on.
//!
//! An [`ImageContainer`] owns everything known about one photo while it moves
//! through a processor chain:
//!
//! - the **source** raster, decoded once and rotated upright at load time;
//! - the **working** raster, created lazily from the source the first time
//!   something asks to modify it, then replaced by every processor;
//! - the [`MetadataRecord`], the source path, the EXIF orientation, the pixel
//!   density and the raw EXIF payload for pass-through on save.
//!
//! Effects receive `&ImageContainer` and therefore cannot touch the source.
//! Replacing the working raster with [`ImageContainer::update_working`] drops
//! the previous one on the spot, so at most two full-resolution rasters are
//! alive per container at any time.
//!
//! Saving undoes the orientation fix so the pixels agree with the orientation
//! tag carried over in the EXIF payload.

use crate::imaging::{BackendError, Density, ImageBackend, Quality, SaveOptions};
use crate::metadata::{MetadataRecord, Orientation};
use image::DynamicImage;
use std::path::{Path, PathBuf};

pub struct ImageContainer {
    path: PathBuf,
    source: DynamicImage,
    working: Option<DynamicImage>,
    metadata: MetadataRecord,
    density: Option<Density>,
    exif: Option<Vec<u8>>,
}

impl ImageContainer {
    /// Decode `path`, read its metadata and rotate it upright.
    pub fn open(
        path: &Path,
        backend: &impl ImageBackend,
        use_equivalent_focal_length: bool,
    ) -> Result<Self, BackendError> {
        let decoded = backend.decode(path)?;
        let raw = backend.read_metadata(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let metadata = MetadataRecord::from_raw(
            &raw,
            &stem,
            (decoded.width(), decoded.height()),
            use_equivalent_focal_length,
        );
        let density = parse_density(raw.get("XResolution"), raw.get("YResolution"));

        log::debug!(
            "Opened {} ({}x{}, {:?})",
            path.display(),
            decoded.width(),
            decoded.height(),
            metadata.orientation
        );

        Ok(Self {
            path: path.to_path_buf(),
            source: upright(decoded, metadata.orientation),
            working: None,
            density,
            exif: backend.read_exif_blob(path),
            metadata,
        })
    }

    /// Assemble a container from an already-upright raster.
    pub fn from_parts(
        path: impl Into<PathBuf>,
        source: DynamicImage,
        metadata: MetadataRecord,
    ) -> Self {
        Self {
            path: path.into(),
            source,
            working: None,
            metadata,
            density: None,
            exif: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &MetadataRecord {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataRecord {
        &mut self.metadata
    }

    pub fn orientation(&self) -> Orientation {
        self.metadata.orientation
    }

    pub fn density(&self) -> Option<Density> {
        self.density
    }

    /// The untouched, upright source raster.
    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    /// The image a processor should start from: the working raster once one
    /// exists, else the source.
    pub fn current(&self) -> &DynamicImage {
        self.working.as_ref().unwrap_or(&self.source)
    }

    /// The working raster, cloned from the source on first access.
    pub fn working_mut(&mut self) -> &mut DynamicImage {
        self.working.get_or_insert_with(|| self.source.clone())
    }

    /// Install a new working raster. The previous one is dropped here.
    pub fn update_working(&mut self, image: DynamicImage) {
        self.working = Some(image);
    }

    pub fn has_working(&self) -> bool {
        self.working.is_some()
    }

    pub fn width(&self) -> u32 {
        self.current().width()
    }

    pub fn height(&self) -> u32 {
        self.current().height()
    }

    /// Width over height of the source raster.
    pub fn ratio(&self) -> f64 {
        self.source.width() as f64 / self.source.height().max(1) as f64
    }

    /// Encode the current image to `target`.
    ///
    /// The orientation fix is reversed, alpha is dropped, and the source's
    /// density and EXIF payload are carried over.
    pub fn save(
        &self,
        backend: &impl ImageBackend,
        target: &Path,
        quality: Quality,
    ) -> Result<(), BackendError> {
        let restored = restore_orientation(self.current(), self.orientation());
        let image = restored.as_ref().unwrap_or(self.current());
        let rgb;
        let image = if matches!(image, DynamicImage::ImageRgb8(_)) {
            image
        } else {
            rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            &rgb
        };

        backend.save(
            image,
            target,
            &SaveOptions {
                quality,
                density: self.density,
                exif: self.exif.clone(),
            },
        )
    }

    /// Release both rasters.
    pub fn close(self) {}
}

fn upright(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => image,
        Orientation::Rotate90Cw => image.rotate90(),
        Orientation::Rotate180 => image.rotate180(),
        Orientation::Rotate270Cw => image.rotate270(),
    }
}

/// Inverse of [`upright`]; `None` when no rotation is needed.
fn restore_orientation(image: &DynamicImage, orientation: Orientation) -> Option<DynamicImage> {
    match orientation {
        Orientation::Normal => None,
        Orientation::Rotate90Cw => Some(image.rotate270()),
        Orientation::Rotate180 => Some(image.rotate180()),
        Orientation::Rotate270Cw => Some(image.rotate90()),
    }
}

fn parse_density(x: Option<&String>, y: Option<&String>) -> Option<Density> {
    let dpi = |v: &String| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|d| *d >= 1.0 && *d <= u16::MAX as f64)
            .map(|d| d.round() as u16)
    };
    let x = dpi(x?)?;
    let y = y.and_then(dpi).unwrap_or(x);
    Some(Density { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    /// 4x2 grey image with a red marker in the top-left corner.
    fn marked_image() -> DynamicImage {
        let mut img = RgbImage::from_pixel(4, 2, Rgb([128, 128, 128]));
        img.put_pixel(0, 0, RED);
        DynamicImage::ImageRgb8(img)
    }

    fn open_with_orientation(tag: &str) -> (MockBackend, ImageContainer) {
        let backend = MockBackend::new().with_image(
            "/in/photo.jpg",
            marked_image(),
            &[("Orientation", tag), ("Make", "Canon")],
        );
        let container = ImageContainer::open(Path::new("/in/photo.jpg"), &backend, true).unwrap();
        (backend, container)
    }

    // =========================================================================
    // Orientation
    // =========================================================================

    #[test]
    fn orientation_round_trip_for_every_rotation() {
        for (tag, upright_dims) in [("1", (4, 2)), ("6", (2, 4)), ("3", (4, 2)), ("8", (2, 4))] {
            let (backend, container) = open_with_orientation(tag);
            assert_eq!(container.source().dimensions(), upright_dims, "tag {tag}");

            container
                .save(&backend, Path::new("/out/photo.jpg"), Quality::default())
                .unwrap();
            let saved = &backend.saved_images()[0].image;
            assert_eq!(saved.dimensions(), (4, 2), "tag {tag}");
            assert_eq!(saved.to_rgb8().get_pixel(0, 0), &RED, "tag {tag}");
        }
    }

    #[test]
    fn rotate_90_cw_moves_marker_to_top_right() {
        let (_, container) = open_with_orientation("Rotate 90 CW");
        // Top-left of the stored image is top-right once turned upright
        assert_eq!(container.source().to_rgb8().get_pixel(1, 0), &RED);
    }

    #[test]
    fn save_restores_orientation_of_working_image() {
        let (backend, mut container) = open_with_orientation("6");
        let grown = crate::imaging::operations::pad(
            container.current(),
            crate::imaging::calculations::Insets {
                bottom: 3,
                ..Default::default()
            },
            Rgba([0, 0, 0, 255]),
        );
        container.update_working(grown);
        assert_eq!((container.width(), container.height()), (2, 7));

        container
            .save(&backend, Path::new("/out/photo.jpg"), Quality::default())
            .unwrap();
        // The band added below the upright image ends up on the stored left edge
        assert_eq!(backend.saved_images()[0].image.dimensions(), (7, 2));
    }

    // =========================================================================
    // Working raster
    // =========================================================================

    #[test]
    fn dimensions_follow_working_raster() {
        let (_, mut container) = open_with_orientation("1");
        assert!(!container.has_working());
        assert_eq!((container.width(), container.height()), (4, 2));

        container.update_working(DynamicImage::new_rgb8(10, 3));
        assert_eq!((container.width(), container.height()), (10, 3));
        // Ratio stays on the source
        assert!((container.ratio() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn working_mut_clones_source_lazily() {
        let (_, mut container) = open_with_orientation("1");
        container.working_mut().as_mut_rgb8().unwrap().put_pixel(1, 1, RED);
        assert!(container.has_working());
        assert_eq!(container.current().to_rgb8().get_pixel(1, 1), &RED);
        assert_ne!(container.source().to_rgb8().get_pixel(1, 1), &RED);
    }

    #[test]
    fn save_without_effects_writes_source() {
        let (backend, container) = open_with_orientation("1");
        container
            .save(&backend, Path::new("/out/photo.jpg"), Quality::new(80))
            .unwrap();
        let saved = backend.saved_images();
        assert_eq!(saved[0].options.quality.value(), 80);
        assert_eq!(saved[0].image.dimensions(), (4, 2));
    }

    #[test]
    fn save_drops_alpha() {
        let (backend, mut container) = open_with_orientation("1");
        container.update_working(DynamicImage::ImageRgba8(RgbaImage::new(3, 3)));
        container
            .save(&backend, Path::new("/out/photo.png"), Quality::default())
            .unwrap();
        assert!(!backend.saved_images()[0].image.color().has_alpha());
    }

    #[test]
    fn metadata_built_from_backend_tags() {
        let (backend, container) = open_with_orientation("1");
        assert_eq!(container.metadata().make, "Canon");
        assert_eq!(container.metadata().filename, "photo");
        assert_eq!(
            backend.get_operations()[..2],
            [
                crate::imaging::backend::tests::RecordedOp::Decode("/in/photo.jpg".into()),
                crate::imaging::backend::tests::RecordedOp::ReadMetadata("/in/photo.jpg".into()),
            ]
        );
    }

    #[test]
    fn density_parsed_from_resolution_tags() {
        let backend = MockBackend::new().with_image(
            "/in/a.jpg",
            DynamicImage::new_rgb8(2, 2),
            &[("XResolution", "300"), ("YResolution", "240")],
        );
        let container = ImageContainer::open(Path::new("/in/a.jpg"), &backend, true).unwrap();
        assert_eq!(container.density(), Some(Density { x: 300, y: 240 }));

        container
            .save(&backend, Path::new("/out/a.jpg"), Quality::default())
            .unwrap();
        assert_eq!(
            backend.saved_images()[0].options.density,
            Some(Density { x: 300, y: 240 })
        );
    }

    #[test]
    fn open_missing_file_errors() {
        let backend = MockBackend::new();
        assert!(ImageContainer::open(Path::new("/in/none.jpg"), &backend, true).is_err());
    }
}
