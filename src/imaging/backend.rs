//! Raster codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations the pipeline needs
//! from the outside world: decode, read_metadata, read_exif_blob and save.
//! Effects never touch files; only the container and the batch loop talk to
//! a backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): the `image` crate for
//! pixels, kamadak-exif for tags, img-parts for EXIF pass-through.

use super::params::SaveOptions;
use image::DynamicImage;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Flat tag dictionary as produced by the metadata reader.
///
/// Keys follow exiftool's field names (`Make`, `CameraModelName`,
/// `FocalLength`, ...), values are already stringified. Missing tags are
/// simply absent.
pub type RawMetadata = HashMap<String, String>;

/// Trait for raster codec backends.
///
/// `Sync` so one backend can serve every rayon worker in a batch.
pub trait ImageBackend: Sync {
    /// Decode an image file into memory, exactly as stored (no orientation fix).
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Read embedded camera metadata. Files without EXIF yield an empty map.
    fn read_metadata(&self, path: &Path) -> Result<RawMetadata, BackendError>;

    /// Raw EXIF payload of the file, for pass-through on save.
    fn read_exif_blob(&self, path: &Path) -> Option<Vec<u8>>;

    /// Encode `image` to `path`; the format follows the file extension.
    fn save(
        &self,
        image: &DynamicImage,
        path: &Path,
        options: &SaveOptions,
    ) -> Result<(), BackendError>;
}
