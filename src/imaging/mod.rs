//! Raster work in pure Rust, no external tools.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` crate codecs, JPEG quality + JFIF density |
//! | **Camera tags** | `kamadak-exif` |
//! | **EXIF pass-through** | `img-parts` |
//! | **Resize** | Lanczos3 |
//! | **Blur** | `DynamicImage::fast_blur` (box approximation of gaussian) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality, sides, density, save options
//! - **Colour**: configuration colour strings
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Raster primitives the effects are assembled from

pub mod backend;
pub mod calculations;
pub mod color;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, RawMetadata};
pub use color::{ColorError, parse_color};
pub use params::{Density, Quality, SaveOptions, Sides};
pub use rust_backend::{RustBackend, supported_input_extensions};
