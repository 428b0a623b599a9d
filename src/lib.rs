//! # exif-frame
//!
//! Batch photo framing. Every image in a directory runs through an ordered
//! chain of processors (rounded corners, shadows, blurred backdrops, padding
//! to a ratio, and a watermark strip built from the photo's EXIF data) and
//! is written back out with its orientation, pixel density and EXIF intact.
//!
//! # Pipeline
//!
//! ```text
//! scan        input dir   ->  image paths
//! open        path        ->  ImageContainer (upright source, metadata record)
//! process     container   ->  ProcessorChain, one effect after another
//! save        container   ->  output file (original orientation, RGB, EXIF)
//! ```
//!
//! Files are independent: [`batch`] runs them in parallel on a rayon pool and
//! reports failures per file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`metadata`] | Camera metadata record and display attributes (`param`, `datetime`, ...) |
//! | [`container`] | One image in flight: source, working raster, metadata, orientation |
//! | [`effects`] | Image transformations, including the [`effects::watermark`] strip |
//! | [`processor`] | Processors, chains, configurable processors, built-in presets |
//! | [`processor_config`] | Serializable processor descriptions and their JSON form |
//! | [`store`] | Directory of stored processor configs |
//! | [`resources`] | Fonts, logos and the shared render context |
//! | [`imaging`] | Codec backend, EXIF reading, pixel operations, geometry |
//! | [`batch`] | Parallel batch loop and its progress events |
//! | [`scan`] | Input discovery |
//! | [`config`] | `config.toml` loading, defaults and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Borrowed input, owned output
//!
//! Effects take `&DynamicImage` and return a new image. The container owns
//! the working raster and drops the previous one when a processor installs
//! its result, so at most two full-size rasters per file are alive at once.
//!
//! ## Closed parameter set
//!
//! A stored processor is one of four parameter variants. The JSON `category`
//! tag is derived from the variant on write and checked on read, so a config
//! cannot claim one category and carry another's parameters.
//!
//! ## Pure-Rust imaging
//!
//! Decoding, encoding, EXIF reading and EXIF carry-through use the `image`,
//! `kamadak-exif` and `img-parts` crates; text is drawn with `imageproc`. No
//! external tools are needed at runtime.

pub mod batch;
pub mod config;
pub mod container;
pub mod effects;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod processor;
pub mod processor_config;
pub mod resources;
pub mod scan;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
