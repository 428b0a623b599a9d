//! Image effects: one transformation each, `image in, image out`.
//!
//! Every effect implements [`Effect`]. The input raster is borrowed and never
//! modified; the effect returns a fresh raster the caller takes ownership of.
//! Intermediates (masks, blurred copies, padding canvases) live only inside
//! `apply`.
//!
//! | Effect | Needs container | Output |
//! |---|---|---|
//! | [`RoundedCornerEffect`] | no | RGBA, transparent corners |
//! | [`ShadowEffect`] | no | RGB, `(W+4r) x (H+4r)` |
//! | [`MarginEffect`] / [`BorderEffect`] | optional (configured width) | padded |
//! | [`BackgroundBlurEffect`] | no | RGB, `round(W(1+p)) x round(H(1+p))` |
//! | [`SquareEffect`] / [`RatioPadEffect`] | optional (source ratio) | padded |
//! | [`WatermarkEffect`] | **yes** | RGB, strip below the photo |
//! | [`CompositeEffect`] | passed through | whatever the last member returns |

mod basic;
pub mod watermark;

pub use basic::{
    BackgroundBlurEffect, BorderEffect, MarginEffect, RatioPadEffect, RoundedCornerEffect,
    ShadowEffect, SquareEffect,
};
pub use watermark::{WatermarkEffect, WatermarkStyle};

use crate::container::ImageContainer;
use crate::imaging::ColorError;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EffectError {
    /// A required collaborator is missing or a parameter is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Processing failed: {0}")]
    Processing(String),
}

impl From<ColorError> for EffectError {
    fn from(e: ColorError) -> Self {
        EffectError::Configuration(e.to_string())
    }
}

/// A single image transformation.
///
/// `Send + Sync` so one chain can serve every worker of a batch.
pub trait Effect: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn apply(
        &self,
        image: &DynamicImage,
        container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError>;
}

/// Ordered list of effects applied as one.
///
/// Each member receives the previous member's output; the container is
/// passed to all of them unchanged.
#[derive(Default)]
pub struct CompositeEffect {
    effects: Vec<Box<dyn Effect>>,
}

impl CompositeEffect {
    pub fn new(effects: Vec<Box<dyn Effect>>) -> Self {
        Self { effects }
    }

    pub fn push(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Effect for CompositeEffect {
    fn name(&self) -> &str {
        "composite"
    }

    fn apply(
        &self,
        image: &DynamicImage,
        container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError> {
        let mut effects = self.effects.iter();
        let Some(first) = effects.next() else {
            return Ok(image.clone());
        };
        let mut current = first.apply(image, container)?;
        for effect in effects {
            // The previous intermediate is dropped on reassignment
            current = effect.apply(&current, container)?;
        }
        Ok(current)
    }
}
