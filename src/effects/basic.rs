//! Geometric effects: corners, shadow, padding bands, blurred backdrop.

use super::{Effect, EffectError};
use crate::container::ImageContainer;
use crate::imaging::calculations::{
    Insets, backdrop_layout, default_corner_radius, default_margin_thickness,
    default_shadow_radius, margin_thickness, ratio_insets, shadow_canvas_dimensions,
    square_insets,
};
use crate::imaging::color::{TRANSPARENT, WHITE};
use crate::imaging::operations::{
    apply_alpha_mask, blend_toward_white, flatten, overlay, pad, pad_rgba, rounded_mask, solid,
};
use crate::imaging::{Sides, parse_color};
use crate::resources::RenderContext;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba};
use std::sync::Arc;

/// Default drop-shadow colour.
pub const SHADOW_COLOR: &str = "#6B696A";

// =============================================================================
// Rounded corners
// =============================================================================

/// Cuts the corners into quarter circles; the cut-away area becomes transparent.
#[derive(Debug, Clone, Default)]
pub struct RoundedCornerEffect {
    /// `None` = a tenth of the shorter edge.
    pub radius: Option<u32>,
}

impl RoundedCornerEffect {
    pub fn new(radius: Option<u32>) -> Self {
        Self { radius }
    }
}

impl Effect for RoundedCornerEffect {
    fn name(&self) -> &str {
        "rounded_corner"
    }

    fn apply(
        &self,
        image: &DynamicImage,
        _container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError> {
        let (w, h) = image.dimensions();
        let radius = self.radius.unwrap_or_else(|| default_corner_radius((w, h)));
        let mask = rounded_mask(w, h, radius);
        Ok(DynamicImage::ImageRgba8(apply_alpha_mask(image, &mask)))
    }
}

// =============================================================================
// Shadow
// =============================================================================

/// Soft drop shadow towards the bottom right on a white canvas.
#[derive(Debug, Clone)]
pub struct ShadowEffect {
    /// `None` = the longer edge over 512.
    pub radius: Option<u32>,
    pub color: Rgba<u8>,
}

impl ShadowEffect {
    pub fn new(radius: Option<u32>, color: &str) -> Result<Self, EffectError> {
        Ok(Self {
            radius,
            color: parse_color(color)?,
        })
    }
}

impl Default for ShadowEffect {
    fn default() -> Self {
        Self {
            radius: None,
            color: Rgba([0x6b, 0x69, 0x6a, 255]),
        }
    }
}

impl Effect for ShadowEffect {
    fn name(&self) -> &str {
        "shadow"
    }

    fn apply(
        &self,
        image: &DynamicImage,
        _container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError> {
        let (w, h) = image.dimensions();
        let r = self.radius.unwrap_or_else(|| default_shadow_radius((w, h)));

        let plate = pad_rgba(&solid(w, h, self.color), Insets::uniform(2 * r), WHITE);
        debug_assert_eq!(plate.dimensions(), shadow_canvas_dimensions((w, h), r));
        let mut canvas = if r > 0 {
            DynamicImage::ImageRgba8(plate).fast_blur(r as f32).to_rgba8()
        } else {
            plate
        };
        overlay(&mut canvas, &image.to_rgba8(), r as i64, r as i64);
        Ok(flatten(canvas))
    }
}

// =============================================================================
// Margin and border
// =============================================================================

/// Thickness of a padding band when none is given explicitly.
fn band_thickness(
    image: &DynamicImage,
    context: Option<&RenderContext>,
    container: Option<&ImageContainer>,
) -> u32 {
    match (context, container) {
        (Some(ctx), Some(container)) => margin_thickness(
            (container.width(), container.height()),
            ctx.config.watermark.white_margin_width,
        ),
        _ => default_margin_thickness(image.dimensions()),
    }
}

fn apply_band(
    image: &DynamicImage,
    size: Option<u32>,
    sides: Sides,
    color: Rgba<u8>,
    context: Option<&RenderContext>,
    container: Option<&ImageContainer>,
) -> DynamicImage {
    let thickness = size.unwrap_or_else(|| band_thickness(image, context, container));
    let insets = Insets::on_sides(sides, thickness);
    if insets.is_empty() {
        return image.clone();
    }
    pad(image, insets, color)
}

/// White band on top, left and right: the photo "sits" on whatever follows.
#[derive(Clone)]
pub struct MarginEffect {
    pub size: Option<u32>,
    pub color: Rgba<u8>,
    pub sides: Sides,
    pub context: Option<Arc<RenderContext>>,
}

impl MarginEffect {
    pub fn new(context: Option<Arc<RenderContext>>) -> Self {
        Self {
            size: None,
            color: WHITE,
            sides: Sides::OPEN_BOTTOM,
            context,
        }
    }

    pub fn with_sides(mut self, sides: Sides) -> Self {
        self.sides = sides;
        self
    }
}

impl Effect for MarginEffect {
    fn name(&self) -> &str {
        "margin"
    }

    fn apply(
        &self,
        image: &DynamicImage,
        container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError> {
        Ok(apply_band(
            image,
            self.size,
            self.sides,
            self.color,
            self.context.as_deref(),
            container,
        ))
    }
}

/// Solid frame, all four sides unless told otherwise.
#[derive(Clone)]
pub struct BorderEffect {
    pub size: Option<u32>,
    pub color: Rgba<u8>,
    pub sides: Sides,
    pub context: Option<Arc<RenderContext>>,
}

impl BorderEffect {
    pub fn new(size: Option<u32>, color: &str, sides: Sides) -> Result<Self, EffectError> {
        Ok(Self {
            size,
            color: parse_color(color)?,
            sides,
            context: None,
        })
    }

    pub fn with_context(mut self, context: Arc<RenderContext>) -> Self {
        self.context = Some(context);
        self
    }
}

impl Default for BorderEffect {
    fn default() -> Self {
        Self {
            size: None,
            color: WHITE,
            sides: Sides::ALL,
            context: None,
        }
    }
}

impl Effect for BorderEffect {
    fn name(&self) -> &str {
        "border"
    }

    fn apply(
        &self,
        image: &DynamicImage,
        container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError> {
        Ok(apply_band(
            image,
            self.size,
            self.sides,
            self.color,
            self.context.as_deref(),
            container,
        ))
    }
}

// =============================================================================
// Background blur
// =============================================================================

/// The photo on a bigger, blurred and lightened copy of itself.
#[derive(Debug, Clone)]
pub struct BackgroundBlurEffect {
    /// Gaussian sigma in pixels.
    pub radius: u32,
    /// Extra backdrop size as a fraction of the image, in `(0, 1]`.
    pub padding_percent: f64,
    /// How far the backdrop is pulled towards white, in `[0, 1]`.
    pub blend_alpha: f64,
}

impl BackgroundBlurEffect {
    pub fn new(radius: u32, padding_percent: f64, blend_alpha: f64) -> Result<Self, EffectError> {
        if !(padding_percent > 0.0 && padding_percent <= 1.0) {
            return Err(EffectError::Configuration(format!(
                "blur padding_percent must be in (0, 1], got {padding_percent}"
            )));
        }
        if !(0.0..=1.0).contains(&blend_alpha) {
            return Err(EffectError::Configuration(format!(
                "blur blend_alpha must be in [0, 1], got {blend_alpha}"
            )));
        }
        Ok(Self {
            radius,
            padding_percent,
            blend_alpha,
        })
    }
}

impl Default for BackgroundBlurEffect {
    fn default() -> Self {
        Self {
            radius: 35,
            padding_percent: 0.15,
            blend_alpha: 0.1,
        }
    }
}

impl Effect for BackgroundBlurEffect {
    fn name(&self) -> &str {
        "background_blur"
    }

    fn apply(
        &self,
        image: &DynamicImage,
        _container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError> {
        let layout = backdrop_layout(image.dimensions(), self.padding_percent);

        let mut backdrop = if self.radius > 0 {
            image.fast_blur(self.radius as f32).to_rgba8()
        } else {
            image.to_rgba8()
        };
        blend_toward_white(&mut backdrop, self.blend_alpha);
        let mut canvas = imageops::resize(
            &backdrop,
            layout.width,
            layout.height,
            FilterType::Triangle,
        );
        drop(backdrop);

        overlay(
            &mut canvas,
            &image.to_rgba8(),
            layout.offset_x as i64,
            layout.offset_y as i64,
        );
        Ok(flatten(canvas))
    }
}

// =============================================================================
// Aspect-ratio padding
// =============================================================================

/// White padding to a 1:1 canvas, the photo centred.
#[derive(Debug, Clone)]
pub struct SquareEffect {
    pub color: Rgba<u8>,
}

impl Default for SquareEffect {
    fn default() -> Self {
        Self { color: WHITE }
    }
}

impl Effect for SquareEffect {
    fn name(&self) -> &str {
        "square"
    }

    fn apply(
        &self,
        image: &DynamicImage,
        _container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError> {
        let insets = square_insets(image.dimensions());
        if insets.is_empty() {
            return Ok(image.clone());
        }
        Ok(pad(image, insets, self.color))
    }
}

/// Pads the short dimension until the image reaches a target ratio.
///
/// Without a target the container's source ratio is used, which undoes the
/// shape change of earlier effects such as a watermark strip.
#[derive(Debug, Clone)]
pub struct RatioPadEffect {
    /// Width over height.
    pub target: Option<f64>,
    pub color: Rgba<u8>,
}

impl RatioPadEffect {
    pub fn new(target: Option<f64>) -> Result<Self, EffectError> {
        if let Some(t) = target
            && !(t.is_finite() && t > 0.0)
        {
            return Err(EffectError::Configuration(format!(
                "target ratio must be positive, got {t}"
            )));
        }
        Ok(Self {
            target,
            color: WHITE,
        })
    }
}

impl Effect for RatioPadEffect {
    fn name(&self) -> &str {
        "ratio_pad"
    }

    fn apply(
        &self,
        image: &DynamicImage,
        container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError> {
        let Some(target) = self.target.or_else(|| container.map(ImageContainer::ratio)) else {
            log::debug!("ratio_pad: no target ratio and no container, leaving image as is");
            return Ok(image.clone());
        };
        match ratio_insets(image.dimensions(), target) {
            Some(insets) => Ok(pad(image, insets, self.color)),
            None => Ok(image.clone()),
        }
    }
}

/// Transparent padding, used for strip items.
pub(crate) fn pad_transparent(image: &image::RgbaImage, insets: Insets) -> image::RgbaImage {
    pad_rgba(image, insets, TRANSPARENT)
}
