//! The metadata strip appended below a photo.
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                                                              |
//! |                           photo                              |
//! |                                                              |
//! +--------------------------------------------------------------+
//! | [logo]  EOS R5                          50mm  f/1.8  1/200s  |
//! |         Canon                               2024-05-01 10:30 |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Layout
//!
//! The strip is composed on a canvas [`STRIP_NORMAL_HEIGHT`] pixels high and
//! `floor(1000 / ratio)` wide, then scaled to the photo's width. `ratio` and
//! the text padding come from [`strip_ratios`]: portrait photos get a taller
//! strip so the text stays legible.
//!
//! Each corner renders one attribute of the container's metadata. The two
//! left corners stack into the left block, the two right corners into the
//! right block, with a small background-coloured gap between the lines. Both
//! blocks are padded to the same height so their text is vertically centred
//! against each other.
//!
//! Items are laid out in runs from either end of the canvas. Every item is
//! scaled to the canvas height and followed by a [`STRIP_GAP`]:
//!
//! | Logo | Left run | Right run |
//! |---|---|---|
//! | left, found | `line logo left` from x = 0 | `right`, ending at the right edge |
//! | left, missing | `line left`, inset by one gap | `right` |
//! | right | `left`, inset by one gap | `logo line right` (grey line only with a logo) |
//! | disabled | `left`, flush with the edge | `right` |
//!
//! [`plan_strip`] computes these placements without touching pixels.

use super::basic::pad_transparent;
use super::{Effect, EffectError};
use crate::config::{CornerStyle, LogoPosition, WatermarkConfig};
use crate::container::ImageContainer;
use crate::imaging::calculations::{
    Insets, STRIP_NORMAL_HEIGHT, StripRatios, scale_to_height, strip_canvas_width, strip_ratios,
};
use crate::imaging::color::{GRAY, TRANSPARENT};
use crate::imaging::operations::{flatten, overlay, resize_to_width, solid, stack_vertical};
use crate::imaging::parse_color;
use crate::metadata::{AttributeKey, MetadataRecord};
use crate::resources::RenderContext;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::sync::Arc;

/// Horizontal space after every item of a run, at canvas scale.
pub const STRIP_GAP: u32 = 200;

/// Width of the separator line at canvas scale.
const LINE_WIDTH: u32 = 20;

/// Background-coloured spacer between the two lines of a text block.
const TEXT_GAP: (u32, u32) = (10, 100);

/// Text of one strip corner.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerText {
    pub element: AttributeKey,
    pub color: Rgba<u8>,
    pub bold: bool,
    /// Shown for [`AttributeKey::Custom`]; empty falls back to the record's
    /// custom slot.
    pub text: String,
}

impl CornerText {
    pub fn from_style(style: &CornerStyle) -> Result<Self, EffectError> {
        Ok(Self {
            element: style.element,
            color: parse_color(&style.color)?,
            bold: style.bold,
            text: style.text.clone(),
        })
    }

    /// The string this corner displays for `record`.
    pub fn resolve(&self, record: &MetadataRecord) -> String {
        match self.element {
            AttributeKey::Custom if !self.text.is_empty() => self.text.clone(),
            key => record.get(key),
        }
    }
}

/// Colours, corner contents and logo policy of a strip.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkStyle {
    pub logo_position: LogoPosition,
    pub logo_enabled: bool,
    /// Logo file name to use; `None` picks it from the camera make.
    pub logo_name: Option<String>,
    pub background_color: Rgba<u8>,
    pub line_color: Rgba<u8>,
    pub left_top: CornerText,
    pub left_bottom: CornerText,
    pub right_top: CornerText,
    pub right_bottom: CornerText,
}

impl WatermarkStyle {
    pub fn from_config(config: &WatermarkConfig) -> Result<Self, EffectError> {
        Ok(Self {
            logo_position: config.logo_position,
            logo_enabled: config.logo_enabled,
            logo_name: None,
            background_color: parse_color(&config.background_color)?,
            line_color: parse_color(&config.line_color)?,
            left_top: CornerText::from_style(&config.left_top)?,
            left_bottom: CornerText::from_style(&config.left_bottom)?,
            right_top: CornerText::from_style(&config.right_top)?,
            right_bottom: CornerText::from_style(&config.right_bottom)?,
        })
    }

    /// Force a fixed palette: bold top lines in `top`, regular bottom lines
    /// in `bottom`, on `background`. The corner contents are kept.
    fn with_palette(
        mut self,
        background: &str,
        top: &str,
        bottom: &str,
    ) -> Result<Self, EffectError> {
        self.background_color = parse_color(background)?;
        self.line_color = GRAY;
        let (top, bottom) = (parse_color(top)?, parse_color(bottom)?);
        for corner in [&mut self.left_top, &mut self.right_top] {
            corner.color = top;
            corner.bold = true;
        }
        for corner in [&mut self.left_bottom, &mut self.right_bottom] {
            corner.color = bottom;
            corner.bold = false;
        }
        Ok(self)
    }
}

// =============================================================================
// Layout plan
// =============================================================================

/// What occupies a slot of the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripPart {
    /// Separator; invisible lines only reserve space.
    Line { visible: bool },
    Logo,
    Left,
    Right,
}

/// Where a part lands on the canvas, after scaling to the canvas height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub part: StripPart,
    pub x: i64,
    pub width: u32,
    pub height: u32,
}

/// Sizes the layout depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripInput {
    pub canvas: (u32, u32),
    pub padding_ratio: f64,
    pub logo_position: LogoPosition,
    pub logo_enabled: bool,
    /// Padded left block.
    pub left: (u32, u32),
    /// Padded right block.
    pub right: (u32, u32),
    /// Logo as loaded, before padding; `None` when no logo was found.
    pub logo: Option<(u32, u32)>,
}

/// Padding around the logo: `padding_ratio` of its height on every side.
fn logo_padding(logo_height: u32, padding_ratio: f64) -> u32 {
    (padding_ratio * logo_height as f64) as u32
}

/// Padding around the visible separator line.
fn line_padding(line_height: u32, padding_ratio: f64) -> u32 {
    (padding_ratio * line_height as f64 * 0.8) as u32
}

/// Unscaled size of a part.
fn part_size(part: StripPart, input: &StripInput) -> (u32, u32) {
    let line_height = input.canvas.1;
    match part {
        StripPart::Line { visible: false } => (LINE_WIDTH, line_height),
        StripPart::Line { visible: true } => {
            Insets::uniform(line_padding(line_height, input.padding_ratio))
                .apply_to((LINE_WIDTH, line_height))
        }
        StripPart::Logo => {
            let logo = input.logo.unwrap_or((1, 1));
            Insets::uniform(logo_padding(logo.1, input.padding_ratio)).apply_to(logo)
        }
        StripPart::Left => input.left,
        StripPart::Right => input.right,
    }
}

/// Lay a run out from the left edge.
fn place_from_left(parts: &[StripPart], inset: bool, input: &StripInput) -> Vec<Placement> {
    let height = input.canvas.1;
    let mut x = if inset { STRIP_GAP as i64 } else { 0 };
    parts
        .iter()
        .map(|&part| {
            let (width, height) = scale_to_height(part_size(part, input), height);
            let placement = Placement {
                part,
                x,
                width,
                height,
            };
            x += (width + STRIP_GAP) as i64;
            placement
        })
        .collect()
}

/// Lay a run out from the right edge; the last part touches the edge.
fn place_from_right(parts: &[StripPart], input: &StripInput) -> Vec<Placement> {
    let (canvas_width, height) = input.canvas;
    let mut x = canvas_width as i64;
    let mut placements: Vec<Placement> = parts
        .iter()
        .rev()
        .map(|&part| {
            let (width, height) = scale_to_height(part_size(part, input), height);
            x -= width as i64;
            let placement = Placement {
                part,
                x,
                width,
                height,
            };
            x -= STRIP_GAP as i64;
            placement
        })
        .collect();
    placements.reverse();
    placements
}

/// Compute every placement on the strip canvas, left to right.
pub fn plan_strip(input: &StripInput) -> Vec<Placement> {
    let has_logo = input.logo_enabled && input.logo.is_some();
    let (left_run, left_inset, right_run): (Vec<StripPart>, bool, Vec<StripPart>) =
        match (input.logo_enabled, input.logo_position) {
            (false, _) => (vec![StripPart::Left], false, vec![StripPart::Right]),
            (true, LogoPosition::Left) => {
                let mut run = vec![StripPart::Line { visible: false }];
                if has_logo {
                    run.push(StripPart::Logo);
                }
                run.push(StripPart::Left);
                (run, !has_logo, vec![StripPart::Right])
            }
            (true, LogoPosition::Right) => {
                let mut run = Vec::new();
                if has_logo {
                    run.push(StripPart::Logo);
                }
                run.push(StripPart::Line { visible: has_logo });
                run.push(StripPart::Right);
                (vec![StripPart::Left], true, run)
            }
        };

    let mut placements = place_from_left(&left_run, left_inset, input);
    placements.extend(place_from_right(&right_run, input));
    placements
}

// =============================================================================
// Effect
// =============================================================================

/// Appends the metadata strip below the image.
///
/// Needs both a container (metadata, source ratio) and a render context
/// (fonts, logos, padding level); either missing is a configuration error.
#[derive(Clone)]
pub struct WatermarkEffect {
    pub style: WatermarkStyle,
    context: Option<Arc<RenderContext>>,
}

impl WatermarkEffect {
    pub fn new(style: WatermarkStyle, context: Option<Arc<RenderContext>>) -> Self {
        Self { style, context }
    }

    /// Every setting taken from the `[watermark]` configuration.
    pub fn from_context(context: Arc<RenderContext>) -> Result<Self, EffectError> {
        let style = WatermarkStyle::from_config(&context.config.watermark)?;
        Ok(Self::new(style, Some(context)))
    }

    fn themed(
        context: Arc<RenderContext>,
        position: LogoPosition,
        palette: (&str, &str, &str),
    ) -> Result<Self, EffectError> {
        let mut style = WatermarkStyle::from_config(&context.config.watermark)?
            .with_palette(palette.0, palette.1, palette.2)?;
        style.logo_position = position;
        style.logo_enabled = true;
        Ok(Self::new(style, Some(context)))
    }

    /// Red and pale grey text on near-black.
    pub fn dark_theme(
        context: Arc<RenderContext>,
        position: LogoPosition,
    ) -> Result<Self, EffectError> {
        Self::themed(context, position, ("#212121", "#D32F2F", "#d4d1cc"))
    }

    /// Dark grey text on white.
    pub fn light_theme(
        context: Arc<RenderContext>,
        position: LogoPosition,
    ) -> Result<Self, EffectError> {
        Self::themed(context, position, ("#ffffff", "#212121", "#424242"))
    }

    pub fn red_theme(
        context: Arc<RenderContext>,
        position: LogoPosition,
    ) -> Result<Self, EffectError> {
        Self::themed(context, position, ("#ffffff", "#D32F2F", "#757575"))
    }

    pub fn blue_theme(
        context: Arc<RenderContext>,
        position: LogoPosition,
    ) -> Result<Self, EffectError> {
        Self::themed(context, position, ("#ffffff", "#1976D2", "#424242"))
    }

    fn text_block(
        &self,
        ctx: &RenderContext,
        record: &MetadataRecord,
        top: &CornerText,
        bottom: &CornerText,
    ) -> RgbaImage {
        let render = |corner: &CornerText| {
            ctx.fonts
                .render(&corner.resolve(record), corner.bold, corner.color)
        };
        let gap = solid(TEXT_GAP.0, TEXT_GAP.1, self.style.background_color);
        stack_vertical(&[&render(top), &gap, &render(bottom)])
    }

    /// Compose the strip at canvas scale.
    fn render_strip(
        &self,
        ctx: &RenderContext,
        container: &ImageContainer,
        ratios: StripRatios,
    ) -> RgbaImage {
        let record = container.metadata();
        let left = self.text_block(ctx, record, &self.style.left_top, &self.style.left_bottom);
        let right = self.text_block(ctx, record, &self.style.right_top, &self.style.right_bottom);

        let block_height = left.height().max(right.height());
        let block_padding = (block_height as f64 * ratios.padding_ratio) as u32;
        let left = pad_transparent(
            &left,
            Insets {
                top: block_padding,
                bottom: block_padding,
                ..Insets::default()
            },
        );
        let right = pad_transparent(
            &right,
            Insets {
                top: block_padding,
                ..Insets::default()
            },
        );
        let right = pad_transparent(
            &right,
            Insets {
                bottom: left.height().saturating_sub(right.height()),
                ..Insets::default()
            },
        );

        let logo = if self.style.logo_enabled {
            let found = match &self.style.logo_name {
                Some(name) => ctx.logos.lookup(name),
                None => ctx.logos.lookup(&record.make),
            };
            if found.is_none() {
                log::debug!("No logo for \"{}\", using the no-logo layout", record.make);
            }
            found
        } else {
            None
        };

        let input = StripInput {
            canvas: (strip_canvas_width(ratios.ratio), STRIP_NORMAL_HEIGHT),
            padding_ratio: ratios.padding_ratio,
            logo_position: self.style.logo_position,
            logo_enabled: self.style.logo_enabled,
            left: left.dimensions(),
            right: right.dimensions(),
            logo: logo.map(|l| l.dimensions()),
        };

        let mut canvas = solid(input.canvas.0, input.canvas.1, self.style.background_color);
        for placement in plan_strip(&input) {
            let item = match placement.part {
                StripPart::Left => left.clone(),
                StripPart::Right => right.clone(),
                StripPart::Logo => match logo {
                    Some(logo) => pad_transparent(
                        logo,
                        Insets::uniform(logo_padding(logo.height(), ratios.padding_ratio)),
                    ),
                    None => continue,
                },
                StripPart::Line { visible: true } => pad_transparent(
                    &solid(LINE_WIDTH, STRIP_NORMAL_HEIGHT, self.style.line_color),
                    Insets::uniform(line_padding(STRIP_NORMAL_HEIGHT, ratios.padding_ratio)),
                ),
                StripPart::Line { visible: false } => {
                    solid(LINE_WIDTH, STRIP_NORMAL_HEIGHT, TRANSPARENT)
                }
            };
            let item = if item.dimensions() == (placement.width, placement.height) {
                item
            } else {
                imageops::resize(&item, placement.width, placement.height, FilterType::Lanczos3)
            };
            imageops::replace(&mut canvas, &item, placement.x, 0);
        }
        canvas
    }
}

impl Effect for WatermarkEffect {
    fn name(&self) -> &str {
        "watermark"
    }

    fn apply(
        &self,
        image: &DynamicImage,
        container: Option<&ImageContainer>,
    ) -> Result<DynamicImage, EffectError> {
        let container = container.ok_or_else(|| {
            EffectError::Configuration("watermark needs an image container".into())
        })?;
        let ctx = self.context.as_deref().ok_or_else(|| {
            EffectError::Configuration("watermark needs a render context".into())
        })?;

        let ratios = strip_ratios(container.ratio(), ctx.config.watermark.font_padding_level);
        let strip = self.render_strip(ctx, container, ratios);

        let (width, height) = image.dimensions();
        let strip = resize_to_width(&strip, width);
        let mut canvas = solid(width, height + strip.height(), self.style.background_color);
        imageops::replace(&mut canvas, &image.to_rgba8(), 0, 0);
        overlay(&mut canvas, &strip, 0, height as i64);
        Ok(flatten(canvas))
    }
}
