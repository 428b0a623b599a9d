//! Preset processors addressed by fixed ids.
//!
//! | Id | Effects |
//! |---|---|
//! | `rounded_corner` | rounded corners |
//! | `rounded_corner_blur` | rounded corners, blurred backdrop |
//! | `rounded_corner_blur_shadow` | rounded corners, blurred backdrop, shadow |
//! | `rounded_corner_blur_watermark` | rounded corners, blurred backdrop, configured strip |
//! | `background_blur` | blurred backdrop |
//! | `background_blur_with_white_border` | blurred backdrop, white border |
//! | `shadow` | drop shadow |
//! | `margin` | white margin, bottom open |
//! | `pure_white_margin` | white margin on all sides |
//! | `square` | pad to 1:1 |
//! | `padding_to_original_ratio` | pad back to the source ratio |
//! | `watermark_left_logo` / `watermark_right_logo` | configured strip, logo on that side |
//! | `{dark,light,red,blue}_watermark_left_logo` | themed strip, logo left |
//! | `dark_watermark_right_logo` | themed strip, logo right |
//! | `configurable_watermark` | strip exactly as configured |
//!
//! Widths of margins and borders follow `watermark.white_margin_width` from
//! the configuration.

use super::Processor;
use crate::config::LogoPosition;
use crate::effects::{
    BackgroundBlurEffect, BorderEffect, CompositeEffect, Effect, EffectError, MarginEffect,
    RatioPadEffect, RoundedCornerEffect, ShadowEffect, SquareEffect, WatermarkEffect,
};
use crate::imaging::Sides;
use crate::resources::RenderContext;
use std::sync::Arc;

/// Every built-in id with its display name.
pub const BUILTINS: &[(&str, &str)] = &[
    ("rounded_corner", "Rounded corners"),
    ("rounded_corner_blur", "Rounded corners + blur"),
    ("rounded_corner_blur_shadow", "Rounded corners + blur + shadow"),
    ("rounded_corner_blur_watermark", "Rounded corners + blur + watermark"),
    ("background_blur", "Background blur"),
    ("background_blur_with_white_border", "Background blur + white border"),
    ("shadow", "Shadow"),
    ("margin", "Margin"),
    ("pure_white_margin", "Pure white margin"),
    ("square", "Square"),
    ("padding_to_original_ratio", "Pad to original ratio"),
    ("watermark_left_logo", "Watermark, logo left"),
    ("watermark_right_logo", "Watermark, logo right"),
    ("dark_watermark_left_logo", "Dark watermark, logo left"),
    ("dark_watermark_right_logo", "Dark watermark, logo right"),
    ("light_watermark_left_logo", "Light watermark, logo left"),
    ("red_watermark_left_logo", "Red watermark, logo left"),
    ("blue_watermark_left_logo", "Blue watermark, logo left"),
    ("configurable_watermark", "Configured watermark"),
];

pub fn is_builtin(id: &str) -> bool {
    BUILTINS.iter().any(|(builtin, _)| *builtin == id)
}

fn composite(effects: Vec<Box<dyn Effect>>) -> Box<dyn Effect> {
    Box::new(CompositeEffect::new(effects))
}

/// Configured strip with the logo forced on at `position`.
fn watermark_at(
    context: &Arc<RenderContext>,
    position: LogoPosition,
) -> Result<WatermarkEffect, EffectError> {
    let mut effect = WatermarkEffect::from_context(Arc::clone(context))?;
    effect.style.logo_position = position;
    effect.style.logo_enabled = true;
    Ok(effect)
}

/// The preset for `id`, or `None` when `id` is not a built-in.
pub fn resolve(id: &str, context: &Arc<RenderContext>) -> Result<Option<Processor>, EffectError> {
    let Some(&(id, name)) = BUILTINS.iter().find(|(builtin, _)| *builtin == id) else {
        return Ok(None);
    };
    let ctx = || Arc::clone(context);

    let effect: Box<dyn Effect> = match id {
        "rounded_corner" => Box::new(RoundedCornerEffect::default()),
        "rounded_corner_blur" => composite(vec![
            Box::new(RoundedCornerEffect::default()),
            Box::new(BackgroundBlurEffect::default()),
        ]),
        "rounded_corner_blur_shadow" => composite(vec![
            Box::new(RoundedCornerEffect::default()),
            Box::new(BackgroundBlurEffect::default()),
            Box::new(ShadowEffect::default()),
        ]),
        "rounded_corner_blur_watermark" => composite(vec![
            Box::new(RoundedCornerEffect::default()),
            Box::new(BackgroundBlurEffect::default()),
            Box::new(WatermarkEffect::from_context(ctx())?),
        ]),
        "background_blur" => Box::new(BackgroundBlurEffect::default()),
        "background_blur_with_white_border" => composite(vec![
            Box::new(BackgroundBlurEffect::default()),
            Box::new(BorderEffect::default().with_context(ctx())),
        ]),
        "shadow" => Box::new(ShadowEffect::default()),
        "margin" => Box::new(MarginEffect::new(Some(ctx()))),
        "pure_white_margin" => Box::new(MarginEffect::new(Some(ctx())).with_sides(Sides::ALL)),
        "square" => Box::new(SquareEffect::default()),
        "padding_to_original_ratio" => Box::new(RatioPadEffect::new(None)?),
        "watermark_left_logo" => Box::new(watermark_at(context, LogoPosition::Left)?),
        "watermark_right_logo" => Box::new(watermark_at(context, LogoPosition::Right)?),
        "dark_watermark_left_logo" => {
            Box::new(WatermarkEffect::dark_theme(ctx(), LogoPosition::Left)?)
        }
        "dark_watermark_right_logo" => {
            Box::new(WatermarkEffect::dark_theme(ctx(), LogoPosition::Right)?)
        }
        "light_watermark_left_logo" => {
            Box::new(WatermarkEffect::light_theme(ctx(), LogoPosition::Left)?)
        }
        "red_watermark_left_logo" => {
            Box::new(WatermarkEffect::red_theme(ctx(), LogoPosition::Left)?)
        }
        "blue_watermark_left_logo" => {
            Box::new(WatermarkEffect::blue_theme(ctx(), LogoPosition::Left)?)
        }
        "configurable_watermark" => Box::new(WatermarkEffect::from_context(ctx())?),
        other => {
            return Err(EffectError::Configuration(format!(
                "built-in '{other}' has no definition"
            )));
        }
    };
    Ok(Some(Processor::boxed(id, name, effect)))
}
