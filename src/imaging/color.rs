//! Colour strings as they appear in configuration files.
//!
//! Accepted forms: `#rgb`, `#rrggbb`, `#rrggbbaa`, and a handful of names
//! (`white`, `black`, `gray`/`grey`, `transparent`).

use image::Rgba;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid colour \"{0}\": expected #rgb, #rrggbb, #rrggbbaa or a colour name")]
pub struct ColorError(pub String);

/// Separator line grey used by the watermark strip.
pub const GRAY: Rgba<u8> = Rgba([169, 169, 169, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Parse a colour string into an RGBA pixel.
pub fn parse_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let trimmed = s.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "white" => return Ok(WHITE),
        "black" => return Ok(Rgba([0, 0, 0, 255])),
        "gray" | "grey" => return Ok(GRAY),
        "transparent" => return Ok(TRANSPARENT),
        _ => {}
    }

    let hex = trimmed
        .strip_prefix('#')
        .ok_or_else(|| ColorError(s.to_string()))?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError(s.to_string()));
    }

    let channel =
        |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorError(s.to_string()));
    match hex.len() {
        3 => {
            let expand = |i: usize| {
                u8::from_str_radix(&hex[i..i + 1], 16)
                    .map(|v| v * 17)
                    .map_err(|_| ColorError(s.to_string()))
            };
            Ok(Rgba([expand(0)?, expand(1)?, expand(2)?, 255]))
        }
        6 => Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 255])),
        8 => Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
        _ => Err(ColorError(s.to_string())),
    }
}
