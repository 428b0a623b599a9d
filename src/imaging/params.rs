//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the effects (which decide what raster to produce) and the
//! [`backend`](super::backend) (which decodes and encodes files). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing effect logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 95). Clamped on construction.
//! - [`Sides`]: Subset of {top, left, right, bottom} a padding band is applied to.
//! - [`Density`]: Pixel density carried from the source into the encoded file.
//! - [`SaveOptions`]: Everything the backend needs to write a processed image.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Which edges of an image a padding band is added to.
///
/// Serialized as a compact letter string: `t`op, `l`eft, `r`ight, `b`ottom.
/// `"tlrb"` is all four sides, `"tlr"` leaves the bottom open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sides {
    pub top: bool,
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
}

impl Sides {
    pub const ALL: Sides = Sides {
        top: true,
        left: true,
        right: true,
        bottom: true,
    };

    /// Top, left and right: the photo "hangs" on the band below it.
    pub const OPEN_BOTTOM: Sides = Sides {
        top: true,
        left: true,
        right: true,
        bottom: false,
    };

    pub const TOP: Sides = Sides {
        top: true,
        left: false,
        right: false,
        bottom: false,
    };

    pub const VERTICAL: Sides = Sides {
        top: true,
        left: false,
        right: false,
        bottom: true,
    };

    pub const HORIZONTAL: Sides = Sides {
        top: false,
        left: true,
        right: true,
        bottom: false,
    };

    /// Parse a letter string such as `"tlrb"`. Order does not matter.
    pub fn parse(s: &str) -> Result<Self, String> {
        let mut sides = Sides {
            top: false,
            left: false,
            right: false,
            bottom: false,
        };
        for c in s.chars() {
            match c.to_ascii_lowercase() {
                't' => sides.top = true,
                'l' => sides.left = true,
                'r' => sides.right = true,
                'b' => sides.bottom = true,
                other => return Err(format!("unknown side '{other}' in \"{s}\"")),
            }
        }
        Ok(sides)
    }
}

impl Default for Sides {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for Sides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, c) in [
            (self.top, 't'),
            (self.left, 'l'),
            (self.right, 'r'),
            (self.bottom, 'b'),
        ] {
            if on {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for Sides {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Sides::parse(&value)
    }
}

impl From<Sides> for String {
    fn from(value: Sides) -> Self {
        value.to_string()
    }
}

/// Horizontal and vertical pixel density in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Density {
    pub x: u16,
    pub y: u16,
}

/// Parameters for writing a processed image to disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveOptions {
    pub quality: Quality,
    /// DPI copied from the source, when it declared one.
    pub density: Option<Density>,
    /// Raw EXIF payload of the source, passed through untouched.
    pub exif: Option<Vec<u8>>,
}
