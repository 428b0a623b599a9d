//! Pure calculation functions for effect geometry.
//!
//! All functions here are pure and testable without any I/O or images. The
//! effects call into these for every size and offset they compute, so the
//! numbers that decide how a framed photo looks live in one place.

use super::params::Sides;

/// Amount of padding to add on each edge of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Insets {
    pub top: u32,
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Insets {
    pub fn uniform(size: u32) -> Self {
        Self {
            top: size,
            left: size,
            right: size,
            bottom: size,
        }
    }

    /// `size` on every side listed in `sides`, zero elsewhere.
    pub fn on_sides(sides: Sides, size: u32) -> Self {
        let pick = |on: bool| if on { size } else { 0 };
        Self {
            top: pick(sides.top),
            left: pick(sides.left),
            right: pick(sides.right),
            bottom: pick(sides.bottom),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0 && self.left == 0 && self.right == 0 && self.bottom == 0
    }

    /// Dimensions of an image of size `dims` after padding.
    pub fn apply_to(&self, dims: (u32, u32)) -> (u32, u32) {
        (
            dims.0 + self.left + self.right,
            dims.1 + self.top + self.bottom,
        )
    }
}

/// Default rounded-corner radius: a tenth of the shorter edge.
pub fn default_corner_radius(dims: (u32, u32)) -> u32 {
    dims.0.min(dims.1) / 10
}

/// Default shadow blur radius: the longer edge over 512.
///
/// A 4000px photo gets a 7px shadow; anything under 512px gets none.
pub fn default_shadow_radius(dims: (u32, u32)) -> u32 {
    dims.0.max(dims.1) / 512
}

/// Canvas size for a drop shadow of radius `radius`.
///
/// The solid shadow plate is the image size plus a `2r` band on every side.
pub fn shadow_canvas_dimensions(dims: (u32, u32), radius: u32) -> (u32, u32) {
    (dims.0 + 4 * radius, dims.1 + 4 * radius)
}

/// Default margin thickness when no configured percentage applies: 3% of the shorter edge.
pub fn default_margin_thickness(dims: (u32, u32)) -> u32 {
    (dims.0.min(dims.1) as f64 * 0.03) as u32
}

/// Margin thickness from a configured percentage of the shorter edge.
pub fn margin_thickness(dims: (u32, u32), percent: u32) -> u32 {
    (dims.0.min(dims.1) as u64 * percent as u64 / 100) as u32
}

/// Size of the blurred backdrop and where the sharp original sits on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackdropLayout {
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Compute the backdrop for a background blur with `padding_percent` of extra size.
///
/// The backdrop is `round(W(1+p)) x round(H(1+p))` and the original is pasted at
/// `(round(Wp/2), round(Hp/2))`.
pub fn backdrop_layout(dims: (u32, u32), padding_percent: f64) -> BackdropLayout {
    let (w, h) = (dims.0 as f64, dims.1 as f64);
    BackdropLayout {
        width: (w * (1.0 + padding_percent)).round() as u32,
        height: (h * (1.0 + padding_percent)).round() as u32,
        offset_x: (w * padding_percent / 2.0).round() as u32,
        offset_y: (h * padding_percent / 2.0).round() as u32,
    }
}

/// Symmetric padding that turns `dims` into a square.
pub fn square_insets(dims: (u32, u32)) -> Insets {
    let (w, h) = dims;
    let side = w.max(h);
    let left = (side - w) / 2;
    let top = (side - h) / 2;
    Insets {
        top,
        left,
        right: side - w - left,
        bottom: side - h - top,
    }
}

/// Tolerance under which an image already counts as having the target ratio.
pub const RATIO_TOLERANCE: f64 = 0.01;

/// Padding that brings `dims` to `target` width/height ratio.
///
/// Returns `None` when the image is already within [`RATIO_TOLERANCE`] of the
/// target. Wider images grow in height to `floor(W / target)`; taller images
/// grow in width to `floor(H * target)`. The difference is split in half per
/// side, rounding down on both.
pub fn ratio_insets(dims: (u32, u32), target: f64) -> Option<Insets> {
    let (w, h) = dims;
    if w == 0 || h == 0 || target <= 0.0 {
        return None;
    }
    let current = w as f64 / h as f64;
    if (current - target).abs() < RATIO_TOLERANCE {
        return None;
    }

    if current > target {
        let new_h = (w as f64 / target) as u32;
        let pad = new_h.saturating_sub(h) / 2;
        Some(Insets {
            top: pad,
            bottom: pad,
            ..Insets::default()
        })
    } else {
        let new_w = (h as f64 * target) as u32;
        let pad = new_w.saturating_sub(w) / 2;
        Some(Insets {
            left: pad,
            right: pad,
            ..Insets::default()
        })
    }
}

/// Scale `dims` to `width`, keeping the aspect ratio (height rounds down).
pub fn scale_to_width(dims: (u32, u32), width: u32) -> (u32, u32) {
    let (w, h) = dims;
    if w == 0 {
        return (width, h);
    }
    let height = (h as u64 * width as u64 / w as u64).max(1) as u32;
    (width, height)
}

/// Scale `dims` to `height`, keeping the aspect ratio (width rounds down).
pub fn scale_to_height(dims: (u32, u32), height: u32) -> (u32, u32) {
    let (w, h) = dims;
    if h == 0 {
        return (w, height);
    }
    let width = (w as u64 * height as u64 / h as u64).max(1) as u32;
    (width, height)
}

/// Internal working height of the watermark strip before it is scaled to the photo.
pub const STRIP_NORMAL_HEIGHT: u32 = 1000;

/// Strip proportions for a photo of `image_ratio` (width / height).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripRatios {
    /// Strip height as a fraction of its width.
    pub ratio: f64,
    /// Vertical padding of the text blocks as a fraction of their height.
    pub padding_ratio: f64,
}

/// Compute the watermark strip proportions.
///
/// The constants are tuned by eye: landscape photos get a thin strip
/// (`0.04`), portrait photos a taller one (`0.09`), and every font padding
/// level adds `0.02` of height while removing `0.04` of internal padding.
pub fn strip_ratios(image_ratio: f64, font_padding_level: u32) -> StripRatios {
    let level = font_padding_level as f64;
    let landscape = image_ratio >= 1.0;
    StripRatios {
        ratio: (if landscape { 0.04 } else { 0.09 }) + 0.02 * level,
        padding_ratio: (if landscape { 0.52 } else { 0.7 }) - 0.04 * level,
    }
}

/// Width of the strip canvas at [`STRIP_NORMAL_HEIGHT`].
pub fn strip_canvas_width(ratio: f64) -> u32 {
    (STRIP_NORMAL_HEIGHT as f64 / ratio) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insets_on_sides_leave_unlisted_edges_bare() {
        let insets = Insets::on_sides(Sides::OPEN_BOTTOM, 12);
        assert_eq!(
            insets,
            Insets {
                top: 12,
                left: 12,
                right: 12,
                bottom: 0
            }
        );
        assert_eq!(insets.apply_to((100, 50)), (124, 62));
    }

    // =========================================================================
    // Default radii and thickness
    // =========================================================================

    #[test]
    fn corner_radius_is_tenth_of_short_edge() {
        assert_eq!(default_corner_radius((4000, 3000)), 300);
        assert_eq!(default_corner_radius((99, 500)), 9);
    }

    #[test]
    fn shadow_radius_is_long_edge_over_512() {
        assert_eq!(default_shadow_radius((4000, 3000)), 7);
        assert_eq!(default_shadow_radius((4600, 3450)), 8);
        assert_eq!(default_shadow_radius((400, 300)), 0);
    }

    #[test]
    fn shadow_canvas_adds_two_radii_per_side() {
        assert_eq!(shadow_canvas_dimensions((100, 80), 5), (120, 100));
        assert_eq!(shadow_canvas_dimensions((100, 80), 0), (100, 80));
    }

    #[test]
    fn default_margin_is_three_percent() {
        assert_eq!(default_margin_thickness((4000, 3000)), 90);
        assert_eq!(default_margin_thickness((10, 10)), 0);
    }

    #[test]
    fn configured_margin_percentage() {
        assert_eq!(margin_thickness((4000, 3000), 3), 90);
        assert_eq!(margin_thickness((4000, 3000), 10), 300);
        assert_eq!(margin_thickness((4000, 3000), 0), 0);
    }

    // =========================================================================
    // Backdrop layout
    // =========================================================================

    #[test]
    fn backdrop_grows_by_padding_percent() {
        let layout = backdrop_layout((4000, 3000), 0.15);
        assert_eq!(layout.width, 4600);
        assert_eq!(layout.height, 3450);
        assert_eq!(layout.offset_x, 300);
        assert_eq!(layout.offset_y, 225);
    }

    #[test]
    fn backdrop_rounds_odd_sizes() {
        // 101 * 1.15 = 116.15 -> 116; 101 * 0.075 = 7.575 -> 8
        let layout = backdrop_layout((101, 33), 0.15);
        assert_eq!(layout.width, 116);
        assert_eq!(layout.height, 38);
        assert_eq!(layout.offset_x, 8);
        assert_eq!(layout.offset_y, 2);
    }

    // =========================================================================
    // Square and ratio padding
    // =========================================================================

    #[test]
    fn square_insets_landscape() {
        let insets = square_insets((400, 300));
        assert_eq!(insets.top, 50);
        assert_eq!(insets.bottom, 50);
        assert_eq!(insets.apply_to((400, 300)), (400, 400));
    }

    #[test]
    fn square_insets_odd_difference_still_square() {
        let insets = square_insets((300, 401));
        assert_eq!(insets.apply_to((300, 401)), (401, 401));
        assert_eq!(insets.left, 50);
        assert_eq!(insets.right, 51);
    }

    #[test]
    fn square_insets_already_square() {
        assert!(square_insets((256, 256)).is_empty());
    }

    #[test]
    fn ratio_within_tolerance_is_noop() {
        assert_eq!(ratio_insets((1000, 1000), 1.0), None);
        assert_eq!(ratio_insets((1005, 1000), 1.0), None);
    }

    #[test]
    fn ratio_wider_than_target_pads_height() {
        // 400x200 to 1:1 -> height 400, 100 each side
        let insets = ratio_insets((400, 200), 1.0).unwrap();
        assert_eq!(insets.top, 100);
        assert_eq!(insets.bottom, 100);
        assert_eq!(insets.left, 0);
    }

    #[test]
    fn ratio_taller_than_target_pads_width() {
        // 300x400 to 3:2 -> width 600, 150 each side
        let insets = ratio_insets((300, 400), 1.5).unwrap();
        assert_eq!(insets.left, 150);
        assert_eq!(insets.right, 150);
        assert_eq!(insets.top, 0);
    }

    #[test]
    fn ratio_odd_difference_rounds_down_per_side() {
        // 401x200 to 1:1 -> new height 401, diff 201, 100 per side
        let insets = ratio_insets((401, 200), 1.0).unwrap();
        assert_eq!(insets.top, 100);
        assert_eq!(insets.bottom, 100);
    }

    #[test]
    fn ratio_degenerate_inputs() {
        assert_eq!(ratio_insets((0, 100), 1.0), None);
        assert_eq!(ratio_insets((100, 100), 0.0), None);
    }

    // =========================================================================
    // Scaling
    // =========================================================================

    #[test]
    fn scale_to_width_keeps_aspect() {
        assert_eq!(scale_to_width((16666, 1000), 4000), (4000, 240));
        assert_eq!(scale_to_width((200, 100), 50), (50, 25));
    }

    #[test]
    fn scale_to_height_keeps_aspect() {
        assert_eq!(scale_to_height((20, 500), 1000), (40, 1000));
        assert_eq!(scale_to_height((1, 1000), 10), (1, 10));
    }

    // =========================================================================
    // Watermark strip proportions
    // =========================================================================

    #[test]
    fn strip_ratios_landscape() {
        let r = strip_ratios(4.0 / 3.0, 0);
        assert!((r.ratio - 0.04).abs() < 1e-9);
        assert!((r.padding_ratio - 0.52).abs() < 1e-9);
    }

    #[test]
    fn strip_ratios_square_counts_as_landscape() {
        let r = strip_ratios(1.0, 0);
        assert!((r.ratio - 0.04).abs() < 1e-9);
    }

    #[test]
    fn strip_ratios_portrait() {
        let r = strip_ratios(0.75, 0);
        assert!((r.ratio - 0.09).abs() < 1e-9);
        assert!((r.padding_ratio - 0.7).abs() < 1e-9);
    }

    #[test]
    fn strip_ratios_padding_level() {
        let r = strip_ratios(1.5, 2);
        assert!((r.ratio - 0.08).abs() < 1e-9);
        assert!((r.padding_ratio - 0.44).abs() < 1e-9);
    }

    #[test]
    fn strip_canvas_width_from_ratio() {
        assert_eq!(strip_canvas_width(0.04), 25000);
        assert_eq!(strip_canvas_width(0.08), 12500);
    }
}
