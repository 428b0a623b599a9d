//! Raster primitives shared by the effects.
//!
//! These functions combine [`calculations`](super::calculations) with pixel
//! work from the `image` crate. Every function takes its input by reference
//! and returns a freshly allocated raster; nothing here mutates a caller's
//! image.

use super::calculations::{Insets, scale_to_height, scale_to_width};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgba, RgbaImage};

/// A canvas filled with a single colour.
pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// Add solid-colour bands around an image.
///
/// The result keeps an alpha channel only if the input had one, so padding a
/// JPEG never introduces transparency.
pub fn pad(image: &DynamicImage, insets: Insets, color: Rgba<u8>) -> DynamicImage {
    let padded = pad_rgba(&image.to_rgba8(), insets, color);
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(padded)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(padded).to_rgb8())
    }
}

/// Add solid-colour bands around an RGBA image. The source pixels are copied
/// as-is, alpha included.
pub fn pad_rgba(image: &RgbaImage, insets: Insets, color: Rgba<u8>) -> RgbaImage {
    let (width, height) = insets.apply_to(image.dimensions());
    let mut canvas = solid(width, height, color);
    imageops::replace(&mut canvas, image, insets.left as i64, insets.top as i64);
    canvas
}

/// Stack images top to bottom, left-aligned, on a transparent canvas as wide
/// as the widest input.
pub fn stack_vertical(images: &[&RgbaImage]) -> RgbaImage {
    let width = images.iter().map(|i| i.width()).max().unwrap_or(0).max(1);
    let height = images.iter().map(|i| i.height()).sum::<u32>().max(1);
    let mut canvas = RgbaImage::new(width, height);
    let mut y = 0i64;
    for image in images {
        imageops::replace(&mut canvas, *image, 0, y);
        y += image.height() as i64;
    }
    canvas
}

/// Resize to an exact width, height following the aspect ratio.
pub fn resize_to_width(image: &RgbaImage, width: u32) -> RgbaImage {
    let (w, h) = scale_to_width(image.dimensions(), width);
    if (w, h) == image.dimensions() {
        return image.clone();
    }
    imageops::resize(image, w, h, FilterType::Lanczos3)
}

/// Resize to an exact height, width following the aspect ratio.
pub fn resize_to_height(image: &RgbaImage, height: u32) -> RgbaImage {
    let (w, h) = scale_to_height(image.dimensions(), height);
    if (w, h) == image.dimensions() {
        return image.clone();
    }
    imageops::resize(image, w, h, FilterType::Lanczos3)
}

/// Alpha mask of a rounded rectangle: 255 inside, 0 outside.
///
/// Pixels are sampled at their centres, so with radius `r` the corner pixel
/// `(0, 0)` lies outside the arc for any `r >= 1`.
pub fn rounded_mask(width: u32, height: u32, radius: u32) -> GrayImage {
    let r = radius.min(width / 2).min(height / 2) as f64;
    let (w, h) = (width as f64, height as f64);
    GrayImage::from_fn(width, height, |x, y| {
        let px = x as f64 + 0.5;
        let py = y as f64 + 0.5;
        let cx = if px < r {
            r
        } else if px > w - r {
            w - r
        } else {
            px
        };
        let cy = if py < r {
            r
        } else if py > h - r {
            h - r
        } else {
            py
        };
        let (dx, dy) = (px - cx, py - cy);
        if dx * dx + dy * dy <= r * r {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Replace the alpha channel of `image` with `mask`, scaling the image to the
/// mask's size first when they differ.
pub fn apply_alpha_mask(image: &DynamicImage, mask: &GrayImage) -> RgbaImage {
    let (mw, mh) = mask.dimensions();
    let mut rgba = if image.dimensions() == (mw, mh) {
        image.to_rgba8()
    } else {
        image.resize_to_fill(mw, mh, FilterType::Lanczos3).to_rgba8()
    };
    for (pixel, alpha) in rgba.pixels_mut().zip(mask.pixels()) {
        pixel.0[3] = alpha.0[0];
    }
    rgba
}

/// Mix every pixel towards white by `alpha` (0 = unchanged, 1 = white).
pub fn blend_toward_white(image: &mut RgbaImage, alpha: f64) {
    let alpha = alpha.clamp(0.0, 1.0);
    for pixel in image.pixels_mut() {
        for c in &mut pixel.0[..3] {
            *c = (*c as f64 * (1.0 - alpha) + 255.0 * alpha).round() as u8;
        }
    }
}

/// Alpha-composite `top` onto `bottom` at `(x, y)`.
pub fn overlay(bottom: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    imageops::overlay(bottom, top, x, y);
}

/// Drop the alpha channel. Colour values are kept as stored.
pub fn flatten(image: RgbaImage) -> DynamicImage {
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn rgb(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([10, 20, 30])))
    }

    #[test]
    fn pad_adds_bands_on_requested_sides() {
        let insets = Insets {
            top: 2,
            left: 3,
            right: 0,
            bottom: 1,
        };
        let out = pad(&rgb(10, 10), insets, Rgba([255, 255, 255, 255]));
        assert_eq!(out.dimensions(), (13, 13));
        assert_eq!(out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(3, 2), Rgba([10, 20, 30, 255]));
        assert_eq!(out.get_pixel(12, 11), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn pad_keeps_rgb_for_opaque_input() {
        let out = pad(&rgb(4, 4), Insets::uniform(1), Rgba([0, 0, 0, 255]));
        assert!(!out.color().has_alpha());
    }

    #[test]
    fn pad_keeps_alpha_for_transparent_input() {
        let input = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        let out = pad(&input, Insets::uniform(1), Rgba([255, 255, 255, 255]));
        assert!(out.color().has_alpha());
        assert_eq!(out.get_pixel(2, 2)[3], 0);
        assert_eq!(out.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn stack_vertical_sums_heights_and_takes_max_width() {
        let a = RgbaImage::from_pixel(10, 5, Rgba([1, 1, 1, 255]));
        let b = RgbaImage::from_pixel(4, 7, Rgba([2, 2, 2, 255]));
        let out = stack_vertical(&[&a, &b]);
        assert_eq!(out.dimensions(), (10, 12));
        assert_eq!(out.get_pixel(0, 5), &Rgba([2, 2, 2, 255]));
        // Narrower image leaves transparent space to its right
        assert_eq!(out.get_pixel(9, 11)[3], 0);
    }

    #[test]
    fn resize_to_height_keeps_aspect() {
        let img = RgbaImage::new(20, 10);
        assert_eq!(resize_to_height(&img, 100).dimensions(), (200, 100));
        assert_eq!(resize_to_width(&img, 10).dimensions(), (10, 5));
    }

    #[test]
    fn rounded_mask_corners_transparent_center_opaque() {
        let mask = rounded_mask(100, 80, 8);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(99, 0)[0], 0);
        assert_eq!(mask.get_pixel(0, 79)[0], 0);
        assert_eq!(mask.get_pixel(99, 79)[0], 0);
        assert_eq!(mask.get_pixel(50, 40)[0], 255);
        // Edge midpoints are inside the rectangle
        assert_eq!(mask.get_pixel(50, 0)[0], 255);
        assert_eq!(mask.get_pixel(0, 40)[0], 255);
    }

    #[test]
    fn rounded_mask_zero_radius_is_full_rectangle() {
        let mask = rounded_mask(5, 5, 0);
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn blend_toward_white_mixes_channels() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([0, 100, 255, 7]));
        blend_toward_white(&mut img, 0.1);
        // 0*0.9+25.5=25.5 -> 26; 100*0.9+25.5=115.5 -> 116
        assert_eq!(img.get_pixel(0, 0), &Rgba([26, 116, 255, 7]));
    }

    #[test]
    fn flatten_drops_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([5, 6, 7, 0]));
        let flat = flatten(img);
        assert!(!flat.color().has_alpha());
        assert_eq!(flat.get_pixel(1, 1), Rgba([5, 6, 7, 255]));
    }
}
