use crate::config::{ToneConfig, NEUTRAL_LEVEL};
use crate::error::{ensure_non_empty, PreprocessError};
use image::{Rgb, Rgb32FImage, RgbImage};
use imageproc::filter::filter3x3;

/// Smoothing kernel used as the "blurred" end of the sharpness blend
/// Center weight 5, neighbors 1 each, normalized by 13
const SMOOTH_KERNEL: [f32; 9] = [
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    5.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
];

/// Map a 0-100 level to an enhancement factor
/// 50 maps to exactly 1.0; the span sets how far the extremes reach
pub fn level_to_factor(level: u8, span: f32) -> f32 {
    let offset = (level as f32 - NEUTRAL_LEVEL as f32) / NEUTRAL_LEVEL as f32;
    (1.0 + offset * span).max(0.0)
}

/// Apply contrast, then sharpness, each scaled from its level
pub fn apply(
    image: RgbImage,
    contrast: u8,
    sharpness: u8,
    config: &ToneConfig,
) -> Result<RgbImage, PreprocessError> {
    ensure_non_empty(image.width(), image.height())?;

    let image = adjust_contrast(image, level_to_factor(contrast, config.contrast_span));
    let image = adjust_sharpness(image, level_to_factor(sharpness, config.sharpness_span));
    Ok(image)
}

/// Blend between a flat image at the mean luminance and the image itself
pub fn adjust_contrast(image: RgbImage, factor: f32) -> RgbImage {
    if factor == 1.0 {
        return image;
    }

    let mean = mean_luminance(&image) as f32;
    let mut out = image;
    for pixel in out.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = blend(mean, *c as f32, factor);
        }
    }
    out
}

/// Blend between a smoothed copy and the image itself
/// Factors above 1 extrapolate away from the smoothed copy (sharpen)
pub fn adjust_sharpness(image: RgbImage, factor: f32) -> RgbImage {
    if factor == 1.0 {
        return image;
    }

    let (width, height) = image.dimensions();
    // Kept in f32 so the blend rounds once instead of truncating the blur
    let smoothed: Rgb32FImage = filter3x3::<_, f32, f32>(&image, &SMOOTH_KERNEL);

    RgbImage::from_fn(width, height, |x, y| {
        let original = image.get_pixel(x, y);
        // Border pixels have no full neighborhood and stay as they are
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            return *original;
        }
        let soft = smoothed.get_pixel(x, y);
        Rgb([
            blend(soft.0[0], original.0[0] as f32, factor),
            blend(soft.0[1], original.0[1] as f32, factor),
            blend(soft.0[2], original.0[2] as f32, factor),
        ])
    })
}

/// Rounded mean of ITU-R 601 luminance
fn mean_luminance(image: &RgbImage) -> u8 {
    let sum: u64 = image
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (r as u64 * 299 + g as u64 * 587 + b as u64 * 114 + 500) / 1000
        })
        .sum();
    let count = image.width() as u64 * image.height() as u64;
    ((sum as f64 / count as f64) + 0.5) as u8
}

fn blend(base: f32, value: f32, factor: f32) -> u8 {
    (base + factor * (value - base)).round().clamp(0.0, 255.0) as u8
}
