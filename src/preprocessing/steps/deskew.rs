use crate::config::{DeskewConfig, MAX_KERNEL_SIDE};
use crate::error::{ensure_non_empty, PreprocessError};
use crate::preprocessing::geometry::{min_area_rect, rotate_about_center};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::contour_area;
use imageproc::morphology::{grayscale_close, Mask};

use super::{binarize, grayscale};

/// Deskew image by detecting and correcting small rotations
/// Text lines are merged into blobs and the dominant blob's bounding
/// rectangle gives the angle
pub fn apply(image: RgbImage, config: &DeskewConfig) -> Result<RgbImage, PreprocessError> {
    ensure_non_empty(image.width(), image.height())?;

    let Some(angle) = estimate_skew(&image, config) else {
        tracing::debug!("No text contours found, skipping deskew");
        return Ok(image);
    };

    // Rotating always costs some sharpness; skip negligible angles
    if angle.abs() < config.min_angle_deg {
        tracing::debug!("Skew of {:.2} degrees is negligible", angle);
        return Ok(image);
    }

    tracing::debug!("Correcting skew of {:.2} degrees", angle);
    Ok(rotate_about_center(&image, -angle))
}

/// Measure the skew of the dominant text block, in degrees
///
/// Positive angles mean the content is rotated clockwise as displayed. The
/// result is already folded and clamped to the configured range. Returns
/// `None` when the image has no foreground contour at all.
pub fn estimate_skew(image: &RgbImage, config: &DeskewConfig) -> Option<f32> {
    let mask = text_mask(image, config);
    let closed = merge_text_lines(&mask, config);

    let largest = find_contours::<i32>(&closed)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| (contour_area(&c.points), c))
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, c)| c)?;

    let rect = min_area_rect(&largest.points)?;
    Some(normalize_angle(rect.angle as f32, config))
}

/// Fold a bounding-rectangle angle into a skew and clamp it
///
/// Rectangle angles do not say which side is the width, so anything steeper
/// than the fold threshold is the same rectangle seen from its other side.
pub fn normalize_angle(angle: f32, config: &DeskewConfig) -> f32 {
    let folded = if angle < config.fold_threshold_deg {
        angle + 90.0
    } else {
        angle
    };

    let clamped = folded.clamp(-config.max_angle_deg, config.max_angle_deg);
    if clamped != folded {
        tracing::warn!(
            "Detected skew of {:.2} degrees clamped to {:.2}",
            folded,
            clamped
        );
    }
    clamped
}

/// Binary mask with text pixels "on", whatever the document polarity
fn text_mask(image: &RgbImage, config: &DeskewConfig) -> GrayImage {
    let gray = grayscale::to_gray(image);
    let blurred = if config.blur_sigma > 0.0 {
        gaussian_blur_f32(&gray, config.blur_sigma)
    } else {
        gray
    };

    let mut mask = binarize::otsu_threshold(&blurred);

    // Otsu does not know which side is text; assume the background dominates
    let total: u64 = mask.pixels().map(|p| p.0[0] as u64).sum();
    let mean = total as f64 / (mask.width() as f64 * mask.height() as f64);
    if mean > config.polarity_threshold as f64 {
        image::imageops::invert(&mut mask);
    }
    mask
}

/// Close the mask with a wide, flat rectangle so characters and words on
/// one line fuse into a single blob
///
/// Kernel sides are held to `1..=MAX_KERNEL_SIDE`, the largest mask imageproc
/// accepts.
fn merge_text_lines(mask: &GrayImage, config: &DeskewConfig) -> GrayImage {
    let width = config.kernel_width.clamp(1, MAX_KERNEL_SIDE);
    let height = config.kernel_height.clamp(1, MAX_KERNEL_SIDE);
    let rect = GrayImage::from_pixel(width, height, Luma([255]));
    let kernel = Mask::from_image(&rect, (width / 2) as u8, (height / 2) as u8);
    grayscale_close(mask, &kernel)
}
