use crate::error::{ensure_non_empty, PreprocessError};
use image::{imageops::FilterType, RgbImage};

/// Height that keeps the aspect ratio at the target width, never below one row
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scale = target_width as f64 / width as f64;
    ((height as f64 * scale).round() as u32).max(1)
}

/// Resize proportionally to the target width
/// No target, a zero target or the current width leave the image untouched
pub fn apply(image: RgbImage, target_width: Option<u32>) -> Result<RgbImage, PreprocessError> {
    let (width, height) = image.dimensions();
    ensure_non_empty(width, height)?;

    let target = match target_width {
        Some(target) if target > 0 && target != width => target,
        _ => return Ok(image),
    };

    let new_height = scaled_height(width, height, target);
    tracing::debug!(
        "Resizing {}x{} -> {}x{}",
        width,
        height,
        target,
        new_height
    );

    Ok(image::imageops::resize(
        &image,
        target,
        new_height,
        FilterType::CatmullRom,
    ))
}
