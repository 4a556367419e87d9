//! Individual preprocessing steps

pub mod binarize;
pub mod denoise;
pub mod deskew;
pub mod grayscale;
pub mod resize;
pub mod tone;

use crate::config::PipelineConfig;
use crate::error::PreprocessError;
use image::RgbImage;

/// A pure image transform run by the pipeline
///
/// Steps consume their input and return a fresh image; the previous buffer
/// must be treated as gone once a step has run.
pub trait Step: Send + Sync {
    /// Name used in timing reports and logs
    fn name(&self) -> &'static str;

    fn apply(&self, image: RgbImage, config: &PipelineConfig) -> Result<RgbImage, PreprocessError>;
}

/// Contrast and sharpness enhancement
pub struct ToneStep;

/// Width-based proportional resize
pub struct ResizeStep;

/// Bilateral filter followed by non-local means
pub struct DenoiseStep;

/// Skew detection and correction
pub struct DeskewStep;

/// Two-tone reduction
pub struct BinarizeStep;

impl Step for ToneStep {
    fn name(&self) -> &'static str {
        "tone"
    }

    fn apply(&self, image: RgbImage, config: &PipelineConfig) -> Result<RgbImage, PreprocessError> {
        tone::apply(image, config.contrast, config.sharpness, &config.tone)
    }
}

impl Step for ResizeStep {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn apply(&self, image: RgbImage, config: &PipelineConfig) -> Result<RgbImage, PreprocessError> {
        resize::apply(image, config.target_width())
    }
}

impl Step for DenoiseStep {
    fn name(&self) -> &'static str {
        "denoise"
    }

    fn apply(&self, image: RgbImage, config: &PipelineConfig) -> Result<RgbImage, PreprocessError> {
        denoise::apply(image, &config.denoise)
    }
}

impl Step for DeskewStep {
    fn name(&self) -> &'static str {
        "deskew"
    }

    fn apply(&self, image: RgbImage, config: &PipelineConfig) -> Result<RgbImage, PreprocessError> {
        deskew::apply(image, &config.deskew)
    }
}

impl Step for BinarizeStep {
    fn name(&self) -> &'static str {
        "binarize"
    }

    fn apply(&self, image: RgbImage, config: &PipelineConfig) -> Result<RgbImage, PreprocessError> {
        binarize::apply(image, config.binarization, &config.adaptive)
    }
}
