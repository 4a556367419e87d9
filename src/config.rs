use crate::error::PreprocessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Neutral contrast/sharpness level
pub const NEUTRAL_LEVEL: u8 = 50;
/// Highest accepted contrast/sharpness level
pub const MAX_LEVEL: u8 = 100;
/// Largest closing kernel side the deskew step accepts
pub const MAX_KERNEL_SIDE: u32 = 511;
/// Resize width the command line applies when none is given
pub const DEFAULT_RESIZE_WIDTH: u32 = 1600;

/// Binarization method used by the final stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binarization {
    /// Global Otsu threshold, for evenly lit scans
    Simple,
    /// Local threshold, for photographs with uneven lighting
    #[default]
    Adaptive,
}

impl Binarization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Adaptive => "adaptive",
        }
    }
}

impl FromStr for Binarization {
    type Err = PreprocessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "adaptive" => Ok(Self::Adaptive),
            other => Err(PreprocessError::InvalidConfiguration(format!(
                "unknown binarization mode '{}' (expected 'simple' or 'adaptive')",
                other
            ))),
        }
    }
}

impl fmt::Display for Binarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the adaptive threshold computes the local mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdaptiveMethod {
    /// Gaussian-weighted neighborhood mean
    #[default]
    Gaussian,
    /// Plain box mean over the neighborhood
    Mean,
}

/// Level-to-factor spans for the tone adjuster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    pub contrast_span: f32,
    pub sharpness_span: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            contrast_span: 1.5,
            sharpness_span: 1.8,
        }
    }
}

/// Bilateral + non-local means parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    /// Bilateral neighborhood diameter in pixels
    pub bilateral_diameter: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
    /// Non-local means filter strength
    pub strength: f32,
    /// Side of the square patch compared between pixels (odd)
    pub template_window: u32,
    /// Side of the square area searched for similar patches (odd)
    pub search_window: u32,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            bilateral_diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
            strength: 3.0,
            template_window: 7,
            search_window: 21,
        }
    }
}

/// Skew detection thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskewConfig {
    /// Gaussian sigma applied before thresholding
    pub blur_sigma: f32,
    /// Mask mean above which the Otsu mask is inverted
    pub polarity_threshold: f32,
    /// Closing kernel width, merges characters into lines
    pub kernel_width: u32,
    /// Closing kernel height
    pub kernel_height: u32,
    /// Rectangle angles below this get 90 degrees added
    pub fold_threshold_deg: f32,
    /// Largest correction ever applied, in degrees
    pub max_angle_deg: f32,
    /// Corrections smaller than this are skipped
    pub min_angle_deg: f32,
}

impl Default for DeskewConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 0.8,
            polarity_threshold: 127.0,
            kernel_width: 30,
            kernel_height: 3,
            fold_threshold_deg: -45.0,
            max_angle_deg: 15.0,
            min_angle_deg: 0.5,
        }
    }
}

/// Local threshold parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Neighborhood side (odd)
    pub block_size: u32,
    /// Subtracted from the local mean
    pub bias: f32,
    pub method: AdaptiveMethod,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            block_size: 35,
            bias: 11.0,
            method: AdaptiveMethod::Gaussian,
        }
    }
}

/// Options for a single pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub contrast: u8,
    pub sharpness: u8,
    pub binarization: Binarization,
    /// `None` or `Some(0)` keeps the original width
    pub resize_width: Option<u32>,
    pub tone: ToneConfig,
    pub denoise: DenoiseConfig,
    pub deskew: DeskewConfig,
    pub adaptive: AdaptiveConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            contrast: NEUTRAL_LEVEL,
            sharpness: NEUTRAL_LEVEL,
            binarization: Binarization::default(),
            resize_width: None,
            tone: ToneConfig::default(),
            denoise: DenoiseConfig::default(),
            deskew: DeskewConfig::default(),
            adaptive: AdaptiveConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON configuration bundle; omitted fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, PreprocessError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PreprocessError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Target width with the "0 means no resize" convention applied
    pub fn target_width(&self) -> Option<u32> {
        self.resize_width.filter(|&w| w > 0)
    }

    /// Reject values outside their documented domain
    pub fn validate(&self) -> Result<(), PreprocessError> {
        check_level("contrast", self.contrast)?;
        check_level("sharpness", self.sharpness)?;

        if !(self.tone.contrast_span >= 0.0 && self.tone.sharpness_span >= 0.0) {
            return Err(invalid("tone spans must be non-negative"));
        }

        let denoise = &self.denoise;
        if denoise.bilateral_diameter == 0 {
            return Err(invalid("bilateral_diameter must be positive"));
        }
        if !(denoise.sigma_color > 0.0 && denoise.sigma_space > 0.0 && denoise.strength > 0.0) {
            return Err(invalid("denoise sigmas and strength must be positive"));
        }
        check_odd("template_window", denoise.template_window)?;
        check_odd("search_window", denoise.search_window)?;

        let deskew = &self.deskew;
        if deskew.kernel_width == 0 || deskew.kernel_height == 0 {
            return Err(invalid("deskew kernel dimensions must be positive"));
        }
        if deskew.kernel_width > MAX_KERNEL_SIDE || deskew.kernel_height > MAX_KERNEL_SIDE {
            return Err(invalid(&format!(
                "deskew kernel sides must be at most {}",
                MAX_KERNEL_SIDE
            )));
        }
        if !(deskew.max_angle_deg >= 0.0 && deskew.min_angle_deg >= 0.0) {
            return Err(invalid("deskew angle limits must be non-negative"));
        }
        if deskew.blur_sigma < 0.0 {
            return Err(invalid("blur_sigma must be non-negative"));
        }

        check_odd("block_size", self.adaptive.block_size)?;
        if self.adaptive.block_size < 3 {
            return Err(invalid("block_size must be at least 3"));
        }

        Ok(())
    }
}

fn check_level(name: &str, level: u8) -> Result<(), PreprocessError> {
    if level > MAX_LEVEL {
        return Err(invalid(&format!(
            "{} level {} is outside 0..={}",
            name, level, MAX_LEVEL
        )));
    }
    Ok(())
}

fn check_odd(name: &str, value: u32) -> Result<(), PreprocessError> {
    if value % 2 == 0 {
        return Err(invalid(&format!("{} must be odd, got {}", name, value)));
    }
    Ok(())
}

fn invalid(msg: &str) -> PreprocessError {
    PreprocessError::InvalidConfiguration(msg.to_string())
}
