use crate::config::PipelineConfig;
use crate::error::{ensure_non_empty, PreprocessError};
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::time::Instant;

use super::layout::BgrImage;
use super::steps::{BinarizeStep, DenoiseStep, DeskewStep, ResizeStep, Step, ToneStep};

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: RgbImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Binarization mode used
    pub binarization: String,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

impl PreprocessingResult {
    /// The processed image in both channel orders: `(bgr, rgb)`
    pub fn into_layouts(self) -> (BgrImage, RgbImage) {
        (BgrImage::from_rgb(&self.image), self.image)
    }
}

/// Output of a single step, kept for debugging
#[derive(Debug, Clone)]
pub struct Intermediate {
    pub name: &'static str,
    pub image: RgbImage,
}

/// Preprocessing pipeline: tone, resize, denoise, deskew, binarize, in that order
pub struct Pipeline {
    config: PipelineConfig,
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    /// Validate the configuration and build the step chain
    pub fn new(config: PipelineConfig) -> Result<Self, PreprocessError> {
        config.validate()?;
        Ok(Self {
            config,
            steps: vec![
                Box::new(ToneStep),
                Box::new(ResizeStep),
                Box::new(DenoiseStep),
                Box::new(DeskewStep),
                Box::new(BinarizeStep),
            ],
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Names of the steps, in execution order
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Process an image through every step
    pub fn process(&self, image: &DynamicImage) -> Result<PreprocessingResult, PreprocessError> {
        self.run(image, |_, _| {})
    }

    /// Like [`Pipeline::process`], also returning every step's output
    pub fn process_with_intermediates(
        &self,
        image: &DynamicImage,
    ) -> Result<(PreprocessingResult, Vec<Intermediate>), PreprocessError> {
        let mut intermediates = Vec::with_capacity(self.steps.len());
        let result = self.run(image, |name, img| {
            intermediates.push(Intermediate {
                name,
                image: img.clone(),
            })
        })?;
        Ok((result, intermediates))
    }

    fn run<F>(&self, image: &DynamicImage, mut observe: F) -> Result<PreprocessingResult, PreprocessError>
    where
        F: FnMut(&'static str, &RgbImage),
    {
        ensure_non_empty(image.width(), image.height())?;

        let start = Instant::now();
        let mut steps_timing = Vec::with_capacity(self.steps.len());
        let mut img = image.to_rgb8();

        for step in &self.steps {
            img = self.run_step(step.as_ref(), img, &mut steps_timing)?;
            observe(step.name(), &img);
        }

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Preprocessed {}x{} image in {}ms ({} binarization)",
            img.width(),
            img.height(),
            total_time_ms,
            self.config.binarization
        );

        Ok(PreprocessingResult {
            image: img,
            total_time_ms,
            binarization: self.config.binarization.as_str().to_string(),
            steps: steps_timing,
        })
    }

    fn run_step(
        &self,
        step: &dyn Step,
        img: RgbImage,
        timings: &mut Vec<StepTiming>,
    ) -> Result<RgbImage, PreprocessError> {
        let step_start = Instant::now();
        let result = step.apply(img, &self.config)?;
        let time_ms = step_start.elapsed().as_millis() as u64;
        tracing::debug!("Step {} finished in {}ms", step.name(), time_ms);
        timings.push(StepTiming {
            name: step.name().to_string(),
            time_ms,
        });
        Ok(result)
    }
}

/// Run the full pipeline once and return the result as `(bgr, rgb)`
pub fn preprocess(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> Result<(BgrImage, RgbImage), PreprocessError> {
    let pipeline = Pipeline::new(config.clone())?;
    Ok(pipeline.process(image)?.into_layouts())
}
