//! Document image preprocessing for OCR
//!
//! Contrast and sharpness adjustment, resizing, denoising, deskewing and
//! binarization, run as one deterministic pipeline. Recognition itself is left
//! to the caller.

pub mod config;
pub mod error;
pub mod preprocessing;

pub use config::{Binarization, PipelineConfig};
pub use error::PreprocessError;
pub use preprocessing::{preprocess, BgrImage, Pipeline, PreprocessingResult};
