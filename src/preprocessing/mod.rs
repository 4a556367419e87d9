//! Image preprocessing module for OCR enhancement
//!
//! A fixed chain of pure image transforms that turns a color photograph of a
//! document into an upright, two-tone image for text recognition.

pub mod geometry;
pub mod layout;
pub mod pipeline;
pub mod steps;

pub use layout::BgrImage;
pub use pipeline::{preprocess, Intermediate, Pipeline, PreprocessingResult, StepTiming};
pub use steps::deskew::estimate_skew;
