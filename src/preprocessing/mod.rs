//! Image conditioning and mask cleanup
//!
//! Turns a photographed or scanned page into a cleaned binary ink mask.

pub mod pipeline;
pub mod steps;

pub use pipeline::{
    BinaryCleaner, ConditionerConfig, Geometry, ImageConditioner, Pipeline, PreprocessingInfo,
    PreprocessingResult, StepTiming,
};
