//! Handwritten page conditioning and layout segmentation
//!
//! A page image is turned into a cleaned binary ink mask, which is then
//! analyzed for text lines, character candidates and text regions.

pub mod batch;
pub mod config;
pub mod error;
pub mod io;
pub mod morphology;
pub mod overlay;
pub mod preprocessing;
pub mod segmentation;

pub use batch::{artifact_names, process_batch, process_page, PageOutcome, PageReport};
pub use config::{Args, Config};
pub use error::PipelineError;
pub use preprocessing::{BinaryCleaner, ConditionerConfig, Geometry, ImageConditioner, Pipeline};
pub use segmentation::{
    BoundingBox, Cached, CharacterSegmenter, LineSegmenter, RegionSegmenter, Segmenter,
};
