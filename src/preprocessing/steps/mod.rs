//! Individual preprocessing steps

pub mod clean;
pub mod contrast;
pub mod denoise;
pub mod grayscale;
pub mod normalize;
pub mod resize;
pub mod threshold;
