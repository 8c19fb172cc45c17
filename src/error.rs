use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source image is missing, unreadable, or failed to decode.
    #[error("Source image unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// The image does not satisfy the validity predicate (channels, size).
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write {path}: {reason}")]
    Output { path: PathBuf, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Short machine-readable code used in batch reports
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            PipelineError::InvalidImage(_) => "INVALID_IMAGE",
            PipelineError::Config(_) => "CONFIG_ERROR",
            PipelineError::Output { .. } => "OUTPUT_ERROR",
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unavailable_is_distinct_from_invalid() {
        let missing = PipelineError::SourceUnavailable {
            path: PathBuf::from("page.png"),
            reason: "not found".to_string(),
        };
        let invalid = PipelineError::InvalidImage("too small".to_string());

        assert_eq!(missing.code(), "SOURCE_UNAVAILABLE");
        assert_eq!(invalid.code(), "INVALID_IMAGE");
        assert!(missing.to_string().contains("page.png"));
    }
}
