use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Degenerate image: {width}x{height}")]
    DegenerateImage { width: u32, height: u32 },
}

impl PreprocessError {
    /// Error code suitable for structured responses
    pub fn code(&self) -> &'static str {
        match self {
            PreprocessError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            PreprocessError::DegenerateImage { .. } => "DEGENERATE_IMAGE",
        }
    }
}

/// Fail fast on zero-area images
pub fn ensure_non_empty(width: u32, height: u32) -> Result<(), PreprocessError> {
    if width == 0 || height == 0 {
        return Err(PreprocessError::DegenerateImage { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_area_is_degenerate() {
        assert_eq!(
            ensure_non_empty(0, 10),
            Err(PreprocessError::DegenerateImage {
                width: 0,
                height: 10
            })
        );
        assert!(ensure_non_empty(1, 1).is_ok());
    }

    #[test]
    fn test_error_codes() {
        let err = PreprocessError::InvalidConfiguration("contrast".to_string());
        assert_eq!(err.code(), "INVALID_CONFIGURATION");
        assert_eq!(err.to_string(), "Invalid configuration: contrast");
    }
}
