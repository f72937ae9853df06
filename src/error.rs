use thiserror::Error;

/// Failures of the external segmentation collaborator.
#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("segmentation failed: {0}")]
    Failed(String),

    #[error("mask is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
    MaskSizeMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("mask I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced at the editor boundary.
///
/// Out-of-range pixel access is not represented here: `PixelBuffer` treats it
/// as a programming error and panics.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("invalid source image: {0}")]
    Input(String),

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error("export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EditorError>;
