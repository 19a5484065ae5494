use std::path::PathBuf;
use thiserror::Error;

use crate::pal::PlatformError;

/// Why a single icon could not be produced. None of these is fatal; the public
/// extraction entry points turn every kind into a missing icon.
#[derive(Debug, Error)]
pub enum IconError {
    #[error("no usable icon location: {0}")]
    LocationInvalid(String),

    #[error("icon index {requested} out of range for {} ({count} icons)", .path.display())]
    IndexOutOfRange {
        path: PathBuf,
        requested: u32,
        count: u32,
    },

    #[error("failed to extract icon from {} at index {index}: {reason}", .path.display())]
    HandleExtraction {
        path: PathBuf,
        index: u32,
        reason: String,
    },

    #[error("failed to render icon: {0}")]
    Render(#[source] PlatformError),

    #[error("unsupported bitmap format: {0}")]
    FormatUnsupported(String),

    #[error("failed to encode icon: {0}")]
    Encoding(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
