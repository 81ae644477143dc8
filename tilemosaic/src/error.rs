//! Error types used by the crate.

use image::ImageError;
use thiserror::Error;

/// Tilemosaic error type.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// I/O error (network or file)
    #[error("failed to load data")]
    Io,
    /// Image decoding error.
    #[error("image decode error: {0:?}")]
    ImageDecode(#[from] ImageError),
    /// A tile decoded to dimensions other than the ones the tile schema expects.
    #[error("tile decoded to {width}x{height}, expected {expected}x{expected}")]
    UnexpectedTileSize {
        /// Tile side length the schema is configured with.
        expected: u32,
        /// Actual width of the decoded image.
        width: u32,
        /// Actual height of the decoded image.
        height: u32,
    },
    /// Item not found.
    #[error("item not found")]
    NotFound,
    /// A component is configured incorrectly.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
    /// Error reading/writing data to the FS.
    #[error("{0}")]
    FsIo(String),
}

impl From<reqwest::Error> for MosaicError {
    fn from(_value: reqwest::Error) -> Self {
        Self::Io
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(value: std::io::Error) -> Self {
        Self::FsIo(value.to_string())
    }
}
