//! Export error types.

use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while exporting a scene.
///
/// Only [`ExportError::RasterAllocation`] and [`ExportError::Document`] abort
/// an export; image errors are absorbed where they happen.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A page-sized raster could not be allocated.
    #[error("Failed to allocate {width}x{height} raster")]
    RasterAllocation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Building or serializing the PDF document failed.
    #[error("Document error: {0}")]
    Document(String),

    /// An image source could not be read.
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// An image source did not answer within the load budget.
    #[error("Image load timed out after {0:?}")]
    ImageTimeout(std::time::Duration),

    /// HTTP transport failed while fetching an image.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ExportError {
    /// Returns true if this error aborts the whole export.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RasterAllocation { .. } | Self::Document(_))
    }
}
