//! Error types for fastcomp
//!
//! Recoverable failures are small and concentrated at the raster boundary:
//! surface allocation and rasterization can fail, file/JSON output in the
//! bundled tools can fail. Everything else in the recording pipeline either
//! silently no-ops on benign empty state (zero-size layers, empty
//! invalidations) or is a programming-contract violation (double finalize,
//! mismatched item/rect counts, double benchmark completion) and asserts
//! instead of returning an error.
//!
//! All errors use the `thiserror` crate for minimal boilerplate and
//! proper error trait implementations.

use thiserror::Error;

/// Result type alias for fastcomp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for fastcomp
///
/// # Examples
///
/// ```
/// use fastcomp::error::{Error, RasterError};
///
/// fn raster() -> Result<(), Error> {
///   Err(Error::Raster(RasterError::SurfaceCreationFailed {
///     width: 0,
///     height: 600,
///   }))
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
  /// Rasterization or raster-surface error
  #[error("Raster error: {0}")]
  Raster(#[from] RasterError),

  /// I/O error (benchmark output files, etc.)
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that occur when replaying a recording into pixels
#[derive(Error, Debug, Clone)]
pub enum RasterError {
  /// Raster surface creation failed (zero or oversized dimensions)
  #[error("Failed to create raster surface: {width}x{height}")]
  SurfaceCreationFailed { width: u32, height: u32 },

  /// Rasterization failed
  #[error("Rasterization failed: {reason}")]
  RasterizationFailed { reason: String },
}
