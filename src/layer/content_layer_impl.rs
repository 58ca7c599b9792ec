//! Consumer-side content layer
//!
//! The compositor/raster side of the commit boundary. A [`ContentLayerImpl`]
//! only ever receives state (a frozen raster source and the expanded
//! invalidation) and exposes it read-only to the tiling stage. It never
//! writes back through any of these references.

use crate::geometry::Size;
use crate::layer::content_layer::CommitDelta;
use crate::recording::raster_source::RasterSource;
use crate::region::Region;
use std::sync::Arc;

/// Compositor-thread counterpart of a [`crate::ContentLayer`]
///
/// # Examples
///
/// ```
/// use fastcomp::ContentLayerImpl;
///
/// let layer = ContentLayerImpl::new();
/// assert!(!layer.has_recordings());
/// assert!(layer.pending_invalidation().is_empty());
/// ```
#[derive(Debug)]
pub struct ContentLayerImpl {
  raster_source: Option<Arc<RasterSource>>,
  invalidation: Region,
  is_mask: bool,
  nearest_neighbor: bool,
  /// Frame number of the last applied commit; -1 before the first.
  ///
  /// Not monotonic: a layer that moves between independent producer trees
  /// legitimately commits a smaller number than before. Consumers must not
  /// treat a regression as corruption.
  source_frame_number: i64,
}

impl ContentLayerImpl {
  /// Creates an empty consumer layer
  pub fn new() -> Self {
    Self {
      raster_source: None,
      invalidation: Region::new(),
      is_mask: false,
      nearest_neighbor: false,
      source_frame_number: -1,
    }
  }

  /// Applies one commit delta
  ///
  /// Ordered exactly as the boundary requires: clear the consumer-visible
  /// invalidation, swap in the new delta, then attach the raster source.
  /// The external commit barrier guarantees no reader observes the middle.
  pub fn apply_commit(&mut self, delta: CommitDelta) {
    self.invalidation.clear();
    self.invalidation = delta.invalidation;
    self.is_mask = delta.is_mask;
    self.nearest_neighbor = delta.nearest_neighbor;
    self.source_frame_number = delta.frame_number;
    self.raster_source = Some(delta.raster_source);
  }

  /// The frozen raster source, once a commit has arrived
  pub fn raster_source(&self) -> Option<&Arc<RasterSource>> {
    self.raster_source.as_ref()
  }

  /// The invalidation delta awaiting the tiling stage
  pub fn pending_invalidation(&self) -> &Region {
    &self.invalidation
  }

  /// Hands the invalidation delta to the tiling stage, leaving it empty
  pub fn take_invalidation(&mut self) -> Region {
    self.invalidation.take()
  }

  /// True if the committed source carries recorded content
  pub fn has_recordings(&self) -> bool {
    self
      .raster_source
      .as_ref()
      .is_some_and(|source| source.has_recordings())
  }

  /// Layer size at the last commit
  pub fn size(&self) -> Size {
    self
      .raster_source
      .as_ref()
      .map_or(Size::ZERO, |source| source.size())
  }

  /// Whether the committed recording is safe for GPU rasterization
  pub fn is_suitable_for_gpu_rasterization(&self) -> bool {
    self
      .raster_source
      .as_ref()
      .map_or(true, |source| source.is_suitable_for_gpu_rasterization())
  }

  /// Whether the layer serves as a mask
  pub fn is_mask(&self) -> bool {
    self.is_mask
  }

  /// Whether content should be sampled nearest-neighbor
  pub fn nearest_neighbor(&self) -> bool {
    self.nearest_neighbor
  }

  /// Frame number of the last applied commit
  pub fn source_frame_number(&self) -> i64 {
    self.source_frame_number
  }
}

impl Default for ContentLayerImpl {
  fn default() -> Self {
    Self::new()
  }
}
