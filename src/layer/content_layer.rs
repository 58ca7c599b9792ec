//! Producer-side content layer
//!
//! A [`ContentLayer`] is the object an embedder mutates between frames: it
//! accumulates damage rects, tracks bounds, and owns the recording store
//! plus (optionally) the paint client that supplies content. Once per frame
//! [`ContentLayer::update`] runs the update-and-expand-invalidation pass;
//! once per commit [`ContentLayer::commit`] drains the accumulated
//! invalidation into a [`CommitDelta`] for the consumer side.

use crate::geometry::{Rect, Size};
use crate::layer::arena::LayerId;
use crate::layer::tree::HostSettings;
use crate::paint::display_list::DisplayList;
use crate::recording::raster_source::RasterSource;
use crate::recording::store::{PaintClient, PaintingControl, RecordingStore};
use crate::region::Region;
use std::sync::Arc;

/// Everything one commit transfers across the producer/consumer boundary
///
/// Ownership of the invalidation region moves with the delta: after the
/// producing layer builds one, its own accumulator is empty.
#[derive(Debug)]
pub struct CommitDelta {
  /// Frozen snapshot of the layer's recording
  pub raster_source: Arc<RasterSource>,
  /// The damage this frame introduced, already expanded for exposure changes
  pub invalidation: Region,
  /// Whether the layer serves as a mask
  pub is_mask: bool,
  /// Whether the layer's content should be sampled nearest-neighbor
  pub nearest_neighbor: bool,
  /// Producer frame number at commit time
  pub frame_number: i64,
}

/// Main-thread-owned layer that records content through a paint client
///
/// # Examples
///
/// ```
/// use fastcomp::{ContentLayer, Rect, Size};
///
/// let mut layer = ContentLayer::new();
/// layer.set_bounds(Size::new(100, 100));
/// layer.set_needs_display_rect(Rect::from_xywh(0, 0, 10, 10));
/// // Without a paint client, updates are benign no-ops.
/// ```
pub struct ContentLayer {
  client: Option<Box<dyn PaintClient>>,
  bounds: Size,
  recording: RecordingStore,
  /// Damage accumulated by `set_needs_display_rect` since the last update.
  pending_invalidation: Region,
  /// Expanded damage accumulated by updates since the last commit.
  last_updated_invalidation: Region,
  /// Frame number stamped at the most recent update; -1 before the first.
  update_source_frame_number: i64,
  needs_push: bool,
  is_mask: bool,
  nearest_neighbor: bool,
  mask_layer: Option<LayerId>,
  mask_parent: Option<LayerId>,
}

impl ContentLayer {
  /// Creates a layer with no content source
  pub fn new() -> Self {
    Self {
      client: None,
      bounds: Size::ZERO,
      recording: RecordingStore::new(),
      pending_invalidation: Region::new(),
      last_updated_invalidation: Region::new(),
      update_source_frame_number: -1,
      needs_push: false,
      is_mask: false,
      nearest_neighbor: false,
      mask_layer: None,
      mask_parent: None,
    }
  }

  /// Creates a layer painting through the given client
  pub fn with_client(client: Box<dyn PaintClient>) -> Self {
    let mut layer = Self::new();
    layer.client = Some(client);
    layer
  }

  /// Installs (or replaces) the paint client
  pub fn set_client(&mut self, client: Box<dyn PaintClient>) {
    self.client = Some(client);
  }

  /// Returns true if a paint client is installed
  pub fn has_client(&self) -> bool {
    self.client.is_some()
  }

  /// Copies host settings into the recording store (attach-time hook)
  pub fn attach(&mut self, settings: &HostSettings) {
    self
      .recording
      .set_generate_image_metadata(settings.image_decode_tasks_enabled);
    self
      .recording
      .set_slow_down_record_scale_factor(settings.slow_down_record_scale_factor);
  }

  /// Current layer bounds
  pub fn bounds(&self) -> Size {
    self.bounds
  }

  /// Resizes the layer
  ///
  /// Recording state is reconciled at the next update; committing a resized
  /// layer without updating first triggers the stale-geometry guard.
  pub fn set_bounds(&mut self, bounds: Size) {
    if self.bounds == bounds {
      return;
    }
    self.bounds = bounds;
    self.needs_push = true;
  }

  /// Marks `rect ∩ bounds` as damaged
  pub fn set_needs_display_rect(&mut self, rect: Rect) {
    if self.bounds.is_empty() {
      return;
    }
    if let Some(clipped) = rect.intersection(Rect::from_size(self.bounds)) {
      self.pending_invalidation.union_rect(clipped);
    }
  }

  /// Whether the layer serves as a mask
  pub fn is_mask(&self) -> bool {
    self.is_mask
  }

  /// Flags the layer as a mask
  pub fn set_is_mask(&mut self, is_mask: bool) {
    if self.is_mask != is_mask {
      self.is_mask = is_mask;
      self.needs_push = true;
    }
  }

  /// Whether content should be sampled nearest-neighbor
  pub fn nearest_neighbor(&self) -> bool {
    self.nearest_neighbor
  }

  /// Toggles nearest-neighbor sampling
  pub fn set_nearest_neighbor(&mut self, nearest_neighbor: bool) {
    if self.nearest_neighbor != nearest_neighbor {
      self.nearest_neighbor = nearest_neighbor;
      self.needs_push = true;
    }
  }

  /// The mask attached to this layer, if any
  pub fn mask_layer(&self) -> Option<LayerId> {
    self.mask_layer
  }

  /// The layer this layer masks, if it is a mask
  pub fn mask_parent(&self) -> Option<LayerId> {
    self.mask_parent
  }

  pub(crate) fn set_mask_layer_id(&mut self, mask: Option<LayerId>) {
    self.mask_layer = mask;
  }

  pub(crate) fn set_mask_parent(&mut self, parent: Option<LayerId>) {
    self.mask_parent = parent;
  }

  /// True when producer state changed since the last commit
  pub fn needs_push_properties(&self) -> bool {
    self.needs_push
  }

  /// The owned recording store (read access for tests and tools)
  pub fn recording(&self) -> &RecordingStore {
    &self.recording
  }

  /// Frame number stamped at the most recent update (-1 before the first)
  pub fn update_source_frame_number(&self) -> i64 {
    self.update_source_frame_number
  }

  /// Runs one recording pass if anything visible changed
  ///
  /// Returns true iff a new display list was recorded. Without a paint
  /// client this is a benign no-op.
  pub fn update(&mut self, settings: &HostSettings, frame_number: i64) -> bool {
    let Some(client) = self.client.as_deref_mut() else {
      return false;
    };
    self.update_source_frame_number = frame_number;

    // Huge layers only record around what can become visible.
    let viewport_hint = Rect::from_size(settings.device_viewport_size);

    let mut invalidation = self.pending_invalidation.take();
    let updated = self.recording.update_and_expand_invalidation(
      client,
      &mut invalidation,
      self.bounds,
      viewport_hint,
      PaintingControl::Normal,
    );
    self.last_updated_invalidation.union(&invalidation);
    if updated {
      self.needs_push = true;
    }
    updated
  }

  /// Builds the delta for this commit, draining the invalidation accumulator
  ///
  /// The stale-geometry guard: a layer resized after its last update must
  /// not push the old recording (mismatched tiles), so the recording is
  /// dropped instead.
  pub fn commit(&mut self, frame_number: i64) -> CommitDelta {
    if self.recording.size() != self.bounds && frame_number != self.update_source_frame_number {
      self.recording.set_empty_bounds();
    }
    self.needs_push = false;
    CommitDelta {
      raster_source: self.recording.create_raster_source(),
      invalidation: self.last_updated_invalidation.take(),
      is_mask: self.is_mask,
      nearest_neighbor: self.nearest_neighbor,
      frame_number,
    }
  }

  // Benchmark hooks: the harness measures the raw paint path, bypassing the
  // invalidation early-outs entirely.

  /// Runs the paint client directly under the given control
  ///
  /// # Panics
  ///
  /// Panics without a paint client; harness callers skip clientless layers.
  pub fn record_for_benchmark(&mut self, control: PaintingControl) -> DisplayList {
    let client = self
      .client
      .as_deref_mut()
      .expect("record_for_benchmark without a paint client");
    client.paint_contents_to_display_list(control)
  }

  /// The client's paintable region (empty without a client)
  pub fn paintable_region(&self) -> Rect {
    self
      .client
      .as_deref()
      .map_or(Rect::ZERO, PaintClient::paintable_region)
  }

  /// The client's unshared memory estimate (zero without a client)
  pub fn approximate_unshared_memory_usage(&self) -> usize {
    self
      .client
      .as_deref()
      .map_or(0, PaintClient::approximate_unshared_memory_usage)
  }
}

impl Default for ContentLayer {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Debug for ContentLayer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ContentLayer")
      .field("bounds", &self.bounds)
      .field("has_client", &self.client.is_some())
      .field("needs_push", &self.needs_push)
      .field("is_mask", &self.is_mask)
      .field("update_source_frame_number", &self.update_source_frame_number)
      .finish_non_exhaustive()
  }
}
