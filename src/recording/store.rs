//! Recording store: update-and-expand-invalidation
//!
//! The store sits between a layer and its paint client. It remembers what
//! was recorded last time (`recorded_viewport`, the display list) and what
//! has been damaged since (`pending_invalidation`), and implements the one
//! algorithm the whole pipeline turns on: deciding whether a recording pass
//! is needed and expanding the caller's invalidation to account for viewport
//! exposure changes.
//!
//! The store never paints. Content comes exclusively from the injected
//! [`PaintClient`] capability.

use crate::geometry::{Rect, Size};
use crate::paint::color::Rgba;
use crate::paint::display_list::DisplayList;
use crate::paint::solid_color;
use crate::recording::raster_source::RasterSource;
use crate::region::Region;
use std::sync::Arc;

/// Selectively disables recording optimizations
///
/// Every variant other than `Normal` exists to measure the relative cost of
/// one optimization in the benchmark harness; production recording always
/// uses `Normal`. Interpretation is entirely up to the paint client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaintingControl {
  /// Record with all optimizations enabled
  Normal,
  /// Skip painting entirely (measures traversal overhead)
  PaintingDisabled,
  /// Bypass every picture cache (measures cold recording)
  CachingDisabled,
  /// Reuse previously built pictures without reconstruction
  ConstructionDisabled,
  /// Bypass only subsequence-level caches
  SubsequenceCachingDisabled,
  /// Repaint only the damaged area, reusing the rest
  PartialInvalidation,
}

/// The painting capability a recording store orchestrates
///
/// Implementations own actual content (a document, a scene, a fixture grid).
/// The returned display list must already be finalized; handing over an
/// unfinalized list is a contract violation the store aborts on.
pub trait PaintClient {
  /// The rectangle the client can currently paint, in layer space
  fn paintable_region(&self) -> Rect;

  /// Records the client's content into a finalized display list
  fn paint_contents_to_display_list(&mut self, control: PaintingControl) -> DisplayList;

  /// True if painting covers every pixel of the layer bounds
  fn fills_bounds_completely(&self) -> bool;

  /// Estimated bytes of client-side state not shared with the display list
  fn approximate_unshared_memory_usage(&self) -> usize;
}

/// Lifecycle state of a recording store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
  /// No recording exists (empty bounds or never recorded)
  Empty,
  /// A recording exists and no damage is pending
  Recorded,
  /// A recording exists but pending damage awaits the next update
  Invalidated,
}

/// Owns a layer's display list and invalidation/viewport bookkeeping
///
/// # Examples
///
/// ```
/// use fastcomp::{Rect, RecordingStore, Size};
///
/// let mut store = RecordingStore::new();
/// store.set_size(Size::new(100, 100));
/// store.set_needs_display_rect(Rect::from_xywh(0, 0, 10, 10));
/// assert!(!store.has_recording());
/// ```
#[derive(Debug)]
pub struct RecordingStore {
  display_list: Option<Arc<DisplayList>>,
  recorded_viewport: Rect,
  size: Size,
  pending_invalidation: Region,
  is_solid_color: bool,
  solid_color: Rgba,
  requires_clear: bool,
  generate_image_metadata: bool,
  slow_down_record_scale_factor: u32,
}

impl RecordingStore {
  /// Creates an empty store
  pub fn new() -> Self {
    Self {
      display_list: None,
      recorded_viewport: Rect::ZERO,
      size: Size::ZERO,
      pending_invalidation: Region::new(),
      is_solid_color: false,
      solid_color: Rgba::TRANSPARENT,
      requires_clear: false,
      generate_image_metadata: false,
      slow_down_record_scale_factor: 1,
    }
  }

  /// Current layer size
  pub fn size(&self) -> Size {
    self.size
  }

  /// Adopts a layer size without recording
  ///
  /// `update_and_expand_invalidation` also adopts the size; this exists for
  /// callers configuring a store before the first update.
  pub fn set_size(&mut self, size: Size) {
    self.size = size;
  }

  /// The viewport handed to the paint client at the last recording
  pub fn recorded_viewport(&self) -> Rect {
    self.recorded_viewport
  }

  /// The current display list, if any
  ///
  /// `None` iff the layer has empty bounds or has never been recorded.
  pub fn display_list(&self) -> Option<&Arc<DisplayList>> {
    self.display_list.as_ref()
  }

  /// Returns true if a recording exists
  pub fn has_recording(&self) -> bool {
    self.display_list.is_some()
  }

  /// Damage accumulated since the last update
  pub fn pending_invalidation(&self) -> &Region {
    &self.pending_invalidation
  }

  /// Lifecycle state (empty / recorded / invalidated)
  pub fn state(&self) -> StoreState {
    match (&self.display_list, self.pending_invalidation.is_empty()) {
      (None, _) => StoreState::Empty,
      (Some(_), true) => StoreState::Recorded,
      (Some(_), false) => StoreState::Invalidated,
    }
  }

  /// True when the last recording painted as a single flat color
  pub fn is_solid_color(&self) -> bool {
    self.is_solid_color
  }

  /// The color found by solid-color analysis (meaningful when
  /// `is_solid_color` is true)
  pub fn solid_color(&self) -> Rgba {
    self.solid_color
  }

  /// True when the recording does not cover its bounds and consumers must
  /// clear before replay
  pub fn requires_clear(&self) -> bool {
    self.requires_clear
  }

  /// Whether adoption should also build discardable-image metadata
  pub fn generate_image_metadata(&self) -> bool {
    self.generate_image_metadata
  }

  /// Toggles discardable-image metadata generation (host settings knob)
  pub fn set_generate_image_metadata(&mut self, enabled: bool) {
    self.generate_image_metadata = enabled;
  }

  /// Debug knob: replay multiplier carried into raster sources
  pub fn slow_down_record_scale_factor(&self) -> u32 {
    self.slow_down_record_scale_factor
  }

  /// Sets the replay multiplier (host settings knob, ≥ 1)
  pub fn set_slow_down_record_scale_factor(&mut self, factor: u32) {
    self.slow_down_record_scale_factor = factor.max(1);
  }

  /// Whether the current recording is safe for GPU rasterization
  ///
  /// An empty store defaults to suitable.
  pub fn is_suitable_for_gpu_rasterization(&self) -> bool {
    self
      .display_list
      .as_ref()
      .map_or(true, |list| list.is_suitable_for_gpu_rasterization())
  }

  /// Unions `rect ∩ bounds` into the pending invalidation
  ///
  /// Silent no-op for zero-size bounds or damage entirely outside them.
  pub fn set_needs_display_rect(&mut self, rect: Rect) {
    if self.size.is_empty() {
      return;
    }
    if let Some(clipped) = rect.intersection(Rect::from_size(self.size)) {
      self.pending_invalidation.union_rect(clipped);
    }
  }

  /// Drops all recorded content and bookkeeping
  ///
  /// Used when a layer's bounds collapse, and by the commit-time
  /// stale-geometry guard.
  pub fn set_empty_bounds(&mut self) {
    self.size = Size::ZERO;
    self.display_list = None;
    self.recorded_viewport = Rect::ZERO;
    self.pending_invalidation.clear();
    self.is_solid_color = false;
    self.solid_color = Rgba::TRANSPARENT;
    self.requires_clear = false;
  }

  /// Decides whether a recording pass is needed, runs it, and expands the
  /// caller's invalidation
  ///
  /// The caller's `invalidation` region is consumed (swapped into the
  /// store's pending damage) and receives the expanded result back on
  /// return, so stale regions can never be reused by accident.
  ///
  /// `viewport_hint`, when non-empty, clamps the client's paintable region:
  /// producers pass a window derived from the device viewport so enormous
  /// layers only record around what can become visible.
  ///
  /// Returns true iff a new display list was recorded.
  pub fn update_and_expand_invalidation(
    &mut self,
    client: &mut dyn PaintClient,
    invalidation: &mut Region,
    layer_size: Size,
    viewport_hint: Rect,
    control: PaintingControl,
  ) -> bool {
    if layer_size.is_empty() {
      self.set_empty_bounds();
      invalidation.clear();
      return false;
    }

    let mut updated = false;

    // 1. Adopt a changed size.
    if layer_size != self.size {
      self.size = layer_size;
    }

    // 2. Swap the caller-supplied invalidation into pending damage; the
    // caller's copy is cleared until the expanded result comes back.
    self.pending_invalidation.union(invalidation);
    invalidation.clear();

    // 3. Viewport exposure: invalidate the symmetric difference between the
    // old and new recorded viewports.
    let paintable = client.paintable_region();
    let new_viewport = if viewport_hint.is_empty() {
      paintable
    } else {
      paintable.intersection(viewport_hint).unwrap_or(Rect::ZERO)
    };
    if new_viewport != self.recorded_viewport {
      let mut no_longer_exposed = Region::from_rect(self.recorded_viewport);
      no_longer_exposed.subtract_rect(new_viewport);
      let mut newly_exposed = Region::from_rect(new_viewport);
      newly_exposed.subtract_rect(self.recorded_viewport);
      self.pending_invalidation.union(&no_longer_exposed);
      self.pending_invalidation.union(&newly_exposed);
      self.recorded_viewport = new_viewport;
      updated = true;
    }

    // 4. Off-screen damage: nothing visible changed, keep the recording and
    // hand the (unexpanded) damage straight back.
    if !updated
      && !self
        .pending_invalidation
        .intersects_rect(self.recorded_viewport)
    {
      self.pending_invalidation.swap(invalidation);
      return false;
    }

    // 5. Nothing changed at all.
    if self.pending_invalidation.is_empty() {
      return false;
    }

    // 6. Record.
    let list = client.paint_contents_to_display_list(control);
    self.requires_clear = !client.fills_bounds_completely();
    self.adopt_display_list(list);
    self.pending_invalidation.swap(invalidation);
    true
  }

  /// Freezes the current recording state into a shareable raster source
  pub fn create_raster_source(&self) -> Arc<RasterSource> {
    Arc::new(RasterSource::from_recording(self))
  }

  fn adopt_display_list(&mut self, list: DisplayList) {
    assert!(
      list.is_finalized(),
      "adopted DisplayList must be finalized"
    );
    self.display_list = Some(Arc::new(list));
    self.determine_if_solid_color();
  }

  /// Re-runs solid-color analysis against the current recording
  ///
  /// Only attempted when the list is cheap enough to analyze; everything
  /// else is treated as not solid.
  fn determine_if_solid_color(&mut self) {
    self.is_solid_color = false;
    self.solid_color = Rgba::TRANSPARENT;
    let Some(list) = &self.display_list else {
      return;
    };
    if !list.should_be_analyzed_for_solid_color() {
      return;
    }
    if let Some(color) = solid_color::analyze(list, self.recorded_viewport) {
      self.is_solid_color = true;
      self.solid_color = color;
    }
  }
}

impl Default for RecordingStore {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::paint::picture::{Picture, PictureOp};

  /// Minimal paint client painting one covering colored rect per pass.
  struct SolidClient {
    bounds: Rect,
    color: Rgba,
    paint_calls: usize,
  }

  impl SolidClient {
    fn new(width: i32, height: i32, color: Rgba) -> Self {
      Self {
        bounds: Rect::from_xywh(0, 0, width, height),
        color,
        paint_calls: 0,
      }
    }
  }

  impl PaintClient for SolidClient {
    fn paintable_region(&self) -> Rect {
      self.bounds
    }

    fn paint_contents_to_display_list(&mut self, _control: PaintingControl) -> DisplayList {
      self.paint_calls += 1;
      let mut list = DisplayList::new();
      let picture = Picture::new(
        self.bounds,
        vec![PictureOp::FillRect {
          rect: self.bounds,
          color: self.color,
        }],
      );
      list.append_drawing(Arc::new(picture), self.bounds);
      list.finalize();
      list
    }

    fn fills_bounds_completely(&self) -> bool {
      true
    }

    fn approximate_unshared_memory_usage(&self) -> usize {
      64
    }
  }

  fn update(
    store: &mut RecordingStore,
    client: &mut SolidClient,
    invalidation: &mut Region,
    size: Size,
  ) -> bool {
    store.update_and_expand_invalidation(
      client,
      invalidation,
      size,
      Rect::ZERO,
      PaintingControl::Normal,
    )
  }

  #[test]
  fn test_first_update_records() {
    let mut store = RecordingStore::new();
    let mut client = SolidClient::new(50, 50, Rgba::WHITE);
    let mut invalidation = Region::new();

    assert!(update(&mut store, &mut client, &mut invalidation, Size::new(50, 50)));
    assert!(store.has_recording());
    assert_eq!(store.state(), StoreState::Recorded);
    assert_eq!(store.recorded_viewport(), Rect::from_xywh(0, 0, 50, 50));
    // The whole viewport was newly exposed.
    assert_eq!(invalidation.area(), 2500);
  }

  #[test]
  fn test_noop_update_is_idempotent() {
    let mut store = RecordingStore::new();
    let mut client = SolidClient::new(50, 50, Rgba::WHITE);
    let mut invalidation = Region::new();
    update(&mut store, &mut client, &mut invalidation, Size::new(50, 50));
    invalidation.clear();

    let list_before = Arc::as_ptr(store.display_list().unwrap());
    assert!(!update(&mut store, &mut client, &mut invalidation, Size::new(50, 50)));
    assert!(invalidation.is_empty());
    assert_eq!(Arc::as_ptr(store.display_list().unwrap()), list_before);
    assert_eq!(client.paint_calls, 1);
  }

  #[test]
  fn test_damage_triggers_repaint_and_expansion_roundtrip() {
    let mut store = RecordingStore::new();
    let mut client = SolidClient::new(50, 50, Rgba::WHITE);
    let mut invalidation = Region::new();
    update(&mut store, &mut client, &mut invalidation, Size::new(50, 50));
    invalidation.clear();

    store.set_needs_display_rect(Rect::from_xywh(5, 5, 10, 10));
    assert_eq!(store.state(), StoreState::Invalidated);
    assert!(update(&mut store, &mut client, &mut invalidation, Size::new(50, 50)));
    assert_eq!(invalidation, Region::from_rect(Rect::from_xywh(5, 5, 10, 10)));
    assert!(store.pending_invalidation().is_empty());
  }

  #[test]
  fn test_damage_clipped_to_bounds() {
    let mut store = RecordingStore::new();
    store.set_size(Size::new(50, 50));
    store.set_needs_display_rect(Rect::from_xywh(40, 40, 100, 100));
    assert_eq!(
      *store.pending_invalidation(),
      Region::from_rect(Rect::from_xywh(40, 40, 10, 10))
    );
  }

  #[test]
  fn test_set_needs_display_noop_on_empty_bounds() {
    let mut store = RecordingStore::new();
    store.set_needs_display_rect(Rect::from_xywh(0, 0, 10, 10));
    assert!(store.pending_invalidation().is_empty());
  }

  #[test]
  fn test_viewport_change_invalidates_symmetric_difference() {
    let mut store = RecordingStore::new();
    let mut client = SolidClient::new(100, 100, Rgba::WHITE);
    let mut invalidation = Region::new();
    update(&mut store, &mut client, &mut invalidation, Size::new(100, 100));
    invalidation.clear();

    // Shrink the paintable region: the strip that fell away is invalidated,
    // the still-covered part is not.
    client.bounds = Rect::from_xywh(0, 0, 100, 60);
    assert!(update(&mut store, &mut client, &mut invalidation, Size::new(100, 100)));
    assert_eq!(invalidation, Region::from_rect(Rect::from_xywh(0, 60, 100, 40)));
  }

  #[test]
  fn test_offscreen_damage_skips_recording() {
    let mut store = RecordingStore::new();
    let mut client = SolidClient::new(100, 100, Rgba::WHITE);
    let mut invalidation = Region::new();
    // Record only the top half via the hint.
    store.update_and_expand_invalidation(
      &mut client,
      &mut invalidation,
      Size::new(100, 100),
      Rect::from_xywh(0, 0, 100, 50),
      PaintingControl::Normal,
    );
    invalidation.clear();
    let paints_before = client.paint_calls;

    // Damage below the recorded viewport: no new recording.
    store.set_needs_display_rect(Rect::from_xywh(0, 80, 10, 10));
    let updated = store.update_and_expand_invalidation(
      &mut client,
      &mut invalidation,
      Size::new(100, 100),
      Rect::from_xywh(0, 0, 100, 50),
      PaintingControl::Normal,
    );
    assert!(!updated);
    assert_eq!(client.paint_calls, paints_before);
    // The damage is still handed back for the consumer side.
    assert_eq!(invalidation, Region::from_rect(Rect::from_xywh(0, 80, 10, 10)));
  }

  #[test]
  fn test_empty_size_drops_recording() {
    let mut store = RecordingStore::new();
    let mut client = SolidClient::new(50, 50, Rgba::WHITE);
    let mut invalidation = Region::new();
    update(&mut store, &mut client, &mut invalidation, Size::new(50, 50));
    assert!(store.has_recording());

    assert!(!update(&mut store, &mut client, &mut invalidation, Size::ZERO));
    assert!(!store.has_recording());
    assert_eq!(store.state(), StoreState::Empty);
    assert_eq!(store.size(), Size::ZERO);
  }

  #[test]
  fn test_solid_color_detected() {
    let mut store = RecordingStore::new();
    let mut client = SolidClient::new(50, 50, Rgba::GREEN);
    let mut invalidation = Region::new();
    update(&mut store, &mut client, &mut invalidation, Size::new(50, 50));
    assert!(store.is_solid_color());
    assert_eq!(store.solid_color(), Rgba::GREEN);
  }

  #[test]
  fn test_solid_color_analysis_gated_by_op_count() {
    /// Paints the same color many times, exceeding the analysis cutoff.
    struct BusyClient {
      bounds: Rect,
    }
    impl PaintClient for BusyClient {
      fn paintable_region(&self) -> Rect {
        self.bounds
      }
      fn paint_contents_to_display_list(&mut self, _control: PaintingControl) -> DisplayList {
        let mut list = DisplayList::new();
        for _ in 0..=crate::paint::display_list::SOLID_COLOR_ANALYSIS_MAX_OPS {
          let picture = Picture::new(
            self.bounds,
            vec![PictureOp::FillRect {
              rect: self.bounds,
              color: Rgba::RED,
            }],
          );
          list.append_drawing(Arc::new(picture), self.bounds);
        }
        list.finalize();
        list
      }
      fn fills_bounds_completely(&self) -> bool {
        true
      }
      fn approximate_unshared_memory_usage(&self) -> usize {
        0
      }
    }

    let mut store = RecordingStore::new();
    let mut client = BusyClient {
      bounds: Rect::from_xywh(0, 0, 20, 20),
    };
    let mut invalidation = Region::new();
    store.update_and_expand_invalidation(
      &mut client,
      &mut invalidation,
      Size::new(20, 20),
      Rect::ZERO,
      PaintingControl::Normal,
    );
    // Every op painted the same covering color, but the op count disables
    // the analysis pass entirely.
    assert!(!store.is_solid_color());
  }
}
