//! Producer and consumer layer trees
//!
//! [`LayerTree`] is the producer-side scene: the layer arena, the host
//! settings layers pick up at attach time, and the frame counter stamped on
//! each commit. [`ConsumerTree`] is its compositor-side double. The commit
//! barrier of a real compositor ("the consumer tree is quiescent while
//! properties push") is modeled by [`LayerTree::commit_to`] taking both
//! trees by `&mut`: the borrow checker enforces what a thread fence would.

use crate::geometry::Size;
use crate::layer::arena::{LayerArena, LayerId};
use crate::layer::content_layer::ContentLayer;
use crate::layer::content_layer_impl::ContentLayerImpl;
use rustc_hash::FxHashMap;

/// Host-supplied configuration layers receive at attach time
#[derive(Debug, Clone, Copy)]
pub struct HostSettings {
  /// Size of the device viewport; clamps how much of a huge layer records
  pub device_viewport_size: Size,
  /// Debug knob: replay multiplier carried into raster sources (≥ 1)
  pub slow_down_record_scale_factor: u32,
  /// Whether recording stores should build discardable-image metadata
  pub image_decode_tasks_enabled: bool,
}

impl Default for HostSettings {
  fn default() -> Self {
    Self {
      device_viewport_size: Size::ZERO,
      slow_down_record_scale_factor: 1,
      image_decode_tasks_enabled: false,
    }
  }
}

/// Producer-side scene: arena + settings + frame counter
///
/// # Examples
///
/// ```
/// use fastcomp::{ConsumerTree, ContentLayer, HostSettings, LayerTree, Size};
///
/// let mut tree = LayerTree::new(HostSettings::default());
/// let mut layer = ContentLayer::new();
/// layer.set_bounds(Size::new(100, 100));
/// let id = tree.add_layer(layer);
///
/// let mut consumer = ConsumerTree::new();
/// tree.commit_to(&mut consumer);
/// assert!(consumer.layer(id).is_some());
/// ```
#[derive(Debug, Default)]
pub struct LayerTree {
  arena: LayerArena,
  settings: HostSettings,
  source_frame_number: i64,
}

impl LayerTree {
  /// Creates an empty tree
  pub fn new(settings: HostSettings) -> Self {
    Self {
      arena: LayerArena::new(),
      settings,
      source_frame_number: 0,
    }
  }

  /// The host settings layers attach against
  pub fn settings(&self) -> &HostSettings {
    &self.settings
  }

  /// Frame number the next update/commit will use
  pub fn source_frame_number(&self) -> i64 {
    self.source_frame_number
  }

  /// Adds a layer, running its attach-time settings propagation
  pub fn add_layer(&mut self, mut layer: ContentLayer) -> LayerId {
    layer.attach(&self.settings);
    self.arena.insert(layer)
  }

  /// Removes a layer from the scene
  pub fn remove_layer(&mut self, id: LayerId) -> Option<ContentLayer> {
    self.arena.remove(id)
  }

  /// Borrows a layer
  pub fn layer(&self, id: LayerId) -> Option<&ContentLayer> {
    self.arena.get(id)
  }

  /// Mutably borrows a layer
  pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut ContentLayer> {
    self.arena.get_mut(id)
  }

  /// Ids of all live layers
  pub fn layer_ids(&self) -> Vec<LayerId> {
    self.arena.ids()
  }

  /// Number of live layers
  pub fn len(&self) -> usize {
    self.arena.len()
  }

  /// Returns true if the scene has no layers
  pub fn is_empty(&self) -> bool {
    self.arena.is_empty()
  }

  /// Links `mask` as the mask of `parent`
  pub fn set_mask_layer(&mut self, parent: LayerId, mask: Option<LayerId>) {
    self.arena.set_mask_layer(parent, mask);
  }

  /// Runs the recording pass on one layer with this tree's settings/frame
  pub fn update_layer(&mut self, id: LayerId) -> bool {
    let settings = self.settings;
    let frame_number = self.source_frame_number;
    self
      .arena
      .get_mut(id)
      .is_some_and(|layer| layer.update(&settings, frame_number))
  }

  /// Updates every layer; returns true if any recorded
  pub fn update_all(&mut self) -> bool {
    let mut any = false;
    for id in self.layer_ids() {
      any |= self.update_layer(id);
    }
    any
  }

  /// Pushes every layer's properties to the consumer tree and advances the
  /// frame counter
  ///
  /// This call *is* the commit barrier: both trees are exclusively borrowed
  /// for its duration, so no consumer-side reader can observe a half-applied
  /// delta.
  pub fn commit_to(&mut self, consumer: &mut ConsumerTree) {
    let frame_number = self.source_frame_number;
    for id in self.layer_ids() {
      let delta = self
        .arena
        .get_mut(id)
        .expect("layer_ids returned a dead id")
        .commit(frame_number);
      consumer.apply_commit(id, delta);
    }
    self.source_frame_number += 1;
  }
}

/// Consumer-side scene owning the [`ContentLayerImpl`]s
#[derive(Debug, Default)]
pub struct ConsumerTree {
  layers: FxHashMap<LayerId, ContentLayerImpl>,
}

impl ConsumerTree {
  /// Creates an empty consumer tree
  pub fn new() -> Self {
    Self::default()
  }

  /// Applies a commit delta, creating the consumer layer on first contact
  pub fn apply_commit(&mut self, id: LayerId, delta: crate::layer::content_layer::CommitDelta) {
    self.layers.entry(id).or_default().apply_commit(delta);
  }

  /// Borrows a consumer layer
  pub fn layer(&self, id: LayerId) -> Option<&ContentLayerImpl> {
    self.layers.get(&id)
  }

  /// Mutably borrows a consumer layer (the tiling stage drains invalidation
  /// through this)
  pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut ContentLayerImpl> {
    self.layers.get_mut(&id)
  }

  /// Drops a consumer layer
  pub fn remove_layer(&mut self, id: LayerId) -> Option<ContentLayerImpl> {
    self.layers.remove(&id)
  }

  /// Number of consumer layers
  pub fn len(&self) -> usize {
    self.layers.len()
  }

  /// Returns true if no commits have arrived
  pub fn is_empty(&self) -> bool {
    self.layers.is_empty()
  }
}
