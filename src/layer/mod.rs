//! Layers and the producer → consumer commit boundary
//!
//! The producer side ([`ContentLayer`]) is what an embedder mutates: bounds,
//! damage rects, mask flags. The consumer side ([`ContentLayerImpl`]) is what
//! the tiling/raster stage reads: a frozen raster source plus the expanded
//! invalidation describing the latest delta.
//!
//! The two sides meet at exactly one point: [`ContentLayer::commit`] produces
//! a [`CommitDelta`] that [`ContentLayerImpl::apply_commit`] consumes. The
//! external commit barrier (the guarantee that the consumer tree is quiescent
//! while deltas apply) is modeled by that explicit call; there is no
//! lock-based synchronization anywhere on this path.
//!
//! Layers live in a [`LayerArena`] and reference each other (the mask
//! relation) by [`LayerId`] only; the arena is the sole owner.

pub mod arena;
pub mod content_layer;
pub mod content_layer_impl;
pub mod tree;

pub use arena::{LayerArena, LayerId};
pub use content_layer::{CommitDelta, ContentLayer};
pub use content_layer_impl::ContentLayerImpl;
pub use tree::{ConsumerTree, HostSettings, LayerTree};
