//! Recorded painting primitives
//!
//! This module holds everything a recording pass produces and replays.
//!
//! # Responsibilities
//!
//! - **Display List**: append-only, finalize-once list of paint items with a
//!   bounding-rect spatial index for culled replay
//! - **Pictures**: shared, immutable recorded op payloads with byte/op
//!   accounting
//! - **Raster targets**: the surface abstraction replay executes against,
//!   a tiny-skia pixel canvas and a solid-color analysis sink
//! - **Picture cache**: the injected keyed cache capability paint clients
//!   use for cross-frame picture reuse
//!
//! # Architecture
//!
//! Recording is a two-phase contract:
//!
//! 1. a paint client appends items and finalizes the display list
//! 2. the frozen list is replayed, possibly concurrently, into raster
//!    targets, clipped to whatever part of the layer each consumer needs
//!
//! Nothing here is mutable after finalize; thread safety across the commit
//! boundary comes from that immutability, not from locks.

pub mod canvas;
pub mod color;
pub mod display_list;
pub mod picture;
pub mod picture_cache;
pub mod rect_tree;
pub mod solid_color;

pub use canvas::{PixmapCanvas, RasterTarget};
pub use color::Rgba;
pub use display_list::{
  DisplayItem, DisplayList, Transform2d, SOLID_COLOR_ANALYSIS_MAX_OPS,
};
pub use picture::{Picture, PictureId, PictureOp};
pub use picture_cache::{PictureCache, DEFAULT_PICTURE_CACHE_CAPACITY};
pub use rect_tree::RectTree;
pub use solid_color::SolidColorAnalyzer;
