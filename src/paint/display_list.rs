//! Display list types
//!
//! The display list is the replayable intermediate representation a paint
//! client produces for one recording pass: a flat, ordered list of items that
//! can be executed against any [`RasterTarget`] any number of times.
//!
//! # Overview
//!
//! The display list sits between recording and rasterization:
//!
//! ```text
//! Paint client → DisplayList → RasterSource → tiles/pixels
//! ```
//!
//! # Lifecycle
//!
//! A list is built append-only, then frozen exactly once:
//!
//! 1. `append_*` calls add items together with their visual rects
//! 2. `finalize()` builds the spatial index and drops the visual-rect vector
//! 3. the list is read-only forever after (replay, accounting queries)
//!
//! Appending after finalize, finalizing twice, or finalizing with mismatched
//! item/rect counts are contract violations and abort: a recording handoff
//! that trips these has already corrupted producer state.
//!
//! # Paired items
//!
//! `TransformBegin`/`TransformEnd` bracket their content. Both ends of a pair
//! must be appended with the visual rect of everything they bracket, so that
//! viewport culling keeps or drops the pair atomically.

use crate::geometry::Rect;
use crate::paint::canvas::RasterTarget;
use crate::paint::picture::Picture;
use crate::paint::rect_tree::RectTree;
use std::sync::Arc;

/// Op-count cutoff below which solid-color analysis is worth attempting
///
/// A tuning value, not a correctness boundary: lists with more ops simply
/// skip the analysis and are treated as not solid.
pub const SOLID_COLOR_ANALYSIS_MAX_OPS: usize = 10;

// ============================================================================
// Transform
// ============================================================================

/// A 2D translate+scale transform
///
/// The closed set of transforms recorded content can carry. Rotation and
/// shear never appear in recordings, which keeps rect mapping exact for the
/// analysis sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2d {
    /// Horizontal scale
    pub sx: f32,
    /// Vertical scale
    pub sy: f32,
    /// Horizontal translation, applied after scaling
    pub tx: f32,
    /// Vertical translation, applied after scaling
    pub ty: f32,
}

impl Transform2d {
    /// The identity transform
    pub const IDENTITY: Self = Self {
        sx: 1.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// A pure translation
    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self {
            sx: 1.0,
            sy: 1.0,
            tx,
            ty,
        }
    }

    /// A uniform scale about the origin
    pub const fn scale(s: f32) -> Self {
        Self {
            sx: s,
            sy: s,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Returns true for the identity transform
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    /// Composes two transforms: the result applies `inner` first, then `self`
    pub fn compose(self, inner: Transform2d) -> Self {
        Self {
            sx: self.sx * inner.sx,
            sy: self.sy * inner.sy,
            tx: self.sx * inner.tx + self.tx,
            ty: self.sy * inner.ty + self.ty,
        }
    }

    /// Maps a point through the transform
    pub fn map(self, x: f32, y: f32) -> (f32, f32) {
        (x * self.sx + self.tx, y * self.sy + self.ty)
    }
}

impl Default for Transform2d {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Display Items
// ============================================================================

/// A single display list item
///
/// A tagged union over the closed set of item kinds the pipeline records.
/// Items are immutable once appended.
#[derive(Debug, Clone)]
pub enum DisplayItem {
    /// Replay a shared recorded picture
    Drawing(Arc<Picture>),

    /// Enter a transform scope (paired with `TransformEnd`)
    TransformBegin(Transform2d),

    /// Leave the innermost transform scope
    TransformEnd,
}

impl DisplayItem {
    /// Returns true for `TransformBegin`/`TransformEnd`
    pub fn is_paired(&self) -> bool {
        matches!(self, DisplayItem::TransformBegin(_) | DisplayItem::TransformEnd)
    }
}

// ============================================================================
// Display List
// ============================================================================

/// An append-only, finalize-once list of display items
///
/// # Examples
///
/// ```
/// use fastcomp::paint::{DisplayList, Picture, PictureOp};
/// use fastcomp::{Rect, Rgba};
/// use std::sync::Arc;
///
/// let mut list = DisplayList::new();
/// let rect = Rect::from_xywh(0, 0, 10, 10);
/// let picture = Picture::new(rect, vec![PictureOp::FillRect { rect, color: Rgba::RED }]);
/// list.append_drawing(Arc::new(picture), rect);
/// list.finalize();
///
/// assert_eq!(list.approximate_op_count(), 1);
/// assert!(list.is_suitable_for_gpu_rasterization());
/// ```
#[derive(Debug)]
pub struct DisplayList {
    items: Vec<DisplayItem>,
    /// Parallel to `items` until finalize; replaced by the rect tree after.
    visual_rects: Vec<Rect>,
    rect_tree: RectTree,
    bounds: Rect,
    finalized: bool,
    /// Sticky AND over every appended drawing.
    suitable_for_gpu: bool,
    picture_bytes: usize,
    op_count: usize,
}

impl DisplayList {
    /// Creates an empty display list
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            visual_rects: Vec::new(),
            rect_tree: RectTree::default(),
            bounds: Rect::ZERO,
            finalized: false,
            suitable_for_gpu: true,
            picture_bytes: 0,
            op_count: 0,
        }
    }

    /// Creates an empty display list with reserved item capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let mut list = Self::new();
        list.items.reserve(capacity);
        list.visual_rects.reserve(capacity);
        list
    }

    /// Number of items appended
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no items were appended
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items in append order
    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    /// Union of all visual rects
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns true once `finalize()` has run
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn append(&mut self, item: DisplayItem, visual_rect: Rect) {
        assert!(!self.finalized, "append on a finalized DisplayList");
        self.bounds = self.bounds.union(visual_rect);
        self.items.push(item);
        self.visual_rects.push(visual_rect);
    }

    /// Appends a drawing item sharing a recorded picture
    ///
    /// `visual_rect` is the area the picture's replay can touch; it drives
    /// culled replay after finalize.
    pub fn append_drawing(&mut self, picture: Arc<Picture>, visual_rect: Rect) {
        self.suitable_for_gpu &= picture.is_suitable_for_gpu();
        self.picture_bytes += picture.byte_size();
        self.op_count += picture.op_count();
        self.append(DisplayItem::Drawing(picture), visual_rect);
    }

    /// Appends a transform-begin item
    ///
    /// `visual_rect` must cover everything up to the matching end item.
    pub fn append_transform_begin(&mut self, transform: Transform2d, visual_rect: Rect) {
        self.op_count += 1;
        self.append(DisplayItem::TransformBegin(transform), visual_rect);
    }

    /// Appends the matching transform-end item
    ///
    /// Carries the same visual rect as its begin so the pair culls together.
    pub fn append_transform_end(&mut self, visual_rect: Rect) {
        self.op_count += 1;
        self.append(DisplayItem::TransformEnd, visual_rect);
    }

    /// Freezes the list: builds the spatial index, drops the visual rects
    ///
    /// # Panics
    ///
    /// Panics if called twice, or if the item and visual-rect sequences have
    /// diverged (both indicate a corrupted recording pass).
    pub fn finalize(&mut self) {
        assert!(!self.finalized, "DisplayList finalized twice");
        assert_eq!(
            self.items.len(),
            self.visual_rects.len(),
            "item/visual-rect count mismatch at finalize"
        );
        self.rect_tree = RectTree::build(&self.visual_rects);
        self.visual_rects = Vec::new();
        self.finalized = true;
    }

    /// Replays items intersecting `clip` onto a raster target
    ///
    /// `clip` is in recording (layer) space; `scale` maps recording space to
    /// the target's device space. Items are replayed in append order, and the
    /// target's abort signal is polled between items so an analysis sink can
    /// stop the replay the moment it has an answer.
    ///
    /// Requires a finalized list; takes `&self` and touches no shared state,
    /// so concurrent replays from independent targets are safe.
    ///
    /// # Panics
    ///
    /// Panics if the list has not been finalized.
    pub fn raster(&self, target: &mut dyn RasterTarget, clip: Rect, scale: f32) {
        assert!(self.finalized, "raster on an unfinalized DisplayList");

        let mut indices = Vec::new();
        self.rect_tree.query(clip, &mut indices);
        if indices.is_empty() {
            return;
        }

        let scaled = scale != 1.0;
        if scaled {
            target.push_transform(Transform2d::scale(scale));
        }

        // Depth of transform pairs entered during this replay. The paired-rect
        // contract means culling keeps pairs atomically; the depth guard below
        // is the backstop for a client that broke that contract.
        let mut depth = 0usize;
        for index in indices {
            if target.abort_requested() {
                break;
            }
            match &self.items[index] {
                DisplayItem::Drawing(picture) => picture.replay(target),
                DisplayItem::TransformBegin(transform) => {
                    target.push_transform(*transform);
                    depth += 1;
                }
                DisplayItem::TransformEnd => {
                    debug_assert!(depth > 0, "TransformEnd culled apart from its begin");
                    if depth > 0 {
                        target.pop_transform();
                        depth -= 1;
                    }
                }
            }
        }
        for _ in 0..depth {
            target.pop_transform();
        }

        if scaled {
            target.pop_transform();
        }
    }

    /// Estimated heap footprint of the list and its shared pictures, in bytes
    pub fn approximate_memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.items.capacity() * std::mem::size_of::<DisplayItem>()
            + self.visual_rects.capacity() * std::mem::size_of::<Rect>()
            + self.rect_tree.byte_size()
            + self.picture_bytes
    }

    /// Total recorded op count across all items
    pub fn approximate_op_count(&self) -> usize {
        self.op_count
    }

    /// Returns true if the list is cheap enough to analyze for solid color
    pub fn should_be_analyzed_for_solid_color(&self) -> bool {
        self.op_count <= SOLID_COLOR_ANALYSIS_MAX_OPS
    }

    /// Whether every appended drawing is safe for GPU rasterization
    ///
    /// Sticky: once any item marks the list unsuitable it stays unsuitable.
    pub fn is_suitable_for_gpu_rasterization(&self) -> bool {
        self.suitable_for_gpu
    }
}

impl Default for DisplayList {
    fn default() -> Self {
        Self::new()
    }
}
