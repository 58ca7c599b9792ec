//! Recorded picture payloads
//!
//! A [`Picture`] is the opaque unit of recorded content a drawing item
//! carries: an immutable list of primitive paint operations over a small
//! closed set, plus the accounting (byte size, op count, GPU suitability)
//! the recording store needs when classifying a finished display list.
//!
//! Pictures are shared (`Arc`) between display lists and the picture cache;
//! rebuilding one is the cost the caching-disabled benchmark modes exist to
//! measure.

use crate::geometry::Rect;
use crate::paint::canvas::RasterTarget;
use crate::paint::color::Rgba;

/// Cache key for recorded pictures
///
/// Opaque to the pipeline; paint clients decide how ids map to content
/// (fastcomp never derives meaning from the value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PictureId(pub u64);

/// A primitive recorded paint operation
///
/// Deliberately a small closed set: the pipeline only needs enough op
/// variety to exercise replay, culling, and solid-color analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PictureOp {
  /// Fill a rectangle with a color
  FillRect { rect: Rect, color: Rgba },
  /// Stroke a rectangle outline with a color and pixel width
  StrokeRect { rect: Rect, color: Rgba, width: i32 },
}

impl PictureOp {
  /// The rectangle the op can touch
  pub fn bounds(self) -> Rect {
    match self {
      PictureOp::FillRect { rect, .. } => rect,
      // Strokes are centered on the edge, so they spill half a width out.
      PictureOp::StrokeRect { rect, width, .. } => rect.inflate((width + 1) / 2),
    }
  }
}

/// An immutable recorded picture
///
/// Built once by a paint client, then shared read-only. The byte-size and
/// op-count estimates feed benchmark accounting and the cheap-analysis
/// cutoff for solid-color detection.
#[derive(Debug)]
pub struct Picture {
  ops: Vec<PictureOp>,
  bounds: Rect,
  suitable_for_gpu: bool,
}

impl Picture {
  /// Creates a picture from recorded ops
  ///
  /// `bounds` is the cull rect of the recording, not necessarily the tight
  /// union of op bounds.
  pub fn new(bounds: Rect, ops: Vec<PictureOp>) -> Self {
    Self {
      ops,
      bounds,
      suitable_for_gpu: true,
    }
  }

  /// Marks the picture as unsuitable for GPU rasterization
  ///
  /// Paint clients call this when a recording contains content the GPU
  /// path handles poorly (the display list ANDs the flag over all items).
  pub fn mark_unsuitable_for_gpu(&mut self) {
    self.suitable_for_gpu = false;
  }

  /// The recording's cull rect
  pub fn bounds(&self) -> Rect {
    self.bounds
  }

  /// Number of recorded ops
  pub fn op_count(&self) -> usize {
    self.ops.len()
  }

  /// Recorded ops in paint order
  pub fn ops(&self) -> &[PictureOp] {
    &self.ops
  }

  /// Whether this recording is safe for GPU rasterization
  pub fn is_suitable_for_gpu(&self) -> bool {
    self.suitable_for_gpu
  }

  /// Estimated heap footprint of the recording, in bytes
  pub fn byte_size(&self) -> usize {
    std::mem::size_of::<Self>() + self.ops.capacity() * std::mem::size_of::<PictureOp>()
  }

  /// Replays the recorded ops onto a raster target
  ///
  /// Honors the target's abort signal between ops.
  pub fn replay(&self, target: &mut dyn RasterTarget) {
    for op in &self.ops {
      if target.abort_requested() {
        return;
      }
      match *op {
        PictureOp::FillRect { rect, color } => target.fill_rect(rect, color),
        PictureOp::StrokeRect { rect, color, width } => target.stroke_rect(rect, color, width),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_op_bounds() {
    let fill = PictureOp::FillRect {
      rect: Rect::from_xywh(0, 0, 10, 10),
      color: Rgba::RED,
    };
    assert_eq!(fill.bounds(), Rect::from_xywh(0, 0, 10, 10));

    let stroke = PictureOp::StrokeRect {
      rect: Rect::from_xywh(10, 10, 10, 10),
      color: Rgba::BLACK,
      width: 2,
    };
    assert_eq!(stroke.bounds(), Rect::from_xywh(9, 9, 12, 12));
  }

  #[test]
  fn test_accounting() {
    let ops = vec![
      PictureOp::FillRect {
        rect: Rect::from_xywh(0, 0, 10, 10),
        color: Rgba::RED,
      };
      3
    ];
    let picture = Picture::new(Rect::from_xywh(0, 0, 10, 10), ops);
    assert_eq!(picture.op_count(), 3);
    assert!(picture.byte_size() >= 3 * std::mem::size_of::<PictureOp>());
    assert!(picture.is_suitable_for_gpu());
  }

  #[test]
  fn test_mark_unsuitable() {
    let mut picture = Picture::new(Rect::ZERO, Vec::new());
    picture.mark_unsuitable_for_gpu();
    assert!(!picture.is_suitable_for_gpu());
  }
}
