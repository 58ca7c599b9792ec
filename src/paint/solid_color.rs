//! Solid-color analysis sink
//!
//! A cheap early-exit raster pass that decides whether an entire recording
//! paints as one flat color. The analyzer is a [`RasterTarget`] that never
//! allocates pixels: it tracks the single color written so far and the area
//! covered, and requests replay abort the moment solidity is ruled out.
//!
//! The verdict is conservative. Any op the analyzer cannot reason about
//! exactly (strokes, non-opaque fills) fails the analysis; a false negative
//! only costs the solid-color fast path, never correctness.

use crate::geometry::Rect;
use crate::paint::canvas::RasterTarget;
use crate::paint::color::Rgba;
use crate::paint::display_list::{DisplayList, Transform2d};
use crate::region::Region;

/// Analyzes a finalized display list over `analysis_rect`
///
/// Returns the single color when the replay writes exactly one color and
/// covers every pixel of `analysis_rect`.
///
/// # Examples
///
/// ```
/// use fastcomp::paint::{solid_color, DisplayList, Picture, PictureOp};
/// use fastcomp::{Rect, Rgba};
/// use std::sync::Arc;
///
/// let rect = Rect::from_xywh(0, 0, 50, 50);
/// let mut list = DisplayList::new();
/// let picture = Picture::new(rect, vec![PictureOp::FillRect { rect, color: Rgba::WHITE }]);
/// list.append_drawing(Arc::new(picture), rect);
/// list.finalize();
///
/// assert_eq!(solid_color::analyze(&list, rect), Some(Rgba::WHITE));
/// ```
pub fn analyze(list: &DisplayList, analysis_rect: Rect) -> Option<Rgba> {
  if analysis_rect.is_empty() {
    return None;
  }
  let mut analyzer = SolidColorAnalyzer::new(analysis_rect);
  list.raster(&mut analyzer, analysis_rect, 1.0);
  analyzer.solid_color()
}

/// Raster target that checks whether exactly one color is ever written
#[derive(Debug)]
pub struct SolidColorAnalyzer {
  analysis_rect: Rect,
  /// Composed transform stack; the last entry is current. Never empty.
  transforms: Vec<Transform2d>,
  color: Option<Rgba>,
  solid: bool,
  covered: Region,
}

impl SolidColorAnalyzer {
  /// Creates an analyzer for the given rect
  pub fn new(analysis_rect: Rect) -> Self {
    Self {
      analysis_rect,
      transforms: vec![Transform2d::IDENTITY],
      color: None,
      solid: true,
      covered: Region::new(),
    }
  }

  /// The verdict: `Some(color)` iff one color covered the whole rect
  pub fn solid_color(&self) -> Option<Rgba> {
    if !self.solid {
      return None;
    }
    let color = self.color?;
    if self.covered.contains_rect(self.analysis_rect) {
      Some(color)
    } else {
      None
    }
  }

  fn fail(&mut self) {
    self.solid = false;
  }

  /// Maps `rect` through the current transform, rounding inward so coverage
  /// is never overstated.
  fn map_rect_round_in(&self, rect: Rect) -> Rect {
    let t = *self.transforms.last().unwrap();
    let (x0, y0) = t.map(rect.min_x() as f32, rect.min_y() as f32);
    let (x1, y1) = t.map(rect.max_x() as f32, rect.max_y() as f32);
    let (min_x, max_x) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    let (min_y, max_y) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
    let left = min_x.ceil() as i32;
    let top = min_y.ceil() as i32;
    let right = max_x.floor() as i32;
    let bottom = max_y.floor() as i32;
    Rect::from_xywh(left, top, right - left, bottom - top)
  }
}

impl RasterTarget for SolidColorAnalyzer {
  fn fill_rect(&mut self, rect: Rect, color: Rgba) {
    if !self.solid || rect.is_empty() {
      return;
    }
    // Translucent fills blend with what is underneath; the result is not a
    // single recorded color.
    if !color.is_opaque() {
      self.fail();
      return;
    }
    match self.color {
      Some(existing) if existing != color => {
        self.fail();
        return;
      }
      _ => self.color = Some(color),
    }
    let mapped = self.map_rect_round_in(rect);
    if let Some(overlap) = mapped.intersection(self.analysis_rect) {
      self.covered.union_rect(overlap);
    }
  }

  fn stroke_rect(&mut self, _rect: Rect, _color: Rgba, _width: i32) {
    // Outlines never cover their interior; no exact reasoning available.
    self.fail();
  }

  fn push_transform(&mut self, transform: Transform2d) {
    let composed = self.transforms.last().unwrap().compose(transform);
    self.transforms.push(composed);
  }

  fn pop_transform(&mut self) {
    debug_assert!(self.transforms.len() > 1, "unbalanced pop_transform");
    if self.transforms.len() > 1 {
      self.transforms.pop();
    }
  }

  fn abort_requested(&self) -> bool {
    !self.solid
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::paint::picture::{Picture, PictureOp};
  use std::sync::Arc;

  fn list_of(ops: Vec<PictureOp>, bounds: Rect) -> DisplayList {
    let mut list = DisplayList::new();
    list.append_drawing(Arc::new(Picture::new(bounds, ops)), bounds);
    list.finalize();
    list
  }

  #[test]
  fn test_single_covering_fill_is_solid() {
    let rect = Rect::from_xywh(0, 0, 50, 50);
    let list = list_of(
      vec![PictureOp::FillRect {
        rect,
        color: Rgba::BLUE,
      }],
      rect,
    );
    assert_eq!(analyze(&list, rect), Some(Rgba::BLUE));
  }

  #[test]
  fn test_partial_fill_is_not_solid() {
    let rect = Rect::from_xywh(0, 0, 50, 50);
    let list = list_of(
      vec![PictureOp::FillRect {
        rect: Rect::from_xywh(0, 0, 25, 50),
        color: Rgba::BLUE,
      }],
      rect,
    );
    assert_eq!(analyze(&list, rect), None);
  }

  #[test]
  fn test_two_colors_are_not_solid() {
    let rect = Rect::from_xywh(0, 0, 50, 50);
    let list = list_of(
      vec![
        PictureOp::FillRect {
          rect,
          color: Rgba::BLUE,
        },
        PictureOp::FillRect {
          rect: Rect::from_xywh(10, 10, 5, 5),
          color: Rgba::RED,
        },
      ],
      rect,
    );
    assert_eq!(analyze(&list, rect), None);
  }

  #[test]
  fn test_same_color_in_pieces_is_solid() {
    let rect = Rect::from_xywh(0, 0, 40, 40);
    let list = list_of(
      vec![
        PictureOp::FillRect {
          rect: Rect::from_xywh(0, 0, 40, 20),
          color: Rgba::GREEN,
        },
        PictureOp::FillRect {
          rect: Rect::from_xywh(0, 20, 40, 20),
          color: Rgba::GREEN,
        },
      ],
      rect,
    );
    assert_eq!(analyze(&list, rect), Some(Rgba::GREEN));
  }

  #[test]
  fn test_stroke_fails_analysis() {
    let rect = Rect::from_xywh(0, 0, 50, 50);
    let list = list_of(
      vec![
        PictureOp::FillRect {
          rect,
          color: Rgba::BLUE,
        },
        PictureOp::StrokeRect {
          rect,
          color: Rgba::BLUE,
          width: 1,
        },
      ],
      rect,
    );
    assert_eq!(analyze(&list, rect), None);
  }

  #[test]
  fn test_translucent_fill_fails_analysis() {
    let rect = Rect::from_xywh(0, 0, 50, 50);
    let list = list_of(
      vec![PictureOp::FillRect {
        rect,
        color: Rgba::BLUE.with_alpha(0.5),
      }],
      rect,
    );
    assert_eq!(analyze(&list, rect), None);
  }

  #[test]
  fn test_abort_stops_after_failure() {
    let mut analyzer = SolidColorAnalyzer::new(Rect::from_xywh(0, 0, 10, 10));
    assert!(!analyzer.abort_requested());
    analyzer.stroke_rect(Rect::from_xywh(0, 0, 10, 10), Rgba::RED, 1);
    assert!(analyzer.abort_requested());
  }

  #[test]
  fn test_covering_fill_under_translation_is_solid() {
    let rect = Rect::from_xywh(0, 0, 20, 20);
    let mut list = DisplayList::new();
    let picture = Picture::new(
      Rect::from_xywh(-10, -10, 30, 30),
      vec![PictureOp::FillRect {
        rect: Rect::from_xywh(-10, -10, 30, 30),
        color: Rgba::WHITE,
      }],
    );
    list.append_transform_begin(Transform2d::translate(5.0, 5.0), rect);
    list.append_drawing(Arc::new(picture), rect);
    list.append_transform_end(rect);
    list.finalize();

    assert_eq!(analyze(&list, rect), Some(Rgba::WHITE));
  }

  #[test]
  fn test_empty_analysis_rect() {
    let rect = Rect::from_xywh(0, 0, 50, 50);
    let list = list_of(
      vec![PictureOp::FillRect {
        rect,
        color: Rgba::BLUE,
      }],
      rect,
    );
    assert_eq!(analyze(&list, Rect::ZERO), None);
  }
}
