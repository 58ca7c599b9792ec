//! Raster targets for display list replay
//!
//! This module defines the surface abstraction a display list replays into,
//! plus the tiny-skia backed pixel implementation. Keeping the target behind
//! a trait is what makes solid-color analysis cheap: the analyzer is just
//! another [`RasterTarget`] that never touches pixels and aborts the replay
//! as soon as solidity is ruled out.
//!
//! # State management
//!
//! The pixmap canvas maintains a transform stack driven by the paired
//! `TransformBegin`/`TransformEnd` display items; an optional clip mask
//! restricts all drawing. There is no opacity or blend-mode state here;
//! recorded ops carry their own colors and the pipeline composites nothing.

use crate::error::{RasterError, Result};
use crate::geometry::Rect;
use crate::paint::color::Rgba;
use crate::paint::display_list::Transform2d;
use tiny_skia::FillRule;
use tiny_skia::Mask;
use tiny_skia::Paint;
use tiny_skia::PathBuilder;
use tiny_skia::Pixmap;
use tiny_skia::Stroke;
use tiny_skia::Transform;

/// A surface that recorded paint operations replay into
///
/// Implementations are either real pixel sinks ([`PixmapCanvas`]) or
/// analysis sinks ([`crate::paint::solid_color::SolidColorAnalyzer`]).
/// Rectangles arrive in recording (layer) space; the target owns mapping
/// them through its transform stack.
pub trait RasterTarget {
  /// Fills a rectangle with a color
  fn fill_rect(&mut self, rect: Rect, color: Rgba);

  /// Strokes a rectangle outline with the given pixel width
  fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: i32);

  /// Enters a transform scope (paired with [`RasterTarget::pop_transform`])
  fn push_transform(&mut self, transform: Transform2d);

  /// Leaves the innermost transform scope
  fn pop_transform(&mut self);

  /// Polled between items/ops; returning true stops the replay early
  fn abort_requested(&self) -> bool {
    false
  }
}

fn to_skia_color(color: Rgba) -> tiny_skia::Color {
  tiny_skia::Color::from_rgba(
    color.r as f32 / 255.0,
    color.g as f32 / 255.0,
    color.b as f32 / 255.0,
    color.a.clamp(0.0, 1.0),
  )
  .unwrap_or(tiny_skia::Color::BLACK)
}

fn to_skia_transform(t: Transform2d) -> Transform {
  Transform::from_row(t.sx, 0.0, 0.0, t.sy, t.tx, t.ty)
}

/// A pixel raster target backed by a tiny-skia [`Pixmap`]
///
/// # Examples
///
/// ```
/// use fastcomp::paint::{PixmapCanvas, RasterTarget};
/// use fastcomp::{Rect, Rgba};
///
/// let mut canvas = PixmapCanvas::new(100, 100).unwrap();
/// canvas.fill_rect(Rect::from_xywh(0, 0, 50, 50), Rgba::RED);
/// let pixmap = canvas.into_pixmap();
/// assert_eq!(pixmap.pixel(10, 10).unwrap().red(), 255);
/// ```
#[derive(Debug)]
pub struct PixmapCanvas {
  pixmap: Pixmap,
  /// Composed transform stack; the last entry is current. Never empty.
  transforms: Vec<Transform>,
  clip_mask: Option<Mask>,
}

impl PixmapCanvas {
  /// Creates a transparent canvas
  ///
  /// # Errors
  ///
  /// Returns [`RasterError::SurfaceCreationFailed`] when either dimension is
  /// zero or the allocation is refused.
  pub fn new(width: u32, height: u32) -> Result<Self> {
    let pixmap = Pixmap::new(width, height)
      .ok_or(RasterError::SurfaceCreationFailed { width, height })?;
    Ok(Self {
      pixmap,
      transforms: vec![Transform::identity()],
      clip_mask: None,
    })
  }

  /// Creates a canvas pre-filled with a background color
  pub fn with_background(width: u32, height: u32, background: Rgba) -> Result<Self> {
    let mut canvas = Self::new(width, height)?;
    canvas.pixmap.fill(to_skia_color(background));
    Ok(canvas)
  }

  /// Canvas width in pixels
  pub fn width(&self) -> u32 {
    self.pixmap.width()
  }

  /// Canvas height in pixels
  pub fn height(&self) -> u32 {
    self.pixmap.height()
  }

  /// Restricts all subsequent drawing to `rect` (device space)
  pub fn set_clip_rect(&mut self, rect: Rect) {
    let mut mask = match Mask::new(self.pixmap.width(), self.pixmap.height()) {
      Some(mask) => mask,
      None => return,
    };
    let Some(skia_rect) = tiny_skia::Rect::from_xywh(
      rect.x() as f32,
      rect.y() as f32,
      rect.width().max(0) as f32,
      rect.height().max(0) as f32,
    ) else {
      // Degenerate clip: everything is clipped out.
      self.clip_mask = Some(mask);
      return;
    };
    let path = PathBuilder::from_rect(skia_rect);
    mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
    self.clip_mask = Some(mask);
  }

  /// Removes the clip
  pub fn clear_clip(&mut self) {
    self.clip_mask = None;
  }

  /// Fills the whole surface, ignoring transform and clip
  pub fn fill(&mut self, color: Rgba) {
    self.pixmap.fill(to_skia_color(color));
  }

  /// Borrow of the underlying pixmap
  pub fn pixmap(&self) -> &Pixmap {
    &self.pixmap
  }

  /// Consumes the canvas, returning the pixel buffer
  pub fn into_pixmap(self) -> Pixmap {
    self.pixmap
  }

  fn current_transform(&self) -> Transform {
    *self.transforms.last().unwrap()
  }

  fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_skia_color(color));
    paint.anti_alias = false;
    paint
  }
}

impl RasterTarget for PixmapCanvas {
  fn fill_rect(&mut self, rect: Rect, color: Rgba) {
    if rect.is_empty() {
      return;
    }
    let Some(skia_rect) = tiny_skia::Rect::from_xywh(
      rect.x() as f32,
      rect.y() as f32,
      rect.width() as f32,
      rect.height() as f32,
    ) else {
      return;
    };
    self.pixmap.fill_rect(
      skia_rect,
      &Self::paint(color),
      self.current_transform(),
      self.clip_mask.as_ref(),
    );
  }

  fn stroke_rect(&mut self, rect: Rect, color: Rgba, width: i32) {
    if rect.is_empty() || width <= 0 {
      return;
    }
    let Some(skia_rect) = tiny_skia::Rect::from_xywh(
      rect.x() as f32,
      rect.y() as f32,
      rect.width() as f32,
      rect.height() as f32,
    ) else {
      return;
    };
    let path = PathBuilder::from_rect(skia_rect);
    let stroke = Stroke {
      width: width as f32,
      ..Stroke::default()
    };
    self.pixmap.stroke_path(
      &path,
      &Self::paint(color),
      &stroke,
      self.current_transform(),
      self.clip_mask.as_ref(),
    );
  }

  fn push_transform(&mut self, transform: Transform2d) {
    let composed = self.current_transform().pre_concat(to_skia_transform(transform));
    self.transforms.push(composed);
  }

  fn pop_transform(&mut self) {
    // The base identity entry is not poppable; an extra pop means the replay
    // saw an unbalanced TransformEnd.
    debug_assert!(self.transforms.len() > 1, "unbalanced pop_transform");
    if self.transforms.len() > 1 {
      self.transforms.pop();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_zero_size_rejected() {
    assert!(PixmapCanvas::new(0, 100).is_err());
    assert!(PixmapCanvas::new(100, 0).is_err());
  }

  #[test]
  fn test_fill_rect_writes_pixels() {
    let mut canvas = PixmapCanvas::new(10, 10).unwrap();
    canvas.fill_rect(Rect::from_xywh(2, 2, 4, 4), Rgba::GREEN);
    let pixmap = canvas.into_pixmap();
    assert_eq!(pixmap.pixel(3, 3).unwrap().green(), 255);
    assert_eq!(pixmap.pixel(8, 8).unwrap().alpha(), 0);
  }

  #[test]
  fn test_transform_stack_offsets_drawing() {
    let mut canvas = PixmapCanvas::new(20, 20).unwrap();
    canvas.push_transform(Transform2d::translate(10.0, 10.0));
    canvas.fill_rect(Rect::from_xywh(0, 0, 5, 5), Rgba::BLUE);
    canvas.pop_transform();
    canvas.fill_rect(Rect::from_xywh(0, 0, 5, 5), Rgba::RED);

    let pixmap = canvas.into_pixmap();
    assert_eq!(pixmap.pixel(12, 12).unwrap().blue(), 255);
    assert_eq!(pixmap.pixel(2, 2).unwrap().red(), 255);
  }

  #[test]
  fn test_clip_rect_restricts_fill() {
    let mut canvas = PixmapCanvas::new(20, 20).unwrap();
    canvas.set_clip_rect(Rect::from_xywh(0, 0, 10, 10));
    canvas.fill_rect(Rect::from_xywh(0, 0, 20, 20), Rgba::RED);
    let pixmap = canvas.into_pixmap();
    assert_eq!(pixmap.pixel(5, 5).unwrap().red(), 255);
    assert_eq!(pixmap.pixel(15, 15).unwrap().alpha(), 0);
  }

  #[test]
  fn test_scale_transform() {
    let mut canvas = PixmapCanvas::new(20, 20).unwrap();
    canvas.push_transform(Transform2d::scale(2.0));
    canvas.fill_rect(Rect::from_xywh(0, 0, 5, 5), Rgba::BLACK);
    let pixmap = canvas.into_pixmap();
    assert_eq!(pixmap.pixel(9, 9).unwrap().alpha(), 255);
    assert_eq!(pixmap.pixel(11, 11).unwrap().alpha(), 0);
  }
}
