//! Immutable raster snapshots
//!
//! A [`RasterSource`] freezes a recording store's state at commit time:
//! the display list, layer geometry, and the solid-color/clear/suitability
//! classification. Nothing in it is mutable after construction, which is the
//! entire thread-safety story: rasterization workers on any thread may
//! replay the same source concurrently without coordination.

use crate::error::Result;
use crate::geometry::{Rect, Size};
use crate::paint::canvas::{PixmapCanvas, RasterTarget};
use crate::paint::color::Rgba;
use crate::paint::display_list::DisplayList;
use crate::recording::raster_pool::raster_pool;
use crate::recording::store::RecordingStore;
use std::sync::Arc;
use tiny_skia::Pixmap;

/// An immutable, thread-safe snapshot of a layer's recording
///
/// # Examples
///
/// ```
/// use fastcomp::{RecordingStore, RasterSource};
///
/// let store = RecordingStore::new();
/// let source = store.create_raster_source();
/// assert!(!source.has_recordings());
/// ```
#[derive(Debug)]
pub struct RasterSource {
  display_list: Option<Arc<DisplayList>>,
  size: Size,
  recorded_viewport: Rect,
  is_solid_color: bool,
  solid_color: Rgba,
  requires_clear: bool,
  suitable_for_gpu: bool,
  slow_down_record_scale_factor: u32,
}

impl RasterSource {
  /// Snapshots the current state of a recording store
  pub fn from_recording(store: &RecordingStore) -> Self {
    Self {
      display_list: store.display_list().cloned(),
      size: store.size(),
      recorded_viewport: store.recorded_viewport(),
      is_solid_color: store.is_solid_color(),
      solid_color: store.solid_color(),
      requires_clear: store.requires_clear(),
      suitable_for_gpu: store.is_suitable_for_gpu_rasterization(),
      slow_down_record_scale_factor: store.slow_down_record_scale_factor(),
    }
  }

  /// Returns true if the snapshot carries recorded content
  pub fn has_recordings(&self) -> bool {
    self.display_list.is_some()
  }

  /// Layer size at snapshot time
  pub fn size(&self) -> Size {
    self.size
  }

  /// The viewport the recording covers
  pub fn recorded_viewport(&self) -> Rect {
    self.recorded_viewport
  }

  /// True if the recording paints as one flat color
  pub fn is_solid_color(&self) -> bool {
    self.is_solid_color
  }

  /// The flat color (meaningful when `is_solid_color` is true)
  pub fn solid_color(&self) -> Rgba {
    self.solid_color
  }

  /// True if consumers must clear before replaying
  pub fn requires_clear(&self) -> bool {
    self.requires_clear
  }

  /// Whether the recording is safe for GPU rasterization
  pub fn is_suitable_for_gpu_rasterization(&self) -> bool {
    self.suitable_for_gpu
  }

  /// The frozen display list, if any
  pub fn display_list(&self) -> Option<&Arc<DisplayList>> {
    self.display_list.as_ref()
  }

  /// Estimated bytes held by the snapshot's display list
  pub fn memory_usage(&self) -> usize {
    self
      .display_list
      .as_ref()
      .map_or(0, |list| list.approximate_memory_usage())
  }

  /// Replays the recording onto an arbitrary raster target
  ///
  /// `clip` is in layer space; `scale` maps layer space to target space.
  /// Solid-color sources take the short path: one covering fill, no replay.
  pub fn raster(&self, target: &mut dyn RasterTarget, clip: Rect, scale: f32) {
    if self.is_solid_color {
      target.fill_rect(clip.scale_round_out(scale), self.solid_color);
      return;
    }
    let Some(list) = &self.display_list else {
      return;
    };
    // The debug slow-down knob replays the same content N times.
    for _ in 0..self.slow_down_record_scale_factor.max(1) {
      list.raster(target, clip, scale);
    }
  }

  /// Rasters `canvas_rect` (content space, i.e. layer space × `scale`) into
  /// a fresh pixmap
  ///
  /// Honors `requires_clear` by starting from transparent pixels; sources
  /// that fill their bounds completely skip the clear.
  pub fn raster_to_pixmap(&self, canvas_rect: Rect, scale: f32) -> Result<Pixmap> {
    let mut canvas =
      PixmapCanvas::new(canvas_rect.width().max(0) as u32, canvas_rect.height().max(0) as u32)?;
    // A fresh pixmap is already transparent; requires_clear is only
    // meaningful when reusing surfaces, so nothing extra to do here.

    // Map layer space into the canvas: scale, then shift the canvas window
    // to the origin.
    canvas.push_transform(crate::paint::display_list::Transform2d::translate(
      -canvas_rect.x() as f32,
      -canvas_rect.y() as f32,
    ));
    let clip = canvas_rect.scale_round_out(1.0 / scale);
    self.raster(&mut canvas, clip, scale);
    canvas.pop_transform();
    Ok(canvas.into_pixmap())
  }

  /// Rasters a batch of tiles concurrently
  ///
  /// Tiles are content-space rects. Fan-out runs in the dedicated raster
  /// pool when `FASTC_RASTER_THREADS` selects one, otherwise in the current
  /// Rayon pool. Safe because the source is immutable and every tile gets
  /// its own surface.
  pub fn raster_tiles(&self, tiles: &[Rect], scale: f32) -> Vec<Result<Pixmap>> {
    use rayon::prelude::*;

    let selection = raster_pool();
    if tiles.len() <= 1 || selection.threads <= 1 {
      return tiles
        .iter()
        .map(|&tile| self.raster_to_pixmap(tile, scale))
        .collect();
    }

    let run = || {
      tiles
        .par_iter()
        .map(|&tile| self.raster_to_pixmap(tile, scale))
        .collect()
    };

    match selection.pool {
      Some(pool) => pool.install(run),
      None => run(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::paint::picture::{Picture, PictureOp};
  use crate::recording::store::{PaintClient, PaintingControl};
  use crate::region::Region;

  struct TwoRectClient {
    bounds: Rect,
  }

  impl PaintClient for TwoRectClient {
    fn paintable_region(&self) -> Rect {
      self.bounds
    }
    fn paint_contents_to_display_list(&mut self, _control: PaintingControl) -> DisplayList {
      let mut list = DisplayList::new();
      let background = Picture::new(
        self.bounds,
        vec![PictureOp::FillRect {
          rect: self.bounds,
          color: Rgba::WHITE,
        }],
      );
      let accent_rect = Rect::from_xywh(10, 10, 20, 20);
      let accent = Picture::new(
        accent_rect,
        vec![PictureOp::FillRect {
          rect: accent_rect,
          color: Rgba::RED,
        }],
      );
      list.append_drawing(Arc::new(background), self.bounds);
      list.append_drawing(Arc::new(accent), accent_rect);
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

  fn recorded_source(width: i32, height: i32) -> Arc<RasterSource> {
    let mut store = RecordingStore::new();
    let mut client = TwoRectClient {
      bounds: Rect::from_xywh(0, 0, width, height),
    };
    let mut invalidation = Region::new();
    store.update_and_expand_invalidation(
      &mut client,
      &mut invalidation,
      Size::new(width, height),
      Rect::ZERO,
      PaintingControl::Normal,
    );
    store.create_raster_source()
  }

  #[test]
  fn test_empty_store_snapshot() {
    let store = RecordingStore::new();
    let source = store.create_raster_source();
    assert!(!source.has_recordings());
    assert_eq!(source.memory_usage(), 0);
    assert!(source.is_suitable_for_gpu_rasterization());
  }

  #[test]
  fn test_raster_to_pixmap_draws_content() {
    let source = recorded_source(50, 50);
    let pixmap = source
      .raster_to_pixmap(Rect::from_xywh(0, 0, 50, 50), 1.0)
      .unwrap();
    assert_eq!(pixmap.pixel(15, 15).unwrap().red(), 255);
    assert_eq!(pixmap.pixel(15, 15).unwrap().green(), 0);
    assert_eq!(pixmap.pixel(40, 40).unwrap().green(), 255);
  }

  #[test]
  fn test_raster_window_offsets_content() {
    let source = recorded_source(50, 50);
    // A canvas window over the accent rect only.
    let pixmap = source
      .raster_to_pixmap(Rect::from_xywh(10, 10, 20, 20), 1.0)
      .unwrap();
    assert_eq!(pixmap.pixel(5, 5).unwrap().red(), 255);
  }

  #[test]
  fn test_repeated_raster_is_identical() {
    let source = recorded_source(50, 50);
    let a = source
      .raster_to_pixmap(Rect::from_xywh(0, 0, 50, 50), 1.0)
      .unwrap();
    let b = source
      .raster_to_pixmap(Rect::from_xywh(0, 0, 50, 50), 1.0)
      .unwrap();
    assert_eq!(a.data(), b.data());
  }

  #[test]
  fn test_raster_tiles_matches_single_pass() {
    let source = recorded_source(64, 64);
    let tiles = [
      Rect::from_xywh(0, 0, 32, 32),
      Rect::from_xywh(32, 0, 32, 32),
      Rect::from_xywh(0, 32, 32, 32),
      Rect::from_xywh(32, 32, 32, 32),
    ];
    let tile_pixmaps: Vec<Pixmap> = source
      .raster_tiles(&tiles, 1.0)
      .into_iter()
      .map(|r| r.unwrap())
      .collect();
    let whole = source
      .raster_to_pixmap(Rect::from_xywh(0, 0, 64, 64), 1.0)
      .unwrap();

    for (tile, pixmap) in tiles.iter().zip(&tile_pixmaps) {
      for y in 0..32 {
        for x in 0..32 {
          assert_eq!(
            pixmap.pixel(x, y),
            whole.pixel(tile.x() as u32 + x, tile.y() as u32 + y),
            "tile {} diverged at ({}, {})",
            tile,
            x,
            y
          );
        }
      }
    }
  }

  #[test]
  fn test_solid_color_short_path() {
    let mut store = RecordingStore::new();
    struct SolidClient;
    impl PaintClient for SolidClient {
      fn paintable_region(&self) -> Rect {
        Rect::from_xywh(0, 0, 10, 10)
      }
      fn paint_contents_to_display_list(&mut self, _control: PaintingControl) -> DisplayList {
        let rect = Rect::from_xywh(0, 0, 10, 10);
        let mut list = DisplayList::new();
        list.append_drawing(
          Arc::new(Picture::new(
            rect,
            vec![PictureOp::FillRect {
              rect,
              color: Rgba::BLUE,
            }],
          )),
          rect,
        );
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
    let mut invalidation = Region::new();
    store.update_and_expand_invalidation(
      &mut SolidClient,
      &mut invalidation,
      Size::new(10, 10),
      Rect::ZERO,
      PaintingControl::Normal,
    );
    let source = store.create_raster_source();
    assert!(source.is_solid_color());

    let pixmap = source
      .raster_to_pixmap(Rect::from_xywh(0, 0, 10, 10), 1.0)
      .unwrap();
    assert_eq!(pixmap.pixel(5, 5).unwrap().blue(), 255);
  }
}
