//! Synthetic paint clients for benchmarks, tools, and tests
//!
//! A [`FixturePaintClient`] paints a deterministic grid of colored cells,
//! one recorded picture per row. Rows are the "subsequences" of the content:
//! the picture cache is keyed per row, which gives every painting-control
//! variant a concrete, measurable meaning:
//!
//! - `Normal`: rows come from the picture cache when warm
//! - `PaintingDisabled`: an empty finalized list
//! - `CachingDisabled`: every row rebuilt, cache untouched
//! - `ConstructionDisabled`: previously built rows reused as-is
//! - `SubsequenceCachingDisabled`: rows rebuilt but written back to the
//!   cache (pays construction, keeps the cache warm)
//! - `PartialInvalidation`: only rows intersecting the configured damage
//!   are rebuilt; the rest reuse the previous build

use crate::geometry::Rect;
use crate::paint::color::Rgba;
use crate::paint::display_list::{DisplayList, Transform2d};
use crate::paint::picture::{Picture, PictureId, PictureOp};
use crate::paint::picture_cache::PictureCache;
use crate::recording::store::{PaintClient, PaintingControl};
use crate::region::Region;
use std::sync::Arc;

const DEFAULT_COLORS: [Rgba; 4] = [Rgba::WHITE, Rgba::RED, Rgba::GREEN, Rgba::BLUE];

/// Deterministic grid-painting client
///
/// # Examples
///
/// ```
/// use fastcomp::fixture::FixturePaintClient;
/// use fastcomp::{PaintClient, PaintingControl};
///
/// let mut client = FixturePaintClient::new(100, 100).with_grid(4, 4);
/// let list = client.paint_contents_to_display_list(PaintingControl::Normal);
/// assert!(list.is_finalized());
/// assert_eq!(list.approximate_op_count(), 16);
/// ```
pub struct FixturePaintClient {
  bounds: Rect,
  cols: usize,
  rows: usize,
  colors: Vec<Rgba>,
  fills_bounds: bool,
  transform_pairs: bool,
  gpu_unsuitable: bool,
  cache: Arc<PictureCache>,
  /// Last built picture per row, for construction-disabled and partial
  /// invalidation reuse.
  built_rows: Vec<Option<Arc<Picture>>>,
  partial_damage: Region,
  pictures_built: usize,
  paint_count: usize,
}

impl FixturePaintClient {
  /// Creates a 1×1 white client covering `width × height`
  pub fn new(width: i32, height: i32) -> Self {
    Self {
      bounds: Rect::from_xywh(0, 0, width, height),
      cols: 1,
      rows: 1,
      colors: DEFAULT_COLORS.to_vec(),
      fills_bounds: true,
      transform_pairs: false,
      gpu_unsuitable: false,
      cache: Arc::new(PictureCache::default()),
      built_rows: vec![None],
      partial_damage: Region::new(),
      pictures_built: 0,
      paint_count: 0,
    }
  }

  /// Splits the content into a `cols × rows` grid of cells
  pub fn with_grid(mut self, cols: usize, rows: usize) -> Self {
    self.cols = cols.max(1);
    self.rows = rows.max(1);
    self.built_rows = vec![None; self.rows];
    self
  }

  /// Cell colors, cycled across the grid
  pub fn with_colors(mut self, colors: Vec<Rgba>) -> Self {
    if !colors.is_empty() {
      self.colors = colors;
    }
    self
  }

  /// A single-color client (one covering fill, solid by construction)
  pub fn with_solid_color(mut self, color: Rgba) -> Self {
    self.colors = vec![color];
    self
  }

  /// Whether cells tile the bounds completely (true) or leave gaps (false)
  pub fn with_fills_bounds(mut self, fills_bounds: bool) -> Self {
    self.fills_bounds = fills_bounds;
    self
  }

  /// Wraps each row in a `TransformBegin`/`TransformEnd` pair
  pub fn with_transform_pairs(mut self, transform_pairs: bool) -> Self {
    self.transform_pairs = transform_pairs;
    self
  }

  /// Marks every built picture as unsuitable for GPU rasterization
  pub fn with_gpu_unsuitable(mut self, gpu_unsuitable: bool) -> Self {
    self.gpu_unsuitable = gpu_unsuitable;
    self
  }

  /// Shares an externally owned picture cache
  pub fn with_cache(mut self, cache: Arc<PictureCache>) -> Self {
    self.cache = cache;
    self
  }

  /// Damage consulted by the partial-invalidation control (persistent)
  pub fn set_partial_damage(&mut self, damage: Region) {
    self.partial_damage = damage;
  }

  /// Total pictures built so far (cache misses and rebuilds)
  pub fn pictures_built(&self) -> usize {
    self.pictures_built
  }

  /// Total paint passes run
  pub fn paint_count(&self) -> usize {
    self.paint_count
  }

  fn row_rect(&self, row: usize) -> Rect {
    let band = self.bounds.height() / self.rows as i32;
    let y = self.bounds.y() + row as i32 * band;
    // The last row absorbs the remainder.
    let height = if row + 1 == self.rows {
      self.bounds.max_y() - y
    } else {
      band
    };
    Rect::from_xywh(self.bounds.x(), y, self.bounds.width(), height)
  }

  /// Builds a row picture; with transform pairs enabled the ops are
  /// recorded relative to the row origin.
  fn build_row(&mut self, row: usize) -> Arc<Picture> {
    self.pictures_built += 1;
    let row_rect = self.row_rect(row);
    let origin_y = if self.transform_pairs { 0 } else { row_rect.y() };
    let cell_width = row_rect.width() / self.cols as i32;

    let mut ops = Vec::with_capacity(self.cols);
    for col in 0..self.cols {
      let x = row_rect.x() + col as i32 * cell_width;
      // The last cell absorbs the remainder so rows tile exactly.
      let width = if col + 1 == self.cols {
        row_rect.max_x() - x
      } else {
        cell_width
      };
      let mut cell = Rect::from_xywh(x, origin_y, width, row_rect.height());
      if !self.fills_bounds {
        cell = cell.inflate(-1);
      }
      let color = self.colors[(row * self.cols + col) % self.colors.len()];
      ops.push(PictureOp::FillRect { rect: cell, color });
    }

    let picture_bounds = if self.transform_pairs {
      Rect::from_xywh(row_rect.x(), 0, row_rect.width(), row_rect.height())
    } else {
      row_rect
    };
    let mut picture = Picture::new(picture_bounds, ops);
    if self.gpu_unsuitable {
      picture.mark_unsuitable_for_gpu();
    }
    let picture = Arc::new(picture);
    self.built_rows[row] = Some(picture.clone());
    picture
  }

  fn row_picture(&mut self, row: usize, control: PaintingControl) -> Arc<Picture> {
    let id = PictureId(row as u64);
    match control {
      PaintingControl::Normal => {
        if let Some(cached) = self.cache.get(id) {
          self.cache.mark_used(id);
          self.built_rows[row] = Some(cached.clone());
          cached
        } else {
          let built = self.build_row(row);
          self.cache.put(id, built.clone());
          built
        }
      }
      PaintingControl::CachingDisabled => self.build_row(row),
      PaintingControl::SubsequenceCachingDisabled => {
        let built = self.build_row(row);
        self.cache.put(id, built.clone());
        built
      }
      PaintingControl::ConstructionDisabled => match self.built_rows[row].clone() {
        Some(reused) => reused,
        None => self.build_row(row),
      },
      PaintingControl::PartialInvalidation => {
        let damaged = self.partial_damage.intersects_rect(self.row_rect(row));
        match self.built_rows[row].clone() {
          Some(reused) if !damaged => reused,
          _ => self.build_row(row),
        }
      }
      PaintingControl::PaintingDisabled => {
        unreachable!("painting-disabled passes never build pictures")
      }
    }
  }
}

impl PaintClient for FixturePaintClient {
  fn paintable_region(&self) -> Rect {
    self.bounds
  }

  fn paint_contents_to_display_list(&mut self, control: PaintingControl) -> DisplayList {
    self.paint_count += 1;
    let mut list = DisplayList::with_capacity(self.rows * if self.transform_pairs { 3 } else { 1 });

    if control != PaintingControl::PaintingDisabled {
      for row in 0..self.rows {
        let picture = self.row_picture(row, control);
        let row_rect = self.row_rect(row);
        if self.transform_pairs {
          list.append_transform_begin(
            Transform2d::translate(0.0, row_rect.y() as f32),
            row_rect,
          );
          list.append_drawing(picture, row_rect);
          list.append_transform_end(row_rect);
        } else {
          list.append_drawing(picture, row_rect);
        }
      }
    }

    list.finalize();
    list
  }

  fn fills_bounds_completely(&self) -> bool {
    self.fills_bounds
  }

  fn approximate_unshared_memory_usage(&self) -> usize {
    // Grid bookkeeping plus the per-row build slots.
    self.rows * self.cols * 96 + self.built_rows.capacity() * std::mem::size_of::<Option<Arc<Picture>>>()
  }
}

impl std::fmt::Debug for FixturePaintClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FixturePaintClient")
      .field("bounds", &self.bounds)
      .field("grid", &(self.cols, self.rows))
      .field("paint_count", &self.paint_count)
      .field("pictures_built", &self.pictures_built)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_grid_op_count() {
    let mut client = FixturePaintClient::new(80, 80).with_grid(4, 4);
    let list = client.paint_contents_to_display_list(PaintingControl::Normal);
    assert_eq!(list.approximate_op_count(), 16);
    assert_eq!(list.bounds(), Rect::from_xywh(0, 0, 80, 80));
  }

  #[test]
  fn test_normal_mode_reuses_cache() {
    let mut client = FixturePaintClient::new(80, 80).with_grid(2, 4);
    client.paint_contents_to_display_list(PaintingControl::Normal);
    assert_eq!(client.pictures_built(), 4);
    client.paint_contents_to_display_list(PaintingControl::Normal);
    // Warm cache: nothing rebuilt.
    assert_eq!(client.pictures_built(), 4);
  }

  #[test]
  fn test_caching_disabled_rebuilds_everything() {
    let mut client = FixturePaintClient::new(80, 80).with_grid(2, 4);
    client.paint_contents_to_display_list(PaintingControl::Normal);
    client.paint_contents_to_display_list(PaintingControl::CachingDisabled);
    assert_eq!(client.pictures_built(), 8);
  }

  #[test]
  fn test_construction_disabled_reuses_built_rows() {
    let mut client = FixturePaintClient::new(80, 80).with_grid(2, 4);
    client.paint_contents_to_display_list(PaintingControl::Normal);
    client.paint_contents_to_display_list(PaintingControl::ConstructionDisabled);
    assert_eq!(client.pictures_built(), 4);
  }

  #[test]
  fn test_partial_invalidation_rebuilds_damaged_rows_only() {
    let mut client = FixturePaintClient::new(80, 80).with_grid(2, 4);
    client.paint_contents_to_display_list(PaintingControl::Normal);

    // Damage only the top row band.
    client.set_partial_damage(Region::from_rect(Rect::from_xywh(0, 0, 80, 10)));
    client.paint_contents_to_display_list(PaintingControl::PartialInvalidation);
    assert_eq!(client.pictures_built(), 5);
  }

  #[test]
  fn test_painting_disabled_is_empty() {
    let mut client = FixturePaintClient::new(80, 80).with_grid(4, 4);
    let list = client.paint_contents_to_display_list(PaintingControl::PaintingDisabled);
    assert!(list.is_empty());
    assert!(list.is_finalized());
    assert_eq!(client.pictures_built(), 0);
  }

  #[test]
  fn test_transform_pairs_structure() {
    let mut client = FixturePaintClient::new(40, 40).with_grid(1, 2).with_transform_pairs(true);
    let list = client.paint_contents_to_display_list(PaintingControl::Normal);
    // begin + drawing + end per row
    assert_eq!(list.len(), 6);
  }

  #[test]
  fn test_gpu_unsuitable_propagates() {
    let mut client = FixturePaintClient::new(40, 40).with_gpu_unsuitable(true);
    let list = client.paint_contents_to_display_list(PaintingControl::Normal);
    assert!(!list.is_suitable_for_gpu_rasterization());
  }

  #[test]
  fn test_rows_tile_bounds_exactly() {
    // 7 rows over height 80: band sizes are uneven, the last absorbs the rest.
    let client = FixturePaintClient::new(80, 80).with_grid(1, 7);
    let mut covered = Region::new();
    for row in 0..7 {
      covered.union_rect(client.row_rect(row));
    }
    assert_eq!(covered, Region::from_rect(Rect::from_xywh(0, 0, 80, 80)));
  }
}
