//! Bounding-rectangle tree for display list culling
//!
//! A static spatial index built once when a display list is finalized. The
//! tree is an implicit B-ary hierarchy over the per-item visual rects: level
//! 0 holds one rect per item in append order, and each higher level holds the
//! bounding rect of up to [`BRANCHING`] children below it. Queries walk the
//! hierarchy top-down and report item indices in ascending append order,
//! which is exactly the replay order the rasterizer needs.
//!
//! Append order already has strong spatial locality for recorded content
//! (paint clients emit roughly in document/layer order), so grouping
//! consecutive entries gives usable bounding volumes without a packing pass.

use crate::geometry::Rect;

/// Children per internal node
pub const BRANCHING: usize = 6;

/// A static bounding-rect hierarchy over an indexed rect list
#[derive(Debug, Default)]
pub struct RectTree {
  /// `levels[0]` is the per-item rects; each higher level is the grouped
  /// bounds of [`BRANCHING`] entries of the level below. The last level has
  /// a single root entry (unless the tree is empty).
  levels: Vec<Vec<Rect>>,
}

impl RectTree {
  /// Builds the hierarchy from per-item visual rects
  pub fn build(rects: &[Rect]) -> Self {
    if rects.is_empty() {
      return Self { levels: Vec::new() };
    }

    let mut levels = vec![rects.to_vec()];
    while levels.last().unwrap().len() > 1 {
      let below = levels.last().unwrap();
      let above: Vec<Rect> = below
        .chunks(BRANCHING)
        .map(|chunk| chunk.iter().fold(Rect::ZERO, |acc, &r| acc.union(r)))
        .collect();
      levels.push(above);
    }
    Self { levels }
  }

  /// Number of indexed items
  pub fn len(&self) -> usize {
    self.levels.first().map_or(0, Vec::len)
  }

  /// Returns true if no items are indexed
  pub fn is_empty(&self) -> bool {
    self.levels.is_empty()
  }

  /// Estimated heap footprint, in bytes
  pub fn byte_size(&self) -> usize {
    self
      .levels
      .iter()
      .map(|l| l.capacity() * std::mem::size_of::<Rect>())
      .sum()
  }

  /// Collects the indices of all items whose rect intersects `query`
  ///
  /// Indices come back in ascending (append) order.
  pub fn query(&self, query: Rect, out: &mut Vec<usize>) {
    out.clear();
    if self.is_empty() || query.is_empty() {
      return;
    }
    let top = self.levels.len() - 1;
    for root in 0..self.levels[top].len() {
      self.query_node(top, root, query, out);
    }
  }

  fn query_node(&self, level: usize, index: usize, query: Rect, out: &mut Vec<usize>) {
    if !self.levels[level][index].intersects(query) {
      return;
    }
    if level == 0 {
      out.push(index);
      return;
    }
    let first_child = index * BRANCHING;
    let last_child = (first_child + BRANCHING).min(self.levels[level - 1].len());
    for child in first_child..last_child {
      self.query_node(level - 1, child, query, out);
    }
  }
}
