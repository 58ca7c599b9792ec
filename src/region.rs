//! Rectangle set algebra for invalidation tracking
//!
//! A [`Region`] is a set of pixels represented as a list of pairwise-disjoint
//! rectangles. Invalidation areas accumulate through unions, get clipped to
//! layer bounds through intersections, and are compared for coverage when
//! deciding whether a recording pass is needed.
//!
//! The representation invariant (no two stored rectangles overlap, no stored
//! rectangle is empty) holds after every mutating operation, so `area()` is
//! an exact pixel count and equality can be checked as mutual containment.
//! The rectangle list is *not* canonical: the same pixel set may be carved
//! into different rectangles depending on operation order, which is why
//! `PartialEq` compares set semantics rather than representation.

use crate::geometry::{Point, Rect};
use std::fmt;

/// A set of pixels stored as disjoint rectangles
///
/// # Examples
///
/// ```
/// use fastcomp::{Rect, Region};
///
/// let mut region = Region::new();
/// region.union_rect(Rect::from_xywh(0, 0, 10, 10));
/// region.union_rect(Rect::from_xywh(5, 5, 10, 10));
///
/// assert_eq!(region.area(), 175); // 100 + 100 - 25 overlap
/// assert!(region.contains_rect(Rect::from_xywh(8, 8, 4, 4)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Region {
  rects: Vec<Rect>,
}

/// Splits `a ∖ b` into at most four disjoint rectangles
///
/// Carves away the part of `a` covered by `b`, banding top/bottom strips
/// first and left/right strips from the middle band.
fn subtract_rect_from_rect(a: Rect, b: Rect, out: &mut Vec<Rect>) {
  let Some(overlap) = a.intersection(b) else {
    if !a.is_empty() {
      out.push(a);
    }
    return;
  };

  // Top band
  if overlap.min_y() > a.min_y() {
    out.push(Rect::from_xywh(
      a.min_x(),
      a.min_y(),
      a.width(),
      overlap.min_y() - a.min_y(),
    ));
  }
  // Bottom band
  if overlap.max_y() < a.max_y() {
    out.push(Rect::from_xywh(
      a.min_x(),
      overlap.max_y(),
      a.width(),
      a.max_y() - overlap.max_y(),
    ));
  }
  // Left strip of the middle band
  if overlap.min_x() > a.min_x() {
    out.push(Rect::from_xywh(
      a.min_x(),
      overlap.min_y(),
      overlap.min_x() - a.min_x(),
      overlap.height(),
    ));
  }
  // Right strip of the middle band
  if overlap.max_x() < a.max_x() {
    out.push(Rect::from_xywh(
      overlap.max_x(),
      overlap.min_y(),
      a.max_x() - overlap.max_x(),
      overlap.height(),
    ));
  }
}

impl Region {
  /// Creates an empty region
  pub const fn new() -> Self {
    Self { rects: Vec::new() }
  }

  /// Creates a region covering a single rectangle
  ///
  /// An empty rectangle produces an empty region.
  pub fn from_rect(rect: Rect) -> Self {
    let mut region = Self::new();
    region.union_rect(rect);
    region
  }

  /// Returns true if the region covers no pixels
  pub fn is_empty(&self) -> bool {
    self.rects.is_empty()
  }

  /// Returns the exact number of pixels covered
  pub fn area(&self) -> u64 {
    self.rects.iter().map(|r| r.area()).sum()
  }

  /// Returns the smallest rectangle enclosing the region
  pub fn bounds(&self) -> Rect {
    self
      .rects
      .iter()
      .fold(Rect::ZERO, |acc, &r| acc.union(r))
  }

  /// The disjoint rectangles making up the region, in no particular order
  pub fn rects(&self) -> &[Rect] {
    &self.rects
  }

  /// Removes everything from the region
  pub fn clear(&mut self) {
    self.rects.clear();
  }

  /// Moves the region's contents out, leaving it empty
  pub fn take(&mut self) -> Region {
    Region {
      rects: std::mem::take(&mut self.rects),
    }
  }

  /// Exchanges contents with another region
  pub fn swap(&mut self, other: &mut Region) {
    std::mem::swap(&mut self.rects, &mut other.rects);
  }

  /// Adds a rectangle to the region
  ///
  /// Only the part of `rect` not already covered is inserted, preserving the
  /// disjointness invariant. Empty rectangles are ignored.
  pub fn union_rect(&mut self, rect: Rect) {
    if rect.is_empty() {
      return;
    }

    // Carve the incoming rect against existing coverage; whatever survives
    // is new area.
    let mut fresh = vec![rect];
    let mut scratch = Vec::new();
    for &existing in &self.rects {
      scratch.clear();
      for &piece in &fresh {
        subtract_rect_from_rect(piece, existing, &mut scratch);
      }
      std::mem::swap(&mut fresh, &mut scratch);
      if fresh.is_empty() {
        return;
      }
    }
    self.rects.extend(fresh);
  }

  /// Adds every rectangle of another region
  pub fn union(&mut self, other: &Region) {
    for &rect in &other.rects {
      self.union_rect(rect);
    }
  }

  /// Removes a rectangle from the region
  pub fn subtract_rect(&mut self, rect: Rect) {
    if rect.is_empty() || self.is_empty() {
      return;
    }
    let mut remaining = Vec::with_capacity(self.rects.len());
    for &existing in &self.rects {
      subtract_rect_from_rect(existing, rect, &mut remaining);
    }
    self.rects = remaining;
  }

  /// Removes every rectangle of another region
  pub fn subtract(&mut self, other: &Region) {
    for &rect in &other.rects {
      self.subtract_rect(rect);
      if self.is_empty() {
        return;
      }
    }
  }

  /// Keeps only the part of the region inside `rect`
  pub fn intersect_rect(&mut self, rect: Rect) {
    if rect.is_empty() {
      self.rects.clear();
      return;
    }
    self.rects = self
      .rects
      .iter()
      .filter_map(|r| r.intersection(rect))
      .collect();
  }

  /// Keeps only the part of the region also covered by another region
  pub fn intersect(&mut self, other: &Region) {
    let mut result = Vec::new();
    for &a in &self.rects {
      for &b in &other.rects {
        if let Some(overlap) = a.intersection(b) {
          result.push(overlap);
        }
      }
    }
    // Pieces of `self` are disjoint and pieces of `other` are disjoint, so
    // the pairwise intersections are disjoint too.
    self.rects = result;
  }

  /// Returns true if the region covers the given pixel
  pub fn contains_point(&self, point: Point) -> bool {
    self.rects.iter().any(|r| r.contains_point(point))
  }

  /// Returns true if the region covers every pixel of `rect`
  pub fn contains_rect(&self, rect: Rect) -> bool {
    if rect.is_empty() {
      return true;
    }
    let mut uncovered = vec![rect];
    let mut scratch = Vec::new();
    for &existing in &self.rects {
      scratch.clear();
      for &piece in &uncovered {
        subtract_rect_from_rect(piece, existing, &mut scratch);
      }
      std::mem::swap(&mut uncovered, &mut scratch);
      if uncovered.is_empty() {
        return true;
      }
    }
    false
  }

  /// Returns true if the region covers every pixel of another region
  pub fn contains_region(&self, other: &Region) -> bool {
    other.rects.iter().all(|&r| self.contains_rect(r))
  }

  /// Returns true if the region covers any pixel of `rect`
  pub fn intersects_rect(&self, rect: Rect) -> bool {
    self.rects.iter().any(|r| r.intersects(rect))
  }
}

impl From<Rect> for Region {
  fn from(rect: Rect) -> Self {
    Region::from_rect(rect)
  }
}

/// Set equality: same pixels, regardless of how they are carved into rects
impl PartialEq for Region {
  fn eq(&self, other: &Self) -> bool {
    self.area() == other.area() && self.contains_region(other)
  }
}

impl Eq for Region {}

impl fmt::Display for Region {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Region[")?;
    for (i, rect) in self.rects.iter().enumerate() {
      if i > 0 {
        write!(f, ", ")?;
      }
      write!(f, "{}", rect)?;
    }
    write!(f, "]")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rect(x: i32, y: i32, w: i32, h: i32) -> Rect {
    Rect::from_xywh(x, y, w, h)
  }

  /// Checks the disjointness invariant directly.
  fn assert_disjoint(region: &Region) {
    let rects = region.rects();
    for (i, &a) in rects.iter().enumerate() {
      assert!(!a.is_empty(), "empty rect stored: {}", a);
      for &b in &rects[i + 1..] {
        assert!(!a.intersects(b), "overlapping rects stored: {} / {}", a, b);
      }
    }
  }

  #[test]
  fn test_empty_region() {
    let region = Region::new();
    assert!(region.is_empty());
    assert_eq!(region.area(), 0);
    assert_eq!(region.bounds(), Rect::ZERO);
  }

  #[test]
  fn test_union_disjoint_rects() {
    let mut region = Region::new();
    region.union_rect(rect(0, 0, 10, 10));
    region.union_rect(rect(20, 0, 10, 10));
    assert_eq!(region.area(), 200);
    assert_disjoint(&region);
  }

  #[test]
  fn test_union_overlapping_rects() {
    let mut region = Region::new();
    region.union_rect(rect(0, 0, 10, 10));
    region.union_rect(rect(5, 5, 10, 10));
    assert_eq!(region.area(), 175);
    assert_disjoint(&region);
    assert!(region.contains_point(Point::new(12, 12)));
    assert!(!region.contains_point(Point::new(12, 2)));
  }

  #[test]
  fn test_union_contained_rect_is_noop() {
    let mut region = Region::from_rect(rect(0, 0, 20, 20));
    region.union_rect(rect(5, 5, 5, 5));
    assert_eq!(region.area(), 400);
    assert_eq!(region.rects().len(), 1);
  }

  #[test]
  fn test_union_empty_rect_ignored() {
    let mut region = Region::new();
    region.union_rect(Rect::ZERO);
    region.union_rect(rect(3, 3, 0, 5));
    assert!(region.is_empty());
  }

  #[test]
  fn test_union_is_monotonic() {
    // The union after two inserts is a superset of either insert alone.
    let r1 = rect(0, 0, 10, 10);
    let r2 = rect(30, 30, 6, 6);
    let mut region = Region::new();
    region.union_rect(r1);
    region.union_rect(r2);
    assert!(region.contains_rect(r1));
    assert!(region.contains_rect(r2));
    assert_eq!(region.area(), 136);
  }

  #[test]
  fn test_subtract_center_hole() {
    let mut region = Region::from_rect(rect(0, 0, 30, 30));
    region.subtract_rect(rect(10, 10, 10, 10));
    assert_eq!(region.area(), 800);
    assert_disjoint(&region);
    assert!(!region.contains_point(Point::new(15, 15)));
    assert!(region.contains_point(Point::new(5, 15)));
    assert!(region.contains_point(Point::new(25, 15)));
  }

  #[test]
  fn test_subtract_everything() {
    let mut region = Region::from_rect(rect(5, 5, 10, 10));
    region.subtract_rect(rect(0, 0, 100, 100));
    assert!(region.is_empty());
  }

  #[test]
  fn test_subtract_region() {
    let mut a = Region::from_rect(rect(0, 0, 20, 10));
    let mut b = Region::new();
    b.union_rect(rect(0, 0, 5, 10));
    b.union_rect(rect(15, 0, 5, 10));
    a.subtract(&b);
    assert_eq!(a, Region::from_rect(rect(5, 0, 10, 10)));
  }

  #[test]
  fn test_intersect_rect() {
    let mut region = Region::new();
    region.union_rect(rect(0, 0, 10, 10));
    region.union_rect(rect(20, 20, 10, 10));
    region.intersect_rect(rect(5, 5, 20, 20));
    assert_eq!(region.area(), 25 + 25);
    assert_disjoint(&region);
  }

  #[test]
  fn test_intersect_with_empty_rect_clears() {
    let mut region = Region::from_rect(rect(0, 0, 10, 10));
    region.intersect_rect(Rect::ZERO);
    assert!(region.is_empty());
  }

  #[test]
  fn test_intersect_region() {
    let mut a = Region::from_rect(rect(0, 0, 10, 10));
    let b = Region::from_rect(rect(5, 5, 10, 10));
    a.intersect(&b);
    assert_eq!(a, Region::from_rect(rect(5, 5, 5, 5)));
  }

  #[test]
  fn test_contains_rect_spanning_pieces() {
    // Coverage assembled from two abutting rects still counts as containment.
    let mut region = Region::new();
    region.union_rect(rect(0, 0, 10, 10));
    region.union_rect(rect(10, 0, 10, 10));
    assert!(region.contains_rect(rect(5, 0, 10, 10)));
    assert!(!region.contains_rect(rect(5, 0, 10, 11)));
  }

  #[test]
  fn test_set_equality_ignores_carving() {
    // Same pixel set, built in different orders.
    let mut a = Region::new();
    a.union_rect(rect(0, 0, 10, 10));
    a.union_rect(rect(5, 5, 10, 10));

    let mut b = Region::new();
    b.union_rect(rect(5, 5, 10, 10));
    b.union_rect(rect(0, 0, 10, 10));

    assert_eq!(a, b);
  }

  #[test]
  fn test_take_leaves_empty() {
    let mut region = Region::from_rect(rect(0, 0, 4, 4));
    let taken = region.take();
    assert!(region.is_empty());
    assert_eq!(taken.area(), 16);
  }

  #[test]
  fn test_swap() {
    let mut a = Region::from_rect(rect(0, 0, 4, 4));
    let mut b = Region::new();
    a.swap(&mut b);
    assert!(a.is_empty());
    assert_eq!(b.area(), 16);
  }

  #[test]
  fn test_symmetric_difference_of_viewports() {
    // The viewport-change expansion: (A ∖ B) ∪ (B ∖ A).
    let a = rect(0, 0, 100, 100);
    let b = rect(50, 0, 100, 100);

    let mut newly_exposed = Region::from_rect(b);
    newly_exposed.subtract_rect(a);
    let mut no_longer_exposed = Region::from_rect(a);
    no_longer_exposed.subtract_rect(b);

    let mut sym_diff = newly_exposed;
    sym_diff.union(&no_longer_exposed);

    assert_eq!(sym_diff.area(), 2 * 50 * 100);
    assert!(!sym_diff.intersects_rect(rect(50, 0, 50, 100)));
  }
}
