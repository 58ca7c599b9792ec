//! Keyed cache for recorded pictures
//!
//! Historically shared picture caches were process-global, keyed by numeric
//! id and referenced across serialization boundaries. Here the cache is an
//! injected capability: paint clients that want cross-frame picture reuse
//! hold one and consult it during recording; the caching-disabled painting
//! controls bypass it to measure the cost of a cold recording.
//!
//! `get` is a pure lookup (it does not refresh recency); `mark_used` is the
//! explicit touch that keeps an entry hot.

use crate::paint::picture::{Picture, PictureId};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of cached pictures per client
pub const DEFAULT_PICTURE_CACHE_CAPACITY: usize = 256;

/// An LRU cache of shared pictures keyed by [`PictureId`]
///
/// # Examples
///
/// ```
/// use fastcomp::paint::{Picture, PictureCache, PictureId};
/// use fastcomp::Rect;
/// use std::sync::Arc;
///
/// let cache = PictureCache::new(8);
/// let id = PictureId(1);
/// cache.put(id, Arc::new(Picture::new(Rect::ZERO, Vec::new())));
///
/// assert!(cache.get(id).is_some());
/// cache.mark_used(id);
/// ```
#[derive(Debug)]
pub struct PictureCache {
  inner: Mutex<LruCache<PictureId, Arc<Picture>>>,
}

impl PictureCache {
  /// Creates a cache holding at most `capacity` pictures
  ///
  /// A zero capacity is rounded up to one.
  pub fn new(capacity: usize) -> Self {
    let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
    Self {
      inner: Mutex::new(LruCache::new(capacity)),
    }
  }

  /// Inserts (or replaces) a picture, possibly evicting the coldest entry
  pub fn put(&self, id: PictureId, picture: Arc<Picture>) {
    self.inner.lock().put(id, picture);
  }

  /// Looks up a picture without refreshing its recency
  pub fn get(&self, id: PictureId) -> Option<Arc<Picture>> {
    self.inner.lock().peek(&id).cloned()
  }

  /// Refreshes an entry's recency; no-op for unknown ids
  pub fn mark_used(&self, id: PictureId) {
    self.inner.lock().promote(&id);
  }

  /// Number of cached pictures
  pub fn len(&self) -> usize {
    self.inner.lock().len()
  }

  /// Returns true if nothing is cached
  pub fn is_empty(&self) -> bool {
    self.inner.lock().is_empty()
  }
}

impl Default for PictureCache {
  fn default() -> Self {
    Self::new(DEFAULT_PICTURE_CACHE_CAPACITY)
  }
}
