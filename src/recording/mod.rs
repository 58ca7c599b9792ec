//! Recording ownership and the frozen raster handoff
//!
//! The [`RecordingStore`] owns a layer's current display list and the
//! invalidation/viewport bookkeeping that decides when a new recording pass
//! is needed. A [`RasterSource`] is the immutable snapshot derived from a
//! store at commit time and handed to the consumer side.

pub mod raster_pool;
pub mod raster_source;
pub mod store;

pub use raster_source::RasterSource;
pub use store::{PaintClient, PaintingControl, RecordingStore, StoreState};
