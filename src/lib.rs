pub mod bench;
pub mod error;
pub mod fixture;
pub mod geometry;
pub mod layer;
pub mod paint;
pub mod recording;
pub mod region;

pub use error::{Error, Result};
pub use geometry::{Point, Rect, Size};
pub use region::Region;

pub use paint::{DisplayItem, DisplayList, Picture, PictureCache, PictureId, Rgba, Transform2d};
pub use recording::{PaintClient, PaintingControl, RasterSource, RecordingStore};

pub use layer::{
  CommitDelta, ConsumerTree, ContentLayer, ContentLayerImpl, HostSettings, LayerArena, LayerId,
  LayerTree,
};

pub use bench::{BenchmarkReport, RecordBenchmark, RecordBenchmarkResults, TaskRunner};
