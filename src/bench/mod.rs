//! Recording benchmark harness
//!
//! Quantifies the cost of the producer-side recording path across the
//! painting-control variants. This lives in the library (not `benches/`)
//! because embedders trigger it at runtime against live scenes; the
//! criterion benches build on the same entry points.

pub mod record_benchmark;

pub use record_benchmark::{
  BenchmarkReport, DoneCallback, ImmediateTaskRunner, RecordBenchmark, RecordBenchmarkResults,
  TaskRunner, DEFAULT_RECORD_REPEAT_COUNT,
};
