//! Dedicated thread pool selection for tile rasterization
//!
//! Tile fan-out normally runs in the global Rayon pool. Setting
//! `FASTC_RASTER_THREADS` to a value greater than 1 routes it through a
//! lazily-initialised dedicated pool instead, which keeps raster work from
//! competing with whatever else the embedder runs on the global pool.

use rayon::{ThreadPool, ThreadPoolBuilder};
use std::borrow::Cow;
use std::sync::{LazyLock, OnceLock};

const RASTER_THREADS_ENV: &str = "FASTC_RASTER_THREADS";

#[derive(Debug)]
struct RasterThreadPool {
  pool: ThreadPool,
  threads: usize,
}

#[derive(Debug)]
enum RasterThreadPoolState {
  Ready(RasterThreadPool),
  Error(String),
}

static RASTER_THREAD_POOL: LazyLock<OnceLock<RasterThreadPoolState>> = LazyLock::new(OnceLock::new);

#[derive(Debug)]
pub(crate) struct RasterPoolSelection<'a> {
  /// Thread pool to install before running raster Rayon work.
  ///
  /// `None` means the work should run in the current/global pool.
  pub(crate) pool: Option<&'a ThreadPool>,
  /// Thread count available for parallel raster work.
  pub(crate) threads: usize,
  /// If no dedicated pool is selected, describes why.
  #[allow(dead_code)]
  pub(crate) dedicated_fallback: Option<Cow<'static, str>>,
}

fn parse_raster_threads_env() -> Result<Option<usize>, String> {
  match std::env::var(RASTER_THREADS_ENV) {
    Ok(raw) => {
      let raw = raw.trim();
      if raw.is_empty() {
        return Err(format!("{RASTER_THREADS_ENV} is set but empty"));
      }
      raw
        .parse::<usize>()
        .map(Some)
        .map_err(|_| format!("{RASTER_THREADS_ENV}={raw:?} is not a valid positive integer"))
    }
    Err(std::env::VarError::NotPresent) => Ok(None),
    Err(err) => Err(format!("failed to read {RASTER_THREADS_ENV}: {err}")),
  }
}

/// Select the Rayon thread pool that should be used for tile raster work.
///
/// When `FASTC_RASTER_THREADS` is set to a value greater than 1, a
/// lazily-initialised dedicated thread pool is returned. Otherwise, callers
/// should use the current/global Rayon pool.
pub(crate) fn raster_pool() -> RasterPoolSelection<'static> {
  let current_threads = rayon::current_num_threads().max(1);

  match parse_raster_threads_env() {
    Ok(None) => RasterPoolSelection {
      pool: None,
      threads: current_threads,
      dedicated_fallback: Some(Cow::Borrowed(
        "dedicated raster pool disabled (set FASTC_RASTER_THREADS>1 to enable)",
      )),
    },
    Ok(Some(threads)) if threads <= 1 => RasterPoolSelection {
      pool: None,
      threads: current_threads,
      dedicated_fallback: Some(Cow::Owned(format!(
        "dedicated raster pool disabled ({RASTER_THREADS_ENV} must be >1, got {threads})"
      ))),
    },
    Ok(Some(threads)) => {
      let state = RASTER_THREAD_POOL.get_or_init(|| {
        match ThreadPoolBuilder::new().num_threads(threads).build() {
          Ok(pool) => RasterThreadPoolState::Ready(RasterThreadPool { pool, threads }),
          Err(err) => RasterThreadPoolState::Error(err.to_string()),
        }
      });

      match state {
        RasterThreadPoolState::Ready(pool) => RasterPoolSelection {
          pool: Some(&pool.pool),
          threads: pool.threads.max(1),
          dedicated_fallback: None,
        },
        RasterThreadPoolState::Error(err) => RasterPoolSelection {
          pool: None,
          threads: current_threads,
          dedicated_fallback: Some(Cow::Owned(format!(
            "dedicated raster pool unavailable: {err}"
          ))),
        },
      }
    }
    Err(reason) => RasterPoolSelection {
      pool: None,
      threads: current_threads,
      dedicated_fallback: Some(Cow::Owned(format!(
        "dedicated raster pool disabled ({reason})"
      ))),
    },
  }
}
