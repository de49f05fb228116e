//! Execution support for the transform pipeline.
//!
//! This module provides:
//!
//! - the worker pool that per-column stage work runs on
//! - observer hooks for monitoring a run stage by stage

mod observer;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::ConfigResult;

pub use observer::{CompositeObserver, StdErrObserver, TransformEvent, TransformObserver};

/// Resolve the worker count: the configured value, or the platform's available parallelism.
pub fn resolve_num_threads(num_threads: Option<usize>) -> usize {
    num_threads
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .max(1)
}

/// Build the worker pool used by a [`crate::transform::Transformer`].
///
/// Stage code uses rayon's parallel iterators; running it inside `pool.install` confines that
/// work to this pool instead of the global one.
pub fn build_pool(num_threads: Option<usize>) -> ConfigResult<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(resolve_num_threads(num_threads))
        .thread_name(|idx| format!("tabular-transform-{idx}"))
        .build()?;
    Ok(pool)
}
