//! Runtime bootstrap for the timely/differential pipeline and the engine runner.

use anyhow::Result;
use timely::communication::allocator::Generic;
use timely::worker::Worker;
use tracing::{info, Level};

pub mod metrics;
pub mod pipeline;

pub use pipeline::{run, Report};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .try_init();
}

/// Start an in-process timely runtime with `workers` threads, run `f` once per
/// worker and return every worker's result in worker-index order.
pub fn start_runtime<T, F>(workers: usize, f: F) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(&mut Worker<Generic>) -> T + Send + Sync + 'static,
{
    info!(%workers, "starting timely runtime");
    let guards = timely::execute(timely::Config::process(workers), f).map_err(anyhow::Error::msg)?;
    guards
        .join()
        .into_iter()
        .map(|result| result.map_err(anyhow::Error::msg))
        .collect()
}
