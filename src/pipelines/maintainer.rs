//! Periodic cache maintenance: idle eviction, memory-pressure eviction,
//! and device cache clearing.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::common::config::Config;
use crate::pipelines::cache::PipelineCache;
use crate::runtime::InferenceRuntime;

/// Spawn the maintenance task. One tick per `IDLE_CHECK_INTERVAL`; any
/// eviction in progress completes before the task honors cancellation.
pub fn spawn_maintainer(
    config: Arc<Config>,
    cache: Arc<PipelineCache>,
    runtime: Arc<dyn InferenceRuntime>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.idle_check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_device_clear = Instant::now();

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if !config.model_idle_timeout.is_zero() {
                let evicted = cache.evict_idle(config.model_idle_timeout).await;
                if !evicted.is_empty() {
                    info!(
                        "idle eviction removed {} models ({} cached)",
                        evicted.len(),
                        cache.len()
                    );
                }
            }

            if config.enable_memory_monitor {
                let evicted = cache.evict_under_pressure().await;
                if !evicted.is_empty() {
                    info!("pressure eviction removed {} models", evicted.len());
                }
            }

            if !config.cuda_cache_clear_interval.is_zero()
                && last_device_clear.elapsed() >= config.cuda_cache_clear_interval
            {
                match runtime.clear_device_cache().await {
                    Ok(()) => debug!("device cache cleared"),
                    Err(error) => warn!("device cache clear failed: {error}"),
                }
                last_device_clear = Instant::now();
            }
        }

        debug!("maintainer stopped");
    })
}
