//! Long-running tasks that sit beside the tick loop.
//!
//! Both loops stop when their [`CancellationToken`] fires. Neither blocks
//! the other: they share only the [`DefinitionStore`]'s atomic swap.

use std::sync::Arc;
use std::time::Duration;

use aegis_types::MIN_TICK_INTERVAL_MS;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::definitions::{DefinitionSource, DefinitionStore, FetchError};
use crate::engine::{MitigationEngine, TickOutcome};
use crate::world::WorldView;

/// Refreshes are never scheduled faster than this.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(MIN_TICK_INTERVAL_MS);

/// Refresh `store` from `source` now and then every `interval` (at least
/// [`MIN_REFRESH_INTERVAL`]).
///
/// Failures are logged and the previous table stays current. The task
/// exits when `cancel` fires, abandoning any in-flight fetch.
pub fn spawn_definition_refresh<S>(
    store: Arc<DefinitionStore>,
    source: S,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    S: DefinitionSource + 'static,
{
    let interval = interval.max(MIN_REFRESH_INTERVAL);
    tokio::spawn(async move {
        tracing::info!(origin = %source.origin(), interval_secs = interval.as_secs(), "Starting definition refresh");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match store.refresh(&source, &cancel).await {
                Ok(count) => tracing::debug!(count, "Definition refresh complete"),
                Err(FetchError::Cancelled) => break,
                Err(e) => {
                    tracing::warn!(error = %e, origin = %source.origin(), "Definition refresh failed; keeping previous table");
                }
            }
        }

        tracing::info!("Definition refresh stopped");
    })
}

/// Tick `engine` against `world` every `interval` until `cancel` fires.
///
/// Intervals shorter than [`MIN_TICK_INTERVAL_MS`] are raised to it.
/// Runs on the caller's task; the engine is borrowed for the whole loop.
/// Returns the number of published ticks.
pub async fn run_tick_loop(
    engine: &mut MitigationEngine,
    world: &dyn WorldView,
    interval: Duration,
    cancel: CancellationToken,
) -> u64 {
    let mut ticker = tokio::time::interval(interval.max(MIN_TICK_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut published = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let TickOutcome::Published(_) = engine.tick(world) {
            published += 1;
        }
    }

    tracing::debug!(published, "Tick loop stopped");
    published
}
