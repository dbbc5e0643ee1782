//! Atomically published definition table.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;

use super::{DefinitionCache, DefinitionSource, FetchError, parse_definitions};

/// Owner of the current definition table.
///
/// The background refresh is the only writer. Readers get an `Arc` to a
/// complete table: either the one before a swap or the one after, never
/// anything in between. Readers never take a lock.
#[derive(Debug)]
pub struct DefinitionStore {
    current: ArcSwap<DefinitionCache>,
    generation: AtomicU64,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    /// Store holding the empty table.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(DefinitionCache::empty()),
            generation: AtomicU64::new(0),
        }
    }

    /// Store seeded with an already loaded table.
    pub fn with_cache(cache: DefinitionCache) -> Self {
        let store = Self::new();
        store.install(cache);
        store
    }

    /// The last successfully published table. Never blocks, never fails.
    pub fn current(&self) -> Arc<DefinitionCache> {
        self.current.load_full()
    }

    /// Number of tables published since construction.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Publish `cache` as the current table.
    pub fn install(&self, cache: DefinitionCache) {
        self.current.store(Arc::new(cache));
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Fetch, parse and publish a new table from `source`.
    ///
    /// On any error (including cancellation) nothing is published and the
    /// previous table stays current. Returns the number of definitions in
    /// the new table.
    pub async fn refresh<S: DefinitionSource>(
        &self,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<usize, FetchError> {
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = source.fetch() => result?,
        };

        let cache = parse_definitions(&bytes, source.origin())?;

        // The owner may have been torn down while we were parsing.
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let count = cache.len();
        tracing::info!(count, origin = %cache.origin(), "Published mitigation definitions");
        self.install(cache);
        Ok(count)
    }
}
