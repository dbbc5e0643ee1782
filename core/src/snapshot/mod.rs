//! Tick scratch space and the published snapshot.
//!
//! The tick loop is the only writer of the scratch buffers; it borrows them
//! through a [`ScratchHandle`] for the duration of one tick. When the tick
//! completes, the handle copies the results into an immutable [`Snapshot`]
//! and swaps it in. Renderers read through a [`SnapshotReader`] on their
//! own schedule and see either the previous or the new snapshot, whole.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregation::{LocalSummary, PartySummary, TargetSummary};
use crate::effects::EffectBuffer;
use crate::world::PARTY_SLOTS;

/// Initial per-entity capacity of the scratch buffers.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 16;

/// Result of one completed tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Sequence number of the tick that produced this snapshot (0 = none yet).
    pub tick: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub local: LocalSummary,
    pub target: TargetSummary,
    pub party: [PartySummary; PARTY_SLOTS],
}

/// Per-entity effect buffers reused across ticks.
#[derive(Debug)]
pub struct ScratchBuffers {
    pub local: EffectBuffer,
    pub target: EffectBuffer,
    /// Indexed by party slot. Slot 0 stays unused (the local entity has its own buffer).
    pub members: [EffectBuffer; PARTY_SLOTS],
}

impl ScratchBuffers {
    fn with_limit(capacity: usize, limit: usize) -> Self {
        Self {
            local: EffectBuffer::with_limit(capacity, limit),
            target: EffectBuffer::with_limit(capacity, limit),
            members: std::array::from_fn(|_| EffectBuffer::with_limit(capacity, limit)),
        }
    }

    fn clear(&mut self) {
        self.local.clear();
        self.target.clear();
        for member in &mut self.members {
            member.clear();
        }
    }

    /// Total number of capacity doublings across all buffers.
    pub fn growth_events(&self) -> u32 {
        self.local.growth_events()
            + self.target.growth_events()
            + self.members.iter().map(EffectBuffer::growth_events).sum::<u32>()
    }
}

/// Exclusive access to the scratch buffers for one tick.
///
/// Dropping the handle without calling [`publish`](Self::publish) abandons
/// the tick; the previously published snapshot stays current.
pub struct ScratchHandle<'a> {
    buffers: &'a mut ScratchBuffers,
    published: &'a ArcSwap<Snapshot>,
    next_tick: &'a mut u64,
}

impl ScratchHandle<'_> {
    pub fn buffers(&self) -> &ScratchBuffers {
        &*self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut ScratchBuffers {
        &mut *self.buffers
    }

    /// Swap in the completed tick's results. Returns the tick number.
    pub fn publish(
        self,
        local: LocalSummary,
        target: TargetSummary,
        party: [PartySummary; PARTY_SLOTS],
    ) -> u64 {
        let tick = *self.next_tick;
        *self.next_tick += 1;
        self.published.store(Arc::new(Snapshot {
            tick,
            published_at: Some(Utc::now()),
            local,
            target,
            party,
        }));
        tick
    }
}

/// Owner of the scratch buffers and the published snapshot.
#[derive(Debug)]
pub struct SnapshotPublisher {
    scratch: ScratchBuffers,
    published: Arc<ArcSwap<Snapshot>>,
    next_tick: u64,
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_SCRATCH_CAPACITY)
    }
}

impl SnapshotPublisher {
    pub fn new(scratch_capacity: usize) -> Self {
        Self::with_limit(scratch_capacity, usize::MAX)
    }

    /// Publisher whose scratch buffers hold at most `limit` effects per entity.
    pub fn with_limit(scratch_capacity: usize, limit: usize) -> Self {
        Self {
            scratch: ScratchBuffers::with_limit(scratch_capacity, limit),
            published: Arc::new(ArcSwap::from_pointee(Snapshot::default())),
            next_tick: 1,
        }
    }

    /// Start a tick: logical counts are reset, storage is kept.
    pub fn begin_tick(&mut self) -> ScratchHandle<'_> {
        self.scratch.clear();
        ScratchHandle {
            buffers: &mut self.scratch,
            published: &self.published,
            next_tick: &mut self.next_tick,
        }
    }

    /// The last fully published snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.published.load_full()
    }

    /// Cloneable read handle for another thread.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            published: Arc::clone(&self.published),
        }
    }

    /// Reset scratch counts and publish an empty snapshot.
    ///
    /// Backing storage is kept so the next encounter starts without
    /// reallocating.
    pub fn clear(&mut self) {
        self.scratch.clear();
        self.published.store(Arc::new(Snapshot::default()));
    }

    pub fn scratch(&self) -> &ScratchBuffers {
        &self.scratch
    }
}

/// Lock-free read access to the published snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    published: Arc<ArcSwap<Snapshot>>,
}

impl SnapshotReader {
    pub fn current(&self) -> Arc<Snapshot> {
        self.published.load_full()
    }

    /// Tick number of the current snapshot, without cloning the `Arc`.
    pub fn tick(&self) -> u64 {
        self.published.load().tick
    }
}
