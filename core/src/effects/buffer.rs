use std::collections::TryReserveError;

use thiserror::Error;

use super::ActiveEffect;

#[derive(Debug, Error)]
pub enum CapacityError {
    #[error("effect buffer is full ({limit} distinct effects)")]
    Overflow { limit: usize },
    #[error("failed to grow effect buffer: {0}")]
    Alloc(#[from] TryReserveError),
}

/// Growable scratch list of [`ActiveEffect`] with at most one entry per id.
///
/// The logical capacity doubles when a push would exceed it, one
/// reallocation per breach, up to `limit`. `clear()` keeps the backing
/// storage so a steady state of ticks does not allocate.
#[derive(Debug, Clone)]
pub struct EffectBuffer {
    items: Vec<ActiveEffect>,
    capacity: usize,
    limit: usize,
    growth_events: u32,
}

impl EffectBuffer {
    /// Buffer that may grow without an upper bound.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limit(capacity, usize::MAX)
    }

    /// Buffer that refuses to hold more than `limit` distinct effects.
    pub fn with_limit(capacity: usize, limit: usize) -> Self {
        let limit = limit.max(1);
        let capacity = capacity.clamp(1, limit);
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            limit,
            growth_events: 0,
        }
    }

    /// Insert `effect`, or replace the entry with the same id if `effect`
    /// has more time remaining.
    pub fn push_or_replace_longer(&mut self, effect: ActiveEffect) -> Result<(), CapacityError> {
        if let Some(existing) = self.items.iter_mut().find(|e| e.id == effect.id) {
            if effect.remaining_time > existing.remaining_time {
                *existing = effect;
            }
            return Ok(());
        }

        if self.items.len() >= self.capacity {
            self.grow()?;
        }
        self.items.push(effect);
        Ok(())
    }

    fn grow(&mut self) -> Result<(), CapacityError> {
        if self.capacity >= self.limit {
            return Err(CapacityError::Overflow { limit: self.limit });
        }
        let new_capacity = self.capacity.saturating_mul(2).min(self.limit);
        self.items
            .try_reserve_exact(new_capacity - self.items.len())?;
        tracing::debug!(
            from = self.capacity,
            to = new_capacity,
            "Grew effect scratch buffer"
        );
        self.capacity = new_capacity;
        self.growth_events += 1;
        Ok(())
    }

    /// Reset the logical length. Backing storage is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Logical capacity (doubles on breach).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// How many times this buffer has grown.
    pub fn growth_events(&self) -> u32 {
        self.growth_events
    }

    pub fn as_slice(&self) -> &[ActiveEffect] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActiveEffect> {
        self.items.iter()
    }
}
