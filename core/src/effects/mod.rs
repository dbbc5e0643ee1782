//! Active effect collection
//!
//! This module provides:
//! - **Rules**: how an observed status id turns into mitigation values
//! - **Buffer**: capacity-tracked scratch storage reused across ticks
//! - **Collector**: per-entity pass that resolves and deduplicates statuses
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │              StatusObservation (from the WorldView)            │
//! │   "entity 42 has status 1191 from entity 42, 8.5s remaining"   │
//! └────────────────────────────────────────────────────────────────┘
//!                              │
//!                  RuleBook / DefinitionCache lookup
//!                              │
//!                              ▼
//! ┌────────────────────────────────────────────────────────────────┐
//! │                 ActiveEffect (one per effect id)               │
//! │        "1191: 10% physical, 10% magical, 8.5s remaining"       │
//! └────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                      Aggregation engine
//! ```

mod buffer;
mod collector;
mod rules;


use serde::{Deserialize, Serialize};

pub use buffer::{CapacityError, EffectBuffer};
pub use collector::{DEFAULT_COLLECTOR_CAPACITY, EffectCollector};
pub use rules::{
    COMPANION_BUFF_STATUS_ID, COMPANION_TRIGGER_IDS, Mitigation, MitigationRule, RuleBook,
    SELF_SOURCE_STATUS_ID,
};

/// A resolved, mitigating effect on one entity for the current tick.
///
/// Rebuilt from live observations every tick; never carried over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub id: u32,
    /// Seconds left, never negative.
    pub remaining_time: f32,
    pub physical_pct: f32,
    pub magical_pct: f32,
    /// Party buff (true) or debuff on the opposing entity (false).
    pub applies_to_member: bool,
}

impl ActiveEffect {
    /// Effect with the same value on both axes.
    pub fn uniform(id: u32, remaining_time: f32, pct: f32) -> Self {
        Self {
            id,
            remaining_time,
            physical_pct: pct,
            magical_pct: pct,
            applies_to_member: true,
        }
    }
}
