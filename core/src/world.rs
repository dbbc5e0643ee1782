//! The shape of the game world the engine reads from.
//!
//! Entity lookup, party enumeration and status lists belong to the host
//! (game client hooks, a replayed log, a test fixture). The engine only
//! needs the narrow view below and treats every `None` as "not there right
//! now" rather than as an error.

use serde::{Deserialize, Serialize};

/// Fixed number of party slots presented to renderers.
pub const PARTY_SLOTS: usize = 9;

/// Slot reserved for the local entity.
pub const LOCAL_SLOT: usize = 0;

/// One status currently active on an entity, as observed this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusObservation {
    /// Effect id. `0` means "empty status slot".
    pub effect_id: u32,
    /// Entity that applied the effect.
    pub source_id: u64,
    /// Seconds left. Untimed effects report `0`.
    #[serde(default)]
    pub remaining_time: f32,
}

impl StatusObservation {
    pub fn new(effect_id: u32, source_id: u64, remaining_time: f32) -> Self {
        Self {
            effect_id,
            source_id,
            remaining_time,
        }
    }
}

/// Health and shield state of a battle-capable entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: u32,
    pub max_health: u32,
    /// Shield as a percentage of max health (0..=100).
    #[serde(default)]
    pub shield_percent: u8,
    #[serde(default = "default_true")]
    pub targetable: bool,
}

fn default_true() -> bool {
    true
}

impl Vitals {
    /// Absolute shield value: `max_health * shield_percent / 100`.
    pub fn shield_amount(&self) -> f32 {
        self.max_health as f32 * (self.shield_percent as f32 / 100.0)
    }
}

/// Read-only view of the world for one tick.
pub trait WorldView {
    /// The entity the summary is computed for.
    fn local_entity(&self) -> Option<u64>;

    /// The opposing entity the local entity currently targets.
    fn current_target(&self) -> Option<u64>;

    /// Party member occupying `slot` (1..=8). Slot 0 is always the local entity.
    fn party_member(&self, slot: usize) -> Option<u64>;

    /// Active statuses on `entity`, or `None` if it cannot be resolved
    /// to a battle-capable object.
    fn statuses(&self, entity: u64) -> Option<&[StatusObservation]>;

    /// Vitals of `entity`, or `None` if it cannot be resolved.
    fn vitals(&self, entity: u64) -> Option<Vitals>;
}
