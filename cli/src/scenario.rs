//! JSON scenario files standing in for a live game client.
//!
//! ```json
//! {
//!   "frames": [
//!     {
//!       "local": 1,
//!       "target": 50,
//!       "party": [2, 3],
//!       "entities": [
//!         { "id": 1, "vitals": { "health": 90000, "max_health": 100000, "shield_percent": 20 },
//!           "statuses": [{ "effect_id": 1191, "source_id": 1, "remaining_time": 12.5 }] },
//!         { "id": 50, "vitals": { "health": 1, "max_health": 1 } }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! An entity listed without `vitals` exists but cannot be resolved as a
//! battle object. An id that is not listed at all behaves the same way.

use std::collections::HashMap;
use std::path::Path;

use aegis_core::{PARTY_SLOTS, StatusObservation, Vitals, WorldView};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub frames: Vec<Frame>,
}

/// World state for one tick.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub local: Option<u64>,
    pub target: Option<u64>,
    /// Party members for slots 1..=8, in order.
    pub party: Vec<u64>,
    pub entities: Vec<EntityState>,
}

#[derive(Debug, Deserialize)]
pub struct EntityState {
    pub id: u64,
    #[serde(default)]
    pub vitals: Option<Vitals>,
    #[serde(default)]
    pub statuses: Vec<StatusObservation>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let scenario: Scenario =
            serde_json::from_slice(&bytes).map_err(|e| format!("{}: {}", path.display(), e))?;
        if scenario.frames.is_empty() {
            return Err(format!("{}: scenario has no frames", path.display()));
        }
        Ok(scenario)
    }

    pub fn worlds(self) -> Vec<ScenarioWorld> {
        self.frames.into_iter().map(ScenarioWorld::from).collect()
    }
}

/// [`WorldView`] over one scenario frame.
#[derive(Debug)]
pub struct ScenarioWorld {
    local: Option<u64>,
    target: Option<u64>,
    party: [Option<u64>; PARTY_SLOTS],
    entities: HashMap<u64, EntityState>,
}

impl From<Frame> for ScenarioWorld {
    fn from(frame: Frame) -> Self {
        let mut party = [None; PARTY_SLOTS];
        for (slot, id) in party.iter_mut().skip(1).zip(frame.party) {
            *slot = Some(id);
        }
        Self {
            local: frame.local,
            target: frame.target,
            party,
            entities: frame.entities.into_iter().map(|e| (e.id, e)).collect(),
        }
    }
}

impl WorldView for ScenarioWorld {
    fn local_entity(&self) -> Option<u64> {
        self.local
    }

    fn current_target(&self) -> Option<u64> {
        self.target
    }

    fn party_member(&self, slot: usize) -> Option<u64> {
        self.party.get(slot).copied().flatten()
    }

    fn statuses(&self, entity: u64) -> Option<&[StatusObservation]> {
        let state = self.entities.get(&entity)?;
        state.vitals.as_ref()?;
        Some(state.statuses.as_slice())
    }

    fn vitals(&self, entity: u64) -> Option<Vitals> {
        self.entities.get(&entity)?.vitals
    }
}
