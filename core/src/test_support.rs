//! In-memory world used by unit tests.

use std::collections::HashMap;

use crate::world::{PARTY_SLOTS, StatusObservation, Vitals, WorldView};

#[derive(Debug, Default, Clone)]
pub struct FakeWorld {
    pub local: Option<u64>,
    pub target: Option<u64>,
    pub party: [Option<u64>; PARTY_SLOTS],
    pub statuses: HashMap<u64, Vec<StatusObservation>>,
    pub vitals: HashMap<u64, Vitals>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local(mut self, id: u64) -> Self {
        self.local = Some(id);
        self.with_vitals(id, vitals(0))
    }

    pub fn with_target(mut self, id: u64) -> Self {
        self.target = Some(id);
        self.with_vitals(id, vitals(0))
    }

    pub fn with_member(mut self, slot: usize, id: u64) -> Self {
        self.party[slot] = Some(id);
        self.with_vitals(id, vitals(0))
    }

    pub fn with_statuses(mut self, id: u64, statuses: Vec<StatusObservation>) -> Self {
        self.statuses.insert(id, statuses);
        self
    }

    pub fn with_vitals(mut self, id: u64, vitals: Vitals) -> Self {
        self.vitals.insert(id, vitals);
        self
    }

    pub fn without_vitals(mut self, id: u64) -> Self {
        self.vitals.remove(&id);
        self
    }
}

/// Targetable entity with 100k max health and the given shield percent.
pub fn vitals(shield_percent: u8) -> Vitals {
    Vitals {
        health: 100_000,
        max_health: 100_000,
        shield_percent,
        targetable: true,
    }
}

impl WorldView for FakeWorld {
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
        if let Some(list) = self.statuses.get(&entity) {
            return Some(list.as_slice());
        }
        // Resolvable entities without observed statuses have an empty list.
        self.vitals.contains_key(&entity).then_some(&[][..])
    }

    fn vitals(&self, entity: u64) -> Option<Vitals> {
        self.vitals.get(&entity).copied()
    }
}
