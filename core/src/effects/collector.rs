//! Per-entity collection pass.

use crate::definitions::DefinitionCache;
use crate::world::{StatusObservation, WorldView};

use super::{ActiveEffect, CapacityError, EffectBuffer, Mitigation, MitigationRule, RuleBook};

/// Initial capacity of a standalone [`EffectCollector::collect`] pass.
pub const DEFAULT_COLLECTOR_CAPACITY: usize = 64;

/// Turns an entity's observed statuses into deduplicated [`ActiveEffect`]s.
///
/// Collections for different entities are independent, so the order in
/// which a tick collects the local entity, its target and party members
/// does not matter.
#[derive(Debug, Clone)]
pub struct EffectCollector {
    rules: RuleBook,
    default_capacity: usize,
}

impl Default for EffectCollector {
    fn default() -> Self {
        Self::new(RuleBook::default())
    }
}

impl EffectCollector {
    pub fn new(rules: RuleBook) -> Self {
        Self {
            rules,
            default_capacity: DEFAULT_COLLECTOR_CAPACITY,
        }
    }

    /// Override the initial capacity used by [`collect`](Self::collect).
    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Resolve one status to mitigation values.
    ///
    /// Conditional rules win over the definition table; unknown ids
    /// contribute nothing.
    fn resolve(
        &self,
        entity: u64,
        status: &StatusObservation,
        world: &dyn WorldView,
        definitions: &DefinitionCache,
    ) -> Option<Mitigation> {
        match self.rules.get(status.effect_id) {
            Some(rule) => rule.evaluate(entity, status, world),
            None => {
                let def = definitions.get(status.effect_id)?;
                MitigationRule::Standard(*def).evaluate(entity, status, world)
            }
        }
    }

    /// Collect `entity`'s mitigating effects into `out`.
    ///
    /// `out` is not cleared first. An entity the world cannot resolve
    /// yields nothing.
    pub fn collect_into(
        &self,
        entity: u64,
        world: &dyn WorldView,
        definitions: &DefinitionCache,
        out: &mut EffectBuffer,
    ) -> Result<(), CapacityError> {
        let Some(statuses) = world.statuses(entity) else {
            return Ok(());
        };

        for status in statuses {
            if status.effect_id == 0 {
                continue;
            }
            let Some(m) = self.resolve(entity, status, world, definitions) else {
                continue;
            };
            out.push_or_replace_longer(ActiveEffect {
                id: status.effect_id,
                remaining_time: status.remaining_time.max(0.0),
                physical_pct: m.physical_pct,
                magical_pct: m.magical_pct,
                applies_to_member: m.applies_to_member,
            })?;
        }
        Ok(())
    }

    /// Standalone collection into a fresh buffer of the default capacity.
    pub fn collect(
        &self,
        entity: u64,
        world: &dyn WorldView,
        definitions: &DefinitionCache,
    ) -> Result<EffectBuffer, CapacityError> {
        let mut out = EffectBuffer::with_capacity(self.default_capacity);
        self.collect_into(entity, world, definitions, &mut out)?;
        Ok(out)
    }
}
