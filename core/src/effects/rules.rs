//! Resolution of a status id to mitigation values.
//!
//! Most statuses are looked up in the definition table. A few have values
//! that depend on who applied them or on what else the target carries;
//! those are registered in the [`RuleBook`] and take precedence over the
//! table.

use hashbrown::HashMap;

use crate::definitions::EffectDefinition;
use crate::world::{StatusObservation, WorldView};

/// Status whose value depends on whether the holder applied it to itself.
pub const SELF_SOURCE_STATUS_ID: u32 = 2675;

/// Status whose value is boosted while a companion buff is also active.
pub const COMPANION_BUFF_STATUS_ID: u32 = 1174;

/// Companion buffs that boost [`COMPANION_BUFF_STATUS_ID`].
pub const COMPANION_TRIGGER_IDS: [u32; 2] = [1191, 3829];

/// Resolved mitigation for one status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mitigation {
    pub physical_pct: f32,
    pub magical_pct: f32,
    pub applies_to_member: bool,
}

impl Mitigation {
    fn both_axes(pct: f32) -> Self {
        Self {
            physical_pct: pct,
            magical_pct: pct,
            applies_to_member: true,
        }
    }
}

/// How one status id contributes mitigation.
#[derive(Debug, Clone, PartialEq)]
pub enum MitigationRule {
    /// Fixed values from the definition table.
    Standard(EffectDefinition),
    /// `boosted` when the status was applied by the entity carrying it,
    /// `baseline` otherwise. Both axes.
    SelfSourceConditional { baseline: f32, boosted: f32 },
    /// `boosted` while the entity also carries one of `trigger_ids`,
    /// `baseline` otherwise. Both axes. Skipped when the entity's own
    /// status list cannot be resolved.
    CompanionBuffConditional {
        baseline: f32,
        boosted: f32,
        trigger_ids: Vec<u32>,
    },
}

impl MitigationRule {
    /// Mitigation of `status` observed on `entity`, or `None` if the rule
    /// contributes nothing this tick.
    pub fn evaluate(
        &self,
        entity: u64,
        status: &StatusObservation,
        world: &dyn WorldView,
    ) -> Option<Mitigation> {
        match self {
            Self::Standard(def) => Some(Mitigation {
                physical_pct: def.physical_pct,
                magical_pct: def.magical_pct,
                applies_to_member: def.applies_to_member,
            }),
            Self::SelfSourceConditional { baseline, boosted } => {
                let pct = if status.source_id == entity {
                    *boosted
                } else {
                    *baseline
                };
                Some(Mitigation::both_axes(pct))
            }
            Self::CompanionBuffConditional {
                baseline,
                boosted,
                trigger_ids,
            } => {
                let statuses = world.statuses(entity)?;
                let triggered = statuses
                    .iter()
                    .any(|s| trigger_ids.contains(&s.effect_id));
                Some(Mitigation::both_axes(if triggered {
                    *boosted
                } else {
                    *baseline
                }))
            }
        }
    }
}

/// Conditional rules keyed by status id.
#[derive(Debug, Clone)]
pub struct RuleBook {
    rules: HashMap<u32, MitigationRule>,
}

impl Default for RuleBook {
    /// The two conditional statuses the engine knows about.
    fn default() -> Self {
        let mut book = Self::empty();
        book.insert(
            SELF_SOURCE_STATUS_ID,
            MitigationRule::SelfSourceConditional {
                baseline: 10.0,
                boosted: 15.0,
            },
        );
        book.insert(
            COMPANION_BUFF_STATUS_ID,
            MitigationRule::CompanionBuffConditional {
                baseline: 10.0,
                boosted: 20.0,
                trigger_ids: COMPANION_TRIGGER_IDS.to_vec(),
            },
        );
        book
    }
}

impl RuleBook {
    /// Book without conditional rules; everything resolves through the table.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Register (or replace) the rule for `effect_id`.
    pub fn insert(&mut self, effect_id: u32, rule: MitigationRule) {
        self.rules.insert(effect_id, rule);
    }

    pub fn get(&self, effect_id: u32) -> Option<&MitigationRule> {
        self.rules.get(&effect_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
