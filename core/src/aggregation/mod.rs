//! Per-entity and per-party mitigation summaries.
//!
//! Debuffs on the opposing entity reduce the damage it deals to everyone,
//! so their factor is shared by the local entity and every party member.
//! Each member then stacks its own buffs on top.

mod stacking;

use serde::{Deserialize, Serialize};

use crate::effects::ActiveEffect;
use crate::world::{LOCAL_SLOT, PARTY_SLOTS, Vitals};

pub use stacking::{MitigationFactor, Reduction};

/// Mitigation shown for one party slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartySummary {
    pub entity_id: u64,
    pub physical_reduction_pct: f32,
    pub magical_reduction_pct: f32,
    pub shield_amount: f32,
}

impl PartySummary {
    /// Zeroed entry for an empty or unresolvable slot.
    pub const EMPTY: Self = Self {
        entity_id: 0,
        physical_reduction_pct: 0.0,
        magical_reduction_pct: 0.0,
        shield_amount: 0.0,
    };

    fn new(entity_id: u64, reduction: Reduction, vitals: Option<Vitals>) -> Self {
        Self {
            entity_id,
            physical_reduction_pct: reduction.physical_pct,
            magical_reduction_pct: reduction.magical_pct,
            shield_amount: vitals.map(|v| v.shield_amount()).unwrap_or(0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entity_id == 0
    }
}

/// Reduction, shield and effect list for one entity.
///
/// Used both for the local entity and for its current target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectSummary {
    pub entity_id: u64,
    pub physical_pct: f32,
    pub magical_pct: f32,
    pub shield_amount: f32,
    pub active_effects: Vec<ActiveEffect>,
}

pub type LocalSummary = EffectSummary;
pub type TargetSummary = EffectSummary;

impl EffectSummary {
    pub fn new(
        entity_id: u64,
        reduction: Reduction,
        vitals: Option<Vitals>,
        effects: &[ActiveEffect],
    ) -> Self {
        Self {
            entity_id,
            physical_pct: reduction.physical_pct,
            magical_pct: reduction.magical_pct,
            shield_amount: vitals.map(|v| v.shield_amount()).unwrap_or(0.0),
            active_effects: effects.to_vec(),
        }
    }
}

/// One entity's collected effects and vitals for the current tick.
#[derive(Debug, Clone, Copy)]
pub struct MemberInput<'a> {
    pub entity_id: u64,
    pub effects: &'a [ActiveEffect],
    /// `None` if the entity could not be resolved this tick.
    pub vitals: Option<Vitals>,
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Local reduction including shared target debuffs.
    pub local: Reduction,
    /// Reduction from target debuffs alone.
    pub target: Reduction,
    pub party: [PartySummary; PARTY_SLOTS],
}

/// Combine the tick's collections into local and party summaries.
///
/// `members` is indexed by party slot; slot 0 is ignored because it is
/// always filled from `local`. Only `target_effects` with
/// `applies_to_member == false` are shared. Pure function: same inputs,
/// same output.
pub fn aggregate(
    local: &MemberInput<'_>,
    target_effects: &[ActiveEffect],
    members: &[Option<MemberInput<'_>>; PARTY_SLOTS],
) -> Aggregate {
    let target_factor = MitigationFactor::from_effects(debuffs(target_effects));
    let local_reduction = MitigationFactor::from_effects(local.effects)
        .combine(target_factor)
        .reduction();

    let mut party = [PartySummary::EMPTY; PARTY_SLOTS];
    party[LOCAL_SLOT] = PartySummary::new(local.entity_id, local_reduction, local.vitals);

    for (slot, member) in members.iter().enumerate().skip(LOCAL_SLOT + 1) {
        party[slot] = match member {
            Some(m) => member_summary(m, target_factor),
            None => PartySummary::EMPTY,
        };
    }

    Aggregate {
        local: local_reduction,
        target: target_factor.reduction(),
        party,
    }
}

/// Effects on the opposing entity that reduce the damage it deals.
/// Buffs it happens to carry for itself are not shared.
fn debuffs(target_effects: &[ActiveEffect]) -> impl Iterator<Item = &ActiveEffect> {
    target_effects.iter().filter(|e| !e.applies_to_member)
}

fn member_summary(member: &MemberInput<'_>, target_factor: MitigationFactor) -> PartySummary {
    match member.vitals {
        Some(v) if v.targetable && member.entity_id != 0 => {
            let factor = target_factor.combine(MitigationFactor::from_effects(member.effects));
            PartySummary::new(member.entity_id, factor.reduction(), member.vitals)
        }
        _ => PartySummary::EMPTY,
    }
}
