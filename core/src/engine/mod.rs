//! Engine lifecycle and the per-tick pipeline.
//!
//! ```text
//!            enter_combat / DutyEntered
//!   ┌──────┐ ─────────────────────────▶ ┌──────────┐  first tick  ┌─────────┐
//!   │ Idle │                            │ Tracking │ ───────────▶ │ Ticking │
//!   └──────┘ ◀──────────────────────────└──────────┘              └─────────┘
//!       ▲         leave_combat (buffers cleared)                       │
//!       └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! One tick:
//!
//! ```text
//!   DefinitionStore::current()
//!          │
//!          ▼
//!   begin_tick ─▶ collect local ─▶ collect target ─▶ collect members 1..=8
//!                                                          │
//!                                                          ▼
//!                                    publish ◀── aggregate
//! ```

mod signals;

use std::sync::Arc;

use aegis_types::MitigationConfig;
use tokio_util::sync::CancellationToken;

use crate::aggregation::{EffectSummary, MemberInput, PartySummary, aggregate};
use crate::context::EngineContext;
use crate::effects::CapacityError;
use crate::snapshot::{Snapshot, SnapshotPublisher, SnapshotReader};
use crate::world::{LOCAL_SLOT, PARTY_SLOTS, WorldView};

pub use signals::{EncounterSignal, SignalHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No tracked encounter; ticks are skipped.
    Idle,
    /// Encounter started, no tick has run yet.
    Tracking,
    /// Steady-state refresh.
    Ticking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Engine is idle.
    Skipped,
    /// A new snapshot was published with this tick number.
    Published(u64),
    /// Scratch growth failed; the previous snapshot stays current.
    Abandoned,
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Drives collection and aggregation for one tracked encounter.
///
/// The engine is the only mutator of its scratch buffers. It is meant to be
/// ticked from a single task; renderers read through [`reader`](Self::reader).
#[derive(Debug)]
pub struct MitigationEngine {
    context: EngineContext,
    publisher: SnapshotPublisher,
    state: EngineState,
    in_combat: bool,
    in_duty: bool,
    cancel: CancellationToken,
}

impl MitigationEngine {
    pub fn new(context: EngineContext) -> Self {
        let config = context.config();
        let publisher =
            SnapshotPublisher::with_limit(config.scratch_capacity, config.max_effects_per_entity);
        Self {
            context,
            publisher,
            state: EngineState::Idle,
            in_combat: false,
            in_duty: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    pub fn config(&self) -> &MitigationConfig {
        self.context.config()
    }

    /// Start tracking. No-op unless idle.
    pub fn enter_combat(&mut self) {
        if self.state == EngineState::Idle {
            tracing::info!("Mitigation tracking started");
            self.state = EngineState::Tracking;
        }
    }

    /// Stop tracking and clear the published snapshot.
    ///
    /// The definition table is left untouched.
    pub fn leave_combat(&mut self) {
        if self.state != EngineState::Idle {
            tracing::info!("Mitigation tracking stopped");
        }
        self.state = EngineState::Idle;
        self.clear();
    }

    /// Reset scratch counts and publish an empty snapshot. State is unchanged.
    pub fn clear(&mut self) {
        self.publisher.clear();
    }

    /// Lock-free read handle for a renderer.
    pub fn reader(&self) -> SnapshotReader {
        self.publisher.reader()
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.publisher.current()
    }

    /// Token for tasks that must stop when this engine is dropped.
    ///
    /// Child token: cancelling it does not cancel the engine's own token.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Run one collection + aggregation pass against `world`.
    pub fn tick(&mut self, world: &dyn WorldView) -> TickOutcome {
        match self.state {
            EngineState::Idle => return TickOutcome::Skipped,
            EngineState::Tracking => self.state = EngineState::Ticking,
            EngineState::Ticking => {}
        }

        match self.run_tick(world) {
            Ok(tick) => TickOutcome::Published(tick),
            Err(e) => {
                tracing::warn!(error = %e, "Tick abandoned; keeping previous snapshot");
                TickOutcome::Abandoned
            }
        }
    }

    fn run_tick(&mut self, world: &dyn WorldView) -> Result<u64, CapacityError> {
        let definitions = self.context.definitions();
        let collector = self.context.collector();
        let mut handle = self.publisher.begin_tick();

        let Some(local_id) = world.local_entity() else {
            tracing::debug!("No local entity; publishing empty snapshot");
            return Ok(handle.publish(
                EffectSummary::default(),
                EffectSummary::default(),
                [PartySummary::EMPTY; PARTY_SLOTS],
            ));
        };
        let member_ids: [Option<u64>; PARTY_SLOTS] = std::array::from_fn(|slot| {
            if slot == LOCAL_SLOT {
                return None;
            }
            world.party_member(slot).filter(|&id| id != local_id)
        });
        // A friendly target (self or party member) has no debuffs to share.
        let target_id = world
            .current_target()
            .filter(|&id| id != local_id && !member_ids.contains(&Some(id)));

        let scratch = handle.buffers_mut();
        collector.collect_into(local_id, world, &definitions, &mut scratch.local)?;
        if let Some(target) = target_id {
            collector.collect_into(target, world, &definitions, &mut scratch.target)?;
        }
        for (slot, id) in member_ids.iter().enumerate() {
            if let Some(id) = *id {
                collector.collect_into(id, world, &definitions, &mut scratch.members[slot])?;
            }
        }

        let scratch = handle.buffers();
        let local_vitals = world.vitals(local_id);
        let local = MemberInput {
            entity_id: local_id,
            effects: scratch.local.as_slice(),
            vitals: local_vitals,
        };
        let members: [Option<MemberInput<'_>>; PARTY_SLOTS] = std::array::from_fn(|slot| {
            member_ids[slot].map(|id| MemberInput {
                entity_id: id,
                effects: scratch.members[slot].as_slice(),
                vitals: world.vitals(id),
            })
        });

        let result = aggregate(&local, scratch.target.as_slice(), &members);

        let local_summary =
            EffectSummary::new(local_id, result.local, local_vitals, scratch.local.as_slice());
        let target_summary = match target_id {
            Some(id) => {
                EffectSummary::new(id, result.target, world.vitals(id), scratch.target.as_slice())
            }
            None => EffectSummary::default(),
        };

        tracing::debug!(
            local_effects = scratch.local.len(),
            target_effects = scratch.target.len(),
            physical = result.local.physical_pct,
            magical = result.local.magical_pct,
            "Tick aggregated"
        );

        Ok(handle.publish(local_summary, target_summary, result.party))
    }
}

impl SignalHandler for MitigationEngine {
    fn handle_signal(&mut self, signal: EncounterSignal) {
        match signal {
            EncounterSignal::CombatStarted => self.in_combat = true,
            EncounterSignal::CombatEnded => self.in_combat = false,
            EncounterSignal::DutyEntered => self.in_duty = true,
            EncounterSignal::DutyLeft => self.in_duty = false,
        }

        if self.in_combat || self.in_duty {
            self.enter_combat();
        } else {
            self.leave_combat();
        }
    }
}

impl Drop for MitigationEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{DefinitionCache, DefinitionOrigin, DefinitionStore, EffectDefinition};
    use crate::effects::{COMPANION_BUFF_STATUS_ID, COMPANION_TRIGGER_IDS, RuleBook};
    use crate::test_support::{FakeWorld, vitals};
    use crate::world::StatusObservation;

    const LOCAL: u64 = 1;
    const TARGET: u64 = 50;

    fn def(id: u32, physical: f32, magical: f32, on_member: bool) -> EffectDefinition {
        EffectDefinition {
            id,
            physical_pct: physical,
            magical_pct: magical,
            applies_to_member: on_member,
        }
    }

    fn context_with(defs: Vec<EffectDefinition>, config: MitigationConfig) -> EngineContext {
        let cache = DefinitionCache::from_definitions(defs, DefinitionOrigin::Empty);
        let store = Arc::new(DefinitionStore::with_cache(cache));
        EngineContext::new(store, config)
    }

    fn engine_with(defs: Vec<EffectDefinition>) -> MitigationEngine {
        MitigationEngine::new(context_with(defs, MitigationConfig::default()))
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn status(id: u32) -> StatusObservation {
        StatusObservation::new(id, 999, 10.0)
    }

    #[test]
    fn test_idle_engine_skips_ticks() {
        let mut engine = engine_with(vec![]);
        let world = FakeWorld::new().with_local(LOCAL);

        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.tick(&world), TickOutcome::Skipped);
        assert_eq!(engine.current().tick, 0);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut engine = engine_with(vec![]);
        let world = FakeWorld::new().with_local(LOCAL);

        engine.enter_combat();
        assert_eq!(engine.state(), EngineState::Tracking);
        assert_eq!(engine.tick(&world), TickOutcome::Published(1));
        assert_eq!(engine.state(), EngineState::Ticking);

        // Re-entering while ticking does not restart tracking.
        engine.enter_combat();
        assert_eq!(engine.state(), EngineState::Ticking);

        engine.leave_combat();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.current().tick, 0);
    }

    #[test]
    fn test_leave_combat_keeps_definitions() {
        let mut engine = engine_with(vec![def(10, 20.0, 20.0, true)]);
        let before = engine.context().definitions();

        engine.enter_combat();
        engine.leave_combat();

        assert!(Arc::ptr_eq(&before, &engine.context().definitions()));
        assert_eq!(engine.context().store().generation(), 1);
    }

    #[test]
    fn test_tick_publishes_local_target_and_party() {
        let mut engine = engine_with(vec![
            def(10, 15.0, 15.0, true),
            def(11, 20.0, 0.0, true),
            def(40, 10.0, 10.0, false),
        ]);
        let world = FakeWorld::new()
            .with_local(LOCAL)
            .with_target(TARGET)
            .with_member(1, 2)
            .with_member(3, 4)
            .with_statuses(LOCAL, vec![status(10), status(11)])
            .with_statuses(TARGET, vec![status(40)])
            .with_statuses(4, vec![status(11)])
            .with_vitals(LOCAL, vitals(25));

        engine.enter_combat();
        assert_eq!(engine.tick(&world), TickOutcome::Published(1));
        let snapshot = engine.reader().current();

        // 0.85 * 0.8 * 0.9 = 0.612
        assert_eq!(snapshot.local.entity_id, LOCAL);
        assert!(approx(snapshot.local.physical_pct, 38.8));
        // 0.85 * 0.9 = 0.765
        assert!(approx(snapshot.local.magical_pct, 23.5));
        assert_eq!(snapshot.local.active_effects.len(), 2);
        assert_eq!(snapshot.local.shield_amount, 25_000.0);

        assert_eq!(snapshot.target.entity_id, TARGET);
        assert!(approx(snapshot.target.physical_pct, 10.0));
        assert!(!snapshot.target.active_effects[0].applies_to_member);

        assert_eq!(snapshot.party[0].entity_id, LOCAL);
        assert!(approx(snapshot.party[1].physical_reduction_pct, 10.0));
        // 0.9 * 0.8 = 0.72
        assert!(approx(snapshot.party[3].physical_reduction_pct, 28.0));
        assert!(snapshot.party[2].is_empty());
    }

    #[test]
    fn test_targeting_self_does_not_double_own_buffs() {
        let mut engine = engine_with(vec![def(10, 20.0, 20.0, true)]);
        let world = FakeWorld::new()
            .with_local(LOCAL)
            .with_target(LOCAL)
            .with_member(1, 2)
            .with_statuses(LOCAL, vec![status(10)]);

        engine.enter_combat();
        engine.tick(&world);
        let snapshot = engine.current();

        assert!(approx(snapshot.local.physical_pct, 20.0));
        assert_eq!(snapshot.party[1].entity_id, 2);
        assert_eq!(snapshot.party[1].physical_reduction_pct, 0.0);
        assert_eq!(snapshot.target, EffectSummary::default());
    }

    #[test]
    fn test_targeting_ally_does_not_share_their_buffs() {
        let mut engine = engine_with(vec![def(10, 20.0, 20.0, true)]);
        let world = FakeWorld::new()
            .with_local(LOCAL)
            .with_target(2)
            .with_member(1, 2)
            .with_statuses(2, vec![status(10)]);

        engine.enter_combat();
        engine.tick(&world);
        let snapshot = engine.current();

        assert_eq!(snapshot.local.physical_pct, 0.0);
        assert!(approx(snapshot.party[1].physical_reduction_pct, 20.0));
        assert_eq!(snapshot.target, EffectSummary::default());
    }

    #[test]
    fn test_buffs_carried_by_enemy_target_are_not_shared() {
        let mut engine = engine_with(vec![def(10, 20.0, 20.0, true), def(40, 10.0, 10.0, false)]);
        let world = FakeWorld::new()
            .with_local(LOCAL)
            .with_target(TARGET)
            .with_member(1, 2)
            .with_statuses(TARGET, vec![status(10), status(40)]);

        engine.enter_combat();
        engine.tick(&world);
        let snapshot = engine.current();

        assert!(approx(snapshot.local.physical_pct, 10.0));
        assert!(approx(snapshot.party[1].physical_reduction_pct, 10.0));
        assert_eq!(snapshot.target.active_effects.len(), 2);
    }

    #[test]
    fn test_no_local_entity_publishes_zeroed_snapshot() {
        let mut engine = engine_with(vec![def(10, 15.0, 15.0, true)]);
        engine.enter_combat();

        let outcome = engine.tick(&FakeWorld::new().with_target(TARGET));

        assert_eq!(outcome, TickOutcome::Published(1));
        let snapshot = engine.current();
        assert_eq!(snapshot.local, EffectSummary::default());
        assert!(snapshot.party.iter().all(PartySummary::is_empty));
    }

    #[test]
    fn test_member_that_left_party_is_zeroed_next_tick() {
        let mut engine = engine_with(vec![def(10, 15.0, 15.0, true)]);
        let with_member = FakeWorld::new()
            .with_local(LOCAL)
            .with_member(5, 6)
            .with_statuses(6, vec![status(10)]);
        let without_member = FakeWorld::new().with_local(LOCAL);

        engine.enter_combat();
        engine.tick(&with_member);
        assert_eq!(engine.current().party[5].entity_id, 6);

        engine.tick(&without_member);
        assert_eq!(engine.current().party[5], PartySummary::EMPTY);
    }

    #[test]
    fn test_unresolvable_member_is_zeroed() {
        let mut engine = engine_with(vec![def(10, 15.0, 15.0, true)]);
        let world = FakeWorld::new()
            .with_local(LOCAL)
            .with_member(2, 3)
            .without_vitals(3);

        engine.enter_combat();
        engine.tick(&world);

        assert_eq!(engine.current().party[2], PartySummary::EMPTY);
    }

    #[test]
    fn test_companion_rule_applies_through_engine() {
        let mut engine = engine_with(vec![def(COMPANION_TRIGGER_IDS[0], 0.0, 0.0, true)]);
        let world = FakeWorld::new().with_local(LOCAL).with_statuses(
            LOCAL,
            vec![status(COMPANION_BUFF_STATUS_ID), status(COMPANION_TRIGGER_IDS[0])],
        );

        engine.enter_combat();
        engine.tick(&world);

        assert!(approx(engine.current().local.physical_pct, 20.0));
    }

    #[test]
    fn test_empty_rule_book_resolves_through_table_only() {
        let context = context_with(
            vec![def(COMPANION_BUFF_STATUS_ID, 5.0, 5.0, true)],
            MitigationConfig::default(),
        )
        .with_rules(RuleBook::empty());
        let mut engine = MitigationEngine::new(context);
        let world = FakeWorld::new().with_local(LOCAL).with_statuses(
            LOCAL,
            vec![status(COMPANION_BUFF_STATUS_ID), status(COMPANION_TRIGGER_IDS[0])],
        );

        engine.enter_combat();
        engine.tick(&world);

        assert!(approx(engine.current().local.physical_pct, 5.0));
    }

    #[test]
    fn test_tick_over_effect_limit_is_abandoned() {
        let config = MitigationConfig {
            scratch_capacity: 2,
            max_effects_per_entity: 4,
            ..MitigationConfig::default()
        };
        let defs = (1..=5).map(|id| def(id, 1.0, 1.0, true)).collect();
        let mut engine = MitigationEngine::new(context_with(defs, config));
        let small = FakeWorld::new()
            .with_local(LOCAL)
            .with_statuses(LOCAL, (1..=2).map(status).collect());
        let crowded = FakeWorld::new()
            .with_local(LOCAL)
            .with_statuses(LOCAL, (1..=5).map(status).collect());

        engine.enter_combat();
        assert_eq!(engine.tick(&small), TickOutcome::Published(1));
        let before = engine.current();

        assert_eq!(engine.tick(&crowded), TickOutcome::Abandoned);
        assert!(Arc::ptr_eq(&before, &engine.current()));
        assert_eq!(engine.state(), EngineState::Ticking);

        // The next tick that fits publishes normally.
        assert_eq!(engine.tick(&small), TickOutcome::Published(2));
    }

    #[test]
    fn test_signals_drive_lifecycle() {
        let mut engine = engine_with(vec![]);

        engine.handle_signal(EncounterSignal::DutyEntered);
        assert_eq!(engine.state(), EngineState::Tracking);

        engine.handle_signals(&[EncounterSignal::CombatStarted, EncounterSignal::CombatEnded]);
        assert_eq!(engine.state(), EngineState::Tracking);

        engine.handle_signal(EncounterSignal::DutyLeft);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_drop_cancels_child_tokens() {
        let engine = engine_with(vec![]);
        let token = engine.cancellation();
        assert!(!token.is_cancelled());

        drop(engine);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_scratch_growth_keeps_every_effect() {
        let defs: Vec<_> = (1..=40).map(|id| def(id, 1.0, 1.0, true)).collect();
        let mut engine = engine_with(defs);
        let world = FakeWorld::new()
            .with_local(LOCAL)
            .with_statuses(LOCAL, (1..=40).map(status).collect());

        engine.enter_combat();
        engine.tick(&world);

        assert_eq!(engine.current().local.active_effects.len(), 40);
    }
}
