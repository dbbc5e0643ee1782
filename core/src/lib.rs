pub mod aggregation;
pub mod context;
pub mod definitions;
pub mod effects;
pub mod engine;
pub mod snapshot;
pub mod world;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use aggregation::{EffectSummary, LocalSummary, PartySummary, Reduction, TargetSummary};
pub use context::{EngineContext, MitigationConfigExt, run_tick_loop, spawn_definition_refresh};
pub use definitions::{
    DefinitionCache, DefinitionOrigin, DefinitionSource, DefinitionStore, EffectDefinition,
    FetchError, FileSource, HttpSource,
};
pub use effects::{ActiveEffect, CapacityError, EffectCollector, MitigationRule, RuleBook};
pub use engine::{EncounterSignal, EngineState, MitigationEngine, SignalHandler, TickOutcome};
pub use snapshot::{Snapshot, SnapshotPublisher, SnapshotReader};
pub use world::{PARTY_SLOTS, StatusObservation, Vitals, WorldView};
