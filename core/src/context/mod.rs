//! Per-encounter engine context and the tasks that run beside the tick loop.

mod background_tasks;
mod config;

use std::sync::Arc;

use aegis_types::MitigationConfig;

use crate::definitions::{DefinitionCache, DefinitionStore};
use crate::effects::{EffectCollector, RuleBook};

pub use background_tasks::{MIN_REFRESH_INTERVAL, run_tick_loop, spawn_definition_refresh};
pub use config::MitigationConfigExt;

/// Everything a tick needs besides the world: the shared definition store,
/// the collector with its rule book, and the config it was built from.
///
/// Built once per tracked encounter and handed to the engine; nothing here
/// is process-global.
#[derive(Debug, Clone)]
pub struct EngineContext {
    store: Arc<DefinitionStore>,
    collector: EffectCollector,
    config: MitigationConfig,
}

impl EngineContext {
    pub fn new(store: Arc<DefinitionStore>, config: MitigationConfig) -> Self {
        let collector =
            EffectCollector::new(RuleBook::default()).with_default_capacity(config.collector_capacity);
        Self {
            store,
            collector,
            config,
        }
    }

    /// Replace the rule book (e.g. to test table-only resolution).
    pub fn with_rules(mut self, rules: RuleBook) -> Self {
        self.collector =
            EffectCollector::new(rules).with_default_capacity(self.config.collector_capacity);
        self
    }

    pub fn store(&self) -> &Arc<DefinitionStore> {
        &self.store
    }

    /// Current definition table (lock-free).
    pub fn definitions(&self) -> Arc<DefinitionCache> {
        self.store.current()
    }

    pub fn collector(&self) -> &EffectCollector {
        &self.collector
    }

    pub fn config(&self) -> &MitigationConfig {
        &self.config
    }
}
