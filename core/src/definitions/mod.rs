//! Mitigation definition table
//!
//! This module provides:
//! - **Definitions**: per-effect mitigation values (parsed from the remote JSON dataset)
//! - **Cache**: an immutable id -> definition table with provenance
//! - **Store**: the atomically swapped "current table" shared with the tick loop
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │             DefinitionSource (HTTP dataset / file)           │
//! │  [{"id": 1191, "mitigation": {"physical": 10, ...}}, ...]    │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                   parse_definitions (background task)
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │          DefinitionStore (ArcSwap<DefinitionCache>)          │
//! │  readers: current() -> Arc<DefinitionCache>, never blocks    │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                       EffectCollector
//! ```

mod error;
mod source;
mod store;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub use error::FetchError;
pub use source::{DefinitionSource, FileSource, HttpSource};
pub use store::DefinitionStore;

/// Mitigation values for one effect id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    pub id: u32,
    /// Physical damage reduction, 0..=100.
    pub physical_pct: f32,
    /// Magical damage reduction, 0..=100.
    pub magical_pct: f32,
    /// True for buffs that live on party members, false for debuffs
    /// placed on the opposing entity.
    pub applies_to_member: bool,
}

/// Where a definition table came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DefinitionOrigin {
    /// Built-in empty table used until the first successful refresh.
    #[default]
    Empty,
    Remote(String),
    File(PathBuf),
}

impl fmt::Display for DefinitionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "<empty>"),
            Self::Remote(url) => write!(f, "{}", url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Immutable effect id -> definition table.
///
/// Never mutated after construction; a refresh builds a new table and
/// swaps it in whole.
#[derive(Debug, Clone, Default)]
pub struct DefinitionCache {
    definitions: HashMap<u32, EffectDefinition>,
    origin: DefinitionOrigin,
    loaded_at: Option<DateTime<Utc>>,
}

impl DefinitionCache {
    /// Empty table (the state before any refresh succeeds).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from already validated definitions. Later duplicates win.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = EffectDefinition>,
        origin: DefinitionOrigin,
    ) -> Self {
        Self {
            definitions: definitions.into_iter().map(|d| (d.id, d)).collect(),
            origin,
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn get(&self, id: u32) -> Option<&EffectDefinition> {
        self.definitions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn origin(&self) -> &DefinitionOrigin {
        &self.origin
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.definitions.values()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    mitigation: Option<RawMitigation>,
    #[serde(default)]
    on_member: bool,
}

#[derive(Debug, Deserialize)]
struct RawMitigation {
    #[serde(default)]
    physical: f32,
    #[serde(default)]
    magical: f32,
}

fn clamp_pct(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) }
}

/// Parse the remote dataset into a table.
///
/// Entries with `id == 0` or without a `mitigation` body are dropped.
/// A payload with no usable entry is rejected so that it can never
/// replace a table that was loaded successfully before.
pub fn parse_definitions(
    bytes: &[u8],
    origin: DefinitionOrigin,
) -> Result<DefinitionCache, FetchError> {
    let raw: Vec<RawDefinition> = serde_json::from_slice(bytes)?;
    let total = raw.len();

    let definitions: Vec<EffectDefinition> = raw
        .into_iter()
        .filter(|r| r.id != 0)
        .filter_map(|r| {
            let m = r.mitigation?;
            Some(EffectDefinition {
                id: r.id,
                physical_pct: clamp_pct(m.physical),
                magical_pct: clamp_pct(m.magical),
                applies_to_member: r.on_member,
            })
        })
        .collect();

    if definitions.is_empty() {
        return Err(FetchError::EmptyTable);
    }

    tracing::debug!(
        total,
        kept = definitions.len(),
        origin = %origin,
        "Parsed mitigation definitions"
    );
    Ok(DefinitionCache::from_definitions(definitions, origin))
}
