pub mod config;
pub mod formatting;

pub use config::{MIN_TICK_INTERVAL_MS, MitigationConfig};
