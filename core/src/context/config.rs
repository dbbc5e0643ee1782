//! Persisted engine configuration.

use aegis_types::MitigationConfig;

const APP_NAME: &str = "aegis";

/// Load/save [`MitigationConfig`] from the platform config directory.
pub trait MitigationConfigExt: Sized {
    /// Load the stored config, falling back to defaults if it is missing
    /// or unreadable.
    fn load() -> Self;

    /// Persist the config. Failures are logged, not returned.
    fn save(&self);
}

impl MitigationConfigExt for MitigationConfig {
    fn load() -> Self {
        match confy::load::<MitigationConfig>(APP_NAME, None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                MitigationConfig::default()
            }
        }
    }

    fn save(&self) {
        if let Err(e) = confy::store(APP_NAME, None, self) {
            tracing::error!(error = %e, "Failed to save config");
        }
    }
}
