//! Build-time configuration adapter.
//!
//! Implements [`ConfigPort`] over a JSON document baked into the image
//! through the `COOP_CONFIG_JSON` environment variable at compile time.
//! There is no persistent config store on the board; changing a
//! parameter means rebuilding.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::CoopConfig;

/// JSON document captured at build time, if any.
pub const BUILD_CONFIG_JSON: Option<&str> = option_env!("COOP_CONFIG_JSON");

pub struct EmbeddedConfig {
    json: Option<&'static str>,
}

impl EmbeddedConfig {
    /// Config from the `COOP_CONFIG_JSON` build environment.
    pub fn from_build_env() -> Self {
        Self::new(BUILD_CONFIG_JSON)
    }

    pub fn new(json: Option<&'static str>) -> Self {
        Self { json }
    }

    /// Load the config, falling back to defaults on any error.
    pub fn load_or_default(&self) -> CoopConfig {
        match self.load() {
            Ok(config) => {
                info!("Config: loaded from build environment");
                config
            }
            Err(ConfigError::NotFound) => {
                info!("Config: none supplied, using defaults");
                CoopConfig::default()
            }
            Err(e) => {
                warn!("Config: {}, using defaults", e);
                CoopConfig::default()
            }
        }
    }
}

impl ConfigPort for EmbeddedConfig {
    fn load(&self) -> Result<CoopConfig, ConfigError> {
        match self.json {
            Some(json) if !json.trim().is_empty() => CoopConfig::from_json(json),
            _ => Err(ConfigError::NotFound),
        }
    }
}
