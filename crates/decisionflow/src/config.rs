//! Editor configuration
//!
//! Loaded from an optional JSON file, then overridden by environment
//! variables. Missing keys fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::core::{FlowError, LayoutDirection};
use crate::layout::LayoutConfig;

/// Environment variable overriding the default layout direction
pub const DIRECTION_ENV: &str = "DECISIONFLOW_DIRECTION";

/// Where freshly added nodes appear: `origin + U[0, spread)` on each axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub origin: f64,
    pub spread: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            origin: 20.0,
            spread: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub layout: LayoutConfig,
    pub default_direction: LayoutDirection,
    pub spawn: SpawnConfig,
}

impl EditorConfig {
    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading editor config");
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Apply `DECISIONFLOW_DIRECTION` when it is set
    pub fn with_env_overrides(self) -> Result<Self, FlowError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the process env in production)
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FlowError> {
        if let Some(raw) = lookup(DIRECTION_ENV) {
            self.default_direction = raw.parse()?;
            debug!(direction = %self.default_direction, "Direction overridden from environment");
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        self.layout.validate()?;
        if !self.spawn.origin.is_finite() || !self.spawn.spread.is_finite() || self.spawn.spread < 0.0 {
            return Err(FlowError::config_error(
                "spawn origin must be finite and spread non-negative",
            ));
        }
        Ok(())
    }
}
