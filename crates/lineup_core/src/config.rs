//! Engine configuration.
//!
//! ```rust
//! use lineup_core::config::{EngineConfig, FieldPreset};
//!
//! let config = EngineConfig::default();
//! let eleven = EngineConfig::for_preset(FieldPreset::Eleven);
//! let from_env = EngineConfig::from_env_or_default();
//! # let _ = (config, eleven, from_env);
//! ```
//!
//! ## Environment Variables
//!
//! - `LINEUP_PRESET`: `five`, `seven`, `nine` or `eleven`
//! - `LINEUP_DURATION_SECS`: game length in seconds

use crate::error::ConfigError;
use crate::models::Position;
use serde::{Deserialize, Serialize};
use std::env;

/// Two 20-minute halves, the common youth format.
pub const DEFAULT_DURATION_SECS: u32 = 40 * 60;
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u32 = 5;
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

pub const PRESET_ENV: &str = "LINEUP_PRESET";
pub const DURATION_ENV: &str = "LINEUP_DURATION_SECS";

/// Small-sided formats and the positions each enables at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPreset {
    /// 5v5: 1-2-1-1
    Five,
    /// 7v7: 2-3-1
    #[default]
    Seven,
    /// 9v9: 3-3-2
    Nine,
    /// 11v11: 4-4-2
    Eleven,
}

impl FieldPreset {
    pub fn positions(&self) -> &'static [Position] {
        use Position::*;
        match self {
            FieldPreset::Five => &[GK, LB, RB, CM, ST],
            FieldPreset::Seven => &[GK, LCB, RCB, LM, CM, RM, ST],
            FieldPreset::Nine => &[GK, LCB, CB, RCB, LM, CM, RM, LS, RS],
            FieldPreset::Eleven => &[GK, LB, LCB, RCB, RB, LM, LCM, RCM, RM, LS, RS],
        }
    }

    pub fn players_on_field(&self) -> usize {
        self.positions().len()
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "five" | "5" | "5v5" => Some(FieldPreset::Five),
            "seven" | "7" | "7v7" => Some(FieldPreset::Seven),
            "nine" | "9" | "9v9" => Some(FieldPreset::Nine),
            "eleven" | "11" | "11v11" => Some(FieldPreset::Eleven),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Countdown length used on (re)start from zero and on reset
    pub duration_secs: u32,
    /// Positions enabled when a fresh game is created
    pub field_preset: FieldPreset,
    /// Live sessions persist at least this often while the clock runs
    pub autosave_interval_secs: u32,
    /// Cap on each player's position display log
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            field_preset: FieldPreset::default(),
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn for_preset(field_preset: FieldPreset) -> Self {
        let duration_secs = match field_preset {
            FieldPreset::Five => 2 * 15 * 60,
            FieldPreset::Seven | FieldPreset::Nine => DEFAULT_DURATION_SECS,
            FieldPreset::Eleven => 2 * 45 * 60,
        };
        Self { duration_secs, field_preset, ..Self::default() }
    }

    /// Read `LINEUP_PRESET` / `LINEUP_DURATION_SECS`; anything unparsable
    /// falls back to the default for that field.
    pub fn from_env_or_default() -> Self {
        let mut config = env::var(PRESET_ENV)
            .ok()
            .and_then(|name| FieldPreset::parse(&name))
            .map(Self::for_preset)
            .unwrap_or_default();

        if let Some(secs) = env::var(DURATION_ENV).ok().and_then(|v| v.trim().parse::<u32>().ok()) {
            if secs > 0 {
                config.duration_secs = secs;
            } else {
                log::warn!("{DURATION_ENV}=0 ignored");
            }
        }
        config
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs == 0 {
            return Err(ConfigError::Invalid("duration_secs must be positive".into()));
        }
        if self.autosave_interval_secs == 0 {
            return Err(ConfigError::Invalid("autosave_interval_secs must be positive".into()));
        }
        if self.history_limit < 2 {
            return Err(ConfigError::Invalid("history_limit must be at least 2".into()));
        }
        Ok(())
    }
}
