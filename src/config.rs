//! Tunable game constants.
//!
//! Every field has a serde default, so a partial JSON object (or `{}`) is a
//! valid configuration. `GameConfig::default()` is the canonical game.

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Upper bound on `level_count`.
pub const MAX_LEVELS: u32 = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub level_count: u32,
    pub base_level_secs: u32,
    pub long_level_secs: u32,
    /// 1-based levels that get `long_level_secs`.
    pub long_levels: Vec<u32>,
    pub heartbeat_threshold_secs: u32,
    pub heartbeat_step: f32,
    pub ghost_interval_ms: u32,
    /// Ghost is placed in `[0, extent - margin)` per axis.
    pub ghost_margin_px: f64,
    /// Key is placed at least this far from the room's top-left edges.
    pub key_margin_px: f64,
    pub whisper_chance: f64,
    pub ghost_heartbeat_chance: f64,
    pub ghost_heartbeat_intensity: f32,
    pub master_gain: f32,
    pub key_message_ms: u32,
    pub need_key_message_ms: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level_count: 10,
            base_level_secs: 60,
            long_level_secs: 120,
            long_levels: vec![5, 10],
            heartbeat_threshold_secs: 10,
            heartbeat_step: 0.06,
            ghost_interval_ms: 1400,
            ghost_margin_px: 140.0,
            key_margin_px: 80.0,
            whisper_chance: 0.14,
            ghost_heartbeat_chance: 0.1,
            ghost_heartbeat_intensity: 0.6,
            master_gain: 0.85,
            key_message_ms: 1400,
            need_key_message_ms: 1200,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let cfg: GameConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !(1..=MAX_LEVELS).contains(&self.level_count) {
            return Err(GameError::InvalidConfig(format!(
                "level_count must be within [1, {MAX_LEVELS}]"
            )));
        }
        if self.base_level_secs == 0 || self.long_level_secs == 0 {
            return Err(GameError::InvalidConfig("level durations must be positive".into()));
        }
        if let Some(n) = self.long_levels.iter().find(|n| !(1..=self.level_count).contains(*n)) {
            return Err(GameError::InvalidConfig(format!(
                "long level {n} is outside 1..={}",
                self.level_count
            )));
        }
        if self.ghost_interval_ms == 0 {
            return Err(GameError::InvalidConfig("ghost_interval_ms must be positive".into()));
        }
        if !self.master_gain.is_finite() || self.master_gain < 0.0 {
            return Err(GameError::InvalidConfig("master_gain must be finite and >= 0".into()));
        }
        for (name, px) in [
            ("ghost_margin_px", self.ghost_margin_px),
            ("key_margin_px", self.key_margin_px),
        ] {
            if !px.is_finite() || px < 0.0 {
                return Err(GameError::InvalidConfig(format!("{name} must be finite and >= 0")));
            }
        }
        for (name, p) in [
            ("whisper_chance", self.whisper_chance),
            ("ghost_heartbeat_chance", self.ghost_heartbeat_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GameError::InvalidConfig(format!("{name} must be within [0, 1]")));
            }
        }
        Ok(())
    }
}
