//! Simulation tuning and client configuration
//!
//! Loaded from a JSON file; any field left out falls back to the defaults in
//! [`crate::consts`].

use std::path::Path;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::secs_to_frames;
use crate::sim::progression::{UpgradeOption, default_catalog};

/// Errors raised while loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings json invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(&'static str),
}

/// Tuning for one client session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Simulation frames per second (rates are divided by this)
    pub frame_rate: u32,
    /// Seed for upgrade draws and offline world population
    pub seed: u64,

    // === World ===
    pub world_width: f64,
    pub world_height: f64,
    pub spawn: DVec2,

    // === Player ===
    /// Move speed in units per frame
    pub player_speed: f64,
    pub max_hp: f64,
    /// Health regained per second while below max
    pub hp_regen: f64,

    // === Bullets ===
    /// Bullet speed in units per frame
    pub bullet_speed: f64,
    pub bullet_max_distance: f64,
    pub muzzle_offset: f64,

    // === Economy ===
    pub xp_collect_radius: f64,
    /// Orb drain (and xp credit) per second
    pub xp_per_second: f64,
    pub initial_xp_to_next: u32,
    pub xp_growth: f64,
    pub upgrade_window_secs: f64,
    pub notice_secs: f64,
    pub upgrades: Vec<UpgradeOption>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            seed: 0,

            world_width: DEFAULT_WORLD_WIDTH,
            world_height: DEFAULT_WORLD_HEIGHT,
            spawn: DVec2::new(SPAWN_X, SPAWN_Y),

            player_speed: PLAYER_SPEED,
            max_hp: PLAYER_MAX_HP,
            hp_regen: HP_REGEN_PER_SEC,

            bullet_speed: BULLET_SPEED,
            bullet_max_distance: BULLET_MAX_DISTANCE,
            muzzle_offset: MUZZLE_OFFSET,

            xp_collect_radius: XP_COLLECT_RADIUS,
            xp_per_second: XP_PER_SECOND,
            initial_xp_to_next: INITIAL_XP_TO_NEXT_LEVEL,
            xp_growth: XP_GROWTH_FACTOR,
            upgrade_window_secs: UPGRADE_WINDOW_SECS,
            notice_secs: AUTO_APPLY_NOTICE_SECS,
            upgrades: default_catalog(),
        }
    }
}

impl Settings {
    /// Settings with a specific seed, everything else default
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.frame_rate == 0 {
            return Err(SettingsError::Invalid("frame_rate must be positive"));
        }
        if self.initial_xp_to_next == 0 {
            return Err(SettingsError::Invalid("initial_xp_to_next must be positive"));
        }
        if !(self.xp_growth.is_finite() && self.xp_growth >= 1.0) {
            return Err(SettingsError::Invalid("xp_growth must be at least 1"));
        }
        if !(self.max_hp.is_finite() && self.max_hp > 0.0) {
            return Err(SettingsError::Invalid("max_hp must be positive"));
        }
        if !self.upgrade_window_secs.is_finite() || self.upgrade_window_frames() == 0 {
            return Err(SettingsError::Invalid("upgrade_window_secs must last at least one frame"));
        }
        if !self.notice_secs.is_finite() || self.notice_frames() == 0 {
            return Err(SettingsError::Invalid("notice_secs must last at least one frame"));
        }
        Ok(())
    }

    /// Seconds per frame
    pub fn frame_dt(&self) -> f64 {
        1.0 / self.frame_rate.max(1) as f64
    }

    /// Upgrade choice window in frames
    pub fn upgrade_window_frames(&self) -> u32 {
        secs_to_frames(self.upgrade_window_secs, self.frame_rate)
    }

    /// Auto-apply notice lifetime in frames
    pub fn notice_frames(&self) -> u32 {
        secs_to_frames(self.notice_secs, self.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_counts() {
        let settings = Settings::default();
        assert_eq!(settings.upgrade_window_frames(), 180);
        assert_eq!(settings.notice_frames(), 180);
        assert_eq!(settings.upgrades.len(), 5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "frame_rate": 30, "seed": 7 }"#).unwrap();
        assert_eq!(settings.frame_rate, 30);
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.upgrade_window_frames(), 90);
        assert_eq!(settings.bullet_max_distance, BULLET_MAX_DISTANCE);
    }

    #[test]
    fn test_validate_rejects_zero_frame_rate() {
        let settings = Settings {
            frame_rate: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_windows() {
        for secs in [0.0, -1.0, 0.001, f64::NAN, f64::INFINITY] {
            let settings = Settings {
                upgrade_window_secs: secs,
                ..Settings::default()
            };
            assert!(settings.validate().is_err(), "window of {} accepted", secs);

            let settings = Settings {
                notice_secs: secs,
                ..Settings::default()
            };
            assert!(settings.validate().is_err(), "notice of {} accepted", secs);
        }
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_save_load_file() {
        let path = std::env::temp_dir().join(format!("orb_arena_settings_{}.json", std::process::id()));
        let settings = Settings::with_seed(42);
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.seed, 42);
        assert_eq!(loaded.upgrades.len(), settings.upgrades.len());
    }
}
