//! Orb Arena - simulation core of a multiplayer arena client
//!
//! Core modules:
//! - `sim`: Deterministic per-frame simulation (entity store, movement, xp economy, upgrades)
//! - `net`: Wire protocol and the connection gateway seam
//! - `client`: Fixed-timestep scheduler tying the simulation to a gateway
//! - `settings`: Data-driven tuning

pub mod client;
pub mod net;
pub mod settings;
pub mod sim;

pub use client::{Client, FixedTimestep};
pub use settings::{Settings, SettingsError};

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    /// Default simulation rate (one step per display frame)
    pub const DEFAULT_FRAME_RATE: u32 = 60;
    /// Maximum frames run per scheduler update to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest wall-clock delta accepted by the scheduler (seconds)
    pub const MAX_FRAME_DELTA: f64 = 0.25;

    /// World defaults (replaced by the first session snapshot)
    pub const DEFAULT_WORLD_WIDTH: f64 = 2000.0;
    pub const DEFAULT_WORLD_HEIGHT: f64 = 2000.0;
    /// Where the local player appears after identity assignment
    pub const SPAWN_X: f64 = 400.0;
    pub const SPAWN_Y: f64 = 300.0;

    /// Player defaults (speeds are per frame, rates are per second)
    pub const PLAYER_SPEED: f64 = 2.0;
    pub const PLAYER_MAX_HP: f64 = 100.0;
    pub const HP_REGEN_PER_SEC: f64 = 1.0;

    /// Bullet defaults
    pub const BULLET_SPEED: f64 = 2.5;
    pub const BULLET_MAX_DISTANCE: f64 = 150.0;
    /// Bullets spawn this far in front of the player
    pub const MUZZLE_OFFSET: f64 = 20.0;
    /// Slower bullets would never reach their range and are dropped
    pub const MIN_BULLET_SPEED: f64 = 1e-3;

    /// Orb pickup
    pub const XP_COLLECT_RADIUS: f64 = 30.0;
    pub const XP_PER_SECOND: f64 = 10.0;

    /// Leveling
    pub const INITIAL_XP_TO_NEXT_LEVEL: u32 = 100;
    pub const XP_GROWTH_FACTOR: f64 = 1.5;
    pub const UPGRADE_CHOICES: usize = 3;
    /// Cap on levels gained in a single frame
    pub const MAX_LEVELS_PER_FRAME: u32 = 64;
    /// Upgrade window and auto-apply notice (3 seconds each)
    pub const UPGRADE_WINDOW_SECS: f64 = 3.0;
    pub const AUTO_APPLY_NOTICE_SECS: f64 = 3.0;

    /// Tolerance for accumulated per-frame fractions (dwell time, orb value)
    pub const TIME_EPSILON: f64 = 1e-9;
}

/// Direction component from a pair of opposing keys (both held cancels out)
#[inline]
pub fn axis(negative: bool, positive: bool) -> f64 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

/// Heading angle (radians) from `from` towards `to`
#[inline]
pub fn heading(from: DVec2, to: DVec2) -> f64 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector for a heading angle
#[inline]
pub fn direction(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

/// Convert a duration in seconds to a whole number of frames
#[inline]
pub fn secs_to_frames(secs: f64, frame_rate: u32) -> u32 {
    (secs * frame_rate as f64).round().max(0.0) as u32
}
