//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - One fixed step per frame
//! - Seeded RNG only
//! - Stable iteration order (players keyed in a sorted map)
//! - No rendering or platform dependencies

pub mod progression;
pub mod reconcile;
pub mod state;
pub mod tick;

pub use progression::{
    AutoApplyNotice, Progression, UpgradeOption, UpgradeStat, apply_upgrade, default_catalog,
};
pub use reconcile::{apply_message, apply_text, handle_event};
pub use state::{Bullet, GameEvent, Player, PlayerStats, SimState, World, XpArea, XpOrb};
pub use tick::{TickInput, tick};
