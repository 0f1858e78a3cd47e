//! Entity store and the simulation state aggregate
//!
//! Everything the per-frame step and the reconciliation handler read or write
//! lives in [`SimState`]. Remote players are only ever written from network
//! messages; the local player is advanced by the step.

use std::collections::BTreeMap;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::progression::Progression;
use crate::settings::Settings;

/// A tank, local or remote
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: String,
    pub pos: DVec2,
    pub vel: DVec2,
    /// Facing angle (radians)
    pub angle: f64,
    pub hp: f64,
    pub max_hp: f64,
}

impl Player {
    /// New player at full health
    pub fn new(id: String, pos: DVec2, max_hp: f64) -> Self {
        Self {
            id,
            pos,
            vel: DVec2::ZERO,
            angle: 0.0,
            hp: max_hp,
            max_hp,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.angle.is_finite()
    }

    /// Health bar fill in [0, 1]
    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A projectile; expires once it has traveled past the range ceiling
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub pos: DVec2,
    /// Displacement per frame
    pub vel: DVec2,
    /// Distance traveled so far
    pub dist: f64,
}

impl Bullet {
    pub fn new(pos: DVec2, vel: DVec2) -> Self {
        Self {
            pos,
            vel,
            dist: 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite() && self.dist.is_finite()
    }
}

/// An xp pickup drained while the player stands near it
#[derive(Debug, Clone, PartialEq)]
pub struct XpOrb {
    pub id: String,
    pub pos: DVec2,
    /// Remaining xp
    pub value: f64,
}

impl XpOrb {
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.value.is_finite()
    }
}

/// A zone that must be occupied for `max_time` seconds before it pays out
#[derive(Debug, Clone, PartialEq)]
pub struct XpArea {
    pub id: String,
    /// Center
    pub pos: DVec2,
    pub width: f64,
    pub height: f64,
    pub xp_per_second: f64,
    pub active: bool,
    /// Seconds spent charging inside the trigger radius
    pub time_in_area: f64,
    /// Charge time needed to activate (seconds)
    pub max_time: f64,
    /// Trigger radius around the center
    pub action_radius: f64,
}

impl XpArea {
    /// Stock area as generated for a fresh session
    pub fn new(id: String, pos: DVec2) -> Self {
        Self {
            id,
            pos,
            width: 60.0,
            height: 60.0,
            xp_per_second: 5.0,
            active: false,
            time_in_area: 0.0,
            max_time: 5.0,
            action_radius: 90.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite()
            && self.xp_per_second.is_finite()
            && self.time_in_area.is_finite()
            && self.max_time.is_finite()
            && self.action_radius.is_finite()
    }

    /// Charge progress in [0, 1] (1 when active)
    pub fn charge_fraction(&self) -> f64 {
        if self.active {
            1.0
        } else if self.max_time > 0.0 {
            (self.time_in_area / self.max_time).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Mirror of the shared world
#[derive(Debug, Clone, Default)]
pub struct World {
    pub width: f64,
    pub height: f64,
    /// Identifier assigned to this client, once known
    pub local_id: Option<String>,
    /// Session joined, if the server told us
    pub session: Option<String>,
    /// All players keyed by id (sorted for stable iteration)
    pub players: BTreeMap<String, Player>,
    pub bullets: Vec<Bullet>,
    pub orbs: Vec<XpOrb>,
    pub areas: Vec<XpArea>,
}

impl World {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local_id.as_ref().and_then(|id| self.players.get(id))
    }

    pub fn local_player_mut(&mut self) -> Option<&mut Player> {
        let id = self.local_id.as_ref()?;
        self.players.get_mut(id)
    }

    pub fn is_local(&self, id: &str) -> bool {
        self.local_id.as_deref() == Some(id)
    }

    /// Drop `count` orbs worth 20-80 xp at random positions
    pub fn scatter_orbs(&mut self, rng: &mut Pcg32, count: usize) {
        for _ in 0..count {
            let pos = DVec2::new(
                rng.random::<f64>() * self.width,
                rng.random::<f64>() * self.height,
            );
            self.orbs.push(XpOrb {
                id: random_id(rng, 6),
                pos,
                value: rng.random_range(20..=80) as f64,
            });
        }
    }

    /// Place `count` stock xp areas at random positions
    pub fn scatter_areas(&mut self, rng: &mut Pcg32, count: usize) {
        for _ in 0..count {
            let pos = DVec2::new(
                rng.random::<f64>() * self.width,
                rng.random::<f64>() * self.height,
            );
            self.areas.push(XpArea::new(random_id(rng, 6), pos));
        }
    }
}

/// Random alphanumeric identifier
pub fn random_id(rng: &mut Pcg32, len: usize) -> String {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    (0..len)
        .map(|_| LETTERS[rng.random_range(0..LETTERS.len())] as char)
        .collect()
}

/// Upgradable stats of the local player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    /// Units per frame
    pub speed: f64,
    /// Units per frame
    pub bullet_speed: f64,
    pub bullet_max_distance: f64,
    pub max_hp: f64,
    /// Health per second
    pub hp_regen: f64,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl PlayerStats {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            speed: settings.player_speed,
            bullet_speed: settings.bullet_speed,
            bullet_max_distance: settings.bullet_max_distance,
            max_hp: settings.max_hp,
            hp_regen: settings.hp_regen,
        }
    }
}

/// Things that happened during a frame, for HUD and audio collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    LeveledUp { level: u32 },
    UpgradeOffered { count: usize },
    UpgradeApplied { name: String, auto: bool },
    OrbDepleted { id: String },
    AreaActivated { id: String },
    BulletFired,
}

/// Complete client-side simulation state
#[derive(Debug, Clone)]
pub struct SimState {
    pub settings: Settings,
    pub world: World,
    pub stats: PlayerStats,
    pub progression: Progression,
    /// Frames simulated so far
    pub frame: u64,
    /// Events since the last drain
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
}

impl SimState {
    pub fn new(mut settings: Settings) -> Self {
        if let Err(e) = settings.validate() {
            log::warn!("Running with questionable settings: {}", e);
        }
        settings.frame_rate = settings.frame_rate.max(1);
        Self {
            world: World::new(settings.world_width, settings.world_height),
            stats: PlayerStats::from_settings(&settings),
            progression: Progression::new(settings.initial_xp_to_next),
            frame: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(settings.seed),
            settings,
        }
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Seconds represented by one frame
    pub fn frame_dt(&self) -> f64 {
        self.settings.frame_dt()
    }

    /// Take the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Become the local player `id`, spawning at full health
    pub fn assign_identity(&mut self, id: String) {
        if let Some(old) = self.world.local_id.take() {
            if old != id {
                self.world.players.remove(&old);
            }
        }
        let player = Player::new(id.clone(), self.settings.spawn, self.stats.max_hp);
        self.world.players.insert(id.clone(), player);
        self.world.local_id = Some(id);
    }
}
