//! Experience, leveling and the timed upgrade choice
//!
//! Leveling draws a fresh set of upgrade options and opens a choice window
//! counted in frames. If the window runs out without a pick, one of the
//! offered options is applied at random and a short notice is shown.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Player, PlayerStats};
use crate::consts::{MAX_LEVELS_PER_FRAME, UPGRADE_CHOICES};

/// Stat targeted by an upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeStat {
    #[serde(rename = "speed")]
    Speed,
    #[serde(rename = "bulletSpeed")]
    BulletSpeed,
    #[serde(rename = "maxHp")]
    MaxHp,
    #[serde(rename = "HPRegen")]
    HpRegen,
    #[serde(rename = "bulletMaxDistance")]
    BulletMaxDistance,
    /// Stat key this client doesn't know about (applies as a no-op)
    #[serde(other)]
    Unknown,
}

/// One entry of the upgrade catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeOption {
    pub name: String,
    pub stat: UpgradeStat,
    pub value: f64,
}

impl UpgradeOption {
    pub fn new(name: &str, stat: UpgradeStat, value: f64) -> Self {
        Self {
            name: name.to_string(),
            stat,
            value,
        }
    }

    /// Label shown in the choice window and notices
    pub fn label(&self) -> String {
        format!("{} +{}", self.name, self.value)
    }
}

/// The stock upgrade catalog
pub fn default_catalog() -> Vec<UpgradeOption> {
    vec![
        UpgradeOption::new("Move Speed", UpgradeStat::Speed, 0.2),
        UpgradeOption::new("Bullet Speed", UpgradeStat::BulletSpeed, 0.5),
        UpgradeOption::new("Max HP", UpgradeStat::MaxHp, 10.0),
        UpgradeOption::new("HP Regen", UpgradeStat::HpRegen, 0.1),
        UpgradeOption::new("Bullet Range", UpgradeStat::BulletMaxDistance, 20.0),
    ]
}

/// Apply an upgrade's single additive effect.
///
/// Max HP also refills the local player to the new maximum.
pub fn apply_upgrade(option: &UpgradeOption, stats: &mut PlayerStats, local: Option<&mut Player>) {
    if !option.value.is_finite() {
        log::debug!("Ignoring upgrade {} with non-finite value", option.name);
        return;
    }
    match option.stat {
        UpgradeStat::Speed => stats.speed += option.value,
        UpgradeStat::BulletSpeed => stats.bullet_speed += option.value,
        UpgradeStat::MaxHp => {
            stats.max_hp += option.value;
            if let Some(player) = local {
                player.max_hp = stats.max_hp;
                player.hp = stats.max_hp;
            }
        }
        UpgradeStat::HpRegen => stats.hp_regen += option.value,
        UpgradeStat::BulletMaxDistance => stats.bullet_max_distance += option.value,
        UpgradeStat::Unknown => {
            log::debug!("Upgrade {} targets an unknown stat, skipping", option.name);
        }
    }
}

/// Upgrade shown after the choice window expired
#[derive(Debug, Clone, PartialEq)]
pub struct AutoApplyNotice {
    pub text: String,
    pub frames_left: u32,
}

/// Experience and upgrade state of the local player
#[derive(Debug, Clone)]
pub struct Progression {
    pub xp: f64,
    pub xp_to_next: u32,
    pub level: u32,
    /// Options currently offered (empty when no choice is pending)
    pub offered: Vec<UpgradeOption>,
    /// Frames left in the choice window
    pub choice_frames: u32,
    pub notice: Option<AutoApplyNotice>,
}

impl Progression {
    pub fn new(xp_to_next: u32) -> Self {
        Self {
            xp: 0.0,
            xp_to_next: xp_to_next.max(1),
            level: 0,
            offered: Vec::new(),
            choice_frames: 0,
            notice: None,
        }
    }

    /// Add experience; non-finite or negative amounts are ignored
    pub fn credit(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.xp = (self.xp + amount).min(f64::MAX);
        }
    }

    /// Whether an upgrade choice is waiting for the player
    pub fn is_choice_open(&self) -> bool {
        !self.offered.is_empty() && self.choice_frames > 0
    }

    /// Level up as many times as the current xp allows.
    ///
    /// Each level draws a new offered set and restarts the window, so only the
    /// set from the last level gained survives. At most
    /// [`MAX_LEVELS_PER_FRAME`] levels are granted per call; xp beyond that is
    /// dropped so the next threshold is never already met. Returns the number
    /// of levels.
    pub fn level_up(
        &mut self,
        catalog: &[UpgradeOption],
        growth: f64,
        window_frames: u32,
        rng: &mut Pcg32,
    ) -> u32 {
        let mut gained = 0;
        while self.xp >= self.xp_to_next as f64 {
            if gained == MAX_LEVELS_PER_FRAME {
                log::warn!(
                    "Dropping {} xp after {} levels in one frame",
                    self.xp,
                    gained
                );
                self.xp = self.xp_to_next.saturating_sub(1) as f64;
                break;
            }
            self.level = self.level.saturating_add(1);
            self.xp -= self.xp_to_next as f64;
            self.xp_to_next = ((self.xp_to_next as f64 * growth).floor() as u32).max(1);

            let mut shuffled = catalog.to_vec();
            shuffled.shuffle(rng);
            shuffled.truncate(UPGRADE_CHOICES);
            self.offered = shuffled;
            self.choice_frames = if self.offered.is_empty() {
                0
            } else {
                window_frames.max(1)
            };
            gained += 1;

            log::info!(
                "Level {} reached, next at {} xp",
                self.level,
                self.xp_to_next
            );
        }
        gained
    }

    /// Take the offered option at `index`, closing the window
    pub fn choose(&mut self, index: usize) -> Option<UpgradeOption> {
        if !self.is_choice_open() || index >= self.offered.len() {
            return None;
        }
        let option = self.offered.swap_remove(index);
        self.offered.clear();
        self.choice_frames = 0;
        Some(option)
    }

    /// Count the choice window down by one frame.
    ///
    /// Returns the randomly picked option when the window just expired.
    pub fn tick_choice(&mut self, rng: &mut Pcg32, notice_frames: u32) -> Option<UpgradeOption> {
        if self.choice_frames == 0 || self.offered.is_empty() {
            return None;
        }
        self.choice_frames -= 1;
        if self.choice_frames > 0 {
            return None;
        }

        let pick = rng.random_range(0..self.offered.len());
        let option = self.offered.swap_remove(pick);
        self.offered.clear();
        self.notice = Some(AutoApplyNotice {
            text: format!("Auto-applied: {}", option.label()),
            frames_left: notice_frames,
        });
        Some(option)
    }

    /// Age the auto-apply notice by one frame
    pub fn tick_notice(&mut self) {
        if let Some(notice) = &mut self.notice {
            notice.frames_left = notice.frames_left.saturating_sub(1);
            if notice.frames_left == 0 {
                self.notice = None;
            }
        }
    }

    /// Progress towards the next level in [0, 1)
    pub fn xp_fraction(&self) -> f64 {
        (self.xp / self.xp_to_next as f64).clamp(0.0, 1.0)
    }

    /// Remaining choice time in seconds
    pub fn choice_seconds_left(&self, frame_rate: u32) -> f64 {
        self.choice_frames as f64 / frame_rate.max(1) as f64
    }
}
