//! Fixed timestep simulation tick
//!
//! One call advances the local view by exactly one frame. Movement speeds are
//! per frame; xp, drain and regen rates are per second and divided by the
//! configured frame rate.

use glam::DVec2;

use super::progression::apply_upgrade;
use super::state::{Bullet, GameEvent, SimState};
use crate::consts::{MIN_BULLET_SPEED, TIME_EPSILON};
use crate::net::protocol::{BulletDto, ClientMessage};
use crate::{axis, direction, heading};

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// World-space point to face (mouse position)
    pub aim_at: Option<DVec2>,
    /// Fire a bullet along the facing angle
    pub fire: bool,
    /// Pick one of the offered upgrades
    pub choose_upgrade: Option<usize>,
}

impl TickInput {
    /// Clear one-shot actions after they've been consumed
    pub fn clear_actions(&mut self) {
        self.fire = false;
        self.choose_upgrade = None;
    }
}

/// Advance the simulation by one frame, queueing outbound messages in `outbox`
pub fn tick(state: &mut SimState, input: &TickInput, outbox: &mut Vec<ClientMessage>) {
    state.frame += 1;

    if let Some(index) = input.choose_upgrade {
        choose_upgrade(state, index);
    }

    let Some(local_id) = state.world.local_id.clone() else {
        log::trace!("Player not ready yet");
        return;
    };
    if !state.world.players.contains_key(&local_id) {
        log::trace!("Player not ready yet");
        return;
    }

    move_local_player(state, input);

    if let Some(me) = state.world.local_player() {
        outbox.push(ClientMessage::Move {
            id: local_id.clone(),
            x: me.pos.x,
            y: me.pos.y,
            angle: me.angle,
        });
    }

    if input.fire {
        fire(state, &local_id, outbox);
    }

    advance_bullets(state);

    let Some(me) = state.world.local_player().map(|p| p.pos) else {
        return;
    };
    if me.is_finite() {
        collect_orbs(state, me, outbox);
        update_areas(state, me);
    } else {
        log::debug!("Local position is not finite, skipping pickups");
    }

    regenerate(state);
    advance_progression(state);
}

/// Apply the player's explicit upgrade pick
fn choose_upgrade(state: &mut SimState, index: usize) {
    let Some(option) = state.progression.choose(index) else {
        return;
    };
    apply_upgrade(&option, &mut state.stats, state.world.local_player_mut());
    log::info!("Upgrade chosen: {}", option.label());
    state.events.push(GameEvent::UpgradeApplied {
        name: option.name,
        auto: false,
    });
}

fn move_local_player(state: &mut SimState, input: &TickInput) {
    let speed = state.stats.speed;
    let world = &mut state.world;
    let (width, height) = (world.width, world.height);
    let Some(player) = world.local_player_mut() else {
        return;
    };

    if let Some(target) = input.aim_at {
        let angle = heading(player.pos, target);
        if angle.is_finite() {
            player.angle = angle;
        }
    }

    player.vel = DVec2::new(
        axis(input.left, input.right) * speed,
        axis(input.up, input.down) * speed,
    );
    let next = player.pos + player.vel;
    if next.is_finite() {
        player.pos = DVec2::new(
            next.x.clamp(0.0, width.max(0.0)),
            next.y.clamp(0.0, height.max(0.0)),
        );
    }
}

fn fire(state: &mut SimState, local_id: &str, outbox: &mut Vec<ClientMessage>) {
    let Some(me) = state.world.local_player() else {
        return;
    };
    let dir = direction(me.angle);
    let bullet = Bullet::new(
        me.pos + dir * state.settings.muzzle_offset,
        dir * state.stats.bullet_speed,
    );
    if !bullet.is_finite() {
        return;
    }
    outbox.push(ClientMessage::Shoot {
        id: local_id.to_string(),
        bullet: BulletDto::from(&bullet),
    });
    state.world.bullets.push(bullet);
    state.events.push(GameEvent::BulletFired);
}

/// Move bullets and drop the ones past the range ceiling
fn advance_bullets(state: &mut SimState) {
    let max_distance = state.stats.bullet_max_distance;
    let bullets = &mut state.world.bullets;

    let mut i = 0;
    while i < bullets.len() {
        let bullet = &mut bullets[i];
        if !bullet.is_finite() {
            log::debug!("Discarding non-finite bullet");
            bullets.swap_remove(i);
            continue;
        }
        if bullet.vel.length() < MIN_BULLET_SPEED {
            log::debug!("Discarding stalled bullet at {}", bullet.pos);
            bullets.swap_remove(i);
            continue;
        }
        bullet.dist += bullet.vel.length();
        bullet.pos += bullet.vel;
        if bullet.dist > max_distance {
            bullets.swap_remove(i);
        } else {
            i += 1;
        }
    }
}

/// Drain orbs the player is standing next to
fn collect_orbs(state: &mut SimState, me: DVec2, outbox: &mut Vec<ClientMessage>) {
    let radius = state.settings.xp_collect_radius;
    let per_frame = state.settings.xp_per_second * state.frame_dt();
    let SimState {
        world,
        progression,
        events,
        ..
    } = state;

    world.orbs.retain_mut(|orb| {
        if !orb.is_finite() {
            return true;
        }
        if orb.pos.distance(me) >= radius || orb.value <= 0.0 {
            return true;
        }

        let drained = per_frame.min(orb.value);
        orb.value -= drained;
        progression.credit(drained);

        if orb.value > TIME_EPSILON {
            return true;
        }
        outbox.push(ClientMessage::OrbCollected { id: orb.id.clone() });
        events.push(GameEvent::OrbDepleted { id: orb.id.clone() });
        false
    });
}

/// Charge, activate and pay out xp areas
fn update_areas(state: &mut SimState, me: DVec2) {
    let dt = state.frame_dt();
    let SimState {
        world,
        progression,
        events,
        ..
    } = state;

    for area in world.areas.iter_mut() {
        if !area.is_finite() {
            continue;
        }
        if area.pos.distance(me) < area.action_radius {
            if !area.active {
                area.time_in_area += dt;
                if area.time_in_area + TIME_EPSILON >= area.max_time {
                    area.active = true;
                    area.time_in_area = 0.0;
                    events.push(GameEvent::AreaActivated {
                        id: area.id.clone(),
                    });
                }
            }
            if area.active {
                progression.credit(area.xp_per_second * dt);
            }
        } else {
            // Leaving resets the charge completely
            area.active = false;
            area.time_in_area = 0.0;
        }
    }
}

fn regenerate(state: &mut SimState) {
    let amount = state.stats.hp_regen * state.frame_dt();
    let Some(me) = state.world.local_player_mut() else {
        return;
    };
    if me.hp < me.max_hp && amount.is_finite() {
        me.hp = (me.hp + amount).min(me.max_hp);
    }
    me.hp = me.hp.min(me.max_hp).max(0.0);
}

/// Count down the choice window, then level up on fresh xp
fn advance_progression(state: &mut SimState) {
    state.progression.tick_notice();

    let notice_frames = state.settings.notice_frames();
    let SimState {
        world,
        stats,
        progression,
        events,
        rng,
        ..
    } = state;

    if let Some(option) = progression.tick_choice(rng, notice_frames) {
        apply_upgrade(&option, stats, world.local_player_mut());
        log::info!("Upgrade window expired, auto-applied {}", option.label());
        events.push(GameEvent::UpgradeApplied {
            name: option.name,
            auto: true,
        });
    }

    let window = state.settings.upgrade_window_frames();
    let growth = state.settings.xp_growth;
    let SimState {
        settings,
        progression,
        events,
        rng,
        ..
    } = state;
    let gained = progression.level_up(&settings.upgrades, growth, window, rng);
    if gained > 0 {
        events.push(GameEvent::LeveledUp {
            level: progression.level,
        });
        events.push(GameEvent::UpgradeOffered {
            count: progression.offered.len(),
        });
    }
}
