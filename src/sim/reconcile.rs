//! Merging server messages into the local entity store
//!
//! Runs between frames. Snapshots win for orbs and areas: an orb drained
//! locally can come back until the server has seen our `orbCollected`.

use glam::DVec2;

use super::state::{Bullet, SimState, XpArea, XpOrb};
use crate::net::gateway::{ChannelEvent, ConnectionState};
use crate::net::protocol::{ServerMessage, SessionDto, decode};

/// Apply one decoded server message
pub fn apply_message(state: &mut SimState, message: ServerMessage) {
    match message {
        ServerMessage::Identity { id, session } => {
            log::info!("Assigned player id {}", id);
            state.world.session = session;
            state.assign_identity(id);
        }
        ServerMessage::SessionState { session } => apply_snapshot(state, session),
        ServerMessage::PeerMove { id, x, y, angle } => {
            if state.world.is_local(&id) {
                return;
            }
            let pos = DVec2::new(x, y);
            if !pos.is_finite() || !angle.is_finite() {
                log::debug!("Skipping non-finite move for {}", id);
                return;
            }
            // Unknown senders wait for the next snapshot
            if let Some(player) = state.world.players.get_mut(&id) {
                player.pos = pos;
                player.angle = angle;
            }
        }
        ServerMessage::ProjectileSpawn { id, bullet } => {
            // The server echoes our own shots back; we already predicted them
            if id.as_deref().is_some_and(|id| state.world.is_local(id)) {
                return;
            }
            state.world.bullets.push(Bullet::from(bullet));
        }
        ServerMessage::Unknown => {
            log::debug!("Ignoring unknown message kind");
        }
    }
}

/// Decode and apply one text frame; undecodable frames are logged and dropped
pub fn apply_text(state: &mut SimState, text: &str) -> bool {
    match decode(text) {
        Ok(message) => {
            apply_message(state, message);
            true
        }
        Err(e) => {
            log::warn!("Dropping inbound frame: {}", e);
            false
        }
    }
}

/// React to a transport event, returning the new connection state
pub fn handle_event(
    state: &mut SimState,
    event: ChannelEvent,
    current: ConnectionState,
) -> ConnectionState {
    match event {
        ChannelEvent::Connected => {
            log::info!("Connected to server");
            ConnectionState::Connected
        }
        ChannelEvent::Message(text) => {
            apply_text(state, &text);
            current
        }
        ChannelEvent::Closed => {
            log::info!("Disconnected from server");
            ConnectionState::Disconnected
        }
        ChannelEvent::Error(e) => {
            log::error!("Connection error: {}", e);
            current
        }
    }
}

fn apply_snapshot(state: &mut SimState, session: SessionDto) {
    let world = &mut state.world;

    if session.world_width.is_finite()
        && session.world_height.is_finite()
        && session.world_width > 0.0
        && session.world_height > 0.0
    {
        world.width = session.world_width;
        world.height = session.world_height;
    } else {
        log::warn!(
            "Ignoring invalid world size {}x{}",
            session.world_width,
            session.world_height
        );
    }

    // Remote players: the snapshot is the full set, so absent ones are pruned
    let players = session.players.unwrap_or_default();
    let local_id = world.local_id.clone();
    world
        .players
        .retain(|id, _| Some(id) == local_id.as_ref() || players.contains_key(id));
    for (id, dto) in players {
        if world.is_local(&id) {
            continue;
        }
        let player = dto.into_player(id.clone(), state.settings.max_hp);
        world.players.insert(id, player);
    }

    world.orbs = session
        .xp_items
        .unwrap_or_default()
        .into_values()
        .map(XpOrb::from)
        .collect();
    world.areas = session
        .xp_areas
        .unwrap_or_default()
        .into_values()
        .map(XpArea::from)
        .collect();

    log::debug!(
        "Snapshot: {} players, {} orbs, {} areas",
        world.players.len(),
        world.orbs.len(),
        world.areas.len()
    );
}
