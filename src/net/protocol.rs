//! JSON wire protocol
//!
//! Every message is a JSON object with a `type` tag. Inbound kinds this client
//! doesn't understand decode to [`ServerMessage::Unknown`] so newer servers
//! don't break older clients.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::state::{Bullet, Player, XpArea, XpOrb};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Messages the server pushes to this client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Identity assigned to this connection
    #[serde(rename = "id")]
    Identity {
        id: String,
        #[serde(default)]
        session: Option<String>,
    },
    /// Full state of the session
    #[serde(rename = "sessionState")]
    SessionState { session: SessionDto },
    /// Another player moved (our own moves are echoed back too)
    #[serde(rename = "move")]
    PeerMove {
        id: String,
        x: f64,
        y: f64,
        #[serde(default)]
        angle: f64,
    },
    /// A projectile was fired; raw `shoot` rebroadcasts carry the shooter id
    #[serde(rename = "bullet", alias = "shoot")]
    ProjectileSpawn {
        #[serde(default)]
        id: Option<String>,
        bullet: BulletDto,
    },
    #[serde(other)]
    Unknown,
}

/// Messages this client sends
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Move { id: String, x: f64, y: f64, angle: f64 },
    Shoot { id: String, bullet: BulletDto },
    OrbCollected { id: String },
}

/// Wire form of a session snapshot
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub world_width: f64,
    pub world_height: f64,
    #[serde(default)]
    pub players: Option<BTreeMap<String, PlayerDto>>,
    #[serde(default)]
    pub xp_items: Option<BTreeMap<String, OrbDto>>,
    #[serde(default)]
    pub xp_areas: Option<BTreeMap<String, AreaDto>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub hp: Option<f64>,
    #[serde(default)]
    pub max_hp: Option<f64>,
}

impl PlayerDto {
    /// Remote player record, with health clamped into [0, max]
    pub fn into_player(self, id: String, default_max_hp: f64) -> Player {
        let max_hp = self
            .max_hp
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or(default_max_hp);
        let hp = self.hp.filter(|h| h.is_finite()).unwrap_or(max_hp);
        Player {
            id,
            pos: DVec2::new(self.x, self.y),
            vel: DVec2::ZERO,
            angle: self.angle,
            hp: hp.clamp(0.0, max_hp),
            max_hp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrbDto {
    #[serde(default)]
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl From<OrbDto> for XpOrb {
    fn from(dto: OrbDto) -> Self {
        Self {
            id: dto.id,
            pos: DVec2::new(dto.x, dto.y),
            value: dto.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaDto {
    #[serde(default)]
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    pub xp_per_second: f64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub time_in_area: f64,
    pub max_time: f64,
    pub action_radius: f64,
}

impl From<AreaDto> for XpArea {
    fn from(dto: AreaDto) -> Self {
        Self {
            id: dto.id,
            pos: DVec2::new(dto.x, dto.y),
            width: dto.width,
            height: dto.height,
            xp_per_second: dto.xp_per_second,
            active: dto.active,
            time_in_area: dto.time_in_area,
            max_time: dto.max_time,
            action_radius: dto.action_radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletDto {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    #[serde(default, skip_serializing)]
    pub dist: f64,
}

impl From<BulletDto> for Bullet {
    fn from(dto: BulletDto) -> Self {
        Self {
            pos: DVec2::new(dto.x, dto.y),
            vel: DVec2::new(dto.vx, dto.vy),
            dist: dto.dist,
        }
    }
}

impl From<&Bullet> for BulletDto {
    fn from(bullet: &Bullet) -> Self {
        Self {
            x: bullet.pos.x,
            y: bullet.pos.y,
            vx: bullet.vel.x,
            vy: bullet.vel.y,
            dist: bullet.dist,
        }
    }
}

/// Parse one inbound text frame
pub fn decode(text: &str) -> Result<ServerMessage, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

/// Serialize one outbound message
pub fn encode(message: &ClientMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}
