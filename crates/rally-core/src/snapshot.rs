//! Simulation snapshots
//!
//! A `Snapshot` is the full state of the arena at one frame. The server sends
//! confirmed snapshots; the client produces predicted ones each local step.
//! Snapshots are plain values: cloning deep-copies every entity collection,
//! so a snapshot read out of history can never be changed by a later
//! mutation of another copy.

use crate::time::{Frame, PlayerId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A paddle owned by one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub height: f32,
    pub score: u32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            height: 80.0,
            score: 0,
        }
    }
}

/// A ball in play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            id: 0,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            radius: 8.0,
        }
    }
}

/// Power-up effect type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerupKind {
    #[default]
    Grow,
    Shrink,
    Speed,
    MultiBall,
}

impl PowerupKind {
    /// Parse the wire name of a kind
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "grow" => Some(Self::Grow),
            "shrink" => Some(Self::Shrink),
            "speed" => Some(Self::Speed),
            "multi_ball" => Some(Self::MultiBall),
            _ => None,
        }
    }

    fn discriminant(self) -> u32 {
        match self {
            Self::Grow => 0,
            Self::Shrink => 1,
            Self::Speed => 2,
            Self::MultiBall => 3,
        }
    }
}

/// A collectible power-up on the field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Powerup {
    pub id: u32,
    pub kind: PowerupKind,
    pub x: f32,
    pub y: f32,
    /// Seconds until the power-up despawns
    pub ttl: f32,
}

/// Identifies one positioned entity across snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityId {
    Player(PlayerId),
    Ball(u32),
    Powerup(u32),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Player(id) => write!(f, "player:{}", id),
            EntityId::Ball(id) => write!(f, "ball:{}", id),
            EntityId::Powerup(id) => write!(f, "powerup:{}", id),
        }
    }
}

/// Full simulation state at one frame
///
/// Serializes with the same camelCase field names `decode_snapshot` reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub frame: Frame,
    /// Simulation time in seconds
    pub sim_time: f32,
    /// Exported `GameRng` state at this frame
    pub rng_state: u32,
    pub checksum: u32,
    pub players: IndexMap<PlayerId, PlayerState>,
    pub balls: Vec<Ball>,
    pub powerups: Vec<Powerup>,
    /// Named countdowns in seconds (serve delay, power-up spawn, ...)
    pub timers: IndexMap<String, f32>,
}

impl Snapshot {
    /// Create an empty snapshot at the given frame
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            sim_time: 0.0,
            rng_state: 1,
            checksum: 0,
            players: IndexMap::new(),
            balls: Vec::new(),
            powerups: Vec::new(),
            timers: IndexMap::new(),
        }
    }

    /// Every positioned entity with its current position
    pub fn entity_positions(&self) -> impl Iterator<Item = (EntityId, f32, f32)> + '_ {
        let players = self
            .players
            .iter()
            .map(|(id, p)| (EntityId::Player(*id), p.x, p.y));
        let balls = self.balls.iter().map(|b| (EntityId::Ball(b.id), b.x, b.y));
        let powerups = self
            .powerups
            .iter()
            .map(|p| (EntityId::Powerup(p.id), p.x, p.y));
        players.chain(balls).chain(powerups)
    }

    /// Position of a single entity, if present
    pub fn position(&self, id: EntityId) -> Option<(f32, f32)> {
        match id {
            EntityId::Player(pid) => self.players.get(&pid).map(|p| (p.x, p.y)),
            EntityId::Ball(bid) => self
                .balls
                .iter()
                .find(|b| b.id == bid)
                .map(|b| (b.x, b.y)),
            EntityId::Powerup(uid) => self
                .powerups
                .iter()
                .find(|p| p.id == uid)
                .map(|p| (p.x, p.y)),
        }
    }

    /// Move an entity. Returns `false` if it is not in this snapshot.
    pub fn set_position(&mut self, id: EntityId, x: f32, y: f32) -> bool {
        let slot = match id {
            EntityId::Player(pid) => self.players.get_mut(&pid).map(|p| (&mut p.x, &mut p.y)),
            EntityId::Ball(bid) => self
                .balls
                .iter_mut()
                .find(|b| b.id == bid)
                .map(|b| (&mut b.x, &mut b.y)),
            EntityId::Powerup(uid) => self
                .powerups
                .iter_mut()
                .find(|p| p.id == uid)
                .map(|p| (&mut p.x, &mut p.y)),
        };
        match slot {
            Some((sx, sy)) => {
                *sx = x;
                *sy = y;
                true
            }
            None => false,
        }
    }

    /// Compute a deterministic checksum of the simulation state
    ///
    /// Covers the frame, RNG state and every entity and timer field. The
    /// stored `checksum` field itself is excluded. Players and timers are
    /// hashed in sorted key order so map insertion order does not matter.
    pub fn compute_checksum(&self) -> u32 {
        let mut h = Fnv32::new();
        h.write_u64(self.frame);
        h.write_f32(self.sim_time);
        h.write_u32(self.rng_state);

        let mut players: Vec<_> = self.players.iter().collect();
        players.sort_by_key(|(id, _)| **id);
        h.write_u32(players.len() as u32);
        for (id, p) in players {
            h.write_u32(*id);
            h.write_f32(p.x);
            h.write_f32(p.y);
            h.write_f32(p.height);
            h.write_u32(p.score);
        }

        h.write_u32(self.balls.len() as u32);
        for b in &self.balls {
            h.write_u32(b.id);
            h.write_f32(b.x);
            h.write_f32(b.y);
            h.write_f32(b.vx);
            h.write_f32(b.vy);
            h.write_f32(b.radius);
        }

        h.write_u32(self.powerups.len() as u32);
        for p in &self.powerups {
            h.write_u32(p.id);
            h.write_u32(p.kind.discriminant());
            h.write_f32(p.x);
            h.write_f32(p.y);
            h.write_f32(p.ttl);
        }

        let mut timers: Vec<_> = self.timers.iter().collect();
        timers.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in timers {
            h.write_bytes(name.as_bytes());
            h.write_f32(*value);
        }

        h.finish()
    }

    /// Stamp the snapshot with its computed checksum
    pub fn with_checksum(mut self) -> Self {
        self.checksum = self.compute_checksum();
        self
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(0)
    }
}

/// 32-bit FNV-1a
struct Fnv32(u32);

impl Fnv32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    fn new() -> Self {
        Self(Self::OFFSET)
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u32::from(*byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    fn finish(&self) -> u32 {
        self.0
    }
}
