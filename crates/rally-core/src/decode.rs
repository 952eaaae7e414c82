//! Defensive decoding of server snapshot messages
//!
//! Each field is read independently. A missing or mistyped field takes its
//! default and logs a warning; the rest of the message is still used.
//! Numbers arrive as JSON doubles and are narrowed to `f32` here so every
//! peer hashes the same bits.

use crate::snapshot::{Ball, PlayerState, Powerup, PowerupKind, Snapshot};
use crate::time::PlayerId;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};

type Object = Map<String, Value>;

/// Decode a snapshot from JSON text
///
/// Only fails when the text is not a JSON object. Everything else is
/// defaulted field by field.
pub fn decode_snapshot(text: &str) -> Result<Snapshot> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(Error::Decode("snapshot message is not an object".into()));
    }
    Ok(Snapshot::from_json_value(&value))
}

impl Snapshot {
    /// Build a snapshot from a decoded JSON value, defaulting bad fields
    pub fn from_json_value(value: &Value) -> Snapshot {
        let empty = Object::new();
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => {
                tracing::warn!("snapshot is not an object, using empty snapshot");
                &empty
            }
        };

        let frame = read_u64(obj, "frame", 0, "snapshot");
        let rng_state = match read_u32(obj, "rngState", 1, "snapshot") {
            0 => {
                tracing::warn!(frame, "snapshot rngState is zero, using 1");
                1
            }
            s => s,
        };

        Snapshot {
            frame,
            sim_time: read_f32(obj, "simTime", 0.0, "snapshot"),
            rng_state,
            checksum: read_u32(obj, "checksum", 0, "snapshot"),
            players: read_players(obj),
            balls: read_list(obj, "balls", read_ball),
            powerups: read_list(obj, "powerups", read_powerup),
            timers: read_timers(obj),
        }
    }
}

fn read_players(obj: &Object) -> IndexMap<PlayerId, PlayerState> {
    let mut players = IndexMap::new();
    let Some(entries) = field_object(obj, "players", "snapshot") else {
        return players;
    };
    for (key, value) in entries {
        let Ok(id) = key.parse::<PlayerId>() else {
            tracing::warn!(key = %key, "skipping player with non-numeric id");
            continue;
        };
        let Some(p) = value.as_object() else {
            tracing::warn!(player = id, "skipping player that is not an object");
            continue;
        };
        let defaults = PlayerState::default();
        players.insert(
            id,
            PlayerState {
                x: read_f32(p, "x", defaults.x, "player"),
                y: read_f32(p, "y", defaults.y, "player"),
                height: read_f32(p, "height", defaults.height, "player"),
                score: read_u32(p, "score", defaults.score, "player"),
            },
        );
    }
    players
}

fn read_ball(b: &Object) -> Ball {
    let defaults = Ball::default();
    Ball {
        id: read_u32(b, "id", defaults.id, "ball"),
        x: read_f32(b, "x", defaults.x, "ball"),
        y: read_f32(b, "y", defaults.y, "ball"),
        vx: read_f32(b, "vx", defaults.vx, "ball"),
        vy: read_f32(b, "vy", defaults.vy, "ball"),
        radius: read_f32(b, "radius", defaults.radius, "ball"),
    }
}

fn read_powerup(p: &Object) -> Powerup {
    let kind = match p.get("kind").and_then(Value::as_str) {
        Some(name) => PowerupKind::from_name(name).unwrap_or_else(|| {
            tracing::warn!(kind = name, "unknown powerup kind, using default");
            PowerupKind::default()
        }),
        None => {
            tracing::warn!("powerup kind missing or malformed, using default");
            PowerupKind::default()
        }
    };
    Powerup {
        id: read_u32(p, "id", 0, "powerup"),
        kind,
        x: read_f32(p, "x", 0.0, "powerup"),
        y: read_f32(p, "y", 0.0, "powerup"),
        ttl: read_f32(p, "ttl", 0.0, "powerup"),
    }
}

fn read_timers(obj: &Object) -> IndexMap<String, f32> {
    let mut timers = IndexMap::new();
    let Some(entries) = field_object(obj, "timers", "snapshot") else {
        return timers;
    };
    for (name, value) in entries {
        match finite(value) {
            Some(v) => {
                timers.insert(name.clone(), v as f32);
            }
            None => tracing::warn!(timer = %name, "timer is not a number, dropping it"),
        }
    }
    timers
}

fn read_list<T>(obj: &Object, key: &str, read: fn(&Object) -> T) -> Vec<T> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item.as_object() {
                Some(o) => Some(read(o)),
                None => {
                    tracing::warn!(field = key, "skipping list entry that is not an object");
                    None
                }
            })
            .collect(),
        Some(_) => {
            tracing::warn!(field = key, "field is not a list, using empty list");
            Vec::new()
        }
        None => {
            tracing::warn!(field = key, "field missing, using empty list");
            Vec::new()
        }
    }
}

fn field_object<'a>(obj: &'a Object, key: &str, owner: &str) -> Option<&'a Object> {
    match obj.get(key) {
        Some(Value::Object(o)) => Some(o),
        Some(_) => {
            tracing::warn!(owner, field = key, "field is not an object, using empty map");
            None
        }
        None => {
            tracing::warn!(owner, field = key, "field missing, using empty map");
            None
        }
    }
}

fn finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

fn read_f32(obj: &Object, key: &str, default: f32, owner: &str) -> f32 {
    match obj.get(key).map(finite) {
        Some(Some(v)) => v as f32,
        Some(None) => {
            tracing::warn!(owner, field = key, default, "malformed number, using default");
            default
        }
        None => {
            tracing::warn!(owner, field = key, default, "field missing, using default");
            default
        }
    }
}

fn read_u64(obj: &Object, key: &str, default: u64, owner: &str) -> u64 {
    match obj.get(key).map(Value::as_u64) {
        Some(Some(v)) => v,
        Some(None) => {
            tracing::warn!(owner, field = key, default, "malformed integer, using default");
            default
        }
        None => {
            tracing::warn!(owner, field = key, default, "field missing, using default");
            default
        }
    }
}

fn read_u32(obj: &Object, key: &str, default: u32, owner: &str) -> u32 {
    match obj.get(key).map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok())) {
        Some(Some(v)) => v,
        Some(None) => {
            tracing::warn!(owner, field = key, default, "malformed integer, using default");
            default
        }
        None => {
            tracing::warn!(owner, field = key, default, "field missing, using default");
            default
        }
    }
}
