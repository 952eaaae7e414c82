//! Player inputs

use crate::time::{Frame, PlayerId};
use serde::{Deserialize, Serialize};

/// Raw control intents sampled once per local step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub boost: bool,
}

impl Controls {
    /// Vertical paddle direction: -1 up, 1 down, 0 idle
    pub fn direction(&self) -> i8 {
        match (self.up, self.down) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }
}

/// One player's controls for one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Frame this input applies to
    pub frame: Frame,
    pub player_id: PlayerId,
    pub controls: Controls,
    /// Per-player send counter
    pub sequence: u32,
}

impl PlayerInput {
    /// Create a new input
    pub fn new(frame: Frame, player_id: PlayerId, controls: Controls, sequence: u32) -> Self {
        Self {
            frame,
            player_id,
            controls,
            sequence,
        }
    }
}
