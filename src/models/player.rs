//! Player model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Roster identifier of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PlayerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A known player from the roster sheet.
///
/// Built once when the registry is loaded and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique roster id
    pub player_id: PlayerId,

    /// Short handle (e.g. initials)
    pub tag: String,

    /// First name, used as the lookup key on scoresheets
    pub first_name: String,

    pub last_name: String,

    /// Skill rating at the time the roster was read
    pub rating: f64,
}

impl Player {
    /// Create a new player.
    pub fn new(
        player_id: impl Into<PlayerId>,
        tag: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        rating: f64,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            tag: tag.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            rating,
        }
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Player #{} ({}): {} {}, rating {}",
            self.player_id, self.tag, self.first_name, self.last_name, self.rating
        )
    }
}
