//! Game model: one completed hand-scored game of Hearts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Player, PlayerId};

/// Per-player integer tallies carried by a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointField {
    Right,
    Left,
    Across,
    Hold,
    /// Final total; lower is better
    Points,
}

/// Per-player rating snapshots carried by a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingField {
    Old,
    New,
}

/// A game rebuilt from one scoresheet sub-table.
///
/// Every key of every map belongs to a player in `players`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub game_id: i64,

    /// Participants in scoresheet column order
    pub players: Vec<Player>,

    pub right: BTreeMap<PlayerId, i64>,
    pub left: BTreeMap<PlayerId, i64>,
    pub across: BTreeMap<PlayerId, i64>,
    pub hold: BTreeMap<PlayerId, i64>,

    /// Authoritative score used for ranking
    pub points: BTreeMap<PlayerId, i64>,

    pub old_rating: BTreeMap<PlayerId, f64>,
    pub new_rating: BTreeMap<PlayerId, f64>,
}

/// The best score of a game and everyone who reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct Winners<'a> {
    pub players: Vec<&'a Player>,
    pub points: i64,
}

impl Winners<'_> {
    pub fn is_tie(&self) -> bool {
        self.players.len() > 1
    }
}

impl fmt::Display for Winners<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .players
            .iter()
            .map(|p| p.first_name.as_str())
            .collect();
        if self.is_tie() {
            write!(f, "Tie: ")?;
        }
        write!(f, "{}", names.join("/"))
    }
}

impl Game {
    /// Create an empty game for the given participants.
    pub fn new(game_id: i64, players: Vec<Player>) -> Self {
        Self {
            game_id,
            players,
            right: BTreeMap::new(),
            left: BTreeMap::new(),
            across: BTreeMap::new(),
            hold: BTreeMap::new(),
            points: BTreeMap::new(),
            old_rating: BTreeMap::new(),
            new_rating: BTreeMap::new(),
        }
    }

    /// Whether the player took part in this game.
    pub fn has_player(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.player_id == id)
    }

    /// Look up a participant by id.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == id)
    }

    pub fn field(&self, field: PointField) -> &BTreeMap<PlayerId, i64> {
        match field {
            PointField::Right => &self.right,
            PointField::Left => &self.left,
            PointField::Across => &self.across,
            PointField::Hold => &self.hold,
            PointField::Points => &self.points,
        }
    }

    /// Record a tally. Returns false (and records nothing) for non-participants.
    pub fn insert_points(&mut self, field: PointField, id: PlayerId, value: i64) -> bool {
        if !self.has_player(id) {
            return false;
        }
        let map = match field {
            PointField::Right => &mut self.right,
            PointField::Left => &mut self.left,
            PointField::Across => &mut self.across,
            PointField::Hold => &mut self.hold,
            PointField::Points => &mut self.points,
        };
        map.insert(id, value);
        true
    }

    /// Record a rating snapshot. Returns false (and records nothing) for non-participants.
    pub fn insert_rating(&mut self, field: RatingField, id: PlayerId, value: f64) -> bool {
        if !self.has_player(id) {
            return false;
        }
        let map = match field {
            RatingField::Old => &mut self.old_rating,
            RatingField::New => &mut self.new_rating,
        };
        map.insert(id, value);
        true
    }

    /// Final points for a player, if recorded.
    pub fn points_of(&self, id: PlayerId) -> Option<i64> {
        self.points.get(&id).copied()
    }

    /// Rating change over this game (`new - old`), when both rows were recorded.
    pub fn rating_delta(&self, id: PlayerId) -> Option<f64> {
        let old = self.old_rating.get(&id)?;
        let new = self.new_rating.get(&id)?;
        Some(new - old)
    }

    /// Lowest point total and every player who scored it, in column order.
    ///
    /// Returns `None` when no points were recorded.
    pub fn winners(&self) -> Option<Winners<'_>> {
        let best = self
            .players
            .iter()
            .filter_map(|p| self.points_of(p.player_id))
            .min()?;

        let players = self
            .players
            .iter()
            .filter(|p| self.points_of(p.player_id) == Some(best))
            .collect();

        Some(Winners {
            players,
            points: best,
        })
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .players
            .iter()
            .map(|p| p.first_name.as_str())
            .collect();
        writeln!(f, "Game {}. Players: {}", self.game_id, names.join(", "))?;
        match self.winners() {
            Some(winners) => write!(f, "Winner: {}, {} points", winners, winners.points),
            None => write!(f, "Winner: no points recorded"),
        }
    }
}
