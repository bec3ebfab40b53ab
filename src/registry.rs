//! Player registry built from the roster sheet.
//!
//! Scoresheets name players by first name only, so lookups are by exact,
//! case-sensitive first name. First names must be distinct for resolution to
//! be unambiguous; when they are not, the earliest roster row wins and the
//! collision is reported once when the registry is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{cell, Player, PlayerId};

/// Errors for a single roster row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RosterError {
    #[error("Roster row {row}: missing {column} column")]
    MissingColumn { row: usize, column: &'static str },

    #[error("Roster row {row}: player id '{value}' is not an integer")]
    InvalidPlayerId { row: usize, value: String },

    #[error("Roster row {row}: rating '{value}' is not a number")]
    InvalidRating { row: usize, value: String },
}

/// Column indices of the roster sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterLayout {
    #[serde(default = "default_tag")]
    pub tag: usize,

    #[serde(default = "default_player_id")]
    pub player_id: usize,

    #[serde(default = "default_first_name")]
    pub first_name: usize,

    #[serde(default = "default_last_name")]
    pub last_name: usize,

    #[serde(default = "default_rating")]
    pub rating: usize,
}

fn default_tag() -> usize {
    0
}

fn default_player_id() -> usize {
    2
}

fn default_first_name() -> usize {
    3
}

fn default_last_name() -> usize {
    4
}

fn default_rating() -> usize {
    5
}

impl Default for RosterLayout {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            player_id: default_player_id(),
            first_name: default_first_name(),
            last_name: default_last_name(),
            rating: default_rating(),
        }
    }
}

/// The set of known players.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl PlayerRegistry {
    /// Wrap an already-built player list.
    pub fn from_players(players: Vec<Player>) -> Self {
        let registry = Self { players };
        registry.warn_duplicates();
        registry
    }

    /// Build the registry from roster rows. The first row is a header and is skipped.
    ///
    /// Rows that fail to parse are left out and returned alongside the registry.
    pub fn from_roster(rows: &[Vec<String>], layout: &RosterLayout) -> (Self, Vec<RosterError>) {
        let mut players = Vec::new();
        let mut errors = Vec::new();

        for (index, row) in rows.iter().enumerate().skip(1) {
            // 1-based sheet row numbers in messages
            let row_number = index + 1;
            if row.iter().all(|c| c.trim().is_empty()) {
                debug!("Skipping empty roster row {}", row_number);
                continue;
            }
            match parse_roster_row(row, row_number, layout) {
                Ok(player) => players.push(player),
                Err(e) => {
                    warn!("{}", e);
                    errors.push(e);
                }
            }
        }

        info!(
            "Loaded {} players from roster ({} rows rejected)",
            players.len(),
            errors.len()
        );

        (Self::from_players(players), errors)
    }

    /// Resolve a scoresheet name. Exact, case-sensitive match on first name.
    pub fn find_by_first_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.first_name == name)
    }

    /// Resolve by first and last name, for callers that need to disambiguate.
    pub fn find_by_full_name(&self, first_name: &str, last_name: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.first_name == first_name && p.last_name == last_name)
    }

    pub fn find_by_id(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == id)
    }

    /// First names shared by more than one roster entry.
    pub fn duplicate_first_names(&self) -> Vec<&str> {
        let mut dupes: Vec<&str> = Vec::new();
        for (i, player) in self.players.iter().enumerate() {
            let name = player.first_name.as_str();
            if dupes.contains(&name) {
                continue;
            }
            if self.players[i + 1..].iter().any(|p| p.first_name == name) {
                dupes.push(name);
            }
        }
        dupes
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn warn_duplicates(&self) {
        for name in self.duplicate_first_names() {
            warn!(
                "First name '{}' is shared by several players; scoresheets will resolve to the first roster entry",
                name
            );
        }
    }
}

/// Parse one roster row into a player.
pub fn parse_roster_row(
    row: &[String],
    row_number: usize,
    layout: &RosterLayout,
) -> Result<Player, RosterError> {
    let column = |index: usize, column: &'static str| {
        cell(row, index).ok_or(RosterError::MissingColumn {
                row: row_number,
                column,
            })
    };

    let tag = column(layout.tag, "tag")?;
    let id_text = column(layout.player_id, "player id")?;
    let first_name = column(layout.first_name, "first name")?;
    let last_name = column(layout.last_name, "last name")?;
    let rating_text = column(layout.rating, "rating")?;

    // Names are matched verbatim; only the numeric columns are trimmed.
    let player_id: i64 = id_text.trim().parse().map_err(|_| RosterError::InvalidPlayerId {
        row: row_number,
        value: id_text.to_string(),
    })?;
    let rating: f64 = rating_text.trim().parse().map_err(|_| RosterError::InvalidRating {
        row: row_number,
        value: rating_text.to_string(),
    })?;

    Ok(Player::new(player_id, tag, first_name, last_name, rating))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn roster() -> Vec<Vec<String>> {
        vec![
            row(&["Tag", "Notes", "Id", "First", "Last", "Rating"]),
            row(&["AL", "", "1", "Alice", "Liddell", "1500.5"]),
            row(&["BB", "", "2", "Bob", "Baker", "1450"]),
            row(&["CC", "", "3", "Carol", "Cole", "1612.25"]),
        ]
    }

    #[test]
    fn test_build_skips_header() {
        let rows = roster();
        let (registry, errors) = PlayerRegistry::from_roster(&rows, &RosterLayout::default());

        assert!(errors.is_empty());
        assert_eq!(registry.len(), rows.len() - 1);
    }

    #[test]
    fn test_fields_round_trip() {
        let (registry, _) = PlayerRegistry::from_roster(&roster(), &RosterLayout::default());
        let alice = registry.find_by_first_name("Alice").unwrap();

        assert_eq!(alice.tag, "AL");
        assert_eq!(alice.player_id, PlayerId(1));
        assert_eq!(alice.last_name, "Liddell");
        assert_eq!(alice.rating, 1500.5);
    }

    #[test]
    fn test_bad_rows_reported_not_fatal() {
        let mut rows = roster();
        rows.push(row(&["XX", "", "abc", "Xena", "X", "1400"]));
        rows.push(row(&["YY", "", "9", "Yuri", "Y", "high"]));
        rows.push(row(&["ZZ", "", "10"]));

        let (registry, errors) = PlayerRegistry::from_roster(&rows, &RosterLayout::default());

        assert_eq!(registry.len(), 3);
        assert_eq!(
            errors,
            vec![
                RosterError::InvalidPlayerId {
                    row: 5,
                    value: "abc".to_string()
                },
                RosterError::InvalidRating {
                    row: 6,
                    value: "high".to_string()
                },
                RosterError::MissingColumn {
                    row: 7,
                    column: "first name"
                },
            ]
        );
    }

    #[test]
    fn test_find_by_first_name_not_found() {
        let (registry, _) = PlayerRegistry::from_roster(&roster(), &RosterLayout::default());

        assert!(registry.find_by_first_name("Zed").is_none());
        assert!(registry.find_by_first_name("alice").is_none());
    }

    #[test]
    fn test_names_kept_verbatim() {
        let rows = vec![
            row(&["Tag", "Notes", "Id", "First", "Last", "Rating"]),
            row(&["AL", "", " 1 ", "Alice ", "Liddell", " 1500 "]),
        ];
        let (registry, errors) = PlayerRegistry::from_roster(&rows, &RosterLayout::default());

        assert!(errors.is_empty());
        assert!(registry.find_by_first_name("Alice").is_none());
        let alice = registry.find_by_first_name("Alice ").unwrap();
        assert_eq!(alice.player_id, PlayerId(1));
        assert_eq!(alice.rating, 1500.0);
    }

    #[test]
    fn test_duplicate_first_name_resolves_to_first_entry() {
        let registry = PlayerRegistry::from_players(vec![
            Player::new(1, "AL", "Alex", "Lee", 1500.0),
            Player::new(2, "AK", "Alex", "King", 1400.0),
            Player::new(3, "BB", "Bob", "Baker", 1450.0),
        ]);

        for _ in 0..3 {
            assert_eq!(
                registry.find_by_first_name("Alex").unwrap().player_id,
                PlayerId(1)
            );
        }
        assert_eq!(registry.duplicate_first_names(), vec!["Alex"]);
        assert_eq!(
            registry.find_by_full_name("Alex", "King").unwrap().player_id,
            PlayerId(2)
        );
    }

    #[test]
    fn test_custom_layout() {
        let layout = RosterLayout {
            tag: 1,
            player_id: 0,
            first_name: 2,
            last_name: 3,
            rating: 4,
        };
        let rows = vec![
            row(&["id", "tag", "first", "last", "rating"]),
            row(&["12", "DD", "Dan", "Dunn", "1380"]),
        ];
        let (registry, errors) = PlayerRegistry::from_roster(&rows, &layout);

        assert!(errors.is_empty());
        let dan = registry.find_by_id(PlayerId(12)).unwrap();
        assert_eq!(dan.tag, "DD");
        assert_eq!(dan.rating, 1380.0);
    }

    #[test]
    fn test_empty_rows_ignored() {
        let mut rows = roster();
        rows.push(vec![]);
        rows.push(row(&["", ""]));
        let (registry, errors) = PlayerRegistry::from_roster(&rows, &RosterLayout::default());

        assert_eq!(registry.len(), 3);
        assert!(errors.is_empty());
    }
}
