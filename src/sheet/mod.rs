//! Scoresheet reconstruction.
//!
//! The games sheet is a grid of row blocks separated by blank rows. Each block
//! holds up to two independent sub-tables side by side ("left" and "right"),
//! and each sub-table is one game:
//!
//! ```text
//! 42          Alice  Bob    Carol  Dan        43          Erin  ...
//! Old Rating  1500   1450   1600   1380       Old Rating  ...
//! New Rating  1510   1440   1590   1400       ...
//! Right       3      8      2      0
//! Left        ...
//! Across      ...
//! Hold        ...
//! Total       12     20     20     5
//! ```
//!
//! - [`resolver`] turns one sub-table row into a [`LineRecord`]
//! - [`assembler`] walks the grid and groups records into [`Chunk`]s
//! - [`convert`] turns a chunk into a [`Game`](crate::models::Game)

pub mod assembler;
pub mod convert;
pub mod resolver;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::{Player, PlayerId};

pub use assembler::{assemble, Assembly};
pub use convert::{build_game, build_games, BuildError};
pub use resolver::{classify, resolve_row, RowKind};

/// Errors raised while resolving a sub-table row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SheetError {
    #[error("row {row}: unknown statistic identifier '{label}'")]
    UnknownIdentifier { row: usize, label: String },

    #[error("row {row}: value in column {index} has no player slot (header has {slots})")]
    SlotOutOfRange {
        row: usize,
        index: usize,
        slots: usize,
    },

    #[error("row {row}: '{value}' is not a valid {label} value")]
    InvalidValue {
        row: usize,
        label: StatKind,
        value: String,
    },

    #[error("row {row}: statistic row before any game header")]
    MissingHeader { row: usize },
}

/// Either side of a row block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Half-open column range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpan {
    pub start: usize,
    pub end: usize,
}

impl ColumnSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn overlaps(&self, other: &ColumnSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The part of `row` inside this span, clipped to the row's length.
    pub fn slice<'a>(&self, row: &'a [String]) -> &'a [String] {
        let end = self.end.min(row.len());
        let start = self.start.min(end);
        &row[start..end]
    }
}

/// Where the two sub-tables live in each row block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetLayout {
    #[serde(default = "default_left")]
    pub left: ColumnSpan,

    #[serde(default = "default_right")]
    pub right: ColumnSpan,

    /// Leading cell text that marks a sub-table row as intentionally skipped
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_left() -> ColumnSpan {
    ColumnSpan::new(0, 5)
}

fn default_right() -> ColumnSpan {
    ColumnSpan::new(6, 11)
}

fn default_placeholder() -> String {
    "x".to_string()
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            left: default_left(),
            right: default_right(),
            placeholder: default_placeholder(),
        }
    }
}

impl SheetLayout {
    pub fn span(&self, side: Side) -> ColumnSpan {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Fixed vocabulary of statistic row labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    OldRating,
    NewRating,
    Right,
    Left,
    Across,
    Hold,
    Total,
}

impl StatKind {
    /// Sheet order, which is also the chunk order after the header.
    pub const ALL: [StatKind; 7] = [
        StatKind::OldRating,
        StatKind::NewRating,
        StatKind::Right,
        StatKind::Left,
        StatKind::Across,
        StatKind::Hold,
        StatKind::Total,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatKind::OldRating => "Old Rating",
            StatKind::NewRating => "New Rating",
            StatKind::Right => "Right",
            StatKind::Left => "Left",
            StatKind::Across => "Across",
            StatKind::Hold => "Hold",
            StatKind::Total => "Total",
        }
    }

    /// Exact label match.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }

    /// Rating rows carry decimals; every other row carries whole points.
    pub fn is_rating(&self) -> bool {
        matches!(self, StatKind::OldRating | StatKind::NewRating)
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A parsed statistic cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Rating(f64),
    Points(i64),
}

/// Game header: id plus the player in each column slot.
///
/// `slots[i]` is the player named in the sub-table's column `i + 1`, or
/// `None` if that cell was blank or did not resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    pub game_id: i64,
    pub slots: Vec<Option<Player>>,
}

impl HeaderRecord {
    /// Resolved players in column order.
    pub fn players(&self) -> Vec<Player> {
        self.slots.iter().flatten().cloned().collect()
    }
}

/// One labelled statistic row.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRecord {
    pub kind: StatKind,
    pub values: Vec<(PlayerId, StatValue)>,
}

/// A resolved sub-table row.
#[derive(Debug, Clone, PartialEq)]
pub enum LineRecord {
    Header(HeaderRecord),
    Stat(StatRecord),
}

impl LineRecord {
    pub fn as_header(&self) -> Option<&HeaderRecord> {
        match self {
            LineRecord::Header(header) => Some(header),
            LineRecord::Stat(_) => None,
        }
    }

    pub fn as_stat(&self) -> Option<&StatRecord> {
        match self {
            LineRecord::Stat(stat) => Some(stat),
            LineRecord::Header(_) => None,
        }
    }
}

/// Records for one sub-table within one row block. Starts with a header.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub side: Side,

    /// 1-based grid row of the header
    pub first_row: usize,

    pub records: Vec<LineRecord>,
}

impl Chunk {
    pub fn header(&self) -> Option<&HeaderRecord> {
        self.records.first().and_then(LineRecord::as_header)
    }

    pub fn game_id(&self) -> Option<i64> {
        self.header().map(|h| h.game_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Why a chunk did not become a game.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChunkError {
    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// A chunk that failed, with enough context to find it on the sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFailure {
    pub side: Side,
    pub first_row: usize,
    pub game_id: Option<i64>,
    pub error: ChunkError,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.game_id {
            Some(id) => write!(
                f,
                "game {} ({} table, row {}): {}",
                id, self.side, self.first_row, self.error
            ),
            None => write!(
                f,
                "unknown game ({} table, row {}): {}",
                self.side, self.first_row, self.error
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_kind_labels() {
        for kind in StatKind::ALL {
            assert_eq!(StatKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(StatKind::from_label("total"), None);
        assert_eq!(StatKind::from_label("Bonus"), None);
    }

    #[test]
    fn test_stat_kind_rating() {
        assert!(StatKind::OldRating.is_rating());
        assert!(StatKind::NewRating.is_rating());
        assert!(!StatKind::Total.is_rating());
    }

    #[test]
    fn test_column_span_slice_clips() {
        let row: Vec<String> = ["a", "b", "c", "d", "e", "f", "g", "h"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(ColumnSpan::new(0, 5).slice(&row).len(), 5);
        assert_eq!(ColumnSpan::new(6, 11).slice(&row), &row[6..8]);
        assert!(ColumnSpan::new(10, 12).slice(&row).is_empty());
    }

    #[test]
    fn test_column_span_overlap() {
        assert!(!ColumnSpan::new(0, 5).overlaps(&ColumnSpan::new(6, 11)));
        assert!(!ColumnSpan::new(0, 5).overlaps(&ColumnSpan::new(5, 10)));
        assert!(ColumnSpan::new(0, 6).overlaps(&ColumnSpan::new(5, 10)));
    }

    #[test]
    fn test_default_layout() {
        let layout = SheetLayout::default();
        assert_eq!(layout.span(Side::Left), ColumnSpan::new(0, 5));
        assert_eq!(layout.span(Side::Right), ColumnSpan::new(6, 11));
        assert_eq!(layout.placeholder, "x");
    }

    #[test]
    fn test_chunk_failure_display() {
        let failure = ChunkFailure {
            side: Side::Right,
            first_row: 10,
            game_id: Some(43),
            error: SheetError::UnknownIdentifier {
                row: 12,
                label: "Bonus".to_string(),
            }
            .into(),
        };
        assert_eq!(
            failure.to_string(),
            "game 43 (right table, row 10): row 12: unknown statistic identifier 'Bonus'"
        );
    }
}
