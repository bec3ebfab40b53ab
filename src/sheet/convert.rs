//! Convert assembled chunks into [`Game`] records.
//!
//! A chunk maps onto a game by position, mirroring the fixed row order of the
//! scoresheet: header, Old Rating, New Rating, Right, Left, Across, Hold, Total.

use thiserror::Error;
use tracing::{debug, error, warn};

use super::{Chunk, ChunkFailure, StatKind, StatRecord, StatValue};
use crate::models::{Game, PointField, RatingField};

/// Rows in a complete game chunk, header included.
pub const GAME_CHUNK_LEN: usize = 8;

/// Errors raised while building a game from a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("chunk does not start with a game header")]
    MissingHeader,

    #[error("game {game_id}: chunk has {len} rows, expected at least 8")]
    TooShort { game_id: i64, len: usize },

    #[error("game {game_id}: chunk row {index} is a second header where {expected} was expected")]
    UnexpectedHeader {
        game_id: i64,
        index: usize,
        expected: StatKind,
    },
}

/// Build one game from a chunk.
///
/// Rows are taken by position. A row whose label does not match its position
/// is still used, with a warning.
pub fn build_game(chunk: &Chunk) -> Result<Game, BuildError> {
    let header = chunk.header().ok_or(BuildError::MissingHeader)?;
    let game_id = header.game_id;

    if chunk.len() < GAME_CHUNK_LEN {
        return Err(BuildError::TooShort {
            game_id,
            len: chunk.len(),
        });
    }

    let mut game = Game::new(game_id, header.players());

    for (offset, expected) in StatKind::ALL.into_iter().enumerate() {
        let index = offset + 1;
        let stat = chunk.records[index]
            .as_stat()
            .ok_or(BuildError::UnexpectedHeader {
                game_id,
                index,
                expected,
            })?;

        if stat.kind != expected {
            warn!(
                "Game {}: chunk row {} is labelled '{}', using it as '{}'",
                game_id, index, stat.kind, expected
            );
        }
        copy_stat(&mut game, expected, stat);
    }

    if chunk.len() > GAME_CHUNK_LEN {
        debug!(
            "Game {}: ignoring {} rows after Total",
            game_id,
            chunk.len() - GAME_CHUNK_LEN
        );
    }

    Ok(game)
}

fn copy_stat(game: &mut Game, slot: StatKind, stat: &StatRecord) {
    let field = match slot {
        StatKind::OldRating => return copy_ratings(game, RatingField::Old, stat),
        StatKind::NewRating => return copy_ratings(game, RatingField::New, stat),
        StatKind::Right => PointField::Right,
        StatKind::Left => PointField::Left,
        StatKind::Across => PointField::Across,
        StatKind::Hold => PointField::Hold,
        StatKind::Total => PointField::Points,
    };

    for &(id, value) in &stat.values {
        match value {
            StatValue::Points(points) => {
                game.insert_points(field, id, points);
            }
            StatValue::Rating(rating) => warn!(
                "Game {}: rating {} found where {} points were expected, dropped",
                game.game_id, rating, slot
            ),
        }
    }
}

fn copy_ratings(game: &mut Game, field: RatingField, stat: &StatRecord) {
    for &(id, value) in &stat.values {
        let rating = match value {
            StatValue::Rating(rating) => rating,
            StatValue::Points(points) => points as f64,
        };
        game.insert_rating(field, id, rating);
    }
}

/// Build every chunk, collecting failures instead of stopping at the first one.
pub fn build_games(chunks: &[Chunk]) -> (Vec<Game>, Vec<ChunkFailure>) {
    let mut games = Vec::new();
    let mut failures = Vec::new();

    for chunk in chunks {
        match build_game(chunk) {
            Ok(game) => games.push(game),
            Err(e) => {
                let failure = ChunkFailure {
                    side: chunk.side,
                    first_row: chunk.first_row,
                    game_id: chunk.game_id(),
                    error: e.into(),
                };
                error!("Could not build {}", failure);
                failures.push(failure);
            }
        }
    }

    (games, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, PlayerId};
    use crate::sheet::{ChunkError, HeaderRecord, LineRecord, Side};

    fn players() -> Vec<Player> {
        vec![
            Player::new(1, "AL", "Alice", "Liddell", 1500.0),
            Player::new(2, "BB", "Bob", "Baker", 1450.0),
            Player::new(3, "CC", "Carol", "Cole", 1600.0),
            Player::new(4, "DD", "Dan", "Dunn", 1380.0),
        ]
    }

    fn header(game_id: i64) -> LineRecord {
        LineRecord::Header(HeaderRecord {
            game_id,
            slots: players().into_iter().map(Some).collect(),
        })
    }

    fn points(kind: StatKind, values: [i64; 4]) -> LineRecord {
        LineRecord::Stat(StatRecord {
            kind,
            values: (1..=4)
                .zip(values)
                .map(|(id, v)| (PlayerId(id), StatValue::Points(v)))
                .collect(),
        })
    }

    fn ratings(kind: StatKind, values: [f64; 4]) -> LineRecord {
        LineRecord::Stat(StatRecord {
            kind,
            values: (1..=4)
                .zip(values)
                .map(|(id, v)| (PlayerId(id), StatValue::Rating(v)))
                .collect(),
        })
    }

    fn full_chunk(game_id: i64) -> Chunk {
        Chunk {
            side: Side::Left,
            first_row: 1,
            records: vec![
                header(game_id),
                ratings(StatKind::OldRating, [1500.0, 1450.0, 1600.0, 1380.0]),
                ratings(StatKind::NewRating, [1490.0, 1440.0, 1590.0, 1420.5]),
                points(StatKind::Right, [3, 8, 6, 0]),
                points(StatKind::Left, [4, 5, 6, 1]),
                points(StatKind::Across, [2, 7, 8, 3]),
                points(StatKind::Hold, [3, 0, 0, 1]),
                points(StatKind::Total, [12, 20, 20, 5]),
            ],
        }
    }

    #[test]
    fn test_build_full_game() {
        let game = build_game(&full_chunk(42)).unwrap();

        assert_eq!(game.game_id, 42);
        assert_eq!(game.players, players());
        assert_eq!(game.right[&PlayerId(2)], 8);
        assert_eq!(game.left[&PlayerId(4)], 1);
        assert_eq!(game.across[&PlayerId(3)], 8);
        assert_eq!(game.hold[&PlayerId(1)], 3);
        assert_eq!(game.points[&PlayerId(4)], 5);
        assert_eq!(game.rating_delta(PlayerId(4)), Some(40.5));

        let winners = game.winners().unwrap();
        assert_eq!(winners.to_string(), "Dan");
        assert_eq!(winners.points, 5);
    }

    #[test]
    fn test_too_short_chunk() {
        let mut chunk = full_chunk(42);
        chunk.records.truncate(6);

        assert_eq!(
            build_game(&chunk).unwrap_err(),
            BuildError::TooShort {
                game_id: 42,
                len: 6
            }
        );
    }

    #[test]
    fn test_second_header_in_stat_position() {
        let mut chunk = full_chunk(42);
        chunk.records[5] = header(43);

        assert_eq!(
            build_game(&chunk).unwrap_err(),
            BuildError::UnexpectedHeader {
                game_id: 42,
                index: 5,
                expected: StatKind::Across
            }
        );
    }

    #[test]
    fn test_mislabelled_row_used_positionally() {
        let mut chunk = full_chunk(42);
        chunk.records[3] = points(StatKind::Left, [9, 9, 9, 9]);

        let game = build_game(&chunk).unwrap();
        assert_eq!(game.right[&PlayerId(1)], 9);
    }

    #[test]
    fn test_missing_values_leave_gaps() {
        let mut chunk = full_chunk(42);
        chunk.records[7] = LineRecord::Stat(StatRecord {
            kind: StatKind::Total,
            values: vec![(PlayerId(1), StatValue::Points(7))],
        });

        let game = build_game(&chunk).unwrap();
        assert_eq!(game.points.len(), 1);
        assert_eq!(game.points_of(PlayerId(2)), None);
    }

    #[test]
    fn test_build_games_keeps_going_after_failure() {
        let mut short = full_chunk(1);
        short.records.truncate(3);
        let chunks = vec![short, full_chunk(2), full_chunk(3)];

        let (games, failures) = build_games(&chunks);

        assert_eq!(games.iter().map(|g| g.game_id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].game_id, Some(1));
        assert!(matches!(
            failures[0].error,
            ChunkError::Build(BuildError::TooShort { len: 3, .. })
        ));
    }
}
