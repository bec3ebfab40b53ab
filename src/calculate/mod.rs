//! Player comparison metrics.
//!
//! Scores how one player performed against another in a single game, taking
//! into account who was expected to win on rating. Lower points are better.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Game, Player, PlayerId};

/// Rating and point differences are scaled down by this factor.
const DIFF_SCALE: f64 = 10.0;

/// Rating gap that doubles the penalty for losing as the favourite.
const FAVOURITE_SCALE: f64 = 75.0;

/// Errors from comparing players.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("game {game_id} has no points for {player}")]
    MissingPoints { game_id: i64, player: String },
}

/// Relative performance of `a` against `b` in `game`.
///
/// Positive when `a` did better than expected, negative when worse:
///
/// | a rated lower | a scored lower | score |
/// |---|---|---|
/// | yes | yes | `r/10 + p/10` |
/// | yes | no  | `-(p/10)` |
/// | no  | yes | `p/10` |
/// | no  | no  | `-(r/10 + (p/10) * (1 + r/75))` |
///
/// where `r` and `p` are the absolute rating and point differences.
pub fn compare(a: &Player, b: &Player, game: &Game) -> Result<f64, CompareError> {
    let points_a = points_for(a, game)?;
    let points_b = points_for(b, game)?;

    let rating_diff = (a.rating - b.rating).abs();
    let points_diff = points_a.abs_diff(points_b) as f64;

    let a_underdog = a.rating < b.rating;
    let a_won = points_a < points_b;

    let score = match (a_underdog, a_won) {
        (true, true) => rating_diff / DIFF_SCALE + points_diff / DIFF_SCALE,
        (true, false) => -(points_diff / DIFF_SCALE),
        (false, true) => points_diff / DIFF_SCALE,
        (false, false) => -(rating_diff / DIFF_SCALE
            + (points_diff / DIFF_SCALE) * (1.0 + rating_diff / FAVOURITE_SCALE)),
    };

    Ok(score)
}

fn points_for(player: &Player, game: &Game) -> Result<i64, CompareError> {
    game.points_of(player.player_id)
        .ok_or_else(|| CompareError::MissingPoints {
            game_id: game.game_id,
            player: player.first_name.clone(),
        })
}

/// One ordered pair of a comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub player: PlayerId,
    pub opponent: PlayerId,
    pub score: f64,
}

/// Compare every ordered pair of distinct players that have points in the game.
pub fn compare_all(game: &Game) -> Vec<Comparison> {
    let scored: Vec<&Player> = game
        .players
        .iter()
        .filter(|p| game.points_of(p.player_id).is_some())
        .collect();

    let mut table = Vec::new();
    for a in &scored {
        for b in &scored {
            if a.player_id == b.player_id {
                continue;
            }
            if let Ok(score) = compare(a, b, game) {
                table.push(Comparison {
                    player: a.player_id,
                    opponent: b.player_id,
                    score,
                });
            }
        }
    }
    table
}

/// Sum of a player's comparison scores across a game, if they scored in it.
pub fn total_for(game: &Game, id: PlayerId) -> Option<f64> {
    game.points_of(id)?;
    Some(
        compare_all(game)
            .iter()
            .filter(|c| c.player == id)
            .map(|c| c.score)
            .sum(),
    )
}
