//! Row classification and player resolution for one sub-table row.

use tracing::{debug, warn};

use super::{HeaderRecord, LineRecord, SheetError, StatKind, StatRecord, StatValue};
use crate::registry::PlayerRegistry;

/// What a sub-table row is, decided from its leading cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind<'a> {
    /// Leading cell is an integer game id; the rest are player names
    Header { game_id: i64, names: &'a [String] },

    /// Leading cell is a known statistic label; the rest are values
    Stat { kind: StatKind, values: &'a [String] },

    /// Leading cell is neither
    Malformed { label: &'a str },
}

/// Classify a sub-table row without resolving anything.
pub fn classify(slice: &[String]) -> RowKind<'_> {
    let Some((lead, rest)) = slice.split_first() else {
        return RowKind::Malformed { label: "" };
    };

    if let Ok(game_id) = lead.trim().parse::<i64>() {
        return RowKind::Header {
            game_id,
            names: rest,
        };
    }

    match StatKind::from_label(lead.trim()) {
        Some(kind) => RowKind::Stat { kind, values: rest },
        None => RowKind::Malformed { label: lead },
    }
}

/// Resolve one sub-table row against the registry and the chunk built so far.
///
/// `row` is the 1-based grid row, used in messages. Statistic rows are mapped
/// onto the players of the header that opens `chunk_so_far`.
pub fn resolve_row(
    slice: &[String],
    registry: &PlayerRegistry,
    chunk_so_far: &[LineRecord],
    row: usize,
) -> Result<LineRecord, SheetError> {
    match classify(slice) {
        RowKind::Header { game_id, names } => Ok(LineRecord::Header(resolve_header(
            game_id, names, registry, row,
        ))),
        RowKind::Stat { kind, values } => {
            let header = chunk_so_far
                .first()
                .and_then(LineRecord::as_header)
                .ok_or(SheetError::MissingHeader { row })?;
            resolve_stat(kind, values, header, row).map(LineRecord::Stat)
        }
        RowKind::Malformed { label } => Err(SheetError::UnknownIdentifier {
            row,
            label: label.to_string(),
        }),
    }
}

fn resolve_header(
    game_id: i64,
    names: &[String],
    registry: &PlayerRegistry,
    row: usize,
) -> HeaderRecord {
    let slots = names
        .iter()
        .map(|name| {
            if name.trim().is_empty() {
                return None;
            }
            let player = registry.find_by_first_name(name);
            if player.is_none() {
                warn!(
                    "Could not resolve name '{}' in game {} header (row {})",
                    name, game_id, row
                );
            }
            player.cloned()
        })
        .collect();

    HeaderRecord { game_id, slots }
}

fn resolve_stat(
    kind: StatKind,
    cells: &[String],
    header: &HeaderRecord,
    row: usize,
) -> Result<StatRecord, SheetError> {
    let mut values = Vec::new();

    for (index, text) in cells.iter().enumerate() {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let slot = header.slots.get(index).ok_or(SheetError::SlotOutOfRange {
            row,
            index,
            slots: header.slots.len(),
        })?;
        let Some(player) = slot else {
            debug!(
                "Row {}: dropping {} value '{}' for unresolved slot {}",
                row, kind, text, index
            );
            continue;
        };

        let invalid = || SheetError::InvalidValue {
            row,
            label: kind,
            value: text.to_string(),
        };
        let value = if kind.is_rating() {
            StatValue::Rating(text.parse().map_err(|_| invalid())?)
        } else {
            StatValue::Points(text.parse().map_err(|_| invalid())?)
        };
        values.push((player.player_id, value));
    }

    Ok(StatRecord { kind, values })
}
