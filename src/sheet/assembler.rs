//! Splits the games grid into per-game chunks.
//!
//! Rows are scanned top to bottom. Blank rows close the current row block;
//! within a block the left and right sub-tables accumulate independently.
//! The grid end closes the last block the same way a blank row does.

use tracing::{debug, info, warn};

use super::resolver::resolve_row;
use super::{Chunk, ChunkFailure, LineRecord, SheetError, SheetLayout, Side};
use crate::models::{cell, RawGrid};
use crate::registry::PlayerRegistry;

/// Output of one scan.
#[derive(Debug, Default)]
pub struct Assembly {
    pub chunks: Vec<Chunk>,
    pub failures: Vec<ChunkFailure>,
}

/// In-progress records for one sub-table of the current block.
#[derive(Debug)]
struct PendingChunk {
    side: Side,
    first_row: usize,
    records: Vec<LineRecord>,
    error: Option<SheetError>,
}

impl PendingChunk {
    fn new(side: Side) -> Self {
        Self {
            side,
            first_row: 0,
            records: Vec::new(),
            error: None,
        }
    }

    fn game_id(&self) -> Option<i64> {
        self.records
            .first()
            .and_then(LineRecord::as_header)
            .map(|h| h.game_id)
    }

    fn push(&mut self, slice: &[String], registry: &PlayerRegistry, row: usize) {
        if self.error.is_some() {
            debug!("Row {}: {} table already failed, skipping", row, self.side);
            return;
        }

        match resolve_row(slice, registry, &self.records, row) {
            Ok(record) => {
                if self.records.is_empty() {
                    self.first_row = row;
                }
                self.records.push(record);
            }
            Err(SheetError::MissingHeader { .. }) => {
                warn!(
                    "Row {}: {} table has a statistic row with no game header above it, skipping",
                    row, self.side
                );
            }
            Err(e) => {
                warn!("{} table: {}", self.side, e);
                if self.records.is_empty() {
                    self.first_row = row;
                }
                self.error = Some(e);
            }
        }
    }

    /// Close this sub-table, emitting a chunk or a failure.
    fn flush(&mut self, out: &mut Assembly) {
        let side = self.side;
        let pending = std::mem::replace(self, PendingChunk::new(side));
        let game_id = pending.game_id();

        if let Some(error) = pending.error {
            out.failures.push(ChunkFailure {
                side: pending.side,
                first_row: pending.first_row,
                game_id,
                error: error.into(),
            });
            return;
        }

        if game_id.is_none() {
            return;
        }

        out.chunks.push(Chunk {
            side: pending.side,
            first_row: pending.first_row,
            records: pending.records,
        });
    }
}

/// Scan state threaded through the row loop.
#[derive(Debug)]
struct Accumulator {
    left: PendingChunk,
    right: PendingChunk,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            left: PendingChunk::new(Side::Left),
            right: PendingChunk::new(Side::Right),
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut PendingChunk {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn flush(&mut self, out: &mut Assembly) {
        self.left.flush(out);
        self.right.flush(out);
    }
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Whether this side of `row` holds a sub-table line.
///
/// Needs a leading cell that is not the placeholder and a non-empty cell next to it.
fn side_has_line(row: &[String], side: Side, layout: &SheetLayout) -> bool {
    let start = layout.span(side).start;
    let lead = cell(row, start).map(str::trim).unwrap_or_default();
    let next = cell(row, start + 1).map(str::trim).unwrap_or_default();

    !lead.is_empty() && lead != layout.placeholder && !next.is_empty()
}

/// Whether every side of `row` that has a leading cell starts with the placeholder.
fn is_placeholder_row(row: &[String], layout: &SheetLayout) -> bool {
    let leads: Vec<&str> = [Side::Left, Side::Right]
        .into_iter()
        .filter_map(|side| cell(row, layout.span(side).start).map(str::trim))
        .filter(|lead| !lead.is_empty())
        .collect();

    !leads.is_empty() && leads.iter().all(|lead| *lead == layout.placeholder)
}

/// Group the games grid into chunks, one per sub-table per row block.
///
/// Never fails as a whole: malformed rows are skipped and malformed
/// sub-tables come back as [`ChunkFailure`]s.
pub fn assemble(grid: &RawGrid, registry: &PlayerRegistry, layout: &SheetLayout) -> Assembly {
    let mut out = Assembly::default();
    let mut acc = Accumulator::new();

    for (index, row) in grid.iter().enumerate() {
        let row_number = index + 1;

        if is_blank_row(row) {
            acc.flush(&mut out);
            continue;
        }

        let mut used = false;
        for side in [Side::Left, Side::Right] {
            if side_has_line(row, side, layout) {
                let slice = layout.span(side).slice(row);
                acc.side_mut(side).push(slice, registry, row_number);
                used = true;
            }
        }
        if !used {
            if is_placeholder_row(row, layout) {
                debug!("Row {}: placeholder row, skipping", row_number);
            } else {
                warn!("Row {}: no sub-table content, skipping", row_number);
            }
        }
    }

    // Sheets that stop without a trailing blank row still close their last block.
    acc.flush(&mut out);

    info!(
        "Assembled {} chunks from {} rows ({} failed)",
        out.chunks.len(),
        grid.len(),
        out.failures.len()
    );

    out
}
