//! Core data models for the hearts tracker.

mod game;
mod player;

pub use game::*;
pub use player::*;

/// Raw spreadsheet values: rows of string cells, possibly ragged.
pub type RawGrid = Vec<Vec<String>>;

/// Read a cell, treating ragged rows as missing cells.
pub fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index).map(String::as_str)
}
