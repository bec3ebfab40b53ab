//! # Hearts Tracker
//!
//! Rebuilds hand-recorded Hearts games from a shared scoresheet and compares
//! how players performed against each other.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, games)
//! - **registry**: Known players, loaded from the roster sheet
//! - **sheet**: Scoresheet reconstruction (row resolution, chunk assembly, game building)
//! - **calculate**: Player comparison metrics
//! - **fetch**: Grid retrieval from the Sheets API
//! - **storage**: Raw grid snapshots on disk
//! - **pipeline**: End-to-end processing of fetched data
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod sheet;
pub mod storage;

pub use models::*;
