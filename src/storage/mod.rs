//! Local storage of fetched sheet data.
//!
//! Fetched grids are kept as a single JSON snapshot keyed by range name, so a
//! run can be reproduced offline. The snapshot is a cache: nothing here is
//! read back unless a command is pointed at it.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::RangeConfig;
use crate::fetch::{FetchError, FetchReport, GridSource, SheetData};
use crate::models::RawGrid;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    /// Default location of the sheet snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.raw_dir().join("sheet_snapshot.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Raw grids of one fetch, keyed by range name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSnapshot {
    pub sheet_id: String,
    pub fetched_at: DateTime<Utc>,

    /// Short SHA-256 of `ranges`
    pub checksum: String,

    pub ranges: SheetData,
}

impl SheetSnapshot {
    /// Snapshot the given ranges, stamped with the current time.
    pub fn new(sheet_id: impl Into<String>, ranges: SheetData) -> Result<Self, StorageError> {
        let checksum = checksum(&ranges)?;
        Ok(Self {
            sheet_id: sheet_id.into(),
            fetched_at: Utc::now(),
            checksum,
            ranges,
        })
    }

    /// Whether `ranges` still matches the recorded checksum.
    pub fn verify(&self) -> bool {
        checksum(&self.ranges)
            .map(|sum| sum == self.checksum)
            .unwrap_or(false)
    }
}

fn checksum(ranges: &SheetData) -> Result<String, StorageError> {
    let bytes = serde_json::to_vec(ranges)?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(&digest[..8]))
}

/// Write a snapshot as pretty JSON, creating parent directories.
pub fn write_snapshot(path: &Path, snapshot: &SheetSnapshot) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;

    info!(
        "Wrote snapshot of {} ranges to {:?}",
        snapshot.ranges.len(),
        path
    );
    Ok(())
}

/// Read a snapshot back.
pub fn read_snapshot(path: &Path) -> Result<SheetSnapshot, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let snapshot: SheetSnapshot = serde_json::from_str(&content)?;

    if !snapshot.verify() {
        warn!("Snapshot {:?} does not match its checksum", path);
    }
    Ok(snapshot)
}

/// Save the outcome of a live fetch and return the grids to process.
///
/// A complete fetch replaces the snapshot at `path`. When any range failed the
/// existing snapshot is left untouched, and the failed ranges are filled in
/// from it when it has them.
pub fn save_fetch(
    path: &Path,
    sheet_id: &str,
    report: FetchReport,
) -> Result<SheetData, StorageError> {
    if report.failures.is_empty() {
        let snapshot = SheetSnapshot::new(sheet_id, report.data)?;
        write_snapshot(path, &snapshot)?;
        return Ok(snapshot.ranges);
    }

    warn!(
        "{} ranges failed to load, keeping snapshot {:?} as it is",
        report.failures.len(),
        path
    );

    let mut data = report.data;
    if !path.exists() {
        return Ok(data);
    }

    let previous = read_snapshot(path)?;
    if previous.sheet_id != sheet_id {
        warn!(
            "Snapshot {:?} is for sheet {}, not filling failed ranges from it",
            path, previous.sheet_id
        );
        return Ok(data);
    }

    let fetched_at = previous.fetched_at;
    let mut stale = previous.ranges;
    for (name, _) in &report.failures {
        if let Some(grid) = stale.remove(name) {
            info!("Using range '{}' from snapshot taken {}", name, fetched_at);
            data.insert(name.clone(), grid);
        }
    }
    Ok(data)
}

/// Serves grids from a loaded snapshot.
pub struct SnapshotSource {
    snapshot: SheetSnapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: SheetSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::new(read_snapshot(path)?))
    }

    pub fn snapshot(&self) -> &SheetSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl GridSource for SnapshotSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn fetch_range(&self, range: &RangeConfig) -> Result<RawGrid, FetchError> {
        self.snapshot
            .ranges
            .get(&range.name)
            .cloned()
            .ok_or_else(|| FetchError::MissingRange(range.name.clone()))
    }
}
