//! End-to-end processing of fetched sheet data.
//!
//! 1. Build the player registry from the roster range
//! 2. Assemble chunks from each games range
//! 3. Build games from the chunks
//!
//! Per-row and per-chunk problems are collected in the report; only a missing
//! roster stops the run.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{AppConfig, RangeRoles};
use crate::fetch::SheetData;
use crate::models::Game;
use crate::registry::{PlayerRegistry, RosterError, RosterLayout};
use crate::sheet::{assemble, build_games, ChunkFailure, SheetLayout};

/// Errors that stop a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Roster range '{0}' was not loaded")]
    MissingRoster(String),
}

/// Result of a pipeline run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub registry: PlayerRegistry,
    pub roster_errors: Vec<RosterError>,
    pub games: Vec<Game>,
    pub failures: Vec<ChunkFailure>,

    /// Games ranges that were configured but not present in the data
    pub missing_ranges: Vec<String>,
}

impl PipelineReport {
    pub fn game(&self, game_id: i64) -> Option<&Game> {
        self.games.iter().find(|g| g.game_id == game_id)
    }
}

/// Sheet processing settings.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub roles: RangeRoles,
    pub layout: SheetLayout,
    pub roster_layout: RosterLayout,
}

impl Pipeline {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            roles: config.roles.clone(),
            layout: config.layout.clone(),
            roster_layout: config.roster_layout.clone(),
        }
    }

    /// Run over already-fetched data.
    pub fn run(&self, data: &SheetData) -> Result<PipelineReport, PipelineError> {
        let roster = data
            .get(&self.roles.roster)
            .ok_or_else(|| PipelineError::MissingRoster(self.roles.roster.clone()))?;

        let (registry, roster_errors) = PlayerRegistry::from_roster(roster, &self.roster_layout);

        let mut report = PipelineReport {
            registry,
            roster_errors,
            ..Default::default()
        };

        for name in &self.roles.games {
            let Some(grid) = data.get(name) else {
                warn!("Games range '{}' was not loaded, skipping", name);
                report.missing_ranges.push(name.clone());
                continue;
            };

            info!("Processing games range '{}'", name);
            let assembly = assemble(grid, &report.registry, &self.layout);
            let (games, failures) = build_games(&assembly.chunks);

            report.games.extend(games);
            report.failures.extend(assembly.failures);
            report.failures.extend(failures);
        }

        info!(
            "Built {} games ({} chunks failed)",
            report.games.len(),
            report.failures.len()
        );

        Ok(report)
    }
}
