use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearts_tracker::calculate::{compare, compare_all};
use hearts_tracker::config::AppConfig;
use hearts_tracker::fetch::{fetch_all, FetchReport, GridSource, SheetData, SheetsClient};
use hearts_tracker::pipeline::{Pipeline, PipelineReport};
use hearts_tracker::storage::{save_fetch, SnapshotSource, StorageConfig};

#[derive(Parser)]
#[command(name = "hearts-tracker")]
#[command(about = "Rebuild Hearts games from the scoresheet and compare players")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./hearts.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where sheet data comes from.
#[derive(clap::Args)]
struct SourceArgs {
    /// Read grids from this snapshot instead of the live sheet
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Read grids from the default snapshot in the data directory
    #[arg(long)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all configured ranges and save them as a snapshot
    Fetch {
        /// Snapshot path (default: <data_dir>/raw/sheet_snapshot.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Rebuild games and print a summary of each
    Process {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Compare two players in one game, or every pair when no names are given
    Compare {
        /// Game id
        #[arg(long)]
        game: i64,

        /// First name of the player being scored
        player: Option<String>,

        /// First name of the opponent
        opponent: Option<String>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// List the players in the roster
    Players {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting hearts-tracker v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Fetch { output } => {
            let data = fetch_live(&config, &storage, output.as_deref()).await?;
            println!("Fetched {} ranges", data.len());
        }

        Commands::Process { source } => {
            let report = run_pipeline(&config, &storage, &source).await?;

            let summaries: Vec<String> = report.games.iter().map(|g| g.to_string()).collect();
            println!("{}", summaries.join("\n------\n"));

            print_problems(&report);
        }

        Commands::Compare {
            game,
            player,
            opponent,
            source,
        } => {
            let report = run_pipeline(&config, &storage, &source).await?;
            let game = report
                .game(game)
                .with_context(|| format!("Game {} not found", game))?;

            match (player, opponent) {
                (Some(a), Some(b)) => {
                    let a = find_player(&report, &a)?;
                    let b = find_player(&report, &b)?;
                    let score = compare(a, b, game)?;
                    println!(
                        "{} vs {} in game {}: {:.2}",
                        a.first_name, b.first_name, game.game_id, score
                    );
                }
                (None, None) => {
                    for row in compare_all(game) {
                        let name = |id| {
                            game.player(id)
                                .map(|p| p.first_name.as_str())
                                .unwrap_or("?")
                        };
                        println!(
                            "{:<12} vs {:<12} {:>8.2}",
                            name(row.player),
                            name(row.opponent),
                            row.score
                        );
                    }
                }
                _ => bail!("Give both player names, or neither for the full table"),
            }
        }

        Commands::Players { source } => {
            let report = run_pipeline(&config, &storage, &source).await?;
            for player in report.registry.iter() {
                println!("{}", player);
            }
            for name in report.registry.duplicate_first_names() {
                println!("Warning: first name '{}' is not unique", name);
            }
        }
    }

    Ok(())
}

/// Fetch every configured range from the live sheet and save a snapshot.
async fn fetch_live(
    config: &AppConfig,
    storage: &StorageConfig,
    output: Option<&Path>,
) -> Result<SheetData> {
    let client = SheetsClient::new(&config.sheet, config.api_key())
        .context("Failed to create Sheets client")?;

    let report = fetch_all(&client, &config.ranges).await;
    print_fetch_failures(&report);

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| storage.snapshot_path());
    let complete = report.failures.is_empty();
    let data = save_fetch(&path, &config.sheet.sheet_id, report)?;
    if !complete {
        eprintln!("Snapshot {:?} was not updated", path);
    }

    Ok(data)
}

async fn load_ranges(source: &dyn GridSource, config: &AppConfig) -> SheetData {
    let report = fetch_all(source, &config.ranges).await;
    print_fetch_failures(&report);
    report.data
}

fn print_fetch_failures(report: &FetchReport) {
    for (name, e) in &report.failures {
        eprintln!("Could not load range '{}': {}", name, e);
    }
}

async fn run_pipeline(
    config: &AppConfig,
    storage: &StorageConfig,
    source: &SourceArgs,
) -> Result<PipelineReport> {
    let data = if source.offline || source.snapshot.is_some() {
        let path = source
            .snapshot
            .clone()
            .unwrap_or_else(|| storage.snapshot_path());
        let snapshot = SnapshotSource::open(&path)
            .with_context(|| format!("Failed to open snapshot {:?}", path))?;
        load_ranges(&snapshot, config).await
    } else {
        fetch_live(config, storage, None).await?
    };

    Ok(Pipeline::from_config(config).run(&data)?)
}

fn find_player<'a>(
    report: &'a PipelineReport,
    name: &str,
) -> Result<&'a hearts_tracker::Player> {
    report
        .registry
        .find_by_first_name(name)
        .with_context(|| format!("No player named '{}' in the roster", name))
}

fn print_problems(report: &PipelineReport) {
    for e in &report.roster_errors {
        eprintln!("Roster: {}", e);
    }
    for name in &report.missing_ranges {
        eprintln!("Range '{}' was not loaded", name);
    }
    for failure in &report.failures {
        eprintln!("Failed: {}", failure);
    }
}
