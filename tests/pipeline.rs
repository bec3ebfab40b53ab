use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use hearts_tracker::calculate::compare;
use hearts_tracker::config::{AppConfig, RangeConfig};
use hearts_tracker::fetch::{fetch_all, FetchError, GridSource, SheetData};
use hearts_tracker::pipeline::Pipeline;
use hearts_tracker::sheet::{ChunkError, SheetError, Side};
use hearts_tracker::models::RawGrid;
use hearts_tracker::storage::{
    read_snapshot, save_fetch, write_snapshot, SheetSnapshot, SnapshotSource,
};
use hearts_tracker::PlayerId;

const CONFIG: &str = r#"
    [sheet]
    sheet_id = "test-sheet"

    [[range]]
    name = "games"
    page = "Games"
    start = "A1"
    end = "K500"

    [[range]]
    name = "player_data"
    page = "Players"
    start = "A1"
    end = "F100"
"#;

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn roster() -> Vec<Vec<String>> {
    vec![
        row(&["Tag", "Notes", "Id", "First", "Last", "Rating"]),
        row(&["AL", "", "1", "Alice", "Liddell", "1500"]),
        row(&["BB", "", "2", "Bob", "Baker", "1450"]),
        row(&["CC", "", "3", "Carol", "Cole", "1600"]),
        row(&["DD", "", "4", "Dan", "Dunn", "1380"]),
        row(&["EE", "", "5", "Erin", "East", "1520.5"]),
    ]
}

/// Two blocks. The first has games 42 (left) and 43 (right). The second has
/// game 44 on the left with a bad label and game 45 on the right, and ends
/// without a blank row.
fn games() -> Vec<Vec<String>> {
    vec![
        row(&["42", "Alice", "Bob", "Carol", "Dan", "", "43", "Erin", "Bob", "Mallory"]),
        row(&["Old Rating", "1500", "1450", "1600", "1380", "", "Old Rating", "1520.5", "1450", "1400"]),
        row(&["New Rating", "1490", "1440", "1590", "1420", "", "New Rating", "1530", "1440", "1400"]),
        row(&["Right", "3", "8", "6", "0", "", "Right", "0", "9", "4"]),
        row(&["Left", "4", "5", "6", "1", "", "Left", "1", "9", "3"]),
        row(&["Across", "2", "7", "8", "3", "", "Across", "1", "3", "9"]),
        row(&["Hold", "3", "0", "0", "1", "", "Hold", "0", "0", "0"]),
        row(&["Total", "12", "20", "20", "5", "", "Total", "2", "21", "16"]),
        row(&["x", "scratch", "notes"]),
        vec![],
        row(&["44", "Alice", "Bob", "", "", "", "45", "Carol", "Dan"]),
        row(&["Old Rating", "1490", "1440", "", "", "", "Old Rating", "1590", "1420"]),
        row(&["New Rating", "1500", "1430", "", "", "", "New Rating", "1600", "1410"]),
        row(&["Rihgt", "1", "2", "", "", "", "Right", "5", "5"]),
        row(&["Left", "1", "2", "", "", "", "Left", "5", "5"]),
        row(&["Across", "1", "2", "", "", "", "Across", "5", "5"]),
        row(&["Hold", "1", "2", "", "", "", "Hold", "0", "0"]),
        row(&["Total", "4", "8", "", "", "", "Total", "15", "15"]),
    ]
}

fn sheet_data() -> SheetData {
    let mut data = SheetData::new();
    data.insert("player_data".to_string(), roster());
    data.insert("games".to_string(), games());
    data
}

#[tokio::test]
async fn test_snapshot_to_games() {
    let config = AppConfig::from_toml(CONFIG).unwrap();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("raw").join("sheet_snapshot.json");

    let snapshot = SheetSnapshot::new("test-sheet", sheet_data()).unwrap();
    write_snapshot(&path, &snapshot).unwrap();
    let source = SnapshotSource::new(read_snapshot(&path).unwrap());

    let fetched = fetch_all(&source, &config.ranges).await;
    assert!(fetched.failures.is_empty());

    let report = Pipeline::from_config(&config).run(&fetched.data).unwrap();

    assert_eq!(report.registry.len(), 5);
    assert!(report.roster_errors.is_empty());

    let ids: Vec<i64> = report.games.iter().map(|g| g.game_id).collect();
    assert_eq!(ids, vec![42, 43, 45]);

    let summaries: Vec<String> = report.games.iter().map(|g| g.to_string()).collect();
    assert_eq!(
        summaries,
        vec![
            "Game 42. Players: Alice, Bob, Carol, Dan\nWinner: Dan, 5 points".to_string(),
            "Game 43. Players: Erin, Bob\nWinner: Erin, 2 points".to_string(),
            "Game 45. Players: Carol, Dan\nWinner: Tie: Carol/Dan, 15 points".to_string(),
        ]
    );

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.side, Side::Left);
    assert_eq!(failure.game_id, Some(44));
    assert!(matches!(
        &failure.error,
        ChunkError::Sheet(SheetError::UnknownIdentifier { row: 14, label }) if label == "Rihgt"
    ));
}

#[test]
fn test_compare_in_rebuilt_game() {
    let report = Pipeline::default().run(&sheet_data()).unwrap();
    let game = report.game(42).unwrap();

    let dan = report.registry.find_by_first_name("Dan").unwrap();
    let carol = report.registry.find_by_first_name("Carol").unwrap();

    // Dan (1380) beat Carol (1600) by 15 points: 220/10 + 15/10
    let score = compare(dan, carol, game).unwrap();
    assert!((score - 23.5).abs() < 1e-9);

    // Carol as the favourite lost: -(22 + 1.5 * (1 + 220/75))
    let score = compare(carol, dan, game).unwrap();
    assert!((score + (22.0 + 1.5 * (1.0 + 220.0 / 75.0))).abs() < 1e-9);

    assert_eq!(game.rating_delta(PlayerId(4)), Some(40.0));
}

#[test]
fn test_unresolved_name_is_omitted() {
    let report = Pipeline::default().run(&sheet_data()).unwrap();
    let game = report.game(43).unwrap();

    assert_eq!(game.players.len(), 2);
    assert_eq!(game.points.len(), 2);
    assert!(game.points.keys().all(|id| game.has_player(*id)));
}

/// A live source whose roster range is unreachable.
struct RosterDown;

#[async_trait]
impl GridSource for RosterDown {
    fn name(&self) -> &'static str {
        "roster_down"
    }

    async fn fetch_range(&self, range: &RangeConfig) -> Result<RawGrid, FetchError> {
        if range.name == "games" {
            Ok(games())
        } else {
            Err(FetchError::HttpStatus {
                status: 403,
                message: "Forbidden".to_string(),
            })
        }
    }
}

#[tokio::test]
async fn test_failed_fetch_keeps_offline_snapshot_usable() {
    let config = AppConfig::from_toml(CONFIG).unwrap();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("raw").join("sheet_snapshot.json");

    let snapshot = SheetSnapshot::new("test-sheet", sheet_data()).unwrap();
    write_snapshot(&path, &snapshot).unwrap();

    let fetched = fetch_all(&RosterDown, &config.ranges).await;
    assert_eq!(fetched.failures.len(), 1);
    let data = save_fetch(&path, &config.sheet.sheet_id, fetched).unwrap();

    assert_eq!(read_snapshot(&path).unwrap(), snapshot);

    let live = Pipeline::from_config(&config).run(&data).unwrap();
    assert_eq!(live.registry.len(), 5);

    let source = SnapshotSource::open(&path).unwrap();
    let offline = fetch_all(&source, &config.ranges).await;
    let report = Pipeline::from_config(&config).run(&offline.data).unwrap();
    assert_eq!(report.games.len(), 3);
}
