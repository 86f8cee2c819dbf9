//! Win odds JSON loading

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Win odds JSON structure
///
/// The `win` object is kept in file order: it is the market's candidate
/// order and indexes the allocator's payoff matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinOddsFile {
    pub date: u32,
    pub track_code: u8,
    pub race_no: u8,
    pub scraped_at: String,
    pub win: IndexMap<String, f64>,
}

/// Load win odds from a JSON file
///
/// Returns the id -> odds mapping in market order
pub fn load_win_odds<P: AsRef<Path>>(
    odds_dir: P,
    date: u32,
    track_code: u8,
    race_no: u8,
) -> Option<IndexMap<String, f64>> {
    let filename = format!("{}_{:02}_{:02}_win.json", date, track_code, race_no);
    let path = odds_dir.as_ref().join(&filename);

    let content = fs::read_to_string(&path).ok()?;
    let odds_file: WinOddsFile = serde_json::from_str(&content).ok()?;

    Some(odds_file.win)
}

/// Check if a win odds file exists
pub fn win_odds_exists<P: AsRef<Path>>(
    odds_dir: P,
    date: u32,
    track_code: u8,
    race_no: u8,
) -> bool {
    let filename = format!("{}_{:02}_{:02}_win.json", date, track_code, race_no);
    odds_dir.as_ref().join(&filename).exists()
}
