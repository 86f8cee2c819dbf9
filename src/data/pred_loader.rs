//! Prediction book loading
//!
//! Model predictions arrive as a single JSON file keyed year -> monthday ->
//! post time, one entry per race with a win probability per candidate. The
//! file is produced upstream; this loader only reads it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One race's predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RacePrediction {
    pub track_code: u8,
    pub track: String,
    pub race_no: u8,
    #[serde(default)]
    pub distance: Option<u32>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Win probability per candidate id, in card order
    pub pred: IndexMap<String, f64>,
}

impl RacePrediction {
    /// Human-readable race label for notifications
    pub fn label(&self) -> String {
        let mut label = format!("{} {}R", self.track, self.race_no);
        if let Some(grade) = &self.grade {
            label.push_str(&format!(" {}", grade));
        }
        if let Some(distance) = self.distance {
            label.push_str(&format!(" {}m", distance));
        }
        if let Some(title) = &self.title {
            label.push_str(&format!(" {}", title));
        }
        label
    }
}

/// All predictions currently published, keyed year -> monthday ("MMDD") ->
/// post time ("HHMM")
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionBook {
    days: HashMap<String, HashMap<String, IndexMap<String, RacePrediction>>>,
}

impl PredictionBook {
    /// Load the prediction book from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Option<Self> {
        let content = fs::read_to_string(path.as_ref()).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Prediction for the race posted at `time` on the given day
    pub fn get_race(&self, year: &str, monthday: &str, time: &str) -> Option<&RacePrediction> {
        self.days.get(year)?.get(monthday)?.get(time)
    }

    /// All races on a day, sorted by post time
    pub fn races_on(&self, year: &str, monthday: &str) -> Vec<(&str, &RacePrediction)> {
        let mut races: Vec<(&str, &RacePrediction)> = self
            .days
            .get(year)
            .and_then(|months| months.get(monthday))
            .map(|times| {
                times
                    .iter()
                    .map(|(time, race)| (time.as_str(), race))
                    .collect()
            })
            .unwrap_or_default();

        races.sort_by(|a, b| a.0.cmp(b.0));
        races
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK_JSON: &str = r#"{
        "2024": {
            "0115": {
                "1540": {
                    "track_code": 5,
                    "track": "東京",
                    "race_no": 11,
                    "distance": 1600,
                    "grade": "G3",
                    "title": "京成杯",
                    "pred": {"1": 0.1, "2": 0.5, "3": 0.05}
                },
                "1210": {
                    "track_code": 8,
                    "track": "京都",
                    "race_no": 5,
                    "pred": {"1": 0.3, "2": 0.2}
                }
            }
        }
    }"#;

    #[test]
    fn test_get_race() {
        let book: PredictionBook = serde_json::from_str(BOOK_JSON).unwrap();

        let race = book.get_race("2024", "0115", "1540").unwrap();
        assert_eq!(race.track, "東京");
        assert_eq!(race.race_no, 11);
        assert_eq!(race.pred.len(), 3);
        assert!((race.pred["2"] - 0.5).abs() < 1e-12);

        assert!(book.get_race("2024", "0116", "1540").is_none());
        assert!(book.get_race("2023", "0115", "1540").is_none());
    }

    #[test]
    fn test_pred_order_follows_card() {
        let book: PredictionBook = serde_json::from_str(BOOK_JSON).unwrap();

        let race = book.get_race("2024", "0115", "1540").unwrap();
        let ids: Vec<&String> = race.pred.keys().collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_races_on_sorted_by_post_time() {
        let book: PredictionBook = serde_json::from_str(BOOK_JSON).unwrap();

        let races = book.races_on("2024", "0115");
        let times: Vec<&str> = races.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec!["1210", "1540"]);

        assert!(book.races_on("2024", "0301").is_empty());
    }

    #[test]
    fn test_race_label() {
        let book: PredictionBook = serde_json::from_str(BOOK_JSON).unwrap();

        let race = book.get_race("2024", "0115", "1540").unwrap();
        assert_eq!(race.label(), "東京 11R G3 1600m 京成杯");

        let race = book.get_race("2024", "0115", "1210").unwrap();
        assert_eq!(race.label(), "京都 5R");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(PredictionBook::load("/nonexistent/pred.json").is_none());
    }
}
