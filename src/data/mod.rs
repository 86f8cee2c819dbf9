//! Data loading modules

pub mod odds_loader;
pub mod pred_loader;

// Re-export commonly used types
pub use odds_loader::{load_win_odds, win_odds_exists, WinOddsFile};
pub use pred_loader::{PredictionBook, RacePrediction};
