//! Synthetic Odds Generation
//!
//! Generate realistic win odds for backtesting when historical odds are
//! unavailable.

use indexmap::IndexMap;

/// Synthetic win odds generator
pub struct SyntheticOddsGenerator {
    /// Commission rate (takeout) removed from the fair odds
    margin: f64,
}

impl SyntheticOddsGenerator {
    /// Create a new synthetic odds generator
    ///
    /// # Arguments
    /// * `margin` - Commission rate (takeout). Default is 0.20 (20%)
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    /// Win odds for a single candidate
    ///
    /// Odds = 1 / probability x (1 - takeout), rounded to 1 decimal and
    /// floored at the 1.0 minimum payout the pool ever posts.
    pub fn win_odds_for(&self, probability: f64) -> f64 {
        let prob = probability.max(0.001);
        let fair_odds = 1.0 / prob;
        let actual_odds = fair_odds * (1.0 - self.margin);

        ((actual_odds * 10.0).round() / 10.0).max(1.0)
    }

    /// Win odds for a full candidate map, in the same order
    pub fn win_odds(&self, probabilities: &IndexMap<String, f64>) -> IndexMap<String, f64> {
        probabilities
            .iter()
            .map(|(id, &p)| (id.clone(), self.win_odds_for(p)))
            .collect()
    }
}

impl Default for SyntheticOddsGenerator {
    fn default() -> Self {
        Self::new(0.20) // standard win-pool takeout
    }
}
