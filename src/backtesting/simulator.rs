//! Backtest Simulator
//!
//! Replays the allocator over historical race records to validate a
//! configuration's profitability before it ever touches a live budget.

use super::metrics::{calculate_metrics, BacktestMetrics};
use super::synthetic::SyntheticOddsGenerator;
use crate::core::allocator::{Allocator, AllocatorConfig, WinBetAllocator};
use crate::core::stakes::BetPlan;
use colored::Colorize;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Backtest configuration
#[derive(Debug, Clone, Default)]
pub struct BacktestConfig {
    pub allocator: AllocatorConfig,
    /// Generate synthetic odds for records without a market snapshot
    pub use_synthetic_odds: bool,
    /// Takeout margin for synthetic odds
    pub takeout_margin: Option<f64>,
}

/// One historical race: predictions, the odds snapshot at post time and the
/// actual winner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceRecord {
    pub date: u32,
    pub track_code: u8,
    pub race_no: u8,
    pub probabilities: IndexMap<String, f64>,
    #[serde(default)]
    pub odds: Option<IndexMap<String, f64>>,
    pub winner: String,
}

/// Outcome of one staked race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRecord {
    pub date: u32,
    pub track_code: u8,
    pub race_no: u8,
    /// Candidates carried into the plan
    pub candidates: usize,
    pub staked: i64,
    pub reserve: i64,
    /// Market odds of the actual winner
    pub winner_odds: f64,
    pub payout: i64,
    pub profit: i64,
    pub won: bool,
}

/// Backtest result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub plans: Vec<PlanRecord>,
    pub total_races: usize,
    /// Records without usable odds or rejected as invalid
    pub skipped_races: usize,
    pub races_with_bets: usize,
    pub total_staked: i64,
    pub total_payout: i64,
    pub metrics: Option<BacktestMetrics>,
}

impl BacktestResult {
    pub fn new() -> Self {
        Self {
            plans: Vec::new(),
            total_races: 0,
            skipped_races: 0,
            races_with_bets: 0,
            total_staked: 0,
            total_payout: 0,
            metrics: None,
        }
    }

    pub fn total_profit(&self) -> i64 {
        self.total_payout - self.total_staked
    }

    pub fn roi(&self) -> f64 {
        if self.total_staked == 0 {
            0.0
        } else {
            self.total_profit() as f64 / self.total_staked as f64
        }
    }

    pub fn finalize(&mut self) {
        self.metrics = Some(calculate_metrics(&self.plans, self.total_staked));
    }
}

impl Default for BacktestResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Replays the allocator race by race
pub struct BacktestSimulator {
    config: BacktestConfig,
    allocator: WinBetAllocator,
    synthetic: SyntheticOddsGenerator,
}

impl BacktestSimulator {
    pub fn new(config: BacktestConfig) -> Self {
        let allocator = WinBetAllocator::new(config.allocator.clone());
        let synthetic = config
            .takeout_margin
            .map(SyntheticOddsGenerator::new)
            .unwrap_or_default();
        Self {
            config,
            allocator,
            synthetic,
        }
    }

    /// Load every race record from a directory of JSON files and replay
    /// them in (date, track, race) order.
    pub fn run<P: AsRef<Path>>(&self, races_dir: P) -> std::io::Result<BacktestResult> {
        let mut records = Vec::new();

        for entry in std::fs::read_dir(races_dir.as_ref())? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let content = std::fs::read_to_string(&path)?;
                match serde_json::from_str::<RaceRecord>(&content) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("skipping unparsable race file {:?}: {}", path, e),
                }
            }
        }

        records.sort_by_key(|r| (r.date, r.track_code, r.race_no));
        Ok(self.run_records(&records))
    }

    /// Replay pre-loaded records
    pub fn run_records(&self, records: &[RaceRecord]) -> BacktestResult {
        let mut result = BacktestResult::new();

        for record in records {
            result.total_races += 1;

            let Some((plan, odds)) = self.plan_race(record) else {
                result.skipped_races += 1;
                continue;
            };

            let staked = plan.staked();
            if staked == 0 {
                continue;
            }
            result.races_with_bets += 1;

            let winner_odds = odds.get(&record.winner).copied().unwrap_or(0.0);
            let winner_stake = plan.stake(&record.winner);
            let payout = (winner_stake as f64 * winner_odds).round() as i64;

            result.total_staked += staked;
            result.total_payout += payout;
            result.plans.push(PlanRecord {
                date: record.date,
                track_code: record.track_code,
                race_no: record.race_no,
                candidates: plan.len().saturating_sub(1),
                staked,
                reserve: plan.reserve(),
                winner_odds,
                payout,
                profit: payout - staked,
                won: winner_stake > 0,
            });
        }

        result.finalize();
        result
    }

    fn plan_race(&self, record: &RaceRecord) -> Option<(BetPlan, IndexMap<String, f64>)> {
        let odds = match &record.odds {
            Some(odds) => odds.clone(),
            None if self.config.use_synthetic_odds => {
                self.synthetic.win_odds(&record.probabilities)
            }
            None => return None,
        };

        match self.allocator.allocate(&record.probabilities, &odds) {
            Ok(plan) => Some((plan, odds)),
            Err(e) => {
                warn!(
                    "skipping race {}/{}/{}: {}",
                    record.date, record.track_code, record.race_no, e
                );
                None
            }
        }
    }

    /// Print a human-readable summary of the result
    pub fn print_summary(&self, result: &BacktestResult) {
        println!("{}", "Backtest Summary:".yellow().bold());
        println!("{}", "-".repeat(40));
        println!("Total races:      {}", result.total_races);
        println!("Skipped races:    {}", result.skipped_races);
        println!("Races with bets:  {}", result.races_with_bets);
        println!("Total staked:     {}", result.total_staked);
        println!("Total payout:     {}", result.total_payout);

        let profit = result.total_profit();
        let profit_str = if profit >= 0 {
            format!("+{}", profit).green()
        } else {
            profit.to_string().red()
        };
        println!("Net profit:       {}", profit_str);
        println!("ROI:              {:.1}%", result.roi() * 100.0);

        if let Some(metrics) = &result.metrics {
            println!();
            println!("Hit rate:         {:.1}%", metrics.hit_rate * 100.0);
            println!("Profit factor:    {:.2}", metrics.profit_factor);
            println!(
                "Max drawdown:     {} ({:.1}%)",
                metrics.max_drawdown,
                metrics.max_drawdown_pct * 100.0
            );
        }
    }
}
