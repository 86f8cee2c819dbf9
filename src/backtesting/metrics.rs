//! Backtest Metrics
//!
//! Calculate metrics such as ROI, hit rate, drawdown, etc.

use super::simulator::PlanRecord;
use serde::{Deserialize, Serialize};

/// Backtest evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    // Basic metrics
    pub staked_races: usize,
    pub winning_races: usize,
    pub hit_rate: f64,
    pub roi: f64,

    // Averages
    pub avg_staked: f64,
    pub avg_winner_odds: f64,

    // Risk metrics
    pub profit_factor: f64,
    pub max_drawdown: i64,
    pub max_drawdown_pct: f64,

    // Win/Loss
    pub gross_profit: i64,
    pub gross_loss: i64,
    pub net_profit: i64,
}

impl Default for BacktestMetrics {
    fn default() -> Self {
        Self {
            staked_races: 0,
            winning_races: 0,
            hit_rate: 0.0,
            roi: 0.0,
            avg_staked: 0.0,
            avg_winner_odds: 0.0,
            profit_factor: 0.0,
            max_drawdown: 0,
            max_drawdown_pct: 0.0,
            gross_profit: 0,
            gross_loss: 0,
            net_profit: 0,
        }
    }
}

/// Calculate metrics from staked race records
pub fn calculate_metrics(plans: &[PlanRecord], total_staked: i64) -> BacktestMetrics {
    if plans.is_empty() {
        return BacktestMetrics::default();
    }

    // Basic metrics
    let staked_races = plans.len();
    let winning_races = plans.iter().filter(|p| p.won).count();
    let hit_rate = winning_races as f64 / staked_races as f64;

    // Averages
    let avg_staked: f64 =
        plans.iter().map(|p| p.staked as f64).sum::<f64>() / staked_races as f64;
    let avg_winner_odds: f64 =
        plans.iter().map(|p| p.winner_odds).sum::<f64>() / staked_races as f64;

    // Profit/Loss calculation
    let profits: Vec<i64> = plans.iter().map(|p| p.profit).collect();
    let gross_profit: i64 = profits.iter().filter(|&&p| p > 0).sum();
    let gross_loss: i64 = profits.iter().filter(|&&p| p < 0).map(|p| p.abs()).sum();
    let net_profit: i64 = profits.iter().sum();

    // Profit Factor
    let profit_factor = if gross_loss > 0 {
        gross_profit as f64 / gross_loss as f64
    } else if gross_profit > 0 {
        f64::INFINITY
    } else {
        0.0
    };

    // Drawdown calculation
    let mut cumulative: Vec<i64> = Vec::with_capacity(profits.len());
    let mut sum = 0i64;
    for &p in &profits {
        sum += p;
        cumulative.push(sum);
    }

    let mut peak = i64::MIN;
    let mut max_drawdown = 0i64;
    for &value in &cumulative {
        if value > peak {
            peak = value;
        }
        let drawdown = peak - value;
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
        }
    }

    // Drawdown percentage
    let max_drawdown_pct = if total_staked > 0 {
        max_drawdown as f64 / total_staked as f64
    } else {
        0.0
    };

    // ROI
    let roi = if total_staked > 0 {
        net_profit as f64 / total_staked as f64
    } else {
        0.0
    };

    BacktestMetrics {
        staked_races,
        winning_races,
        hit_rate,
        roi,
        avg_staked,
        avg_winner_odds,
        profit_factor,
        max_drawdown,
        max_drawdown_pct,
        gross_profit,
        gross_loss,
        net_profit,
    }
}

/// Calculate Sharpe ratio over per-race returns
pub fn calculate_sharpe_ratio(plans: &[PlanRecord], risk_free_rate: f64) -> f64 {
    if plans.is_empty() {
        return 0.0;
    }

    let returns: Vec<f64> = plans
        .iter()
        .filter(|p| p.staked > 0)
        .map(|p| p.profit as f64 / p.staked as f64)
        .collect();
    if returns.is_empty() {
        return 0.0;
    }

    let mean_return: f64 = returns.iter().sum::<f64>() / returns.len() as f64;

    let variance: f64 = returns
        .iter()
        .map(|r| (r - mean_return).powi(2))
        .sum::<f64>()
        / returns.len() as f64;

    let std_return = variance.sqrt();

    if std_return == 0.0 {
        return 0.0;
    }

    (mean_return - risk_free_rate) / std_return
}

/// Analysis results by dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionAnalysis {
    pub key: String,
    pub races: usize,
    pub wins: usize,
    pub hit_rate: f64,
    pub staked: i64,
    pub profit: i64,
    pub roi: f64,
}

fn analyze_group(key: String, group: &[&PlanRecord]) -> DimensionAnalysis {
    let total = group.len();
    let wins = group.iter().filter(|p| p.won).count();
    let staked: i64 = group.iter().map(|p| p.staked).sum();
    let profit: i64 = group.iter().map(|p| p.profit).sum();

    DimensionAnalysis {
        key,
        races: total,
        wins,
        hit_rate: if total > 0 {
            wins as f64 / total as f64
        } else {
            0.0
        },
        staked,
        profit,
        roi: if staked > 0 {
            profit as f64 / staked as f64
        } else {
            0.0
        },
    }
}

/// Analyze results by track
pub fn analyze_by_track(plans: &[PlanRecord]) -> Vec<DimensionAnalysis> {
    use std::collections::HashMap;

    let mut grouped: HashMap<u8, Vec<&PlanRecord>> = HashMap::new();
    for plan in plans {
        grouped.entry(plan.track_code).or_default().push(plan);
    }

    let mut results: Vec<DimensionAnalysis> = grouped
        .iter()
        .map(|(track, group)| analyze_group(track.to_string(), group))
        .collect();

    results.sort_by(|a, b| a.key.cmp(&b.key));
    results
}

/// Analyze results by the winner's odds range
pub fn analyze_by_odds_range(plans: &[PlanRecord]) -> Vec<DimensionAnalysis> {
    use std::collections::HashMap;

    let mut grouped: HashMap<&str, Vec<&PlanRecord>> = HashMap::new();
    for plan in plans {
        let key = if plan.winner_odds < 5.0 {
            "low (<5)"
        } else if plan.winner_odds < 20.0 {
            "mid (5-20)"
        } else {
            "high (>20)"
        };
        grouped.entry(key).or_default().push(plan);
    }

    let mut results: Vec<DimensionAnalysis> = grouped
        .iter()
        .map(|(key, group)| analyze_group(key.to_string(), group))
        .collect();

    results.sort_by(|a, b| a.key.cmp(&b.key));
    results
}
