//! Allocation façade
//!
//! Orchestrates candidate filtering, payoff matrix construction, weight
//! optimization and stake discretization into a single stateless operation,
//! handling the degenerate no-candidate and solver-failure cases.

use tracing::{debug, warn};

use super::candidates::{filter_candidates, QuoteMap};
use super::optimizer::{RiskAdjustedOptimizer, SolverOptions};
use super::payoff::PayoffMatrix;
use super::stakes::{discretize, BetPlan};
use crate::error::{validate_odds, validate_probability, AllocError};

/// Allocation settings, all with defaults
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Budget per race in currency units
    pub budget: i64,
    /// Minimum predicted win probability for a candidate to be eligible
    pub pred_threshold: f64,
    /// Minimum market odds for a candidate to be eligible
    pub odds_threshold: f64,
    /// Minimum target payout ratio for the profit-floor constraint
    pub exceed_profit_rate: f64,
    /// Smallest indivisible stake denomination
    pub unit: i64,
    pub solver: SolverOptions,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            budget: 1000,
            pred_threshold: 0.0,
            odds_threshold: 1.0,
            exceed_profit_rate: 1.1,
            unit: 100,
            solver: SolverOptions::default(),
        }
    }
}

impl AllocatorConfig {
    /// Fail fast on a malformed configuration, before any optimization.
    pub fn validate(&self) -> Result<(), AllocError> {
        if self.unit <= 0 {
            return Err(AllocError::ConfigError(format!(
                "Unit must be positive, got {}",
                self.unit
            )));
        }
        if self.budget < self.unit {
            return Err(AllocError::ConfigError(format!(
                "Budget must be at least one unit ({}), got {}",
                self.unit, self.budget
            )));
        }
        if !self.pred_threshold.is_finite() || !self.odds_threshold.is_finite() {
            return Err(AllocError::ConfigError(
                "Thresholds must be finite".to_string(),
            ));
        }
        if !self.exceed_profit_rate.is_finite() || self.exceed_profit_rate < 0.0 {
            return Err(AllocError::ConfigError(format!(
                "Target payout ratio must be non-negative, got {}",
                self.exceed_profit_rate
            )));
        }
        if self.solver.sd_tolerance < 0.0 || self.solver.feasibility_tol < 0.0 {
            return Err(AllocError::ConfigError(
                "Solver tolerances must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// A budget allocation strategy: one operation from a probability mapping
/// and an odds mapping to a budget-conserving stake plan.
///
/// `WinBetAllocator` is the single-selection win variant; combination-bet
/// variants would parameterize the ticket generation inside the payoff
/// matrix instead.
pub trait Allocator {
    fn allocate(&self, probabilities: &QuoteMap, odds: &QuoteMap)
        -> Result<BetPlan, AllocError>;
}

/// Win-bet allocator over mutually-exclusive selections
#[derive(Debug, Clone, Default)]
pub struct WinBetAllocator {
    pub config: AllocatorConfig,
}

impl WinBetAllocator {
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }
}

impl Allocator for WinBetAllocator {
    /// Produce the stake plan for one race.
    ///
    /// Degenerate inputs are not errors: an empty candidate set parks the
    /// full budget in reserve, and solver non-convergence yields the
    /// all-reserve fallback plan with every candidate at zero. The returned
    /// plan always sums exactly to the configured budget.
    fn allocate(
        &self,
        probabilities: &QuoteMap,
        odds: &QuoteMap,
    ) -> Result<BetPlan, AllocError> {
        self.config.validate()?;
        for (id, &p) in probabilities {
            validate_probability(id, p)?;
        }
        for (id, &o) in odds {
            validate_odds(id, o)?;
        }

        let candidates = filter_candidates(
            probabilities,
            odds,
            self.config.pred_threshold,
            self.config.odds_threshold,
        )?;

        if candidates.is_empty() {
            debug!("no eligible candidates, parking the full budget in reserve");
            return Ok(BetPlan::all_reserve(self.config.budget));
        }

        debug!(candidates = candidates.len(), "optimizing stake weights");
        let matrix = PayoffMatrix::for_win_bets(&candidates.odds());
        let outcome = RiskAdjustedOptimizer::new(self.config.solver).solve(
            &matrix,
            &candidates,
            self.config.budget,
            self.config.unit,
            self.config.exceed_profit_rate,
        );

        if !outcome.converged {
            warn!("solver did not converge, falling back to the all-reserve plan");
            return Ok(BetPlan::fallback(&candidates.ids(), self.config.budget));
        }

        Ok(discretize(
            &candidates,
            &outcome.weights,
            self.config.budget,
            self.config.unit,
        ))
    }
}
