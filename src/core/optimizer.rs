//! Risk-adjusted weight optimization
//!
//! Chooses fractional stake weights (one per candidate plus reserve)
//! maximizing a Sharpe-like ratio of the weighted net payoff across the
//! winning scenarios implied by the predictions, subject to a budget-share
//! bound, a profit floor and a minimum-denomination feasibility constraint.
//!
//! The constraints contain a rounding step and are not differentiable, so
//! the problem is solved derivative-free: Nelder-Mead over box bounds
//! [0, 1]^(n+1) with the constraints as quadratic soft penalties. Failure to
//! converge is not an error; the caller takes the fallback path.

use argmin::core::{CostFunction, Error, Executor, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;
use ndarray::{Array1, Array2};
use tracing::{debug, warn};

use super::candidates::CandidateSet;
use super::payoff::PayoffMatrix;
use super::stakes::rounded_stake;

/// Variance below this is treated as no dispersion at all
const ZERO_VARIANCE_EPS: f64 = 1e-12;

/// Solver knobs
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    /// Maximum Nelder-Mead iterations
    pub max_iters: u64,
    /// Weight applied to squared constraint and bound violations
    pub penalty_weight: f64,
    /// Simplex standard-deviation tolerance for convergence
    pub sd_tolerance: f64,
    /// Tolerance when checking the returned point against the constraints
    pub feasibility_tol: f64,
    /// Offset of the initial simplex vertices from the uniform start
    pub simplex_step: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            penalty_weight: 1000.0,
            sd_tolerance: 1e-8,
            feasibility_tol: 1e-6,
            simplex_step: 0.05,
        }
    }
}

/// Raw weight vector and termination report
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    /// One weight per candidate plus the reserve in the last slot
    pub weights: Vec<f64>,
    /// False when the solver stopped for any reason other than convergence,
    /// or when the returned point is not feasible
    pub converged: bool,
    pub iterations: u64,
    pub cost: f64,
}

/// The allocation problem in penalty form
#[derive(Clone)]
struct AllocationProblem {
    /// Net payoff matrix, n x (n+1)
    net: Array2<f64>,
    probabilities: Array1<f64>,
    odds: Vec<f64>,
    budget: i64,
    unit: i64,
    target_rate: f64,
    penalty_weight: f64,
}

impl AllocationProblem {
    /// Scenario values v_i = p_i * (N w)_i
    fn scenario_values(&self, w: &[f64]) -> Array1<f64> {
        let w = Array1::from(w.to_vec());
        &self.probabilities * &self.net.dot(&w)
    }

    /// Sharpe-like loss: -mean(v) / sqrt(var(v)), with an explicit branch
    /// resolving to plain -mean(v) when the scenario values coincide. The
    /// variance uses the n-1 denominator.
    fn objective(&self, w: &[f64]) -> f64 {
        let v = self.scenario_values(w);
        let n = v.len();
        let mean = v.sum() / n as f64;
        if n < 2 {
            return -mean;
        }
        let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
        if var <= ZERO_VARIANCE_EPS {
            -mean
        } else {
            -mean / var.sqrt()
        }
    }

    /// Budget-share bound `1 - sum(w) >= 0`. An inequality, not an
    /// equality: the solver is free to leave weight unassigned.
    fn budget_share(&self, w: &[f64]) -> f64 {
        1.0 - w.iter().sum::<f64>()
    }

    /// Aggregate profit-floor shortfall. Every candidate whose rounded
    /// stake is at least one unit must return at least
    /// `target_rate * budget * (1 - reserve_units)` on a win; violators
    /// contribute their negative shortfall to a single soft constraint.
    fn profit_floor(&self, w: &[f64]) -> f64 {
        let n = self.odds.len();
        let reserve_units = (w[n] * self.budget as f64 / self.unit as f64).round();

        let mut shortfall = 0.0;
        for i in 0..n {
            let stake = rounded_stake(w[i], self.budget, self.unit);
            if stake > 0 {
                let exceed_profit = stake as f64 * self.odds[i]
                    - self.target_rate * self.budget as f64 * (1.0 - reserve_units);
                if exceed_profit < 0.0 {
                    shortfall += exceed_profit;
                }
            }
        }
        shortfall
    }

    /// Positive weights too small to round up to one unit accumulate
    /// negatively, discouraging practically unstakeable slivers.
    fn min_denomination(&self, w: &[f64]) -> f64 {
        let n = self.odds.len();
        let mut loss = 0.0;
        for i in 0..n {
            if w[i] > 0.0 && rounded_stake(w[i], self.budget, self.unit) == 0 {
                loss -= w[i];
            }
        }
        loss
    }

    /// All constraints as `>= 0` feasibility values
    fn constraints(&self, w: &[f64]) -> [f64; 3] {
        [
            self.budget_share(w),
            self.profit_floor(w),
            self.min_denomination(w),
        ]
    }

    fn penalty(&self, w: &[f64]) -> f64 {
        let mut penalty = 0.0;
        for g in self.constraints(w) {
            let violation = (-g).max(0.0);
            penalty += violation * violation;
        }
        for &x in w {
            let below = (-x).max(0.0);
            let above = (x - 1.0).max(0.0);
            penalty += below * below + above * above;
        }
        penalty * self.penalty_weight
    }

    fn is_feasible(&self, w: &[f64], tol: f64) -> bool {
        self.constraints(w).iter().all(|&g| g >= -tol)
            && w.iter().all(|&x| x >= -tol && x <= 1.0 + tol)
    }
}

impl CostFunction for AllocationProblem {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, w: &Self::Param) -> Result<Self::Output, Error> {
        let cost = self.objective(w) + self.penalty(w);
        // Keep the simplex ordering well defined even if a pathological
        // point produces a non-finite value.
        if cost.is_finite() {
            Ok(cost)
        } else {
            Ok(f64::MAX)
        }
    }
}

/// Nelder-Mead driver for the allocation problem
pub struct RiskAdjustedOptimizer {
    options: SolverOptions,
}

impl RiskAdjustedOptimizer {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    /// Solve for the stake weights of a non-empty candidate set.
    ///
    /// Never errors: non-convergence is reported through the outcome flag
    /// and handled by the caller's fallback path.
    pub fn solve(
        &self,
        matrix: &PayoffMatrix,
        candidates: &CandidateSet,
        budget: i64,
        unit: i64,
        target_rate: f64,
    ) -> SolverOutcome {
        let dim = candidates.len() + 1;

        let problem = AllocationProblem {
            net: matrix.net(),
            probabilities: Array1::from(candidates.probabilities()),
            odds: candidates.odds(),
            budget,
            unit,
            target_rate,
            penalty_weight: self.options.penalty_weight,
        };
        let checker = problem.clone();

        // Uniform start plus one offset vertex per dimension
        let x0 = vec![1.0 / dim as f64; dim];
        let mut simplex = vec![x0.clone()];
        for j in 0..dim {
            let mut vertex = x0.clone();
            vertex[j] += self.options.simplex_step;
            simplex.push(vertex);
        }

        let result = NelderMead::new(simplex)
            .with_sd_tolerance(self.options.sd_tolerance)
            .and_then(|solver| {
                Executor::new(problem, solver)
                    .configure(|state| state.max_iters(self.options.max_iters))
                    .run()
            });

        match result {
            Ok(res) => {
                let state = res.state();
                let weights = state.best_param.clone().unwrap_or(x0);
                let converged = matches!(
                    state.termination_status,
                    TerminationStatus::Terminated(TerminationReason::SolverConverged)
                ) && state.best_cost.is_finite()
                    && checker.is_feasible(&weights, self.options.feasibility_tol);

                debug!(
                    iterations = state.iter,
                    cost = state.best_cost,
                    converged,
                    "weight optimization finished"
                );

                SolverOutcome {
                    weights,
                    converged,
                    iterations: state.iter,
                    cost: state.best_cost,
                }
            }
            Err(e) => {
                warn!("weight optimization failed: {}", e);
                SolverOutcome {
                    weights: x0,
                    converged: false,
                    iterations: 0,
                    cost: f64::NAN,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::candidates::{filter_candidates, QuoteMap};

    fn fixture() -> (PayoffMatrix, CandidateSet) {
        let probabilities: QuoteMap =
            [("1".to_string(), 0.1), ("2".to_string(), 0.5)].into_iter().collect();
        let odds: QuoteMap =
            [("1".to_string(), 2.0), ("2".to_string(), 3.0)].into_iter().collect();
        let candidates = filter_candidates(&probabilities, &odds, 0.0, 1.0).unwrap();
        let matrix = PayoffMatrix::for_win_bets(&candidates.odds());
        (matrix, candidates)
    }

    fn problem() -> AllocationProblem {
        let (matrix, candidates) = fixture();
        AllocationProblem {
            net: matrix.net(),
            probabilities: Array1::from(candidates.probabilities()),
            odds: candidates.odds(),
            budget: 1000,
            unit: 100,
            target_rate: 1.1,
            penalty_weight: 1000.0,
        }
    }

    #[test]
    fn test_objective_hand_computed() {
        let p = problem();
        // N = [[1, -1, 0], [-1, 2, 0]], w = [0.1, 0.5, 0.4]
        // v = [0.1 * -0.4, 0.5 * 0.9] = [-0.04, 0.45]
        // mean = 0.205, sample var = 0.12005
        let objective = p.objective(&[0.1, 0.5, 0.4]);
        let expected = -0.205 / 0.12005f64.sqrt();
        assert!((objective - expected).abs() < 1e-10);
    }

    #[test]
    fn test_objective_zero_variance_resolves_to_mean() {
        let mut p = problem();
        p.probabilities = Array1::from(vec![0.0, 0.0]);

        // All scenario values are zero: no division failure, plain mean.
        let objective = p.objective(&[0.3, 0.3, 0.4]);
        assert!(objective.is_finite());
        assert_eq!(objective, 0.0);
    }

    #[test]
    fn test_budget_share_is_inequality_slack() {
        let p = problem();
        assert!((p.budget_share(&[0.2, 0.3, 0.1]) - 0.4).abs() < 1e-12);
        assert!(p.budget_share(&[0.5, 0.5, 0.5]) < 0.0);
    }

    #[test]
    fn test_profit_floor_collects_shortfalls() {
        let p = problem();
        // w = [0.1, 0.0, 0.0]: stake 100 on odds 2.0, no reserve units.
        // exceed_profit = 200 - 1.1 * 1000 * (1 - 0) = -900
        let g = p.profit_floor(&[0.1, 0.0, 0.0]);
        assert!((g - (-900.0)).abs() < 1e-9);

        // A single reserve unit zeroes the floor term entirely.
        let g = p.profit_floor(&[0.1, 0.0, 0.1]);
        assert!(g >= 0.0);
    }

    #[test]
    fn test_min_denomination_penalizes_slivers() {
        let p = problem();
        // 0.004 of a 1000 budget rounds to no stake at all
        let g = p.min_denomination(&[0.004, 0.5, 0.0]);
        assert!((g - (-0.004)).abs() < 1e-12);

        let g = p.min_denomination(&[0.1, 0.5, 0.0]);
        assert_eq!(g, 0.0);
    }

    #[test]
    fn test_solve_well_posed_input_converges() {
        let (matrix, candidates) = fixture();
        let optimizer = RiskAdjustedOptimizer::new(SolverOptions::default());

        let outcome = optimizer.solve(&matrix, &candidates, 1000, 100, 1.1);

        assert!(outcome.converged);
        assert_eq!(outcome.weights.len(), 3);
        let tol = SolverOptions::default().feasibility_tol;
        for &w in &outcome.weights {
            assert!(w >= -tol && w <= 1.0 + tol);
        }
        assert!(outcome.weights.iter().sum::<f64>() <= 1.0 + tol);
    }

    #[test]
    fn test_solve_zero_iterations_reports_non_convergence() {
        let (matrix, candidates) = fixture();
        let options = SolverOptions {
            max_iters: 0,
            ..Default::default()
        };
        let optimizer = RiskAdjustedOptimizer::new(options);

        let outcome = optimizer.solve(&matrix, &candidates, 1000, 100, 1.1);

        assert!(!outcome.converged);
    }
}
