//! Payoff matrix construction
//!
//! Turns the filtered candidates' odds into an n x (n+1) matrix describing
//! the monetary outcome of every possible winning-selection scenario under a
//! stake-weight vector. Row i models "candidate i wins"; the last column is
//! the reserve, which contributes a constant risk-free unit in every
//! scenario.

use ndarray::Array2;

/// Tickets that pay out in the scenario where candidate `scenario` wins.
///
/// A win ticket pays only when its own candidate wins; combination bet types
/// would map one scenario to several paying tickets.
fn winning_tickets(scenario: usize) -> [usize; 1] {
    [scenario]
}

/// Gross payoff matrix for a candidate set
///
/// Entries are the raw odds values, not net of stake, so the matrix is
/// reusable for display and debugging. The net transform (subtract 1
/// elementwise) is applied by the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoffMatrix {
    gross: Array2<f64>,
}

impl PayoffMatrix {
    /// Build the matrix for single-selection win bets from the odds vector,
    /// order-aligned with the candidate set.
    pub fn for_win_bets(odds: &[f64]) -> Self {
        let n = odds.len();
        let mut gross = Array2::zeros((n, n + 1));

        for scenario in 0..n {
            for &ticket in winning_tickets(scenario).iter() {
                gross[[scenario, ticket]] = odds[ticket];
            }
            // Reserve column: one unit back regardless of outcome
            gross[[scenario, n]] = 1.0;
        }

        Self { gross }
    }

    /// Number of candidates (matrix rows)
    pub fn n_candidates(&self) -> usize {
        self.gross.nrows()
    }

    pub fn gross(&self) -> &Array2<f64> {
        &self.gross
    }

    /// Net payoff per unit weight: gross minus 1 elementwise, so the
    /// diagonal holds `odds - 1`, losing columns hold -1 and the reserve
    /// column holds 0.
    pub fn net(&self) -> Array2<f64> {
        &self.gross - 1.0
    }
}
