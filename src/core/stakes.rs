//! Stake discretization and budget correction
//!
//! Converts the optimizer's fractional weights into integer stakes on a
//! fixed denomination, then repairs the plan so the total always equals the
//! budget exactly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::candidates::CandidateSet;

/// Sentinel id for the unstaked portion of the budget
pub const RESERVE: &str = "reserve";

/// Final stake plan: candidate id (plus the reserve sentinel) to a
/// non-negative integer amount. Non-reserve amounts are multiples of the
/// configured unit; the entries always sum exactly to the budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetPlan {
    stakes: IndexMap<String, i64>,
}

impl BetPlan {
    /// Plan that parks the full budget in reserve, with no candidate keys.
    /// Returned when no candidate survives the filter.
    pub fn all_reserve(budget: i64) -> Self {
        let mut stakes = IndexMap::with_capacity(1);
        stakes.insert(RESERVE.to_string(), budget);
        Self { stakes }
    }

    /// Fallback plan after solver failure: every candidate at zero, the full
    /// budget in reserve.
    pub fn fallback(ids: &[&str], budget: i64) -> Self {
        let mut stakes = IndexMap::with_capacity(ids.len() + 1);
        for id in ids {
            stakes.insert(id.to_string(), 0);
        }
        stakes.insert(RESERVE.to_string(), budget);
        Self { stakes }
    }

    pub fn stake(&self, id: &str) -> i64 {
        self.stakes.get(id).copied().unwrap_or(0)
    }

    pub fn reserve(&self) -> i64 {
        self.stake(RESERVE)
    }

    /// Sum of every entry including the reserve
    pub fn total(&self) -> i64 {
        self.stakes.values().sum()
    }

    /// Total amount actually wagered on candidates
    pub fn staked(&self) -> i64 {
        self.total() - self.reserve()
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.stakes.iter().map(|(id, &stake)| (id.as_str(), stake))
    }

    /// Entries with a positive amount, the part worth notifying
    pub fn non_zero(&self) -> impl Iterator<Item = (&str, i64)> {
        self.iter().filter(|&(_, stake)| stake > 0)
    }
}

/// Round a fractional weight to a monetary stake on the unit grid
pub fn rounded_stake(weight: f64, budget: i64, unit: i64) -> i64 {
    (weight * budget as f64 / unit as f64).round() as i64 * unit
}

/// Budget correction pass over provisional stakes.
///
/// `stakes` holds one entry per candidate plus the reserve in the last slot;
/// `odds` is aligned, with the reserve's odds defined as 1. All entries are
/// expected non-negative. A non-reserve stake is folded back into the
/// reserve whenever its own potential return is smaller than the budget
/// headroom not already parked in reserve (inherited comparison, see
/// DESIGN.md); afterwards the reserve absorbs the rounding residue so the
/// total equals the budget exactly. The pass repeats until nothing changes,
/// so the output is a fixed point of the correction.
pub fn correct_not_exceed(stakes: &mut [i64], odds: &[f64], budget: i64) {
    let n = stakes.len() - 1;
    debug_assert_eq!(odds.len(), n + 1);

    loop {
        let mut changed = false;

        let available = budget - stakes[n];
        for i in 0..n {
            if stakes[i] != 0 && (stakes[i] as f64) * odds[i] < available as f64 {
                stakes[n] += stakes[i];
                stakes[i] = 0;
                changed = true;
            }
        }

        // Rounded stakes need not sum to the budget on their own.
        let staked: i64 = stakes[..n].iter().sum();
        if stakes[n] != budget - staked {
            stakes[n] = budget - staked;
            changed = true;
        }

        // Rounding overshot the budget: fold the weakest stakes back.
        while stakes[n] < 0 {
            let weakest = (0..n)
                .filter(|&i| stakes[i] > 0)
                .min_by(|&a, &b| {
                    let ra = stakes[a] as f64 * odds[a];
                    let rb = stakes[b] as f64 * odds[b];
                    ra.total_cmp(&rb)
                });
            match weakest {
                Some(i) => {
                    stakes[n] += stakes[i];
                    stakes[i] = 0;
                    changed = true;
                }
                None => break,
            }
        }

        if !changed {
            break;
        }
    }
}

/// Turn the solved weight vector into the final corrected plan
pub fn discretize(
    candidates: &CandidateSet,
    weights: &[f64],
    budget: i64,
    unit: i64,
) -> BetPlan {
    let n = candidates.len();
    debug_assert_eq!(weights.len(), n + 1);

    let mut stakes: Vec<i64> = weights
        .iter()
        .map(|&w| rounded_stake(w, budget, unit))
        .collect();

    let mut odds = candidates.odds();
    odds.push(1.0);

    correct_not_exceed(&mut stakes, &odds, budget);

    let mut plan = IndexMap::with_capacity(n + 1);
    for (candidate, &stake) in candidates.iter().zip(&stakes) {
        plan.insert(candidate.id.clone(), stake);
    }
    plan.insert(RESERVE.to_string(), stakes[n]);

    BetPlan { stakes: plan }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::candidates::{filter_candidates, QuoteMap};

    fn candidate_set(entries: &[(&str, f64, f64)]) -> CandidateSet {
        let probabilities: QuoteMap = entries
            .iter()
            .map(|(id, p, _)| (id.to_string(), *p))
            .collect();
        let odds: QuoteMap = entries
            .iter()
            .map(|(id, _, o)| (id.to_string(), *o))
            .collect();
        filter_candidates(&probabilities, &odds, 0.0, 0.0).unwrap()
    }

    #[test]
    fn test_rounded_stake() {
        assert_eq!(rounded_stake(0.1, 1000, 100), 100);
        assert_eq!(rounded_stake(0.333, 1000, 100), 300);
        assert_eq!(rounded_stake(0.04, 1000, 100), 0);
        assert_eq!(rounded_stake(0.0, 1000, 100), 0);
    }

    #[test]
    fn test_correction_folds_small_returns() {
        // available = 1000 - 400 = 600; "1" returns 200 < 600 and is folded,
        // "2" returns 1500 >= 600 and stands.
        let mut stakes = vec![100, 500, 400];
        correct_not_exceed(&mut stakes, &[2.0, 3.0, 1.0], 1000);

        assert_eq!(stakes, vec![0, 500, 500]);
        assert_eq!(stakes.iter().sum::<i64>(), 1000);
    }

    #[test]
    fn test_correction_is_idempotent() {
        let mut stakes = vec![100, 500, 400];
        let odds = [2.0, 3.0, 1.0];
        correct_not_exceed(&mut stakes, &odds, 1000);

        let corrected = stakes.clone();
        correct_not_exceed(&mut stakes, &odds, 1000);

        assert_eq!(stakes, corrected);
    }

    #[test]
    fn test_correction_absorbs_rounding_shortfall() {
        // Stakes sum to 600; the reserve absorbs the missing 400.
        let mut stakes = vec![300, 0, 300];
        correct_not_exceed(&mut stakes, &[5.0, 3.0, 1.0], 1000);

        assert_eq!(stakes.iter().sum::<i64>(), 1000);
        assert_eq!(stakes, vec![300, 0, 700]);
    }

    #[test]
    fn test_correction_folds_weakest_on_overshoot() {
        // Stakes sum past the budget; the smallest-return stake goes first.
        let mut stakes = vec![600, 500, 0];
        correct_not_exceed(&mut stakes, &[10.0, 10.0, 1.0], 1000);

        assert_eq!(stakes.iter().sum::<i64>(), 1000);
        assert_eq!(stakes, vec![600, 0, 400]);
    }

    #[test]
    fn test_discretize_matches_correction_example() {
        let candidates = candidate_set(&[("1", 0.1, 2.0), ("2", 0.5, 3.0)]);
        let plan = discretize(&candidates, &[0.1, 0.5, 0.4], 1000, 100);

        assert_eq!(plan.stake("1"), 0);
        assert_eq!(plan.stake("2"), 500);
        assert_eq!(plan.reserve(), 500);
        assert_eq!(plan.total(), 1000);
    }

    #[test]
    fn test_discretize_denomination_invariant() {
        let candidates =
            candidate_set(&[("1", 0.2, 4.0), ("2", 0.3, 6.0), ("3", 0.1, 12.0)]);
        let plan = discretize(&candidates, &[0.24, 0.51, 0.04, 0.21], 1000, 100);

        for (id, stake) in plan.iter() {
            if id != RESERVE {
                assert_eq!(stake % 100, 0, "stake for {} not on the unit grid", id);
                assert!(stake >= 0);
            }
        }
        assert_eq!(plan.total(), 1000);
    }

    #[test]
    fn test_all_reserve_plan() {
        let plan = BetPlan::all_reserve(1000);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.reserve(), 1000);
        assert_eq!(plan.total(), 1000);
        assert_eq!(plan.staked(), 0);
    }

    #[test]
    fn test_fallback_plan() {
        let plan = BetPlan::fallback(&["1", "4", "6"], 1000);

        assert_eq!(plan.len(), 4);
        assert_eq!(plan.stake("1"), 0);
        assert_eq!(plan.stake("4"), 0);
        assert_eq!(plan.stake("6"), 0);
        assert_eq!(plan.reserve(), 1000);
        assert_eq!(plan.total(), 1000);
    }

    #[test]
    fn test_non_zero_entries() {
        let candidates = candidate_set(&[("1", 0.1, 2.0), ("2", 0.5, 3.0)]);
        let plan = discretize(&candidates, &[0.1, 0.5, 0.4], 1000, 100);

        let non_zero: Vec<(&str, i64)> = plan.non_zero().collect();
        assert_eq!(non_zero, vec![("2", 500), (RESERVE, 500)]);
    }

    #[test]
    fn test_plan_serializes_as_flat_map() {
        let plan = BetPlan::fallback(&["1"], 1000);
        let json = serde_json::to_string(&plan).unwrap();

        assert_eq!(json, r#"{"1":0,"reserve":1000}"#);
    }
}
