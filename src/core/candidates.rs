//! Candidate filtering
//!
//! Selects which market selections are eligible to receive a stake, based on
//! probability and odds thresholds. Enumeration order of the inputs is
//! preserved end-to-end: it indexes the payoff matrix rows and columns.

use indexmap::IndexMap;

use crate::error::AllocError;

/// Insertion-ordered mapping from candidate id to a numeric value
/// (probability, odds or stake).
pub type QuoteMap = IndexMap<String, f64>;

/// A single selection eligible to receive a stake
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    /// Model-estimated win chance, in [0, 1]
    pub probability: f64,
    /// Decimal payout multiple per unit staked
    pub odds: f64,
}

/// Ordered set of candidates surviving the filter. May be empty; downstream
/// components special-case emptiness rather than fail.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.candidates.iter().map(|c| c.probability).collect()
    }

    pub fn odds(&self) -> Vec<f64> {
        self.candidates.iter().map(|c| c.odds).collect()
    }
}

/// Select the candidates whose probability and odds both clear their
/// thresholds, preserving input order.
///
/// The probability threshold is checked first; the odds lookup happens only
/// for ids that pass it. A missing odds entry at that point is a caller
/// error: the filter fails fast naming the offending id rather than
/// attempting repair. Odds ids without a probability entry are ignored.
pub fn filter_candidates(
    probabilities: &QuoteMap,
    odds: &QuoteMap,
    pred_threshold: f64,
    odds_threshold: f64,
) -> Result<CandidateSet, AllocError> {
    let mut candidates = Vec::new();

    for (id, &probability) in probabilities {
        if probability < pred_threshold {
            continue;
        }
        let &o = odds.get(id).ok_or_else(|| {
            AllocError::ValidationError(format!(
                "Odds entry missing for candidate {}",
                id
            ))
        })?;
        if o >= odds_threshold {
            candidates.push(Candidate {
                id: id.clone(),
                probability,
                odds: o,
            });
        }
    }

    Ok(CandidateSet { candidates })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes(entries: &[(&str, f64)]) -> QuoteMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_filter_keeps_passing_candidates_in_order() {
        let probabilities = quotes(&[("1", 0.1), ("2", 0.5), ("3", 0.3)]);
        let odds = quotes(&[("1", 2.0), ("2", 3.0), ("3", 1.5)]);

        let set = filter_candidates(&probabilities, &odds, 0.0, 1.0).unwrap();

        assert_eq!(set.ids(), vec!["1", "2", "3"]);
        assert_eq!(set.probabilities(), vec![0.1, 0.5, 0.3]);
        assert_eq!(set.odds(), vec![2.0, 3.0, 1.5]);
    }

    #[test]
    fn test_filter_applies_both_thresholds() {
        let probabilities = quotes(&[("1", 0.05), ("2", 0.5), ("3", 0.3)]);
        let odds = quotes(&[("1", 2.0), ("2", 0.9), ("3", 1.5)]);

        // "1" fails the probability threshold, "2" fails the odds threshold
        let set = filter_candidates(&probabilities, &odds, 0.1, 1.0).unwrap();

        assert_eq!(set.ids(), vec!["3"]);
    }

    #[test]
    fn test_filter_can_produce_empty_set() {
        let probabilities = quotes(&[("1", 0.05), ("2", 0.08)]);
        let odds = quotes(&[("1", 2.0), ("2", 3.0)]);

        let set = filter_candidates(&probabilities, &odds, 0.5, 1.0).unwrap();

        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_filter_missing_odds_names_candidate() {
        let probabilities = quotes(&[("1", 0.5), ("2", 0.4)]);
        let odds = quotes(&[("1", 2.0)]);

        let err = filter_candidates(&probabilities, &odds, 0.0, 1.0).unwrap_err();

        assert!(err.to_string().contains("candidate 2"));
    }

    #[test]
    fn test_filter_skips_odds_lookup_below_probability_threshold() {
        // "2" has no odds entry but never clears the probability threshold,
        // so the lookup is never made and no error is raised.
        let probabilities = quotes(&[("1", 0.5), ("2", 0.01)]);
        let odds = quotes(&[("1", 2.0)]);

        let set = filter_candidates(&probabilities, &odds, 0.1, 1.0).unwrap();

        assert_eq!(set.ids(), vec!["1"]);
    }

    #[test]
    fn test_filter_ignores_extra_odds_ids() {
        let probabilities = quotes(&[("1", 0.5)]);
        let odds = quotes(&[("1", 2.0), ("9", 50.0)]);

        let set = filter_candidates(&probabilities, &odds, 0.0, 1.0).unwrap();

        assert_eq!(set.ids(), vec!["1"]);
    }
}
