//! Core allocation logic

pub mod allocator;
pub mod candidates;
pub mod optimizer;
pub mod payoff;
pub mod stakes;

// Re-export commonly used types
pub use allocator::{Allocator, AllocatorConfig, WinBetAllocator};
pub use candidates::{filter_candidates, Candidate, CandidateSet, QuoteMap};
pub use optimizer::{RiskAdjustedOptimizer, SolverOptions, SolverOutcome};
pub use payoff::PayoffMatrix;
pub use stakes::{correct_not_exceed, discretize, BetPlan, RESERVE};
