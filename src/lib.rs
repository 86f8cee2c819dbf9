//! Tansho - Win-bet budget allocation engine
//!
//! This library provides:
//! - Candidate filtering by probability and odds thresholds
//! - Risk-adjusted stake weight optimization over the race payoff matrix
//! - Stake discretization with exact budget conservation
//! - Backtesting utilities for validating allocation settings
//!
//! # Example
//!
//! ```
//! use indexmap::IndexMap;
//! use tansho::core::{Allocator, WinBetAllocator};
//!
//! let probabilities: IndexMap<String, f64> =
//!     [("1".to_string(), 0.1), ("2".to_string(), 0.5)].into_iter().collect();
//! let odds: IndexMap<String, f64> =
//!     [("1".to_string(), 2.0), ("2".to_string(), 3.0)].into_iter().collect();
//!
//! let allocator = WinBetAllocator::with_defaults();
//! let plan = allocator.allocate(&probabilities, &odds).unwrap();
//! assert_eq!(plan.total(), 1000);
//! ```

pub mod backtesting;
pub mod core;
pub mod data;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use crate::core::{Allocator, AllocatorConfig, BetPlan, WinBetAllocator, RESERVE};
pub use crate::data::{load_win_odds, PredictionBook, RacePrediction};
pub use crate::error::AllocError;
