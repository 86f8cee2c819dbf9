use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::stakes::BetPlan;

/// Allocation request: model win probabilities and market win odds for one
/// race, keyed by candidate id. JSON object order is the candidate order.
#[derive(Debug, Serialize, Deserialize)]
pub struct AllocateRequest {
    pub probabilities: IndexMap<String, f64>,
    pub odds: IndexMap<String, f64>,
}

/// Allocation response
#[derive(Debug, Serialize, Deserialize)]
pub struct AllocateResponse {
    pub plan: BetPlan,
    /// Total amount wagered across candidates
    pub staked: i64,
    /// Amount deliberately left unstaked
    pub reserve: i64,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
