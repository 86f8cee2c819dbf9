use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::AppState;
use tansho::core::allocator::Allocator;
use tansho::error::AllocError;
use tansho::models::{AllocateRequest, AllocateResponse};

/// Allocate the configured budget across one race's candidates
pub async fn allocate_race(
    state: web::Data<Arc<AppState>>,
    req: web::Json<AllocateRequest>,
) -> Result<HttpResponse, AllocError> {
    let plan = state.allocator.allocate(&req.probabilities, &req.odds)?;

    let response = AllocateResponse {
        staked: plan.staked(),
        reserve: plan.reserve(),
        plan,
    };

    Ok(HttpResponse::Ok().json(response))
}
