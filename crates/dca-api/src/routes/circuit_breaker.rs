//! 서킷 브레이커 상태 endpoint.
//!
//! - `GET /api/v1/circuit-breaker` - 현재 단계, 축소 배수, 연속 개선 횟수

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use dca_core::CircuitBreakerState;

use crate::state::AppState;

pub async fn get_circuit_breaker(State(state): State<Arc<AppState>>) -> Json<CircuitBreakerState> {
    Json(state.plans.breaker_state().await)
}

pub fn circuit_breaker_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_circuit_breaker))
}
