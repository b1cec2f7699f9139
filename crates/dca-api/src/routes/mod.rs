//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크
//! - `/api/v1/config` - 사용자 투자 설정
//! - `/api/v1/plans` - 계획 생성, 과거 재현, 이력, 상세 리포트
//! - `/api/v1/circuit-breaker` - 서킷 브레이커 상태
//! - `/api/v1/market-data` - 실시간 스냅샷 입력

pub mod circuit_breaker;
pub mod config;
pub mod health;
pub mod market_data;
pub mod plans;

pub use circuit_breaker::circuit_breaker_router;
pub use config::config_router;
pub use health::{health_router, Readiness, ReadinessResponse};
pub use market_data::{market_data_router, LiveCodesResponse};
pub use plans::{plans_router, GeneratePlanRequest, HistoricalPlanRequest, PlanHistoryResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/config", config_router())
        .nest("/api/v1/plans", plans_router())
        .nest("/api/v1/circuit-breaker", circuit_breaker_router())
        .nest("/api/v1/market-data", market_data_router())
}
