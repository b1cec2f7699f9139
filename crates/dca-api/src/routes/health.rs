//! 헬스 체크 endpoint.
//!
//! - `GET /health` - liveness ("OK")
//! - `GET /health/ready` - 데이터 디렉토리의 계획 이력을 읽을 수 있는지 확인

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use dca_core::BreakerLevel;

use crate::state::AppState;

/// 준비 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    /// 저장소를 읽을 수 없어 계획 생성이 불가능한 상태
    StorageUnavailable,
}

/// `/health/ready` 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: Readiness,
    pub version: String,
    pub uptime_secs: i64,
    pub checked_at: DateTime<Utc>,
    pub data_dir: String,
    /// 현재 브레이커 단계 (저장소를 읽지 못하면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaker_level: Option<BreakerLevel>,
    /// 실시간 스냅샷이 등록된 자산 수
    pub live_snapshots: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
pub async fn liveness() -> &'static str {
    "OK"
}

/// GET /health/ready
pub async fn readiness(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let live_snapshots = state.provider.live_codes().await.len();

    let (code, status, breaker_level, error) = match state.plans.history().await {
        Ok(_) => {
            let breaker = state.plans.breaker_state().await;
            (StatusCode::OK, Readiness::Ready, Some(breaker.level), None)
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Readiness::StorageUnavailable,
            None,
            Some(e.to_string()),
        ),
    };

    let response = ReadinessResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        checked_at: Utc::now(),
        data_dir: state.plans.store().dir().display().to_string(),
        breaker_level,
        live_snapshots,
        error,
    };
    (code, Json(response))
}

pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(liveness))
        .route("/ready", get(readiness))
}
