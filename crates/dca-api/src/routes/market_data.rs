//! 시장 스냅샷 입력 endpoint.
//!
//! 지표 계산은 외부 수집기가 담당하며, 계산이 끝난 스냅샷을 이 엔드포인트로 밀어 넣습니다.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/market-data` - 실시간 스냅샷이 등록된 자산 코드 목록
//! - `GET /api/v1/market-data/{code}` - 자산의 현재 스냅샷 (없으면 404)
//! - `PUT /api/v1/market-data/{code}` - 자산의 최신 스냅샷 등록/교체
//! - `DELETE /api/v1/market-data/{code}` - 자산의 스냅샷 제거 (없으면 404)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use dca_core::MarketSnapshot;

use crate::error::{api_error, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 등록된 자산 코드 목록 응답.
#[derive(Debug, Deserialize, Serialize)]
pub struct LiveCodesResponse {
    pub codes: Vec<String>,
}

/// GET /api/v1/market-data
pub async fn list_live_codes(State(state): State<Arc<AppState>>) -> Json<LiveCodesResponse> {
    Json(LiveCodesResponse {
        codes: state.provider.live_codes().await,
    })
}

fn snapshot_not_found(code: &str) -> (StatusCode, Json<ApiErrorResponse>) {
    api_error(
        StatusCode::NOT_FOUND,
        "SNAPSHOT_NOT_FOUND",
        format!("자산 {}의 실시간 스냅샷이 없습니다", code),
    )
}

/// GET /api/v1/market-data/{code}
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<Json<MarketSnapshot>> {
    state
        .provider
        .live_snapshot(&code)
        .await
        .map(Json)
        .ok_or_else(|| snapshot_not_found(&code))
}

/// 스냅샷 등록.
///
/// PUT /api/v1/market-data/{code}
///
/// 경로의 코드와 본문의 코드가 다르거나 구조적으로 잘못된 스냅샷은 거부합니다.
pub async fn put_snapshot(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(snapshot): Json<MarketSnapshot>,
) -> ApiResult<StatusCode> {
    if snapshot.code != code {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "CODE_MISMATCH",
            format!("경로 코드 {}와 스냅샷 코드 {}가 다릅니다", code, snapshot.code),
        ));
    }
    snapshot
        .validate()
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_SNAPSHOT", e.to_string()))?;

    info!(code = %code, price = snapshot.price, "실시간 스냅샷 등록");
    state.provider.upsert_live(snapshot).await;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/market-data/{code}
///
/// 이후 생성에서 해당 자산은 스냅샷 없음(중립 기본값)으로 처리됩니다.
pub async fn delete_snapshot(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<StatusCode> {
    match state.provider.remove_live(&code).await {
        Some(_) => {
            info!(code = %code, "실시간 스냅샷 제거");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(snapshot_not_found(&code)),
    }
}

pub fn market_data_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_live_codes)).route(
        "/{code}",
        get(get_snapshot).put(put_snapshot).delete(delete_snapshot),
    )
}
