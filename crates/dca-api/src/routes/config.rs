//! 사용자 투자 설정 endpoint.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/config` - 저장된 설정 조회
//! - `PUT /api/v1/config` - 설정 검증 후 저장 (위반 시 422와 필드 목록)

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use dca_core::UserConfig;

use crate::error::{plan_error, ApiResult};
use crate::state::AppState;

/// 설정 조회.
///
/// GET /api/v1/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> ApiResult<Json<UserConfig>> {
    let config = state.plans.user_config().await.map_err(plan_error)?;
    Ok(Json(config))
}

/// 설정 저장.
///
/// PUT /api/v1/config
pub async fn put_config(
    State(state): State<Arc<AppState>>,
    Json(config): Json<UserConfig>,
) -> ApiResult<Json<UserConfig>> {
    let saved = state
        .plans
        .update_user_config(config)
        .await
        .map_err(plan_error)?;
    Ok(Json(saved))
}

pub fn config_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_config).put(put_config))
}
