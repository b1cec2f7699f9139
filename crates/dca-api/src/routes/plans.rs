//! 투자 계획 endpoint.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/plans/generate` - 실시간 계획 생성 (브레이커 갱신, 이력 저장)
//! - `POST /api/v1/plans/historical` - 과거 시점 재현 (상태/이력 불변)
//! - `GET /api/v1/plans` - 계획 이력 (최신순)
//! - `GET /api/v1/plans/latest` - 최근 계획
//! - `GET /api/v1/plans/details` - 최근 실시간 생성의 자산별 상세 리포트

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use dca_core::{InvestmentDetails, InvestmentPlan, TargetMonth};
use dca_planner::GenerateOptions;

use crate::error::{api_error, plan_error, ApiResult};
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 계획 생성 요청.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneratePlanRequest {
    /// 대상 월 ("YYYY-MM", 없으면 다음 달)
    #[serde(default)]
    pub target_month: Option<TargetMonth>,
    #[serde(default)]
    pub rebalance_required: bool,
}

/// 과거 재현 요청.
#[derive(Debug, Deserialize, Serialize)]
pub struct HistoricalPlanRequest {
    pub date: NaiveDate,
}

/// 계획 이력 응답.
#[derive(Debug, Deserialize, Serialize)]
pub struct PlanHistoryResponse {
    pub plans: Vec<InvestmentPlan>,
    pub total: usize,
}

// ==================== Handler ====================

/// 실시간 계획 생성.
///
/// POST /api/v1/plans/generate
pub async fn generate_plan(
    State(state): State<Arc<AppState>>,
    body: Option<Json<GeneratePlanRequest>>,
) -> ApiResult<Json<InvestmentPlan>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let outcome = state
        .plans
        .generate(GenerateOptions {
            target_month: request.target_month,
            rebalance_required: request.rebalance_required,
        })
        .await
        .map_err(plan_error)?;
    Ok(Json(outcome.plan))
}

/// 과거 시점 계획 재현.
///
/// POST /api/v1/plans/historical
pub async fn generate_historical_plan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HistoricalPlanRequest>,
) -> ApiResult<Json<InvestmentPlan>> {
    let outcome = state
        .plans
        .generate_historical(request.date)
        .await
        .map_err(plan_error)?;
    Ok(Json(outcome.plan))
}

/// 계획 이력.
///
/// GET /api/v1/plans
pub async fn list_plans(State(state): State<Arc<AppState>>) -> ApiResult<Json<PlanHistoryResponse>> {
    let plans = state.plans.history().await.map_err(plan_error)?;
    Ok(Json(PlanHistoryResponse {
        total: plans.len(),
        plans,
    }))
}

/// 최근 계획.
///
/// GET /api/v1/plans/latest
pub async fn latest_plan(State(state): State<Arc<AppState>>) -> ApiResult<Json<InvestmentPlan>> {
    state
        .plans
        .latest_plan()
        .await
        .map_err(plan_error)?
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "PLAN_NOT_FOUND", "생성된 계획이 없습니다"))
}

/// 상세 리포트.
///
/// GET /api/v1/plans/details
pub async fn plan_details(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<InvestmentDetails>> {
    state
        .plans
        .details()
        .await
        .map_err(plan_error)?
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "DETAILS_NOT_FOUND", "상세 리포트가 없습니다"))
}

pub fn plans_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_plans))
        .route("/latest", get(latest_plan))
        .route("/details", get(plan_details))
        .route("/generate", post(generate_plan))
        .route("/historical", post(generate_historical_plan))
}
