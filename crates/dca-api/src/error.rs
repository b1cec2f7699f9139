//! 통합 API 에러 응답 타입.
//!
//! 모든 엔드포인트가 같은 JSON 에러 형식을 사용합니다.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use dca_planner::PlanError;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "INVALID_CONFIG",
///   "message": "Invalid config: monthly_investment: 0보다 커야 합니다",
///   "details": { "fields": [{ "field": "monthly_investment", "message": "0보다 커야 합니다" }] },
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_CONFIG", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 상세 정보
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 시각 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 상태 코드와 에러 본문을 한 번에 만듭니다.
pub fn api_error(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiErrorResponse>) {
    (status, Json(ApiErrorResponse::new(code, message)))
}

/// 계획 오류를 HTTP 응답으로 변환합니다.
pub fn plan_error(err: PlanError) -> (StatusCode, Json<ApiErrorResponse>) {
    let message = err.to_string();
    if err.is_client_error() {
        debug!(error = %message, "요청 거부");
    }
    match err {
        PlanError::InvalidConfig(issues) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiErrorResponse::with_details(
                "INVALID_CONFIG",
                message,
                serde_json::json!({ "fields": issues }),
            )),
        ),
        PlanError::ConfigNotFound => api_error(StatusCode::NOT_FOUND, "CONFIG_NOT_FOUND", message),
        PlanError::OutOfRangeDate {
            earliest, latest, ..
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiErrorResponse::with_details(
                "OUT_OF_RANGE_DATE",
                message,
                serde_json::json!({ "earliest": earliest, "latest": latest }),
            )),
        ),
        PlanError::Data(_) | PlanError::Core(_) => {
            error!(error = %message, "요청 처리 중 내부 오류");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
        }
    }
}
