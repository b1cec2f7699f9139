//! 계획 생성 오류 타입.

use chrono::NaiveDate;
use thiserror::Error;

use dca_core::{CoreError, FieldIssue};
use dca_data::DataError;

/// 계획 생성 관련 오류.
#[derive(Debug, Error)]
pub enum PlanError {
    /// 사용자 설정 검증 실패 (위반 필드 전체 포함)
    #[error("Invalid config: {}", join_issues(.0))]
    InvalidConfig(Vec<FieldIssue>),

    /// 저장된 사용자 설정 없음
    #[error("User config not found")]
    ConfigNotFound,

    /// 과거 재현 날짜가 공급자 커버리지 밖
    #[error("Date out of range: {date} (coverage {earliest:?} ~ {latest})")]
    OutOfRangeDate {
        date: NaiveDate,
        earliest: Option<NaiveDate>,
        latest: NaiveDate,
    },

    /// 저장소/공급자 오류
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// 기타 도메인 오류
    #[error("Core error: {0}")]
    Core(CoreError),
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PlanError {
    /// 호출자 입력 문제인지 확인합니다 (API의 4xx 매핑용).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PlanError::InvalidConfig(_) | PlanError::ConfigNotFound | PlanError::OutOfRangeDate { .. }
        )
    }
}

impl From<CoreError> for PlanError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidConfig(issues) => PlanError::InvalidConfig(issues),
            other => PlanError::Core(other),
        }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
