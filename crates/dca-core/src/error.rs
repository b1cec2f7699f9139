//! DCA 엔진의 에러 타입.
//!
//! 이 모듈은 엔진 전반에서 사용되는 공통 에러 타입을 정의합니다.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 설정 검증 시 발견된 개별 필드 문제.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// 문제가 된 필드 경로 (예: "assets[1].weight")
    pub field: String,
    /// 사람이 읽을 수 있는 설명
    pub message: String,
}

impl FieldIssue {
    /// 새 필드 문제를 생성합니다.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// 핵심 엔진 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 애플리케이션 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 사용자 투자 설정 검증 실패 (문제 필드 전체 나열)
    #[error("잘못된 투자 설정: {}", join_issues(.0))]
    InvalidConfig(Vec<FieldIssue>),

    /// 구조적으로 잘못된 시장 스냅샷
    #[error("잘못된 스냅샷 ({code}): {reason}")]
    InvalidSnapshot { code: String, reason: String },

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// 검증 실패 필드 목록을 반환합니다 (InvalidConfig가 아니면 빈 슬라이스).
    pub fn field_issues(&self) -> &[FieldIssue] {
        match self {
            CoreError::InvalidConfig(issues) => issues,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
