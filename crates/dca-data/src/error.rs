//! 데이터 모듈 오류 타입.

use chrono::NaiveDate;
use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 공급자 응답 타임아웃
    #[error("Provider timeout ({code}): {timeout_ms}ms")]
    Timeout { code: String, timeout_ms: u64 },

    /// 공급자 오류 (네트워크, API 등)
    #[error("Provider error: {0}")]
    Provider(String),

    /// 공급자 커버리지 밖의 날짜
    #[error("Date out of range: {date} (coverage {earliest:?} ~ {latest})")]
    OutOfRange {
        date: NaiveDate,
        earliest: Option<NaiveDate>,
        latest: NaiveDate,
    },

    /// 파일 입출력 오류
    #[error("I/O error: {0}")]
    Io(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 손상된 저장 파일
    #[error("Corrupted file {path}: {reason}")]
    Corrupted { path: String, reason: String },
}

impl DataError {
    /// 재시도 가능한 오류인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DataError::Timeout { .. } | DataError::Provider(_))
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
