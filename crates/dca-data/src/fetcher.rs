//! 스냅샷 수집 계층.
//!
//! 공급자 호출을 자산별 타임아웃과 제한된 재시도로 감쌉니다.
//! 재시도가 모두 실패하면 마지막 정상 스냅샷 캐시로, 캐시도 없으면 "데이터 없음"으로
//! 대체합니다. 수집 실패는 계획 생성 실패로 전파되지 않습니다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use dca_core::{FetcherConfig, MarketSnapshot, SnapshotSource};

use crate::error::{DataError, Result};
use crate::provider::MarketDataProvider;

/// 커버리지 조회의 로그/오류 대상 이름.
const COVERAGE_TARGET: &str = "coverage_start";

/// 자산 하나의 수집 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub code: String,
    /// 점수 계산에 사용할 스냅샷 (없으면 중립 기본값 처리)
    pub snapshot: Option<MarketSnapshot>,
    pub source: SnapshotSource,
    /// 관측된 데이터의 수집 시각 (만료된 데이터 포함)
    pub updated_at: Option<DateTime<Utc>>,
    /// 공급자 호출 횟수
    pub attempts: u32,
    /// 마지막 오류 메시지
    pub last_error: Option<String>,
}

impl FetchOutcome {
    fn with_snapshot(
        code: &str,
        snapshot: MarketSnapshot,
        source: SnapshotSource,
        attempts: u32,
    ) -> Self {
        Self {
            code: code.to_string(),
            updated_at: Some(snapshot.captured_at),
            snapshot: Some(snapshot),
            source,
            attempts,
            last_error: None,
        }
    }

    fn without_snapshot(
        code: &str,
        source: SnapshotSource,
        updated_at: Option<DateTime<Utc>>,
        attempts: u32,
        last_error: Option<String>,
    ) -> Self {
        Self {
            code: code.to_string(),
            snapshot: None,
            source,
            updated_at,
            attempts,
            last_error,
        }
    }
}

/// 스냅샷 수집기.
pub struct SnapshotFetcher {
    provider: Arc<dyn MarketDataProvider>,
    config: FetcherConfig,
    /// 코드별 마지막 정상 실시간 스냅샷
    cache: RwLock<HashMap<String, MarketSnapshot>>,
}

impl SnapshotFetcher {
    /// 새 수집기 생성.
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: FetcherConfig) -> Self {
        Self {
            provider,
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// 캐시된 스냅샷 조회.
    pub async fn cached(&self, code: &str) -> Option<MarketSnapshot> {
        self.cache.read().await.get(code).cloned()
    }

    /// 최신 스냅샷 수집.
    pub async fn fetch_latest(&self, code: &str) -> FetchOutcome {
        let now = Utc::now();
        let (result, attempts) = self
            .call_with_retry(code, || self.provider.latest(code))
            .await;

        match result {
            Ok(Some(snapshot)) => {
                if snapshot.is_stale(now, self.config.max_snapshot_age_hours) {
                    warn!(
                        code = %code,
                        captured_at = %snapshot.captured_at,
                        max_age_hours = self.config.max_snapshot_age_hours,
                        "스냅샷 만료, 기본값 사용"
                    );
                    return FetchOutcome::without_snapshot(
                        code,
                        SnapshotSource::Stale,
                        Some(snapshot.captured_at),
                        attempts,
                        None,
                    );
                }
                if snapshot.validate().is_ok() {
                    self.cache
                        .write()
                        .await
                        .insert(code.to_string(), snapshot.clone());
                }
                FetchOutcome::with_snapshot(code, snapshot, SnapshotSource::Live, attempts)
            }
            Ok(None) => {
                debug!(code = %code, "공급자에 데이터 없음");
                FetchOutcome::without_snapshot(code, SnapshotSource::Missing, None, attempts, None)
            }
            Err(e) => self.fallback_to_cache(code, now, attempts, e).await,
        }
    }

    /// 여러 자산의 최신 스냅샷을 동시에 수집합니다 (입력 순서 유지).
    pub async fn fetch_all_latest(&self, codes: &[String]) -> Vec<FetchOutcome> {
        join_all(codes.iter().map(|code| self.fetch_latest(code))).await
    }

    /// 특정 날짜 기준 스냅샷 수집.
    ///
    /// 과거 재현에는 실시간 캐시를 사용하지 않습니다.
    pub async fn fetch_as_of(&self, code: &str, date: NaiveDate) -> FetchOutcome {
        let (result, attempts) = self
            .call_with_retry(code, || self.provider.as_of(code, date))
            .await;

        match result {
            Ok(Some(snapshot)) => {
                FetchOutcome::with_snapshot(code, snapshot, SnapshotSource::Historical, attempts)
            }
            Ok(None) => {
                FetchOutcome::without_snapshot(code, SnapshotSource::Missing, None, attempts, None)
            }
            Err(e) => FetchOutcome::without_snapshot(
                code,
                SnapshotSource::Missing,
                None,
                attempts,
                Some(e.to_string()),
            ),
        }
    }

    /// 여러 자산의 특정 날짜 기준 스냅샷을 동시에 수집합니다.
    pub async fn fetch_all_as_of(&self, codes: &[String], date: NaiveDate) -> Vec<FetchOutcome> {
        join_all(codes.iter().map(|code| self.fetch_as_of(code, date))).await
    }

    /// 과거 데이터 커버리지 시작일.
    ///
    /// 스냅샷 조회와 같은 타임아웃과 재시도를 적용합니다.
    pub async fn coverage_start(&self) -> Result<Option<NaiveDate>> {
        let (result, _) = self
            .call_with_retry(COVERAGE_TARGET, || self.provider.coverage_start())
            .await;
        result
    }

    async fn fallback_to_cache(
        &self,
        code: &str,
        now: DateTime<Utc>,
        attempts: u32,
        error: DataError,
    ) -> FetchOutcome {
        match self.cached(code).await {
            Some(cached) if !cached.is_stale(now, self.config.max_snapshot_age_hours) => {
                warn!(
                    code = %code,
                    error = %error,
                    captured_at = %cached.captured_at,
                    "공급자 실패, 캐시된 스냅샷 사용"
                );
                FetchOutcome {
                    last_error: Some(error.to_string()),
                    ..FetchOutcome::with_snapshot(code, cached, SnapshotSource::Cached, attempts)
                }
            }
            Some(cached) => {
                warn!(code = %code, error = %error, "공급자 실패, 캐시도 만료됨");
                FetchOutcome::without_snapshot(
                    code,
                    SnapshotSource::Stale,
                    Some(cached.captured_at),
                    attempts,
                    Some(error.to_string()),
                )
            }
            None => {
                warn!(code = %code, error = %error, "공급자 실패, 캐시 없음");
                FetchOutcome::without_snapshot(
                    code,
                    SnapshotSource::Missing,
                    None,
                    attempts,
                    Some(error.to_string()),
                )
            }
        }
    }

    /// 타임아웃과 재시도를 적용하여 공급자를 호출합니다.
    ///
    /// `code`는 로그와 타임아웃 오류에 기록되는 호출 대상입니다.
    /// 재시도 간격은 시도 횟수에 비례합니다 (500ms, 1000ms, ...).
    async fn call_with_retry<T, F, Fut>(&self, code: &str, mut call: F) -> (Result<T>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match tokio::time::timeout(timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(DataError::Timeout {
                    code: code.to_string(),
                    timeout_ms: self.config.timeout_ms,
                }),
            };

            match result {
                Ok(value) => return (Ok(value), attempt),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    debug!(
                        code = %code,
                        provider = self.provider.name(),
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "공급자 호출 재시도 예정"
                    );
                    tokio::time::sleep(self.backoff(attempt)).await;
                }
                Err(e) => {
                    warn!(
                        code = %code,
                        provider = self.provider.name(),
                        attempts = attempt,
                        error = %e,
                        "공급자 호출 최종 실패"
                    );
                    return (Err(e), attempt);
                }
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}
