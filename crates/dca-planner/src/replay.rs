//! 과거 시점 재현.
//!
//! 특정 날짜 기준으로 재구성한 스냅샷으로 계획 생성 파이프라인을 그대로 실행합니다.
//! 실시간 브레이커 상태는 읽지도 쓰지도 않으며, 매 재현마다 Normal에서 시작하는
//! 임시 상태를 사용합니다. 결과 계획은 `historical_date`가 설정되고 이력에 추가되지 않습니다.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};

use dca_core::{CircuitBreakerState, TargetMonth, UserConfig};
use dca_data::SnapshotFetcher;

use crate::error::{PlanError, PlanResult};
use crate::generator::{PlanGenerator, PlanOutcome, PlanRequest};

/// 과거 재현 어댑터.
pub struct HistoricalReplayAdapter {
    fetcher: Arc<SnapshotFetcher>,
    generator: Arc<PlanGenerator>,
}

impl HistoricalReplayAdapter {
    pub fn new(fetcher: Arc<SnapshotFetcher>, generator: Arc<PlanGenerator>) -> Self {
        Self { fetcher, generator }
    }

    /// 기준일의 계획을 재현합니다.
    ///
    /// # 오류
    ///
    /// - `PlanError::OutOfRangeDate`: 공급자 커버리지 이전이거나 `today` 이후인 날짜
    /// - `PlanError::InvalidConfig`: 사용자 설정 검증 실패
    /// - `PlanError::Data`: 커버리지 조회가 재시도 후에도 실패하거나 시간 초과
    #[instrument(skip(self, user_config), fields(assets = user_config.assets.len()))]
    pub async fn replay(
        &self,
        user_config: &UserConfig,
        date: NaiveDate,
        today: NaiveDate,
    ) -> PlanResult<PlanOutcome> {
        self.generator.validate(user_config)?;

        let earliest = self.fetcher.coverage_start().await?;
        let in_range = earliest.is_some_and(|start| date >= start) && date <= today;
        if !in_range {
            return Err(PlanError::OutOfRangeDate {
                date,
                earliest,
                latest: today,
            });
        }

        let codes: Vec<String> = user_config.assets.iter().map(|a| a.code.clone()).collect();
        let market_data = self.fetcher.fetch_all_as_of(&codes, date).await;

        let scratch_state = CircuitBreakerState::default();
        let outcome = self.generator.generate(PlanRequest {
            user_config,
            market_data: &market_data,
            breaker_state: &scratch_state,
            target_month: TargetMonth::containing(date),
            rebalance_required: false,
            historical_date: Some(date),
            now: Utc::now(),
        })?;

        info!(
            date = %date,
            plan_id = %outcome.plan.id,
            breaker_level = %outcome.plan.circuit_breaker_level,
            "과거 시점 계획 재현 완료"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dca_core::{Asset, AssetType, FetcherConfig, MarketSnapshot};
    use dca_data::{DataError, InMemoryProvider, MarketDataProvider};
    use rust_decimal_macros::dec;

    /// 커버리지 조회가 응답하지 않는 공급자.
    struct StalledCoverage;

    #[async_trait]
    impl MarketDataProvider for StalledCoverage {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn latest(&self, _code: &str) -> dca_data::Result<Option<MarketSnapshot>> {
            Ok(None)
        }

        async fn as_of(&self, _code: &str, _date: NaiveDate) -> dca_data::Result<Option<MarketSnapshot>> {
            Ok(None)
        }

        async fn coverage_start(&self) -> dca_data::Result<Option<NaiveDate>> {
            futures::future::pending().await
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn adapter() -> HistoricalReplayAdapter {
        let provider = Arc::new(InMemoryProvider::new());
        provider
            .insert_historical(date(2024, 1, 2), MarketSnapshot::new("A", 10.0))
            .await;
        let fetcher = Arc::new(SnapshotFetcher::new(provider, FetcherConfig::default()));
        HistoricalReplayAdapter::new(fetcher, Arc::new(PlanGenerator::default()))
    }

    fn config() -> UserConfig {
        UserConfig::new(
            dec!(1000),
            dec!(0),
            vec![Asset::new("A", "A", AssetType::CnIndex, 1.0)],
        )
    }

    #[tokio::test]
    async fn test_replay_marks_historical_date() {
        let adapter = adapter().await;
        let outcome = adapter
            .replay(&config(), date(2024, 3, 15), date(2024, 10, 1))
            .await
            .unwrap();

        assert_eq!(outcome.plan.historical_date, Some(date(2024, 3, 15)));
        assert_eq!(outcome.plan.target_month.to_string(), "2024-03");
        assert!(!outcome.plan.recommendations[0].scores.is_default);
    }

    #[tokio::test]
    async fn test_replay_out_of_range() {
        let adapter = adapter().await;

        let before = adapter
            .replay(&config(), date(2023, 12, 29), date(2024, 10, 1))
            .await;
        assert!(matches!(before, Err(PlanError::OutOfRangeDate { .. })));

        let future = adapter
            .replay(&config(), date(2024, 10, 2), date(2024, 10, 1))
            .await;
        assert!(matches!(future, Err(PlanError::OutOfRangeDate { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_coverage_lookup_fails_with_timeout() {
        let fetcher = Arc::new(SnapshotFetcher::new(
            Arc::new(StalledCoverage),
            FetcherConfig {
                timeout_ms: 100,
                max_attempts: 2,
                backoff_ms: 10,
                ..FetcherConfig::default()
            },
        ));
        let adapter = HistoricalReplayAdapter::new(fetcher, Arc::new(PlanGenerator::default()));

        let result = adapter
            .replay(&config(), date(2024, 3, 15), date(2024, 10, 1))
            .await;
        assert!(matches!(
            result,
            Err(PlanError::Data(DataError::Timeout { .. }))
        ));
    }
}
