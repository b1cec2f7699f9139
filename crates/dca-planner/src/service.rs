//! 계획 서비스.
//!
//! 수집기, 생성기, 저장소를 묶어 API가 사용하는 유스케이스를 제공합니다.
//! 실시간 계획 생성은 브레이커 상태의 로드 → 평가 → 저장을 하나의 뮤텍스 안에서 수행하므로
//! 동시 요청이 와도 상태 전이가 유실되지 않습니다.
//! 상태와 이력은 계획이 완성된 뒤에만 기록됩니다.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use dca_core::{
    AppConfig, CircuitBreakerState, InvestmentDetails, InvestmentPlan, TargetMonth, UserConfig,
};
use dca_data::{JsonFileStore, SnapshotFetcher};

use crate::error::{PlanError, PlanResult};
use crate::generator::{PlanGenerator, PlanOutcome, PlanRequest};
use crate::replay::HistoricalReplayAdapter;

/// 실시간 계획 생성 옵션.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// 대상 월 (없으면 다음 달)
    pub target_month: Option<TargetMonth>,
    pub rebalance_required: bool,
}

/// 계획 서비스.
pub struct PlanService {
    generator: Arc<PlanGenerator>,
    fetcher: Arc<SnapshotFetcher>,
    store: Arc<JsonFileStore>,
    replay: HistoricalReplayAdapter,
    /// 브레이커 상태 읽기-수정-쓰기 직렬화
    breaker_lock: Mutex<()>,
}

impl PlanService {
    pub fn new(
        generator: Arc<PlanGenerator>,
        fetcher: Arc<SnapshotFetcher>,
        store: Arc<JsonFileStore>,
    ) -> Self {
        let replay = HistoricalReplayAdapter::new(fetcher.clone(), generator.clone());
        Self {
            generator,
            fetcher,
            store,
            replay,
            breaker_lock: Mutex::new(()),
        }
    }

    /// 애플리케이션 설정으로 구성합니다.
    pub fn from_config(config: &AppConfig, fetcher: Arc<SnapshotFetcher>) -> Self {
        Self::new(
            Arc::new(PlanGenerator::from_config(config)),
            fetcher,
            Arc::new(JsonFileStore::from_config(&config.storage)),
        )
    }

    pub fn store(&self) -> &Arc<JsonFileStore> {
        &self.store
    }

    // =========================================================================
    // 사용자 설정
    // =========================================================================

    /// 저장된 사용자 설정.
    pub async fn user_config(&self) -> PlanResult<UserConfig> {
        self.store
            .load_user_config()
            .await?
            .ok_or(PlanError::ConfigNotFound)
    }

    /// 사용자 설정을 검증 후 저장합니다.
    pub async fn update_user_config(&self, mut config: UserConfig) -> PlanResult<UserConfig> {
        self.generator.validate(&config)?;
        config.updated_at = Some(Utc::now());
        self.store.save_user_config(&config).await?;

        info!(
            assets = config.assets.len(),
            monthly_investment = %config.monthly_investment,
            "사용자 설정 저장"
        );
        Ok(config)
    }

    // =========================================================================
    // 계획 생성
    // =========================================================================

    /// 실시간 계획 생성.
    ///
    /// 브레이커 상태를 갱신하고 계획 이력과 상세 리포트를 저장합니다.
    #[instrument(skip(self, options), fields(rebalance = options.rebalance_required))]
    pub async fn generate(&self, options: GenerateOptions) -> PlanResult<PlanOutcome> {
        let config = self.user_config().await?;
        self.generator.validate(&config)?;

        let codes: Vec<String> = config.assets.iter().map(|a| a.code.clone()).collect();
        let market_data = self.fetcher.fetch_all_latest(&codes).await;

        let now = Utc::now();
        let target_month = options
            .target_month
            .unwrap_or_else(|| TargetMonth::following(now.date_naive()));

        let _guard = self.breaker_lock.lock().await;
        let state = self.store.load_breaker_state().await;

        let outcome = self.generator.generate(PlanRequest {
            user_config: &config,
            market_data: &market_data,
            breaker_state: &state,
            target_month,
            rebalance_required: options.rebalance_required,
            historical_date: None,
            now,
        })?;

        self.store
            .commit_generation(&outcome.plan, &outcome.details, &outcome.breaker.state)
            .await?;

        Ok(outcome)
    }

    /// 과거 시점 계획 재현 (상태/이력 변경 없음).
    pub async fn generate_historical(&self, date: NaiveDate) -> PlanResult<PlanOutcome> {
        let config = self.user_config().await?;
        self.replay
            .replay(&config, date, Utc::now().date_naive())
            .await
    }

    // =========================================================================
    // 조회
    // =========================================================================

    pub async fn history(&self) -> PlanResult<Vec<InvestmentPlan>> {
        Ok(self.store.load_history().await?)
    }

    pub async fn latest_plan(&self) -> PlanResult<Option<InvestmentPlan>> {
        Ok(self.store.latest_plan().await?)
    }

    /// 마지막 실시간 생성의 상세 리포트.
    pub async fn details(&self) -> PlanResult<Option<InvestmentDetails>> {
        Ok(self.store.load_details().await?)
    }

    /// 현재 브레이커 상태 (파일이 없거나 읽을 수 없으면 Normal).
    pub async fn breaker_state(&self) -> CircuitBreakerState {
        self.store.load_breaker_state().await
    }
}
