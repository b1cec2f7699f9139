//! 모든 핸들러에서 공유되는 애플리케이션 상태.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use dca_core::AppConfig;
use dca_data::{InMemoryProvider, SnapshotFetcher};
use dca_planner::PlanService;

/// 애플리케이션 공유 상태.
///
/// `Arc<AppState>`로 감싸 axum의 State extractor로 주입됩니다.
pub struct AppState {
    /// 로드된 애플리케이션 설정
    pub config: AppConfig,
    /// 계획 생성/조회 서비스
    pub plans: Arc<PlanService>,
    /// 외부 지표 수집기가 스냅샷을 밀어 넣는 공급자
    pub provider: Arc<InMemoryProvider>,
    /// API 버전
    pub version: String,
    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 설정으로부터 상태를 구성합니다.
    pub fn new(config: AppConfig) -> Self {
        let provider = Arc::new(InMemoryProvider::new());
        let fetcher = Arc::new(SnapshotFetcher::new(provider.clone(), config.fetcher.clone()));
        let plans = Arc::new(PlanService::from_config(&config, fetcher));

        Self {
            config,
            plans,
            provider,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 상태 (데이터 디렉토리 지정).
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(data_dir: &std::path::Path) -> AppState {
    let mut config = AppConfig::default();
    config.storage.data_dir = data_dir.display().to_string();
    AppState::new(config)
}
