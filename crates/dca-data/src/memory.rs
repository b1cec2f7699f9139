//! 프로세스 내 시장 데이터 공급자.
//!
//! 외부 지표 수집기가 계산을 마친 스냅샷을 밀어 넣으면 엔진이 조회합니다.
//! 실시간 스냅샷은 자산당 최신 1개, 과거 스냅샷은 날짜별로 보관합니다.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;

use dca_core::MarketSnapshot;

use crate::error::Result;
use crate::provider::MarketDataProvider;

/// 메모리 기반 공급자.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    live: RwLock<HashMap<String, MarketSnapshot>>,
    archive: RwLock<HashMap<String, BTreeMap<NaiveDate, MarketSnapshot>>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 최신 스냅샷을 등록합니다 (같은 코드는 교체).
    pub async fn upsert_live(&self, snapshot: MarketSnapshot) {
        debug!(code = %snapshot.code, "실시간 스냅샷 갱신");
        self.live
            .write()
            .await
            .insert(snapshot.code.clone(), snapshot);
    }

    /// 특정 거래일의 과거 스냅샷을 보관합니다.
    pub async fn insert_historical(&self, date: NaiveDate, snapshot: MarketSnapshot) {
        self.archive
            .write()
            .await
            .entry(snapshot.code.clone())
            .or_default()
            .insert(date, snapshot);
    }

    /// 등록된 실시간 스냅샷.
    pub async fn live_snapshot(&self, code: &str) -> Option<MarketSnapshot> {
        self.live.read().await.get(code).cloned()
    }

    /// 실시간 스냅샷을 제거합니다.
    pub async fn remove_live(&self, code: &str) -> Option<MarketSnapshot> {
        self.live.write().await.remove(code)
    }

    /// 등록된 실시간 스냅샷 코드 목록.
    pub async fn live_codes(&self) -> Vec<String> {
        let mut codes: Vec<_> = self.live.read().await.keys().cloned().collect();
        codes.sort();
        codes
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn latest(&self, code: &str) -> Result<Option<MarketSnapshot>> {
        Ok(self.live_snapshot(code).await)
    }

    /// 요청일 이전 가장 가까운 거래일 스냅샷을 기준일로 태깅하여 반환합니다.
    async fn as_of(&self, code: &str, date: NaiveDate) -> Result<Option<MarketSnapshot>> {
        let archive = self.archive.read().await;
        let snapshot = archive
            .get(code)
            .and_then(|series| series.range(..=date).next_back())
            .map(|(_, s)| MarketSnapshot {
                as_of: Some(date),
                ..s.clone()
            });
        Ok(snapshot)
    }

    async fn coverage_start(&self) -> Result<Option<NaiveDate>> {
        let archive = self.archive.read().await;
        Ok(archive
            .values()
            .filter_map(|series| series.keys().next().copied())
            .min())
    }
}
