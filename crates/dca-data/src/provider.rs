//! 시장 데이터 공급자 추상화.

use async_trait::async_trait;
use chrono::NaiveDate;

use dca_core::MarketSnapshot;

use crate::error::Result;

/// 시장 데이터 공급자 trait.
///
/// 지표 계산이 끝난 스냅샷을 자산 코드별로 제공합니다.
/// 데이터가 없는 것은 정상적인 결과이며 `Ok(None)`으로 표현합니다.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct IndicatorServiceProvider {
///     client: Arc<IndicatorClient>,
/// }
///
/// #[async_trait]
/// impl MarketDataProvider for IndicatorServiceProvider {
///     async fn latest(&self, code: &str) -> Result<Option<MarketSnapshot>> {
///         // 외부 지표 서비스 호출 및 변환
///     }
///
///     // ... 나머지 메서드 구현
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 공급자 이름 (로깅용).
    fn name(&self) -> &str;

    /// 최신 스냅샷 조회.
    ///
    /// # Errors
    ///
    /// - `DataError::Provider`: 일시적 공급자 오류 (재시도 대상)
    async fn latest(&self, code: &str) -> Result<Option<MarketSnapshot>>;

    /// 특정 날짜 기준으로 재구성한 스냅샷 조회.
    ///
    /// 반환되는 스냅샷의 `as_of`는 요청한 날짜로 설정되어야 합니다.
    async fn as_of(&self, code: &str, date: NaiveDate) -> Result<Option<MarketSnapshot>>;

    /// 과거 데이터 커버리지 시작일 (데이터가 전혀 없으면 None).
    async fn coverage_start(&self) -> Result<Option<NaiveDate>>;
}
