//! MarketSnapshot - 자산별 시점 지표 번들.
//!
//! 지표 계산은 외부 수집기가 담당하며, 엔진은 계산이 끝난 값만 소비합니다.
//! 파생 값(가격 위치, 이격도, 거래량 급증 배수, ATR 비율)은 접근자로 노출되어
//! 판단 로직이 원시 필드의 존재 여부를 직접 검사하지 않도록 합니다.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// 기본 조회 구간 (거래일, 약 1년).
pub const DEFAULT_LOOKBACK_DAYS: u32 = 252;

fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

/// 이동평균 교차 신호.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaCross {
    /// 골든 크로스 (단기 이평이 장기 이평 상향 돌파)
    Golden,
    /// 데드 크로스
    Death,
    /// 교차 없음
    #[default]
    None,
}

/// 스냅샷 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// 공급자에서 방금 조회한 실시간 데이터
    Live,
    /// 조회 실패로 마지막 정상 캐시를 사용
    Cached,
    /// 특정 과거 일자 기준 재구성 데이터
    Historical,
    /// 허용 경과 시간을 넘긴 데이터 (기본값 처리)
    Stale,
    /// 데이터 없음 (기본값 처리)
    Missing,
}

impl SnapshotSource {
    /// 스냅샷을 점수 계산에 사용할 수 있는 출처인지 확인합니다.
    pub fn has_data(self) -> bool {
        matches!(self, Self::Live | Self::Cached | Self::Historical)
    }
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Live => "live",
            Self::Cached => "cached",
            Self::Historical => "historical",
            Self::Stale => "stale",
            Self::Missing => "missing",
        };
        write!(f, "{}", s)
    }
}

/// 자산 하나의 시점 지표 번들.
///
/// 생성 이후 변경되지 않습니다. 선택 지표가 없으면 해당 신호는 점수에 기여하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// 자산 코드
    pub code: String,
    /// 현재가
    pub price: f64,
    /// 52주 최고가
    #[serde(default)]
    pub week52_high: Option<f64>,
    /// 52주 최저가
    #[serde(default)]
    pub week52_low: Option<f64>,
    /// 20일 이동평균
    #[serde(default)]
    pub ma_20: Option<f64>,
    /// 50일 이동평균
    #[serde(default)]
    pub ma_50: Option<f64>,
    /// 200일 이동평균
    #[serde(default)]
    pub ma_200: Option<f64>,
    /// 이동평균 교차 신호
    #[serde(default)]
    pub ma_cross: MaCross,
    /// RSI(14)
    #[serde(default)]
    pub rsi_14: Option<f64>,
    /// ATR(20)
    #[serde(default)]
    pub atr_20: Option<f64>,
    /// ATR 기준값 (장기 평균)
    #[serde(default)]
    pub atr_baseline: Option<f64>,
    /// ATR의 과거 구간 내 퍼센타일 (0.0 ~ 1.0)
    #[serde(default)]
    pub atr_percentile: Option<f64>,
    /// 최근 최대 낙폭 (음수, 예: -0.08 = -8%)
    #[serde(default)]
    pub recent_drawdown: Option<f64>,
    /// 최근 거래량
    #[serde(default)]
    pub volume: Option<f64>,
    /// 20일 평균 거래량
    #[serde(default)]
    pub volume_avg_20: Option<f64>,
    /// 조회 구간 길이 (거래일, 0이면 구조적으로 잘못된 스냅샷)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// 수집 시각
    pub captured_at: DateTime<Utc>,
    /// 과거 재구성 기준일 (실시간 스냅샷이면 None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

impl MarketSnapshot {
    /// 가격만 가진 최소 스냅샷을 생성합니다. 나머지 지표는 구조체 갱신 문법으로 채웁니다.
    pub fn new(code: impl Into<String>, price: f64) -> Self {
        Self {
            code: code.into(),
            price,
            week52_high: None,
            week52_low: None,
            ma_20: None,
            ma_50: None,
            ma_200: None,
            ma_cross: MaCross::None,
            rsi_14: None,
            atr_20: None,
            atr_baseline: None,
            atr_percentile: None,
            recent_drawdown: None,
            volume: None,
            volume_avg_20: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            captured_at: Utc::now(),
            as_of: None,
        }
    }

    /// 구조적 유효성을 검증합니다.
    ///
    /// 지표 누락은 에러가 아닙니다. 가격이 양의 유한값이 아니거나, 조회 구간이 0이거나,
    /// 52주 범위가 뒤집힌 경우에만 실패합니다.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::InvalidSnapshot {
            code: self.code.clone(),
            reason,
        };

        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(invalid(format!("가격이 양수가 아닙니다: {}", self.price)));
        }
        if self.lookback_days == 0 {
            return Err(invalid("조회 구간이 0일입니다".to_string()));
        }
        if let (Some(high), Some(low)) = (self.week52_high, self.week52_low) {
            if !high.is_finite() || !low.is_finite() || high < low {
                return Err(invalid(format!("52주 범위가 잘못되었습니다: high={} low={}", high, low)));
            }
        }
        Ok(())
    }

    /// 수집 후 경과 시간.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.captured_at
    }

    /// 허용 경과 시간 초과 여부.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age_hours: i64) -> bool {
        self.age(now) > Duration::hours(max_age_hours)
    }

    /// 52주 범위 내 가격 위치 (0.0 = 최저가, 1.0 = 최고가).
    ///
    /// 범위가 없거나 폭이 0이면 None.
    pub fn price_position(&self) -> Option<f64> {
        let high = self.week52_high?;
        let low = self.week52_low?;
        let range = high - low;
        if range > 0.0 {
            Some(((self.price - low) / range).clamp(0.0, 1.0))
        } else {
            None
        }
    }

    /// 200일 이동평균 대비 이격도 (예: -0.1 = 10% 아래).
    pub fn ma_deviation(&self) -> Option<f64> {
        self.ma_200
            .filter(|ma| *ma > 0.0)
            .map(|ma| (self.price - ma) / ma)
    }

    /// 20일 평균 대비 거래량 배수.
    pub fn volume_surge(&self) -> Option<f64> {
        match (self.volume, self.volume_avg_20) {
            (Some(volume), Some(avg)) if avg > 0.0 => Some(volume / avg),
            _ => None,
        }
    }

    /// ATR / 기준 ATR 비율.
    pub fn atr_ratio(&self) -> Option<f64> {
        match (self.atr_20, self.atr_baseline) {
            (Some(atr), Some(base)) if base > 0.0 => Some(atr / base),
            _ => None,
        }
    }

    /// 이동평균 정배열 여부 (가격 > 20 > 50 > 200). 하나라도 없으면 None.
    pub fn bullish_alignment(&self) -> Option<bool> {
        let (m20, m50, m200) = (self.ma_20?, self.ma_50?, self.ma_200?);
        Some(self.price > m20 && m20 > m50 && m50 > m200)
    }

    /// 이동평균 역배열 여부 (가격 < 20 < 50 < 200). 하나라도 없으면 None.
    pub fn bearish_alignment(&self) -> Option<bool> {
        let (m20, m50, m200) = (self.ma_20?, self.ma_50?, self.ma_200?);
        Some(self.price < m20 && m20 < m50 && m50 < m200)
    }
}
