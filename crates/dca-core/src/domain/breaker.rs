//! 서킷 브레이커 상태.
//!
//! 프로세스 전역으로 유지되는 유일한 가변 상태입니다. 상태 전이는 `dca-risk`의
//! 컨트롤러만 수행하며, 계획 생성기는 읽기만 합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 서킷 브레이커 단계.
///
/// 순서는 제한 강도 순입니다 (`Normal < Light < Moderate < Severe`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum BreakerLevel {
    #[default]
    Normal,
    Light,
    Moderate,
    Severe,
}

impl BreakerLevel {
    /// 월 예산에 곱해지는 축소 배수.
    pub fn reduction_factor(self) -> Decimal {
        match self {
            Self::Normal => dec!(1.0),
            Self::Light => dec!(0.8),
            Self::Moderate => dec!(0.5),
            Self::Severe => dec!(0.1),
        }
    }

    /// 한 단계 더 제한적인 단계 (Severe는 그대로).
    pub fn tighter(self) -> Self {
        match self {
            Self::Normal => Self::Light,
            Self::Light => Self::Moderate,
            Self::Moderate | Self::Severe => Self::Severe,
        }
    }

    /// 한 단계 덜 제한적인 단계 (Normal은 그대로).
    pub fn looser(self) -> Self {
        match self {
            Self::Severe => Self::Moderate,
            Self::Moderate => Self::Light,
            Self::Light | Self::Normal => Self::Normal,
        }
    }
}

impl fmt::Display for BreakerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        };
        write!(f, "{}", s)
    }
}

/// 브레이커 평가에 사용되는 바스켓 전체 신호.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakerSignal {
    /// 비중 가중 평균 총점 (0 ~ 100)
    pub weighted_score: f64,
    /// 버블/시스템 리스크로 분류된 자산의 비중 합 (0 ~ 1)
    pub risk_fraction: f64,
}

/// 서킷 브레이커 상태.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub level: BreakerLevel,
    /// 현재 단계의 축소 배수 (항상 `level.reduction_factor()`와 같음)
    pub reduction_factor: Decimal,
    /// 회복 방향 연속 평가 횟수
    #[serde(default)]
    pub consecutive_improvements: u32,
    /// 마지막으로 평가한 신호
    #[serde(default)]
    pub last_signal: Option<BreakerSignal>,
    /// 마지막 갱신 시각
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self::at_level(BreakerLevel::Normal)
    }
}

impl CircuitBreakerState {
    /// 특정 단계의 초기 상태를 생성합니다.
    pub fn at_level(level: BreakerLevel) -> Self {
        Self {
            level,
            reduction_factor: level.reduction_factor(),
            consecutive_improvements: 0,
            last_signal: None,
            updated_at: None,
        }
    }

    /// 외부에서 읽어 들인 상태의 축소 배수를 단계에 맞게 재계산합니다.
    pub fn normalized(mut self) -> Self {
        self.reduction_factor = self.level.reduction_factor();
        self
    }
}
