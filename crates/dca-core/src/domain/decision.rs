//! 투자 빈도 결정 및 특수 조건.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 투자 빈도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// 매 영업일
    Daily,
    /// 주 1회
    Weekly,
    /// 월 2회
    Biweekly,
    /// 월 1회
    Monthly,
}

impl Frequency {
    /// 설명 문자열
    pub fn description(self) -> &'static str {
        match self {
            Self::Daily => "매일 투자",
            Self::Weekly => "매주 투자",
            Self::Biweekly => "격주 투자",
            Self::Monthly => "매월 투자",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        };
        write!(f, "{}", s)
    }
}

/// 시장 상태 분류.
///
/// 점수 구간 레벨(`ExtremeOversold`~`Bubble`)과 감지기 전용 조건(`Rebound`, `SystemicRisk`)을
/// 함께 표현합니다. 각 분류는 고정된 {빈도, 금액 배수} 정책을 가집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    /// 극단적 과매도
    ExtremeOversold,
    /// 가치 구간
    ValueZone,
    /// 중립
    Neutral,
    /// 고평가
    Overvalued,
    /// 버블
    Bubble,
    /// 시스템 리스크
    SystemicRisk,
    /// 반등 기회
    Rebound,
}

impl ConditionType {
    /// 이 분류에 대응하는 (빈도, 금액 배수).
    pub fn policy(self) -> (Frequency, f64) {
        match self {
            Self::ExtremeOversold => (Frequency::Daily, 1.5),
            Self::ValueZone => (Frequency::Weekly, 1.2),
            Self::Neutral => (Frequency::Biweekly, 1.0),
            Self::Overvalued => (Frequency::Monthly, 0.8),
            Self::Bubble => (Frequency::Monthly, 0.5),
            Self::SystemicRisk => (Frequency::Monthly, 0.5),
            Self::Rebound => (Frequency::Weekly, 1.2),
        }
    }

    /// 서킷 브레이커 위험 신호로 집계되는 분류인지 여부
    pub fn is_risk(self) -> bool {
        matches!(self, Self::Bubble | Self::SystemicRisk)
    }

    /// 설명 문자열
    pub fn description(self) -> &'static str {
        match self {
            Self::ExtremeOversold => "극단적 과매도 구간, 매일 1.5배 투자",
            Self::ValueZone => "가치 구간, 매주 1.2배 투자",
            Self::Neutral => "중립 구간, 격주 정액 투자",
            Self::Overvalued => "고평가 구간, 매월 0.8배 투자",
            Self::Bubble => "버블 구간, 매월 0.5배 투자",
            Self::SystemicRisk => "시스템 리스크 감지, 매월 0.5배로 축소",
            Self::Rebound => "과매도 반등 시도, 매주 1.2배 투자",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ExtremeOversold => "extreme_oversold",
            Self::ValueZone => "value_zone",
            Self::Neutral => "neutral",
            Self::Overvalued => "overvalued",
            Self::Bubble => "bubble",
            Self::SystemicRisk => "systemic_risk",
            Self::Rebound => "rebound",
        };
        write!(f, "{}", s)
    }
}

/// 감지기가 발행한 특수 조건 (자산당 최대 1개).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialCondition {
    pub condition_type: ConditionType,
    /// 감지 근거
    pub description: String,
}

/// 자산별 빈도 결정 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDecision {
    pub frequency: Frequency,
    /// 금액 배수 (0.5 ~ 1.5)
    pub amount_factor: f64,
    /// 결정된 분류
    pub level: ConditionType,
    /// 사람이 읽을 수 있는 근거
    pub rationale: String,
    /// 특수 조건이 점수 구간 결과를 대체했는지 여부
    pub overridden: bool,
}
