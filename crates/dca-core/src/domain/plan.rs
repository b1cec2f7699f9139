//! 투자 계획 및 상세 리포트.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{
    Asset, BreakerLevel, Coefficients, ComponentScores, FrequencyDecision, RoundedScores,
    SnapshotSource, SpecialCondition,
};
use crate::error::CoreError;

/// 계획 대상 월 ("YYYY-MM").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetMonth {
    year: i32,
    month: u32,
}

impl TargetMonth {
    /// 연/월로 생성합니다.
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(CoreError::InvalidInput(format!("잘못된 월: {}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// 날짜가 속한 월.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// 날짜가 속한 월의 다음 월 (실시간 계획의 기본 대상).
    pub fn following(date: NaiveDate) -> Self {
        Self::containing(date).next()
    }

    /// 다음 월.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// 해당 월의 특정 일자 (존재하지 않으면 None).
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    /// 해당 월의 모든 날짜 (오름차순).
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (1..=31).filter_map(move |d| self.day(d))
    }
}

impl fmt::Display for TargetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for TargetMonth {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidInput(format!("월 형식은 YYYY-MM 이어야 합니다: {}", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for TargetMonth {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetMonth> for String {
    fn from(value: TargetMonth) -> Self {
        value.to_string()
    }
}

/// 자산별 투자 권고.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRecommendation {
    pub asset: Asset,
    pub scores: ComponentScores,
    pub rounded_scores: RoundedScores,
    pub coefficients: Coefficients,
    pub decision: FrequencyDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_condition: Option<SpecialCondition>,
    /// 월 투자액 (버퍼 보충 포함)
    pub monthly_amount: Decimal,
    /// 1회 투자액
    pub single_amount: Decimal,
    /// 버퍼 풀에서 보충된 금액
    pub buffer_top_up: Decimal,
    /// 투자 일자 (오름차순)
    pub investment_dates: Vec<NaiveDate>,
}

/// 계획에서 제외된 자산.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAsset {
    pub code: String,
    pub reason: String,
}

/// 투자 계획.
///
/// 생성 이후 변경되지 않습니다. 과거 재현 계획은 `historical_date`가 설정되며
/// 계획 이력에 추가되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentPlan {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub target_month: TargetMonth,
    /// 사용자 설정 월 예산
    pub total_monthly_amount: Decimal,
    /// 브레이커 축소 적용 후 예산
    pub effective_monthly_amount: Decimal,
    pub buffer_amount: Decimal,
    pub buffer_pool_usage: Decimal,
    pub rebalance_required: bool,
    pub circuit_breaker_triggered: bool,
    pub circuit_breaker_level: BreakerLevel,
    pub reduction_factor: Decimal,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub skipped_assets: Vec<SkippedAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_date: Option<NaiveDate>,
    pub recommendations: Vec<InvestmentRecommendation>,
}

impl InvestmentPlan {
    /// 권고 금액 합계 (버퍼 보충 포함).
    pub fn allocated_total(&self) -> Decimal {
        self.recommendations.iter().map(|r| r.monthly_amount).sum()
    }

    /// 자산 코드로 권고를 찾습니다.
    pub fn recommendation(&self, code: &str) -> Option<&InvestmentRecommendation> {
        self.recommendations.iter().find(|r| r.asset.code == code)
    }
}

/// 자산별 시장 데이터 상태.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataStatus {
    pub has_market_data: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub source: SnapshotSource,
}

/// 상세 리포트의 자산 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDetail {
    pub market_data_status: MarketDataStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<Coefficients>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<FrequencyDecision>,
    #[serde(default)]
    pub special_conditions: Vec<SpecialCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_scores: Option<ComponentScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounded_scores: Option<RoundedScores>,
}

/// 투자 상세 리포트 (자산 코드 → 상세).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentDetails {
    pub plan_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub assets: BTreeMap<String, AssetDetail>,
    /// 제외된 자산 및 사유
    #[serde(default)]
    pub issues: Vec<SkippedAsset>,
}
