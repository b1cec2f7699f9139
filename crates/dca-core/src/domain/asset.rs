//! 자산 및 사용자 투자 설정.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{CoreError, CoreResult, FieldIssue};

/// 자산 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// 중국 지수
    CnIndex,
    /// 미국 지수
    UsIndex,
    /// 금
    Gold,
    /// 채권
    Bond,
    /// 현금성 자산
    Cash,
    /// 기타
    #[default]
    Other,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CnIndex => "cn_index",
            Self::UsIndex => "us_index",
            Self::Gold => "gold",
            Self::Bond => "bond",
            Self::Cash => "cash",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// 바스켓을 구성하는 개별 자산.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// 자산 코드 (예: "510300")
    pub code: String,
    /// 표시 이름
    pub name: String,
    /// 자산 유형
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    /// 바스켓 내 비중 (0.0 ~ 1.0)
    pub weight: f64,
    /// 설명 (선택)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Asset {
    /// 새 자산을 생성합니다.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        asset_type: AssetType,
        weight: f64,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            asset_type,
            weight,
            description: None,
        }
    }
}

/// 사용자 투자 설정.
///
/// 엔진 내부에서는 검증된 설정만 사용합니다. 검증은 [`UserConfig::validate`]에서
/// 계획 생성 직전 한 번 수행됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// 월 투자 예산
    pub monthly_investment: Decimal,
    /// 극단적 과매도 시 투입 가능한 예비 자금
    #[serde(default)]
    pub buffer_amount: Decimal,
    /// 투자 대상 자산 목록
    pub assets: Vec<Asset>,
    /// 마지막 수정 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserConfig {
    /// 새 설정을 생성합니다.
    pub fn new(monthly_investment: Decimal, buffer_amount: Decimal, assets: Vec<Asset>) -> Self {
        Self {
            monthly_investment,
            buffer_amount,
            assets,
            updated_at: None,
        }
    }

    /// 자산 비중 합계.
    pub fn weight_sum(&self) -> f64 {
        self.assets.iter().map(|a| a.weight).sum()
    }

    /// 설정을 검증합니다.
    ///
    /// 문제가 있는 필드를 모두 수집하여 하나의 `InvalidConfig` 에러로 반환합니다.
    pub fn validate(&self, weight_tolerance: f64) -> CoreResult<()> {
        let mut issues = Vec::new();

        if self.monthly_investment <= Decimal::ZERO {
            issues.push(FieldIssue::new("monthly_investment", "0보다 커야 합니다"));
        }
        if self.buffer_amount < Decimal::ZERO {
            issues.push(FieldIssue::new("buffer_amount", "음수일 수 없습니다"));
        }

        if self.assets.is_empty() {
            issues.push(FieldIssue::new("assets", "최소 1개 자산이 필요합니다"));
        } else {
            let mut seen = HashSet::new();
            for (i, asset) in self.assets.iter().enumerate() {
                if asset.code.trim().is_empty() {
                    issues.push(FieldIssue::new(format!("assets[{}].code", i), "비어 있습니다"));
                } else if !seen.insert(asset.code.as_str()) {
                    issues.push(FieldIssue::new(
                        format!("assets[{}].code", i),
                        format!("중복된 코드: {}", asset.code),
                    ));
                }
                if !(0.0..=1.0).contains(&asset.weight) {
                    issues.push(FieldIssue::new(
                        format!("assets[{}].weight", i),
                        "0~1 범위여야 합니다",
                    ));
                }
            }

            let sum = self.weight_sum();
            if !sum.is_finite() || (sum - 1.0).abs() > weight_tolerance {
                issues.push(FieldIssue::new(
                    "assets.weight",
                    format!("비중 합계 {:.4}가 1에서 {} 이상 벗어났습니다", sum, weight_tolerance),
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidConfig(issues))
        }
    }
}
