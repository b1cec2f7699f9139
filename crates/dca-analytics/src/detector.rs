//! 특수 조건 감지기.
//!
//! 스냅샷에 대해 독립적인 조건들을 고정 우선순위로 평가하여 자산당 최대 1개의 조건을 발행합니다.
//!
//! # 우선순위
//!
//! 1. **SystemicRisk**: 깊은 낙폭 + 거래량 급증 + (ATR 퍼센타일 극단 또는 데드 크로스)
//! 2. **ExtremeOversold**: 큰 낙폭 + RSI 과매도
//! 3. **Rebound**: 골든 크로스 + RSI 과매도 회복 구간 + 200일 이평 아래
//!
//! 발행된 조건은 점수 구간 정책을 대체합니다.

use dca_core::{ConditionType, DetectorConfig, MaCross, MarketSnapshot, SpecialCondition};
use tracing::debug;

/// 특수 조건 감지기.
#[derive(Debug, Clone, Default)]
pub struct SpecialConditionDetector {
    config: DetectorConfig,
}

impl SpecialConditionDetector {
    /// 새 감지기 생성.
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// 임계값 설정 반환.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 특수 조건 감지.
    ///
    /// 조건이 없거나 스냅샷이 없으면 None을 반환합니다.
    pub fn detect(&self, snapshot: Option<&MarketSnapshot>) -> Option<SpecialCondition> {
        let s = snapshot?;

        let condition = self
            .systemic_risk(s)
            .or_else(|| self.extreme_oversold(s))
            .or_else(|| self.rebound(s));

        if let Some(c) = &condition {
            debug!(
                code = %s.code,
                condition = %c.condition_type,
                "특수 조건 감지"
            );
        }

        condition
    }

    fn systemic_risk(&self, s: &MarketSnapshot) -> Option<SpecialCondition> {
        let cfg = &self.config;
        let drawdown = s.recent_drawdown.filter(|dd| *dd <= cfg.systemic_drawdown)?;
        let surge = s.volume_surge().filter(|v| *v >= cfg.systemic_volume_surge)?;

        let extreme_atr = s
            .atr_percentile
            .is_some_and(|p| p >= cfg.systemic_atr_percentile);
        let death_cross = s.ma_cross == MaCross::Death;
        if !(extreme_atr || death_cross) {
            return None;
        }

        let trigger = if extreme_atr { "ATR 극단" } else { "데드 크로스" };
        Some(SpecialCondition {
            condition_type: ConditionType::SystemicRisk,
            description: format!(
                "낙폭 {:.1}%, 거래량 {:.1}배, {} 동시 발생",
                drawdown * 100.0,
                surge,
                trigger
            ),
        })
    }

    fn extreme_oversold(&self, s: &MarketSnapshot) -> Option<SpecialCondition> {
        let cfg = &self.config;
        let drawdown = s.recent_drawdown.filter(|dd| *dd <= cfg.oversold_drawdown)?;
        let rsi = s.rsi_14.filter(|r| *r <= cfg.oversold_rsi)?;

        Some(SpecialCondition {
            condition_type: ConditionType::ExtremeOversold,
            description: format!("낙폭 {:.1}%, RSI {:.1} 과매도", drawdown * 100.0, rsi),
        })
    }

    fn rebound(&self, s: &MarketSnapshot) -> Option<SpecialCondition> {
        let cfg = &self.config;
        if s.ma_cross != MaCross::Golden {
            return None;
        }
        let rsi = s
            .rsi_14
            .filter(|r| (cfg.rebound_rsi_low..=cfg.rebound_rsi_high).contains(r))?;
        let deviation = s.ma_deviation().filter(|d| *d < 0.0)?;

        Some(SpecialCondition {
            condition_type: ConditionType::Rebound,
            description: format!(
                "골든 크로스, RSI {:.1} 회복 중, 200일선 대비 {:.1}%",
                rsi,
                deviation * 100.0
            ),
        })
    }
}
