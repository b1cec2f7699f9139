//! Market Score 계산기.
//!
//! 시장 스냅샷 하나를 4개 구성 요소 점수와 총점(0~100)으로 변환합니다.
//!
//! # 구성 요소
//!
//! 1. **Valuation** (0~30): 52주 범위 내 가격 위치 + 200일 이평 이격도
//! 2. **Trend** (0~30): RSI(14) + 이평 배열 + 골든/데드 크로스
//! 3. **Volatility** (0~20): ATR 퍼센타일 (없으면 ATR/기준 비율)
//! 4. **Special Event** (0~20): 최근 낙폭 + 하락 중 거래량 급증
//!
//! 누락된 지표는 해당 구성 요소의 중립 기준점 외에 아무것도 더하지 않습니다.
//! 스냅샷 자체가 없으면 중립 기본값(총점 40)을 반환합니다.

use dca_core::{ComponentScores, CoreError, MaCross, MarketSnapshot};
use tracing::debug;

/// ScoreEngine 계산 오류.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// 구조적으로 잘못된 스냅샷 (가격 ≤ 0, 조회 구간 0, 52주 범위 역전)
    #[error("잘못된 스냅샷 ({code}): {reason}")]
    InvalidSnapshot { code: String, reason: String },
}

impl From<CoreError> for ScoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidSnapshot { code, reason } => ScoreError::InvalidSnapshot { code, reason },
            other => ScoreError::InvalidSnapshot {
                code: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// ScoreEngine 결과 타입.
pub type ScoreResult<T> = Result<T, ScoreError>;

/// 구성 요소별 중립 기준점.
const VALUATION_BASE: f64 = 12.0;
const TREND_BASE: f64 = 12.0;
const VOLATILITY_BASE: f64 = 10.0;

/// Market Score 계산기.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEngine;

impl ScoreEngine {
    /// 새로운 ScoreEngine 생성.
    pub fn new() -> Self {
        Self
    }

    /// 시장 점수 계산.
    ///
    /// # 인자
    ///
    /// * `snapshot` - 자산 스냅샷 (없으면 중립 기본값)
    ///
    /// # 오류
    ///
    /// 구조적으로 잘못된 스냅샷일 때만 실패합니다. 지표 누락은 오류가 아닙니다.
    pub fn score(&self, snapshot: Option<&MarketSnapshot>) -> ScoreResult<ComponentScores> {
        let Some(snapshot) = snapshot else {
            debug!("스냅샷 없음, 중립 기본 점수 사용");
            return Ok(ComponentScores::neutral_default());
        };

        snapshot.validate()?;

        let scores = ComponentScores::from_components(
            self.valuation_score(snapshot),
            self.trend_score(snapshot),
            self.volatility_score(snapshot),
            self.special_event_score(snapshot),
        );

        debug!(
            code = %snapshot.code,
            valuation = scores.valuation_score,
            trend = scores.trend_score,
            volatility = scores.volatility_score,
            special_event = scores.special_event_score,
            total = scores.total_score,
            "시장 점수 계산 완료"
        );

        Ok(scores)
    }

    // ================================================================================================
    // 구성 요소 계산
    // ================================================================================================

    /// 1. Valuation 점수.
    ///
    /// 가격 위치가 낮을수록, 200일 이평 아래로 멀어질수록 높습니다 (단조).
    ///
    /// # 반환
    ///
    /// 클리핑 전 원점수 (기준 12)
    fn valuation_score(&self, s: &MarketSnapshot) -> f64 {
        let mut score = VALUATION_BASE;

        if let Some(position) = s.price_position() {
            score += if position < 0.2 {
                10.0
            } else if position < 0.3 {
                7.0
            } else if position < 0.4 {
                4.0
            } else if position > 0.8 {
                -6.0
            } else if position > 0.7 {
                -4.0
            } else if position > 0.6 {
                -2.0
            } else {
                0.0
            };
        }

        if let Some(deviation) = s.ma_deviation() {
            score += if deviation < -0.15 {
                8.0
            } else if deviation < -0.08 {
                6.0
            } else if deviation < -0.03 {
                3.0
            } else if deviation > 0.15 {
                -6.0
            } else if deviation > 0.08 {
                -4.0
            } else if deviation > 0.03 {
                -2.0
            } else {
                0.0
            };
        }

        score
    }

    /// 2. Trend 점수.
    ///
    /// RSI 과매도, 이평 정배열, 골든 크로스에서 높고 과매수/역배열/데드 크로스에서 낮습니다.
    fn trend_score(&self, s: &MarketSnapshot) -> f64 {
        let mut score = TREND_BASE;

        if let Some(rsi) = s.rsi_14 {
            score += if rsi <= 30.0 {
                12.0
            } else if rsi <= 35.0 {
                9.0
            } else if rsi <= 40.0 {
                6.0
            } else if rsi <= 50.0 {
                3.0
            } else if rsi >= 80.0 {
                -10.0
            } else if rsi >= 70.0 {
                -6.0
            } else if rsi >= 60.0 {
                -3.0
            } else {
                0.0
            };
        }

        if s.bullish_alignment() == Some(true) {
            score += 3.0;
        } else if s.bearish_alignment() == Some(true) {
            score -= 3.0;
        }

        score += match s.ma_cross {
            MaCross::Golden => 3.0,
            MaCross::Death => -3.0,
            MaCross::None => 0.0,
        };

        score
    }

    /// 3. Volatility 점수.
    ///
    /// 변동성 확대 구간은 가격이 눌려 있을 때만 온전한 기회로 봅니다.
    /// 가격이 눌려 있지 않으면 가산점은 절반만 반영합니다.
    fn volatility_score(&self, s: &MarketSnapshot) -> f64 {
        let adjustment = if let Some(percentile) = s.atr_percentile {
            if percentile > 0.9 {
                10.0
            } else if percentile > 0.8 {
                8.0
            } else if percentile > 0.7 {
                6.0
            } else if percentile > 0.6 {
                4.0
            } else if percentile > 0.5 {
                2.0
            } else if percentile < 0.3 {
                -3.0
            } else {
                0.0
            }
        } else if let Some(ratio) = s.atr_ratio() {
            if ratio > 2.0 {
                10.0
            } else if ratio > 1.5 {
                7.0
            } else if ratio > 1.2 {
                4.0
            } else if ratio < 0.8 {
                -2.0
            } else {
                0.0
            }
        } else {
            0.0
        };

        let adjustment = if adjustment > 0.0 && !is_depressed(s) {
            adjustment / 2.0
        } else {
            adjustment
        };

        VOLATILITY_BASE + adjustment
    }

    /// 4. Special Event 점수.
    ///
    /// 최근 낙폭 구간 점수에, 하락 중일 때만 거래량 급증 가산점을 더합니다.
    fn special_event_score(&self, s: &MarketSnapshot) -> f64 {
        let mut score = 0.0;

        let drawdown = s.recent_drawdown;
        if let Some(dd) = drawdown {
            score += if dd < -0.08 {
                15.0
            } else if dd < -0.06 {
                12.0
            } else if dd < -0.04 {
                8.0
            } else if dd < -0.02 {
                4.0
            } else {
                0.0
            };
        }

        let falling = drawdown.is_some_and(|dd| dd < 0.0);
        if let (true, Some(surge)) = (falling, s.volume_surge()) {
            if surge > 2.0 {
                score += (surge * 2.0).trunc().min(5.0);
            } else if surge > 1.5 {
                score += surge.trunc().min(3.0);
            }
        }

        score
    }
}

/// 가격이 눌려 있는지 여부 (52주 하단 절반 또는 200일 이평 아래).
///
/// 두 지표가 모두 없으면 눌려 있는 것으로 간주합니다.
fn is_depressed(s: &MarketSnapshot) -> bool {
    match (s.price_position(), s.ma_deviation()) {
        (None, None) => true,
        (position, deviation) => {
            position.is_some_and(|p| p < 0.5) || deviation.is_some_and(|d| d < 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// 총점 85가 되는 과매도 스냅샷 (30 + 24 + 18 + 13).
    fn oversold_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            week52_high: Some(200.0),
            week52_low: Some(100.0),
            ma_200: Some(137.5),
            rsi_14: Some(25.0),
            atr_percentile: Some(0.85),
            recent_drawdown: Some(-0.07),
            volume: Some(1_600.0),
            volume_avg_20: Some(1_000.0),
            ..MarketSnapshot::new("510300", 110.0)
        }
    }

    #[test]
    fn test_oversold_breakdown() {
        let scores = ScoreEngine::new().score(Some(&oversold_snapshot())).unwrap();

        assert_eq!(scores.valuation_score, 30.0);
        assert_eq!(scores.trend_score, 24.0);
        assert_eq!(scores.volatility_score, 18.0);
        assert_eq!(scores.special_event_score, 13.0);
        assert_eq!(scores.total_score, 85.0);
        assert!(!scores.is_default);
    }

    #[test]
    fn test_missing_snapshot_is_neutral_default() {
        let scores = ScoreEngine::new().score(None).unwrap();
        assert!(scores.is_default);
        assert_eq!(scores.total_score, 40.0);
    }

    #[test]
    fn test_price_only_snapshot_uses_bases() {
        let scores = ScoreEngine::new()
            .score(Some(&MarketSnapshot::new("X", 10.0)))
            .unwrap();
        assert_eq!(scores.valuation_score, 12.0);
        assert_eq!(scores.trend_score, 12.0);
        assert_eq!(scores.volatility_score, 10.0);
        assert_eq!(scores.special_event_score, 0.0);
        assert_eq!(scores.total_score, 34.0);
    }

    #[test]
    fn test_invalid_snapshot_is_error() {
        let bad = MarketSnapshot {
            lookback_days: 0,
            ..MarketSnapshot::new("BAD", 10.0)
        };
        let err = ScoreEngine::new().score(Some(&bad)).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidSnapshot { ref code, .. } if code == "BAD"));
    }

    #[test]
    fn test_overbought_scores_low() {
        let hot = MarketSnapshot {
            week52_high: Some(100.0),
            week52_low: Some(50.0),
            ma_20: Some(95.0),
            ma_50: Some(90.0),
            ma_200: Some(80.0),
            rsi_14: Some(82.0),
            atr_percentile: Some(0.2),
            recent_drawdown: Some(0.0),
            ..MarketSnapshot::new("HOT", 99.0)
        };
        let scores = ScoreEngine::new().score(Some(&hot)).unwrap();

        // 12 - 6 - 6 = 0
        assert_eq!(scores.valuation_score, 0.0);
        // 12 - 10 + 3 = 5
        assert_eq!(scores.trend_score, 5.0);
        // 10 - 3 = 7
        assert_eq!(scores.volatility_score, 7.0);
        assert_eq!(scores.special_event_score, 0.0);
        assert_eq!(scores.total_score, 12.0);
    }

    #[test]
    fn test_volatility_bonus_halved_when_not_depressed() {
        let base = MarketSnapshot {
            week52_high: Some(100.0),
            week52_low: Some(0.5),
            ma_200: Some(60.0),
            atr_percentile: Some(0.95),
            ..MarketSnapshot::new("X", 80.0)
        };
        let scores = ScoreEngine::new().score(Some(&base)).unwrap();
        assert_eq!(scores.volatility_score, 15.0);

        let depressed = MarketSnapshot {
            ma_200: Some(90.0),
            ..base
        };
        let scores = ScoreEngine::new().score(Some(&depressed)).unwrap();
        assert_eq!(scores.volatility_score, 20.0);
    }

    #[test]
    fn test_atr_ratio_fallback() {
        let s = MarketSnapshot {
            atr_20: Some(4.2),
            atr_baseline: Some(2.0),
            ..MarketSnapshot::new("X", 10.0)
        };
        // 지표 부재 → 눌림으로 간주, 비율 2.1 → +10
        let scores = ScoreEngine::new().score(Some(&s)).unwrap();
        assert_eq!(scores.volatility_score, 20.0);
    }

    #[test]
    fn test_volume_surge_requires_decline() {
        let rising = MarketSnapshot {
            recent_drawdown: Some(0.0),
            volume: Some(3_000.0),
            volume_avg_20: Some(1_000.0),
            ..MarketSnapshot::new("X", 10.0)
        };
        let scores = ScoreEngine::new().score(Some(&rising)).unwrap();
        assert_eq!(scores.special_event_score, 0.0);

        let falling = MarketSnapshot {
            recent_drawdown: Some(-0.09),
            ..rising
        };
        let scores = ScoreEngine::new().score(Some(&falling)).unwrap();
        // 15 + min(5, 6) = 20
        assert_eq!(scores.special_event_score, 20.0);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let engine = ScoreEngine::new();
        let snapshot = oversold_snapshot();
        assert_eq!(
            engine.score(Some(&snapshot)).unwrap(),
            engine.score(Some(&snapshot)).unwrap()
        );
    }

    fn arb_snapshot() -> impl Strategy<Value = MarketSnapshot> {
        (
            (0.01f64..1_000.0, proptest::option::of(0.0f64..1.0), proptest::option::of(0.5f64..2.0)),
            (proptest::option::of(0.0f64..100.0), proptest::option::of(0.0f64..1.0)),
            (proptest::option::of(-0.5f64..0.1), proptest::option::of(0.0f64..6.0)),
            (proptest::option::of(0.1f64..5.0), 0u8..3),
        )
            .prop_map(|((price, position, ma_ratio), (rsi, pct), (dd, surge), (atr_ratio, cross))| {
                MarketSnapshot {
                    week52_low: position.map(|p| price * (1.0 - p) * 0.9),
                    week52_high: position.map(|p| price * (1.0 + (1.0 - p)) * 1.1),
                    ma_200: ma_ratio.map(|r| price * r),
                    ma_20: ma_ratio.map(|r| price * (1.0 + r) / 2.0),
                    ma_50: ma_ratio.map(|r| price * (1.0 + 3.0 * r) / 4.0),
                    ma_cross: match cross {
                        0 => MaCross::Golden,
                        1 => MaCross::Death,
                        _ => MaCross::None,
                    },
                    rsi_14: rsi,
                    atr_percentile: pct,
                    atr_20: atr_ratio,
                    atr_baseline: atr_ratio.map(|_| 1.0),
                    recent_drawdown: dd,
                    volume: surge.map(|s| s * 1_000.0),
                    volume_avg_20: surge.map(|_| 1_000.0),
                    ..MarketSnapshot::new("P", price)
                }
            })
    }

    proptest! {
        #[test]
        fn prop_scores_stay_in_bounds(snapshot in arb_snapshot()) {
            let scores = ScoreEngine::new().score(Some(&snapshot)).unwrap();
            prop_assert!((0.0..=30.0).contains(&scores.valuation_score));
            prop_assert!((0.0..=30.0).contains(&scores.trend_score));
            prop_assert!((0.0..=20.0).contains(&scores.volatility_score));
            prop_assert!((0.0..=20.0).contains(&scores.special_event_score));
            let sum = scores.valuation_score + scores.trend_score
                + scores.volatility_score + scores.special_event_score;
            prop_assert!((scores.total_score - sum.clamp(0.0, 100.0)).abs() < 1e-9);
        }
    }
}
