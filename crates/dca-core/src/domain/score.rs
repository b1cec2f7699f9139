//! 시장 점수 및 표시용 계수.
//!
//! # 점수 구성 (합계 0~100)
//!
//! | 구성 요소 | 범위 |
//! |---|---|
//! | 밸류에이션 | 0 ~ 30 |
//! | 추세 | 0 ~ 30 |
//! | 변동성 | 0 ~ 20 |
//! | 특수 이벤트 | 0 ~ 20 |

use serde::{Deserialize, Serialize};

/// 밸류에이션 점수 상한.
pub const VALUATION_MAX: f64 = 30.0;
/// 추세 점수 상한.
pub const TREND_MAX: f64 = 30.0;
/// 변동성 점수 상한.
pub const VOLATILITY_MAX: f64 = 20.0;
/// 특수 이벤트 점수 상한.
pub const SPECIAL_EVENT_MAX: f64 = 20.0;
/// 총점 상한.
pub const TOTAL_MAX: f64 = 100.0;

/// 스냅샷이 없을 때의 중립 총점.
pub const NEUTRAL_TOTAL: f64 = 40.0;

/// 구성 요소별 점수.
///
/// 불변식: `total_score == clip(네 구성 요소의 합, 0, 100)`.
/// 생성자를 통해서만 만들어지므로 항상 성립합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub valuation_score: f64,
    pub trend_score: f64,
    pub volatility_score: f64,
    pub special_event_score: f64,
    pub total_score: f64,
    /// 스냅샷 부재로 중립 기본값을 사용했는지 여부
    pub is_default: bool,
}

impl ComponentScores {
    /// 구성 요소 점수로부터 생성합니다. 각 값은 자신의 범위로 잘립니다.
    pub fn from_components(valuation: f64, trend: f64, volatility: f64, special_event: f64) -> Self {
        let valuation_score = clip(valuation, VALUATION_MAX);
        let trend_score = clip(trend, TREND_MAX);
        let volatility_score = clip(volatility, VOLATILITY_MAX);
        let special_event_score = clip(special_event, SPECIAL_EVENT_MAX);
        let total_score = clip(
            valuation_score + trend_score + volatility_score + special_event_score,
            TOTAL_MAX,
        );

        Self {
            valuation_score,
            trend_score,
            volatility_score,
            special_event_score,
            total_score,
            is_default: false,
        }
    }

    /// 데이터가 없을 때의 중립 기본값 (12/12/8/8, 총 40).
    ///
    /// 각 구성 요소는 자기 범위의 40% 지점에 위치하므로 합계 불변식이 유지됩니다.
    pub fn neutral_default() -> Self {
        let ratio = NEUTRAL_TOTAL / TOTAL_MAX;
        Self {
            is_default: true,
            ..Self::from_components(
                VALUATION_MAX * ratio,
                TREND_MAX * ratio,
                VOLATILITY_MAX * ratio,
                SPECIAL_EVENT_MAX * ratio,
            )
        }
    }

    /// 정수 표시용 점수를 계산합니다.
    ///
    /// 구성 요소를 각각 반올림한 합이 반올림한 총점과 다르면, 범위 안에서 조정 가능한
    /// 가장 큰 구성 요소를 1씩 보정합니다.
    pub fn rounded(&self) -> RoundedScores {
        let maxes = [VALUATION_MAX, TREND_MAX, VOLATILITY_MAX, SPECIAL_EVENT_MAX].map(|m| m as i64);
        let mut parts = [
            self.valuation_score,
            self.trend_score,
            self.volatility_score,
            self.special_event_score,
        ]
        .map(|v| v.round() as i64);
        let total = self.total_score.round() as i64;

        // 드리프트는 구성 요소 수 이내로 제한됨
        for _ in 0..parts.len() {
            let diff = total - parts.iter().sum::<i64>();
            if diff == 0 {
                break;
            }
            let step = diff.signum();
            let candidate = (0..parts.len())
                .filter(|&i| {
                    let next = parts[i] + step;
                    (0..=maxes[i]).contains(&next)
                })
                .max_by_key(|&i| (parts[i], std::cmp::Reverse(i)));
            match candidate {
                Some(i) => parts[i] += step,
                None => break,
            }
        }

        RoundedScores {
            valuation_score: parts[0] as u32,
            trend_score: parts[1] as u32,
            volatility_score: parts[2] as u32,
            special_event_score: parts[3] as u32,
            total_score: total as u32,
        }
    }
}

fn clip(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

/// 정수 표시용 점수. 구성 요소 합이 항상 총점과 같습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundedScores {
    pub valuation_score: u32,
    pub trend_score: u32,
    pub volatility_score: u32,
    pub special_event_score: u32,
    pub total_score: u32,
}

impl RoundedScores {
    /// 구성 요소 합.
    pub fn component_sum(&self) -> u32 {
        self.valuation_score + self.trend_score + self.volatility_score + self.special_event_score
    }
}

/// 표시용 계수.
///
/// 점수에서 단방향으로 투영된 값이며 투자 금액 계산에는 사용되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// 밸류에이션 계수 (0 ~ 3)
    pub valuation_coefficient: f64,
    /// 추세 계수 (0 ~ 3)
    pub trend_coefficient: f64,
    /// 변동성 계수 (0 ~ 2)
    pub volatility_coefficient: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_neutral_default() {
        let scores = ComponentScores::neutral_default();
        assert!(scores.is_default);
        assert_eq!(scores.total_score, 40.0);
        assert_eq!(scores.valuation_score, 12.0);
        assert_eq!(scores.trend_score, 12.0);
        assert_eq!(scores.volatility_score, 8.0);
        assert_eq!(scores.special_event_score, 8.0);
    }

    #[test]
    fn test_components_are_clipped() {
        let scores = ComponentScores::from_components(45.0, -3.0, 25.0, f64::NAN);
        assert_eq!(scores.valuation_score, 30.0);
        assert_eq!(scores.trend_score, 0.0);
        assert_eq!(scores.volatility_score, 20.0);
        assert_eq!(scores.special_event_score, 0.0);
        assert_eq!(scores.total_score, 50.0);
        assert!(!scores.is_default);
    }

    #[test]
    fn test_rounding_drift_adjusts_largest() {
        // 12.5 + 12.5 + 0.5 + 0.4 = 25.9 → 부분 반올림 13+13+1+0 = 27, 총점 26
        let scores = ComponentScores::from_components(12.5, 12.5, 0.5, 0.4);
        let rounded = scores.rounded();
        assert_eq!(rounded.total_score, 26);
        assert_eq!(rounded.component_sum(), 26);
        assert_eq!(rounded.valuation_score, 12);
        assert_eq!(rounded.trend_score, 13);
    }

    proptest! {
        #[test]
        fn prop_total_is_clipped_sum(
            v in -10.0f64..40.0,
            t in -10.0f64..40.0,
            vol in -10.0f64..30.0,
            s in -10.0f64..30.0,
        ) {
            let scores = ComponentScores::from_components(v, t, vol, s);
            prop_assert!((0.0..=VALUATION_MAX).contains(&scores.valuation_score));
            prop_assert!((0.0..=TREND_MAX).contains(&scores.trend_score));
            prop_assert!((0.0..=VOLATILITY_MAX).contains(&scores.volatility_score));
            prop_assert!((0.0..=SPECIAL_EVENT_MAX).contains(&scores.special_event_score));
            let sum = scores.valuation_score + scores.trend_score
                + scores.volatility_score + scores.special_event_score;
            prop_assert!((scores.total_score - sum.clamp(0.0, TOTAL_MAX)).abs() < 1e-9);
        }

        #[test]
        fn prop_rounded_parts_sum_to_rounded_total(
            v in 0.0f64..=30.0,
            t in 0.0f64..=30.0,
            vol in 0.0f64..=20.0,
            s in 0.0f64..=20.0,
        ) {
            let rounded = ComponentScores::from_components(v, t, vol, s).rounded();
            prop_assert_eq!(rounded.component_sum(), rounded.total_score);
            prop_assert!(rounded.valuation_score <= 30);
            prop_assert!(rounded.trend_score <= 30);
            prop_assert!(rounded.volatility_score <= 20);
            prop_assert!(rounded.special_event_score <= 20);
        }
    }
}
