//! 점수 → 표시용 계수 변환.
//!
//! 계수는 점수에서 단방향으로 투영된 정보성 값입니다. 투자 금액 계산은
//! 점수와 빈도 정책만 사용하며 계수를 읽지 않습니다.
//!
//! # 구간 (선형 보간)
//!
//! | 차원 | 점수 → 계수 |
//! |---|---|
//! | 밸류에이션 | 0 → 0.0, 12 → 1.0, 21 → 2.0, 30 → 3.0 |
//! | 추세 | 0 → 0.0, 12 → 1.0, 21 → 2.0, 30 → 3.0 |
//! | 변동성 | 0 → 0.0, 10 → 1.0, 20 → 2.0 |
//!
//! 중립 기준점(밸류에이션/추세 12, 변동성 10)이 계수 1.0에 대응합니다.

use dca_core::{Coefficients, ComponentScores};

const VALUATION_BANDS: &[(f64, f64)] = &[(0.0, 0.0), (12.0, 1.0), (21.0, 2.0), (30.0, 3.0)];
const TREND_BANDS: &[(f64, f64)] = &[(0.0, 0.0), (12.0, 1.0), (21.0, 2.0), (30.0, 3.0)];
const VOLATILITY_BANDS: &[(f64, f64)] = &[(0.0, 0.0), (10.0, 1.0), (20.0, 2.0)];

/// 점수 → 계수 매퍼.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoefficientMapper;

impl CoefficientMapper {
    pub fn new() -> Self {
        Self
    }

    /// 구성 요소 점수를 계수로 변환합니다.
    pub fn map(&self, scores: &ComponentScores) -> Coefficients {
        Coefficients {
            valuation_coefficient: round2(interpolate(VALUATION_BANDS, scores.valuation_score)),
            trend_coefficient: round2(interpolate(TREND_BANDS, scores.trend_score)),
            volatility_coefficient: round2(interpolate(VOLATILITY_BANDS, scores.volatility_score)),
        }
    }
}

/// 구간 양 끝 밖의 값은 끝점 계수로 고정합니다.
fn interpolate(bands: &[(f64, f64)], x: f64) -> f64 {
    let (Some(&(x0, y0)), Some(&(xn, yn))) = (bands.first(), bands.last()) else {
        return 0.0;
    };
    if x.is_nan() || x <= x0 {
        return y0;
    }
    if x >= xn {
        return yn;
    }

    bands
        .windows(2)
        .find(|w| x <= w[1].0)
        .map(|w| {
            let (xa, ya) = w[0];
            let (xb, yb) = w[1];
            ya + (yb - ya) * (x - xa) / (xb - xa)
        })
        .unwrap_or(yn)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
