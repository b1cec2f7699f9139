//! Circuit Breaker 컨트롤러.
//!
//! 바스켓 전체 시장 신호로 투자 축소 단계를 결정합니다.
//!
//! # 상태 전이
//!
//! ```text
//! Normal ──[악화]──> Light ──[악화]──> Moderate ──[악화]──> Severe
//!    ↑                 │                  │                    │
//!    └──[N회 연속 개선]─┴──[N회 연속 개선]──┴──[N회 연속 개선]───┘
//! ```
//!
//! - 악화(목표 단계가 현재보다 제한적): 해당 평가에서 즉시 한 단계 축소, 개선 카운터 리셋
//! - 개선(목표 단계가 현재보다 완화): 카운터 증가, N회(기본 3) 도달 시 정확히 한 단계 회복
//! - 유지(목표 단계 = 현재): 카운터 리셋
//!
//! 한 번의 평가로 두 단계 이상 이동하지 않습니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dca_core::{BreakerLevel, BreakerSignal, CircuitBreakerConfig, CircuitBreakerState, NEUTRAL_TOTAL};

/// 자산 하나가 브레이커 신호에 기여하는 값.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetSignal {
    /// 바스켓 내 비중
    pub weight: f64,
    /// 총점 (0 ~ 100)
    pub total_score: f64,
    /// 버블/시스템 리스크로 분류되었는지 여부
    pub is_risk: bool,
}

/// 전이 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// 한 단계 축소
    Tightened,
    /// 한 단계 회복
    Recovered,
    /// 회복 조건 누적 중 (단계 유지)
    RecoveryPending,
    /// 변화 없음
    Held,
}

/// 평가 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerTransition {
    pub from: BreakerLevel,
    pub to: BreakerLevel,
    /// 이번 평가의 목표 단계
    pub target: BreakerLevel,
    pub kind: TransitionKind,
    /// 평가 후 상태
    pub state: CircuitBreakerState,
}

/// Circuit Breaker 컨트롤러.
///
/// 상태를 직접 보관하지 않는 순수 상태 전이기입니다.
///
/// # Example
///
/// ```ignore
/// let controller = CircuitBreakerController::new(CircuitBreakerConfig::default());
/// let signal = controller.aggregate(&signals);
/// let transition = controller.evaluate(&current_state, signal, Utc::now());
/// store.commit_generation(&plan, &details, &transition.state).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerController {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerController {
    /// 새 컨트롤러 생성.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self { config }
    }

    /// 설정 반환.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// 자산별 신호를 바스켓 신호로 집계합니다.
    ///
    /// 비중 합이 0이면 단순 평균을, 자산이 없으면 중립 신호를 사용합니다.
    pub fn aggregate(&self, signals: &[AssetSignal]) -> BreakerSignal {
        if signals.is_empty() {
            return BreakerSignal {
                weighted_score: NEUTRAL_TOTAL,
                risk_fraction: 0.0,
            };
        }

        let total_weight: f64 = signals.iter().map(|s| s.weight.max(0.0)).sum();
        let weight_of = |s: &AssetSignal| {
            if total_weight > 0.0 {
                s.weight.max(0.0) / total_weight
            } else {
                1.0 / signals.len() as f64
            }
        };

        let weighted_score = signals.iter().map(|s| weight_of(s) * s.total_score).sum();
        let risk_fraction = signals
            .iter()
            .filter(|s| s.is_risk)
            .map(|s| weight_of(s))
            .sum();

        BreakerSignal {
            weighted_score,
            risk_fraction,
        }
    }

    /// 신호가 가리키는 목표 단계 (점수 기준과 위험 비중 기준 중 더 제한적인 쪽).
    pub fn target_level(&self, signal: &BreakerSignal) -> BreakerLevel {
        let cfg = &self.config;

        let by_score = if signal.weighted_score <= cfg.severe_score {
            BreakerLevel::Severe
        } else if signal.weighted_score < cfg.moderate_score {
            BreakerLevel::Moderate
        } else if signal.weighted_score < cfg.light_score {
            BreakerLevel::Light
        } else {
            BreakerLevel::Normal
        };

        let by_risk = if signal.risk_fraction >= cfg.severe_risk_fraction {
            BreakerLevel::Severe
        } else if signal.risk_fraction >= cfg.moderate_risk_fraction {
            BreakerLevel::Moderate
        } else if signal.risk_fraction >= cfg.light_risk_fraction {
            BreakerLevel::Light
        } else {
            BreakerLevel::Normal
        };

        by_score.max(by_risk)
    }

    /// 현재 상태와 신호로 다음 상태를 계산합니다.
    pub fn evaluate(
        &self,
        current: &CircuitBreakerState,
        signal: BreakerSignal,
        now: DateTime<Utc>,
    ) -> BreakerTransition {
        let from = current.level;
        let target = self.target_level(&signal);

        let (to, improvements, kind) = if target > from {
            (from.tighter(), 0, TransitionKind::Tightened)
        } else if target < from {
            let count = current.consecutive_improvements.saturating_add(1);
            if count >= self.config.recovery_evaluations {
                (from.looser(), 0, TransitionKind::Recovered)
            } else {
                (from, count, TransitionKind::RecoveryPending)
            }
        } else {
            (from, 0, TransitionKind::Held)
        };

        match kind {
            TransitionKind::Tightened => warn!(
                from = %from,
                to = %to,
                target = %target,
                weighted_score = signal.weighted_score,
                risk_fraction = signal.risk_fraction,
                "Circuit breaker tightened"
            ),
            TransitionKind::Recovered => info!(
                from = %from,
                to = %to,
                weighted_score = signal.weighted_score,
                "Circuit breaker recovered one level"
            ),
            TransitionKind::RecoveryPending => debug!(
                level = %from,
                consecutive_improvements = improvements,
                required = self.config.recovery_evaluations,
                "Circuit breaker recovery pending"
            ),
            TransitionKind::Held => debug!(level = %from, "Circuit breaker held"),
        }

        let state = CircuitBreakerState {
            level: to,
            reduction_factor: to.reduction_factor(),
            consecutive_improvements: improvements,
            last_signal: Some(signal),
            updated_at: Some(now),
        };

        BreakerTransition {
            from,
            to,
            target,
            kind,
            state,
        }
    }
}
