//! 투자 계획 생성기.
//!
//! 자산별 스냅샷을 점수 → 특수 조건 → 빈도 결정으로 변환하고,
//! 바스켓 신호로 서킷 브레이커를 평가한 뒤 축소 배수를 적용하여 금액과 일정을 배정합니다.
//!
//! # 금액 계산
//!
//! ```text
//! monthly_amount = weight × monthly_investment × amount_factor × reduction_factor
//! single_amount  = monthly_amount / 투자 일자 수
//! ```
//!
//! 금액은 소수점 둘째 자리에서 반올림합니다 (MidpointAwayFromZero).
//! extreme_oversold로 분류된 자산은 남은 버퍼 풀에서 `weight × buffer_amount`만큼 추가 배정받습니다.
//!
//! 생성기는 I/O를 하지 않습니다. 브레이커 상태를 입력받고 평가 후 상태를 결과로 돌려줍니다.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};
use uuid::Uuid;

use dca_analytics::{CoefficientMapper, FrequencyPolicy, ScoreEngine, SpecialConditionDetector};
use dca_core::{
    asset_span, AppConfig, Asset, AssetDetail, CircuitBreakerState, Coefficients, ComponentScores,
    ConditionType, FrequencyDecision, InvestmentDetails, InvestmentPlan, InvestmentRecommendation,
    MarketDataStatus, MarketSnapshot, SkippedAsset, SnapshotSource, SpecialCondition, TargetMonth,
    UserConfig,
};
use dca_data::FetchOutcome;
use dca_risk::{AssetSignal, BreakerTransition, CircuitBreakerController};

use crate::error::PlanResult;
use crate::schedule::InvestmentSchedule;

/// 계획 생성 입력.
#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    pub user_config: &'a UserConfig,
    /// 자산별 수집 결과 (코드로 매칭, 없는 자산은 데이터 없음으로 처리)
    pub market_data: &'a [FetchOutcome],
    /// 평가 전 브레이커 상태
    pub breaker_state: &'a CircuitBreakerState,
    pub target_month: TargetMonth,
    pub rebalance_required: bool,
    /// 과거 재현 기준일 (실시간 계획은 None)
    pub historical_date: Option<NaiveDate>,
    pub now: DateTime<Utc>,
}

/// 계획 생성 결과.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: InvestmentPlan,
    pub details: InvestmentDetails,
    /// 브레이커 평가 결과 (영속화 여부는 호출자가 결정)
    pub breaker: BreakerTransition,
}

/// 점수 계산까지 마친 자산.
struct EvaluatedAsset<'a> {
    asset: &'a Asset,
    scores: ComponentScores,
    coefficients: Coefficients,
    condition: Option<SpecialCondition>,
    decision: FrequencyDecision,
}

/// 투자 계획 생성기.
#[derive(Debug, Clone)]
pub struct PlanGenerator {
    scorer: ScoreEngine,
    mapper: CoefficientMapper,
    detector: SpecialConditionDetector,
    policy: FrequencyPolicy,
    breaker: CircuitBreakerController,
    schedule: InvestmentSchedule,
    weight_tolerance: f64,
}

impl Default for PlanGenerator {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl PlanGenerator {
    /// 애플리케이션 설정으로 생성합니다.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            scorer: ScoreEngine::new(),
            mapper: CoefficientMapper::new(),
            detector: SpecialConditionDetector::new(config.detector.clone()),
            policy: FrequencyPolicy::new(),
            breaker: CircuitBreakerController::new(config.breaker.clone()),
            schedule: InvestmentSchedule::new(&config.planning),
            weight_tolerance: config.planning.weight_tolerance,
        }
    }

    /// 사용자 설정 검증 (점수 계산 전에 실패).
    pub fn validate(&self, user_config: &UserConfig) -> PlanResult<()> {
        user_config.validate(self.weight_tolerance)?;
        Ok(())
    }

    /// 계획 생성.
    pub fn generate(&self, request: PlanRequest<'_>) -> PlanResult<PlanOutcome> {
        let config = request.user_config;
        self.validate(config)?;

        let plan_id = Uuid::new_v4();
        let mut warnings = Vec::new();
        let mut skipped = Vec::new();
        let mut evaluated = Vec::with_capacity(config.assets.len());
        let mut detail_entries = BTreeMap::new();

        // =====================================================================
        // 1. 자산별 점수/조건/빈도
        // =====================================================================
        for asset in &config.assets {
            let _span = asset_span!("evaluate_asset", asset.code, request.target_month).entered();
            let fetched = request.market_data.iter().find(|o| o.code == asset.code);
            let snapshot = fetched
                .filter(|o| o.source.has_data())
                .and_then(|o| o.snapshot.as_ref());
            let status = market_data_status(fetched, snapshot);

            let scores = match self.scorer.score(snapshot) {
                Ok(scores) => scores,
                Err(e) => {
                    warn!(code = %asset.code, error = %e, "잘못된 스냅샷, 자산 제외");
                    skipped.push(SkippedAsset {
                        code: asset.code.clone(),
                        reason: e.to_string(),
                    });
                    detail_entries.insert(asset.code.clone(), AssetDetail {
                        market_data_status: status,
                        coefficients: None,
                        frequency: None,
                        special_conditions: Vec::new(),
                        market_scores: None,
                        rounded_scores: None,
                    });
                    continue;
                }
            };

            if scores.is_default {
                warnings.push(format!(
                    "{}: 시장 데이터 없음 ({}), 중립 기본값 사용",
                    asset.code, status.source
                ));
            }

            let coefficients = self.mapper.map(&scores);
            let condition = self.detector.detect(snapshot);
            let decision = self.policy.decide(scores.total_score, condition.as_ref());

            debug!(
                code = %asset.code,
                total_score = scores.total_score,
                level = %decision.level,
                frequency = ?decision.frequency,
                overridden = decision.overridden,
                "자산 평가 완료"
            );

            detail_entries.insert(asset.code.clone(), AssetDetail {
                market_data_status: status,
                coefficients: Some(coefficients),
                frequency: Some(decision.clone()),
                special_conditions: condition.iter().cloned().collect(),
                market_scores: Some(scores),
                rounded_scores: Some(scores.rounded()),
            });

            evaluated.push(EvaluatedAsset {
                asset,
                scores,
                coefficients,
                condition,
                decision,
            });
        }

        // =====================================================================
        // 2. 서킷 브레이커
        // =====================================================================
        let signals: Vec<AssetSignal> = evaluated
            .iter()
            .map(|e| AssetSignal {
                weight: e.asset.weight,
                total_score: e.scores.total_score,
                is_risk: e.decision.level.is_risk(),
            })
            .collect();
        let signal = self.breaker.aggregate(&signals);
        let transition = self.breaker.evaluate(request.breaker_state, signal, request.now);
        let reduction = transition.state.reduction_factor;

        if transition.state.level != transition.from {
            warnings.push(format!(
                "서킷 브레이커 {} → {} (축소 배수 {})",
                transition.from, transition.state.level, reduction
            ));
        }

        // =====================================================================
        // 3. 금액/일정 배정
        // =====================================================================
        let monthly = config.monthly_investment;
        let mut remaining_buffer = config.buffer_amount;
        let mut recommendations = Vec::with_capacity(evaluated.len());

        for e in evaluated {
            let weight = to_decimal(e.asset.weight);
            let factor = to_decimal(e.decision.amount_factor);
            let base_amount = round_money(weight * monthly * factor * reduction);

            let buffer_top_up = if e.decision.level == ConditionType::ExtremeOversold {
                let requested = round_money(weight * config.buffer_amount);
                let top_up = requested.min(remaining_buffer).max(Decimal::ZERO);
                remaining_buffer -= top_up;
                top_up
            } else {
                Decimal::ZERO
            };

            let monthly_amount = base_amount + buffer_top_up;
            let investment_dates = self
                .schedule
                .dates(e.decision.frequency, request.target_month);
            let single_amount = if investment_dates.is_empty() {
                Decimal::ZERO
            } else {
                round_money(monthly_amount / Decimal::from(investment_dates.len()))
            };

            recommendations.push(InvestmentRecommendation {
                asset: e.asset.clone(),
                rounded_scores: e.scores.rounded(),
                scores: e.scores,
                coefficients: e.coefficients,
                decision: e.decision,
                special_condition: e.condition,
                monthly_amount,
                single_amount,
                buffer_top_up,
                investment_dates,
            });
        }

        let buffer_pool_usage = config.buffer_amount - remaining_buffer;
        let circuit_breaker_triggered = recommendations
            .iter()
            .any(|r| r.decision.level.is_risk());

        let plan = InvestmentPlan {
            id: plan_id,
            generated_at: request.now,
            target_month: request.target_month,
            total_monthly_amount: monthly,
            effective_monthly_amount: round_money(monthly * reduction),
            buffer_amount: config.buffer_amount,
            buffer_pool_usage,
            rebalance_required: request.rebalance_required,
            circuit_breaker_triggered,
            circuit_breaker_level: transition.state.level,
            reduction_factor: reduction,
            warnings,
            skipped_assets: skipped.clone(),
            historical_date: request.historical_date,
            recommendations,
        };

        info!(
            plan_id = %plan.id,
            target_month = %plan.target_month,
            assets = plan.recommendations.len(),
            skipped = plan.skipped_assets.len(),
            breaker_level = %plan.circuit_breaker_level,
            allocated = %plan.allocated_total(),
            historical = plan.historical_date.is_some(),
            "투자 계획 생성 완료"
        );

        let details = InvestmentDetails {
            plan_id,
            generated_at: request.now,
            assets: detail_entries,
            issues: skipped,
        };

        Ok(PlanOutcome {
            plan,
            details,
            breaker: transition,
        })
    }
}

fn market_data_status(
    fetched: Option<&FetchOutcome>,
    snapshot: Option<&MarketSnapshot>,
) -> MarketDataStatus {
    MarketDataStatus {
        has_market_data: snapshot.is_some(),
        updated_at: fetched.and_then(|o| o.updated_at),
        source: fetched.map(|o| o.source).unwrap_or(SnapshotSource::Missing),
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// 통화 단위 반올림 (소수점 둘째 자리).
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dca_core::{AssetType, BreakerLevel, Frequency};
    use rust_decimal_macros::dec;

    fn outcome(snapshot: MarketSnapshot) -> FetchOutcome {
        FetchOutcome {
            code: snapshot.code.clone(),
            updated_at: Some(snapshot.captured_at),
            snapshot: Some(snapshot),
            source: SnapshotSource::Live,
            attempts: 1,
            last_error: None,
        }
    }

    fn request<'a>(
        config: &'a UserConfig,
        data: &'a [FetchOutcome],
        state: &'a CircuitBreakerState,
    ) -> PlanRequest<'a> {
        PlanRequest {
            user_config: config,
            market_data: data,
            breaker_state: state,
            target_month: TargetMonth::new(2024, 3).unwrap(),
            rebalance_required: false,
            historical_date: None,
            now: Utc::now(),
        }
    }

    /// 총점 85 스냅샷 (30/24/18/13).
    fn oversold(code: &str) -> MarketSnapshot {
        MarketSnapshot {
            week52_high: Some(200.0),
            week52_low: Some(100.0),
            ma_200: Some(137.5),
            rsi_14: Some(25.0),
            atr_percentile: Some(0.85),
            recent_drawdown: Some(-0.07),
            volume: Some(1_600.0),
            volume_avg_20: Some(1_000.0),
            ..MarketSnapshot::new(code, 110.0)
        }
    }

    /// 총점 12 스냅샷.
    fn overbought(code: &str) -> MarketSnapshot {
        MarketSnapshot {
            week52_high: Some(100.0),
            week52_low: Some(50.0),
            ma_20: Some(95.0),
            ma_50: Some(90.0),
            ma_200: Some(80.0),
            rsi_14: Some(82.0),
            atr_percentile: Some(0.1),
            ..MarketSnapshot::new(code, 98.0)
        }
    }

    #[test]
    fn test_invalid_config_fails_before_scoring() {
        let generator = PlanGenerator::default();
        let config = UserConfig::new(dec!(0), dec!(-1), Vec::new());
        let state = CircuitBreakerState::default();

        let err = generator.generate(request(&config, &[], &state)).unwrap_err();
        match err {
            crate::PlanError::InvalidConfig(issues) => {
                let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
                assert!(fields.contains(&"monthly_investment"));
                assert!(fields.contains(&"buffer_amount"));
                assert!(fields.contains(&"assets"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_snapshot_is_skipped() {
        let generator = PlanGenerator::default();
        let config = UserConfig::new(
            dec!(1000),
            dec!(0),
            vec![
                Asset::new("A", "A", AssetType::CnIndex, 0.5),
                Asset::new("B", "B", AssetType::Bond, 0.5),
            ],
        );
        let data = vec![outcome(MarketSnapshot::new("A", -1.0)), outcome(MarketSnapshot::new("B", 10.0))];
        let state = CircuitBreakerState::default();

        let result = generator.generate(request(&config, &data, &state)).unwrap();
        assert_eq!(result.plan.recommendations.len(), 1);
        assert_eq!(result.plan.skipped_assets[0].code, "A");
        assert_eq!(result.details.issues.len(), 1);
        assert!(result.details.assets["A"].market_scores.is_none());
        assert!(result.details.assets["B"].market_scores.is_some());
    }

    #[test]
    fn test_buffer_top_up_for_extreme_oversold() {
        let generator = PlanGenerator::default();
        let config = UserConfig::new(
            dec!(1000),
            dec!(300),
            vec![
                Asset::new("A", "A", AssetType::CnIndex, 0.6),
                Asset::new("B", "B", AssetType::UsIndex, 0.4),
            ],
        );
        let data = vec![outcome(oversold("A")), outcome(MarketSnapshot::new("B", 10.0))];
        let state = CircuitBreakerState::default();

        let result = generator.generate(request(&config, &data, &state)).unwrap();
        let a = result.plan.recommendation("A").unwrap();
        assert_eq!(a.decision.frequency, Frequency::Daily);
        // 0.6 × 1000 × 1.5 = 900, 버퍼 0.6 × 300 = 180
        assert_eq!(a.buffer_top_up, dec!(180));
        assert_eq!(a.monthly_amount, dec!(1080));
        assert_eq!(result.plan.buffer_pool_usage, dec!(180));

        let b = result.plan.recommendation("B").unwrap();
        assert_eq!(b.buffer_top_up, Decimal::ZERO);
    }

    #[test]
    fn test_buffer_pool_is_never_overdrawn() {
        let generator = PlanGenerator::default();
        // 비중 합계 1.04 (허용 오차 이내)
        let config = UserConfig::new(
            dec!(1000),
            dec!(1000),
            vec![
                Asset::new("A", "A", AssetType::CnIndex, 0.52),
                Asset::new("B", "B", AssetType::UsIndex, 0.52),
            ],
        );
        let data = vec![outcome(oversold("A")), outcome(oversold("B"))];
        let state = CircuitBreakerState::default();

        let result = generator.generate(request(&config, &data, &state)).unwrap();
        let a = result.plan.recommendation("A").unwrap();
        let b = result.plan.recommendation("B").unwrap();
        assert_eq!(a.decision.level, ConditionType::ExtremeOversold);
        assert_eq!(b.decision.level, ConditionType::ExtremeOversold);

        // 요청 520 + 520, 남은 풀 480만 B에 배정
        assert_eq!(a.buffer_top_up, dec!(520));
        assert_eq!(b.buffer_top_up, dec!(480));
        assert_eq!(result.plan.buffer_pool_usage, dec!(1000));
        assert!(result.plan.buffer_pool_usage <= config.buffer_amount);
    }

    #[test]
    fn test_risk_assets_trigger_breaker() {
        let generator = PlanGenerator::default();
        let config = UserConfig::new(
            dec!(1000),
            dec!(0),
            vec![Asset::new("A", "A", AssetType::UsIndex, 1.0)],
        );
        let data = vec![outcome(overbought("A"))];
        let state = CircuitBreakerState::default();

        let result = generator.generate(request(&config, &data, &state)).unwrap();
        let a = result.plan.recommendation("A").unwrap();
        assert_eq!(a.decision.level, ConditionType::Bubble);
        assert!(result.plan.circuit_breaker_triggered);
        assert_eq!(result.plan.circuit_breaker_level, BreakerLevel::Light);
        assert_eq!(result.plan.reduction_factor, dec!(0.8));
        // 1.0 × 1000 × 0.5 × 0.8
        assert_eq!(a.monthly_amount, dec!(400));
        assert_eq!(result.plan.effective_monthly_amount, dec!(800));
    }

    #[test]
    fn test_single_amount_is_rounded() {
        let generator = PlanGenerator::default();
        let config = UserConfig::new(
            dec!(1000),
            dec!(0),
            vec![Asset::new("A", "A", AssetType::Gold, 1.0)],
        );
        let data = vec![outcome(oversold("A"))];
        let state = CircuitBreakerState::default();

        let result = generator.generate(request(&config, &data, &state)).unwrap();
        let a = result.plan.recommendation("A").unwrap();
        // 1500 / 21 = 71.428...
        assert_eq!(a.investment_dates.len(), 21);
        assert_eq!(a.single_amount, dec!(71.43));
    }

    #[test]
    fn test_round_money_midpoint() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(2.344)), dec!(2.34));
    }
}
