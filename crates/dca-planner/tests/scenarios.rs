//! 계획 생성 시나리오 통합 테스트.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use rust_decimal_macros::dec;

use dca_core::{
    AppConfig, Asset, AssetType, BreakerLevel, CircuitBreakerState, ConditionType, FetcherConfig,
    Frequency, MarketSnapshot, SnapshotSource, StorageConfig, TargetMonth, UserConfig,
};
use dca_data::{FetchOutcome, InMemoryProvider, SnapshotFetcher};
use dca_planner::{GenerateOptions, PlanGenerator, PlanRequest, PlanService};

// =============================================================================
// 헬퍼
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 총점 85 (30/24/18/13).
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

/// 총점 12 (0/5/7/0).
fn overbought(code: &str) -> MarketSnapshot {
    MarketSnapshot {
        week52_high: Some(100.0),
        week52_low: Some(50.0),
        ma_20: Some(95.0),
        ma_50: Some(90.0),
        ma_200: Some(80.0),
        rsi_14: Some(82.0),
        atr_percentile: Some(0.2),
        recent_drawdown: Some(0.0),
        ..MarketSnapshot::new(code, 99.0)
    }
}

fn live(snapshot: MarketSnapshot) -> FetchOutcome {
    FetchOutcome {
        code: snapshot.code.clone(),
        updated_at: Some(snapshot.captured_at),
        snapshot: Some(snapshot),
        source: SnapshotSource::Live,
        attempts: 1,
        last_error: None,
    }
}

fn single_asset(monthly: rust_decimal::Decimal) -> UserConfig {
    UserConfig::new(
        monthly,
        dec!(0),
        vec![Asset::new("510300", "CSI 300", AssetType::CnIndex, 1.0)],
    )
}

struct Harness {
    provider: Arc<InMemoryProvider>,
    service: Arc<PlanService>,
    dir: tempfile::TempDir,
}

async fn harness(config: &UserConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let app = AppConfig {
        storage: StorageConfig {
            data_dir: dir.path().display().to_string(),
            history_retention: 10,
        },
        ..AppConfig::default()
    };

    let provider = Arc::new(InMemoryProvider::new());
    let fetcher = Arc::new(SnapshotFetcher::new(provider.clone(), FetcherConfig::default()));
    let service = Arc::new(PlanService::from_config(&app, fetcher));
    service.update_user_config(config.clone()).await.unwrap();

    Harness {
        provider,
        service,
        dir,
    }
}

// =============================================================================
// 시나리오
// =============================================================================

#[test]
fn scenario_a_extreme_oversold_invests_daily() {
    let generator = PlanGenerator::default();
    let config = single_asset(dec!(5000));
    let data = vec![live(oversold("510300"))];
    let state = CircuitBreakerState::default();
    let month = TargetMonth::new(2024, 7).unwrap();

    let outcome = generator
        .generate(PlanRequest {
            user_config: &config,
            market_data: &data,
            breaker_state: &state,
            target_month: month,
            rebalance_required: false,
            historical_date: None,
            now: Utc::now(),
        })
        .unwrap();

    let rec = &outcome.plan.recommendations[0];
    assert_eq!(rec.scores.total_score, 85.0);
    assert_eq!(rec.decision.frequency, Frequency::Daily);
    assert_eq!(rec.decision.amount_factor, 1.5);
    assert_eq!(outcome.plan.circuit_breaker_level, BreakerLevel::Normal);
    assert_eq!(rec.monthly_amount, dec!(7500));

    let weekdays: Vec<_> = month
        .days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect();
    assert_eq!(rec.investment_dates, weekdays);
}

#[test]
fn scenario_b_missing_snapshot_uses_neutral_default() {
    let generator = PlanGenerator::default();
    let config = single_asset(dec!(1000));
    let state = CircuitBreakerState::default();

    let outcome = generator
        .generate(PlanRequest {
            user_config: &config,
            market_data: &[],
            breaker_state: &state,
            target_month: TargetMonth::new(2024, 7).unwrap(),
            rebalance_required: true,
            historical_date: None,
            now: Utc::now(),
        })
        .unwrap();

    let rec = &outcome.plan.recommendations[0];
    assert!(rec.scores.is_default);
    assert_eq!(rec.scores.total_score, 40.0);
    assert_eq!(rec.decision.frequency, Frequency::Biweekly);
    assert_eq!(rec.decision.amount_factor, 1.0);
    assert_eq!(rec.monthly_amount, dec!(1000));
    assert!(outcome.plan.rebalance_required);
    assert!(!outcome.plan.warnings.is_empty());

    let detail = &outcome.details.assets["510300"];
    assert!(!detail.market_data_status.has_market_data);
    assert_eq!(detail.market_data_status.source, SnapshotSource::Missing);
}

#[tokio::test]
async fn scenario_c_breaker_steps_one_level_per_generation() {
    let h = harness(&single_asset(dec!(1000))).await;
    h.provider.upsert_live(overbought("510300")).await;

    let first = h.service.generate(GenerateOptions::default()).await.unwrap();
    assert_eq!(first.plan.circuit_breaker_level, BreakerLevel::Light);
    assert!(first.plan.circuit_breaker_triggered);
    assert_eq!(
        first.plan.recommendations[0].decision.level,
        ConditionType::Bubble
    );

    let second = h.service.generate(GenerateOptions::default()).await.unwrap();
    assert_eq!(second.plan.circuit_breaker_level, BreakerLevel::Moderate);
    assert_eq!(second.plan.reduction_factor, dec!(0.5));
    // 1000 × 0.5 (bubble) × 0.5 (moderate)
    assert_eq!(second.plan.recommendations[0].monthly_amount, dec!(250));

    let state = h.service.breaker_state().await;
    assert_eq!(state.level, BreakerLevel::Moderate);
    assert_eq!(h.service.history().await.unwrap().len(), 2);
}

#[tokio::test]
async fn scenario_d_replay_leaves_live_state_untouched() {
    let h = harness(&single_asset(dec!(1000))).await;
    h.provider.upsert_live(overbought("510300")).await;
    h.provider
        .insert_historical(date(2024, 3, 14), oversold("510300"))
        .await;

    // 실시간 상태를 Light로 만든 뒤 재현
    h.service.generate(GenerateOptions::default()).await.unwrap();
    let before = h.service.breaker_state().await;
    assert_eq!(before.level, BreakerLevel::Light);

    let replayed = h
        .service
        .generate_historical(date(2024, 3, 15))
        .await
        .unwrap();
    assert_eq!(replayed.plan.historical_date, Some(date(2024, 3, 15)));
    assert_eq!(replayed.plan.recommendations[0].scores.total_score, 85.0);
    assert_eq!(replayed.plan.circuit_breaker_level, BreakerLevel::Normal);

    let after = h.service.breaker_state().await;
    assert_eq!(after, before);
    assert_eq!(h.service.history().await.unwrap().len(), 1);
}

#[test]
fn identical_inputs_yield_identical_recommendations() {
    let generator = PlanGenerator::default();
    let config = UserConfig::new(
        dec!(3000),
        dec!(500),
        vec![
            Asset::new("A", "A", AssetType::CnIndex, 0.5),
            Asset::new("B", "B", AssetType::Gold, 0.3),
            Asset::new("C", "C", AssetType::Bond, 0.2),
        ],
    );
    let data = vec![live(oversold("A")), live(overbought("B"))];
    let state = CircuitBreakerState::at_level(BreakerLevel::Light);
    let month = TargetMonth::new(2024, 11).unwrap();

    let run = || {
        generator
            .generate(PlanRequest {
                user_config: &config,
                market_data: &data,
                breaker_state: &state,
                target_month: month,
                rebalance_required: false,
                historical_date: None,
                now: Utc::now(),
            })
            .unwrap()
    };

    let first = run();
    let second = run();
    assert_ne!(first.plan.id, second.plan.id);
    assert_eq!(first.plan.recommendations, second.plan.recommendations);
    assert_eq!(first.breaker.state.level, second.breaker.state.level);
}

#[tokio::test]
async fn concurrent_generations_do_not_lose_breaker_updates() {
    let h = harness(&single_asset(dec!(1000))).await;
    h.provider.upsert_live(overbought("510300")).await;

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let service = h.service.clone();
            tokio::spawn(async move { service.generate(GenerateOptions::default()).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let state = h.service.breaker_state().await;
    assert_eq!(state.level, BreakerLevel::Severe);
    assert_eq!(h.service.history().await.unwrap().len(), 3);
}

#[tokio::test]
async fn failed_history_write_keeps_breaker_level() {
    let h = harness(&single_asset(dec!(1000))).await;
    h.provider.upsert_live(overbought("510300")).await;
    std::fs::write(h.dir.path().join("plan_history.json"), "{broken").unwrap();

    let err = h.service.generate(GenerateOptions::default()).await.unwrap_err();
    assert!(!err.is_client_error());

    // 과열 신호로 Light가 될 상황이었지만 아무것도 기록되지 않음
    assert_eq!(h.service.breaker_state().await.level, BreakerLevel::Normal);
    assert!(!h.dir.path().join("circuit_breaker.json").exists());
    assert!(!h.dir.path().join("investment_details.json").exists());
}

#[tokio::test]
async fn invalid_user_config_is_rejected_on_update() {
    let h = harness(&single_asset(dec!(1000))).await;

    let bad = UserConfig::new(
        dec!(1000),
        dec!(0),
        vec![
            Asset::new("A", "A", AssetType::CnIndex, 0.5),
            Asset::new("A", "A2", AssetType::CnIndex, 0.2),
        ],
    );
    let err = h.service.update_user_config(bad).await.unwrap_err();
    assert!(err.is_client_error());

    // 기존 설정 유지
    let stored = h.service.user_config().await.unwrap();
    assert_eq!(stored.assets[0].code, "510300");
}
