//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 모든 섹션은 기본값을 가지므로 설정 파일 없이도 엔진을 실행할 수 있습니다.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, CoreResult, FieldIssue};

/// 환경 변수 오버라이드 접두사 (`DCA__SERVER__PORT=8080` 형식).
pub const ENV_PREFIX: &str = "DCA";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 시장 데이터 수집 설정
    #[serde(default)]
    pub fetcher: FetcherConfig,
    /// 특수 조건 감지 임계값
    #[serde(default)]
    pub detector: DetectorConfig,
    /// 서킷 브레이커 설정
    #[serde(default)]
    pub breaker: CircuitBreakerConfig,
    /// 계획 생성 설정
    #[serde(default)]
    pub planning: PlanningConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    #[serde(default = "default_host")]
    pub host: String,
    /// 리스닝할 포트
    #[serde(default = "default_port")]
    pub port: u16,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// span 진입/종료 이벤트 출력 여부
    #[serde(default)]
    pub span_events: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            span_events: false,
        }
    }
}

/// 저장소 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// JSON 파일 저장 디렉토리
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// 보관할 계획 이력 개수 (최신순)
    #[serde(default = "default_history_retention")]
    pub history_retention: usize,
}

fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_history_retention() -> usize {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            history_retention: default_history_retention(),
        }
    }
}

/// 시장 데이터 수집 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// 자산별 1회 요청 타임아웃 (밀리초)
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,
    /// 최대 시도 횟수
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 재시도 간격 기본값 (밀리초, 시도 횟수에 비례해 증가)
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// 실시간 스냅샷 허용 최대 경과 시간 (시간)
    #[serde(default = "default_max_snapshot_age_hours")]
    pub max_snapshot_age_hours: i64,
}

fn default_fetch_timeout_ms() -> u64 {
    5_000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    500
}
fn default_max_snapshot_age_hours() -> i64 {
    72
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_fetch_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            max_snapshot_age_hours: default_max_snapshot_age_hours(),
        }
    }
}

/// 특수 조건 감지 임계값.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// 시스템 리스크: 최근 낙폭 상한 (이하일 때 발동)
    #[serde(default = "default_systemic_drawdown")]
    pub systemic_drawdown: f64,
    /// 시스템 리스크: 거래량 급증 배수 하한
    #[serde(default = "default_systemic_volume_surge")]
    pub systemic_volume_surge: f64,
    /// 시스템 리스크: ATR 퍼센타일 하한
    #[serde(default = "default_systemic_atr_percentile")]
    pub systemic_atr_percentile: f64,
    /// 극단적 과매도: 최근 낙폭 상한
    #[serde(default = "default_oversold_drawdown")]
    pub oversold_drawdown: f64,
    /// 극단적 과매도: RSI 상한
    #[serde(default = "default_oversold_rsi")]
    pub oversold_rsi: f64,
    /// 반등 기회: RSI 하한
    #[serde(default = "default_rebound_rsi_low")]
    pub rebound_rsi_low: f64,
    /// 반등 기회: RSI 상한
    #[serde(default = "default_rebound_rsi_high")]
    pub rebound_rsi_high: f64,
}

fn default_systemic_drawdown() -> f64 {
    -0.15
}
fn default_systemic_volume_surge() -> f64 {
    3.0
}
fn default_systemic_atr_percentile() -> f64 {
    0.95
}
fn default_oversold_drawdown() -> f64 {
    -0.10
}
fn default_oversold_rsi() -> f64 {
    30.0
}
fn default_rebound_rsi_low() -> f64 {
    30.0
}
fn default_rebound_rsi_high() -> f64 {
    45.0
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            systemic_drawdown: default_systemic_drawdown(),
            systemic_volume_surge: default_systemic_volume_surge(),
            systemic_atr_percentile: default_systemic_atr_percentile(),
            oversold_drawdown: default_oversold_drawdown(),
            oversold_rsi: default_oversold_rsi(),
            rebound_rsi_low: default_rebound_rsi_low(),
            rebound_rsi_high: default_rebound_rsi_high(),
        }
    }
}

/// 서킷 브레이커 설정.
///
/// 점수 임계값은 "미만"(severe는 "이하")일 때, 위험 비중 임계값은 "이상"일 때 해당 단계를 목표로 합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CircuitBreakerConfig {
    /// 한 단계 회복에 필요한 연속 개선 평가 횟수
    #[serde(default = "default_recovery_evaluations")]
    pub recovery_evaluations: u32,
    /// Light 목표: 가중 평균 점수 미만
    #[serde(default = "default_light_score")]
    pub light_score: f64,
    /// Moderate 목표: 가중 평균 점수 미만
    #[serde(default = "default_moderate_score")]
    pub moderate_score: f64,
    /// Severe 목표: 가중 평균 점수 이하
    #[serde(default = "default_severe_score")]
    pub severe_score: f64,
    /// Light 목표: 버블/시스템 리스크 자산 비중 이상
    #[serde(default = "default_light_risk_fraction")]
    pub light_risk_fraction: f64,
    /// Moderate 목표: 버블/시스템 리스크 자산 비중 이상
    #[serde(default = "default_moderate_risk_fraction")]
    pub moderate_risk_fraction: f64,
    /// Severe 목표: 버블/시스템 리스크 자산 비중 이상
    #[serde(default = "default_severe_risk_fraction")]
    pub severe_risk_fraction: f64,
}

fn default_recovery_evaluations() -> u32 {
    3
}
fn default_light_score() -> f64 {
    35.0
}
fn default_moderate_score() -> f64 {
    25.0
}
fn default_severe_score() -> f64 {
    15.0
}
fn default_light_risk_fraction() -> f64 {
    0.25
}
fn default_moderate_risk_fraction() -> f64 {
    0.5
}
fn default_severe_risk_fraction() -> f64 {
    0.75
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            recovery_evaluations: default_recovery_evaluations(),
            light_score: default_light_score(),
            moderate_score: default_moderate_score(),
            severe_score: default_severe_score(),
            light_risk_fraction: default_light_risk_fraction(),
            moderate_risk_fraction: default_moderate_risk_fraction(),
            severe_risk_fraction: default_severe_risk_fraction(),
        }
    }
}

/// 계획 생성 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlanningConfig {
    /// 자산 비중 합계 허용 오차 (|합계 - 1| 이하)
    #[serde(default = "default_weight_tolerance")]
    pub weight_tolerance: f64,
    /// 주간 투자 요일
    #[serde(default = "default_weekly_weekday")]
    pub weekly_weekday: Weekday,
    /// 격주 투자 기준일 (월 중 두 날짜)
    #[serde(default = "default_biweekly_days")]
    pub biweekly_days: [u32; 2],
    /// 월간 투자 기준일
    #[serde(default = "default_monthly_day")]
    pub monthly_day: u32,
}

fn default_weight_tolerance() -> f64 {
    0.05
}
fn default_weekly_weekday() -> Weekday {
    Weekday::Thu
}
fn default_biweekly_days() -> [u32; 2] {
    [1, 15]
}
fn default_monthly_day() -> u32 {
    1
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            weight_tolerance: default_weight_tolerance(),
            weekly_weekday: default_weekly_weekday(),
            biweekly_days: default_biweekly_days(),
            monthly_day: default_monthly_day(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        Self::load("config/default.toml")
    }

    /// 설정 값 범위를 검증합니다.
    pub fn validate(&self) -> CoreResult<()> {
        let mut issues = Vec::new();

        if self.storage.history_retention == 0 {
            issues.push(FieldIssue::new("storage.history_retention", "1 이상이어야 합니다"));
        }
        if self.fetcher.max_attempts == 0 {
            issues.push(FieldIssue::new("fetcher.max_attempts", "1 이상이어야 합니다"));
        }
        if self.breaker.recovery_evaluations == 0 {
            issues.push(FieldIssue::new("breaker.recovery_evaluations", "1 이상이어야 합니다"));
        }
        if !(self.breaker.severe_score <= self.breaker.moderate_score
            && self.breaker.moderate_score <= self.breaker.light_score)
        {
            issues.push(FieldIssue::new(
                "breaker",
                "점수 임계값은 severe <= moderate <= light 순서여야 합니다",
            ));
        }
        if !(self.planning.weight_tolerance >= 0.0 && self.planning.weight_tolerance < 1.0) {
            issues.push(FieldIssue::new("planning.weight_tolerance", "0 이상 1 미만이어야 합니다"));
        }
        for (i, day) in self.planning.biweekly_days.iter().enumerate() {
            if !(1..=28).contains(day) {
                issues.push(FieldIssue::new(
                    format!("planning.biweekly_days[{}]", i),
                    "1~28 범위여야 합니다",
                ));
            }
        }
        if !(1..=28).contains(&self.planning.monthly_day) {
            issues.push(FieldIssue::new("planning.monthly_day", "1~28 범위여야 합니다"));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Config(
                issues
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            ))
        }
    }
}
