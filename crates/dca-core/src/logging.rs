//! tracing 기반 로깅 초기화.
//!
//! 설정 파일의 `[logging]` 섹션을 [`LogConfig`]로 변환하여 구독자를 설치합니다.
//! 출력 형식은 pretty(개발), json(로그 수집), compact(한 줄) 중 하나입니다.
//!
//! 환경 변수 우선순위:
//! - `RUST_LOG`: 설정 파일의 `level`보다 우선
//! - `LOG_FORMAT`: 설정 파일의 `format`보다 우선

use std::fmt;

use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::LoggingConfig;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("지원하지 않는 로그 형식: {}", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Compact => "compact",
        };
        write!(f, "{}", s)
    }
}

/// 구독자 설치 옵션.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// EnvFilter 지시문 (예: "info", "dca_planner=debug")
    pub level: String,
    pub format: LogFormat,
    /// span 진입/종료 이벤트 출력
    pub with_span_events: bool,
    /// 파일명과 줄 번호 출력
    pub with_file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_span_events: false,
            with_file: true,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    /// 알 수 없는 형식은 pretty로 처리합니다. `LOG_FORMAT`이 있으면 그 값을 사용합니다.
    fn from(config: &LoggingConfig) -> Self {
        let format = std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| config.format.parse().unwrap_or_default());

        Self {
            level: config.level.clone(),
            format,
            with_span_events: config.span_events,
            ..Default::default()
        }
    }
}

/// 전역 tracing 구독자를 설치합니다.
///
/// 이미 설치되어 있으면 에러를 반환합니다.
///
/// ```no_run
/// use dca_core::{init_logging, AppConfig, LogConfig};
///
/// let config = AppConfig::default();
/// init_logging(LogConfig::from(&config.logging)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let span_events = if config.with_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_file(config.with_file)
        .with_line_number(config.with_file)
        .with_span_events(span_events);

    let fmt_layer = match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(format = %config.format, level = %config.level, "로깅 초기화 완료");
    Ok(())
}

/// 자산 코드(및 대상 월) 필드를 가진 info span.
#[macro_export]
macro_rules! asset_span {
    ($name:expr, $code:expr) => {
        tracing::info_span!($name, code = %$code)
    };
    ($name:expr, $code:expr, $month:expr) => {
        tracing::info_span!($name, code = %$code, month = %$month)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" COMPACT ".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_log_config_from_file_section() {
        let section = LoggingConfig {
            level: "dca_planner=debug".to_string(),
            format: "compact".to_string(),
            span_events: true,
        };
        let config = LogConfig::from(&section);

        assert_eq!(config.level, "dca_planner=debug");
        assert!(config.with_span_events);
        if std::env::var("LOG_FORMAT").is_err() {
            assert_eq!(config.format, LogFormat::Compact);
        }
    }

    #[test]
    fn test_unknown_format_falls_back_to_pretty() {
        if std::env::var("LOG_FORMAT").is_ok() {
            return;
        }
        let section = LoggingConfig {
            format: "fancy".to_string(),
            ..Default::default()
        };
        assert_eq!(LogConfig::from(&section).format, LogFormat::Pretty);
    }
}
