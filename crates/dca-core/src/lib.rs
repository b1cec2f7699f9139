//! # DCA Core
//!
//! 신호 기반 적립식 투자(DCA) 의사결정 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 엔진 전반에서 사용되는 기본 타입을 제공합니다:
//! - 자산 및 사용자 설정
//! - 시장 스냅샷 (지표 번들)
//! - 점수, 계수, 빈도 결정
//! - 서킷 브레이커 상태
//! - 투자 계획 및 상세 리포트
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
