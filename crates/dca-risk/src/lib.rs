//! 투자 리스크 관리 모듈.
//!
//! 바스켓 전체 시장 상태에 따라 투자 강도를 단계적으로 줄이는
//! 서킷 브레이커를 제공합니다.
//!
//! # 주요 기능
//!
//! - **신호 집계**: 자산별 총점의 비중 가중 평균과 위험 분류 자산 비중
//! - **즉시 축소**: 악화가 관측되면 해당 평가에서 바로 한 단계 축소
//! - **점진적 회복**: 연속 개선 평가가 누적되어야 한 단계씩 회복
//!
//! 컨트롤러는 상태를 소유하지 않습니다. 현재 상태를 입력받아 새 상태를 반환하며,
//! 영속화와 직렬화된 읽기-수정-쓰기는 호출자가 담당합니다.

pub mod controller;

pub use controller::{AssetSignal, BreakerTransition, CircuitBreakerController, TransitionKind};
