//! # DCA Analytics
//!
//! 시장 스냅샷을 투자 판단으로 변환하는 순수 계산 모듈입니다.
//!
//! - [`ScoreEngine`]: 스냅샷 → 구성 요소 점수 + 총점 (0~100)
//! - [`CoefficientMapper`]: 점수 → 표시용 계수
//! - [`SpecialConditionDetector`]: 스냅샷 → 우선순위 기반 특수 조건
//! - [`FrequencyPolicy`]: 총점/특수 조건 → 빈도와 금액 배수
//!
//! 모든 연산은 부작용이 없으며 같은 입력에 항상 같은 결과를 반환합니다.

pub mod coefficient;
pub mod detector;
pub mod frequency;
pub mod scorer;

pub use coefficient::CoefficientMapper;
pub use detector::SpecialConditionDetector;
pub use frequency::FrequencyPolicy;
pub use scorer::{ScoreEngine, ScoreError, ScoreResult};
