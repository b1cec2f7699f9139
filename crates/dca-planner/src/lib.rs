//! # DCA Planner
//!
//! 분석 모듈과 서킷 브레이커를 조합하여 투자 계획을 만듭니다.
//!
//! - [`PlanGenerator`]: 순수 계획 생성 (점수 → 빈도 → 브레이커 → 금액/일정)
//! - [`HistoricalReplayAdapter`]: 과거 시점 재현 (실시간 브레이커 상태 불변)
//! - [`PlanService`]: 수집, 직렬화된 브레이커 갱신, 영속화를 묶은 유스케이스
//! - [`InvestmentSchedule`]: 빈도 → 투자 일자

pub mod error;
pub mod generator;
pub mod replay;
pub mod schedule;
pub mod service;

pub use error::{PlanError, PlanResult};
pub use generator::{PlanGenerator, PlanOutcome, PlanRequest};
pub use replay::HistoricalReplayAdapter;
pub use schedule::InvestmentSchedule;
pub use service::{GenerateOptions, PlanService};
