//! 적립식 투자 의사결정을 위한 도메인 모델.

mod asset;
mod breaker;
mod decision;
mod plan;
mod score;
mod snapshot;

pub use asset::*;
pub use breaker::*;
pub use decision::*;
pub use plan::*;
pub use score::*;
pub use snapshot::*;
