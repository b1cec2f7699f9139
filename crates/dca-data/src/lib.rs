//! 데이터 관리 모듈.
//!
//! 이 crate는 엔진 바깥의 협력자를 제공합니다:
//! - [`MarketDataProvider`]: 실시간/과거 기준 스냅샷 공급자 추상화
//! - [`SnapshotFetcher`]: 타임아웃, 재시도, 마지막 정상값 캐시를 갖춘 수집 계층
//! - [`InMemoryProvider`]: 외부 수집기가 밀어 넣는 프로세스 내 공급자
//! - [`JsonFileStore`]: 사용자 설정, 계획 이력, 브레이커 상태의 JSON 파일 저장소

pub mod error;
pub mod fetcher;
pub mod memory;
pub mod provider;
pub mod store;

pub use error::{DataError, Result};
pub use fetcher::{FetchOutcome, SnapshotFetcher};
pub use memory::InMemoryProvider;
pub use provider::MarketDataProvider;
pub use store::JsonFileStore;
