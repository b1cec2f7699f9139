//! JSON 파일 저장소.
//!
//! 사용자 설정, 계획 이력, 서킷 브레이커 상태, 최신 상세 리포트를
//! 데이터 디렉토리 아래 개별 JSON 파일로 보관합니다.
//! 모든 쓰기는 임시 파일에 기록한 뒤 이름을 바꾸는 방식으로 원자적으로 수행됩니다.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use dca_core::{CircuitBreakerState, InvestmentDetails, InvestmentPlan, StorageConfig, UserConfig};

use crate::error::{DataError, Result};

pub const USER_CONFIG_FILE: &str = "user_config.json";
pub const PLAN_HISTORY_FILE: &str = "plan_history.json";
pub const BREAKER_STATE_FILE: &str = "circuit_breaker.json";
pub const DETAILS_FILE: &str = "investment_details.json";

/// 파일 기반 저장소.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    retention: usize,
    /// 이력 읽기-수정-쓰기 직렬화
    history_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            dir: dir.into(),
            retention: retention.max(1),
            history_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.data_dir, config.history_retention)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // =========================================================================
    // 사용자 설정
    // =========================================================================

    /// 저장된 사용자 설정 (없으면 None).
    pub async fn load_user_config(&self) -> Result<Option<UserConfig>> {
        self.read_json(USER_CONFIG_FILE).await
    }

    pub async fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        self.write_json(USER_CONFIG_FILE, config).await
    }

    // =========================================================================
    // 계획 이력
    // =========================================================================

    /// 계획 이력 (최신순).
    pub async fn load_history(&self) -> Result<Vec<InvestmentPlan>> {
        Ok(self
            .read_json::<Vec<InvestmentPlan>>(PLAN_HISTORY_FILE)
            .await?
            .unwrap_or_default())
    }

    /// 가장 최근 계획.
    pub async fn latest_plan(&self) -> Result<Option<InvestmentPlan>> {
        Ok(self.load_history().await?.into_iter().next())
    }

    // =========================================================================
    // 서킷 브레이커
    // =========================================================================

    /// 브레이커 상태 로드.
    ///
    /// 파일이 없으면 Normal 상태로 시작합니다. 읽을 수 없거나 손상된 파일도
    /// 경고를 남기고 Normal로 초기화하므로 이 함수는 실패하지 않습니다.
    pub async fn load_breaker_state(&self) -> CircuitBreakerState {
        match self.read_json::<CircuitBreakerState>(BREAKER_STATE_FILE).await {
            Ok(Some(state)) => state.normalized(),
            Ok(None) => CircuitBreakerState::default(),
            Err(e) => {
                warn!(
                    path = %self.dir.join(BREAKER_STATE_FILE).display(),
                    error = %e,
                    "브레이커 상태 파일을 읽을 수 없음, Normal로 초기화"
                );
                CircuitBreakerState::default()
            }
        }
    }

    // =========================================================================
    // 실시간 생성 결과 기록
    // =========================================================================

    /// 계획 이력, 상세 리포트, 브레이커 상태를 함께 기록합니다.
    ///
    /// 계획은 이력 맨 앞에 추가되고 보관 개수를 넘는 오래된 계획은 제거됩니다.
    /// 기존 이력을 읽고 세 파일을 모두 임시 파일로 쓴 뒤에만 이름을 바꿉니다.
    /// 이 단계까지 실패하면 어떤 파일도 바뀌지 않습니다. 브레이커 상태는 마지막에 교체됩니다.
    pub async fn commit_generation(
        &self,
        plan: &InvestmentPlan,
        details: &InvestmentDetails,
        state: &CircuitBreakerState,
    ) -> Result<()> {
        let _guard = self.history_lock.lock().await;

        let mut history = self.load_history().await?;
        history.insert(0, plan.clone());
        history.truncate(self.retention);

        let staged = [
            (PLAN_HISTORY_FILE, serde_json::to_vec_pretty(&history)?),
            (DETAILS_FILE, serde_json::to_vec_pretty(details)?),
            (BREAKER_STATE_FILE, serde_json::to_vec_pretty(state)?),
        ];

        fs::create_dir_all(&self.dir).await?;
        let mut written = Vec::with_capacity(staged.len());
        for (name, content) in &staged {
            let tmp = self.temp_path(name);
            if let Err(e) = fs::write(&tmp, content).await {
                discard(&written).await;
                discard(&[tmp]).await;
                return Err(e.into());
            }
            written.push(tmp);
        }

        for ((name, _), tmp) in staged.iter().zip(&written) {
            fs::rename(tmp, self.dir.join(name)).await?;
        }

        debug!(
            plan_id = %plan.id,
            history_len = history.len(),
            breaker_level = %state.level,
            "실시간 생성 결과 기록"
        );
        Ok(())
    }

    // =========================================================================
    // 상세 리포트
    // =========================================================================

    pub async fn load_details(&self) -> Result<Option<InvestmentDetails>> {
        self.read_json(DETAILS_FILE).await
    }

    // =========================================================================
    // 내부 헬퍼
    // =========================================================================

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| DataError::Corrupted {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    async fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(name);
        let tmp = self.temp_path(name);
        let content = serde_json::to_vec_pretty(value)?;

        if let Err(e) = fs::write(&tmp, content).await {
            discard(&[tmp]).await;
            return Err(e.into());
        }
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// 쓰기마다 고유한 임시 파일 경로 (`<name>.<uuid>.tmp`).
    fn temp_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.tmp", name, Uuid::new_v4().simple()))
    }
}

/// 남은 임시 파일을 정리합니다.
async fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "임시 파일 삭제 실패");
            }
        }
    }
}
