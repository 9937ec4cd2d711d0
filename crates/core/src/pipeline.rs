//! 파이프라인 수명주기/분류기 trait 정의
//!
//! [`Pipeline`]은 데몬이 관리하는 모듈의 수명주기 인터페이스이고,
//! [`Classifier`]는 특징 벡터를 레이블로 분류하는 구현 경계입니다.
//! 분류기 구현(규칙 기반 모델, 테스트 스텁)은 monitor 크레이트에 있습니다.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::ConnwatchError;
use crate::types::{FeatureVector, Label};

/// 모듈 파이프라인 수명주기 trait
///
/// 데몬은 이 trait을 통해 파이프라인을 시작/중지하고 상태를 점검합니다.
/// `start`는 백그라운드 태스크를 스폰한 뒤 즉시 반환해야 하며,
/// `stop`은 협조적 취소 후 태스크 종료를 기다립니다.
pub trait Pipeline {
    /// 파이프라인을 시작합니다. 이미 실행 중이면
    /// [`PipelineError::AlreadyRunning`](crate::error::PipelineError::AlreadyRunning)을 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), ConnwatchError>> + Send;

    /// 파이프라인을 중지합니다. 실행 중이 아니면
    /// [`PipelineError::NotRunning`](crate::error::PipelineError::NotRunning)을 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), ConnwatchError>> + Send;

    /// 현재 상태를 점검합니다.
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, ConnwatchError>> + Send;

    /// 파이프라인 이름 (로깅/헬스 보고에 사용)
    fn name(&self) -> &str;
}

/// 헬스체크 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 동작 중이지만 주의 필요 (사유 포함)
    Degraded(String),
    /// 동작 불가 (사유 포함)
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, HealthStatus::Degraded(_))
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded(reason) => write!(f, "degraded: {reason}"),
            HealthStatus::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 특징 벡터 분류기 trait
///
/// 레코드 단위의 동기 호출입니다. 실패는 해당 레코드에만 영향을 주는
/// 비치명적 에러로 취급됩니다. 모델 로드는 구현 생성 시점에 끝나 있어야
/// 하며, 로드 실패는 파이프라인 기동을 중단시키는 치명적 에러입니다.
pub trait Classifier: Send + Sync {
    /// 특징 벡터를 분류하여 레이블을 반환합니다.
    fn classify(&self, features: &FeatureVector) -> Result<Label, ConnwatchError>;
}
