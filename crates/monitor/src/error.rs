//! 모니터 파이프라인 에러 타입
//!
//! [`MonitorError`]는 conn.log 테일링, 레코드 디코딩, 모델 로딩/분류 등
//! 모니터 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<MonitorError> for ConnwatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use connwatch_core::error::{ConnwatchError, ModelError, PipelineError};

/// 모니터 도메인 에러
///
/// 테일링, 디코딩, 모델 로딩, 분류 등 파이프라인 내부의
/// 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// TSV 레코드의 필드 수가 conn.log 스키마와 다름
    #[error("schema mismatch: expected {expected} fields, found {found}")]
    SchemaMismatch {
        /// 기대하는 필드 수
        expected: usize,
        /// 실제 필드 수
        found: usize,
    },

    /// 단일 필드 파싱 실패
    #[error("field parse error: {field}: invalid value '{raw_value}': {reason}")]
    FieldParse {
        /// 실패한 conn.log 필드명
        field: &'static str,
        /// 원본 문자열
        raw_value: String,
        /// 실패 사유
        reason: String,
    },

    /// 로그 파일 테일링 실패 (열기, seek, 읽기 등)
    #[error("tail error: {path}: {reason}")]
    Tail {
        /// 대상 로그 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 모델 아티팩트 로딩 실패
    #[error("model load error: {path}: {reason}")]
    ModelLoad {
        /// 모델 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 모델 아티팩트 유효성 검증 실패
    #[error("model validation error: rule '{rule}': {reason}")]
    ModelValidation {
        /// 문제가 된 룰 레이블
        rule: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 분류 수행 중 에러
    #[error("classify error: {0}")]
    Classify(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<MonitorError> for ConnwatchError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::ModelLoad { path, reason } => {
                ConnwatchError::Model(ModelError::Load { path, reason })
            }
            MonitorError::Classify(reason) => {
                ConnwatchError::Model(ModelError::Predict { reason })
            }
            other => ConnwatchError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}
