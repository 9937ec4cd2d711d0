//! connwatch 공통 에러 타입
//!
//! 모든 크레이트가 공유하는 최상위 에러 [`ConnwatchError`]와 도메인별
//! 하위 에러를 정의합니다. 각 하위 크레이트는 자체 에러 타입을 정의한 뒤
//! `ConnwatchError`로 변환해 데몬에 전달합니다.

use thiserror::Error;

/// connwatch 최상위 에러
///
/// 데몬과 크레이트 경계를 넘는 모든 에러는 이 타입으로 수렴합니다.
#[derive(Debug, Error)]
pub enum ConnwatchError {
    /// 설정 로드/검증 실패
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 수명주기/채널 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 분류 모델 로드/추론 에러
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// 표준 I/O 에러
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// TOML 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 필드 값이 허용 범위를 벗어남
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 수명주기/채널 에러
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 이미 실행 중인 파이프라인을 다시 시작하려 함
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 파이프라인을 중지하려 함
    #[error("pipeline is not running")]
    NotRunning,

    /// 채널 송신 실패 (수신자가 닫힘)
    #[error("failed to send to channel: {0}")]
    ChannelSend(String),

    /// 채널 수신 실패
    #[error("failed to receive from channel: {0}")]
    ChannelRecv(String),

    /// 초기화 실패
    #[error("pipeline initialization failed: {0}")]
    InitFailed(String),
}

/// 분류 모델 에러
///
/// `Load`는 시작 시점에만 발생하는 치명적 에러로, 파이프라인 기동을
/// 중단시킵니다. `Predict`는 레코드 단위 에러이며 해당 레코드만 건너뜁니다.
#[derive(Debug, Error)]
pub enum ModelError {
    /// 모델 아티팩트 로드 실패
    #[error("failed to load model from {path}: {reason}")]
    Load { path: String, reason: String },

    /// 단일 특징 벡터에 대한 추론 실패
    #[error("prediction failed: {reason}")]
    Predict { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound {
            path: "/etc/connwatch/connwatch.toml".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "config file not found: /etc/connwatch/connwatch.toml"
        );
    }

    #[test]
    fn invalid_value_display_includes_field() {
        let err = ConfigError::InvalidValue {
            field: "monitor.poll_interval_ms".to_owned(),
            reason: "must be at least 1".to_owned(),
        };
        assert!(err.to_string().contains("monitor.poll_interval_ms"));
    }

    #[test]
    fn config_error_converts_to_top_level() {
        let err: ConnwatchError = ConfigError::ParseFailed {
            reason: "unexpected eof".to_owned(),
        }
        .into();
        assert!(matches!(err, ConnwatchError::Config(_)));
        assert!(err.to_string().starts_with("config error:"));
    }

    #[test]
    fn pipeline_lifecycle_errors_display() {
        assert_eq!(
            PipelineError::AlreadyRunning.to_string(),
            "pipeline is already running"
        );
        assert_eq!(
            PipelineError::NotRunning.to_string(),
            "pipeline is not running"
        );
    }

    #[test]
    fn model_load_error_is_distinct_from_predict() {
        let load: ConnwatchError = ModelError::Load {
            path: "/etc/connwatch/model.yaml".to_owned(),
            reason: "yaml parse error".to_owned(),
        }
        .into();
        let predict: ConnwatchError = ModelError::Predict {
            reason: "empty feature".to_owned(),
        }
        .into();
        assert!(load.to_string().contains("/etc/connwatch/model.yaml"));
        assert!(predict.to_string().contains("prediction failed"));
    }

    #[test]
    fn io_error_converts_to_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConnwatchError = io.into();
        assert!(matches!(err, ConnwatchError::Io(_)));
    }
}
