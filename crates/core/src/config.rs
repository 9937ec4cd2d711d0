//! 설정 관리 -- connwatch.toml 파싱 및 런타임 설정
//!
//! [`ConnwatchConfig`]는 데몬과 모니터 파이프라인의 설정을 담는 최상위
//! 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CONNWATCH_MONITOR_CONN_LOG_PATH=/var/log/conn.log` 형식)
//! 3. 설정 파일 (`connwatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), connwatch_core::error::ConnwatchError> {
//! use connwatch_core::config::ConnwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ConnwatchConfig::load("connwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ConnwatchConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ConnwatchError};
use crate::types::LabelPolicy;

/// connwatch 통합 설정
///
/// `connwatch.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 모니터 파이프라인 설정
    #[serde(default)]
    pub monitor: MonitorSection,
}

impl ConnwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConnwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConnwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConnwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ConnwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ConnwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            ConnwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CONNWATCH_{SECTION}_{FIELD}`
    /// 예: `CONNWATCH_MONITOR_POLL_INTERVAL_MS=500`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CONNWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CONNWATCH_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "CONNWATCH_GENERAL_PID_FILE");

        // Monitor
        override_string(
            &mut self.monitor.conn_log_path,
            "CONNWATCH_MONITOR_CONN_LOG_PATH",
        );
        override_string(&mut self.monitor.model_path, "CONNWATCH_MONITOR_MODEL_PATH");
        override_u64(
            &mut self.monitor.poll_interval_ms,
            "CONNWATCH_MONITOR_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.monitor.missing_backoff_secs,
            "CONNWATCH_MONITOR_MISSING_BACKOFF_SECS",
        );
        override_u64(
            &mut self.monitor.error_backoff_secs,
            "CONNWATCH_MONITOR_ERROR_BACKOFF_SECS",
        );
        override_u64(
            &mut self.monitor.benign_interval_secs,
            "CONNWATCH_MONITOR_BENIGN_INTERVAL_SECS",
        );
        override_usize(
            &mut self.monitor.max_line_length,
            "CONNWATCH_MONITOR_MAX_LINE_LENGTH",
        );
        override_usize(
            &mut self.monitor.max_lines_per_poll,
            "CONNWATCH_MONITOR_MAX_LINES_PER_POLL",
        );
        override_usize(
            &mut self.monitor.alert_channel_capacity,
            "CONNWATCH_MONITOR_ALERT_CHANNEL_CAPACITY",
        );
        override_csv(
            &mut self.monitor.malicious_prefixes,
            "CONNWATCH_MONITOR_MALICIOUS_PREFIXES",
        );
        override_csv(
            &mut self.monitor.benign_labels,
            "CONNWATCH_MONITOR_BENIGN_LABELS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConnwatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 감시 경로/모델 경로 검증
        if self.monitor.conn_log_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "monitor.conn_log_path".to_owned(),
                reason: "path must not be empty".to_owned(),
            }
            .into());
        }
        if self.monitor.model_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "monitor.model_path".to_owned(),
                reason: "path must not be empty".to_owned(),
            }
            .into());
        }

        // 주기/용량 검증
        if self.monitor.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.poll_interval_ms".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }
        if self.monitor.max_line_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.max_line_length".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }
        if self.monitor.max_lines_per_poll == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.max_lines_per_poll".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }
        if self.monitor.alert_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.alert_channel_capacity".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        // 레이블 정책 검증 -- 빈 접두어는 모든 레이블과 일치함
        if self.monitor.malicious_prefixes.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "monitor.malicious_prefixes".to_owned(),
                reason: "at least one prefix is required".to_owned(),
            }
            .into());
        }
        if self.monitor.malicious_prefixes.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidValue {
                field: "monitor.malicious_prefixes".to_owned(),
                reason: "empty prefix would match every label".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: "/var/run/connwatch.pid".to_owned(),
        }
    }
}

/// 모니터 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// 감시할 Zeek conn.log 경로
    pub conn_log_path: String,
    /// 분류 모델 아티팩트 경로 (YAML)
    pub model_path: String,
    /// 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 파일 부재 시 백오프 (초)
    pub missing_backoff_secs: u64,
    /// I/O 에러 시 백오프 (초)
    pub error_backoff_secs: u64,
    /// 정상 상태 보고 최소 간격 (초, 0이면 매번 보고)
    pub benign_interval_secs: u64,
    /// 한 줄 최대 길이 (바이트, 초과 시 해당 줄 폐기)
    pub max_line_length: usize,
    /// 폴링 1회당 최대 처리 줄 수
    pub max_lines_per_poll: usize,
    /// 알림 채널 용량
    pub alert_channel_capacity: usize,
    /// 악성 판정 레이블 접두어 목록
    pub malicious_prefixes: Vec<String>,
    /// 정상 판정 레이블 목록 (정확 일치)
    pub benign_labels: Vec<String>,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            conn_log_path: "/opt/zeek/logs/current/conn.log".to_owned(),
            model_path: "/etc/connwatch/model.yaml".to_owned(),
            poll_interval_ms: 1000,
            missing_backoff_secs: 2,
            error_backoff_secs: 5,
            benign_interval_secs: 10,
            max_line_length: 64 * 1024, // 64KB
            max_lines_per_poll: 10_000,
            alert_channel_capacity: 256,
            malicious_prefixes: vec!["Malicious".to_owned()],
            benign_labels: vec!["Benign".to_owned()],
        }
    }
}

impl MonitorSection {
    /// 설정값으로 레이블 판정 정책을 구성합니다.
    pub fn label_policy(&self) -> LabelPolicy {
        LabelPolicy {
            malicious_prefixes: self.malicious_prefixes.clone(),
            benign_labels: self.benign_labels.clone(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}
