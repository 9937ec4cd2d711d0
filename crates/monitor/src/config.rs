//! 모니터 파이프라인 설정
//!
//! [`MonitorConfig`]는 core의 [`MonitorSection`](connwatch_core::config::MonitorSection)을
//! 기반으로 모니터 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use connwatch_core::config::ConnwatchConfig;
//! use connwatch_monitor::config::MonitorConfig;
//!
//! let core_config = ConnwatchConfig::default();
//! let config = MonitorConfig::from_core(&core_config.monitor)?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use connwatch_core::types::LabelPolicy;

use crate::error::MonitorError;

/// 모니터 파이프라인 설정
///
/// core의 `MonitorSection`에서 파생되며, 파이프라인 내부에서 사용하는
/// 주기/용량 값을 [`Duration`] 접근자로 노출합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
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
    /// 레이블 → 판정 매핑 정책
    pub label_policy: LabelPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_section(&connwatch_core::config::MonitorSection::default())
    }
}

impl MonitorConfig {
    /// core의 `MonitorSection`에서 모니터 설정을 생성하고 검증합니다.
    pub fn from_core(
        core: &connwatch_core::config::MonitorSection,
    ) -> Result<Self, MonitorError> {
        let config = Self::from_section(core);
        config.validate()?;
        Ok(config)
    }

    fn from_section(core: &connwatch_core::config::MonitorSection) -> Self {
        Self {
            conn_log_path: core.conn_log_path.clone(),
            model_path: core.model_path.clone(),
            poll_interval_ms: core.poll_interval_ms,
            missing_backoff_secs: core.missing_backoff_secs,
            error_backoff_secs: core.error_backoff_secs,
            benign_interval_secs: core.benign_interval_secs,
            max_line_length: core.max_line_length,
            max_lines_per_poll: core.max_lines_per_poll,
            alert_channel_capacity: core.alert_channel_capacity,
            label_policy: core.label_policy(),
        }
    }

    /// 폴링 주기
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 파일 부재 시 백오프
    pub fn missing_backoff(&self) -> Duration {
        Duration::from_secs(self.missing_backoff_secs)
    }

    /// I/O 에러 시 백오프
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    /// 정상 상태 보고 최소 간격
    pub fn benign_interval(&self) -> Duration {
        Duration::from_secs(self.benign_interval_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), MonitorError> {
        const MAX_POLL_INTERVAL_MS: u64 = 60_000; // 1 minute
        const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1MB
        const MAX_LINES_PER_POLL: usize = 100_000;
        const MAX_CHANNEL_CAPACITY: usize = 65_536;

        if self.conn_log_path.is_empty() {
            return Err(MonitorError::Config {
                field: "conn_log_path".to_owned(),
                reason: "path must not be empty".to_owned(),
            });
        }

        if self.model_path.is_empty() {
            return Err(MonitorError::Config {
                field: "model_path".to_owned(),
                reason: "path must not be empty".to_owned(),
            });
        }

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(MonitorError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: format!("must be 1-{}", MAX_POLL_INTERVAL_MS),
            });
        }

        if self.max_line_length == 0 || self.max_line_length > MAX_LINE_LENGTH {
            return Err(MonitorError::Config {
                field: "max_line_length".to_owned(),
                reason: format!("must be 1-{}", MAX_LINE_LENGTH),
            });
        }

        if self.max_lines_per_poll == 0 || self.max_lines_per_poll > MAX_LINES_PER_POLL {
            return Err(MonitorError::Config {
                field: "max_lines_per_poll".to_owned(),
                reason: format!("must be 1-{}", MAX_LINES_PER_POLL),
            });
        }

        if self.alert_channel_capacity == 0 || self.alert_channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(MonitorError::Config {
                field: "alert_channel_capacity".to_owned(),
                reason: format!("must be 1-{}", MAX_CHANNEL_CAPACITY),
            });
        }

        if self.label_policy.malicious_prefixes.is_empty() {
            return Err(MonitorError::Config {
                field: "label_policy.malicious_prefixes".to_owned(),
                reason: "at least one prefix is required".to_owned(),
            });
        }

        if self
            .label_policy
            .malicious_prefixes
            .iter()
            .any(String::is_empty)
        {
            return Err(MonitorError::Config {
                field: "label_policy.malicious_prefixes".to_owned(),
                reason: "empty prefix would match every label".to_owned(),
            });
        }

        Ok(())
    }
}

/// 모니터 설정 빌더
///
/// 3개 이상의 설정 필드가 있으므로 빌더 패턴을 사용합니다.
#[derive(Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// conn.log 경로를 설정합니다.
    pub fn conn_log_path(mut self, path: impl Into<String>) -> Self {
        self.config.conn_log_path = path.into();
        self
    }

    /// 모델 아티팩트 경로를 설정합니다.
    pub fn model_path(mut self, path: impl Into<String>) -> Self {
        self.config.model_path = path.into();
        self
    }

    /// 폴링 주기(밀리초)를 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 파일 부재 백오프(초)를 설정합니다.
    pub fn missing_backoff_secs(mut self, secs: u64) -> Self {
        self.config.missing_backoff_secs = secs;
        self
    }

    /// I/O 에러 백오프(초)를 설정합니다.
    pub fn error_backoff_secs(mut self, secs: u64) -> Self {
        self.config.error_backoff_secs = secs;
        self
    }

    /// 정상 상태 보고 간격(초)을 설정합니다.
    pub fn benign_interval_secs(mut self, secs: u64) -> Self {
        self.config.benign_interval_secs = secs;
        self
    }

    /// 한 줄 최대 길이를 설정합니다.
    pub fn max_line_length(mut self, bytes: usize) -> Self {
        self.config.max_line_length = bytes;
        self
    }

    /// 폴링 1회당 최대 처리 줄 수를 설정합니다.
    pub fn max_lines_per_poll(mut self, lines: usize) -> Self {
        self.config.max_lines_per_poll = lines;
        self
    }

    /// 알림 채널 용량을 설정합니다.
    pub fn alert_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.alert_channel_capacity = capacity;
        self
    }

    /// 레이블 판정 정책을 설정합니다.
    pub fn label_policy(mut self, policy: LabelPolicy) -> Self {
        self.config.label_policy = policy;
        self
    }

    /// 설정을 검증하고 `MonitorConfig`를 생성합니다.
    pub fn build(self) -> Result<MonitorConfig, MonitorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MonitorConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn default_matches_core_section() {
        let config = MonitorConfig::default();
        assert_eq!(config.conn_log_path, "/opt/zeek/logs/current/conn.log");
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.missing_backoff_secs, 2);
        assert_eq!(config.error_backoff_secs, 5);
        assert_eq!(config.benign_interval_secs, 10);
        assert_eq!(config.max_line_length, 64 * 1024);
        assert_eq!(config.max_lines_per_poll, 10_000);
    }

    #[test]
    fn from_core_preserves_values() {
        let core = connwatch_core::config::MonitorSection {
            conn_log_path: "/var/log/zeek/conn.log".to_owned(),
            poll_interval_ms: 500,
            benign_interval_secs: 0,
            ..Default::default()
        };
        let config = MonitorConfig::from_core(&core).unwrap();
        assert_eq!(config.conn_log_path, "/var/log/zeek/conn.log");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.benign_interval_secs, 0);
        assert_eq!(config.label_policy.malicious_prefixes, vec!["Malicious"]);
    }

    #[test]
    fn duration_accessors() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
        assert_eq!(config.missing_backoff(), Duration::from_secs(2));
        assert_eq!(config.error_backoff(), Duration::from_secs(5));
        assert_eq!(config.benign_interval(), Duration::from_secs(10));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let config = MonitorConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_line_length() {
        let config = MonitorConfig {
            max_line_length: 2 * 1024 * 1024,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_conn_log_path() {
        let config = MonitorConfig {
            conn_log_path: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_malicious_prefix_entry() {
        let mut config = MonitorConfig::default();
        config.label_policy.malicious_prefixes.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_allows_zero_benign_interval() {
        let config = MonitorConfig {
            benign_interval_secs: 0,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = MonitorConfigBuilder::new()
            .conn_log_path("/tmp/conn.log")
            .model_path("/tmp/model.yaml")
            .poll_interval_ms(100)
            .benign_interval_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.conn_log_path, "/tmp/conn.log");
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = MonitorConfigBuilder::new().poll_interval_ms(0).build();
        assert!(result.is_err());
    }
}
