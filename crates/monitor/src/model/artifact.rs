//! 분류 모델 아티팩트 데이터 타입
//!
//! YAML 모델 파일에서 역직렬화되는 구조체들을 정의합니다.

use serde::{Deserialize, Serialize};

use connwatch_core::types::FEATURE_FIELDS;

use crate::error::MonitorError;

/// 범주형 특징 필드 (equals/matches 연산자 사용 가능)
pub const CATEGORICAL_FEATURES: [&str; 2] = ["proto", "conn_state"];

/// 분류 모델 아티팩트 -- 하나의 YAML 모델 파일에 대응합니다.
///
/// # YAML 스키마
/// ```yaml
/// name: conn-rules
/// version: 1
/// default_label: Benign
/// rules:
///   - label: Malicious-C2
///     when:
///       - feature: conn_state
///         equals: S0
///       - feature: orig_bytes
///         lt: 64
///   - label: Malicious-Scan
///     when:
///       - feature: conn_state
///         matches: "^(REJ|RSTO)"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// 모델 이름 (로깅에 표시)
    pub name: String,
    /// 모델 버전
    #[serde(default = "default_version")]
    pub version: u32,
    /// 어떤 룰에도 매칭되지 않은 레코드에 부여할 레이블
    pub default_label: String,
    /// 레이블 룰 목록 (첫 매칭 우선)
    #[serde(default)]
    pub rules: Vec<LabelRule>,
}

fn default_version() -> u32 {
    1
}

impl ModelArtifact {
    /// 아티팩트의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.name.is_empty() {
            return Err(MonitorError::ModelValidation {
                rule: "(artifact)".to_owned(),
                reason: "model name must not be empty".to_owned(),
            });
        }

        if self.name.len() > 256 {
            return Err(MonitorError::ModelValidation {
                rule: "(artifact)".to_owned(),
                reason: "model name must not exceed 256 characters".to_owned(),
            });
        }

        if self.default_label.is_empty() {
            return Err(MonitorError::ModelValidation {
                rule: "(artifact)".to_owned(),
                reason: "default_label must not be empty".to_owned(),
            });
        }

        for rule in &self.rules {
            rule.validate()?;
        }

        Ok(())
    }
}

/// 단일 레이블 룰
///
/// `when` 조건은 AND 로직으로 결합됩니다. 조건이 비어 있으면 모든
/// 레코드에 매칭됩니다 (catch-all).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRule {
    /// 매칭 시 반환할 레이블
    pub label: String,
    /// 특징 조건 목록 (AND 결합)
    #[serde(default)]
    pub when: Vec<FeatureCondition>,
}

impl LabelRule {
    /// 룰의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.label.is_empty() {
            return Err(MonitorError::ModelValidation {
                rule: "(empty)".to_owned(),
                reason: "rule label must not be empty".to_owned(),
            });
        }

        for (idx, condition) in self.when.iter().enumerate() {
            condition.validate().map_err(|reason| {
                MonitorError::ModelValidation {
                    rule: self.label.clone(),
                    reason: format!("when[{idx}]: {reason}"),
                }
            })?;
        }

        Ok(())
    }
}

/// 단일 특징 조건
///
/// 하나의 특징 필드에 대한 매칭 조건입니다. 설정된 연산자는 모두
/// 만족해야 합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCondition {
    /// 대상 특징 필드명 ([`FEATURE_FIELDS`] 중 하나)
    pub feature: String,
    /// 문자열 정확 일치 (범주형 특징 전용)
    #[serde(default)]
    pub equals: Option<String>,
    /// 정규식 매칭 (범주형 특징 전용)
    #[serde(default)]
    pub matches: Option<String>,
    /// 초과 비교 (수치 특징 전용)
    #[serde(default)]
    pub gt: Option<f64>,
    /// 미만 비교 (수치 특징 전용)
    #[serde(default)]
    pub lt: Option<f64>,
}

impl FeatureCondition {
    /// 조건이 범주형 특징을 대상으로 하는지 반환합니다.
    pub fn is_categorical(&self) -> bool {
        CATEGORICAL_FEATURES.contains(&self.feature.as_str())
    }

    fn validate(&self) -> Result<(), String> {
        if !FEATURE_FIELDS.contains(&self.feature.as_str()) {
            return Err(format!("unknown feature '{}'", self.feature));
        }

        let has_categorical_op = self.equals.is_some() || self.matches.is_some();
        let has_numeric_op = self.gt.is_some() || self.lt.is_some();

        if !has_categorical_op && !has_numeric_op {
            return Err(format!(
                "condition on '{}' has no operator (equals/matches/gt/lt)",
                self.feature
            ));
        }

        if self.is_categorical() {
            if has_numeric_op {
                return Err(format!(
                    "gt/lt are not valid for categorical feature '{}'",
                    self.feature
                ));
            }
        } else if has_categorical_op {
            return Err(format!(
                "equals/matches are not valid for numeric feature '{}'",
                self.feature
            ));
        }

        Ok(())
    }
}
