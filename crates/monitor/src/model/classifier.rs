//! 규칙 기반 분류기 -- 조건 평가 및 정규식 캐싱
//!
//! [`RuleModelClassifier`]는 모델 아티팩트의 룰을 [`FeatureVector`]에 대해
//! 순서대로 평가하여 첫 번째로 매칭되는 룰의 레이블을 반환합니다.
//! 정규식 패턴은 생성 시 한 번만 컴파일하여 캐싱합니다.

use std::collections::HashMap;

use regex::Regex;

use connwatch_core::error::ConnwatchError;
use connwatch_core::pipeline::Classifier;
use connwatch_core::types::{FeatureVector, Label};

use crate::error::MonitorError;

use super::artifact::{FeatureCondition, ModelArtifact};

/// 규칙 기반 분류기
///
/// 생성 시 정규식을 미리 컴파일하여 분류 시 재컴파일 오버헤드를 제거합니다.
/// 어떤 룰에도 매칭되지 않으면 아티팩트의 기본 레이블을 반환합니다.
pub struct RuleModelClassifier {
    /// 로드된 모델 아티팩트
    artifact: ModelArtifact,
    /// 컴파일된 정규식 캐시: (rule_index, condition_index) -> Regex
    regex_cache: HashMap<(usize, usize), Regex>,
    /// 기본 레이블 (매 분류마다 복제하므로 미리 구성)
    default_label: Label,
}

impl RuleModelClassifier {
    /// 아티팩트에서 분류기를 생성합니다.
    ///
    /// 아티팩트를 검증하고 모든 `matches` 패턴을 컴파일합니다.
    /// 잘못된 패턴은 생성 실패로 이어집니다.
    pub fn new(artifact: ModelArtifact) -> Result<Self, MonitorError> {
        artifact.validate()?;

        let mut regex_cache = HashMap::new();
        for (rule_idx, rule) in artifact.rules.iter().enumerate() {
            for (cond_idx, condition) in rule.when.iter().enumerate() {
                if let Some(ref pattern) = condition.matches {
                    let regex =
                        Regex::new(pattern).map_err(|e| MonitorError::ModelValidation {
                            rule: rule.label.clone(),
                            reason: format!(
                                "invalid regex in when[{cond_idx}] for feature '{}': {e}",
                                condition.feature
                            ),
                        })?;
                    regex_cache.insert((rule_idx, cond_idx), regex);
                }
            }
        }

        let default_label = Label::from(artifact.default_label.clone());

        Ok(Self {
            artifact,
            regex_cache,
            default_label,
        })
    }

    /// 모델 이름을 반환합니다.
    pub fn model_name(&self) -> &str {
        &self.artifact.name
    }

    /// 모델 버전을 반환합니다.
    pub fn model_version(&self) -> u32 {
        self.artifact.version
    }

    /// 로드된 룰 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.artifact.rules.len()
    }

    /// 단일 조건을 평가합니다. 설정된 연산자는 모두 만족해야 합니다.
    fn evaluate_condition(
        &self,
        key: (usize, usize),
        condition: &FeatureCondition,
        features: &FeatureVector,
    ) -> Result<bool, MonitorError> {
        if let Some(value) = categorical_value(features, &condition.feature) {
            if let Some(ref expected) = condition.equals {
                if value != expected {
                    return Ok(false);
                }
            }
            if condition.matches.is_some() {
                let regex = self.regex_cache.get(&key).ok_or_else(|| {
                    MonitorError::Classify(format!(
                        "regex not compiled for rule[{}] when[{}]",
                        key.0, key.1
                    ))
                })?;
                if !regex.is_match(value) {
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        if let Some(value) = numeric_value(features, &condition.feature) {
            if let Some(gt) = condition.gt {
                if value <= gt {
                    return Ok(false);
                }
            }
            if let Some(lt) = condition.lt {
                if value >= lt {
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        // validate()가 거르므로 정상 경로에서는 도달하지 않습니다
        Err(MonitorError::Classify(format!(
            "unknown feature '{}'",
            condition.feature
        )))
    }
}

impl Classifier for RuleModelClassifier {
    /// 첫 번째로 모든 조건이 매칭되는 룰의 레이블을 반환합니다.
    fn classify(&self, features: &FeatureVector) -> Result<Label, ConnwatchError> {
        for (rule_idx, rule) in self.artifact.rules.iter().enumerate() {
            let mut matched = true;
            for (cond_idx, condition) in rule.when.iter().enumerate() {
                if !self.evaluate_condition((rule_idx, cond_idx), condition, features)? {
                    matched = false;
                    break; // AND 로직: 하나라도 실패하면 전체 실패
                }
            }
            if matched {
                return Ok(Label::from(rule.label.clone()));
            }
        }

        Ok(self.default_label.clone())
    }
}

/// 범주형 특징 값을 추출합니다.
fn categorical_value<'a>(features: &'a FeatureVector, feature: &str) -> Option<&'a str> {
    match feature {
        "proto" => Some(&features.proto),
        "conn_state" => Some(&features.conn_state),
        _ => None,
    }
}

/// 수치 특징 값을 추출합니다. 카운터는 f64로 비교합니다.
fn numeric_value(features: &FeatureVector, feature: &str) -> Option<f64> {
    match feature {
        "duration" => Some(features.duration),
        "orig_bytes" => Some(features.orig_bytes as f64),
        "resp_bytes" => Some(features.resp_bytes as f64),
        "missed_bytes" => Some(features.missed_bytes as f64),
        "orig_pkts" => Some(features.orig_pkts as f64),
        "orig_ip_bytes" => Some(features.orig_ip_bytes as f64),
        "resp_pkts" => Some(features.resp_pkts as f64),
        "resp_ip_bytes" => Some(features.resp_ip_bytes as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::artifact::LabelRule;
    use super::*;

    fn condition_equals(feature: &str, value: &str) -> FeatureCondition {
        FeatureCondition {
            feature: feature.to_owned(),
            equals: Some(value.to_owned()),
            matches: None,
            gt: None,
            lt: None,
        }
    }

    fn condition_matches(feature: &str, pattern: &str) -> FeatureCondition {
        FeatureCondition {
            feature: feature.to_owned(),
            equals: None,
            matches: Some(pattern.to_owned()),
            gt: None,
            lt: None,
        }
    }

    fn condition_lt(feature: &str, bound: f64) -> FeatureCondition {
        FeatureCondition {
            feature: feature.to_owned(),
            equals: None,
            matches: None,
            gt: None,
            lt: Some(bound),
        }
    }

    fn condition_gt(feature: &str, bound: f64) -> FeatureCondition {
        FeatureCondition {
            feature: feature.to_owned(),
            equals: None,
            matches: None,
            gt: Some(bound),
            lt: None,
        }
    }

    fn sample_artifact() -> ModelArtifact {
        ModelArtifact {
            name: "test-model".to_owned(),
            version: 1,
            default_label: "Benign".to_owned(),
            rules: vec![
                LabelRule {
                    label: "Malicious-C2".to_owned(),
                    when: vec![
                        condition_equals("conn_state", "S0"),
                        condition_lt("orig_bytes", 64.0),
                    ],
                },
                LabelRule {
                    label: "Malicious-Scan".to_owned(),
                    when: vec![condition_matches("conn_state", "^(REJ|RSTO)")],
                },
            ],
        }
    }

    fn features(conn_state: &str, orig_bytes: u64) -> FeatureVector {
        FeatureVector {
            proto: "tcp".to_owned(),
            duration: 0.5,
            orig_bytes,
            resp_bytes: 0,
            conn_state: conn_state.to_owned(),
            missed_bytes: 0,
            orig_pkts: 1,
            orig_ip_bytes: 40,
            resp_pkts: 0,
            resp_ip_bytes: 0,
        }
    }

    #[test]
    fn matches_first_rule_when_all_conditions_hold() {
        let classifier = RuleModelClassifier::new(sample_artifact()).unwrap();
        let label = classifier.classify(&features("S0", 0)).unwrap();
        assert_eq!(label.as_str(), "Malicious-C2");
    }

    #[test]
    fn partial_match_falls_through_to_default() {
        let classifier = RuleModelClassifier::new(sample_artifact()).unwrap();
        // conn_state는 일치하지만 orig_bytes가 조건을 벗어남
        let label = classifier.classify(&features("S0", 4096)).unwrap();
        assert_eq!(label.as_str(), "Benign");
    }

    #[test]
    fn regex_rule_matches() {
        let classifier = RuleModelClassifier::new(sample_artifact()).unwrap();
        let label = classifier.classify(&features("REJ", 100)).unwrap();
        assert_eq!(label.as_str(), "Malicious-Scan");
    }

    #[test]
    fn unmatched_features_get_default_label() {
        let classifier = RuleModelClassifier::new(sample_artifact()).unwrap();
        let label = classifier.classify(&features("SF", 1024)).unwrap();
        assert_eq!(label.as_str(), "Benign");
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut artifact = sample_artifact();
        artifact.rules.insert(
            0,
            LabelRule {
                label: "Catch-All".to_owned(),
                when: vec![],
            },
        );
        let classifier = RuleModelClassifier::new(artifact).unwrap();
        let label = classifier.classify(&features("S0", 0)).unwrap();
        assert_eq!(label.as_str(), "Catch-All");
    }

    #[test]
    fn empty_when_matches_everything() {
        let artifact = ModelArtifact {
            name: "catch-all".to_owned(),
            version: 1,
            default_label: "Benign".to_owned(),
            rules: vec![LabelRule {
                label: "Always".to_owned(),
                when: vec![],
            }],
        };
        let classifier = RuleModelClassifier::new(artifact).unwrap();
        let label = classifier.classify(&features("SF", 1)).unwrap();
        assert_eq!(label.as_str(), "Always");
    }

    #[test]
    fn numeric_gt_condition() {
        let artifact = ModelArtifact {
            name: "volume".to_owned(),
            version: 1,
            default_label: "Benign".to_owned(),
            rules: vec![LabelRule {
                label: "Malicious-Exfil".to_owned(),
                when: vec![condition_gt("orig_bytes", 1_000_000.0)],
            }],
        };
        let classifier = RuleModelClassifier::new(artifact).unwrap();

        assert_eq!(
            classifier
                .classify(&features("SF", 2_000_000))
                .unwrap()
                .as_str(),
            "Malicious-Exfil"
        );
        assert_eq!(
            classifier.classify(&features("SF", 100)).unwrap().as_str(),
            "Benign"
        );
    }

    #[test]
    fn boundary_is_exclusive_for_lt() {
        let classifier = RuleModelClassifier::new(sample_artifact()).unwrap();
        // orig_bytes == 64는 lt: 64에 매칭되지 않음
        let label = classifier.classify(&features("S0", 64)).unwrap();
        assert_eq!(label.as_str(), "Benign");
    }

    #[test]
    fn invalid_regex_fails_construction() {
        let mut artifact = sample_artifact();
        artifact.rules[1].when[0].matches = Some("[invalid".to_owned());
        let result = RuleModelClassifier::new(artifact);
        assert!(matches!(result, Err(MonitorError::ModelValidation { .. })));
    }

    #[test]
    fn invalid_artifact_fails_construction() {
        let mut artifact = sample_artifact();
        artifact.rules[0].when[0].feature = "nonexistent".to_owned();
        assert!(RuleModelClassifier::new(artifact).is_err());
    }

    #[test]
    fn accessors_reflect_artifact() {
        let classifier = RuleModelClassifier::new(sample_artifact()).unwrap();
        assert_eq!(classifier.model_name(), "test-model");
        assert_eq!(classifier.model_version(), 1);
        assert_eq!(classifier.rule_count(), 2);
    }

    #[test]
    fn usable_as_shared_trait_object() {
        let classifier: std::sync::Arc<dyn Classifier> =
            std::sync::Arc::new(RuleModelClassifier::new(sample_artifact()).unwrap());
        let label = classifier.classify(&features("S0", 0)).unwrap();
        assert_eq!(label.as_str(), "Malicious-C2");
    }
}
