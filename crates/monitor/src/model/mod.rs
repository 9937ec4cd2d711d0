//! 분류 모델 -- YAML 기반 룰 매칭 분류기
//!
//! 단일 YAML 아티팩트를 로드하여 [`FeatureVector`](connwatch_core::types::FeatureVector)에
//! 대한 레이블 분류를 수행합니다.
//!
//! # 모델 형식
//! ```yaml
//! name: conn-rules
//! version: 1
//! default_label: Benign
//! rules:
//!   - label: Malicious-C2
//!     when:
//!       - feature: conn_state
//!         equals: S0
//!       - feature: orig_bytes
//!         lt: 64
//! ```
//!
//! # 아키텍처
//! - [`loader`]: YAML 파일 로딩 및 유효성 검증
//! - [`classifier`]: 룰 평가 (첫 매칭 우선, AND 결합 조건)
//! - [`artifact`]: 모델 데이터 구조 정의

pub mod artifact;
pub mod classifier;
pub mod loader;

pub use artifact::{CATEGORICAL_FEATURES, FeatureCondition, LabelRule, ModelArtifact};
pub use classifier::RuleModelClassifier;
pub use loader::ModelLoader;
