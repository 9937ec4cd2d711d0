#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`tail`]: 오프셋 기반 conn.log 테일링 (로테이션/부재/부분 줄 처리)
//! - [`decode`]: Zeek TSV 22필드 스키마 디코딩 및 수치 필드 파싱
//! - [`feature`]: 레코드에서 분류용 특징 10개 추출
//! - [`model`]: YAML 모델 아티팩트 로더와 규칙 기반 분류기
//! - [`throttle`]: 악성 즉시 방출 / 정상 주기 보고 방출 정책
//! - [`pipeline`]: 전체 파이프라인 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 모니터 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! TailReader -> RecordDecoder -> FeatureProjector -> Classifier -> AlertThrottler -> downstream
//!     |              |                 |                 |               |
//!  폴링/로테이션   TSV 22필드       특징 10개        YAML 규칙 모델   악성 즉시/정상 주기
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod feature;
pub mod model;
pub mod pipeline;
pub mod tail;
pub mod throttle;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{MonitorPipeline, MonitorPipelineBuilder, MonitorStats, MonitorStatsSnapshot};

// 설정
pub use config::{MonitorConfig, MonitorConfigBuilder};

// 에러
pub use error::MonitorError;

// 테일링
pub use tail::{TailOutcome, TailReader};

// 디코딩
pub use decode::{CONN_FIELD_COUNT, CONN_FIELDS, Decoded, RecordDecoder};

// 특징 추출
pub use feature::FeatureProjector;

// 분류 모델
pub use model::{
    CATEGORICAL_FEATURES, FeatureCondition, LabelRule, ModelArtifact, ModelLoader,
    RuleModelClassifier,
};

// 알림 방출 정책
pub use throttle::AlertThrottler;
