//! 특징 사영
//!
//! [`ConnRecord`]에서 분류기 입력으로 쓰는 10개 특징 필드만 추출합니다.
//! 식별 필드(uid, 주소, 포트, 타임스탬프)는 특징에 포함되지 않습니다.

use connwatch_core::types::{ConnRecord, FeatureVector};

/// 특징 사영기
///
/// 순수 함수이며 레코드 내용에 따라 실패하지 않습니다.
pub struct FeatureProjector;

impl FeatureProjector {
    /// 레코드에서 특징 벡터를 사영합니다.
    pub fn project(record: &ConnRecord) -> FeatureVector {
        FeatureVector {
            proto: record.proto.clone(),
            duration: record.duration,
            orig_bytes: record.orig_bytes,
            resp_bytes: record.resp_bytes,
            conn_state: record.conn_state.clone(),
            missed_bytes: record.missed_bytes,
            orig_pkts: record.orig_pkts,
            orig_ip_bytes: record.orig_ip_bytes,
            resp_pkts: record.resp_pkts,
            resp_ip_bytes: record.resp_ip_bytes,
        }
    }
}
