//! connwatch 공통 도메인 타입
//!
//! Zeek `conn.log` 레코드, 분류 특징 벡터, 레이블/판정, 알림 등
//! 크레이트 경계를 넘나드는 타입을 정의합니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Zeek conn.log 한 줄에서 디코딩된 연결 레코드
///
/// 22개 필드 전체를 보존합니다. 수치 필드(`duration`, 바이트/패킷 카운터)만
/// 파싱하고 나머지는 원문 문자열 그대로 유지합니다. Zeek의 미설정
/// 플레이스홀더 `-`는 수치 필드에서 0으로 디코딩됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnRecord {
    /// 연결 시작 타임스탬프 (Zeek epoch 문자열, 파싱하지 않음)
    pub ts: String,
    /// Zeek 연결 고유 식별자
    pub uid: String,
    /// 발신자 주소
    pub orig_h: String,
    /// 발신자 포트
    pub orig_p: String,
    /// 수신자 주소
    pub resp_h: String,
    /// 수신자 포트
    pub resp_p: String,
    /// 전송 프로토콜 (tcp, udp, icmp, ...)
    pub proto: String,
    /// 감지된 애플리케이션 서비스
    pub service: String,
    /// 연결 지속 시간 (초)
    pub duration: f64,
    /// 발신자 페이로드 바이트 수
    pub orig_bytes: u64,
    /// 수신자 페이로드 바이트 수
    pub resp_bytes: u64,
    /// 연결 상태 코드 (S0, SF, REJ, ...)
    pub conn_state: String,
    /// 발신지가 로컬 네트워크인지 여부 (Zeek bool 문자열)
    pub local_orig: String,
    /// 수신지가 로컬 네트워크인지 여부 (Zeek bool 문자열)
    pub local_resp: String,
    /// 손실된 바이트 수
    pub missed_bytes: u64,
    /// 연결 히스토리 플래그 문자열
    pub history: String,
    /// 발신자 패킷 수
    pub orig_pkts: u64,
    /// 발신자 IP 계층 바이트 수
    pub orig_ip_bytes: u64,
    /// 수신자 패킷 수
    pub resp_pkts: u64,
    /// 수신자 IP 계층 바이트 수
    pub resp_ip_bytes: u64,
    /// 터널 부모 연결 uid 목록
    pub tunnel_parents: String,
    /// IP 프로토콜 번호
    pub ip_proto: String,
}

impl fmt::Display for ConnRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} -> {}:{} ({}, state {})",
            self.uid, self.orig_h, self.orig_p, self.resp_h, self.resp_p, self.proto,
            self.conn_state
        )
    }
}

/// 분류기에 전달되는 특징 필드 이름 (스키마 순서)
pub const FEATURE_FIELDS: [&str; 10] = [
    "proto",
    "duration",
    "orig_bytes",
    "resp_bytes",
    "conn_state",
    "missed_bytes",
    "orig_pkts",
    "orig_ip_bytes",
    "resp_pkts",
    "resp_ip_bytes",
];

/// 분류기 입력 특징 벡터
///
/// [`ConnRecord`]에서 [`FEATURE_FIELDS`] 10개 필드만 사영한 결과입니다.
/// 식별 필드(uid, 주소, 포트)는 포함하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub proto: String,
    pub duration: f64,
    pub orig_bytes: u64,
    pub resp_bytes: u64,
    pub conn_state: String,
    pub missed_bytes: u64,
    pub orig_pkts: u64,
    pub orig_ip_bytes: u64,
    pub resp_pkts: u64,
    pub resp_ip_bytes: u64,
}

/// 분류기가 산출한 불투명 레이블
///
/// 레이블 문자열 자체는 모델이 정의합니다. 악성/정상 판정은
/// [`LabelPolicy`]가 담당하며 레이블 내용에 대한 가정은 두지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 레이블에 대한 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// 악성 -- 항상 즉시 알림
    Malicious,
    /// 정상 -- 주기적 상태 보고만
    Benign,
    /// 정책에 매칭되지 않는 기타 레이블 -- 정상과 동일하게 처리
    Other,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Malicious => "malicious",
            Verdict::Benign => "benign",
            Verdict::Other => "other",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 레이블 → 판정 매핑 정책
///
/// 하드코딩된 접두어 대신 설정으로 주입됩니다. 접두어가 일치하면 악성,
/// 정확히 일치하는 정상 레이블이면 정상, 그 외는 기타로 판정합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPolicy {
    /// 이 접두어로 시작하는 레이블은 악성
    pub malicious_prefixes: Vec<String>,
    /// 정확히 일치하면 정상으로 판정할 레이블
    pub benign_labels: Vec<String>,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            malicious_prefixes: vec!["Malicious".to_owned()],
            benign_labels: vec!["Benign".to_owned()],
        }
    }
}

impl LabelPolicy {
    /// 레이블을 판정합니다.
    ///
    /// 빈 접두어는 모든 레이블과 일치하므로 무시합니다 (설정 검증에서
    /// 이미 거부되지만 정책 단독 사용 시에도 안전해야 합니다).
    pub fn verdict(&self, label: &Label) -> Verdict {
        if self
            .malicious_prefixes
            .iter()
            .any(|p| !p.is_empty() && label.as_str().starts_with(p.as_str()))
        {
            return Verdict::Malicious;
        }
        if self.benign_labels.iter().any(|b| b == label.as_str()) {
            return Verdict::Benign;
        }
        Verdict::Other
    }
}

/// 알림 심각도
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// 느슨한 문자열 매칭으로 심각도를 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "informational" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "Info"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// 콘솔/다운스트림으로 내보내는 알림
///
/// 악성 판정 알림과 주기적 정상 상태 보고가 같은 타입을 사용하며,
/// `verdict`로 구분합니다. 흐름 식별 정보는 레코드 원문 그대로입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// 알림 고유 ID (UUID v4)
    pub id: String,
    /// 레코드의 Zeek 타임스탬프 원문
    pub ts: String,
    /// Zeek 연결 uid
    pub uid: String,
    /// 발신자 주소
    pub orig_h: String,
    /// 발신자 포트
    pub orig_p: String,
    /// 수신자 주소
    pub resp_h: String,
    /// 수신자 포트
    pub resp_p: String,
    /// 전송 프로토콜
    pub proto: String,
    /// 연결 지속 시간 (초)
    pub duration: f64,
    /// 분류기가 산출한 레이블
    pub label: Label,
    /// 정책 판정 결과
    pub verdict: Verdict,
    /// 심각도 (악성 → High, 상태 보고 → Info)
    pub severity: Severity,
    /// 알림 생성 시각
    pub created_at: SystemTime,
}

impl Alert {
    /// 레코드와 분류 결과로 알림을 생성합니다.
    pub fn from_record(record: &ConnRecord, label: Label, verdict: Verdict) -> Self {
        let severity = match verdict {
            Verdict::Malicious => Severity::High,
            Verdict::Benign | Verdict::Other => Severity::Info,
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ts: record.ts.clone(),
            uid: record.uid.clone(),
            orig_h: record.orig_h.clone(),
            orig_p: record.orig_p.clone(),
            resp_h: record.resp_h.clone(),
            resp_p: record.resp_p.clone(),
            proto: record.proto.clone(),
            duration: record.duration,
            label,
            verdict,
            severity,
            created_at: SystemTime::now(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}:{} -> {}:{} proto={} duration={:.3}s ts={}",
            self.severity,
            self.label,
            self.orig_h,
            self.orig_p,
            self.resp_h,
            self.resp_p,
            self.proto,
            self.duration,
            self.ts
        )
    }
}
