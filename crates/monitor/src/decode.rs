//! conn.log TSV 레코드 디코더
//!
//! 탭으로 구분된 conn.log 한 줄을 [`ConnRecord`]로 변환합니다.
//! 필드 수가 스키마와 정확히 일치해야 하며, 일치하지 않으면 부분 디코딩
//! 없이 줄 전체를 거부합니다.
//!
//! # Zeek 플레이스홀더
//! 수치 필드의 미설정 값 `-`는 해당 타입의 0으로 디코딩됩니다.
//! 문자열 필드는 `-`를 포함해 원문 그대로 유지합니다.

use connwatch_core::types::ConnRecord;

use crate::error::MonitorError;

/// conn.log 스키마의 필드 수
pub const CONN_FIELD_COUNT: usize = 22;

/// conn.log 필드 이름 (스키마 순서)
pub const CONN_FIELDS: [&str; CONN_FIELD_COUNT] = [
    "ts",
    "uid",
    "id.orig_h",
    "id.orig_p",
    "id.resp_h",
    "id.resp_p",
    "proto",
    "service",
    "duration",
    "orig_bytes",
    "resp_bytes",
    "conn_state",
    "local_orig",
    "local_resp",
    "missed_bytes",
    "history",
    "orig_pkts",
    "orig_ip_bytes",
    "resp_pkts",
    "resp_ip_bytes",
    "tunnel_parents",
    "ip_proto",
];

/// 한 줄 디코딩 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// 디코딩된 연결 레코드
    Record(ConnRecord),
    /// 주석(`#`)/빈 줄 -- 처리 대상이 아님
    Skipped,
}

/// conn.log 레코드 디코더
///
/// 디코딩 결과별 카운터를 유지합니다. 디코더 자체는 어떤 입력에도
/// 패닉하지 않습니다.
pub struct RecordDecoder {
    /// 성공적으로 디코딩한 레코드 수
    decoded: u64,
    /// 건너뛴 주석/빈 줄 수
    skipped: u64,
    /// 거부한 줄 수 (스키마 불일치, 필드 파싱 실패)
    errors: u64,
}

impl RecordDecoder {
    /// 새 디코더를 생성합니다.
    pub fn new() -> Self {
        Self {
            decoded: 0,
            skipped: 0,
            errors: 0,
        }
    }

    /// 원시 한 줄을 디코딩합니다.
    ///
    /// 개행은 포함하지 않는 줄을 기대하며, 말미의 `\r`은 제거합니다.
    ///
    /// # Errors
    /// - 필드 수가 22가 아니면 [`MonitorError::SchemaMismatch`]
    /// - 수치 필드가 `-`도 아니고 숫자도 아니면 [`MonitorError::FieldParse`]
    pub fn decode(&mut self, line: &[u8]) -> Result<Decoded, MonitorError> {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end_matches('\r');

        if text.trim().is_empty() || text.starts_with('#') {
            self.skipped += 1;
            return Ok(Decoded::Skipped);
        }

        let fields: Vec<&str> = text.split('\t').collect();
        if fields.len() != CONN_FIELD_COUNT {
            self.errors += 1;
            return Err(MonitorError::SchemaMismatch {
                expected: CONN_FIELD_COUNT,
                found: fields.len(),
            });
        }

        match Self::decode_fields(&fields) {
            Ok(record) => {
                self.decoded += 1;
                Ok(Decoded::Record(record))
            }
            Err(e) => {
                self.errors += 1;
                Err(e)
            }
        }
    }

    /// 필드 수 검증을 통과한 22개 필드를 레코드로 변환합니다.
    fn decode_fields(fields: &[&str]) -> Result<ConnRecord, MonitorError> {
        Ok(ConnRecord {
            ts: fields[0].to_owned(),
            uid: fields[1].to_owned(),
            orig_h: fields[2].to_owned(),
            orig_p: fields[3].to_owned(),
            resp_h: fields[4].to_owned(),
            resp_p: fields[5].to_owned(),
            proto: fields[6].to_owned(),
            service: fields[7].to_owned(),
            duration: parse_f64("duration", fields[8])?,
            orig_bytes: parse_u64("orig_bytes", fields[9])?,
            resp_bytes: parse_u64("resp_bytes", fields[10])?,
            conn_state: fields[11].to_owned(),
            local_orig: fields[12].to_owned(),
            local_resp: fields[13].to_owned(),
            missed_bytes: parse_u64("missed_bytes", fields[14])?,
            history: fields[15].to_owned(),
            orig_pkts: parse_u64("orig_pkts", fields[16])?,
            orig_ip_bytes: parse_u64("orig_ip_bytes", fields[17])?,
            resp_pkts: parse_u64("resp_pkts", fields[18])?,
            resp_ip_bytes: parse_u64("resp_ip_bytes", fields[19])?,
            tunnel_parents: fields[20].to_owned(),
            ip_proto: fields[21].to_owned(),
        })
    }

    /// 성공적으로 디코딩한 레코드 수를 반환합니다.
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    /// 건너뛴 주석/빈 줄 수를 반환합니다.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// 거부한 줄 수를 반환합니다.
    pub fn errors(&self) -> u64 {
        self.errors
    }
}

impl Default for RecordDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Zeek float 필드를 파싱합니다. 플레이스홀더 `-`는 0.0입니다.
fn parse_f64(field: &'static str, raw: &str) -> Result<f64, MonitorError> {
    if raw == "-" {
        return Ok(0.0);
    }
    raw.parse::<f64>().map_err(|e| MonitorError::FieldParse {
        field,
        raw_value: raw.to_owned(),
        reason: e.to_string(),
    })
}

/// Zeek count 필드를 파싱합니다. 플레이스홀더 `-`는 0입니다.
fn parse_u64(field: &'static str, raw: &str) -> Result<u64, MonitorError> {
    if raw == "-" {
        return Ok(0);
    }
    raw.parse::<u64>().map_err(|e| MonitorError::FieldParse {
        field,
        raw_value: raw.to_owned(),
        reason: e.to_string(),
    })
}
